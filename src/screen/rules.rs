//! Screen rules and classification policy
//!
//! A [`ScreenRule`] binds a screen to the templates that identify it, plus
//! an optional disambiguation predicate used to reject look-alikes. A
//! [`RuleSet`] fixes the evaluation order: one blocking rule, then
//! overlays/dialogs in priority order, then background screens. The order
//! is design-time data, not computed; which overlay beats which background
//! is domain knowledge.

use super::GameScreen;

/// Secondary template check that must hold for a primary match to be
/// accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disambiguation {
    /// The auxiliary template must also be on screen
    RequirePresent(String),
    /// The auxiliary template must not be on screen
    RequireAbsent(String),
}

impl Disambiguation {
    /// The auxiliary template's identifier
    pub fn template(&self) -> &str {
        match self {
            Disambiguation::RequirePresent(name) | Disambiguation::RequireAbsent(name) => name,
        }
    }

    /// Whether the rule holds given that the auxiliary template was or was
    /// not found.
    pub fn accepts(&self, auxiliary_present: bool) -> bool {
        match self {
            Disambiguation::RequirePresent(_) => auxiliary_present,
            Disambiguation::RequireAbsent(_) => !auxiliary_present,
        }
    }
}

/// One screen's detection rule: any of its templates matching implies the
/// screen, subject to the disambiguation predicate.
#[derive(Debug, Clone)]
pub struct ScreenRule {
    /// The screen this rule detects
    pub screen: GameScreen,
    /// Ordered template candidates; the first match wins
    pub templates: Vec<String>,
    /// Optional secondary check against false positives
    pub disambiguation: Option<Disambiguation>,
}

impl ScreenRule {
    /// Rule with a single template and no disambiguation
    pub fn single(screen: GameScreen, template: &str) -> Self {
        Self {
            screen,
            templates: vec![template.to_string()],
            disambiguation: None,
        }
    }

    /// Rule with several template candidates
    pub fn any_of(screen: GameScreen, templates: &[&str]) -> Self {
        Self {
            screen,
            templates: templates.iter().map(|t| t.to_string()).collect(),
            disambiguation: None,
        }
    }

    /// Attach a disambiguation predicate
    pub fn disambiguate(mut self, rule: Disambiguation) -> Self {
        self.disambiguation = Some(rule);
        self
    }
}

/// The complete, ordered classification policy.
///
/// Detached rules are excluded from the full-cycle walk but still resolve
/// through [`rule_for`](Self::rule_for), so targeted checks and waits can
/// detect screens that must never win a classification cycle.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    blocking: Option<ScreenRule>,
    priority: Vec<ScreenRule>,
    background: Vec<ScreenRule>,
    detached: Vec<ScreenRule>,
}

impl RuleSet {
    /// Empty rule set; everything classifies as `Unknown`
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the blocking rule, checked before everything else
    pub fn with_blocking(mut self, rule: ScreenRule) -> Self {
        self.blocking = Some(rule);
        self
    }

    /// Append an overlay/dialog rule; earlier rules win ties
    pub fn with_priority(mut self, rule: ScreenRule) -> Self {
        self.priority.push(rule);
        self
    }

    /// Append a background rule, checked only when no overlay matched
    pub fn with_background(mut self, rule: ScreenRule) -> Self {
        self.background.push(rule);
        self
    }

    /// Append a rule reachable only through targeted checks, never through
    /// the full-cycle walk
    pub fn with_detached(mut self, rule: ScreenRule) -> Self {
        self.detached.push(rule);
        self
    }

    /// The blocking rule, if any
    pub fn blocking(&self) -> Option<&ScreenRule> {
        self.blocking.as_ref()
    }

    /// Overlay/dialog rules in evaluation order
    pub fn priority(&self) -> &[ScreenRule] {
        &self.priority
    }

    /// Background rules in evaluation order
    pub fn background(&self) -> &[ScreenRule] {
        &self.background
    }

    /// Rules outside the full-cycle walk
    pub fn detached(&self) -> &[ScreenRule] {
        &self.detached
    }

    /// Find the rule for one screen, searching all partitions
    pub fn rule_for(&self, screen: GameScreen) -> Option<&ScreenRule> {
        self.blocking
            .iter()
            .chain(self.priority.iter())
            .chain(self.background.iter())
            .chain(self.detached.iter())
            .find(|rule| rule.screen == screen)
    }

    /// The stock Umamusume Pretty Derby rule set.
    ///
    /// Ordering notes, learned the hard way:
    /// - TP recovery confirm must come before training prep; both buttons
    ///   can be visible at once.
    /// - TP recovery items is identified by its header, which also appears
    ///   elsewhere; it is only accepted when the close button is visible
    ///   too.
    /// - Race completion's bare close button would shadow the TP items
    ///   screen, so it is checked later and rejected while the TP header
    ///   is up.
    /// - Race retry must come before race completion.
    /// - The My Ruler confirmation is detached: its kettei button looks
    ///   like every other confirm button, so it is only checked on demand
    ///   (sequence waits), never during the full-cycle walk.
    pub fn umamusume() -> Self {
        use GameScreen::*;

        RuleSet::new()
            .with_blocking(ScreenRule::single(
                AutoPlayInProgress,
                "auto_play_inprogress.png",
            ))
            .with_priority(ScreenRule::any_of(
                PostTrainingNext,
                &["tsugi_e_button.png", "tsugi_e_corner.png"],
            ))
            .with_priority(ScreenRule::single(FactorConfirm, "inshi_kakutei_button.png"))
            .with_priority(ScreenRule::single(
                PostTrainingComplete,
                "kanryou_suru_button.png",
            ))
            .with_priority(ScreenRule::single(
                TrainingComplete,
                "training_complete_button.png",
            ))
            .with_priority(ScreenRule::single(TpRecoveryConfirm, "kaifuku_button.png"))
            .with_priority(ScreenRule::single(TrainingPrep, "training_start_banner.png"))
            .with_priority(
                ScreenRule::single(TpRecoveryItems, "tp_recovery_header.png").disambiguate(
                    Disambiguation::RequirePresent("tojiru_button.png".to_string()),
                ),
            )
            .with_priority(ScreenRule::single(RaceRetry, "mouichido_button.png"))
            .with_priority(
                ScreenRule::single(RaceCompletion, "tojiru_button.png").disambiguate(
                    Disambiguation::RequireAbsent("tp_recovery_header.png".to_string()),
                ),
            )
            .with_priority(ScreenRule::single(OmakaseMenu, "omakase_button.png"))
            .with_priority(ScreenRule::single(FastForward, "fast_forward.png"))
            // No templates captured yet for these; the rules never match
            // until someone extracts them.
            .with_priority(ScreenRule {
                screen: EventBanner,
                templates: Vec::new(),
                disambiguation: None,
            })
            .with_priority(ScreenRule {
                screen: EventSkipSettings,
                templates: Vec::new(),
                disambiguation: None,
            })
            .with_background(ScreenRule {
                screen: SupportCardSelection,
                templates: Vec::new(),
                disambiguation: None,
            })
            .with_background(ScreenRule {
                screen: HomeScreen,
                templates: Vec::new(),
                disambiguation: None,
            })
            .with_background(ScreenRule {
                screen: MainGame,
                templates: Vec::new(),
                disambiguation: None,
            })
            .with_detached(ScreenRule::single(MyRulerConfirm, "kettei_button.png"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disambiguation_predicates() {
        let present = Disambiguation::RequirePresent("aux.png".to_string());
        assert!(present.accepts(true));
        assert!(!present.accepts(false));

        let absent = Disambiguation::RequireAbsent("aux.png".to_string());
        assert!(absent.accepts(false));
        assert!(!absent.accepts(true));
        assert_eq!(absent.template(), "aux.png");
    }

    #[test]
    fn test_stock_ruleset_shape() {
        let rules = RuleSet::umamusume();

        let blocking = rules.blocking().expect("blocking rule configured");
        assert_eq!(blocking.screen, GameScreen::AutoPlayInProgress);

        // Overlays outrank backgrounds; first overlay is the post-training
        // next button.
        assert_eq!(rules.priority()[0].screen, GameScreen::PostTrainingNext);

        // Retry is checked before completion.
        let order: Vec<_> = rules.priority().iter().map(|r| r.screen).collect();
        let retry = order
            .iter()
            .position(|s| *s == GameScreen::RaceRetry)
            .unwrap();
        let completion = order
            .iter()
            .position(|s| *s == GameScreen::RaceCompletion)
            .unwrap();
        assert!(retry < completion);
    }

    #[test]
    fn test_rule_for_searches_all_partitions() {
        let rules = RuleSet::umamusume();
        assert!(rules.rule_for(GameScreen::AutoPlayInProgress).is_some());
        assert!(rules.rule_for(GameScreen::RaceCompletion).is_some());
        assert!(rules.rule_for(GameScreen::HomeScreen).is_some());
        assert!(rules.rule_for(GameScreen::MyRulerConfirm).is_some());
        assert!(rules.rule_for(GameScreen::Unknown).is_none());
    }

    #[test]
    fn test_my_ruler_confirm_is_detached() {
        // The kettei button is a generic confirm; it must be resolvable for
        // targeted waits but stay out of the full-cycle walk.
        let rules = RuleSet::umamusume();
        let rule = rules.rule_for(GameScreen::MyRulerConfirm).unwrap();
        assert_eq!(rule.templates, vec!["kettei_button.png".to_string()]);

        let mut walked = rules
            .blocking()
            .into_iter()
            .chain(rules.priority().iter())
            .chain(rules.background().iter());
        assert!(walked.all(|r| r.screen != GameScreen::MyRulerConfirm));
        assert!(rules
            .detached()
            .iter()
            .any(|r| r.screen == GameScreen::MyRulerConfirm));
    }

    #[test]
    fn test_tp_items_requires_close_button() {
        let rules = RuleSet::umamusume();
        let rule = rules.rule_for(GameScreen::TpRecoveryItems).unwrap();
        assert_eq!(
            rule.disambiguation,
            Some(Disambiguation::RequirePresent(
                "tojiru_button.png".to_string()
            ))
        );
    }
}
