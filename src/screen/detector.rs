//! Screen detector
//!
//! Runs the classification cycle: invalidate the frame cache, check the
//! blocking rule, walk the overlay rules in priority order, then the
//! background rules, and report `Unknown` when nothing matched. A broken
//! template degrades its rule to "never matches"; a failed capture aborts
//! the cycle.

use std::thread;
use std::time::{Duration, Instant};

use crate::cancel::CancelToken;
use crate::vision::{FrameSource, Region, VisionError, VisionSystem};

use super::rules::{RuleSet, ScreenRule};
use super::GameScreen;

/// Classifies frames into [`GameScreen`] values using a [`RuleSet`].
pub struct ScreenDetector<S: FrameSource> {
    vision: VisionSystem<S>,
    rules: RuleSet,
}

impl<S: FrameSource> ScreenDetector<S> {
    /// Create a detector over a vision system and a rule set
    pub fn new(vision: VisionSystem<S>, rules: RuleSet) -> Self {
        Self { vision, rules }
    }

    /// Classify the current screen contents.
    ///
    /// Exactly one screen is returned per call, `Unknown` included. The
    /// frame cache is invalidated on entry so the whole cycle sees one
    /// fresh capture.
    pub fn classify(&mut self, region: Option<Region>) -> Result<GameScreen, VisionError> {
        self.vision.begin_cycle();

        // The blocking screen suppresses everything else; clicking while
        // auto-play runs causes misfires.
        if let Some(rule) = self.rules.blocking() {
            if Self::rule_matches(&mut self.vision, rule, region)? {
                log::debug!("blocking screen active: {:?}", rule.screen);
                return Ok(rule.screen);
            }
        }

        for rule in self.rules.priority() {
            if Self::rule_matches(&mut self.vision, rule, region)? {
                log::debug!("classified overlay: {:?}", rule.screen);
                return Ok(rule.screen);
            }
        }

        for rule in self.rules.background() {
            if Self::rule_matches(&mut self.vision, rule, region)? {
                log::debug!("classified background: {:?}", rule.screen);
                return Ok(rule.screen);
            }
        }

        Ok(GameScreen::Unknown)
    }

    /// Check one screen's rule against a fresh frame, ignoring priority
    /// resolution against other screens.
    pub fn is_screen(
        &mut self,
        screen: GameScreen,
        region: Option<Region>,
    ) -> Result<bool, VisionError> {
        let Some(rule) = self.rules.rule_for(screen) else {
            return Ok(false);
        };
        // Each check is its own cycle; polling must not act on a stale
        // frame.
        self.vision.begin_cycle();
        Self::rule_matches(&mut self.vision, rule, region)
    }

    /// Wait for a screen to appear, polling at `poll_interval`.
    ///
    /// Returns `true` as soon as the screen is seen, `false` on timeout or
    /// cancellation. The token is checked between polls, not just at
    /// entry. A zero timeout performs exactly one check.
    pub fn wait_for_screen(
        &mut self,
        screen: GameScreen,
        timeout: Duration,
        poll_interval: Duration,
        region: Option<Region>,
        cancel: &CancelToken,
    ) -> Result<bool, VisionError> {
        let deadline = Instant::now() + timeout;
        loop {
            if cancel.is_cancelled() {
                return Ok(false);
            }
            if self.is_screen(screen, region)? {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            thread::sleep(poll_interval);
        }
    }

    /// The rule set in use
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// The underlying vision system (shared with the clicker)
    pub fn vision_mut(&mut self) -> &mut VisionSystem<S> {
        &mut self.vision
    }

    /// Evaluate one rule: any template matching implies the screen, unless
    /// its disambiguation rejects the match, in which case scanning simply
    /// continues.
    fn rule_matches(
        vision: &mut VisionSystem<S>,
        rule: &ScreenRule,
        region: Option<Region>,
    ) -> Result<bool, VisionError> {
        for template in &rule.templates {
            if !vision.is_present(template, region)? {
                continue;
            }
            if let Some(disambiguation) = &rule.disambiguation {
                let auxiliary = vision.is_present(disambiguation.template(), region)?;
                if !disambiguation.accepts(auxiliary) {
                    log::debug!(
                        "{:?}: '{}' matched but disambiguation rejected it",
                        rule.screen,
                        template
                    );
                    continue;
                }
            }
            return Ok(true);
        }
        Ok(false)
    }
}
