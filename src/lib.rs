//! uma-autopilot
//!
//! Screen-state detection and click automation for Umamusume Pretty Derby.
//! A perception/action loop: capture a frame, classify it into exactly one
//! [`GameScreen`](screen::GameScreen) with priority-ordered template rules,
//! then run the action registered for that screen. Capture and input are
//! traits, so the pipeline runs against a desktop, an emulator bridge, or
//! the synthetic screens used in tests.

pub mod automation;
pub mod cancel;
pub mod config;
pub mod screen;
pub mod vision;

use std::thread;
use std::time::{Duration, Instant};

use automation::{ActionMap, Clicker, InputBackend};
use cancel::CancelToken;
use config::Settings;
use screen::{GameScreen, RuleSet, ScreenDetector};
use vision::{FrameSource, TemplateStore, VisionError, VisionSystem};

/// Outcome of one perception/action cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// The screen the frame classified to
    pub screen: GameScreen,
    /// Whether a registered action ran and took effect
    pub acted: bool,
}

/// One step of a scripted screen sequence
#[derive(Debug, Clone)]
pub struct SequenceStep {
    /// The screen to wait for
    pub screen: GameScreen,
    /// Optional steps are skipped when the screen never appears
    pub optional: bool,
    /// Per-step wait timeout; defaults to the settings value
    pub timeout: Option<Duration>,
}

impl SequenceStep {
    /// A step the sequence cannot do without
    pub fn required(screen: GameScreen) -> Self {
        Self {
            screen,
            optional: false,
            timeout: None,
        }
    }

    /// A step for a dialog that only sometimes appears
    pub fn optional(screen: GameScreen) -> Self {
        Self {
            screen,
            optional: true,
            timeout: None,
        }
    }

    /// Override the wait timeout for this step
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// The full automation pipeline: detector, clicker, and action registry
/// over shared settings.
pub struct Autopilot<S: FrameSource, I: InputBackend> {
    detector: ScreenDetector<S>,
    clicker: Clicker<I>,
    actions: ActionMap<S, I>,
    settings: Settings,
    cancel: CancelToken,
}

impl<S: FrameSource, I: InputBackend> Autopilot<S, I> {
    /// Build the stock Umamusume pipeline over a frame source and an input
    /// backend.
    pub fn new(source: S, input: I, settings: Settings) -> Self {
        let templates = TemplateStore::new(&settings.templates_dir);
        let vision = VisionSystem::new(source, templates, settings.confidence_threshold);
        let detector = ScreenDetector::new(vision, RuleSet::umamusume());
        let clicker = Clicker::new(input, settings.timings.action_delay());
        let actions = ActionMap::umamusume(&settings);
        Self::from_parts(detector, clicker, actions, settings)
    }

    /// Assemble a pipeline from already-built parts, for custom rule sets
    /// and action maps.
    pub fn from_parts(
        detector: ScreenDetector<S>,
        clicker: Clicker<I>,
        actions: ActionMap<S, I>,
        settings: Settings,
    ) -> Self {
        Self {
            detector,
            clicker,
            actions,
            settings,
            cancel: CancelToken::new(),
        }
    }

    /// A token that stops [`run`](Self::run) and every polling wait.
    /// Clone it to a hotkey or signal handler.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Classify the current screen and run its action, once
    pub fn run_cycle(&mut self) -> Result<CycleReport, VisionError> {
        let screen = self.detector.classify(self.settings.search_region)?;
        let acted = self.dispatch(screen)?;
        Ok(CycleReport { screen, acted })
    }

    /// Run cycles until cancelled.
    ///
    /// Pacing comes from the timing settings: a settle delay after a
    /// handled screen, a cooldown before re-acting on the same screen, and
    /// a backoff while nothing is recognized. Capture failures end the
    /// loop; everything else is logged and retried next cycle.
    pub fn run(&mut self) -> Result<(), VisionError> {
        log::info!("automation loop started");
        let mut unknown_streak = 0u32;
        let mut last_action: Option<(GameScreen, Instant)> = None;

        while !self.cancel.is_cancelled() {
            let screen = self.detector.classify(self.settings.search_region)?;

            if screen == GameScreen::Unknown {
                unknown_streak += 1;
                if unknown_streak % 5 == 0 {
                    log::warn!("screen unrecognized for {unknown_streak} cycles");
                }
                thread::sleep(self.settings.timings.unknown_screen_delay());
                continue;
            }
            unknown_streak = 0;

            if let Some((previous, at)) = last_action {
                if previous == screen && at.elapsed() < self.settings.timings.cooldown() {
                    // The click landed but the screen has not changed yet;
                    // acting again would double-press.
                    thread::sleep(self.settings.timings.poll_interval());
                    continue;
                }
            }

            if self.dispatch(screen)? {
                last_action = Some((screen, Instant::now()));
                thread::sleep(self.settings.timings.screen_change_delay());
            } else {
                thread::sleep(self.settings.timings.poll_interval());
            }
        }

        log::info!("automation loop stopped");
        Ok(())
    }

    /// Walk a scripted sequence of screens, acting on each as it appears.
    ///
    /// A screen that never appears is skipped with a warning; the game
    /// often merges or drops dialogs between versions, so a missing screen
    /// is not treated as fatal even for required steps. A required step
    /// whose action fails aborts the sequence with `Ok(false)`.
    pub fn run_sequence(&mut self, steps: &[SequenceStep]) -> Result<bool, VisionError> {
        for step in steps {
            if self.cancel.is_cancelled() {
                return Ok(false);
            }

            let timeout = step.timeout.unwrap_or(self.settings.timings.wait_timeout());
            let appeared = self.detector.wait_for_screen(
                step.screen,
                timeout,
                self.settings.timings.poll_interval(),
                self.settings.search_region,
                &self.cancel,
            )?;

            if !appeared {
                log::warn!("screen {:?} did not appear; moving on", step.screen);
                continue;
            }

            log::info!("sequence reached {:?}", step.screen);
            let Some(action) = self.actions.get(step.screen) else {
                continue;
            };
            let acted = action.execute(
                &mut self.detector,
                &mut self.clicker,
                self.settings.search_region,
                &self.cancel,
            )?;
            if !acted && !step.optional {
                log::error!("action for required screen {:?} failed", step.screen);
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// The startup sequence from game launch to the event-skip settings
    /// screen.
    pub fn startup_sequence() -> Vec<SequenceStep> {
        use GameScreen::*;
        let brief = Duration::from_secs(3);
        vec![
            SequenceStep::optional(EventBanner).with_timeout(brief),
            SequenceStep::required(HomeScreen),
            SequenceStep::optional(SupportCardSelection).with_timeout(brief),
            SequenceStep::required(TrainingPrep),
            SequenceStep::optional(MyRulerConfirm).with_timeout(brief),
            SequenceStep::optional(TpRecoveryConfirm).with_timeout(brief),
            SequenceStep::optional(TpRecoveryItems).with_timeout(brief),
            SequenceStep::optional(ItemQuantity).with_timeout(brief),
            SequenceStep::required(EventSkipSettings),
        ]
    }

    /// The detector, for direct classification
    pub fn detector_mut(&mut self) -> &mut ScreenDetector<S> {
        &mut self.detector
    }

    /// The clicker, for direct clicks
    pub fn clicker_mut(&mut self) -> &mut Clicker<I> {
        &mut self.clicker
    }

    /// The action registry
    pub fn actions_mut(&mut self) -> &mut ActionMap<S, I> {
        &mut self.actions
    }

    /// The settings in use
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn dispatch(&mut self, screen: GameScreen) -> Result<bool, VisionError> {
        let Some(action) = self.actions.get(screen) else {
            log::debug!("no action registered for {screen:?}");
            return Ok(false);
        };
        action.execute(
            &mut self.detector,
            &mut self.clicker,
            self.settings.search_region,
            &self.cancel,
        )
    }
}
