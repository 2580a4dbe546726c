//! Per-screen actions
//!
//! Each recognized screen maps to at most one action. Actions get the
//! shared detector and clicker so a click is always aimed with the same
//! vision pipeline that classified the screen. Screens with no entry are
//! recognized but deliberately left alone.

use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use crate::cancel::CancelToken;
use crate::config::Settings;
use crate::screen::{GameScreen, ScreenDetector};
use crate::vision::{FrameSource, Region, VisionError};

use super::clicker::Clicker;
use super::InputBackend;

/// A response to one recognized screen.
///
/// Returns `Ok(true)` when the action took effect (a button was clicked,
/// the wait elapsed), `Ok(false)` when it could not (button never found).
pub trait ScreenAction<S: FrameSource, I: InputBackend> {
    /// Run the action against the current screen
    fn execute(
        &self,
        detector: &mut ScreenDetector<S>,
        clicker: &mut Clicker<I>,
        region: Option<Region>,
        cancel: &CancelToken,
    ) -> Result<bool, VisionError>;
}

/// Click the first of several candidate templates that can be found.
///
/// Each candidate gets the full retry budget before the next is tried.
pub struct ClickTemplates {
    templates: Vec<String>,
    max_retries: u32,
    retry_delay: Duration,
}

impl ClickTemplates {
    /// Action clicking a single template
    pub fn single(template: &str, max_retries: u32, retry_delay: Duration) -> Self {
        Self::any_of(&[template], max_retries, retry_delay)
    }

    /// Action trying several templates in order
    pub fn any_of(templates: &[&str], max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            templates: templates.iter().map(|t| t.to_string()).collect(),
            max_retries,
            retry_delay,
        }
    }
}

impl<S: FrameSource, I: InputBackend> ScreenAction<S, I> for ClickTemplates {
    fn execute(
        &self,
        detector: &mut ScreenDetector<S>,
        clicker: &mut Clicker<I>,
        region: Option<Region>,
        cancel: &CancelToken,
    ) -> Result<bool, VisionError> {
        for template in &self.templates {
            if cancel.is_cancelled() {
                return Ok(false);
            }
            let clicked = clicker.click_with_retry(
                detector.vision_mut(),
                template,
                region,
                self.max_retries,
                self.retry_delay,
                cancel,
            )?;
            if clicked {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Click at a fixed offset from the search region's origin.
///
/// For controls that match poorly as templates (list rows whose contents
/// vary) but sit at a stable position.
pub struct ClickOffset {
    x: i32,
    y: i32,
}

impl ClickOffset {
    /// Action clicking at `(x, y)` relative to the region origin
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl<S: FrameSource, I: InputBackend> ScreenAction<S, I> for ClickOffset {
    fn execute(
        &self,
        _detector: &mut ScreenDetector<S>,
        clicker: &mut Clicker<I>,
        region: Option<Region>,
        _cancel: &CancelToken,
    ) -> Result<bool, VisionError> {
        let (base_x, base_y) = region.map(|r| r.origin()).unwrap_or((0, 0));
        clicker.click_at(base_x + self.x, base_y + self.y);
        Ok(true)
    }
}

/// Do nothing for a while.
///
/// Used for screens that resolve on their own.
pub struct Wait {
    duration: Duration,
}

impl Wait {
    /// Action sleeping for `duration`
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl<S: FrameSource, I: InputBackend> ScreenAction<S, I> for Wait {
    fn execute(
        &self,
        _detector: &mut ScreenDetector<S>,
        _clicker: &mut Clicker<I>,
        _region: Option<Region>,
        _cancel: &CancelToken,
    ) -> Result<bool, VisionError> {
        thread::sleep(self.duration);
        Ok(true)
    }
}

/// Registry mapping screens to their actions.
pub struct ActionMap<S: FrameSource, I: InputBackend> {
    actions: HashMap<GameScreen, Box<dyn ScreenAction<S, I>>>,
}

impl<S: FrameSource, I: InputBackend> Default for ActionMap<S, I> {
    fn default() -> Self {
        Self {
            actions: HashMap::new(),
        }
    }
}

impl<S: FrameSource, I: InputBackend> ActionMap<S, I> {
    /// Empty map; every screen is observe-only
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the action for a screen, replacing any existing one
    pub fn insert(&mut self, screen: GameScreen, action: Box<dyn ScreenAction<S, I>>) {
        self.actions.insert(screen, action);
    }

    /// The action for a screen, if one is registered
    pub fn get(&self, screen: GameScreen) -> Option<&dyn ScreenAction<S, I>> {
        self.actions.get(&screen).map(|a| a.as_ref())
    }

    /// The stock Umamusume Pretty Derby action map.
    ///
    /// Observe-only by design: `RaceRetry` (retrying costs resources, a
    /// human decides), `EventBanner`, `EventSkipSettings`, `ItemQuantity`,
    /// and all background screens. TP recovery screens only act when
    /// enabled in the settings.
    pub fn umamusume(settings: &Settings) -> Self {
        use GameScreen::*;

        let retries = settings.max_retries;
        let retry_delay = settings.timings.retry_delay();
        let mut map = Self::new();

        map.insert(AutoPlayInProgress, Box::new(Wait::new(Duration::from_secs(1))));
        map.insert(
            PostTrainingNext,
            Box::new(ClickTemplates::any_of(
                &["tsugi_e_button.png", "tsugi_e_corner.png"],
                retries,
                retry_delay,
            )),
        );
        map.insert(
            FactorConfirm,
            Box::new(ClickTemplates::single(
                "inshi_kakutei_button.png",
                retries,
                retry_delay,
            )),
        );
        map.insert(
            PostTrainingComplete,
            Box::new(ClickTemplates::single(
                "kanryou_suru_button.png",
                retries,
                retry_delay,
            )),
        );
        map.insert(
            TrainingComplete,
            Box::new(ClickTemplates::single(
                "training_complete_button.png",
                retries,
                retry_delay,
            )),
        );
        map.insert(
            RaceCompletion,
            Box::new(ClickTemplates::single(
                "tojiru_button.png",
                retries,
                retry_delay,
            )),
        );
        // Fast-forward is transient; a short budget avoids stalling on it.
        map.insert(
            FastForward,
            Box::new(ClickTemplates::single(
                "fast_forward.png",
                2,
                Duration::from_millis(500),
            )),
        );
        map.insert(
            TrainingPrep,
            Box::new(ClickTemplates::any_of(
                &["training_育成開始_button.png", "training_start_button_small.png"],
                retries,
                retry_delay,
            )),
        );
        map.insert(
            MyRulerConfirm,
            Box::new(ClickTemplates::single(
                "kettei_button.png",
                retries,
                retry_delay,
            )),
        );
        map.insert(
            OmakaseMenu,
            Box::new(ClickTemplates::single(
                "omakase_button.png",
                retries,
                retry_delay,
            )),
        );

        if settings.tp_recovery.auto_recover {
            map.insert(
                TpRecoveryConfirm,
                Box::new(ClickTemplates::single(
                    "kaifuku_button.png",
                    retries,
                    retry_delay,
                )),
            );
            map.insert(
                TpRecoveryItems,
                Box::new(ClickOffset::new(
                    settings.tp_recovery.button_x,
                    settings.tp_recovery.second_row_y,
                )),
            );
        }

        map
    }
}
