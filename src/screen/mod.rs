//! Screen classification module
//!
//! Turns one captured frame into exactly one [`GameScreen`] per cycle,
//! using a priority-ordered rule set over template matches. Overlays and
//! dialogs are checked before background screens because a popup visually
//! occludes the screen beneath it while the background's identifying marks
//! can stay visible.

pub mod detector;
pub mod rules;

pub use detector::ScreenDetector;
pub use rules::{Disambiguation, RuleSet, ScreenRule};

use serde::{Deserialize, Serialize};

/// The recognizable game screens.
///
/// A closed set: any frame classifies to exactly one of these, with
/// `Unknown` as the "nothing recognized" sentinel. There are no transition
/// edges between screens; optional dialogs appear conditionally, so any
/// screen may be observed in any cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameScreen {
    /// Nothing recognized
    Unknown,
    /// Home screen
    HomeScreen,
    /// Support card selection
    SupportCardSelection,
    /// Training preparation (start-training banner)
    TrainingPrep,
    /// Event banner popup
    EventBanner,
    /// "My Ruler" confirmation dialog
    MyRulerConfirm,
    /// In-game main view
    MainGame,
    /// Auto-play animation running; all input must be suppressed
    AutoPlayInProgress,
    /// TP recovery confirmation dialog
    TpRecoveryConfirm,
    /// TP recovery item list
    TpRecoveryItems,
    /// Item quantity dialog
    ItemQuantity,
    /// Event skip settings
    EventSkipSettings,
    /// Fast-forward button during a race
    FastForward,
    /// Omakase (auto-select) menu
    OmakaseMenu,
    /// Race retry dialog
    RaceRetry,
    /// Race completion dialog
    RaceCompletion,
    /// Training complete screen
    TrainingComplete,
    /// Post-training completion button
    PostTrainingComplete,
    /// Factor/inheritance confirmation
    FactorConfirm,
    /// Post-training "next" button
    PostTrainingNext,
}

impl GameScreen {
    /// Whether this screen blocks all input until it clears
    pub fn is_blocking(&self) -> bool {
        matches!(self, GameScreen::AutoPlayInProgress)
    }

    /// Whether this is a transient dialog or overlay rather than a
    /// persistent background screen
    pub fn is_overlay(&self) -> bool {
        !matches!(
            self,
            GameScreen::Unknown
                | GameScreen::HomeScreen
                | GameScreen::SupportCardSelection
                | GameScreen::MainGame
        )
    }
}
