//! Click automation module
//!
//! The action side of the loop: an input-injection boundary, a clicker
//! that turns template matches into clicks (with retry and wait variants),
//! and per-screen actions dispatched from a registry.

pub mod actions;
pub mod clicker;

pub use actions::{ActionMap, ClickOffset, ClickTemplates, ScreenAction, Wait};
pub use clicker::Clicker;

/// Boundary for injecting pointer input.
///
/// Implementations wrap the platform's input facility (an X11/uinput
/// injector, an emulator bridge). Coordinates are absolute screen
/// coordinates.
pub trait InputBackend {
    /// Click at the given screen position
    fn click(&mut self, x: i32, y: i32);
}
