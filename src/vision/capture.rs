//! Screen capture boundary
//!
//! Defines the capture region geometry, the per-cycle frame type, and the
//! `FrameSource` trait that OS-specific capture backends implement.

use image::{GrayImage, RgbaImage};
use serde::{Deserialize, Serialize};

use super::VisionError;

/// A rectangular screen region in absolute screen coordinates.
///
/// An absent region (`None` at the call sites) means the whole screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    /// Left edge
    pub x: i32,
    /// Top edge
    pub y: i32,
    /// Width in pixels (> 0)
    pub width: u32,
    /// Height in pixels (> 0)
    pub height: u32,
}

impl Region {
    /// Create a new region
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Origin of the region as an (x, y) pair
    pub fn origin(&self) -> (i32, i32) {
        (self.x, self.y)
    }
}

/// Source of raw screen pixels.
///
/// Implementations wrap whatever the platform offers (X11, a Wayland
/// portal, an emulator bridge). Capturing is a blocking operation and may
/// take tens of milliseconds.
pub trait FrameSource {
    /// Capture the given region, or the full screen when `region` is `None`.
    ///
    /// Returns [`VisionError::CaptureUnavailable`] when the display cannot
    /// be read at all; callers treat that as fatal for the current cycle.
    fn capture(&mut self, region: Option<Region>) -> Result<RgbaImage, VisionError>;
}

/// A captured frame for one classification cycle.
///
/// Holds both the color and the grayscale view of a single underlying
/// capture, tagged with the region it was read from. Never mutated after
/// construction.
#[derive(Debug, Clone)]
pub struct Frame {
    region: Option<Region>,
    color: RgbaImage,
    gray: GrayImage,
}

impl Frame {
    /// Build a frame from a raw color capture, deriving the grayscale view.
    pub fn from_color(region: Option<Region>, color: RgbaImage) -> Self {
        let gray = image::DynamicImage::ImageRgba8(color.clone()).to_luma8();
        Self {
            region,
            color,
            gray,
        }
    }

    /// Region this frame was captured from (`None` = full screen)
    pub fn region(&self) -> Option<Region> {
        self.region
    }

    /// Color view of the capture
    pub fn color(&self) -> &RgbaImage {
        &self.color
    }

    /// Grayscale view of the capture
    pub fn gray(&self) -> &GrayImage {
        &self.gray
    }

    /// Frame dimensions
    pub fn dimensions(&self) -> (u32, u32) {
        self.color.dimensions()
    }

    /// Offset to add to frame-relative coordinates to get absolute screen
    /// coordinates.
    pub fn offset(&self) -> (i32, i32) {
        self.region.map_or((0, 0), |r| r.origin())
    }
}
