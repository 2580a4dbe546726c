//! Vision and image matching module
//!
//! Owns the capture boundary, the per-cycle frame cache, the template
//! store, and the multi-method template matcher, and coordinates them into
//! the "is this template on screen, and where" primitive that screen
//! detection and clicking are built on.

pub mod cache;
pub mod capture;
pub mod matcher;
pub mod templates;

pub use cache::FrameCache;
pub use capture::{Frame, FrameSource, Region};
pub use matcher::{Bounds, MatchMethod, MatchResult, TemplateMatcher, DEFAULT_THRESHOLD};
pub use templates::{Template, TemplateStore};

/// Vision system errors
#[derive(Debug, thiserror::Error)]
pub enum VisionError {
    /// The capture backend cannot produce a frame at all (no display,
    /// permission denied, backend missing). Fatal for the current cycle.
    #[error("screen capture unavailable: {0}")]
    CaptureUnavailable(String),
    /// One template's reference image could not be read or decoded. Local
    /// to that template; classification continues without it.
    #[error("failed to load template '{name}': {source}")]
    TemplateLoad {
        /// Template identifier
        name: String,
        /// Underlying decode/io error
        source: image::ImageError,
    },
}

impl VisionError {
    /// Whether this error only degrades a single template rather than the
    /// whole cycle.
    pub fn is_template_load(&self) -> bool {
        matches!(self, VisionError::TemplateLoad { .. })
    }
}

/// Coordinates capture, caching, template storage, and matching.
///
/// One `VisionSystem` serves both the screen detector and the clicker, so
/// there is a single frame cache and a single matching implementation for
/// the whole loop.
pub struct VisionSystem<S: FrameSource> {
    frames: FrameCache<S>,
    templates: TemplateStore,
    matcher: TemplateMatcher,
}

impl<S: FrameSource> VisionSystem<S> {
    /// Create a vision system over a capture backend and a template
    /// directory.
    pub fn new(source: S, templates: TemplateStore, confidence: f32) -> Self {
        Self {
            frames: FrameCache::new(source),
            templates,
            matcher: TemplateMatcher::new(confidence),
        }
    }

    /// Start a fresh classification cycle: the next capture hits the OS.
    pub fn begin_cycle(&mut self) {
        self.frames.invalidate();
    }

    /// Find a template on screen.
    ///
    /// Propagates [`VisionError::TemplateLoad`] so callers can decide
    /// whether a broken template is fatal; for classification it never is.
    pub fn find(
        &mut self,
        template: &str,
        region: Option<Region>,
    ) -> Result<Option<MatchResult>, VisionError> {
        let template = self.templates.get(template)?;
        let frame = self.frames.get(region)?;
        Ok(self.matcher.find(template, frame))
    }

    /// Find a template and return the center of its bounding box, the
    /// point a click should land on.
    pub fn find_center(
        &mut self,
        template: &str,
        region: Option<Region>,
    ) -> Result<Option<(i32, i32)>, VisionError> {
        Ok(self.find(template, region)?.map(|m| m.center()))
    }

    /// Whether a template is currently on screen, treating a broken
    /// template file as "not on screen" (logged once per call).
    pub fn is_present(
        &mut self,
        template: &str,
        region: Option<Region>,
    ) -> Result<bool, VisionError> {
        match self.find(template, region) {
            Ok(found) => Ok(found.is_some()),
            Err(err) if err.is_template_load() => {
                log::warn!("{err}; treating as no match");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// The template store (for preloading)
    pub fn templates_mut(&mut self) -> &mut TemplateStore {
        &mut self.templates
    }

    /// Template lookups performed so far
    pub fn template_lookups(&self) -> u64 {
        self.templates.lookups()
    }

    /// Captures performed so far
    pub fn captures(&self) -> u64 {
        self.frames.captures()
    }

    /// Confidence threshold in use
    pub fn threshold(&self) -> f32 {
        self.matcher.threshold()
    }
}
