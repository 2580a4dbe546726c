//! Per-cycle frame cache
//!
//! Memoizes the most recent capture so that every template evaluated in one
//! classification cycle sees the same frame, and so that the color and
//! grayscale views come from a single OS read. The cache must be
//! invalidated at the start of each cycle; acting on a frame from a
//! previous cycle means clicking on a screen that may no longer exist.

use super::capture::{Frame, FrameSource, Region};
use super::VisionError;

/// Caches the last captured frame, keyed by capture region.
pub struct FrameCache<S> {
    source: S,
    frame: Option<Frame>,
    captures: u64,
}

impl<S: FrameSource> FrameCache<S> {
    /// Create a cache over the given capture backend
    pub fn new(source: S) -> Self {
        Self {
            source,
            frame: None,
            captures: 0,
        }
    }

    /// Drop the cached frame. Called once at the start of every
    /// classification cycle.
    pub fn invalidate(&mut self) {
        self.frame = None;
    }

    /// Get the frame for `region`, capturing only if the cached frame was
    /// taken from a different region (or the cache is empty).
    pub fn get(&mut self, region: Option<Region>) -> Result<&Frame, VisionError> {
        let cached = matches!(&self.frame, Some(f) if f.region() == region);
        if !cached {
            let image = self.source.capture(region)?;
            self.captures += 1;
            self.frame = Some(Frame::from_color(region, image));
        }

        match &self.frame {
            Some(frame) => Ok(frame),
            // The slot was filled just above.
            None => unreachable!("frame cache populated before read"),
        }
    }

    /// Number of captures performed since construction
    pub fn captures(&self) -> u64 {
        self.captures
    }

    /// Access the underlying capture backend
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba, RgbaImage};

    struct FakeScreen {
        image: RgbaImage,
    }

    impl FakeScreen {
        fn flat(width: u32, height: u32, value: u8) -> Self {
            Self {
                image: ImageBuffer::from_fn(width, height, |_, _| {
                    Rgba([value, value, value, 255])
                }),
            }
        }
    }

    impl FrameSource for FakeScreen {
        fn capture(&mut self, region: Option<Region>) -> Result<RgbaImage, VisionError> {
            match region {
                None => Ok(self.image.clone()),
                Some(r) => Ok(image::imageops::crop_imm(
                    &self.image,
                    r.x as u32,
                    r.y as u32,
                    r.width,
                    r.height,
                )
                .to_image()),
            }
        }
    }

    #[test]
    fn test_repeated_get_reuses_capture() {
        let mut cache = FrameCache::new(FakeScreen::flat(32, 32, 128));

        cache.get(None).unwrap();
        cache.get(None).unwrap();
        cache.get(None).unwrap();

        assert_eq!(cache.captures(), 1);
    }

    #[test]
    fn test_invalidate_forces_recapture() {
        let mut cache = FrameCache::new(FakeScreen::flat(32, 32, 128));

        cache.get(None).unwrap();
        cache.invalidate();
        cache.get(None).unwrap();

        assert_eq!(cache.captures(), 2);
    }

    #[test]
    fn test_region_change_forces_recapture() {
        let mut cache = FrameCache::new(FakeScreen::flat(32, 32, 128));
        let region = Region::new(4, 4, 8, 8);

        cache.get(None).unwrap();
        let frame = cache.get(Some(region)).unwrap();
        assert_eq!(frame.dimensions(), (8, 8));
        assert_eq!(frame.region(), Some(region));
        assert_eq!(cache.captures(), 2);

        // Same region again: no new capture.
        cache.get(Some(region)).unwrap();
        assert_eq!(cache.captures(), 2);
    }
}
