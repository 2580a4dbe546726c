//! Button clicking
//!
//! Finds a template's center through the shared vision system and clicks
//! it. The retry and wait variants re-capture before every attempt so a
//! click is never aimed using a stale frame, and they observe the
//! cancellation token between attempts.

use std::thread;
use std::time::{Duration, Instant};

use crate::cancel::CancelToken;
use crate::vision::{FrameSource, Region, VisionError, VisionSystem};

use super::InputBackend;

/// Clicks template matches via an [`InputBackend`].
pub struct Clicker<I> {
    input: I,
    action_delay: Duration,
}

impl<I: InputBackend> Clicker<I> {
    /// Create a clicker with the given post-click settle delay
    pub fn new(input: I, action_delay: Duration) -> Self {
        Self {
            input,
            action_delay,
        }
    }

    /// Find a template on screen and click its center.
    ///
    /// Returns `Ok(false)` when the template is not on screen, or when its
    /// file cannot be loaded (logged; one bad template must not stall the
    /// loop). Capture failures propagate.
    pub fn click_template<S: FrameSource>(
        &mut self,
        vision: &mut VisionSystem<S>,
        template: &str,
        region: Option<Region>,
    ) -> Result<bool, VisionError> {
        let center = match vision.find_center(template, region) {
            Ok(center) => center,
            Err(err) if err.is_template_load() => {
                log::warn!("{err}; treating as not clickable");
                return Ok(false);
            }
            Err(err) => return Err(err),
        };

        let Some((x, y)) = center else {
            log::debug!("button '{template}' not found");
            return Ok(false);
        };

        log::info!("clicking '{template}' at ({x}, {y})");
        self.input.click(x, y);
        thread::sleep(self.action_delay);
        Ok(true)
    }

    /// Click at an explicit screen position
    pub fn click_at(&mut self, x: i32, y: i32) {
        log::info!("clicking at ({x}, {y})");
        self.input.click(x, y);
        thread::sleep(self.action_delay);
    }

    /// Try to click a template, re-capturing before each attempt.
    ///
    /// At least one attempt is made even with `max_retries` of zero. The
    /// token is checked before every attempt.
    pub fn click_with_retry<S: FrameSource>(
        &mut self,
        vision: &mut VisionSystem<S>,
        template: &str,
        region: Option<Region>,
        max_retries: u32,
        retry_delay: Duration,
        cancel: &CancelToken,
    ) -> Result<bool, VisionError> {
        let attempts = max_retries.max(1);
        for attempt in 0..attempts {
            if cancel.is_cancelled() {
                return Ok(false);
            }
            // Fresh frame per attempt; the screen may have changed.
            vision.begin_cycle();
            if self.click_template(vision, template, region)? {
                return Ok(true);
            }
            if attempt + 1 < attempts {
                log::debug!(
                    "retry {}/{} for '{template}' in {:?}",
                    attempt + 1,
                    attempts,
                    retry_delay
                );
                thread::sleep(retry_delay);
            }
        }

        log::warn!("failed to click '{template}' after {attempts} attempts");
        Ok(false)
    }

    /// Wait for a template to appear, then click it.
    pub fn wait_and_click<S: FrameSource>(
        &mut self,
        vision: &mut VisionSystem<S>,
        template: &str,
        region: Option<Region>,
        timeout: Duration,
        poll_interval: Duration,
        cancel: &CancelToken,
    ) -> Result<bool, VisionError> {
        let deadline = Instant::now() + timeout;
        loop {
            if cancel.is_cancelled() {
                return Ok(false);
            }
            vision.begin_cycle();
            if self.click_template(vision, template, region)? {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                log::debug!("button '{template}' did not appear within {timeout:?}");
                return Ok(false);
            }
            thread::sleep(poll_interval);
        }
    }

    /// Access the input backend
    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::TemplateStore;
    use image::{ImageBuffer, Rgba, RgbaImage};

    struct FakeScreen {
        frames: Vec<RgbaImage>,
        served: usize,
    }

    impl FrameSource for FakeScreen {
        fn capture(&mut self, _region: Option<Region>) -> Result<RgbaImage, VisionError> {
            let idx = self.served.min(self.frames.len() - 1);
            self.served += 1;
            Ok(self.frames[idx].clone())
        }
    }

    #[derive(Default)]
    struct FakeInput {
        clicks: Vec<(i32, i32)>,
    }

    impl InputBackend for FakeInput {
        fn click(&mut self, x: i32, y: i32) {
            self.clicks.push((x, y));
        }
    }

    fn button_patch() -> RgbaImage {
        ImageBuffer::from_fn(20, 20, |x, y| {
            let h = (x + y * 20).wrapping_mul(2_654_435_761);
            Rgba([(h >> 8) as u8, (h >> 16) as u8, (h >> 24) as u8, 255])
        })
    }

    fn blank_screen() -> RgbaImage {
        ImageBuffer::from_fn(100, 80, |_, _| Rgba([20, 20, 20, 255]))
    }

    fn screen_with_button(x: i64, y: i64) -> RgbaImage {
        let mut screen = blank_screen();
        image::imageops::overlay(&mut screen, &button_patch(), x, y);
        screen
    }

    fn vision(frames: Vec<RgbaImage>) -> VisionSystem<FakeScreen> {
        let mut store = TemplateStore::new("templates");
        store.insert("button.png", button_patch());
        VisionSystem::new(FakeScreen { frames, served: 0 }, store, 0.95)
    }

    fn clicker() -> Clicker<FakeInput> {
        Clicker::new(FakeInput::default(), Duration::ZERO)
    }

    #[test]
    fn test_click_template_hits_center() {
        let mut vision = vision(vec![screen_with_button(30, 20)]);
        let mut clicker = clicker();

        let clicked = clicker.click_template(&mut vision, "button.png", None).unwrap();
        assert!(clicked);
        // 20x20 button at (30, 20): center is origin + (10, 10).
        assert_eq!(clicker.input_mut().clicks, vec![(40, 30)]);
    }

    #[test]
    fn test_click_template_misses_cleanly() {
        let mut vision = vision(vec![blank_screen()]);
        let mut clicker = clicker();

        let clicked = clicker.click_template(&mut vision, "button.png", None).unwrap();
        assert!(!clicked);
        assert!(clicker.input_mut().clicks.is_empty());
    }

    #[test]
    fn test_missing_template_file_is_not_fatal() {
        let mut vision = vision(vec![blank_screen()]);
        let mut clicker = clicker();

        let clicked = clicker
            .click_template(&mut vision, "never_extracted.png", None)
            .unwrap();
        assert!(!clicked);
    }

    #[test]
    fn test_retry_picks_up_late_button() {
        // Button only appears on the second capture.
        let mut vision = vision(vec![blank_screen(), screen_with_button(50, 40)]);
        let mut clicker = clicker();

        let clicked = clicker
            .click_with_retry(
                &mut vision,
                "button.png",
                None,
                3,
                Duration::ZERO,
                &CancelToken::new(),
            )
            .unwrap();
        assert!(clicked);
        assert_eq!(clicker.input_mut().clicks, vec![(60, 50)]);
        // One capture per attempt.
        assert_eq!(vision.captures(), 2);
    }

    #[test]
    fn test_retry_gives_up_after_attempts() {
        let mut vision = vision(vec![blank_screen()]);
        let mut clicker = clicker();

        let clicked = clicker
            .click_with_retry(
                &mut vision,
                "button.png",
                None,
                3,
                Duration::ZERO,
                &CancelToken::new(),
            )
            .unwrap();
        assert!(!clicked);
        assert_eq!(vision.captures(), 3);
    }

    #[test]
    fn test_retry_stops_on_cancellation() {
        let mut vision = vision(vec![blank_screen()]);
        let mut clicker = clicker();
        let cancel = CancelToken::new();
        cancel.cancel();

        let clicked = clicker
            .click_with_retry(&mut vision, "button.png", None, 3, Duration::ZERO, &cancel)
            .unwrap();
        assert!(!clicked);
        assert_eq!(vision.captures(), 0);
    }

    #[test]
    fn test_wait_and_click_zero_timeout_checks_once() {
        let mut vision = vision(vec![screen_with_button(10, 10)]);
        let mut clicker = clicker();

        let clicked = clicker
            .wait_and_click(
                &mut vision,
                "button.png",
                None,
                Duration::ZERO,
                Duration::from_millis(10),
                &CancelToken::new(),
            )
            .unwrap();
        assert!(clicked);
        assert_eq!(vision.captures(), 1);
    }
}
