//! Multi-method template matching
//!
//! A template is searched for in a frame with three independent
//! normalized-cross-correlation passes: grayscale, full color, and Canny
//! edge maps. The best-scoring method wins. Grayscale handles the common
//! case, color separates buttons that differ mainly by hue (active pink vs.
//! disabled white), and edges keep shape-based matches alive under
//! brightness shifts.

use image::{GrayImage, Luma, RgbaImage};
use imageproc::edges::canny;
use imageproc::template_matching::{match_template, MatchTemplateMethod};

use super::capture::Frame;
use super::templates::Template;

/// Default confidence threshold for a match to count as found.
pub const DEFAULT_THRESHOLD: f32 = 0.8;

/// Canny thresholds for the edge-matching pass.
const CANNY_LOW: f32 = 50.0;
const CANNY_HIGH: f32 = 150.0;

/// Which matching method produced a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMethod {
    /// Grayscale normalized cross-correlation
    Grayscale,
    /// Per-channel color normalized cross-correlation
    Color,
    /// Correlation of Canny edge maps
    Edges,
}

/// Bounding box of a match in absolute screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    /// Left edge
    pub x: i32,
    /// Top edge
    pub y: i32,
    /// Width (the template's native width)
    pub width: u32,
    /// Height (the template's native height)
    pub height: u32,
}

impl Bounds {
    /// Create a new bounding box
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Center point, using truncating integer division so click
    /// coordinates are deterministic.
    pub fn center(&self) -> (i32, i32) {
        (
            self.x + (self.width / 2) as i32,
            self.y + (self.height / 2) as i32,
        )
    }
}

/// A successful or candidate match of one template against one frame.
#[derive(Debug, Clone, Copy)]
pub struct MatchResult {
    /// Bounding box in absolute screen coordinates
    pub bounds: Bounds,
    /// Best similarity score in [0, 1]
    pub confidence: f32,
    /// Method that produced the best score
    pub method: MatchMethod,
}

impl MatchResult {
    /// Center of the bounding box
    pub fn center(&self) -> (i32, i32) {
        self.bounds.center()
    }
}

/// Template matcher with a fixed confidence threshold.
#[derive(Debug, Clone)]
pub struct TemplateMatcher {
    threshold: f32,
}

impl TemplateMatcher {
    /// Create a matcher with the given confidence threshold, clamped to
    /// [0, 1].
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    /// Replace the confidence threshold
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Current confidence threshold
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Find the template in the frame.
    ///
    /// Returns `Some` exactly when the best method's confidence reaches the
    /// threshold; the reported bounds are translated by the frame's capture
    /// region into absolute screen coordinates.
    pub fn find(&self, template: &Template, frame: &Frame) -> Option<MatchResult> {
        let result = self.best_match(template, frame)?;
        if result.confidence >= self.threshold {
            Some(result)
        } else {
            None
        }
    }

    /// Best match regardless of threshold, or `None` when the template
    /// cannot fit in the frame at all.
    pub fn best_match(&self, template: &Template, frame: &Frame) -> Option<MatchResult> {
        let (tw, th) = template.dimensions();
        let (fw, fh) = frame.dimensions();
        if tw == 0 || th == 0 || tw > fw || th > fh {
            return None;
        }

        let mut best: Option<(f32, (u32, u32), MatchMethod)> = None;
        let candidates = [
            (
                score_gray(frame.gray(), template.gray()),
                MatchMethod::Grayscale,
            ),
            (
                score_color(frame.color(), template.color()),
                MatchMethod::Color,
            ),
            (
                score_edges(frame.gray(), template.gray()),
                MatchMethod::Edges,
            ),
        ];
        for (candidate, method) in candidates {
            if let Some((score, loc)) = candidate {
                if best.is_none() || score > best.map_or(f32::MIN, |b| b.0) {
                    best = Some((score, loc, method));
                }
            }
        }

        let (confidence, (x, y), method) = best?;
        let (ox, oy) = frame.offset();
        Some(MatchResult {
            bounds: Bounds::new(ox + x as i32, oy + y as i32, tw, th),
            confidence,
            method,
        })
    }
}

impl Default for TemplateMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

/// Grayscale NCC pass
fn score_gray(frame: &GrayImage, template: &GrayImage) -> Option<(f32, (u32, u32))> {
    let map = match_template(
        frame,
        template,
        MatchTemplateMethod::CrossCorrelationNormalized,
    );
    max_score(&map)
}

/// Color NCC pass: correlate each RGB channel separately and average the
/// per-location scores, mirroring how full-color correlation sums over
/// channels.
fn score_color(frame: &RgbaImage, template: &RgbaImage) -> Option<(f32, (u32, u32))> {
    let maps: Vec<_> = (0..3)
        .map(|c| {
            match_template(
                &channel_plane(frame, c),
                &channel_plane(template, c),
                MatchTemplateMethod::CrossCorrelationNormalized,
            )
        })
        .collect();

    let (w, h) = maps[0].dimensions();
    let mut best: Option<(f32, (u32, u32))> = None;
    for y in 0..h {
        for x in 0..w {
            let mut sum = 0.0f32;
            for map in &maps {
                let v = map.get_pixel(x, y).0[0];
                // A flat channel makes NCC degenerate; count it as zero.
                if v.is_finite() {
                    sum += v;
                }
            }
            let score = sum / 3.0;
            if best.is_none() || score > best.map_or(f32::MIN, |b| b.0) {
                best = Some((score, (x, y)));
            }
        }
    }
    best.map(|(score, loc)| (score.clamp(0.0, 1.0), loc))
}

/// Edge NCC pass over Canny edge maps of template and frame
fn score_edges(frame: &GrayImage, template: &GrayImage) -> Option<(f32, (u32, u32))> {
    let template_edges = canny(template, CANNY_LOW, CANNY_HIGH);
    // A template with no edges would correlate with everything.
    if template_edges.pixels().all(|p| p.0[0] == 0) {
        return None;
    }

    let frame_edges = canny(frame, CANNY_LOW, CANNY_HIGH);
    let map = match_template(
        &frame_edges,
        &template_edges,
        MatchTemplateMethod::CrossCorrelationNormalized,
    );
    max_score(&map)
}

/// Extract one channel of a color image as a grayscale plane
fn channel_plane(image: &RgbaImage, channel: usize) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        Luma([image.get_pixel(x, y).0[channel]])
    })
}

/// Location of the maximum finite score in a correlation map.
///
/// NCC yields NaN over windows with zero energy (flat black areas, empty
/// edge maps), so those entries are skipped rather than compared.
fn max_score(map: &image::ImageBuffer<Luma<f32>, Vec<f32>>) -> Option<(f32, (u32, u32))> {
    let mut best: Option<(f32, (u32, u32))> = None;
    for (x, y, p) in map.enumerate_pixels() {
        let v = p.0[0];
        if !v.is_finite() {
            continue;
        }
        if best.is_none() || v > best.map_or(f32::MIN, |b| b.0) {
            best = Some((v, (x, y)));
        }
    }
    best.map(|(score, loc)| (score.clamp(0.0, 1.0), loc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::capture::Region;
    use image::{ImageBuffer, Rgba};

    /// Background with a distinctive high-variance patch pasted at (px, py)
    fn frame_with_patch(px: u32, py: u32, pw: u32, ph: u32) -> RgbaImage {
        ImageBuffer::from_fn(120, 100, |x, y| {
            let inside = x >= px && x < px + pw && y >= py && y < py + ph;
            if inside {
                let (dx, dy) = (x - px, y - py);
                if (dx + dy) % 2 == 0 {
                    Rgba([255, 40, 160, 255])
                } else {
                    Rgba([10, 220, 90, 255])
                }
            } else {
                Rgba([40, 40, 40, 255])
            }
        })
    }

    fn crop(image: &RgbaImage, x: u32, y: u32, w: u32, h: u32) -> RgbaImage {
        image::imageops::crop_imm(image, x, y, w, h).to_image()
    }

    #[test]
    fn test_exact_crop_matches_at_origin() {
        let screen = frame_with_patch(50, 30, 16, 12);
        let template = Template::from_image("patch", crop(&screen, 50, 30, 16, 12));
        let frame = Frame::from_color(None, screen);

        let matcher = TemplateMatcher::default();
        let result = matcher.find(&template, &frame).expect("exact crop found");

        assert_eq!((result.bounds.x, result.bounds.y), (50, 30));
        assert_eq!((result.bounds.width, result.bounds.height), (16, 12));
        assert!(result.confidence >= 0.99);
    }

    #[test]
    fn test_found_iff_confidence_reaches_threshold() {
        let screen = frame_with_patch(20, 20, 10, 10);
        let template = Template::from_image("patch", crop(&screen, 20, 20, 10, 10));
        let frame = Frame::from_color(None, screen);

        let best = TemplateMatcher::new(0.0)
            .best_match(&template, &frame)
            .unwrap();

        for threshold in [0.0, 0.25, 0.5, 0.8, 0.999, 1.0] {
            let matcher = TemplateMatcher::new(threshold);
            let found = matcher.find(&template, &frame).is_some();
            assert_eq!(found, best.confidence >= threshold, "t = {threshold}");
        }
    }

    #[test]
    fn test_center_uses_floor_division() {
        let bounds = Bounds::new(100, 100, 60, 40);
        assert_eq!(bounds.center(), (130, 120));

        // Odd dimensions truncate.
        let odd = Bounds::new(0, 0, 7, 5);
        assert_eq!(odd.center(), (3, 2));
    }

    #[test]
    fn test_region_translates_to_absolute_coordinates() {
        let screen = frame_with_patch(60, 40, 12, 12);
        let template = Template::from_image("patch", crop(&screen, 60, 40, 12, 12));
        let matcher = TemplateMatcher::default();

        // Full-screen match.
        let full = Frame::from_color(None, screen.clone());
        let full_match = matcher.find(&template, &full).unwrap();

        // Same screen captured through a region; coordinates must line up.
        let region = Region::new(48, 32, 40, 32);
        let cropped = crop(&screen, 48, 32, 40, 32);
        let regional = Frame::from_color(Some(region), cropped);
        let regional_match = matcher.find(&template, &regional).unwrap();

        assert_eq!(
            (regional_match.bounds.x, regional_match.bounds.y),
            (full_match.bounds.x, full_match.bounds.y)
        );
        assert_eq!(regional_match.center(), full_match.center());
    }

    #[test]
    fn test_oversized_template_never_matches() {
        let screen = frame_with_patch(0, 0, 10, 10);
        let big: RgbaImage = ImageBuffer::from_fn(200, 200, |_, _| Rgba([1, 2, 3, 255]));
        let template = Template::from_image("big", big);
        let frame = Frame::from_color(None, screen);

        assert!(TemplateMatcher::default().find(&template, &frame).is_none());
        assert!(TemplateMatcher::default()
            .best_match(&template, &frame)
            .is_none());
    }

    #[test]
    fn test_absent_template_scores_low() {
        let screen = frame_with_patch(10, 10, 8, 8);
        let frame = Frame::from_color(None, screen);
        // A pattern that exists nowhere in the frame.
        let stranger: RgbaImage = ImageBuffer::from_fn(8, 8, |x, y| {
            Rgba([((x * 31 + y * 7) % 251) as u8, 0, ((x * 13) % 251) as u8, 255])
        });
        let template = Template::from_image("stranger", stranger);

        assert!(TemplateMatcher::new(0.99).find(&template, &frame).is_none());
    }

    #[test]
    fn test_color_pass_scores_exact_match() {
        let screen = frame_with_patch(30, 30, 10, 10);
        let patch = crop(&screen, 30, 30, 10, 10);
        let (score, loc) = score_color(&screen, &patch).unwrap();
        assert!(score >= 0.99);
        assert_eq!(loc, (30, 30));
    }

    #[test]
    fn test_gray_pass_scores_exact_match() {
        let screen = frame_with_patch(30, 30, 10, 10);
        let frame = Frame::from_color(None, screen);
        let patch = Template::from_image("p", crop(frame.color(), 30, 30, 10, 10));
        let (score, loc) = score_gray(frame.gray(), patch.gray()).unwrap();
        assert!(score >= 0.99);
        assert_eq!(loc, (30, 30));
    }

    #[test]
    fn test_edgeless_template_skips_edge_pass() {
        let flat: GrayImage = ImageBuffer::from_fn(10, 10, |_, _| Luma([128]));
        let screen: GrayImage = ImageBuffer::from_fn(50, 50, |x, _| Luma([(x * 5) as u8]));
        assert!(score_edges(&screen, &flat).is_none());
    }
}
