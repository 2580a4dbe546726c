//! Template store
//!
//! Reference images for recognizable UI elements, addressed by file name
//! and loaded lazily from a templates directory. Loaded templates are
//! cached decoded, with both color and grayscale views, since every match
//! attempt needs both. The store is read-only at runtime apart from that
//! cache.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::{GrayImage, RgbaImage};

use super::VisionError;

/// A named reference image with precomputed colorspace views.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    color: RgbaImage,
    gray: GrayImage,
}

impl Template {
    /// Build a template from a decoded color image
    pub fn from_image(name: impl Into<String>, color: RgbaImage) -> Self {
        let gray = image::DynamicImage::ImageRgba8(color.clone()).to_luma8();
        Self {
            name: name.into(),
            color,
            gray,
        }
    }

    /// Template identifier (file name)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Color view
    pub fn color(&self) -> &RgbaImage {
        &self.color
    }

    /// Grayscale view
    pub fn gray(&self) -> &GrayImage {
        &self.gray
    }

    /// Native pixel dimensions
    pub fn dimensions(&self) -> (u32, u32) {
        self.color.dimensions()
    }
}

/// Directory-backed store of templates.
pub struct TemplateStore {
    dir: PathBuf,
    cache: HashMap<String, Template>,
    lookups: u64,
}

impl TemplateStore {
    /// Create a store rooted at the given templates directory
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            cache: HashMap::new(),
            lookups: 0,
        }
    }

    /// Preload a template, bypassing the filesystem. Used for templates
    /// produced at runtime and for tests.
    pub fn insert(&mut self, name: impl Into<String>, image: RgbaImage) {
        let name = name.into();
        let template = Template::from_image(name.clone(), image);
        self.cache.insert(name, template);
    }

    /// Look up a template by name, loading and decoding it on first use.
    ///
    /// A missing or undecodable file yields [`VisionError::TemplateLoad`];
    /// classification treats that as "this template never matches".
    pub fn get(&mut self, name: &str) -> Result<&Template, VisionError> {
        self.lookups += 1;

        if !self.cache.contains_key(name) {
            let path = self.dir.join(name);
            let decoded = image::open(&path)
                .map_err(|source| VisionError::TemplateLoad {
                    name: name.to_string(),
                    source,
                })?
                .to_rgba8();
            self.cache
                .insert(name.to_string(), Template::from_image(name, decoded));
        }

        match self.cache.get(name) {
            Some(template) => Ok(template),
            // Inserted just above.
            None => unreachable!("template cached before read"),
        }
    }

    /// Number of lookups since construction (cache hits included)
    pub fn lookups(&self) -> u64 {
        self.lookups
    }
}
