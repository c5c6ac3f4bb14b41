//! The immutable catalog of background candidates.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Named accent swatches extracted from an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AccentColors {
    pub vibrant: String,
    pub dark_vibrant: String,
    pub light_vibrant: String,
    pub muted: String,
    pub dark_muted: String,
    pub light_muted: String,
}

impl AccentColors {
    /// Every swatch set to the same colour.
    pub fn uniform(color: impl Into<String>) -> Self {
        let color = color.into();
        Self {
            vibrant: color.clone(),
            dark_vibrant: color.clone(),
            light_vibrant: color.clone(),
            muted: color.clone(),
            dark_muted: color.clone(),
            light_muted: color,
        }
    }

    fn swatches(&self) -> [(&'static str, &str); 6] {
        [
            ("vibrant", self.vibrant.as_str()),
            ("darkVibrant", self.dark_vibrant.as_str()),
            ("lightVibrant", self.light_vibrant.as_str()),
            ("muted", self.muted.as_str()),
            ("darkMuted", self.dark_muted.as_str()),
            ("lightMuted", self.light_muted.as_str()),
        ]
    }
}

/// One candidate background photograph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Image {
    /// Opaque URI handed to the renderer. Identity for repeat suppression.
    pub src: String,
    /// Width divided by height.
    pub aspect_ratio: f64,
    pub colors: AccentColors,
}

impl Image {
    pub fn validate(&self) -> Result<()> {
        if self.src.trim().is_empty() {
            return Err(self.invalid("src must not be empty"));
        }
        if !self.aspect_ratio.is_finite() || self.aspect_ratio <= 0.0 {
            return Err(self.invalid(format!(
                "aspect ratio must be a positive number, got {}",
                self.aspect_ratio
            )));
        }
        for (name, value) in self.colors.swatches() {
            if value.trim().is_empty() {
                return Err(self.invalid(format!("color {name} must not be empty")));
            }
        }
        Ok(())
    }

    fn invalid(&self, reason: impl Into<String>) -> Error {
        Error::InvalidImage {
            src: self.src.clone(),
            reason: reason.into(),
        }
    }
}

/// Non-empty, validated, immutable set of images. Cloning shares the storage.
#[derive(Debug, Clone)]
pub struct ImagePool {
    images: Arc<[Image]>,
}

impl ImagePool {
    /// Validate every record and reject an empty list.
    pub fn new(images: Vec<Image>) -> Result<Self> {
        if images.is_empty() {
            return Err(Error::EmptyPool);
        }
        for image in &images {
            image.validate()?;
        }
        Ok(Self {
            images: images.into(),
        })
    }

    /// Load a manifest: `.json` files are parsed as JSON, anything else as YAML.
    pub fn from_manifest_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let images: Vec<Image> = if is_json {
            serde_json::from_str(&raw)?
        } else {
            serde_yaml::from_str(&raw)?
        };
        debug!(path = %path.display(), records = images.len(), "parsed image manifest");
        let pool = Self::new(images)?;
        info!(path = %path.display(), images = pool.len(), "loaded image manifest");
        Ok(pool)
    }

    pub fn list_images(&self) -> &[Image] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Always false for a constructed pool; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}
