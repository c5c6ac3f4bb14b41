use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, bail, ensure};
use serde::Deserialize;

use crate::viewport::{DEFAULT_ORIENTATION_RATIO, Viewport};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Configuration {
    /// Where the image pool comes from.
    pub pool: PoolOptions,
    /// Rotation cadence and selection tuning.
    pub rotation: RotationOptions,
    /// Initial viewport used for orientation matching.
    pub viewport: Viewport,
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&s)?)
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(self) -> Result<Self> {
        self.pool.validate()?;
        self.rotation.validate()?;
        ensure!(
            self.viewport.width > 0.0 && self.viewport.height > 0.0,
            "viewport width and height must be positive"
        );
        Ok(self)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct PoolOptions {
    /// YAML or JSON list of image records.
    pub manifest: Option<PathBuf>,
    /// Directory scanned for photographs.
    pub library: Option<PathBuf>,
    /// Recurse into sub-directories of `library`.
    pub recursive: bool,
    /// Maximum recursion depth; `None` means unlimited.
    pub max_depth: Option<usize>,
    /// Extensions picked up while scanning; `None` keeps the built-in list.
    pub extensions: Option<Vec<String>>,
    /// File names (`name.ext`) that get neutral accents instead of an extracted palette.
    pub exclude: Vec<String>,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            manifest: None,
            library: None,
            recursive: true,
            max_depth: None,
            extensions: None,
            exclude: Vec::new(),
        }
    }
}

/// Resolved pool origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolSource<'a> {
    Manifest(&'a Path),
    Library(&'a Path),
}

impl PoolOptions {
    pub fn source(&self) -> Result<PoolSource<'_>> {
        match (&self.manifest, &self.library) {
            (Some(manifest), None) => Ok(PoolSource::Manifest(manifest)),
            (None, Some(library)) => Ok(PoolSource::Library(library)),
            (Some(_), Some(_)) => bail!("pool.manifest and pool.library are mutually exclusive"),
            (None, None) => bail!("pool.manifest or pool.library must be set"),
        }
    }

    fn validate(&self) -> Result<()> {
        self.source()?;
        if let Some(exts) = &self.extensions {
            ensure!(
                !exts.is_empty(),
                "pool.extensions must list at least one extension"
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct RotationOptions {
    /// How often a new image enters the window.
    #[serde(with = "humantime_serde")]
    pub rotate_interval: Duration,
    /// Delay between a rotation and the fade step that follows it.
    #[serde(with = "humantime_serde")]
    pub transition_interval: Duration,
    /// Delay before the first fade step, letting the first paint happen.
    #[serde(with = "humantime_serde")]
    pub initial_paint_delay: Duration,
    /// Half-width `R` of the near-square band `1/R ..= R`.
    pub orientation_ratio: f64,
    /// Deterministic RNG seed for image selection.
    pub seed: Option<u64>,
}

impl RotationOptions {
    const fn default_rotate_interval() -> Duration {
        Duration::from_millis(3000)
    }

    const fn default_transition_interval() -> Duration {
        Duration::from_millis(1500)
    }

    const fn default_initial_paint_delay() -> Duration {
        Duration::from_millis(10)
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            !self.rotate_interval.is_zero(),
            "rotation.rotate-interval must be positive"
        );
        ensure!(
            !self.transition_interval.is_zero(),
            "rotation.transition-interval must be positive"
        );
        ensure!(
            self.rotate_interval > self.transition_interval,
            "rotation.rotate-interval must be longer than rotation.transition-interval"
        );
        ensure!(
            self.orientation_ratio.is_finite() && self.orientation_ratio > 1.0,
            "rotation.orientation-ratio must be greater than 1"
        );
        Ok(())
    }
}

impl Default for RotationOptions {
    fn default() -> Self {
        Self {
            rotate_interval: Self::default_rotate_interval(),
            transition_interval: Self::default_transition_interval(),
            initial_paint_delay: Self::default_initial_paint_delay(),
            orientation_ratio: DEFAULT_ORIENTATION_RATIO,
            seed: None,
        }
    }
}
