//! Viewport geometry as seen by the selector.

use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::watch;

/// Default half-width of the near-square band (`1/R ..= R`).
pub const DEFAULT_ORIENTATION_RATIO: f64 = 4.0 / 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn ratio(&self) -> f64 {
        self.width / self.height
    }

    pub fn orientation(&self, band: f64) -> Orientation {
        Orientation::classify(self.ratio(), band)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1920.0, 1080.0)
    }
}

/// Aspect-ratio band of a viewport or an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    NearSquare,
    Landscape,
}

impl Orientation {
    /// Classify `ratio` (width/height) against the band `1/band ..= band`.
    pub fn classify(ratio: f64, band: f64) -> Self {
        if ratio > band {
            Orientation::Landscape
        } else if ratio < 1.0 / band {
            Orientation::Portrait
        } else {
            Orientation::NearSquare
        }
    }
}

/// Live viewport read at every selection.
pub trait ViewportSource: Send + Sync {
    fn current(&self) -> Viewport;
}

/// A viewport that never changes.
#[derive(Debug, Clone, Copy)]
pub struct FixedViewport(pub Viewport);

impl ViewportSource for FixedViewport {
    fn current(&self) -> Viewport {
        self.0
    }
}

/// A viewport that can be resized while the rotator runs.
#[derive(Debug, Clone)]
pub struct SharedViewport {
    tx: Arc<watch::Sender<Viewport>>,
}

impl SharedViewport {
    pub fn new(initial: Viewport) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    pub fn resize(&self, width: f64, height: f64) {
        let next = Viewport::new(width, height);
        self.tx.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            tracing::debug!(width, height, "viewport resized");
            *current = next;
            true
        });
    }
}

impl ViewportSource for SharedViewport {
    fn current(&self) -> Viewport {
        *self.tx.borrow()
    }
}
