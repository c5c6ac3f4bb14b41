//! Layer bookkeeping: the window of visible backgrounds and their animation tags.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::events::{Frame, RenderLayer, WindowChange};
use crate::pool::Image;

/// Number of layers in every observable window.
pub const WINDOW_LEN: usize = 2;

pub const ZOOM_CLASS: &str = "zoom";
pub const FADE_OUT_CLASS: &str = "fade-out";

/// Animation tag carried by a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum VisualState {
    #[default]
    Plain,
    Zooming,
    ZoomingFadingOut,
}

impl VisualState {
    pub fn class_names(self) -> &'static [&'static str] {
        match self {
            VisualState::Plain => &[],
            VisualState::Zooming => &[ZOOM_CLASS],
            VisualState::ZoomingFadingOut => &[ZOOM_CLASS, FADE_OUT_CLASS],
        }
    }

    pub fn is_zooming(self) -> bool {
        !matches!(self, VisualState::Plain)
    }

    pub fn is_fading_out(self) -> bool {
        matches!(self, VisualState::ZoomingFadingOut)
    }
}

impl fmt::Display for VisualState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VisualState::Plain => "plain",
            VisualState::Zooming => "zooming",
            VisualState::ZoomingFadingOut => "zooming+fading-out",
        };
        f.write_str(s)
    }
}

/// One displayed instance of an image.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub image: Image,
    pub started_at: DateTime<Utc>,
    /// Monotonic per-rotator sequence; disambiguates layers created in the same millisecond.
    pub seq: u64,
    pub visual_state: VisualState,
}

impl Layer {
    pub fn new(image: Image, seq: u64) -> Self {
        Self {
            image,
            started_at: Utc::now(),
            seq,
            visual_state: VisualState::Plain,
        }
    }

    pub fn src(&self) -> &str {
        &self.image.src
    }

    /// Render identity, unique per (src, started_at).
    pub fn key(&self) -> String {
        format!(
            "{}-{}-{}",
            self.image.src,
            self.started_at.timestamp_millis(),
            self.seq
        )
    }

    pub fn render(&self) -> RenderLayer {
        RenderLayer {
            src: self.image.src.clone(),
            class_names: self.visual_state.class_names().to_vec(),
            key: self.key(),
        }
    }
}

/// The two most recent layers, newest first.
///
/// Index `WINDOW_LEN - 2` is the current background (accent source, painted
/// underneath); index `WINDOW_LEN - 1` is the outgoing layer painted on top of
/// it and faded out before eviction.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerWindow {
    layers: [Layer; WINDOW_LEN],
}

impl LayerWindow {
    pub fn new(newest: Layer, outgoing: Layer) -> Self {
        Self {
            layers: [newest, outgoing],
        }
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn current(&self) -> &Layer {
        &self.layers[WINDOW_LEN - 2]
    }

    pub fn outgoing(&self) -> &Layer {
        &self.layers[WINDOW_LEN - 1]
    }

    /// Prepend `next` and evict the oldest layer in one step. Returns the evicted layer.
    pub fn advance(&mut self, next: Layer) -> Layer {
        let previous = std::mem::replace(&mut self.layers[0], next);
        std::mem::replace(&mut self.layers[1], previous)
    }

    /// Current background starts zooming; the outgoing layer zooms and,
    /// when `fade_out` is set, fades.
    pub fn apply_fade(&mut self, fade_out: bool) {
        self.layers[WINDOW_LEN - 2].visual_state = VisualState::Zooming;
        self.layers[WINDOW_LEN - 1].visual_state = if fade_out {
            VisualState::ZoomingFadingOut
        } else {
            VisualState::Zooming
        };
    }

    /// Accent used to tint the overlay.
    pub fn accent(&self) -> &str {
        &self.current().image.colors.light_vibrant
    }

    pub fn frame(&self, change: WindowChange) -> Frame {
        Frame {
            change,
            layers: self.layers.iter().map(Layer::render).collect(),
            accent: self.accent().to_string(),
        }
    }
}

impl fmt::Display for LayerWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (idx, layer) in self.layers.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} ({})", layer.src(), layer.visual_state)?;
        }
        f.write_str("]")
    }
}
