use serde::Serialize;

/// One positioned background image as handed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderLayer {
    pub src: String,
    pub class_names: Vec<&'static str>,
    pub key: String,
}

/// Published after every window change: layers newest first, later entries painted on top.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub change: WindowChange,
    pub layers: Vec<RenderLayer>,
    /// `lightVibrant` of the current background, for overlay tinting.
    pub accent: String,
}

/// What changed in the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowChange {
    Seeded,
    Zoomed,
    Faded,
    Rotated,
}
