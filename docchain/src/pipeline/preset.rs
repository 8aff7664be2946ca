//! Preset tool chains.

use serde::{Deserialize, Serialize};

/// A named, ready-made tool chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    /// Preset identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Short description.
    #[serde(default)]
    pub description: String,
    /// Icon reference.
    #[serde(default)]
    pub icon: String,
    /// Tool ids in execution order.
    pub tools: Vec<String>,
}

impl Preset {
    /// Creates a preset.
    #[must_use]
    pub fn new<I, S>(id: impl Into<String>, name: impl Into<String>, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            icon: String::new(),
            tools: tools.into_iter().map(Into::into).collect(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the icon.
    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    /// Parses a list of presets from JSON.
    pub fn list_from_json(json: &str) -> Result<Vec<Self>, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Presets shipped with the crate.
#[must_use]
pub fn builtin_presets() -> Vec<Preset> {
    vec![
        Preset::new("web-ready", "Web Ready", ["compress"])
            .with_description("Shrink a document for sharing online")
            .with_icon("globe"),
        Preset::new("scan-cleanup", "Scan Cleanup", ["rotate", "ocr", "compress"])
            .with_description("Straighten scanned pages and make them searchable")
            .with_icon("scanner"),
        Preset::new("secure-share", "Secure Share", ["watermark", "compress", "encrypt"])
            .with_description("Watermark a document and lock it with a password")
            .with_icon("lock"),
        Preset::new("extract-pages", "Extract Pages", ["split", "rotate"])
            .with_description("Break a document apart and fix orientation")
            .with_icon("scissors"),
    ]
}
