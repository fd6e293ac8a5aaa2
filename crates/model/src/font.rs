//! Font descriptions and the family catalog offered by the font picker.

use serde::{Deserialize, Serialize};

/// Font weight. Only the two weights the picker exposes are modeled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

impl FontWeight {
    /// Parse the CSS keywords and numeric weights the shell may send.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "normal" | "regular" | "400" => Some(Self::Normal),
            "bold" | "700" | "800" | "900" => Some(Self::Bold),
            _ => None,
        }
    }
}

/// Everything needed to pick a face and size it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub family: String,
    #[serde(default)]
    pub weight: FontWeight,
    #[serde(default)]
    pub italic: bool,
    /// Em size in working-resolution pixels.
    pub size_px: f64,
}

impl FontSpec {
    pub fn new(family: impl Into<String>, size_px: f64) -> Self {
        Self {
            family: family.into(),
            weight: FontWeight::Normal,
            italic: false,
            size_px,
        }
    }

    pub fn with_weight(mut self, weight: FontWeight) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_italic(mut self, italic: bool) -> Self {
        self.italic = italic;
        self
    }

    /// Same face at a different size.
    pub fn at_size(&self, size_px: f64) -> Self {
        Self {
            size_px,
            ..self.clone()
        }
    }

    /// Lookup key for the family, see [`family_key`].
    pub fn family_key(&self) -> String {
        family_key(&self.family)
    }
}

/// Normalize a family name for lookups: lowercase ASCII alphanumerics only,
/// so "Space Mono", "space-mono" and "SpaceMono" all collide.
pub fn family_key(family: &str) -> String {
    family
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// One entry in the font picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontChoice {
    /// Short label shown on the picker button.
    pub label: &'static str,
    /// Family name passed through to the renderer.
    pub family: &'static str,
}

/// Families offered by the font picker, in display order.
pub const FONT_CATALOG: [FontChoice; 8] = [
    FontChoice {
        label: "Klasik",
        family: "Arial",
    },
    FontChoice {
        label: "Inter",
        family: "Inter",
    },
    FontChoice {
        label: "Serif",
        family: "Merriweather",
    },
    FontChoice {
        label: "Mono",
        family: "Space Mono",
    },
    FontChoice {
        label: "Comic",
        family: "Comic Sans MS",
    },
    FontChoice {
        label: "Impact",
        family: "Impact",
    },
    FontChoice {
        label: "Poppins",
        family: "Poppins",
    },
    FontChoice {
        label: "C. Neue",
        family: "Comic Neue",
    },
];

/// Look up a catalog entry by family name (normalized).
pub fn catalog_entry(family: &str) -> Option<&'static FontChoice> {
    let key = family_key(family);
    FONT_CATALOG.iter().find(|c| family_key(c.family) == key)
}
