//! Request flags shared by `render` and `layout`.

use std::path::PathBuf;

use clap::Args;
use kotak_common::config::CanvasDefaults;
use kotak_model::color::Rgba;
use kotak_model::font::{catalog_entry, FontWeight};
use kotak_model::geometry::AspectRatio;
use kotak_model::request::{BackgroundSource, RenderMode, RenderRequest};

#[derive(Args, Debug, Clone, Default)]
pub struct RequestArgs {
    /// Text to render
    #[arg(short, long, conflicts_with = "text_file")]
    pub text: Option<String>,

    /// Read the text from a file
    #[arg(long)]
    pub text_file: Option<PathBuf>,

    /// Load a full render request from a JSON file; other flags override it
    #[arg(long)]
    pub request: Option<PathBuf>,

    /// Presentation mode: normal|weird|serious
    #[arg(short, long)]
    pub mode: Option<String>,

    /// Weirdness level (1-5)
    #[arg(long)]
    pub level: Option<u8>,

    /// Seed for weird line grouping
    #[arg(long, allow_hyphen_values = true)]
    pub seed: Option<i64>,

    /// Font family
    #[arg(long)]
    pub font: Option<String>,

    /// Use the bold weight
    #[arg(long)]
    pub bold: bool,

    /// Aspect ratio: square|story
    #[arg(long)]
    pub aspect: Option<String>,

    /// Logical canvas width
    #[arg(long)]
    pub width: Option<f64>,

    /// Background color (#rrggbb)
    #[arg(long)]
    pub background: Option<String>,

    /// Text color (#rrggbb)
    #[arg(long)]
    pub color: Option<String>,

    /// Background image file
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Sticker glyph painted bottom-right
    #[arg(long)]
    pub sticker: Option<String>,

    /// Text blur level
    #[arg(long)]
    pub blur: Option<f64>,
}

impl RequestArgs {
    /// Build and validate the request: JSON file or config defaults first,
    /// then every flag that was given.
    pub fn build(&self, defaults: &CanvasDefaults) -> anyhow::Result<RenderRequest> {
        let mut request = match &self.request {
            Some(path) => RenderRequest::from_json_file(path)?,
            None => RenderRequest::from_defaults(defaults, String::new())?,
        };

        if let Some(text) = &self.text {
            request.text = text.clone();
        } else if let Some(path) = &self.text_file {
            request.text = std::fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", path.display()))?;
        } else if self.request.is_none() {
            anyhow::bail!("Provide --text, --text-file or --request");
        }

        if let Some(mode) = &self.mode {
            request.mode = RenderMode::parse(mode)
                .ok_or_else(|| anyhow::anyhow!("Unknown mode: {mode}. Use: normal, weird, serious"))?;
        }
        if let Some(level) = self.level {
            request.weirdness_level = level;
        }
        if let Some(seed) = self.seed {
            request.random_seed = seed;
        }
        if let Some(font) = &self.font {
            if catalog_entry(font).is_none() {
                tracing::warn!(font = %font, "Font is not in the picker catalog");
            }
            request.font_family = font.clone();
        }
        if self.bold {
            request.font_weight = FontWeight::Bold;
        }
        if let Some(aspect) = &self.aspect {
            request.aspect_ratio = AspectRatio::parse(aspect)
                .ok_or_else(|| anyhow::anyhow!("Unknown aspect: {aspect}. Use: square, story"))?;
        }
        if let Some(width) = self.width {
            request.width = width;
        }
        if let Some(color) = &self.background {
            request.background_color = parse_color(color)?;
        }
        if let Some(color) = &self.color {
            request.text_color = parse_color(color)?;
        }
        if let Some(path) = &self.image {
            request.background_image = Some(BackgroundSource::Path(path.clone()));
        }
        if let Some(sticker) = &self.sticker {
            request.sticker = Some(sticker.clone());
        }
        if let Some(blur) = self.blur {
            request.blur_level = blur;
        }

        request.validate()?;
        Ok(request)
    }
}

fn parse_color(value: &str) -> anyhow::Result<Rgba> {
    Rgba::from_hex(value).map_err(|e| anyhow::anyhow!("Invalid color {value}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(text: &str) -> RequestArgs {
        RequestArgs {
            text: Some(text.to_string()),
            ..RequestArgs::default()
        }
    }

    #[test]
    fn test_flags_override_defaults() {
        let request = RequestArgs {
            mode: Some("weird".to_string()),
            level: Some(5),
            seed: Some(-3),
            aspect: Some("story".to_string()),
            color: Some("#ff0000".to_string()),
            bold: true,
            ..args("halo dunia")
        }
        .build(&CanvasDefaults::default())
        .unwrap();

        assert_eq!(request.text, "halo dunia");
        assert_eq!(request.mode, RenderMode::Weird);
        assert_eq!(request.weirdness_level, 5);
        assert_eq!(request.random_seed, -3);
        assert_eq!(request.aspect_ratio, AspectRatio::Story);
        assert_eq!(request.text_color, Rgba::rgb(255, 0, 0));
        assert_eq!(request.font_weight, FontWeight::Bold);
    }

    #[test]
    fn test_text_is_required_without_request_file() {
        let err = RequestArgs::default()
            .build(&CanvasDefaults::default())
            .unwrap_err();
        assert!(err.to_string().contains("--text"));
    }

    #[test]
    fn test_bad_mode_is_rejected() {
        let err = RequestArgs {
            mode: Some("chaos".to_string()),
            ..args("x")
        }
        .build(&CanvasDefaults::default())
        .unwrap_err();
        assert!(err.to_string().contains("Unknown mode"));
    }

    #[test]
    fn test_request_file_is_loaded() {
        let dir = std::env::temp_dir().join(format!("kotak-cli-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("request.json");
        std::fs::write(&path, r#"{ "text": "dari file", "mode": "serious" }"#).unwrap();

        let request = RequestArgs {
            request: Some(path.clone()),
            ..RequestArgs::default()
        }
        .build(&CanvasDefaults::default())
        .unwrap();
        assert_eq!(request.text, "dari file");
        assert_eq!(request.mode, RenderMode::Serious);

        std::fs::remove_dir_all(&dir).ok();
    }
}
