//! TrueType/OpenType faces via `rusttype`, discovered with `fontdb`.
//!
//! Faces are keyed by normalized family name plus bold/italic flags. Lookup
//! falls back from the exact style to any style of the family, then to the
//! configured fallback family. A miss after that is a missing dependency.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use kotak_common::config::FontConfig;
use kotak_common::error::{KotakError, KotakResult};
use kotak_layout::measure::TextMeasurer;
use kotak_model::font::{family_key, FontSpec, FontWeight};
use rusttype::{point, Font, Scale};

use crate::glyphs::{CoveragePlot, GlyphBackend};

/// Weights from here up fill the bold slot.
const BOLD_THRESHOLD: u16 = 600;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FaceKey {
    family: String,
    bold: bool,
    italic: bool,
}

/// A set of loaded faces.
#[derive(Clone, Default)]
pub struct FontBook {
    faces: HashMap<FaceKey, Arc<Font<'static>>>,
    fallback_family: Option<String>,
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("faces", &self.faces.len())
            .field("fallback_family", &self.fallback_family)
            .finish()
    }
}

impl FontBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan every configured directory that exists.
    pub fn from_config(config: &FontConfig) -> KotakResult<Self> {
        let mut book = Self::new().with_fallback(&config.fallback_family);
        for dir in &config.dirs {
            if !dir.is_dir() {
                tracing::debug!(dir = %dir.display(), "Skipping missing font directory");
                continue;
            }
            let loaded = book.scan_dir(dir)?;
            tracing::debug!(dir = %dir.display(), loaded, "Scanned font directory");
        }
        tracing::info!(faces = book.faces.len(), "Font book ready");
        Ok(book)
    }

    pub fn with_fallback(mut self, family: &str) -> Self {
        self.fallback_family = Some(family.to_string());
        self
    }

    /// Register a face from raw font bytes.
    pub fn register(
        &mut self,
        family: &str,
        weight: FontWeight,
        italic: bool,
        bytes: Vec<u8>,
    ) -> KotakResult<()> {
        let font = Font::try_from_vec(bytes)
            .ok_or_else(|| KotakError::dependency(format!("Unreadable font data for {family}")))?;
        self.faces.insert(
            FaceKey {
                family: family_key(family),
                bold: weight == FontWeight::Bold,
                italic,
            },
            Arc::new(font),
        );
        Ok(())
    }

    /// Load every font face under `dir`, recursively. Family, weight and
    /// style come from each face's own tables, not from the file name.
    /// Returns the number of faces loaded.
    pub fn scan_dir(&mut self, dir: &Path) -> KotakResult<usize> {
        if !dir.is_dir() {
            return Err(KotakError::FileNotFound {
                path: dir.to_path_buf(),
            });
        }
        let mut db = fontdb::Database::new();
        db.load_fonts_dir(dir);

        let (ids, infos): (Vec<fontdb::ID>, Vec<FaceInfo>) = db
            .faces()
            .filter_map(|face| {
                let (family, _) = face.families.first()?;
                Some((
                    face.id,
                    FaceInfo {
                        family: family.clone(),
                        weight: face.weight.0,
                        italic: face.style != fontdb::Style::Normal,
                    },
                ))
            })
            .unzip();

        let mut loaded = 0;
        for (key, i) in select_faces(&infos) {
            let font = db
                .with_face_data(ids[i], |data, index| {
                    Font::try_from_vec_and_index(data.to_vec(), index)
                })
                .flatten();
            match font {
                Some(font) => {
                    self.faces.insert(key, Arc::new(font));
                    loaded += 1;
                }
                None => {
                    tracing::warn!(family = %infos[i].family, "Skipping unreadable font face");
                }
            }
        }
        Ok(loaded)
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Whether any face of `family` is registered.
    pub fn has_family(&self, family: &str) -> bool {
        let key = family_key(family);
        self.faces.keys().any(|k| k.family == key)
    }

    /// Registered family keys, sorted.
    pub fn families(&self) -> Vec<String> {
        let mut families: Vec<String> = self.faces.keys().map(|k| k.family.clone()).collect();
        families.sort();
        families.dedup();
        families
    }

    fn face(&self, font: &FontSpec) -> KotakResult<&Font<'static>> {
        let bold = font.weight == FontWeight::Bold;
        self.best_in_family(&font.family_key(), bold, font.italic)
            .or_else(|| {
                self.fallback_family
                    .as_deref()
                    .and_then(|f| self.best_in_family(&family_key(f), bold, font.italic))
            })
            .map(|f| &**f)
            .ok_or_else(|| {
                KotakError::dependency(format!("No font face available for {}", font.family))
            })
    }

    fn best_in_family(&self, family: &str, bold: bool, italic: bool) -> Option<&Arc<Font<'static>>> {
        let candidates = [
            (bold, italic),
            (bold, false),
            (false, italic),
            (false, false),
            (true, true),
            (true, false),
            (false, true),
        ];
        candidates.iter().find_map(|&(bold, italic)| {
            self.faces.get(&FaceKey {
                family: family.to_string(),
                bold,
                italic,
            })
        })
    }
}

/// One face as described by its name and OS/2 tables.
#[derive(Debug, Clone, PartialEq)]
struct FaceInfo {
    family: String,
    weight: u16,
    italic: bool,
}

impl FaceInfo {
    fn key(&self) -> FaceKey {
        FaceKey {
            family: family_key(&self.family),
            bold: self.weight >= BOLD_THRESHOLD,
            italic: self.italic,
        }
    }

    /// Distance from the weight its slot stands for (400 or 700).
    fn weight_distance(&self) -> u16 {
        let target = if self.weight >= BOLD_THRESHOLD { 700 } else { 400 };
        self.weight.abs_diff(target)
    }
}

/// For each slot, the index of the face whose weight is nearest the slot's.
/// Ties keep the first face seen.
fn select_faces(faces: &[FaceInfo]) -> HashMap<FaceKey, usize> {
    let mut chosen: HashMap<FaceKey, usize> = HashMap::new();
    for (i, face) in faces.iter().enumerate() {
        let key = face.key();
        match chosen.get(&key) {
            Some(&j) if faces[j].weight_distance() <= face.weight_distance() => {}
            _ => {
                chosen.insert(key, i);
            }
        }
    }
    chosen
}

/// Scale that makes `size_px` the em size, as CSS font sizes are.
fn em_scale(font: &Font<'_>, size_px: f64) -> Scale {
    let metrics = font.v_metrics_unscaled();
    let height = metrics.ascent - metrics.descent;
    let units = font.units_per_em().max(1) as f32;
    Scale::uniform(size_px as f32 * height / units)
}

impl TextMeasurer for FontBook {
    fn measure_text_width(&self, text: &str, font: &FontSpec) -> KotakResult<f64> {
        let face = self.face(font)?;
        let scale = em_scale(face, font.size_px);

        let mut width = 0.0f32;
        let mut previous = None;
        for glyph in face.glyphs_for(text.chars()) {
            let glyph = glyph.scaled(scale);
            if let Some(prev) = previous {
                width += face.pair_kerning(scale, prev, glyph.id());
            }
            width += glyph.h_metrics().advance_width;
            previous = Some(glyph.id());
        }
        Ok(width as f64)
    }
}

impl GlyphBackend for FontBook {
    fn name(&self) -> &str {
        "rusttype"
    }

    fn rasterize(
        &self,
        text: &str,
        x: f64,
        top: f64,
        font: &FontSpec,
        plot: &mut CoveragePlot<'_>,
    ) -> KotakResult<()> {
        let face = self.face(font)?;
        let scale = em_scale(face, font.size_px);
        let baseline = top as f32 + face.v_metrics(scale).ascent;

        for glyph in face.layout(text, scale, point(x as f32, baseline)) {
            if let Some(bb) = glyph.pixel_bounding_box() {
                glyph.draw(|gx, gy, coverage| {
                    plot(bb.min.x + gx as i32, bb.min.y + gy as i32, coverage);
                });
            }
        }
        Ok(())
    }
}
