//! Text measurement for the page surface.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};
use usvg::fontdb::{Database, Family, Query, Source};

use crate::constants::PT_MM;
use crate::error::{RackError, Result};

/// Measures how wide a string is when set at a given size.
pub trait TextMeasure {
    /// Width in millimeters of `text` at `size_pt`.
    fn text_width(&self, text: &str, size_pt: f64) -> f64;
}

/// Fixed average advance per character, as a fraction of the font size.
#[derive(Clone, Copy, Debug)]
pub struct EstimatedMetrics {
    pub em_ratio: f64,
}

impl Default for EstimatedMetrics {
    fn default() -> Self {
        Self { em_ratio: 0.5 }
    }
}

impl TextMeasure for EstimatedMetrics {
    fn text_width(&self, text: &str, size_pt: f64) -> f64 {
        text.chars().count() as f64 * size_pt * PT_MM * self.em_ratio
    }
}

/// Real glyph advances of one font face.
#[derive(Clone)]
pub struct FontFileMetrics {
    data: Arc<Vec<u8>>,
    index: u32,
    units_per_em: f64,
    fallback_advance: f64,
}

impl std::fmt::Debug for FontFileMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFileMetrics")
            .field("index", &self.index)
            .field("units_per_em", &self.units_per_em)
            .finish()
    }
}

impl FontFileMetrics {
    pub fn from_data(data: Vec<u8>, index: u32) -> Option<Self> {
        let face = ttf_parser::Face::parse(&data, index).ok()?;
        let units_per_em = f64::from(face.units_per_em());
        // missing glyphs advance like a space, or half an em
        let fallback_advance = face
            .glyph_index(' ')
            .and_then(|g| face.glyph_hor_advance(g))
            .map(f64::from)
            .unwrap_or(units_per_em / 2.0);
        Some(Self {
            data: Arc::new(data),
            index,
            units_per_em,
            fallback_advance,
        })
    }

    /// Face best matching `family` in `db`, falling back to sans-serif.
    pub fn from_database(db: &Database, family: &str) -> Option<Self> {
        let families = [Family::Name(family), Family::SansSerif];
        let query = Query {
            families: &families,
            ..Query::default()
        };
        let id = db.query(&query)?;
        let (data, index) = db.with_face_data(id, |data, index| (data.to_vec(), index))?;
        Self::from_data(data, index)
    }
}

impl TextMeasure for FontFileMetrics {
    fn text_width(&self, text: &str, size_pt: f64) -> f64 {
        let Ok(face) = ttf_parser::Face::parse(&self.data, self.index) else {
            return EstimatedMetrics::default().text_width(text, size_pt);
        };
        let units: f64 = text
            .chars()
            .map(|c| {
                face.glyph_index(c)
                    .and_then(|g| face.glyph_hor_advance(g))
                    .map(f64::from)
                    .unwrap_or(self.fallback_advance)
            })
            .sum();
        units / self.units_per_em * size_pt * PT_MM
    }
}

/// System fonts plus an optional explicit font file, which then also serves
/// as the generic sans-serif family.
pub fn load_database(font_file: Option<&Path>) -> Result<Database> {
    let mut db = Database::new();
    db.load_system_fonts();
    if let Some(path) = font_file {
        let data = std::fs::read(path).map_err(|e| RackError::io(path, e))?;
        let ids = db.load_font_source(Source::Binary(Arc::new(data)));
        let family_name = ids
            .first()
            .and_then(|id| db.face(*id))
            .and_then(|face| face.families.first().map(|(n, _)| n.clone()));
        if let Some(name) = family_name {
            debug!(family = %name, path = %path.display(), "using font file as sans-serif");
            db.set_sans_serif_family(name);
        } else {
            warn!(path = %path.display(), "font file contains no usable face");
        }
    }
    Ok(db)
}

/// Metrics for `family`, or the estimate when no face could be found.
pub fn metrics_for(db: &Database, family: &str) -> Box<dyn TextMeasure> {
    match FontFileMetrics::from_database(db, family) {
        Some(metrics) => Box::new(metrics),
        None => {
            warn!(family, "no font face found, text widths are estimated");
            Box::new(EstimatedMetrics::default())
        }
    }
}
