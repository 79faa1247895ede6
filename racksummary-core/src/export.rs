//! Encoding a rendered page as PDF, SVG or PNG, and handing the bytes to
//! their destination.

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Timelike, Utc};
use pdf_writer::{Content, Date, Finish, Name, Pdf, Rect, Ref, TextStr};
use png::{BitDepth, ColorType, Compression, Encoder, FilterType};
use tracing::{debug, info};
use usvg::fontdb::Database;

use crate::config::{OutputDestination, OutputEncoding, OutputOptions, RackDiagramConfig};
use crate::constants::INCH_MM;
use crate::error::{RackError, Result};
use crate::page::Page;

/// SVG user units per millimeter as usvg sees them.
const SVG_PX_PER_MM: f64 = 96.0 / INCH_MM;
const PT_PER_MM: f64 = 72.0 / INCH_MM;

/// Encode `page` the way `config` asks for.
pub fn encode(
    page: &Page,
    config: &RackDiagramConfig,
    fontdb: Arc<Database>,
    generated_at: DateTime<Utc>,
) -> Result<Vec<u8>> {
    let bytes = match config.output().encoding {
        OutputEncoding::Svg => page.to_svg().into_bytes(),
        OutputEncoding::Png => to_png(page, fontdb, config.output().px_per_mm)?,
        OutputEncoding::Pdf => to_pdf(page, fontdb, &PdfInfo::from_config(config), generated_at)?,
    };
    debug!(
        encoding = config.output().encoding.extension(),
        bytes = bytes.len(),
        "page encoded"
    );
    Ok(bytes)
}

/// Rasterise the page at `px_per_mm`.
pub fn to_png(page: &Page, fontdb: Arc<Database>, px_per_mm: f64) -> Result<Vec<u8>> {
    let svg = page.to_svg();
    let opt = resvg::usvg::Options {
        fontdb,
        ..Default::default()
    };
    let tree = resvg::usvg::Tree::from_str(&svg, &opt)
        .map_err(|e| RackError::Surface(format!("SVG parse error: {e:?}")))?;
    let w_px = (page.width() * px_per_mm).ceil() as u32;
    let h_px = (page.height() * px_per_mm).ceil() as u32;
    let mut pixmap = tiny_skia::Pixmap::new(w_px, h_px)
        .ok_or_else(|| RackError::Surface(format!("pixmap alloc failed ({w_px}x{h_px})")))?;
    let k = (px_per_mm / SVG_PX_PER_MM) as f32;
    resvg::render(&tree, tiny_skia::Transform::from_scale(k, k), &mut pixmap.as_mut());
    encode_png_deterministic(&pixmap)
}

// RGBA -> PNG bytes, identical for identical pixels
fn encode_png_deterministic(pixmap: &tiny_skia::Pixmap) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    {
        let mut enc = Encoder::new(&mut buf, pixmap.width(), pixmap.height());
        enc.set_color(ColorType::Rgba);
        enc.set_depth(BitDepth::Eight);
        enc.set_filter(FilterType::NoFilter);
        enc.set_compression(Compression::Default);
        let mut writer = enc.write_header()?;
        writer.write_image_data(pixmap.data())?;
    }
    Ok(buf)
}

/// Document information dictionary entries.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PdfInfo {
    pub title: String,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Vec<String>,
    pub creator: String,
}

impl PdfInfo {
    /// Title falls back to the rack name, subject to the rack description.
    pub fn from_config(config: &RackDiagramConfig) -> Self {
        let doc = config.document();
        let rack = config.rack();
        Self {
            title: doc.title.clone().unwrap_or_else(|| rack.name.clone()),
            author: doc.author.clone(),
            subject: doc.subject.clone().or_else(|| rack.description.clone()),
            keywords: doc.keywords.clone(),
            creator: doc.creator.clone(),
        }
    }
}

/// One PDF page of the page's size with the drawing placed as a form XObject.
pub fn to_pdf(
    page: &Page,
    fontdb: Arc<Database>,
    meta: &PdfInfo,
    generated_at: DateTime<Utc>,
) -> Result<Vec<u8>> {
    let svg = page.to_svg();
    let opt = svg2pdf::usvg::Options {
        fontdb,
        ..Default::default()
    };
    let tree = svg2pdf::usvg::Tree::from_str(&svg, &opt)
        .map_err(|e| RackError::Surface(format!("SVG parse error: {e:?}")))?;
    let (svg_chunk, svg_ref) = svg2pdf::to_chunk(&tree, svg2pdf::ConversionOptions::default())
        .map_err(|e| RackError::Surface(format!("PDF conversion failed: {e:?}")))?;

    let mut alloc = Ref::new(1);
    let catalog_id = alloc.bump();
    let page_tree_id = alloc.bump();
    let page_id = alloc.bump();
    let content_id = alloc.bump();
    let info_id = alloc.bump();

    let mut map = HashMap::new();
    let svg_chunk = svg_chunk.renumber(|old| *map.entry(old).or_insert_with(|| alloc.bump()));
    let svg_id = map
        .get(&svg_ref)
        .copied()
        .ok_or_else(|| RackError::Surface("PDF conversion lost the drawing".into()))?;

    let w_pt = (page.width() * PT_PER_MM) as f32;
    let h_pt = (page.height() * PT_PER_MM) as f32;
    let name = Name(b"S1");

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(page_tree_id);
    pdf.pages(page_tree_id).kids([page_id]).count(1);
    {
        let mut pdf_page = pdf.page(page_id);
        pdf_page.media_box(Rect::new(0.0, 0.0, w_pt, h_pt));
        pdf_page.parent(page_tree_id);
        pdf_page.contents(content_id);
        pdf_page.resources().x_objects().pair(name, svg_id);
        pdf_page.finish();
    }

    // the drawing is a unit square; stretch it over the page
    let mut content = Content::new();
    content.save_state();
    content.transform([w_pt, 0.0, 0.0, h_pt, 0.0, 0.0]);
    content.x_object(name);
    content.restore_state();
    pdf.stream(content_id, &content.finish());

    {
        let mut doc = pdf.document_info(info_id);
        doc.title(TextStr(&meta.title));
        if let Some(author) = &meta.author {
            doc.author(TextStr(author));
        }
        if let Some(subject) = &meta.subject {
            doc.subject(TextStr(subject));
        }
        if !meta.keywords.is_empty() {
            doc.keywords(TextStr(&meta.keywords.join(", ")));
        }
        doc.creator(TextStr(&meta.creator));
        doc.producer(TextStr(concat!("racksummary ", env!("CARGO_PKG_VERSION"))));
        doc.creation_date(pdf_date(generated_at));
        doc.finish();
    }

    pdf.extend(&svg_chunk);
    Ok(pdf.finish())
}

fn pdf_date(t: DateTime<Utc>) -> Date {
    Date::new(u16::try_from(t.year()).unwrap_or(0))
        .month(t.month() as u8)
        .day(t.day() as u8)
        .hour(t.hour() as u8)
        .minute(t.minute() as u8)
        .second(t.second() as u8)
        .utc_offset_hour(0)
        .utc_offset_minute(0)
}

/// Hand the encoded bytes to the configured destination: the output file,
/// or `stream` for download and inline display.
pub fn deliver(bytes: &[u8], output: &OutputOptions, stream: &mut impl Write) -> Result<()> {
    match output.destination {
        OutputDestination::File => {
            let path = output.path.as_deref().ok_or(RackError::MissingOutputPath)?;
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir).map_err(|e| RackError::io(dir, e))?;
            }
            std::fs::write(path, bytes).map_err(|e| RackError::io(path, e))?;
            info!(path = %path.display(), bytes = bytes.len(), "output written");
        }
        OutputDestination::Download | OutputDestination::Inline => {
            stream
                .write_all(bytes)
                .and_then(|()| stream.flush())
                .map_err(|e| RackError::io("<stdout>", e))?;
            info!(
                destination = ?output.destination,
                mime = output.encoding.mime_type(),
                bytes = bytes.len(),
                "output streamed"
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::config::RackDiagramConfigBuilder;
    use crate::fonts::EstimatedMetrics;
    use crate::layout::RackLayoutEngine;
    use crate::models::{Rgb, Unit, UnitSet};
    use crate::page::TextStyle;

    fn when() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn small_page() -> Page {
        let mut page = Page::new(
            20.0,
            10.0,
            TextStyle::new("Arial", 12.0),
            Box::new(EstimatedMetrics::default()),
        );
        page.set_fill_color(Rgb::BLACK);
        page.fill_rect(0.0, 0.0, 10.0, 10.0);
        page
    }

    fn fonts() -> Arc<Database> {
        Arc::new(Database::new())
    }

    #[test]
    fn png_has_the_requested_resolution() {
        let bytes = to_png(&small_page(), fonts(), 4.0).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        let decoder = png::Decoder::new(std::io::Cursor::new(&bytes));
        let reader = decoder.read_info().unwrap();
        assert_eq!((reader.info().width, reader.info().height), (80, 40));
    }

    #[test]
    fn png_is_deterministic() {
        let a = to_png(&small_page(), fonts(), 2.0).unwrap();
        let b = to_png(&small_page(), fonts(), 2.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn pdf_has_one_page_and_metadata() {
        let meta = PdfInfo {
            title: "Test Rack".into(),
            author: Some("Ops".into()),
            subject: None,
            keywords: vec!["rack".into(), "test".into()],
            creator: "RackSummary".into(),
        };
        let bytes = to_pdf(&small_page(), fonts(), &meta, when()).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Title"));
        assert!(text.contains("/Author"));
        assert!(!text.contains("/Subject"));
        assert!(text.contains("/Keywords"));
        assert!(text.contains("/CreationDate"));
        assert!(text.contains("/Count 1"));
        assert!(text.trim_end().ends_with("%%EOF"));
    }

    #[test]
    fn info_falls_back_to_rack_fields() {
        let mut b = RackDiagramConfigBuilder::new("R1", "10he").unwrap();
        b.rack_description("row 3").unwrap().output_destination("inline").unwrap();
        let info = PdfInfo::from_config(&b.build().unwrap());
        assert_eq!(info.title, "R1");
        assert_eq!(info.subject.as_deref(), Some("row 3"));
    }

    #[test]
    fn encode_follows_the_configured_encoding() {
        let mut b = RackDiagramConfigBuilder::new("R1", "10he").unwrap();
        b.output_destination("inline").unwrap().output_encoding("svg").unwrap();
        let config = b.build().unwrap();
        let mut units = UnitSet::new();
        units.insert(Unit::new("srv1", "front", 1, "1he").unwrap()).unwrap();
        let rendered = RackLayoutEngine::new(&config)
            .render(&units, Box::new(EstimatedMetrics::default()), when())
            .unwrap();
        let bytes = encode(&rendered.page, &config, fonts(), when()).unwrap();
        let svg = String::from_utf8(bytes).unwrap();
        assert!(svg.starts_with("<?xml"));
        assert!(svg.contains(">srv1</text>"));
    }

    #[test]
    fn file_destination_writes_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let output = OutputOptions {
            destination: OutputDestination::File,
            path: Some(dir.path().join("nested/rack.svg")),
            encoding: OutputEncoding::Svg,
            px_per_mm: 4.0,
        };
        let mut stream = Vec::new();
        deliver(b"<svg/>", &output, &mut stream).unwrap();
        assert!(stream.is_empty());
        assert_eq!(std::fs::read(dir.path().join("nested/rack.svg")).unwrap(), b"<svg/>");
    }

    #[test]
    fn streamed_destinations_write_to_the_stream() {
        let output = OutputOptions {
            destination: OutputDestination::Inline,
            path: None,
            encoding: OutputEncoding::Pdf,
            px_per_mm: 4.0,
        };
        let mut stream = Vec::new();
        deliver(b"%PDF-", &output, &mut stream).unwrap();
        assert_eq!(stream, b"%PDF-");

        let missing = OutputOptions {
            destination: OutputDestination::File,
            ..output
        };
        assert_eq!(deliver(b"x", &missing, &mut stream).unwrap_err().code(), 50);
    }
}
