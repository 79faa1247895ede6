//! The render pass: header, page-fitting scale, column widths, both rack
//! sides and every unit, in that order, onto one [`Page`].

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::config::RackDiagramConfig;
use crate::constants::{HEADER_IMAGE_MAX_HEIGHT, HEADER_IMAGE_MM_PER_PX, HOLE_ROW, PLINTH_HEIGHT};
use crate::decorate::{DecoratorRegistry, UnitFrame};
use crate::error::{RackError, Result};
use crate::fonts::TextMeasure;
use crate::models::{Rgb, UnitSet};
use crate::page::{Page, TextStyle, fmt_mm};
use crate::scale::{self, ScaleInput};
use crate::site::RackSiteRenderer;
use crate::space::{self, ColumnLayout, SpaceInput};
use crate::unit::UnitRenderer;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Front,
    Back,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlacedUnit {
    pub name: String,
    pub side: Side,
    pub frame: UnitFrame,
}

/// Geometry derived while rendering.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderReport {
    pub columns: ColumnLayout,
    pub rack_top: f64,
    pub front_left: f64,
    pub back_left: f64,
    pub units: Vec<PlacedUnit>,
}

pub struct RenderedPage {
    pub page: Page,
    pub report: RenderReport,
}

pub struct RackLayoutEngine<'a> {
    config: &'a RackDiagramConfig,
    decorators: Option<DecoratorRegistry>,
}

impl<'a> RackLayoutEngine<'a> {
    pub fn new(config: &'a RackDiagramConfig) -> Self {
        let decorators = config
            .decorations_enabled()
            .then(|| DecoratorRegistry::from_covers(config.covers()));
        Self { config, decorators }
    }

    /// Use `registry` for covers instead of the configured one.
    pub fn with_decorators(mut self, registry: DecoratorRegistry) -> Self {
        self.decorators = Some(registry);
        self
    }

    /// Render the whole page. Nothing is returned unless every unit could be
    /// placed.
    pub fn render(
        &self,
        units: &UnitSet,
        measure: Box<dyn TextMeasure>,
        generated_at: DateTime<Utc>,
    ) -> Result<RenderedPage> {
        let cfg = self.config;
        let rack = cfg.rack();
        let setup = cfg.page();
        let layout = cfg.layout();

        // every side has to be known before anything is drawn
        let placements = units
            .iter()
            .map(|unit| {
                if unit.side() == rack.front.identifier {
                    Ok((unit, Side::Front))
                } else if unit.side() == rack.back.identifier {
                    Ok((unit, Side::Back))
                } else {
                    Err(RackError::SideMismatch {
                        unit: unit.name().to_string(),
                        side: unit.side().to_string(),
                        front: rack.front.identifier.clone(),
                        back: rack.back.identifier.clone(),
                    })
                }
            })
            .collect::<Result<Vec<_>>>()?;

        let (width, height) = setup.format.size_mm();
        let margins = setup.margins;
        let font_size = setup.font_size;
        let base = TextStyle::new(setup.font_family.clone(), font_size);
        let mut page = Page::new(width, height, base.bold(), measure);
        page.set_margins(margins, margins);

        self.header(&mut page, &base, generated_at)?;

        let scalar = scale::solve(&ScaleInput {
            page_width: width,
            page_height: height,
            margins,
            rack_height_holes: rack.height_holes,
            rack_width_inches: rack.width_inches,
            min_width_percent: layout.rack_min_width_percent,
            separation_width: layout.separation.width,
            font_size,
        })?;
        let columns = space::allocate(
            page.measure(),
            &SpaceInput {
                page_width: width,
                margins,
                separation_width: layout.separation.width,
                rack_width_inches: rack.width_inches,
                description_max_width_percent: layout.description_max_width_percent,
            },
            scalar,
            units.iter().map(|u| u.name()),
        );
        if layout.show_comments && columns.comment_width <= 0.0 {
            return Err(RackError::NonPositiveDimension {
                what: "comment column width",
                value: columns.comment_width,
            });
        }

        // font sizes double as millimeters here
        let cursor = page.cursor_y();
        let rack_top = cursor + font_size / 2.0;
        let front_left = margins + columns.description_width;
        let back_left = width / 2.0 + layout.separation.width / 2.0 + columns.description_width;
        debug!(rack_top, front_left, back_left, "rack origins");

        if layout.show_separation_line {
            let x = (width + layout.separation.width) / 2.0 - layout.separation.line_width / 2.0;
            let bottom = cursor
                + font_size / 2.0
                + f64::from(rack.height_holes) * scalar * HOLE_ROW
                + scalar * PLINTH_HEIGHT;
            page.set_draw_color(Rgb::BLACK);
            page.set_line_width(layout.separation.line_width);
            page.line(x, cursor, x, bottom);
        }

        let site = RackSiteRenderer {
            columns: &columns,
            rack_height_holes: rack.height_holes,
            rack_width_inches: rack.width_inches,
            hole_count_interval: layout.hole_count_interval,
        };
        site.render(&mut page, &rack.front.description, rack_top, front_left);
        site.render(&mut page, &rack.back.description, rack_top, back_left);

        let unit_renderer = UnitRenderer {
            columns: &columns,
            heights: cfg.heights(),
            rack_height_holes: rack.height_holes,
            rack_width_inches: rack.width_inches,
            show_comments: layout.show_comments,
            decorators: self.decorators.as_ref(),
        };
        let mut placed = Vec::with_capacity(placements.len());
        for (unit, side) in placements {
            let left = match side {
                Side::Front => front_left,
                Side::Back => back_left,
            };
            let frame = unit_renderer.render(&mut page, rack_top, left, unit)?;
            placed.push(PlacedUnit {
                name: unit.name().to_string(),
                side,
                frame,
            });
        }
        info!(
            rack = %rack.name,
            units = placed.len(),
            scalar,
            "rack rendered"
        );

        Ok(RenderedPage {
            page,
            report: RenderReport {
                columns,
                rack_top,
                front_left,
                back_left,
                units: placed,
            },
        })
    }

    /// Name, location and height lines at the top margin, the header image
    /// and the last-update stamp. Leaves the cursor below the height line and
    /// the regular base style active.
    fn header(&self, page: &mut Page, base: &TextStyle, generated_at: DateTime<Utc>) -> Result<()> {
        let cfg = self.config;
        let rack = cfg.rack();
        let setup = cfg.page();
        let font_size = setup.font_size;

        page.write(&rack.name);
        page.ln(font_size / 2.0);
        page.set_style(base.clone());
        if let Some(location) = &rack.location {
            page.write(location);
        }
        page.ln(font_size / 2.0);
        let height_units = fmt_mm(f64::from(rack.height_holes) / 3.0);
        page.write(&format!("{}: {height_units}", rack.height_description));
        page.ln(font_size * 0.8);

        if let Some(path) = &setup.header_image {
            let (w, h) = header_image_size(path)?;
            let href = std::fs::canonicalize(path).map_err(|e| RackError::io(path, e))?;
            page.image(
                page.width() - setup.margins - w,
                setup.margins * 0.8,
                w,
                h,
                &href.to_string_lossy(),
            );
        }

        if let Some(last_update) = &cfg.layout().last_update {
            let local = generated_at.with_timezone(&last_update.timezone);
            let pattern = if last_update.show_time {
                "%d.%m.%Y (%H:%M)"
            } else {
                "%d.%m.%Y"
            };
            let stamp = format!("{}: {}", last_update.prefix, local.format(pattern));
            let y = page.height() - setup.margins;
            page.text(setup.margins, y, &stamp);
        }
        debug!(cursor = page.cursor_y(), "header done");
        Ok(())
    }
}

/// Size of a PNG header image on the page, capped in height.
fn header_image_size(path: &Path) -> Result<(f64, f64)> {
    let invalid = |reason: String| RackError::HeaderImage {
        path: path.to_path_buf(),
        reason,
    };
    let file = File::open(path).map_err(|e| RackError::io(path, e))?;
    let reader = png::Decoder::new(BufReader::new(file))
        .read_info()
        .map_err(|e| invalid(e.to_string()))?;
    let info = reader.info();
    if info.width == 0 || info.height == 0 {
        return Err(invalid("image has no pixels".into()));
    }
    let mut w = f64::from(info.width) * HEADER_IMAGE_MM_PER_PX;
    let mut h = f64::from(info.height) * HEADER_IMAGE_MM_PER_PX;
    if h > HEADER_IMAGE_MAX_HEIGHT {
        w *= HEADER_IMAGE_MAX_HEIGHT / h;
        h = HEADER_IMAGE_MAX_HEIGHT;
    }
    Ok((w, h))
}
