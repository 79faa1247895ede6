//! Drawing a single unit: its rectangle, border lines, name, cover and comment.

use tracing::{trace, warn};

use crate::constants::{BASELINE_SHIFT, COMMENT_GUTTER, HOLE_ROW, LABEL_FONT, PT_MM};
use crate::decorate::{DecoratorRegistry, UnitFrame};
use crate::error::Result;
use crate::height::HeightResolver;
use crate::models::{Rgb, Unit};
use crate::page::Page;
use crate::space::ColumnLayout;
use crate::text::{CommentArea, CommentLayout, fit_font_size, layout_comment};

const UNIT_LINE: f64 = 0.14;
/// Left edge of a unit past the rack's left edge, multiplied by the scalar.
const UNIT_INSET: f64 = 0.5851;
const UNIT_GAP: f64 = 0.1;
/// Taken off the rack width so a unit does not cover the right post.
const UNIT_WIDTH_TRIM: f64 = 0.26;
/// Fill overhang to the right, multiplied by the scalar.
const FILL_OVERHANG: f64 = 0.014;

pub struct UnitRenderer<'a> {
    pub columns: &'a ColumnLayout,
    pub heights: &'a HeightResolver,
    pub rack_height_holes: u32,
    pub rack_width_inches: u32,
    pub show_comments: bool,
    /// `None` when decorations are disabled.
    pub decorators: Option<&'a DecoratorRegistry>,
}

impl UnitRenderer<'_> {
    /// Draw `unit` on the side whose frame starts at (`left`, `top`).
    pub fn render(&self, page: &mut Page, top: f64, left: f64, unit: &Unit) -> Result<UnitFrame> {
        let s = self.columns.scalar;
        let row = HOLE_ROW * s;
        let holes = self.heights.resolve(unit.height())?;
        let last_hole = u64::from(unit.position()) - 1 + u64::from(holes);
        if last_hole > u64::from(self.rack_height_holes) {
            warn!(
                unit = unit.name(),
                position = unit.position(),
                holes,
                rack_holes = self.rack_height_holes,
                "unit reaches below the rack"
            );
        }

        let frame = UnitFrame {
            x: left + UNIT_INSET * s + UNIT_GAP,
            y: top + f64::from(unit.position() - 1) * row,
            w: f64::from(self.rack_width_inches) * s - UNIT_WIDTH_TRIM,
            h: f64::from(holes) * row,
            scalar: s,
        };
        let middle = frame.y + s * BASELINE_SHIFT + frame.h / 2.0;

        page.set_line_width(UNIT_LINE);
        page.set_draw_color(Rgb::BLACK);
        page.set_fill_color(unit.color().unwrap_or_default());

        let label = format!("{} ", unit.name());
        let name_size = fit_font_size(
            page.measure(),
            &label,
            self.columns.description_width,
            s * LABEL_FONT,
        );
        let name_style = page.style().regular().sized(name_size);
        page.with_style(name_style, |page| {
            let x = left - page.string_width(&label);
            page.text(x, middle, unit.name());
        });

        page.fill_rect(frame.x, frame.y, frame.w + FILL_OVERHANG * s, frame.h);
        let rack_right = left + self.columns.rack_width_mm;
        page.line(left, frame.y, rack_right, frame.y);
        page.line(left, frame.y + frame.h, rack_right, frame.y + frame.h);

        if let (Some(registry), Some(unit_type)) = (self.decorators, unit.unit_type()) {
            if let Some(decorator) = registry.get(unit_type) {
                decorator.decorate(page, &frame);
            }
        }

        if self.show_comments {
            if let Some(comment) = unit.comment() {
                self.render_comment(page, &frame, rack_right, holes, name_size, comment);
            }
        }
        trace!(unit = unit.name(), y = frame.y, h = frame.h, "unit drawn");
        Ok(frame)
    }

    fn render_comment(
        &self,
        page: &mut Page,
        frame: &UnitFrame,
        rack_right: f64,
        holes: u32,
        name_size: f64,
        comment: &str,
    ) {
        let s = self.columns.scalar;
        let area = CommentArea {
            width: self.columns.comment_width,
            unit_height: frame.h,
            leading_pt: s * BASELINE_SHIFT,
        };
        let preferred = s * LABEL_FONT;
        let measure = page.measure();
        let Some(layout) = layout_comment(measure, comment, holes, &area, name_size, preferred)
        else {
            return;
        };
        let x = rack_right + COMMENT_GUTTER + self.columns.hole_space;
        let top = frame.y + s * BASELINE_SHIFT;
        match layout {
            CommentLayout::Single { text, font_size } => {
                let style = page.style().italic().sized(font_size);
                page.with_style(style, |page| page.text(x, top + frame.h / 2.0, &text));
            }
            CommentLayout::Wrapped(wrapped) => {
                let step = wrapped.font_size * PT_MM;
                let lines = wrapped.lines.len() as f64;
                let mut y = top + (frame.h - (lines - 1.0) * step) / 2.0;
                let style = page.style().italic().sized(wrapped.font_size);
                page.with_style(style, |page| {
                    for line in &wrapped.lines {
                        page.text(x, y, line);
                        y += step;
                    }
                });
            }
        }
    }
}
