//! One side of the rack: label, frame, mounting holes, hole numerals, plinth.

use crate::constants::{
    HOLE_INSET, HOLE_ROW, HOLE_SIZE, LABEL_FONT, NUMERAL_FONT, NUMERAL_GUTTER, PLINTH_HEIGHT,
    POST_WIDTH, RIGHT_HOLE_OFFSET,
};
use crate::models::Rgb;
use crate::page::{Align, Page};
use crate::space::ColumnLayout;
use crate::text::fit_font_size;

const FRAME_LINE: f64 = 0.2;
const HOLE_LINE: f64 = 0.14;
/// The plinth starts slightly above the last hole row.
const PLINTH_OVERLAP: f64 = 0.3;

pub struct RackSiteRenderer<'a> {
    pub columns: &'a ColumnLayout,
    pub rack_height_holes: u32,
    pub rack_width_inches: u32,
    /// `None` hides the numerals.
    pub hole_count_interval: Option<u32>,
}

impl RackSiteRenderer<'_> {
    /// Draw a side whose frame starts at (`left`, `top`). The label sits on the
    /// page's current cursor line.
    pub fn render(&self, page: &mut Page, label: &str, top: f64, left: f64) {
        let s = self.columns.scalar;
        let rack_w = self.columns.rack_width_mm;
        let row = HOLE_ROW * s;
        let bottom = top + f64::from(self.rack_height_holes) * row;

        let label_size = fit_font_size(page.measure(), label, rack_w, s * LABEL_FONT);
        let label_style = page.style().regular().sized(label_size);
        page.with_style(label_style, |page| page.cell(left, rack_w, label, Align::Center));

        page.set_draw_color(Rgb::BLACK);
        page.set_line_width(FRAME_LINE);
        page.line(left, top, left + rack_w, top);
        let inner_right = left + (f64::from(self.rack_width_inches) + POST_WIDTH) * s;
        for x in [left, left + POST_WIDTH * s, left + rack_w, inner_right] {
            page.line(x, top, x, bottom);
        }

        let holes_top = top + s * HOLE_INSET;
        let hole = HOLE_SIZE * s;
        let right_column = left + (f64::from(self.rack_width_inches) + RIGHT_HOLE_OFFSET) * s;
        page.set_fill_color(Rgb::BLACK);
        page.set_line_width(HOLE_LINE);
        let numeral_style = page.style().regular().sized(s * NUMERAL_FONT);
        page.with_style(numeral_style, |page| {
            for i in 0..self.rack_height_holes {
                let y = holes_top + f64::from(i) * row;
                page.fill_rect(left + s * HOLE_INSET, y, hole, hole);
                page.fill_rect(right_column, y, hole, hole);
                let number = i + 1;
                if self
                    .hole_count_interval
                    .is_some_and(|every| number % every == 0)
                {
                    let baseline = holes_top + (f64::from(i) + 0.67) * row;
                    page.text(left + rack_w + NUMERAL_GUTTER, baseline, &number.to_string());
                }
            }
        });

        page.set_line_width(FRAME_LINE);
        let plinth_top = holes_top - PLINTH_OVERLAP + f64::from(self.rack_height_holes) * row;
        page.stroke_rect(left, plinth_top, rack_w, s * PLINTH_HEIGHT);
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::fonts::EstimatedMetrics;
    use crate::page::{DrawCommand, TextStyle};
    use crate::space::rack_footprint;

    fn columns() -> ColumnLayout {
        ColumnLayout {
            scalar: 2.0,
            rack_width_mm: rack_footprint(19, 2.0),
            description_width: 10.0,
            description_width_percent: 10.0,
            printable_width: 150.0,
            comment_width: 20.0,
            hole_space: 3.0,
        }
    }

    fn page() -> Page {
        let mut page = Page::new(
            210.0,
            297.0,
            TextStyle::new("Arial", 12.0),
            Box::new(EstimatedMetrics::default()),
        );
        page.set_margins(8.0, 30.0);
        page
    }

    fn numerals(page: &Page) -> Vec<String> {
        page.commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[rstest]
    #[case(Some(5), 25)]
    #[case(Some(3), 42)]
    #[case(Some(200), 0)]
    #[case(None, 0)]
    fn numerals_every_interval(#[case] interval: Option<u32>, #[case] expected: usize) {
        let cols = columns();
        let renderer = RackSiteRenderer {
            columns: &cols,
            rack_height_holes: 126,
            rack_width_inches: 19,
            hole_count_interval: interval,
        };
        let mut p = page();
        renderer.render(&mut p, "front", 36.0, 20.0);
        // the label is the first text
        assert_eq!(numerals(&p).len(), expected + 1);
        if expected > 0 {
            let every = interval.unwrap();
            assert_eq!(numerals(&p)[1], every.to_string());
        }
    }

    #[test]
    fn two_holes_per_row_and_one_plinth() {
        let cols = columns();
        let renderer = RackSiteRenderer {
            columns: &cols,
            rack_height_holes: 9,
            rack_width_inches: 19,
            hole_count_interval: None,
        };
        let mut p = page();
        renderer.render(&mut p, "back", 36.0, 20.0);
        let filled = p
            .commands()
            .iter()
            .filter(|c| matches!(c, DrawCommand::Rect { fill: Some(_), .. }))
            .count();
        assert_eq!(filled, 18);
        let plinths: Vec<_> = p
            .commands()
            .iter()
            .filter(|c| matches!(c, DrawCommand::Rect { stroke: Some(_), .. }))
            .collect();
        assert_eq!(plinths.len(), 1);
        match plinths[0] {
            DrawCommand::Rect { x, w, h, .. } => {
                assert_eq!(*x, 20.0);
                assert_eq!(*w, cols.rack_width_mm);
                assert!((h - 4.4).abs() < 1e-9);
            }
            _ => unreachable!(),
        }
        let lines = p
            .commands()
            .iter()
            .filter(|c| matches!(c, DrawCommand::Line { .. }))
            .count();
        assert_eq!(lines, 5);
    }

    #[test]
    fn style_is_restored_and_label_fits() {
        let cols = columns();
        let renderer = RackSiteRenderer {
            columns: &cols,
            rack_height_holes: 30,
            rack_width_inches: 19,
            hole_count_interval: Some(5),
        };
        let mut p = page();
        let before = p.style().clone();
        renderer.render(&mut p, "a very long description of the front side", 36.0, 20.0);
        assert_eq!(p.style(), &before);
        match &p.commands()[0] {
            DrawCommand::Text { text, style, x, .. } => {
                let w = p.measure().text_width(text, style.size_pt);
                assert!(w <= cols.rack_width_mm + 1e-9);
                assert!(*x >= 20.0 - 1e-9);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
