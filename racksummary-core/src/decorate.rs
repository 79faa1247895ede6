//! Cover decorations drawn over a unit's rectangle, chosen by unit type.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::HOLE_ROW;
use crate::models::Rgb;
use crate::page::Page;

/// Where a unit was drawn, in page millimeters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitFrame {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub scalar: f64,
}

impl UnitFrame {
    /// Height of one mounting-hole row.
    pub fn row(&self) -> f64 {
        HOLE_ROW * self.scalar
    }
}

pub trait UnitDecorator {
    fn decorate(&self, page: &mut Page, frame: &UnitFrame);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverKind {
    /// Blanking panel.
    Blank,
    Vented,
    /// Patch panels and switches.
    Ports,
}

impl CoverKind {
    pub fn decorator(self) -> Box<dyn UnitDecorator> {
        match self {
            CoverKind::Blank => Box::new(BlankCover),
            CoverKind::Vented => Box::new(VentedCover),
            CoverKind::Ports => Box::new(PortStrip),
        }
    }
}

impl FromStr for CoverKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "blank" => Ok(CoverKind::Blank),
            "vented" => Ok(CoverKind::Vented),
            "ports" => Ok(CoverKind::Ports),
            _ => Err(s.to_string()),
        }
    }
}

impl fmt::Display for CoverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CoverKind::Blank => "blank",
            CoverKind::Vented => "vented",
            CoverKind::Ports => "ports",
        })
    }
}

/// Diagonal hatching.
pub struct BlankCover;

impl UnitDecorator for BlankCover {
    fn decorate(&self, page: &mut Page, frame: &UnitFrame) {
        let UnitFrame { x, y, w, h, .. } = *frame;
        if w <= 0.0 || h <= 0.0 {
            return;
        }
        let step = (frame.row() * 1.5).max(0.5);
        page.set_draw_color(Rgb::Gray(120));
        page.set_line_width(0.1);
        // each stroke is the line u + v = c, u from the left edge and v up from the bottom
        let mut c = step;
        while c < w + h {
            let (u0, v0) = if c <= w { (c, 0.0) } else { (w, c - w) };
            let (u1, v1) = if c <= h { (0.0, c) } else { (c - h, h) };
            page.line(x + u0, y + h - v0, x + u1, y + h - v1);
            c += step;
        }
        page.set_draw_color(Rgb::BLACK);
    }
}

/// One horizontal slot per hole row.
pub struct VentedCover;

impl UnitDecorator for VentedCover {
    fn decorate(&self, page: &mut Page, frame: &UnitFrame) {
        let row = frame.row();
        if row <= 0.0 || frame.w <= 0.0 {
            return;
        }
        let rows = ((frame.h / row).round() as usize).max(1);
        let band = frame.h / rows as f64;
        let slot = band * 0.25;
        page.set_fill_color(Rgb::Gray(90));
        for i in 0..rows {
            let top = frame.y + band * i as f64 + (band - slot) / 2.0;
            page.fill_rect(frame.x + frame.w * 0.2, top, frame.w * 0.6, slot);
        }
    }
}

/// A row of small port squares centered on the unit.
pub struct PortStrip;

impl UnitDecorator for PortStrip {
    fn decorate(&self, page: &mut Page, frame: &UnitFrame) {
        let size = (frame.h * 0.45).min(frame.w / 30.0);
        if size <= 0.0 {
            return;
        }
        let pitch = size * 1.6;
        let count = (frame.w * 0.8 / pitch).floor() as usize;
        let left = frame.x + (frame.w - count as f64 * pitch + (pitch - size)) / 2.0;
        let top = frame.y + (frame.h - size) / 2.0;
        page.set_fill_color(Rgb::WHITE);
        page.set_draw_color(Rgb::Gray(60));
        page.set_line_width(0.1);
        for i in 0..count {
            let px = left + pitch * i as f64;
            page.fill_rect(px, top, size, size);
            page.stroke_rect(px, top, size, size);
        }
        page.set_draw_color(Rgb::BLACK);
    }
}

/// Decorators keyed by lower-cased unit type.
#[derive(Default)]
pub struct DecoratorRegistry {
    decorators: BTreeMap<String, Box<dyn UnitDecorator>>,
}

impl fmt::Debug for DecoratorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.decorators.keys()).finish()
    }
}

impl DecoratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_covers<'a>(covers: impl IntoIterator<Item = (&'a String, &'a CoverKind)>) -> Self {
        let mut registry = Self::new();
        for (unit_type, kind) in covers {
            registry.register(unit_type, kind.decorator());
        }
        registry
    }

    pub fn register(&mut self, unit_type: &str, decorator: Box<dyn UnitDecorator>) {
        self.decorators.insert(unit_type.to_lowercase(), decorator);
    }

    pub fn get(&self, unit_type: &str) -> Option<&dyn UnitDecorator> {
        self.decorators
            .get(&unit_type.to_lowercase())
            .map(|d| d.as_ref())
    }

    pub fn len(&self) -> usize {
        self.decorators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decorators.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::fonts::EstimatedMetrics;
    use crate::page::{DrawCommand, TextStyle};

    fn page() -> Page {
        Page::new(
            210.0,
            297.0,
            TextStyle::new("Arial", 12.0),
            Box::new(EstimatedMetrics::default()),
        )
    }

    const FRAME: UnitFrame = UnitFrame {
        x: 10.0,
        y: 20.0,
        w: 40.0,
        h: 6.0,
        scalar: 3.0,
    };

    #[rstest]
    #[case("blank", CoverKind::Blank)]
    #[case(" Vented ", CoverKind::Vented)]
    #[case("PORTS", CoverKind::Ports)]
    fn kinds_parse_case_insensitively(#[case] raw: &str, #[case] kind: CoverKind) {
        assert_eq!(raw.parse::<CoverKind>().unwrap(), kind);
    }

    #[test]
    fn unknown_kinds_do_not_parse() {
        assert_eq!("glitter".parse::<CoverKind>().unwrap_err(), "glitter");
    }

    #[test]
    fn registry_lookup_ignores_case() {
        let covers = BTreeMap::from([("Switch".to_string(), CoverKind::Ports)]);
        let registry = DecoratorRegistry::from_covers(&covers);
        assert_eq!(registry.len(), 1);
        assert!(registry.get("SWITCH").is_some());
        assert!(registry.get("server").is_none());
    }

    #[test]
    fn hatching_stays_inside_the_unit() {
        let mut p = page();
        BlankCover.decorate(&mut p, &FRAME);
        assert!(!p.commands().is_empty());
        let inside = |x: f64, y: f64| {
            x >= FRAME.x - 1e-9
                && x <= FRAME.x + FRAME.w + 1e-9
                && y >= FRAME.y - 1e-9
                && y <= FRAME.y + FRAME.h + 1e-9
        };
        for cmd in p.commands() {
            match cmd {
                DrawCommand::Line { x1, y1, x2, y2, .. } => {
                    assert!(inside(*x1, *y1) && inside(*x2, *y2), "{cmd:?}");
                }
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn vents_follow_the_hole_rows() {
        let mut p = page();
        VentedCover.decorate(&mut p, &FRAME);
        let rows = (FRAME.h / FRAME.row()).round() as usize;
        assert_eq!(p.commands().len(), rows);
    }

    #[test]
    fn ports_are_centered_pairs_of_fill_and_outline() {
        let mut p = page();
        PortStrip.decorate(&mut p, &FRAME);
        let n = p.commands().len();
        assert!(n > 0 && n % 2 == 0);
        let xs: Vec<f64> = p
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Rect { x, w, .. } => Some(x + w / 2.0),
                _ => None,
            })
            .collect();
        let mid = (xs[0] + xs[xs.len() - 1]) / 2.0;
        assert!((mid - (FRAME.x + FRAME.w / 2.0)).abs() < 1e-9);
    }
}
