//! The page-fitting scalar: how many millimeters one rack "inch" takes on the
//! page. A hole row is `HOLE_ROW * scalar` high.

use tracing::debug;

use crate::constants::{FIT_FACTOR, HEADER_FONT_ROWS, PLINTH_ROWS, PT_MM};
use crate::error::{RackError, Result};

/// Everything the scalar depends on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleInput {
    pub page_width: f64,
    pub page_height: f64,
    pub margins: f64,
    pub rack_height_holes: u32,
    pub rack_width_inches: u32,
    pub min_width_percent: f64,
    pub separation_width: f64,
    pub font_size: f64,
}

impl ScaleInput {
    /// Page width left for both sides.
    pub fn usable_width(&self) -> f64 {
        self.page_width - self.margins * 2.0 - self.separation_width
    }

    /// Scalar that fits the rack, its header and its plinth into the page height.
    pub fn vertical_fit(&self) -> f64 {
        let header = HEADER_FONT_ROWS * self.font_size * PT_MM;
        let free = self.page_height - self.margins * 2.0 - header;
        free / (f64::from(self.rack_height_holes) + PLINTH_ROWS) * FIT_FACTOR
    }
}

/// Compute the scalar.
///
/// The vertical fit is reduced when the rack footprint it implies would take
/// more than the minimum-width share of the usable width. A smaller footprint
/// is accepted as it is.
pub fn solve(input: &ScaleInput) -> Result<f64> {
    let usable = input.usable_width();
    if !(usable > 0.0) {
        return Err(RackError::NonPositiveDimension {
            what: "usable page width",
            value: usable,
        });
    }
    let mut scalar = input.vertical_fit();
    if !(scalar > 0.0) {
        return Err(RackError::NonPositiveDimension {
            what: "rack scalar",
            value: scalar,
        });
    }
    let width = f64::from(input.rack_width_inches);
    let relation = scalar * width / usable / 100.0 * input.min_width_percent;
    // the scalar at which the relation is exactly 1, independent of the rack height
    let width_limit = usable * 100.0 / (width * input.min_width_percent);
    if scalar > width_limit {
        scalar = width_limit;
    }
    debug!(scalar, relation, "rack scalar");
    Ok(scalar)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn a4(holes: u32) -> ScaleInput {
        ScaleInput {
            page_width: 210.0,
            page_height: 297.0,
            margins: 8.0,
            rack_height_holes: holes,
            rack_width_inches: 19,
            min_width_percent: 50.0,
            separation_width: 0.8,
            font_size: 12.0,
        }
    }

    #[test]
    fn taller_racks_never_get_a_larger_scalar() {
        let mut previous = f64::INFINITY;
        for holes in (3..=300).step_by(3) {
            let scalar = solve(&a4(holes)).unwrap();
            assert!(scalar <= previous, "{holes} holes: {scalar} > {previous}");
            previous = scalar;
        }
    }

    #[test]
    fn width_limited_racks_share_one_scalar() {
        let short = solve(&a4(12)).unwrap();
        for holes in [3, 6, 9, 15] {
            assert_eq!(solve(&a4(holes)).unwrap(), short, "{holes} holes");
        }
    }

    #[test]
    fn vertical_fit_is_kept_when_the_rack_is_narrow_enough() {
        let input = a4(141);
        let fit = input.vertical_fit();
        let relation = fit * 19.0 / input.usable_width() / 100.0 * 50.0;
        assert!(relation <= 1.0);
        assert_eq!(solve(&input).unwrap(), fit);
    }

    #[test]
    fn short_racks_are_limited_by_the_width_share() {
        let input = a4(6);
        let scalar = solve(&input).unwrap();
        assert!(scalar < input.vertical_fit());
        // the corrected relation lands exactly on 1
        let relation = scalar * 19.0 / input.usable_width() / 100.0 * 50.0;
        assert!((relation - 1.0).abs() < 1e-9);
    }

    #[rstest]
    #[case(ScaleInput { margins: 110.0, ..a4(126) })]
    #[case(ScaleInput { separation_width: 300.0, ..a4(126) })]
    #[case(ScaleInput { font_size: 200.0, ..a4(126) })]
    fn degenerate_pages_fail(#[case] input: ScaleInput) {
        assert_eq!(solve(&input).unwrap_err().code(), 40);
    }
}
