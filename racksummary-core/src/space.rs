//! Horizontal space: the unit-name column left of each rack side and the
//! comment column right of it.

use tracing::debug;

use crate::constants::{HOLE_SIZE, LABEL_FONT, NUMERAL_FONT, POST_WIDTH, RIGHT_HOLE_OFFSET};
use crate::fonts::TextMeasure;

/// Padding on each side of a name column.
const NAME_PADDING: f64 = 1.3;
/// Room kept free for the numeral gutters of both sides.
const NUMERAL_RESERVE: f64 = 3.5;

/// Width of a rack side including both posts.
pub fn rack_footprint(rack_width_inches: u32, scalar: f64) -> f64 {
    (f64::from(rack_width_inches) + POST_WIDTH * 2.0) * scalar
}

/// Width of three numeral digits, the space hole counts take next to a rack.
pub fn hole_space(measure: &dyn TextMeasure, scalar: f64) -> f64 {
    measure.text_width("000", scalar * NUMERAL_FONT)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpaceInput {
    pub page_width: f64,
    pub margins: f64,
    pub separation_width: f64,
    pub rack_width_inches: u32,
    pub description_max_width_percent: f64,
}

/// Column widths shared by every renderer on the page.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColumnLayout {
    pub scalar: f64,
    pub rack_width_mm: f64,
    pub description_width: f64,
    /// The configured bound, lowered to what the names actually need.
    pub description_width_percent: f64,
    pub printable_width: f64,
    pub comment_width: f64,
    pub hole_space: f64,
}

/// Split the page width between names, racks and comments.
///
/// `unit_names` are measured with a trailing space at the label size.
pub fn allocate<'a>(
    measure: &dyn TextMeasure,
    input: &SpaceInput,
    scalar: f64,
    unit_names: impl IntoIterator<Item = &'a str>,
) -> ColumnLayout {
    let label_size = scalar * LABEL_FONT;
    let longest = unit_names
        .into_iter()
        .map(|name| measure.text_width(&format!("{name} "), label_size))
        .fold(0.0, f64::max);

    let page_inner = input.page_width - input.margins * 2.0 - input.separation_width;
    let bound = (page_inner - NAME_PADDING * 2.0 - RIGHT_HOLE_OFFSET * scalar)
        * input.description_max_width_percent
        / 100.0
        / 2.0;

    let hole_space = hole_space(measure, scalar);
    let printable_width = page_inner
        - POST_WIDTH * 2.0
        - RIGHT_HOLE_OFFSET * scalar * 2.0
        - NUMERAL_RESERVE
        - hole_space * 2.0
        - HOLE_SIZE * scalar * 4.0;

    let mut description_width_percent = input.description_max_width_percent;
    if bound > longest {
        description_width_percent *= longest / bound;
    }
    let description_width = bound.min(longest);
    let rack_width_mm = rack_footprint(input.rack_width_inches, scalar);
    let comment_width = printable_width / 2.0 - description_width - rack_width_mm;

    debug!(
        description_width,
        description_width_percent, comment_width, printable_width, "column layout"
    );
    ColumnLayout {
        scalar,
        rack_width_mm,
        description_width,
        description_width_percent,
        printable_width,
        comment_width,
        hole_space,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::EstimatedMetrics;

    const M: EstimatedMetrics = EstimatedMetrics { em_ratio: 0.5 };
    const SCALAR: f64 = 3.0;

    fn input() -> SpaceInput {
        SpaceInput {
            page_width: 210.0,
            margins: 8.0,
            separation_width: 0.8,
            rack_width_inches: 19,
            description_max_width_percent: 15.0,
        }
    }

    #[test]
    fn short_names_narrow_the_column_and_the_percent() {
        let layout = allocate(&M, &input(), SCALAR, ["srv1", "db"]);
        let longest = M.text_width("srv1 ", SCALAR * LABEL_FONT);
        assert!((layout.description_width - longest).abs() < 1e-9);
        assert!(layout.description_width_percent < 15.0);
        // the reduced percent of the same base gives the measured width
        let bound = (210.0 - 16.0 - 0.8 - 2.6 - 0.745 * SCALAR) / 2.0 / 100.0;
        assert!((bound * layout.description_width_percent - longest).abs() < 1e-9);
    }

    #[test]
    fn long_names_are_capped_by_the_configured_percent() {
        let layout = allocate(&M, &input(), SCALAR, ["a-really-long-hostname-01"]);
        let bound = (210.0 - 16.0 - 0.8 - 2.6 - 0.745 * SCALAR) * 15.0 / 100.0 / 2.0;
        assert!((layout.description_width - bound).abs() < 1e-9);
        assert_eq!(layout.description_width_percent, 15.0);
    }

    #[test]
    fn no_units_leave_no_name_column() {
        let layout = allocate(&M, &input(), SCALAR, []);
        assert_eq!(layout.description_width, 0.0);
        assert!(layout.comment_width > 0.0);
    }

    #[test]
    fn comments_get_what_names_and_racks_leave() {
        let layout = allocate(&M, &input(), SCALAR, ["srv1"]);
        assert_eq!(layout.rack_width_mm, (19.0 + 1.16) * SCALAR);
        assert_eq!(layout.hole_space, M.text_width("000", 2.0 * SCALAR));
        let expected =
            layout.printable_width / 2.0 - layout.description_width - layout.rack_width_mm;
        assert!((layout.comment_width - expected).abs() < 1e-9);
    }
}
