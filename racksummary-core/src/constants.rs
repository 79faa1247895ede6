/// Layout constants shared by the renderers.
/// Values are expressed in millimeters unless noted otherwise; "scalar" means
/// the page-fitting multiplier computed per page.
pub const INCH_MM: f64 = 25.4;
/// Points to millimeters.
pub const PT_MM: f64 = 0.3527;
/// Smallest accepted base font size (pt).
pub const MIN_FONT_SIZE: f64 = 4.0;
/// Comments fitted below this size (pt) are wrapped onto several lines.
pub const MIN_LEGIBLE_COMMENT_SIZE: f64 = 5.5;

/// Height of one mounting-hole row, multiplied by the scalar.
pub const HOLE_ROW: f64 = 0.58;
/// Width of a rack post, multiplied by the scalar.
pub const POST_WIDTH: f64 = 0.58;
/// Offset of a mounting hole inside its post, multiplied by the scalar.
pub const HOLE_INSET: f64 = 0.165;
/// Edge of a mounting hole square, multiplied by the scalar.
pub const HOLE_SIZE: f64 = 0.25;
/// Left edge of the right hole column past the rack width, multiplied by the scalar.
pub const RIGHT_HOLE_OFFSET: f64 = 0.745;
/// Height of the base plinth, multiplied by the scalar.
pub const PLINTH_HEIGHT: f64 = 2.2;
/// Baseline shift used to centre text on a row, multiplied by the scalar.
pub const BASELINE_SHIFT: f64 = 0.352;

/// Label font size (pt), multiplied by the scalar.
pub const LABEL_FONT: f64 = 3.1;
/// Hole-count numeral font size (pt), multiplied by the scalar.
pub const NUMERAL_FONT: f64 = 2.0;

/// Vertical fit: header reservation in base font sizes.
pub const HEADER_FONT_ROWS: f64 = 9.0;
/// Vertical fit: extra hole rows reserved for the plinth.
pub const PLINTH_ROWS: f64 = 3.0;
/// Vertical fit: empirical rows-to-scalar factor.
pub const FIT_FACTOR: f64 = 1.72;

/// Gap between the rack edge and the comment column, past the numeral gutter.
pub const COMMENT_GUTTER: f64 = 1.75;
/// Gap between the rack edge and a hole-count numeral.
pub const NUMERAL_GUTTER: f64 = 0.75;
/// Default fill for units without a colour (gray level).
pub const DEFAULT_UNIT_GRAY: u8 = 220;
/// Millimeters per header image pixel.
pub const HEADER_IMAGE_MM_PER_PX: f64 = 0.3;
/// Tallest header image.
pub const HEADER_IMAGE_MAX_HEIGHT: f64 = 20.0;
