//! Fitting text into a width and wrapping unit comments into a unit's height.

use tracing::trace;

use crate::constants::{MIN_LEGIBLE_COMMENT_SIZE, PT_MM};
use crate::fonts::TextMeasure;

/// Largest font size up to `desired` that keeps `text` within `width_mm`.
/// Degenerate input yields 0.
pub fn fit_font_size(measure: &dyn TextMeasure, text: &str, width_mm: f64, desired: f64) -> f64 {
    if text.is_empty() || width_mm <= 0.0 || desired <= 0.0 {
        return 0.0;
    }
    let measured = measure.text_width(text, desired);
    if measured > width_mm {
        return desired * width_mm / measured;
    }
    desired
}

/// Lines available to a comment on a unit `unit_height_holes` high.
pub fn comment_line_count(unit_height_holes: u32) -> usize {
    (unit_height_holes as usize / 2).max(2)
}

/// Split a comment into lines.
///
/// Without whitespace the comment is cut into `line_count` chunks of equal
/// character count. Otherwise words are packed greedily: a word joins the
/// current line while that line is still shorter than the average line
/// length `total / line_count`, so irregular word lengths can produce uneven
/// lines (or a different number of lines than asked for).
pub fn split_comment_lines(comment: &str, line_count: usize) -> Vec<String> {
    let comment = comment.trim();
    if comment.is_empty() || line_count == 0 {
        return Vec::new();
    }
    let total = comment.chars().count();
    let target = total as f64 / line_count as f64;
    let pieces: Vec<String> = if comment.contains(char::is_whitespace) {
        comment.split_whitespace().map(str::to_string).collect()
    } else {
        let chars: Vec<char> = comment.chars().collect();
        chars
            .chunks(total.div_ceil(line_count))
            .map(|c| c.iter().collect())
            .collect()
    };
    let mut lines: Vec<String> = Vec::new();
    for piece in pieces {
        match lines.last_mut() {
            Some(line) if (line.chars().count() as f64) < target => {
                line.push(' ');
                line.push_str(&piece);
            }
            _ => lines.push(piece),
        }
    }
    lines
}

/// Space a comment may use next to its unit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CommentArea {
    /// Width of the comment column.
    pub width: f64,
    /// Height of the unit.
    pub unit_height: f64,
    /// Extra block height in points, added once.
    pub leading_pt: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WrappedComment {
    pub lines: Vec<String>,
    pub font_size: f64,
}

impl WrappedComment {
    /// Height of the block in millimeters.
    pub fn block_height(&self, leading_pt: f64) -> f64 {
        (self.lines.len() as f64 * self.font_size + leading_pt) * PT_MM
    }
}

/// Wrap a comment onto several lines sharing one font size: the size that fits
/// the longest line into the column, shrunk further if the block would be taller
/// than the unit.
pub fn wrap_comment(
    measure: &dyn TextMeasure,
    comment: &str,
    unit_height_holes: u32,
    area: &CommentArea,
    preferred_font_size: f64,
) -> Option<WrappedComment> {
    let lines = split_comment_lines(comment, comment_line_count(unit_height_holes));
    // first of the longest lines
    let longest = lines.iter().fold(None::<&String>, |best, line| match best {
        Some(b) if b.chars().count() >= line.chars().count() => Some(b),
        _ => Some(line),
    })?;
    let mut wrapped = WrappedComment {
        font_size: fit_font_size(measure, longest, area.width, preferred_font_size),
        lines: lines.clone(),
    };
    let block = wrapped.block_height(area.leading_pt);
    if block > area.unit_height {
        let reduced = wrapped.font_size * area.unit_height / block;
        wrapped.font_size = fit_font_size(measure, longest, area.width, reduced);
    }
    trace!(lines = wrapped.lines.len(), font_size = wrapped.font_size, "wrapped comment");
    Some(wrapped)
}

#[derive(Clone, Debug, PartialEq)]
pub enum CommentLayout {
    Single { text: String, font_size: f64 },
    Wrapped(WrappedComment),
}

/// Choose between one line and a wrapped block.
///
/// The comment stays on one line unless the fitted size would be smaller
/// than the unit name's size, still overflow the column, or drop below the
/// legibility threshold.
pub fn layout_comment(
    measure: &dyn TextMeasure,
    comment: &str,
    unit_height_holes: u32,
    area: &CommentArea,
    name_font_size: f64,
    preferred_font_size: f64,
) -> Option<CommentLayout> {
    let comment = comment.trim();
    if comment.is_empty() || area.width <= 0.0 {
        return None;
    }
    let single = fit_font_size(measure, comment, area.width, preferred_font_size);
    let width = measure.text_width(comment, single);
    let too_small = single < name_font_size || single < MIN_LEGIBLE_COMMENT_SIZE;
    if too_small || width > area.width + 1e-9 {
        wrap_comment(measure, comment, unit_height_holes, area, preferred_font_size)
            .map(CommentLayout::Wrapped)
    } else {
        Some(CommentLayout::Single {
            text: comment.to_string(),
            font_size: single,
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::fonts::EstimatedMetrics;

    const M: EstimatedMetrics = EstimatedMetrics { em_ratio: 0.5 };

    #[rstest]
    #[case("", 10.0, 12.0)]
    #[case("abc", 0.0, 12.0)]
    #[case("abc", -1.0, 12.0)]
    #[case("abc", 10.0, 0.0)]
    fn degenerate_fit_is_zero(#[case] text: &str, #[case] width: f64, #[case] size: f64) {
        assert_eq!(fit_font_size(&M, text, width, size), 0.0);
    }

    #[test]
    fn narrow_text_keeps_at_most_the_desired_size() {
        let size = fit_font_size(&M, "ab", 100.0, 12.0);
        assert!(size <= 12.0);
        assert_eq!(size, 12.0);
    }

    #[test]
    fn wide_text_shrinks_to_the_width() {
        let text = "a rather long unit description";
        let size = fit_font_size(&M, text, 20.0, 12.0);
        assert!(size < 12.0);
        assert!((M.text_width(text, size) - 20.0).abs() < 1e-9);
    }

    #[rstest]
    #[case(1, 2)]
    #[case(3, 2)]
    #[case(5, 2)]
    #[case(6, 3)]
    #[case(12, 6)]
    fn line_count_follows_unit_height(#[case] holes: u32, #[case] lines: usize) {
        assert_eq!(comment_line_count(holes), lines);
    }

    #[rstest]
    #[case("abcdefghij", 2)]
    #[case("abcdefghij", 3)]
    #[case("ab", 3)]
    #[case("x", 2)]
    #[case("0123456789abcdefghijklmnopq", 6)]
    fn chunks_without_whitespace_rejoin_losslessly(#[case] comment: &str, #[case] n: usize) {
        let lines = split_comment_lines(comment, n);
        assert!(lines.len() <= n);
        assert_eq!(lines.concat(), comment);
    }

    #[test]
    fn words_are_packed_up_to_the_average_length() {
        let lines = split_comment_lines("one two three four", 2);
        assert_eq!(lines, ["one two three", "four"]);
    }

    // known imprecision: a line keeps growing while it is shorter than the
    // average, so one long word after short ones overshoots
    #[test]
    fn packing_can_leave_uneven_lines() {
        let lines = split_comment_lines("a b c extraordinarily d", 2);
        assert_eq!(lines, ["a b c extraordinarily", "d"]);
    }

    #[test]
    fn whitespace_only_comments_have_no_lines() {
        assert!(split_comment_lines("  \t ", 2).is_empty());
        let area = CommentArea {
            width: 50.0,
            unit_height: 10.0,
            leading_pt: 1.0,
        };
        assert_eq!(layout_comment(&M, "   ", 3, &area, 8.0, 8.0), None);
    }

    // a single refit only: the leading does not shrink with the font, so the
    // block can still be slightly taller than the unit afterwards
    #[test]
    fn tall_block_is_refitted_once() {
        let area = CommentArea {
            width: 60.0,
            unit_height: 3.0,
            leading_pt: 1.2,
        };
        let comment = "primary database node for accounting";
        let wrapped = wrap_comment(&M, comment, 12, &area, 12.0).unwrap();
        assert_eq!(wrapped.lines, ["primary", "database", "node for", "accounting"]);

        let longest = "accounting";
        let first = WrappedComment {
            lines: wrapped.lines.clone(),
            font_size: fit_font_size(&M, longest, area.width, 12.0),
        };
        let block = first.block_height(area.leading_pt);
        assert!(block > area.unit_height);
        let reduced = first.font_size * area.unit_height / block;
        assert_eq!(wrapped.font_size, fit_font_size(&M, longest, area.width, reduced));
        assert!(wrapped.font_size < first.font_size);
    }

    #[test]
    fn short_comment_stays_on_one_line() {
        let area = CommentArea {
            width: 80.0,
            unit_height: 5.0,
            leading_pt: 1.0,
        };
        let layout = layout_comment(&M, "web", 3, &area, 8.0, 8.0).unwrap();
        assert_eq!(
            layout,
            CommentLayout::Single {
                text: "web".into(),
                font_size: 8.0
            }
        );
    }

    #[test]
    fn long_comment_is_wrapped() {
        let area = CommentArea {
            width: 20.0,
            unit_height: 8.0,
            leading_pt: 1.0,
        };
        let comment = "backup target for the accounting cluster";
        let layout = layout_comment(&M, comment, 6, &area, 8.0, 8.0).unwrap();
        match layout {
            CommentLayout::Wrapped(w) => {
                assert!(w.lines.len() >= 2);
                assert_eq!(w.lines.join(" "), comment);
            }
            other => panic!("expected wrapped comment, got {other:?}"),
        }
    }

    /// Widths as a surface that only sets whole point sizes would report them.
    struct WholePoints;

    impl TextMeasure for WholePoints {
        fn text_width(&self, text: &str, size_pt: f64) -> f64 {
            M.text_width(text, size_pt.ceil())
        }
    }

    #[rstest]
    // fits at 8 pt, smaller than the 10 pt name
    #[case::below_name_size(8.0, 80.0, 10.0, true)]
    // shrinks to 7.56 pt, which the surface sets at 8 pt, wider than the column
    #[case::overflows_column(8.0, 16.0, 6.0, true)]
    // fits at 5 pt, larger than the 3 pt name but below the legible size
    #[case::below_legible_size(5.0, 80.0, 3.0, true)]
    #[case::all_checks_pass(8.0, 80.0, 6.0, false)]
    fn wrapping_triggers(
        #[case] preferred: f64,
        #[case] width: f64,
        #[case] name_size: f64,
        #[case] wrapped: bool,
    ) {
        let area = CommentArea {
            width,
            unit_height: 10.0,
            leading_pt: 1.0,
        };
        let layout = layout_comment(&WholePoints, "web frontend", 6, &area, name_size, preferred);
        match layout {
            Some(CommentLayout::Wrapped(_)) => assert!(wrapped, "unexpectedly wrapped"),
            Some(CommentLayout::Single { font_size, .. }) => {
                assert!(!wrapped, "stayed on one line at {font_size}");
                assert_eq!(font_size, preferred);
            }
            None => panic!("comment dropped"),
        }
    }
}
