//! The page-drawing surface: draw calls are recorded in millimeters together
//! with the graphics state they were issued under, then serialised to SVG.

use std::fmt::Write as _;

use crate::constants::PT_MM;
use crate::fonts::TextMeasure;
use crate::models::Rgb;

/// Horizontal padding of text placed in a cell.
const CELL_PADDING: f64 = 1.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FontVariant {
    #[default]
    Regular,
    Bold,
    Italic,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextStyle {
    pub family: String,
    pub size_pt: f64,
    pub variant: FontVariant,
}

impl TextStyle {
    pub fn new(family: impl Into<String>, size_pt: f64) -> Self {
        Self {
            family: family.into(),
            size_pt,
            variant: FontVariant::Regular,
        }
    }

    pub fn sized(&self, size_pt: f64) -> Self {
        Self {
            size_pt,
            ..self.clone()
        }
    }

    pub fn regular(&self) -> Self {
        Self {
            variant: FontVariant::Regular,
            ..self.clone()
        }
    }

    pub fn bold(&self) -> Self {
        Self {
            variant: FontVariant::Bold,
            ..self.clone()
        }
    }

    pub fn italic(&self) -> Self {
        Self {
            variant: FontVariant::Italic,
            ..self.clone()
        }
    }

    /// Font size in millimeters.
    pub fn size_mm(&self) -> f64 {
        self.size_pt * PT_MM
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stroke {
    pub color: Rgb,
    pub width: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Rect {
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        fill: Option<Rgb>,
        stroke: Option<Stroke>,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        stroke: Stroke,
    },
    /// `y` is the baseline.
    Text {
        x: f64,
        y: f64,
        text: String,
        style: TextStyle,
        color: Rgb,
    },
    Image {
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        href: String,
    },
}

pub struct Page {
    width: f64,
    height: f64,
    left_margin: f64,
    cursor_y: f64,
    style: TextStyle,
    line_width: f64,
    draw_color: Rgb,
    fill_color: Rgb,
    text_color: Rgb,
    commands: Vec<DrawCommand>,
    measure: Box<dyn TextMeasure>,
}

impl Page {
    pub fn new(width: f64, height: f64, style: TextStyle, measure: Box<dyn TextMeasure>) -> Self {
        Self {
            width,
            height,
            left_margin: 0.0,
            cursor_y: 0.0,
            style,
            line_width: 0.2,
            draw_color: Rgb::BLACK,
            fill_color: Rgb::BLACK,
            text_color: Rgb::BLACK,
            commands: Vec::new(),
            measure,
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn measure(&self) -> &dyn TextMeasure {
        self.measure.as_ref()
    }

    // graphics state

    pub fn style(&self) -> &TextStyle {
        &self.style
    }

    pub fn set_style(&mut self, style: TextStyle) {
        self.style = style;
    }

    /// Run `f` with `style` active; the previous style is back in place afterwards.
    pub fn with_style<R>(&mut self, style: TextStyle, f: impl FnOnce(&mut Self) -> R) -> R {
        let previous = std::mem::replace(&mut self.style, style);
        let out = f(self);
        self.style = previous;
        out
    }

    pub fn set_line_width(&mut self, width: f64) {
        self.line_width = width;
    }

    pub fn set_draw_color(&mut self, color: Rgb) {
        self.draw_color = color;
    }

    pub fn set_fill_color(&mut self, color: Rgb) {
        self.fill_color = color;
    }

    pub fn set_margins(&mut self, left: f64, top: f64) {
        self.left_margin = left;
        self.cursor_y = top;
    }

    pub fn cursor_y(&self) -> f64 {
        self.cursor_y
    }

    /// Move the text cursor down by `h`.
    pub fn ln(&mut self, h: f64) {
        self.cursor_y += h;
    }

    /// Width of `text` in the current style.
    pub fn string_width(&self, text: &str) -> f64 {
        self.measure.text_width(text, self.style.size_pt)
    }

    // drawing

    fn stroke(&self) -> Stroke {
        Stroke {
            color: self.draw_color,
            width: self.line_width,
        }
    }

    pub fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.commands.push(DrawCommand::Rect {
            x,
            y,
            w,
            h,
            fill: Some(self.fill_color),
            stroke: None,
        });
    }

    pub fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        let stroke = self.stroke();
        self.commands.push(DrawCommand::Rect {
            x,
            y,
            w,
            h,
            fill: None,
            stroke: Some(stroke),
        });
    }

    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        let stroke = self.stroke();
        self.commands.push(DrawCommand::Line {
            x1,
            y1,
            x2,
            y2,
            stroke,
        });
    }

    /// Text with its baseline at `y`.
    pub fn text(&mut self, x: f64, y: f64, text: &str) {
        if text.is_empty() {
            return;
        }
        self.commands.push(DrawCommand::Text {
            x,
            y,
            text: text.to_string(),
            style: self.style.clone(),
            color: self.text_color,
        });
    }

    /// Text aligned inside a zero-height cell starting at `x` on the cursor line.
    pub fn cell(&mut self, x: f64, w: f64, text: &str, align: Align) {
        let sw = self.string_width(text);
        let dx = match align {
            Align::Left => CELL_PADDING,
            Align::Center => (w - sw) / 2.0,
            Align::Right => w - CELL_PADDING - sw,
        };
        let baseline = self.cursor_y + 0.3 * self.style.size_mm();
        self.text(x + dx, baseline, text);
    }

    /// Text flowing from the left margin on the cursor line.
    pub fn write(&mut self, text: &str) {
        let (x, w) = (self.left_margin, self.width - 2.0 * self.left_margin);
        self.cell(x, w, text, Align::Left);
    }

    pub fn image(&mut self, x: f64, y: f64, w: f64, h: f64, href: &str) {
        self.commands.push(DrawCommand::Image {
            x,
            y,
            w,
            h,
            href: href.to_string(),
        });
    }

    /// The page as an SVG document with one user unit per millimeter.
    pub fn to_svg(&self) -> String {
        let (w, h) = (self.width, self.height);
        let mut s = String::new();
        s.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        s.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" width=\"{}mm\" height=\"{}mm\" viewBox=\"0 0 {} {}\">\n",
            fmt_mm(w),
            fmt_mm(h),
            fmt_mm(w),
            fmt_mm(h)
        ));
        s.push_str("<rect x=\"0\" y=\"0\" width=\"100%\" height=\"100%\" fill=\"#ffffff\"/>\n");
        for cmd in &self.commands {
            write_command(&mut s, cmd);
        }
        s.push_str("</svg>\n");
        s
    }
}

fn write_command(s: &mut String, cmd: &DrawCommand) {
    // writing into a String cannot fail
    let _ = match cmd {
        DrawCommand::Rect {
            x,
            y,
            w,
            h,
            fill,
            stroke,
        } => {
            let fill = fill.map(Rgb::to_hex).unwrap_or_else(|| "none".to_string());
            let stroke = match stroke {
                Some(st) => format!(
                    " stroke=\"{}\" stroke-width=\"{:.3}\"",
                    st.color.to_hex(),
                    st.width
                ),
                None => String::new(),
            };
            writeln!(
                s,
                "<rect x=\"{:.3}\" y=\"{:.3}\" width=\"{:.3}\" height=\"{:.3}\" fill=\"{}\"{}/>",
                x, y, w, h, fill, stroke
            )
        }
        DrawCommand::Line {
            x1,
            y1,
            x2,
            y2,
            stroke,
        } => writeln!(
            s,
            "<path d=\"M {:.3} {:.3} L {:.3} {:.3}\" stroke=\"{}\" stroke-width=\"{:.3}\" fill=\"none\"/>",
            x1,
            y1,
            x2,
            y2,
            stroke.color.to_hex(),
            stroke.width
        ),
        DrawCommand::Text {
            x,
            y,
            text,
            style,
            color,
        } => {
            let variant = match style.variant {
                FontVariant::Regular => "",
                FontVariant::Bold => " font-weight=\"bold\"",
                FontVariant::Italic => " font-style=\"italic\"",
            };
            writeln!(
                s,
                "<text x=\"{:.3}\" y=\"{:.3}\" font-family=\"{}, sans-serif\" font-size=\"{:.3}\"{} fill=\"{}\" xml:space=\"preserve\">{}</text>",
                x,
                y,
                svg_escape(&style.family),
                style.size_mm(),
                variant,
                color.to_hex(),
                svg_escape(text)
            )
        }
        DrawCommand::Image { x, y, w, h, href } => writeln!(
            s,
            "<image x=\"{:.3}\" y=\"{:.3}\" width=\"{:.3}\" height=\"{:.3}\" preserveAspectRatio=\"none\" xlink:href=\"{}\"/>",
            x,
            y,
            w,
            h,
            svg_escape(href)
        ),
    };
}

pub(crate) fn svg_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

// Format millimeters:
// - Near-integers (1e-6) as integers
// - Else up to 3 decimals, trim trailing zeros
pub(crate) fn fmt_mm(v: f64) -> String {
    if (v - v.round()).abs() < 1e-6 {
        format!("{:.0}", v)
    } else {
        format!("{:.3}", v)
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}
