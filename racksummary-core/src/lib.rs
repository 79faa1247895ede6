//! Two-sided rack elevation diagrams: units placed at their mounting positions
//! on the front and back of a rack, scaled to fit one page.

pub mod config;
pub mod constants;
pub mod decorate;
pub mod error;
pub mod export;
pub mod fonts;
pub mod height;
pub mod layout;
pub mod models;
pub mod page;
pub mod scale;
pub mod site;
pub mod source;
pub mod space;
pub mod text;
pub mod unit;

pub use config::{
    ConfigFile, OutputDestination, OutputEncoding, PageFormat, RackDiagramConfig,
    RackDiagramConfigBuilder,
};
pub use decorate::{CoverKind, DecoratorRegistry, UnitDecorator, UnitFrame};
pub use error::{RackError, Result};
pub use fonts::{EstimatedMetrics, FontFileMetrics, TextMeasure};
pub use height::{Height, HeightResolver, HeightTypeTable, HeightUnit};
pub use layout::{RackLayoutEngine, RenderReport, RenderedPage, Side};
pub use models::{Rgb, Unit, UnitSet};
pub use page::{DrawCommand, Page, TextStyle};
