//! Diagram configuration: a validating builder that produces a frozen
//! [`RackDiagramConfig`], and the TOML file form read by the command line.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::MIN_FONT_SIZE;
use crate::decorate::CoverKind;
use crate::error::{RackError, Result, TextField};
use crate::height::{HeightResolver, HeightTypeTable};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PageFormat {
    A3,
    #[default]
    A4,
    A5,
}

impl PageFormat {
    /// Portrait width and height in millimeters.
    pub fn size_mm(self) -> (f64, f64) {
        match self {
            PageFormat::A3 => (297.0, 420.0),
            PageFormat::A4 => (210.0, 297.0),
            PageFormat::A5 => (148.0, 210.0),
        }
    }
}

impl FromStr for PageFormat {
    type Err = RackError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "a3" => Ok(PageFormat::A3),
            "a4" => Ok(PageFormat::A4),
            "a5" => Ok(PageFormat::A5),
            _ => Err(RackError::UnknownOutputFormat(s.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputDestination {
    #[default]
    File,
    /// Streamed as an attachment.
    Download,
    /// Streamed for display.
    Inline,
}

impl FromStr for OutputDestination {
    type Err = RackError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "file" => Ok(OutputDestination::File),
            "download" => Ok(OutputDestination::Download),
            "inline" => Ok(OutputDestination::Inline),
            _ => Err(RackError::UnknownDestination(s.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputEncoding {
    #[default]
    Pdf,
    Svg,
    Png,
}

impl OutputEncoding {
    pub fn mime_type(self) -> &'static str {
        match self {
            OutputEncoding::Pdf => "application/pdf",
            OutputEncoding::Svg => "image/svg+xml",
            OutputEncoding::Png => "image/png",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputEncoding::Pdf => "pdf",
            OutputEncoding::Svg => "svg",
            OutputEncoding::Png => "png",
        }
    }
}

impl FromStr for OutputEncoding {
    type Err = RackError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pdf" => Ok(OutputEncoding::Pdf),
            "svg" => Ok(OutputEncoding::Svg),
            "png" => Ok(OutputEncoding::Png),
            _ => Err(RackError::UnknownEncoding(s.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SideSpec {
    /// What `Unit::side` must equal to land on this side.
    pub identifier: String,
    /// Label drawn above the side.
    pub description: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RackSpec {
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub height: String,
    pub height_holes: u32,
    pub height_description: String,
    pub width_inches: u32,
    pub front: SideSpec,
    pub back: SideSpec,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Vec<String>,
    pub creator: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PageSetup {
    pub format: PageFormat,
    pub margins: f64,
    pub font_family: String,
    pub font_size: f64,
    pub header_image: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Separation {
    pub width: f64,
    pub line_width: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LastUpdate {
    pub prefix: String,
    pub show_time: bool,
    pub timezone: Tz,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LayoutOptions {
    pub rack_min_width_percent: f64,
    pub description_max_width_percent: f64,
    /// Space between the sides; a line is drawn only when `show_separation_line` is set.
    pub separation: Separation,
    pub show_separation_line: bool,
    /// Every n-th hole gets a numeral; `None` hides the numerals.
    pub hole_count_interval: Option<u32>,
    pub show_comments: bool,
    pub last_update: Option<LastUpdate>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OutputOptions {
    pub destination: OutputDestination,
    pub path: Option<PathBuf>,
    pub encoding: OutputEncoding,
    pub px_per_mm: f64,
}

/// Validated, immutable diagram settings.
#[derive(Clone, Debug, PartialEq)]
pub struct RackDiagramConfig {
    rack: RackSpec,
    document: DocumentInfo,
    page: PageSetup,
    layout: LayoutOptions,
    output: OutputOptions,
    heights: HeightResolver,
    decorations: bool,
    covers: BTreeMap<String, CoverKind>,
}

impl RackDiagramConfig {
    pub fn builder(rack_name: &str, rack_height: &str) -> Result<RackDiagramConfigBuilder> {
        RackDiagramConfigBuilder::new(rack_name, rack_height)
    }

    pub fn rack(&self) -> &RackSpec {
        &self.rack
    }
    pub fn document(&self) -> &DocumentInfo {
        &self.document
    }
    pub fn page(&self) -> &PageSetup {
        &self.page
    }
    pub fn layout(&self) -> &LayoutOptions {
        &self.layout
    }
    pub fn output(&self) -> &OutputOptions {
        &self.output
    }
    pub fn heights(&self) -> &HeightResolver {
        &self.heights
    }
    pub fn decorations_enabled(&self) -> bool {
        self.decorations
    }
    pub fn covers(&self) -> &BTreeMap<String, CoverKind> {
        &self.covers
    }
}

fn non_empty(value: &str, field: TextField) -> Result<String> {
    if value.trim().is_empty() {
        return Err(RackError::EmptyText(field));
    }
    Ok(value.to_string())
}

fn percent(field: &'static str, value: f64) -> Result<f64> {
    if !(value > 0.0 && value <= 100.0) {
        return Err(RackError::InvalidPercent { field, value });
    }
    Ok(value)
}

fn not_negative(field: &'static str, value: f64) -> Result<f64> {
    if !(value >= 0.0) {
        return Err(RackError::NegativeSeparation { field, value });
    }
    Ok(value)
}

/// Collects settings one validated field at a time. A setter that fails
/// leaves the builder as it was.
#[derive(Clone, Debug)]
pub struct RackDiagramConfigBuilder {
    rack_name: String,
    rack_description: Option<String>,
    rack_location: Option<String>,
    rack_height: String,
    rack_height_description: String,
    rack_width: u32,
    front: SideSpec,
    back: SideSpec,
    height_types: HeightTypeTable,
    default_unit_height_mounts: u32,
    document: DocumentInfo,
    page: PageSetup,
    rack_min_width_percent: f64,
    description_max_width_percent: f64,
    separation: Separation,
    show_separation_line: bool,
    show_hole_count: bool,
    hole_count_interval: u32,
    show_comments: bool,
    show_last_update: bool,
    last_update_prefix: String,
    last_update_time: bool,
    timezone: Tz,
    decorations: bool,
    covers: BTreeMap<String, CoverKind>,
    output: OutputOptions,
}

impl RackDiagramConfigBuilder {
    pub fn new(rack_name: &str, rack_height: &str) -> Result<Self> {
        let mut builder = Self {
            rack_name: non_empty(rack_name, TextField::RackName)?,
            rack_description: None,
            rack_location: None,
            rack_height: String::new(),
            rack_height_description: "rack units".into(),
            rack_width: 19,
            front: SideSpec {
                identifier: "front".into(),
                description: "front".into(),
            },
            back: SideSpec {
                identifier: "back".into(),
                description: "back".into(),
            },
            height_types: HeightTypeTable::default(),
            default_unit_height_mounts: 3,
            document: DocumentInfo {
                title: None,
                author: None,
                subject: None,
                keywords: Vec::new(),
                creator: format!("RackSummary {}", env!("CARGO_PKG_VERSION")),
            },
            page: PageSetup {
                format: PageFormat::A4,
                margins: 8.0,
                font_family: "Arial".into(),
                font_size: 12.0,
                header_image: None,
            },
            rack_min_width_percent: 50.0,
            description_max_width_percent: 15.0,
            separation: Separation {
                width: 0.8,
                line_width: 0.4,
            },
            show_separation_line: false,
            show_hole_count: true,
            hole_count_interval: 5,
            show_comments: false,
            show_last_update: true,
            last_update_prefix: "Last update".into(),
            last_update_time: false,
            timezone: Tz::UTC,
            decorations: false,
            covers: BTreeMap::new(),
            output: OutputOptions {
                destination: OutputDestination::File,
                path: None,
                encoding: OutputEncoding::Pdf,
                px_per_mm: 4.0,
            },
        };
        builder.rack_height(rack_height)?;
        Ok(builder)
    }

    fn resolver(&self) -> HeightResolver {
        HeightResolver::new(self.height_types.clone(), self.default_unit_height_mounts)
    }

    // rack

    pub fn rack_name(&mut self, name: &str) -> Result<&mut Self> {
        self.rack_name = non_empty(name, TextField::RackName)?;
        Ok(self)
    }

    pub fn rack_description(&mut self, description: &str) -> Result<&mut Self> {
        self.rack_description = Some(non_empty(description, TextField::RackDescription)?);
        Ok(self)
    }

    pub fn rack_location(&mut self, location: &str) -> Result<&mut Self> {
        self.rack_location = Some(non_empty(location, TextField::RackLocation)?);
        Ok(self)
    }

    /// Raw height notation; it has to resolve with the current height table.
    pub fn rack_height(&mut self, raw: &str) -> Result<&mut Self> {
        self.resolver().resolve(raw)?;
        self.rack_height = raw.to_string();
        Ok(self)
    }

    pub fn rack_height_description(&mut self, description: &str) -> Result<&mut Self> {
        self.rack_height_description = non_empty(description, TextField::RackHeightDescription)?;
        Ok(self)
    }

    pub fn rack_width(&mut self, inches: i64) -> Result<&mut Self> {
        self.rack_width = u32::try_from(inches)
            .ok()
            .filter(|w| *w > 0)
            .ok_or(RackError::InvalidRackWidth(inches))?;
        Ok(self)
    }

    pub fn front_identifier(&mut self, identifier: &str) -> Result<&mut Self> {
        self.front.identifier = non_empty(identifier, TextField::FrontIdentifier)?;
        Ok(self)
    }

    pub fn back_identifier(&mut self, identifier: &str) -> Result<&mut Self> {
        self.back.identifier = non_empty(identifier, TextField::BackIdentifier)?;
        Ok(self)
    }

    pub fn front_description(&mut self, description: &str) -> Result<&mut Self> {
        self.front.description = non_empty(description, TextField::FrontDescription)?;
        Ok(self)
    }

    pub fn back_description(&mut self, description: &str) -> Result<&mut Self> {
        self.back.description = non_empty(description, TextField::BackDescription)?;
        Ok(self)
    }

    pub fn default_unit_height_mounts(&mut self, mounts: i64) -> Result<&mut Self> {
        self.default_unit_height_mounts = u32::try_from(mounts)
            .ok()
            .filter(|m| *m > 0)
            .ok_or(RackError::InvalidDefaultUnitHeightMounts(mounts))?;
        Ok(self)
    }

    pub fn height_types(&mut self, table: HeightTypeTable) -> Result<&mut Self> {
        let resolver = HeightResolver::new(table.clone(), self.default_unit_height_mounts);
        resolver.resolve(&self.rack_height)?;
        self.height_types = table;
        Ok(self)
    }

    // document

    pub fn title(&mut self, title: &str) -> Result<&mut Self> {
        self.document.title = Some(non_empty(title, TextField::Title)?);
        Ok(self)
    }

    pub fn author(&mut self, author: &str) -> Result<&mut Self> {
        self.document.author = Some(non_empty(author, TextField::Author)?);
        Ok(self)
    }

    pub fn subject(&mut self, subject: &str) -> Result<&mut Self> {
        self.document.subject = Some(non_empty(subject, TextField::Subject)?);
        Ok(self)
    }

    pub fn keywords<S: AsRef<str>>(&mut self, keywords: &[S]) -> Result<&mut Self> {
        if keywords.is_empty() {
            return Err(RackError::EmptyKeywords);
        }
        self.document.keywords = keywords
            .iter()
            .map(|k| non_empty(k.as_ref(), TextField::Keyword))
            .collect::<Result<_>>()?;
        Ok(self)
    }

    pub fn creator(&mut self, creator: &str) -> Result<&mut Self> {
        self.document.creator = non_empty(creator, TextField::Creator)?;
        Ok(self)
    }

    // page

    pub fn output_format(&mut self, format: &str) -> Result<&mut Self> {
        self.page.format = format.parse()?;
        Ok(self)
    }

    pub fn margins(&mut self, mm: f64) -> Result<&mut Self> {
        if !(mm > 0.0) {
            return Err(RackError::InvalidMargins(mm));
        }
        self.page.margins = mm;
        Ok(self)
    }

    pub fn font_family(&mut self, family: &str) -> Result<&mut Self> {
        self.page.font_family = non_empty(family, TextField::FontFamily)?;
        Ok(self)
    }

    pub fn font_size(&mut self, size_pt: f64) -> Result<&mut Self> {
        if !(size_pt >= MIN_FONT_SIZE) {
            return Err(RackError::FontSizeTooSmall {
                size: size_pt,
                min: MIN_FONT_SIZE,
            });
        }
        self.page.font_size = size_pt;
        Ok(self)
    }

    /// Image drawn in the upper right corner. The file has to exist and has
    /// to be a PNG; other formats fail when the page is rendered.
    pub fn header_image(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        let path = path.as_ref();
        let meta = std::fs::metadata(path).map_err(|e| RackError::io(path, e))?;
        if !meta.is_file() {
            return Err(RackError::HeaderImage {
                path: path.to_path_buf(),
                reason: "not a regular file".into(),
            });
        }
        self.page.header_image = Some(path.to_path_buf());
        Ok(self)
    }

    // layout

    pub fn rack_min_width_percent(&mut self, value: f64) -> Result<&mut Self> {
        let value = percent("rack min width percent", value)?;
        if value + self.description_max_width_percent > 100.0 {
            return Err(RackError::PercentBoundExceeded {
                min_width: value,
                description: self.description_max_width_percent,
            });
        }
        self.rack_min_width_percent = value;
        Ok(self)
    }

    pub fn description_max_width_percent(&mut self, value: f64) -> Result<&mut Self> {
        let value = percent("description max width percent", value)?;
        if value + self.rack_min_width_percent > 100.0 {
            return Err(RackError::PercentBoundExceeded {
                min_width: self.rack_min_width_percent,
                description: value,
            });
        }
        self.description_max_width_percent = value;
        Ok(self)
    }

    pub fn current_percents(&self) -> (f64, f64) {
        (self.rack_min_width_percent, self.description_max_width_percent)
    }

    pub fn show_separation_line(&mut self, show: bool) -> &mut Self {
        self.show_separation_line = show;
        self
    }

    pub fn separation_width(&mut self, mm: f64) -> Result<&mut Self> {
        self.separation.width = not_negative("side separation width", mm)?;
        Ok(self)
    }

    pub fn separation_line_width(&mut self, mm: f64) -> Result<&mut Self> {
        self.separation.line_width = not_negative("side separation line width", mm)?;
        Ok(self)
    }

    pub fn show_hole_count(&mut self, show: bool) -> &mut Self {
        self.show_hole_count = show;
        self
    }

    pub fn hole_count_interval(&mut self, interval: i64) -> Result<&mut Self> {
        self.hole_count_interval = u32::try_from(interval)
            .ok()
            .filter(|i| *i > 0)
            .ok_or(RackError::InvalidHoleCountInterval(interval))?;
        Ok(self)
    }

    pub fn show_comments(&mut self, show: bool) -> &mut Self {
        self.show_comments = show;
        self
    }

    pub fn show_last_update(&mut self, show: bool) -> &mut Self {
        self.show_last_update = show;
        self
    }

    pub fn last_update_prefix(&mut self, prefix: &str) -> Result<&mut Self> {
        self.last_update_prefix = non_empty(prefix, TextField::LastUpdatePrefix)?;
        Ok(self)
    }

    pub fn last_update_time(&mut self, show: bool) -> &mut Self {
        self.last_update_time = show;
        self
    }

    /// IANA timezone name such as `Europe/Berlin`.
    pub fn timezone(&mut self, name: &str) -> Result<&mut Self> {
        self.timezone = name
            .trim()
            .parse::<Tz>()
            .map_err(|_| RackError::InvalidTimezone(name.to_string()))?;
        Ok(self)
    }

    pub fn decorations(&mut self, enabled: bool) -> &mut Self {
        self.decorations = enabled;
        self
    }

    pub fn cover(&mut self, unit_type: &str, kind: &str) -> Result<&mut Self> {
        let parsed = kind.parse::<CoverKind>().map_err(|kind| RackError::UnknownCoverKind {
            unit_type: unit_type.to_string(),
            kind,
        })?;
        self.covers.insert(unit_type.to_lowercase(), parsed);
        Ok(self)
    }

    // output

    pub fn output_destination(&mut self, destination: &str) -> Result<&mut Self> {
        self.output.destination = destination.parse()?;
        Ok(self)
    }

    pub fn output_path(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.output.path = Some(path.into());
        self
    }

    pub fn output_encoding(&mut self, encoding: &str) -> Result<&mut Self> {
        self.output.encoding = encoding.parse()?;
        Ok(self)
    }

    pub fn px_per_mm(&mut self, px: f64) -> Result<&mut Self> {
        if !(px > 0.0) {
            return Err(RackError::NonPositiveDimension {
                what: "pixels per millimeter",
                value: px,
            });
        }
        self.output.px_per_mm = px;
        Ok(self)
    }

    pub fn build(&self) -> Result<RackDiagramConfig> {
        if self.output.destination == OutputDestination::File && self.output.path.is_none() {
            return Err(RackError::MissingOutputPath);
        }
        let heights = self.resolver();
        let height_holes = heights.resolve(&self.rack_height)?;
        debug!(rack = %self.rack_name, height_holes, "configuration frozen");
        Ok(RackDiagramConfig {
            rack: RackSpec {
                name: self.rack_name.clone(),
                description: self.rack_description.clone(),
                location: self.rack_location.clone(),
                height: self.rack_height.clone(),
                height_holes,
                height_description: self.rack_height_description.clone(),
                width_inches: self.rack_width,
                front: self.front.clone(),
                back: self.back.clone(),
            },
            document: self.document.clone(),
            page: self.page.clone(),
            layout: LayoutOptions {
                rack_min_width_percent: self.rack_min_width_percent,
                description_max_width_percent: self.description_max_width_percent,
                separation: self.separation,
                show_separation_line: self.show_separation_line,
                hole_count_interval: self.show_hole_count.then_some(self.hole_count_interval),
                show_comments: self.show_comments,
                last_update: self.show_last_update.then(|| LastUpdate {
                    prefix: self.last_update_prefix.clone(),
                    show_time: self.last_update_time,
                    timezone: self.timezone,
                }),
            },
            output: self.output.clone(),
            heights,
            decorations: self.decorations,
            covers: self.covers.clone(),
        })
    }
}

/// On-disk form of the configuration. Every key is optional except the
/// rack name and height.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub rack: RackSection,
    #[serde(default)]
    pub document: DocumentSection,
    #[serde(default)]
    pub page: PageSection,
    #[serde(default)]
    pub layout: LayoutSection,
    #[serde(default)]
    pub last_update: LastUpdateSection,
    #[serde(default)]
    pub output: OutputSection,
    #[serde(default)]
    pub height_types: Option<HeightTypeTable>,
    #[serde(default)]
    pub covers: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RackSection {
    pub name: String,
    pub height: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub height_description: Option<String>,
    pub width: Option<i64>,
    pub front_identifier: Option<String>,
    pub back_identifier: Option<String>,
    pub front_description: Option<String>,
    pub back_description: Option<String>,
    pub default_unit_height_mounts: Option<i64>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentSection {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub creator: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageSection {
    pub format: Option<String>,
    pub margins: Option<f64>,
    pub font_family: Option<String>,
    pub font_size: Option<f64>,
    pub header_image: Option<PathBuf>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutSection {
    pub rack_min_width_percent: Option<f64>,
    pub description_max_width_percent: Option<f64>,
    pub show_separation: Option<bool>,
    pub separation_width: Option<f64>,
    pub separation_line_width: Option<f64>,
    pub show_hole_count: Option<bool>,
    pub hole_count_interval: Option<i64>,
    pub show_comments: Option<bool>,
    pub decorations: Option<bool>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LastUpdateSection {
    pub show: Option<bool>,
    pub prefix: Option<String>,
    pub show_time: Option<bool>,
    pub timezone: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSection {
    pub destination: Option<String>,
    pub path: Option<PathBuf>,
    pub encoding: Option<String>,
    pub px_per_mm: Option<f64>,
}

impl ConfigFile {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| RackError::io(path, e))?;
        Self::from_toml_str(&text)
    }

    /// A builder carrying every value of the file. Relative paths are taken
    /// relative to `base_dir`.
    pub fn to_builder(&self, base_dir: &Path) -> Result<RackDiagramConfigBuilder> {
        let mut b = RackDiagramConfigBuilder::new(&self.rack.name, "1")?;
        let r = &self.rack;
        // the table and default mounts decide how the height resolves
        if let Some(m) = r.default_unit_height_mounts {
            b.default_unit_height_mounts(m)?;
        }
        if let Some(table) = &self.height_types {
            b.height_types(table.clone())?;
        }
        b.rack_height(&r.height)?;
        if let Some(v) = &r.description {
            b.rack_description(v)?;
        }
        if let Some(v) = &r.location {
            b.rack_location(v)?;
        }
        if let Some(v) = &r.height_description {
            b.rack_height_description(v)?;
        }
        if let Some(v) = r.width {
            b.rack_width(v)?;
        }
        if let Some(v) = &r.front_identifier {
            b.front_identifier(v)?;
        }
        if let Some(v) = &r.back_identifier {
            b.back_identifier(v)?;
        }
        if let Some(v) = &r.front_description {
            b.front_description(v)?;
        }
        if let Some(v) = &r.back_description {
            b.back_description(v)?;
        }

        let d = &self.document;
        if let Some(v) = &d.title {
            b.title(v)?;
        }
        if let Some(v) = &d.author {
            b.author(v)?;
        }
        if let Some(v) = &d.subject {
            b.subject(v)?;
        }
        if let Some(v) = &d.keywords {
            b.keywords(v)?;
        }
        if let Some(v) = &d.creator {
            b.creator(v)?;
        }

        let p = &self.page;
        if let Some(v) = &p.format {
            b.output_format(v)?;
        }
        if let Some(v) = p.margins {
            b.margins(v)?;
        }
        if let Some(v) = &p.font_family {
            b.font_family(v)?;
        }
        if let Some(v) = p.font_size {
            b.font_size(v)?;
        }
        if let Some(v) = &p.header_image {
            b.header_image(base_dir.join(v))?;
        }

        let l = &self.layout;
        set_percents(&mut b, l.rack_min_width_percent, l.description_max_width_percent)?;
        if let Some(v) = l.show_separation {
            b.show_separation_line(v);
        }
        if let Some(v) = l.separation_width {
            b.separation_width(v)?;
        }
        if let Some(v) = l.separation_line_width {
            b.separation_line_width(v)?;
        }
        if let Some(v) = l.show_hole_count {
            b.show_hole_count(v);
        }
        if let Some(v) = l.hole_count_interval {
            b.hole_count_interval(v)?;
        }
        if let Some(v) = l.show_comments {
            b.show_comments(v);
        }
        if let Some(v) = l.decorations {
            b.decorations(v);
        }
        for (unit_type, kind) in &self.covers {
            b.cover(unit_type, kind)?;
        }

        let u = &self.last_update;
        if let Some(v) = u.show {
            b.show_last_update(v);
        }
        if let Some(v) = &u.prefix {
            b.last_update_prefix(v)?;
        }
        if let Some(v) = u.show_time {
            b.last_update_time(v);
        }
        if let Some(v) = &u.timezone {
            b.timezone(v)?;
        }

        let o = &self.output;
        if let Some(v) = &o.destination {
            b.output_destination(v)?;
        }
        if let Some(v) = &o.path {
            b.output_path(base_dir.join(v));
        }
        if let Some(v) = &o.encoding {
            b.output_encoding(v)?;
        }
        if let Some(v) = o.px_per_mm {
            b.px_per_mm(v)?;
        }
        Ok(b)
    }
}

/// Set both percents, lowering one before raising the other so that a valid
/// final pair never trips the mutual bound on the way.
fn set_percents(
    b: &mut RackDiagramConfigBuilder,
    min_width: Option<f64>,
    description: Option<f64>,
) -> Result<()> {
    let (_, current_description) = b.current_percents();
    match (min_width, description) {
        (Some(m), Some(d)) if d <= current_description => {
            b.description_max_width_percent(d)?;
            b.rack_min_width_percent(m)?;
        }
        (m, d) => {
            if let Some(m) = m {
                b.rack_min_width_percent(m)?;
            }
            if let Some(d) = d {
                b.description_max_width_percent(d)?;
            }
        }
    }
    Ok(())
}
