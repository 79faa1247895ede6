use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = RackError> = std::result::Result<T, E>;

/// Configuration fields that only need to be non-empty strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    RackName,
    RackDescription,
    RackHeightDescription,
    RackLocation,
    FrontDescription,
    BackDescription,
    FrontIdentifier,
    BackIdentifier,
    Author,
    Title,
    Subject,
    Keyword,
    Creator,
    FontFamily,
    LastUpdatePrefix,
    UnitName,
}

impl TextField {
    fn code(self) -> u16 {
        match self {
            TextField::RackName => 24,
            TextField::RackDescription => 25,
            TextField::RackHeightDescription => 26,
            TextField::RackLocation => 28,
            TextField::FrontDescription => 29,
            TextField::BackDescription => 30,
            TextField::Author => 31,
            TextField::Title => 32,
            TextField::Subject => 33,
            TextField::Keyword => 35,
            TextField::Creator => 36,
            TextField::FontFamily => 38,
            TextField::LastUpdatePrefix => 42,
            TextField::UnitName => 47,
            TextField::FrontIdentifier => 51,
            TextField::BackIdentifier => 52,
        }
    }
}

impl fmt::Display for TextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TextField::RackName => "rack name",
            TextField::RackDescription => "rack description",
            TextField::RackHeightDescription => "rack height description",
            TextField::RackLocation => "rack location",
            TextField::FrontDescription => "rack front description",
            TextField::BackDescription => "rack back description",
            TextField::FrontIdentifier => "rack front identifier",
            TextField::BackIdentifier => "rack back identifier",
            TextField::Author => "pdf author",
            TextField::Title => "pdf title",
            TextField::Subject => "pdf subject",
            TextField::Keyword => "pdf keyword",
            TextField::Creator => "pdf creator",
            TextField::FontFamily => "font family name",
            TextField::LastUpdatePrefix => "last update string",
            TextField::UnitName => "unit name",
        };
        f.write_str(name)
    }
}

/// Why a height notation could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeightIssue {
    Empty,
    UnknownType(String),
    NotPositive(i64),
}

impl fmt::Display for HeightIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeightIssue::Empty => f.write_str("no height given"),
            HeightIssue::UnknownType(t) => {
                write!(f, "extracted height type \"{t}\" is not available")
            }
            HeightIssue::NotPositive(h) => write!(f, "wrong height calculated: \"{h}\""),
        }
    }
}

#[derive(Error, Debug)]
pub enum RackError {
    // configuration
    #[error("no {0} found")]
    EmptyText(TextField),
    #[error("function expects at least one pdf keyword")]
    EmptyKeywords,
    #[error("wrong width \"{0}\"; value must be an integer greater than 0")]
    InvalidRackWidth(i64),
    #[error("margins for PDF page must be greater than 0, but \"{0}\" found")]
    InvalidMargins(f64),
    #[error("please use a font size of at least {min}, found {size}")]
    FontSizeTooSmall { size: f64, min: f64 },
    #[error("{field} must be a percentage greater than 0, found {value}")]
    InvalidPercent { field: &'static str, value: f64 },
    #[error(
        "rack min width percent ({min_width}) and description max width percent ({description}) exceed 100 together"
    )]
    PercentBoundExceeded { min_width: f64, description: f64 },
    #[error("{field} must not be negative, found {value}")]
    NegativeSeparation { field: &'static str, value: f64 },
    #[error("hole count interval must be an integer value greater than 0, found {0}")]
    InvalidHoleCountInterval(i64),
    #[error("expected integer value greater than 0 for default unit height mounts, but found \"{0}\"")]
    InvalidDefaultUnitHeightMounts(i64),
    #[error("output format \"{0}\" is not available")]
    UnknownOutputFormat(String),
    #[error("output destination \"{0}\" is not supported")]
    UnknownDestination(String),
    #[error("output encoding \"{0}\" is not supported")]
    UnknownEncoding(String),
    #[error("timezone with identifier \"{0}\" is not available")]
    InvalidTimezone(String),
    #[error("cover kind \"{kind}\" for unit type \"{unit_type}\" is not available")]
    UnknownCoverKind { unit_type: String, kind: String },

    // geometry
    #[error("wrong height \"{raw}\": {reason}")]
    InvalidHeight { raw: String, reason: HeightIssue },
    #[error("wrong size \"{value}\" for {what}, must be greater than 0")]
    NonPositiveDimension { what: &'static str, value: f64 },
    #[error(
        "rack site identifier of unit \"{unit}\" is not correct, expecting \"{front}\" (front site) or \"{back}\" (back site) but found \"{side}\""
    )]
    SideMismatch {
        unit: String,
        side: String,
        front: String,
        back: String,
    },

    // data
    #[error("another unit with name \"{0}\" had already been added to unit dataset")]
    DuplicateUnit(String),
    #[error("unit with name \"{0}\" could not be found")]
    UnknownUnit(String),
    #[error("unit list must have at least one element")]
    EmptyUnitList,
    #[error("unit \"{name}\" is invalid: {reason}")]
    InvalidUnit { name: String, reason: String },

    // resources
    #[error("output destination is \"file\" but no output file was set")]
    MissingOutputPath,
    #[error("page surface could not be created: {0}")]
    Surface(String),
    #[error("header image {path:?} could not be read: {reason}")]
    HeaderImage { path: PathBuf, reason: String },
    #[error("file I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("unit data could not be parsed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("configuration could not be parsed: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("png encoding failed: {0}")]
    Png(#[from] png::EncodingError),
}

impl RackError {
    /// Stable numeric code reported to the user next to the message.
    pub fn code(&self) -> u16 {
        match self {
            RackError::EmptyText(field) => field.code(),
            RackError::EmptyKeywords => 34,
            RackError::InvalidRackWidth(_) => 27,
            RackError::InvalidMargins(_) => 37,
            RackError::FontSizeTooSmall { .. } => 39,
            RackError::InvalidPercent { .. } => 57,
            RackError::PercentBoundExceeded { .. } => 58,
            RackError::NegativeSeparation { .. } => 59,
            RackError::InvalidHoleCountInterval(_) => 56,
            RackError::InvalidDefaultUnitHeightMounts(_) => 60,
            RackError::UnknownOutputFormat(_) => 43,
            RackError::UnknownDestination(_) => 44,
            RackError::UnknownEncoding(_) => 61,
            RackError::InvalidTimezone(_) => 55,
            RackError::UnknownCoverKind { .. } => 53,
            RackError::InvalidHeight { reason, .. } => match reason {
                HeightIssue::Empty => 21,
                HeightIssue::UnknownType(_) => 22,
                HeightIssue::NotPositive(_) => 23,
            },
            RackError::NonPositiveDimension { .. } => 40,
            RackError::SideMismatch { .. } => 49,
            RackError::DuplicateUnit(_) => 48,
            RackError::UnknownUnit(_) => 45,
            RackError::EmptyUnitList => 46,
            RackError::InvalidUnit { .. } => 47,
            RackError::MissingOutputPath => 50,
            RackError::Surface(_) => 20,
            RackError::HeaderImage { .. } => 66,
            RackError::Io { .. } => 62,
            RackError::Json(_) => 63,
            RackError::Toml(_) => 64,
            RackError::Png(_) => 65,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RackError::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn height_codes_follow_the_issue() {
        let err = RackError::InvalidHeight {
            raw: "".into(),
            reason: HeightIssue::Empty,
        };
        assert_eq!(err.code(), 21);
        let err = RackError::InvalidHeight {
            raw: "3xx".into(),
            reason: HeightIssue::UnknownType("xx".into()),
        };
        assert_eq!(err.code(), 22);
        assert!(err.to_string().contains("\"xx\""));
    }

    #[test]
    fn side_mismatch_names_both_identifiers() {
        let err = RackError::SideMismatch {
            unit: "srv1".into(),
            side: "top".into(),
            front: "front".into(),
            back: "back".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("\"front\""));
        assert!(msg.contains("\"back\""));
        assert_eq!(err.code(), 49);
    }
}
