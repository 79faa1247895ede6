//! Unit records read from JSON, filtered by rack.
//!
//! The file holds an array of records:
//!
//! ```json
//! [
//!   { "name": "srv1", "rack": "r1", "side": "front", "position": 1, "height": "2he",
//!     "type": "server", "color": [200, 30, 30], "comment": "web frontend" }
//! ]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RackError, Result};
use crate::models::{Rgb, Unit, UnitSet};

/// Heights may be written as bare numbers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawHeight {
    Count(u64),
    Text(String),
}

impl RawHeight {
    pub fn into_notation(self) -> String {
        match self {
            RawHeight::Count(n) => n.to_string(),
            RawHeight::Text(s) => s,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnitRecord {
    pub name: String,
    #[serde(default)]
    pub rack: Option<String>,
    pub side: String,
    pub position: u32,
    pub height: RawHeight,
    #[serde(default, rename = "type")]
    pub unit_type: Option<String>,
    #[serde(default)]
    pub color: Option<Rgb>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl UnitRecord {
    pub fn into_unit(self) -> Result<Unit> {
        let mut unit = Unit::new(self.name, self.side, self.position, self.height.into_notation())?;
        if let Some(rack) = self.rack {
            unit = unit.with_rack(rack);
        }
        if let Some(unit_type) = self.unit_type {
            unit = unit.with_type(unit_type);
        }
        if let Some(color) = self.color {
            unit = unit.with_color(color);
        }
        if let Some(comment) = self.comment {
            unit = unit.with_comment(comment);
        }
        Ok(unit)
    }
}

pub fn parse_units(text: &str) -> Result<Vec<UnitRecord>> {
    Ok(serde_json::from_str(text)?)
}

pub fn load_units(path: &Path) -> Result<Vec<UnitRecord>> {
    let text = std::fs::read_to_string(path).map_err(|e| RackError::io(path, e))?;
    let records = parse_units(&text)?;
    debug!(path = %path.display(), records = records.len(), "unit records loaded");
    Ok(records)
}

/// Units of `rack`, or all units when no rack is given, in file order.
pub fn select_units(records: Vec<UnitRecord>, rack: Option<&str>) -> Result<UnitSet> {
    let total = records.len();
    let units = records
        .into_iter()
        .filter(|r| rack.is_none_or(|id| r.rack.as_deref() == Some(id)))
        .map(UnitRecord::into_unit)
        .collect::<Result<Vec<_>>>()?;
    debug!(rack, selected = units.len(), total, "units selected");
    let mut set = UnitSet::new();
    set.extend(units)?;
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNITS: &str = r#"[
        { "name": "srv1", "rack": "r1", "side": "front", "position": 1, "height": "2he",
          "type": "server", "color": [200, 30, 30], "comment": "web" },
        { "name": "sw1", "rack": "r1", "side": "back", "position": 10, "height": 1, "color": [90] },
        { "name": "srv9", "rack": "r2", "side": "front", "position": 4, "height": "1U" }
    ]"#;

    #[test]
    fn records_become_units() {
        let records = parse_units(UNITS).unwrap();
        assert_eq!(records[1].height, RawHeight::Count(1));
        let set = select_units(records, None).unwrap();
        assert_eq!(set.len(), 3);
        let srv1 = set.get("srv1").unwrap();
        assert_eq!(srv1.color(), Some(Rgb::Rgb(200, 30, 30)));
        assert_eq!(srv1.unit_type(), Some("server"));
        assert_eq!(srv1.comment(), Some("web"));
        assert_eq!(set.get("sw1").unwrap().height(), "1");
        assert_eq!(set.get("sw1").unwrap().color(), Some(Rgb::Gray(90)));
    }

    #[test]
    fn filter_by_rack() {
        let set = select_units(parse_units(UNITS).unwrap(), Some("r1")).unwrap();
        let names: Vec<_> = set.iter().map(Unit::name).collect();
        assert_eq!(names, ["srv1", "sw1"]);
    }

    #[test]
    fn empty_selection_is_an_error() {
        let err = select_units(parse_units(UNITS).unwrap(), Some("r3")).unwrap_err();
        assert_eq!(err.code(), 46);
    }

    #[test]
    fn duplicates_in_the_file_are_rejected() {
        let text = r#"[
            { "name": "a", "side": "front", "position": 1, "height": "1" },
            { "name": "a", "side": "back", "position": 2, "height": "1" }
        ]"#;
        let err = select_units(parse_units(text).unwrap(), None).unwrap_err();
        assert_eq!(err.code(), 48);
    }

    #[test]
    fn malformed_records_fail_to_parse() {
        assert_eq!(parse_units("[{\"name\": \"a\"}]").unwrap_err().code(), 63);
        let text = r#"[{ "name": "a", "side": "front", "position": 1, "height": "1", "color": [1, 2, 3, 4] }]"#;
        assert_eq!(parse_units(text).unwrap_err().code(), 63);
    }
}
