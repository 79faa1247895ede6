//! Height notation: `<count>` or `<count><type>` where `type` is a key of the
//! height-type table (`2he`, `6 mh`, `1U`). Everything resolves to a number of
//! mounting holes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{HeightIssue, RackError, Result};

/// Unit-type → mounting holes multiplier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeightTypeTable {
    multipliers: BTreeMap<String, u32>,
}

impl Default for HeightTypeTable {
    fn default() -> Self {
        // he = Hoeheneinheiten, u = unit, ru = rack unit,
        // be = Befestigungseinheiten, fu = fixing unit, mh = mounting hole
        Self::from_pairs([("he", 3), ("u", 3), ("ru", 3), ("be", 1), ("fu", 1), ("mh", 1)])
    }
}

impl HeightTypeTable {
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, u32)>) -> Self {
        let multipliers = pairs
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();
        Self { multipliers }
    }

    pub fn multiplier(&self, unit: &str) -> Option<u32> {
        self.multipliers.get(&unit.to_lowercase()).copied()
    }

    pub fn insert(&mut self, unit: &str, multiplier: u32) {
        self.multipliers.insert(unit.to_lowercase(), multiplier);
    }

    pub fn remove(&mut self, unit: &str) -> Option<u32> {
        self.multipliers.remove(&unit.to_lowercase())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HeightUnit {
    /// A bare number, counted in default unit heights.
    Default,
    /// A lower-cased key of the height-type table.
    Type(String),
}

/// A parsed height notation, before any arithmetic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Height {
    pub count: u64,
    pub unit: HeightUnit,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeightResolver {
    table: HeightTypeTable,
    default_unit_height_mounts: u32,
}

impl Default for HeightResolver {
    fn default() -> Self {
        Self::new(HeightTypeTable::default(), 3)
    }
}

impl HeightResolver {
    pub fn new(table: HeightTypeTable, default_unit_height_mounts: u32) -> Self {
        Self {
            table,
            default_unit_height_mounts,
        }
    }

    pub fn table(&self) -> &HeightTypeTable {
        &self.table
    }

    pub fn default_unit_height_mounts(&self) -> u32 {
        self.default_unit_height_mounts
    }

    /// Parse `raw` into a typed height. Whitespace anywhere is ignored.
    pub fn parse(&self, raw: &str) -> Result<Height> {
        let invalid = |reason| RackError::InvalidHeight {
            raw: raw.to_string(),
            reason,
        };
        let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() {
            return Err(invalid(HeightIssue::Empty));
        }
        let split = compact
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(compact.len());
        let (digits, suffix) = compact.split_at(split);
        // an empty count behaves like zero
        let count = if digits.is_empty() {
            0
        } else {
            digits
                .parse::<u64>()
                .map_err(|_| invalid(HeightIssue::NotPositive(i64::MAX)))?
        };
        if suffix.is_empty() {
            return Ok(Height {
                count,
                unit: HeightUnit::Default,
            });
        }
        let unit = suffix.to_lowercase();
        if self.table.multiplier(&unit).is_none() {
            return Err(invalid(HeightIssue::UnknownType(suffix.to_string())));
        }
        Ok(Height {
            count,
            unit: HeightUnit::Type(unit),
        })
    }

    /// Number of mounting holes of a parsed height.
    pub fn holes(&self, height: &Height) -> Option<u64> {
        let multiplier = match &height.unit {
            HeightUnit::Default => self.default_unit_height_mounts,
            HeightUnit::Type(unit) => self.table.multiplier(unit)?,
        };
        Some(height.count.saturating_mul(u64::from(multiplier)))
    }

    /// Resolve a raw height notation to a positive number of mounting holes.
    pub fn resolve(&self, raw: &str) -> Result<u32> {
        let height = self.parse(raw)?;
        let holes = self.holes(&height).unwrap_or(0);
        if holes == 0 {
            return Err(RackError::InvalidHeight {
                raw: raw.to_string(),
                reason: HeightIssue::NotPositive(0),
            });
        }
        u32::try_from(holes).map_err(|_| RackError::InvalidHeight {
            raw: raw.to_string(),
            reason: HeightIssue::NotPositive(i64::try_from(holes).unwrap_or(i64::MAX)),
        })
    }
}
