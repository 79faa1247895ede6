use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_UNIT_GRAY;
use crate::error::{RackError, Result, TextField};

/// Fill colour of a unit. A single component is a gray level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub enum Rgb {
    Gray(u8),
    Rgb(u8, u8, u8),
}

impl Default for Rgb {
    fn default() -> Self {
        Rgb::Gray(DEFAULT_UNIT_GRAY)
    }
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::Gray(0);
    pub const WHITE: Rgb = Rgb::Gray(255);

    pub fn components(self) -> (u8, u8, u8) {
        match self {
            Rgb::Gray(v) => (v, v, v),
            Rgb::Rgb(r, g, b) => (r, g, b),
        }
    }

    pub fn to_hex(self) -> String {
        let (r, g, b) = self.components();
        format!("#{r:02x}{g:02x}{b:02x}")
    }
}

impl TryFrom<Vec<u8>> for Rgb {
    type Error = String;

    fn try_from(v: Vec<u8>) -> Result<Self, Self::Error> {
        match v.as_slice() {
            [gray] => Ok(Rgb::Gray(*gray)),
            // red and green without blue falls back to red only
            [red, _] => Ok(Rgb::Gray(*red)),
            [r, g, b] => Ok(Rgb::Rgb(*r, *g, *b)),
            other => Err(format!("expected 1 or 3 colour components, found {}", other.len())),
        }
    }
}

impl From<Rgb> for Vec<u8> {
    fn from(c: Rgb) -> Self {
        match c {
            Rgb::Gray(v) => vec![v],
            Rgb::Rgb(r, g, b) => vec![r, g, b],
        }
    }
}

/// A device occupying a run of mounting holes on one side of a rack.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Unit {
    name: String,
    rack_id: Option<String>,
    side: String,
    position: u32,
    height: String,
    unit_type: Option<String>,
    color: Option<Rgb>,
    comment: Option<String>,
}

impl Unit {
    pub fn new(
        name: impl Into<String>,
        side: impl Into<String>,
        position: u32,
        height: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(RackError::EmptyText(TextField::UnitName));
        }
        if position == 0 {
            return Err(RackError::InvalidUnit {
                name,
                reason: "position is 1-based".into(),
            });
        }
        Ok(Self {
            name,
            rack_id: None,
            side: side.into(),
            position,
            height: height.into(),
            unit_type: None,
            color: None,
            comment: None,
        })
    }

    pub fn with_rack(mut self, rack_id: impl Into<String>) -> Self {
        self.rack_id = Some(rack_id.into());
        self
    }

    pub fn with_type(mut self, unit_type: impl Into<String>) -> Self {
        self.unit_type = Some(unit_type.into());
        self
    }

    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn rack_id(&self) -> Option<&str> {
        self.rack_id.as_deref()
    }
    pub fn side(&self) -> &str {
        &self.side
    }
    pub fn position(&self) -> u32 {
        self.position
    }
    pub fn height(&self) -> &str {
        &self.height
    }
    pub fn unit_type(&self) -> Option<&str> {
        self.unit_type.as_deref()
    }
    pub fn color(&self) -> Option<Rgb> {
        self.color
    }

    /// The comment, if it has anything besides whitespace.
    pub fn comment(&self) -> Option<&str> {
        self.comment
            .as_deref()
            .filter(|c| !c.trim().is_empty())
    }
}

/// Units keyed by name, iterated in insertion order.
#[derive(Clone, Debug, Default)]
pub struct UnitSet {
    units: IndexMap<String, Unit>,
}

impl UnitSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, unit: Unit) -> Result<()> {
        if self.units.contains_key(unit.name()) {
            return Err(RackError::DuplicateUnit(unit.name().to_string()));
        }
        self.units.insert(unit.name().to_string(), unit);
        Ok(())
    }

    /// Insert a non-empty batch. Stops at the first duplicate; units before it stay inserted.
    pub fn extend(&mut self, units: impl IntoIterator<Item = Unit>) -> Result<()> {
        let mut any = false;
        for unit in units {
            any = true;
            self.insert(unit)?;
        }
        if !any {
            return Err(RackError::EmptyUnitList);
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&Unit> {
        self.units
            .get(name)
            .ok_or_else(|| RackError::UnknownUnit(name.to_string()))
    }

    pub fn remove(&mut self, name: &str) -> Option<Unit> {
        self.units.shift_remove(name)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(name: &str) -> Unit {
        Unit::new(name, "front", 1, "1he").unwrap()
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut set = UnitSet::new();
        set.insert(unit("srv1")).unwrap();
        let err = set.insert(unit("srv1")).unwrap_err();
        assert!(matches!(err, RackError::DuplicateUnit(ref n) if n == "srv1"));
        assert_eq!(err.code(), 48);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn count_does_not_depend_on_insertion_order() {
        let names = ["c", "a", "d", "b"];
        let mut forward = UnitSet::new();
        forward.extend(names.iter().map(|n| unit(n))).unwrap();
        let mut backward = UnitSet::new();
        backward.extend(names.iter().rev().map(|n| unit(n))).unwrap();
        assert_eq!(forward.len(), 4);
        assert_eq!(backward.len(), 4);
        let order: Vec<_> = forward.iter().map(Unit::name).collect();
        assert_eq!(order, names);
    }

    #[test]
    fn empty_batches_and_unknown_names_fail() {
        let mut set = UnitSet::new();
        assert_eq!(set.extend(Vec::new()).unwrap_err().code(), 46);
        assert_eq!(set.get("nope").unwrap_err().code(), 45);
    }

    #[test]
    fn removing_keeps_the_remaining_order() {
        let mut set = UnitSet::new();
        set.extend(["a", "b", "c"].map(unit)).unwrap();
        assert!(set.remove("b").is_some());
        let order: Vec<_> = set.iter().map(Unit::name).collect();
        assert_eq!(order, ["a", "c"]);
    }

    #[test]
    fn whitespace_comments_count_as_missing() {
        let u = unit("a").with_comment("   ");
        assert_eq!(u.comment(), None);
        let u = unit("b").with_comment("db primary");
        assert_eq!(u.comment(), Some("db primary"));
    }

    #[test]
    fn colours_from_component_lists() {
        assert_eq!(Rgb::try_from(vec![10]).unwrap(), Rgb::Gray(10));
        assert_eq!(Rgb::try_from(vec![1, 2, 3]).unwrap(), Rgb::Rgb(1, 2, 3));
        assert!(Rgb::try_from(vec![]).is_err());
        assert_eq!(Rgb::Rgb(255, 0, 16).to_hex(), "#ff0010");
    }

    #[test]
    fn units_need_a_name_and_a_position() {
        assert_eq!(Unit::new("", "front", 1, "1").unwrap_err().code(), 47);
        assert_eq!(Unit::new("x", "front", 0, "1").unwrap_err().code(), 47);
    }
}
