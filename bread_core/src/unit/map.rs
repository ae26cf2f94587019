//! Name-keyed dependency collection.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::{Capabilities, UnitRef};

/// Dependency set keyed by unit name.
///
/// Keys are always the unit's own name. An index of ownable members is kept
/// next to the map so [`ownables`](UnitMap::ownables) is a lookup.
#[derive(Clone, Default)]
pub struct UnitMap {
    units: BTreeMap<String, UnitRef>,
    ownable: BTreeSet<String>,
}

impl UnitMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `unit`, replacing any unit with the same name.
    pub fn insert(&mut self, unit: UnitRef) -> Option<UnitRef> {
        let name = unit.name().to_string();
        if unit.ownership().is_some() {
            self.ownable.insert(name.clone());
        } else {
            self.ownable.remove(&name);
        }
        self.units.insert(name, unit)
    }

    /// Insert `unit` unless its name is already present. First seen wins.
    pub fn insert_if_absent(&mut self, unit: UnitRef) -> bool {
        if self.units.contains_key(unit.name()) {
            return false;
        }
        self.insert(unit);
        true
    }

    pub fn get(&self, name: &str) -> Option<&UnitRef> {
        self.units.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.units.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.units.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &UnitRef)> {
        self.units.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn values(&self) -> impl Iterator<Item = &UnitRef> {
        self.units.values()
    }

    /// Members whose capabilities include all of `caps`.
    pub fn with_capability(&self, caps: Capabilities) -> impl Iterator<Item = &UnitRef> {
        self.units
            .values()
            .filter(move |u| u.capabilities().contains(caps))
    }

    /// Members that carry an ownership guard.
    pub fn ownables(&self) -> impl Iterator<Item = &UnitRef> {
        self.ownable.iter().filter_map(|name| self.units.get(name))
    }

    /// Add every member of `other` not already present.
    pub fn extend(&mut self, other: &UnitMap) {
        for unit in other.values() {
            self.insert_if_absent(unit.clone());
        }
    }
}

impl FromIterator<UnitRef> for UnitMap {
    fn from_iter<I: IntoIterator<Item = UnitRef>>(iter: I) -> Self {
        let mut map = Self::new();
        for unit in iter {
            map.insert_if_absent(unit);
        }
        map
    }
}

impl fmt::Debug for UnitMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
