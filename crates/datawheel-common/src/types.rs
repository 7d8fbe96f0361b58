//! Core type definitions for Datawheel
//!
//! This module defines the fundamental types used throughout the system:
//! person names, the weighted group labels, rosters, low-tier policies and
//! the sequence/statistics values produced by an allocation run.

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Identifier for a person receiving data items.
///
/// Always trimmed and non-empty. Equality is exact string match, there is
/// no case folding.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display)]
#[serde(try_from = "String", into = "String")]
#[display("{_0}")]
pub struct Name(String);

impl Name {
    /// Create a name from raw text, trimming surrounding whitespace
    pub fn new(raw: impl AsRef<str>) -> Result<Self, NameError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(NameError::Empty);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Get the name as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({:?})", self.0)
    }
}

impl TryFrom<String> for Name {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Name> for String {
    fn from(name: Name) -> Self {
        name.0
    }
}

impl FromStr for Name {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Errors that can occur when creating a name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("name must not be empty")]
    Empty,
}

/// Ranked group a person belongs to for wheel allocation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GroupLabel {
    A,
    B,
    C,
}

impl GroupLabel {
    /// All labels in wheel order
    pub const ALL: [Self; 3] = [Self::A, Self::B, Self::C];

    /// Items each member of this group receives per wheel round
    #[must_use]
    pub const fn weight(self) -> usize {
        match self {
            Self::A => 3,
            Self::B => 2,
            Self::C => 1,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
        }
    }
}

impl fmt::Display for GroupLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupLabel {
    type Err = GroupLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" => Ok(Self::A),
            "B" | "b" => Ok(Self::B),
            "C" | "c" => Ok(Self::C),
            other => Err(GroupLabelError(other.to_string())),
        }
    }
}

/// Error returned when parsing an unknown group label
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown group label: {0:?} (expected A, B or C)")]
pub struct GroupLabelError(pub String);

/// Group membership for wheel allocation.
///
/// Member order within a group is the cycling order. The serialized form
/// is `{"A": [...], "B": [...], "C": [...]}`; missing keys read as empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupAssignment {
    #[serde(rename = "A", default)]
    a: Vec<Name>,
    #[serde(rename = "B", default)]
    b: Vec<Name>,
    #[serde(rename = "C", default)]
    c: Vec<Name>,
}

impl GroupAssignment {
    /// Create an empty assignment
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter for one group
    #[must_use]
    pub fn with(mut self, label: GroupLabel, members: Vec<Name>) -> Self {
        self.set(label, members);
        self
    }

    /// Members of a group in cycling order
    #[must_use]
    pub fn members(&self, label: GroupLabel) -> &[Name] {
        match label {
            GroupLabel::A => &self.a,
            GroupLabel::B => &self.b,
            GroupLabel::C => &self.c,
        }
    }

    /// Replace the members of a group
    pub fn set(&mut self, label: GroupLabel, members: Vec<Name>) {
        *self.members_mut(label) = members;
    }

    /// Append a member to a group
    pub fn push(&mut self, label: GroupLabel, name: Name) {
        self.members_mut(label).push(name);
    }

    fn members_mut(&mut self, label: GroupLabel) -> &mut Vec<Name> {
        match label {
            GroupLabel::A => &mut self.a,
            GroupLabel::B => &mut self.b,
            GroupLabel::C => &mut self.c,
        }
    }

    /// Iterate over `(label, members)` in wheel order
    pub fn iter(&self) -> impl Iterator<Item = (GroupLabel, &[Name])> {
        GroupLabel::ALL.into_iter().map(|label| (label, self.members(label)))
    }

    /// First group (in wheel order) that lists this name
    #[must_use]
    pub fn label_of(&self, name: &Name) -> Option<GroupLabel> {
        self.iter()
            .find(|(_, members)| members.contains(name))
            .map(|(label, _)| label)
    }

    /// Total number of listed members across all groups
    #[must_use]
    pub fn len(&self) -> usize {
        self.a.len() + self.b.len() + self.c.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One pool of people for quota allocation, plus the names marked for a
/// reduced ("low") allocation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Roster {
    names: Vec<Name>,
    low: Vec<Name>,
}

impl Roster {
    #[must_use]
    pub fn new(names: Vec<Name>) -> Self {
        Self {
            names,
            low: Vec::new(),
        }
    }

    /// Mark names for low-tier allocation
    #[must_use]
    pub fn with_low(mut self, low: Vec<Name>) -> Self {
        self.low = low;
        self
    }

    #[must_use]
    pub fn names(&self) -> &[Name] {
        &self.names
    }

    #[must_use]
    pub fn low_set(&self) -> HashSet<Name> {
        self.low.iter().cloned().collect()
    }

    /// Low-tier names that do not appear on the roster.
    ///
    /// These are ignored by allocation; callers report them as warnings.
    #[must_use]
    pub fn stray_low_members(&self) -> Vec<&Name> {
        let mut seen = HashSet::new();
        self.low
            .iter()
            .filter(|name| !self.names.contains(name) && seen.insert(*name))
            .collect()
    }
}

/// How many items each low-tier member receives
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LowPolicy {
    /// Flat number of items per low-tier member
    FixedCount(usize),
    /// Percentage of the total, split evenly among low-tier members
    Percentage(u32),
}

impl fmt::Display for LowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FixedCount(n) => write!(f, "{n} per low member"),
            Self::Percentage(p) => write!(f, "{p}% of total"),
        }
    }
}

/// Ordered list of recipients, one entry per data item
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, From, Into)]
pub struct AssignmentSequence(Vec<Name>);

impl AssignmentSequence {
    #[must_use]
    pub fn as_slice(&self) -> &[Name] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Recipient of the final item; the resume marker for the next run
    #[must_use]
    pub fn last(&self) -> Option<&Name> {
        self.0.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Name> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a AssignmentSequence {
    type Item = &'a Name;
    type IntoIter = std::slice::Iter<'a, Name>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Per-person item count, keyed in order of first appearance
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatsTable {
    entries: Vec<StatsEntry>,
    index: HashMap<Name, usize>,
}

/// A single row of a [`StatsTable`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatsEntry {
    pub name: Name,
    pub count: usize,
}

impl StatsTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` items for `name`, creating the row if needed
    pub fn add(&mut self, name: &Name, count: usize) {
        match self.index.get(name) {
            Some(&pos) => self.entries[pos].count += count,
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push(StatsEntry {
                    name: name.clone(),
                    count,
                });
            }
        }
    }

    #[must_use]
    pub fn get(&self, name: &Name) -> Option<usize> {
        self.index.get(name).map(|&pos| self.entries[pos].count)
    }

    /// Number of distinct names
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts
    #[must_use]
    pub fn total(&self) -> usize {
        self.entries.iter().map(|e| e.count).sum()
    }

    /// Rows in order of first appearance
    pub fn iter(&self) -> impl Iterator<Item = &StatsEntry> {
        self.entries.iter()
    }

    /// Rows by descending count, ties kept in order of first appearance
    #[must_use]
    pub fn sorted_by_count(&self) -> Vec<&StatsEntry> {
        let mut rows: Vec<&StatsEntry> = self.entries.iter().collect();
        rows.sort_by(|a, b| b.count.cmp(&a.count));
        rows
    }
}
