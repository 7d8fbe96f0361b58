//! Free-text name lists and team-code labelling

use crate::types::Name;
use std::collections::BTreeMap;

/// Split free text on commas and newlines into names.
///
/// Entries are trimmed and empty entries dropped. Order and duplicates are
/// kept as given.
#[must_use]
pub fn parse_names(raw: &str) -> Vec<Name> {
    raw.split([',', '\n', '\r'])
        .filter_map(|entry| Name::new(entry).ok())
        .collect()
}

/// Maps a leading team code character to a team label.
///
/// A name is labelled when its first character is a known code and every
/// remaining character is alphabetic, e.g. `1Lan` with `"1" = "1Hung"`.
#[derive(Clone, Debug, Default)]
pub struct TeamCodes {
    codes: BTreeMap<char, String>,
}

impl TeamCodes {
    /// Build from config entries; keys that are not a single character are skipped
    #[must_use]
    pub fn from_config(teams: &BTreeMap<String, String>) -> Self {
        let codes = teams
            .iter()
            .filter_map(|(key, label)| {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(code), None) => Some((code, label.clone())),
                    _ => None,
                }
            })
            .collect();
        Self { codes }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Team label for a name, if it carries a known code
    #[must_use]
    pub fn label(&self, name: &Name) -> Option<&str> {
        let mut chars = name.as_str().chars();
        let code = chars.next()?;
        let rest = chars.as_str();
        if rest.is_empty() || !rest.chars().all(char::is_alphabetic) {
            return None;
        }
        self.codes.get(&code).map(String::as_str)
    }
}
