use std::collections::{BTreeMap, BTreeSet};

use super::to_snake;

/// Field names whose snake_case form cannot be derived from casing alone.
/// `FFJCU` is the registry abbreviation written as `ff_jcu` in the database.
pub const BUILTIN_OVERRIDES: &[(&str, &str)] = &[("FFJCU", "ff_jcu")];

/// Renames header fields: an explicit override when one exists for the
/// trimmed name, otherwise [`to_snake`].
#[derive(Debug, Clone, Default)]
pub struct HeaderRenamer {
    overrides: BTreeMap<String, String>,
}

impl HeaderRenamer {
    /// A renamer with no overrides; every field goes through `to_snake`.
    pub fn new() -> Self {
        Self::default()
    }

    /// A renamer preloaded with [`BUILTIN_OVERRIDES`].
    pub fn with_builtin_overrides() -> Self {
        let mut renamer = Self::new();
        for (from, to) in BUILTIN_OVERRIDES {
            renamer.insert(from, to);
        }
        renamer
    }

    /// Add or replace one override. The key is trimmed before storing.
    pub fn insert(&mut self, from: &str, to: &str) {
        self.overrides.insert(from.trim().to_string(), to.to_string());
    }

    pub fn extend<'a, I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        for (from, to) in entries {
            self.insert(from, to);
        }
    }

    pub fn rename(&self, field: &str) -> String {
        match self.overrides.get(field.trim()) {
            Some(name) => name.clone(),
            None => to_snake(field),
        }
    }

    pub fn rename_all<'a, I>(&self, fields: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        fields.into_iter().map(|f| self.rename(f)).collect()
    }

    /// Override keys that match none of `fields` (after trimming).
    pub fn unused_overrides<'a, I>(&self, fields: I) -> Vec<&str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let seen: BTreeSet<&str> = fields.into_iter().map(str::trim).collect();
        self.overrides
            .keys()
            .map(String::as_str)
            .filter(|k| !seen.contains(*k))
            .collect()
    }
}
