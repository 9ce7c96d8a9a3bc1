//! The resource catalog: a key to display text map that never overwrites.

use indexmap::IndexMap;

use crate::keys::humanize;

/// The separator between the scope and the fragment of a resource key.
pub const KEY_SEPARATOR: char = '.';

#[derive(Debug, Clone)]
struct Entry {
    key: String,
    value: String,
}

/// A key to display text map with case-insensitive keys.
///
/// Only [`ResourceCatalog::try_add`] inserts, and it never replaces an
/// existing key. Entries iterate in the order they were first added.
#[derive(Debug, Clone, Default)]
pub struct ResourceCatalog {
    entries: IndexMap<String, Entry>,
}

impl ResourceCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `value` under `key` unless the key is already present.
    ///
    /// Returns `false` without touching the catalog when the key is empty or
    /// ends with [`KEY_SEPARATOR`], when the value is blank, or when the key
    /// exists under any casing. Stored values are humanized.
    pub fn try_add(&mut self, key: &str, value: &str) -> bool {
        if key.is_empty() || key.ends_with(KEY_SEPARATOR) || value.trim().is_empty() {
            return false;
        }

        let value = humanize(value);
        let folded = key.to_lowercase();
        if let Some(existing) = self.entries.get(&folded) {
            if existing.value != value {
                log::debug!(
                    "key collision on {key}: keeping {:?}, dropping {value:?}",
                    existing.value
                );
            }
            return false;
        }

        self.entries.insert(
            folded,
            Entry {
                key: key.to_owned(),
                value: value.into_owned(),
            },
        );
        true
    }

    /// Adds every pair through [`Self::try_add`], returning how many were new.
    pub fn merge<K, V>(&mut self, entries: impl IntoIterator<Item = (K, V)>) -> usize
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        entries
            .into_iter()
            .filter(|(k, v)| self.try_add(k.as_ref(), v.as_ref()))
            .count()
    }

    /// Looks a key up, ignoring case.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(&key.to_lowercase())
            .map(|e| e.value.as_str())
    }

    /// Whether the key is present under any casing.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&key.to_lowercase())
    }

    /// The number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries as `(key, value)` with the key's original casing.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .values()
            .map(|e| (e.key.as_str(), e.value.as_str()))
    }
}

impl<K: AsRef<str>, V: AsRef<str>> FromIterator<(K, V)> for ResourceCatalog {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut catalog = Self::new();
        catalog.merge(iter);
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_writer_wins() {
        let mut catalog = ResourceCatalog::new();
        assert!(catalog.try_add("Login.welcome", "Welcome"));
        assert!(!catalog.try_add("Login.welcome", "Welcome back"));
        assert!(!catalog.try_add("LOGIN.WELCOME", "Hi"));
        assert_eq!(catalog.get("login.Welcome"), Some("Welcome"));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn rejects_invalid_entries() {
        let mut catalog = ResourceCatalog::new();
        assert!(!catalog.try_add("", "Text"));
        assert!(!catalog.try_add("Login.", "Text"));
        assert!(!catalog.try_add("Login.x", ""));
        assert!(!catalog.try_add("Login.y", "  \t"));
        assert!(catalog.is_empty());
    }

    #[test]
    fn humanizes_identifiers() {
        let mut catalog = ResourceCatalog::new();
        assert!(catalog.try_add("User.FirstName", "FirstName"));
        assert!(catalog.try_add("Page.title", "Hello there"));
        assert_eq!(catalog.get("User.FirstName"), Some("First Name"));
        assert_eq!(catalog.get("Page.title"), Some("Hello there"));
    }

    #[test]
    fn merge_keeps_existing() {
        let mut catalog: ResourceCatalog =
            [("Button.Save", "Speichern"), ("Menu.Home", "Start")].into_iter().collect();
        let added = catalog.merge([("button.save", "Save"), ("Menu.Users", "Users")]);
        assert_eq!(added, 1);

        let entries: Vec<_> = catalog.iter().collect();
        assert_eq!(
            entries,
            vec![
                ("Button.Save", "Speichern"),
                ("Menu.Home", "Start"),
                ("Menu.Users", "Users"),
            ]
        );
    }
}
