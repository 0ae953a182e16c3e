//! Case-insensitive, multi-valued header map.

use indexmap::IndexMap;

/// HTTP headers keyed case-insensitively, preserving insertion order and every
/// value sent for a name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    // lower-cased name -> (name as first sent, values)
    entries: IndexMap<String, (String, Vec<String>)>,
}

impl Headers {
    /// Creates an empty header map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value for `name`, keeping any existing values.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.entries
            .entry(name.to_ascii_lowercase())
            .or_insert_with(|| (name, Vec::new()))
            .1
            .push(value.into());
    }

    /// All values sent for `name`, in order. Empty when absent.
    pub fn get_all(&self, name: &str) -> &[String] {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    /// The first value sent for `name`.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get_all(name).first().map(String::as_str)
    }

    /// Whether `name` was sent at all.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_lowercase())
    }

    /// Iterates `(name, values)` pairs using the name as first sent.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .values()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Number of distinct header names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no headers are present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.append(name, value);
        }
        headers
    }
}
