//! Message key -> severity configuration.
//!
//! Keys are dotted (`validation.response.body.missing`). A level configured
//! for a prefix (`validation.response`) applies to every key below it unless a
//! longer prefix or the exact key is configured too.
//!
//! ```yaml
//! defaultLevel: ERROR
//! levels:
//!   validation.response: WARN
//!   validation.request.security.missing: IGNORE
//! ```

use crate::error::{AppError, AppResult};
use crate::report::{Level, ValidationReport};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Resolves the severity of a message key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LevelResolver {
    #[serde(default)]
    default_level: Option<Level>,
    #[serde(default)]
    levels: BTreeMap<String, Level>,
}

impl LevelResolver {
    /// A resolver with no overrides: every message keeps the level it was
    /// created with (`ERROR` for built-in findings).
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a YAML level configuration.
    pub fn from_yaml(yaml_content: &str) -> AppResult<Self> {
        serde_yaml::from_str(yaml_content)
            .map_err(|e| AppError::Config(format!("Failed to parse level configuration: {}", e)))
    }

    /// Sets the level for a key or key prefix.
    pub fn with_level(mut self, key: impl Into<String>, level: Level) -> Self {
        self.levels.insert(key.into(), level);
        self
    }

    /// Sets the level used for keys with no configured prefix.
    pub fn with_default_level(mut self, level: Level) -> Self {
        self.default_level = Some(level);
        self
    }

    /// The level for `key`: exact key, then successively shorter prefixes,
    /// then the default level (`ERROR` unless configured).
    pub fn resolve(&self, key: &str) -> Level {
        self.configured(key)
            .or(self.default_level)
            .unwrap_or(Level::Error)
    }

    fn configured(&self, key: &str) -> Option<Level> {
        let mut candidate = key;
        loop {
            if let Some(level) = self.levels.get(candidate) {
                return Some(*level);
            }
            match candidate.rfind('.') {
                Some(idx) => candidate = &candidate[..idx],
                None => return None,
            }
        }
    }

    /// Reclassifies every message in `report`.
    ///
    /// Messages whose key has no configured level keep their own level unless
    /// a default level is configured.
    pub fn apply(&self, report: ValidationReport) -> ValidationReport {
        report.map_messages(|m| {
            let level = self
                .configured(m.key())
                .or(self.default_level)
                .unwrap_or(m.level());
            m.with_level(level)
        })
    }
}
