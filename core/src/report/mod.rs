#![deny(missing_docs)]

//! # Validation Reports
//!
//! The sole output of the validator: an ordered list of classified `Message`s.
//!
//! - **context**: metadata attached to messages once validation completes.
//! - **levels**: message key -> severity configuration.

pub mod context;
pub mod levels;

pub use context::{MessageContext, MessageLocation, Pointers};
pub use levels::LevelResolver;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a finding. Ordered from most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    /// Blocks the interaction: the report `has_errors`.
    #[serde(alias = "error")]
    Error,
    /// Worth surfacing, not blocking.
    #[serde(alias = "warn")]
    Warn,
    /// Informational only.
    #[serde(alias = "info")]
    Info,
    /// Suppressed from the error determination, kept for audit.
    #[serde(alias = "ignore")]
    Ignore,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Ignore => "IGNORE",
        })
    }
}

/// One validation finding.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    key: String,
    message: String,
    level: Level,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    additional_info: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<MessageContext>,
}

impl Message {
    /// Creates an `ERROR` message. The final level is decided by the
    /// `LevelResolver` once validation completes.
    pub fn new(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            message: message.into(),
            level: Level::Error,
            additional_info: Vec::new(),
            context: None,
        }
    }

    /// Sets the level.
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Appends a line of supporting detail.
    pub fn with_additional_info(mut self, info: impl Into<String>) -> Self {
        self.additional_info.push(info.into());
        self
    }

    /// Attaches context, keeping any fields already set.
    pub fn with_context(mut self, context: MessageContext) -> Self {
        self.context = Some(match self.context.take() {
            Some(existing) => existing.enriched_with(&context),
            None => context,
        });
        self
    }

    /// Dotted message key, e.g. `validation.request.body.missing`.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Human readable text.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Severity.
    pub fn level(&self) -> Level {
        self.level
    }

    /// Supporting detail lines.
    pub fn additional_info(&self) -> &[String] {
        &self.additional_info
    }

    /// Context attached after validation.
    pub fn context(&self) -> Option<&MessageContext> {
        self.context.as_ref()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} [{}]", self.level, self.message, self.key)?;
        for info in &self.additional_info {
            write!(f, "\n\t* {}", info)?;
        }
        Ok(())
    }
}

/// An ordered, immutable collection of findings.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    messages: Vec<Message>,
}

impl ValidationReport {
    /// A report with no findings.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A report with a single finding.
    pub fn singleton(message: Message) -> Self {
        Self {
            messages: vec![message],
        }
    }

    /// A report over the given findings, in order.
    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// Concatenates two reports, `self` first.
    pub fn merge(mut self, other: ValidationReport) -> Self {
        self.messages.extend(other.messages);
        self
    }

    /// Attaches `context` to every message, keeping fields already set.
    pub fn with_additional_context(self, context: &MessageContext) -> Self {
        self.map_messages(|m| m.with_context(context.clone()))
    }

    /// Findings, in order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Consumes the report.
    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }

    /// Whether any finding is at `ERROR` level.
    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(|m| m.level == Level::Error)
    }

    /// Whether there are no findings at all.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub(crate) fn map_messages(self, f: impl FnMut(Message) -> Message) -> Self {
        Self {
            messages: self.messages.into_iter().map(f).collect(),
        }
    }
}

impl FromIterator<ValidationReport> for ValidationReport {
    fn from_iter<T: IntoIterator<Item = ValidationReport>>(iter: T) -> Self {
        iter.into_iter()
            .fold(ValidationReport::empty(), ValidationReport::merge)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.messages.is_empty() {
            return f.write_str("No validation errors.");
        }
        writeln!(f, "Validation failed.")?;
        for m in &self.messages {
            writeln!(f, "{}", m)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn report(keys: &[&str]) -> ValidationReport {
        ValidationReport::from_messages(keys.iter().map(|k| Message::new(*k, *k)).collect())
    }

    fn keys(report: &ValidationReport) -> Vec<&str> {
        report.messages().iter().map(Message::key).collect()
    }

    #[test]
    fn test_merge_is_associative_and_order_preserving() {
        let a = report(&["a1", "a2"]);
        let b = report(&["b1"]);
        let c = report(&["c1", "c2"]);

        let left = a.clone().merge(b.clone()).merge(c.clone());
        let right = a.merge(b.merge(c));

        assert_eq!(keys(&left), vec!["a1", "a2", "b1", "c1", "c2"]);
        assert_eq!(keys(&left), keys(&right));
    }

    #[test]
    fn test_has_errors_only_counts_error_level() {
        let warn_only = ValidationReport::singleton(Message::new("k", "t").with_level(Level::Warn));
        assert!(!warn_only.has_errors());

        let ignored = ValidationReport::singleton(Message::new("k", "t").with_level(Level::Ignore));
        assert!(!ignored.has_errors());
        assert!(!ignored.is_empty());

        assert!(report(&["k"]).has_errors());
    }

    #[test]
    fn test_additional_context_does_not_overwrite() {
        let original = MessageContext::default().with_parameter("id");
        let report = ValidationReport::singleton(Message::new("k", "t").with_context(original))
            .with_additional_context(
                &MessageContext::default()
                    .with_parameter("other")
                    .with_response_status(404),
            );

        let ctx = report.messages()[0].context().unwrap();
        assert_eq!(ctx.parameter(), Some("id"));
        assert_eq!(ctx.response_status(), Some(404));
    }

    #[test]
    fn test_collect_merges_in_order() {
        let merged: ValidationReport = vec![report(&["x"]), report(&[]), report(&["y"])]
            .into_iter()
            .collect();
        assert_eq!(keys(&merged), vec!["x", "y"]);
    }
}
