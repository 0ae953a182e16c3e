//! # Whitelisting
//!
//! Named rules that demote matching findings to `IGNORE`. Rules never remove
//! a message: the rule's name is recorded in the message context instead.
//!
//! ```
//! use cdd_validator::model::Method;
//! use cdd_validator::whitelist::{message_has_key, method_is, path_contains, Whitelist};
//!
//! let whitelist = Whitelist::new().with_rule(
//!     "inventory is public",
//!     message_has_key("validation.request.security.missing")
//!         .and(path_contains("/store/inventory"))
//!         .and(method_is(Method::Get)),
//! );
//! assert_eq!(whitelist.len(), 1);
//! ```

mod rules;

pub use rules::{
    all_of, any_of, api_path_is, header_contains, header_matches, is_entity, is_request,
    is_response, message_contains, message_has_key, method_is, operation_id_is, path_contains,
    path_matches, response_status_is, Predicate, WhitelistRule,
};

use crate::model::{Request, Response};
use crate::report::{Level, MessageContext, ValidationReport};

/// An ordered list of named rules.
#[derive(Debug, Clone, Default)]
pub struct Whitelist {
    rules: Vec<(String, WhitelistRule)>,
}

impl Whitelist {
    /// An empty whitelist; leaves every report unchanged.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule. Rules are tried in registration order.
    pub fn with_rule(mut self, name: impl Into<String>, rule: WhitelistRule) -> Self {
        self.rules.push((name.into(), rule));
        self
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no rules are registered.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The registered rules with their names.
    pub fn rules(&self) -> impl Iterator<Item = (&str, &WhitelistRule)> {
        self.rules.iter().map(|(name, rule)| (name.as_str(), rule))
    }

    /// Demotes every message matched by a rule to `IGNORE`.
    ///
    /// The first matching rule wins and its name is recorded on the message.
    pub fn apply(
        &self,
        report: ValidationReport,
        request: Option<&Request>,
        response: Option<&Response>,
    ) -> ValidationReport {
        if self.rules.is_empty() {
            return report;
        }
        report.map_messages(|message| {
            let operation = message.context().and_then(|c| c.api_operation());
            let matched = self
                .rules
                .iter()
                .find(|(_, rule)| rule.matches(&message, operation, request, response));
            match matched {
                Some((name, _)) => message.with_level(Level::Ignore).with_context(
                    MessageContext::default().with_applied_whitelist_rule(name.as_str()),
                ),
                None => message,
            }
        })
    }
}
