//! # Content Negotiation
//!
//! Picks the declared media type that best describes an actual `Content-Type`.

use std::fmt;

/// A parsed `type/subtype` pair, lowercased. Parameters are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaType {
    kind: String,
    subtype: String,
}

impl MediaType {
    /// Parses `type/subtype[; params]`. Returns `None` on anything else.
    pub fn parse(raw: &str) -> Option<Self> {
        let essence = raw.split(';').next()?.trim();
        let (kind, subtype) = essence.split_once('/')?;
        if !is_token(kind) || !is_token(subtype) {
            return None;
        }
        Some(Self {
            kind: kind.to_ascii_lowercase(),
            subtype: subtype.to_ascii_lowercase(),
        })
    }

    /// The top-level type (`application`).
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The subtype (`json`, `vnd.api+json`).
    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    /// How well `self` (a declared range) covers `actual`:
    /// 2 for an exact match, 1 for `type/*`, 0 for `*/*`.
    fn score(&self, actual: &MediaType) -> Option<u8> {
        if self.kind == "*" && self.subtype == "*" {
            return Some(0);
        }
        if self.kind != actual.kind {
            return None;
        }
        if self.subtype == "*" {
            return Some(1);
        }
        (self.subtype == actual.subtype).then_some(2)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.subtype)
    }
}

/// RFC 7230 `tchar`.
fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.chars().all(|c| {
            c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c)
        })
}

/// The declared media type that most specifically matches `actual`.
///
/// Exact matches beat `type/*`, which beats `*/*`; equal scores go to the
/// first declaration. Unparsable `actual` values and declarations are skipped.
pub fn most_specific_match<'a, I>(actual: &str, declared: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let actual = MediaType::parse(actual)?;
    let mut best: Option<(u8, &str)> = None;

    for candidate in declared {
        let Some(range) = MediaType::parse(candidate) else {
            continue;
        };
        let Some(score) = range.score(&actual) else {
            continue;
        };
        match best {
            Some((current, _)) if current >= score => {}
            _ => best = Some((score, candidate)),
        }
    }

    best.map(|(_, m)| m.to_string())
}

/// `*/json` or any `*/*+json` type.
pub fn is_json(media_type: &str) -> bool {
    MediaType::parse(media_type)
        .is_some_and(|m| m.subtype == "json" || m.subtype.ends_with("+json"))
}

/// `application/x-www-form-urlencoded`.
pub fn is_form(media_type: &str) -> bool {
    MediaType::parse(media_type)
        .is_some_and(|m| m.kind == "application" && m.subtype == "x-www-form-urlencoded")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ignores_parameters_and_case() {
        let m = MediaType::parse("Application/JSON; charset=utf-8").unwrap();
        assert_eq!(m.to_string(), "application/json");
        assert!(MediaType::parse("json").is_none());
        assert!(MediaType::parse("application/").is_none());
        assert!(MediaType::parse("text/plain extra").is_none());
    }

    #[test]
    fn test_exact_beats_wildcards() {
        let declared = ["*/*", "application/*", "application/json"];
        assert_eq!(
            most_specific_match("application/json", declared).as_deref(),
            Some("application/json")
        );
        assert_eq!(
            most_specific_match("application/xml", declared).as_deref(),
            Some("application/*")
        );
        assert_eq!(
            most_specific_match("text/plain", declared).as_deref(),
            Some("*/*")
        );
    }

    #[test]
    fn test_first_declared_wins_ties() {
        let declared = ["text/*", "TEXT/*"];
        assert_eq!(
            most_specific_match("text/csv", declared).as_deref(),
            Some("text/*")
        );
    }

    #[test]
    fn test_no_match() {
        let unrelated = most_specific_match("text/plain", ["application/json"]);
        assert!(unrelated.is_none());
        assert!(most_specific_match("garbage", ["*/*"]).is_none());
        let undeclared = most_specific_match("text/plain", std::iter::empty());
        assert!(undeclared.is_none());
    }

    #[test]
    fn test_json_and_form_helpers() {
        assert!(is_json("application/json"));
        assert!(is_json("application/problem+json; charset=utf-8"));
        assert!(!is_json("application/xml"));
        assert!(is_form("application/x-www-form-urlencoded"));
        assert!(!is_form("multipart/form-data"));
    }
}
