//! Path templates and normalised request paths.

use crate::error::AppResult;
use percent_encoding::percent_decode_str;
use regex::Regex;
use std::fmt;

/// One `/`-separated part of a path template.
#[derive(Debug, Clone)]
pub(crate) enum PathPart {
    /// Fixed text, stored lowercased.
    Literal(String),
    /// A whole-part placeholder (`{id}`).
    Param(String),
    /// Literal text mixed with placeholders (`{id}.json`).
    Composite {
        pattern: Regex,
        names: Vec<String>,
    },
}

impl PathPart {
    fn parse(raw: &str) -> AppResult<Self> {
        if let Some(name) = whole_param(raw) {
            return Ok(PathPart::Param(name.to_string()));
        }
        if !raw.contains('{') {
            return Ok(PathPart::Literal(raw.to_lowercase()));
        }

        let mut pattern = String::from("(?i)^");
        let mut names = Vec::new();
        let mut rest = raw;
        while let Some(open) = rest.find('{') {
            let Some(close) = rest[open..].find('}').map(|c| open + c) else {
                break;
            };
            pattern.push_str(&regex::escape(&rest[..open]));
            pattern.push_str("(.+?)");
            names.push(rest[open + 1..close].to_string());
            rest = &rest[close + 1..];
        }
        pattern.push_str(&regex::escape(rest));
        pattern.push('$');

        Ok(PathPart::Composite {
            pattern: Regex::new(&pattern)?,
            names,
        })
    }

    fn matches(&self, part: &str) -> bool {
        match self {
            PathPart::Literal(text) => *text == part.to_lowercase(),
            PathPart::Param(_) => !part.is_empty(),
            PathPart::Composite { pattern, .. } => pattern.is_match(part),
        }
    }
}

fn whole_param(raw: &str) -> Option<&str> {
    let inner = raw.strip_prefix('{')?.strip_suffix('}')?;
    if inner.is_empty() || inner.contains(['{', '}']) {
        None
    } else {
        Some(inner)
    }
}

/// Splits a path into parts. The root path has no parts; a trailing slash
/// yields an empty last part only in strict mode.
pub(crate) fn split_parts(path: &str, strict: bool) -> Vec<&str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    if trimmed.is_empty() {
        return Vec::new();
    }
    let mut parts: Vec<&str> = trimmed.split('/').collect();
    if !strict && parts.len() > 1 && parts.last() == Some(&"") {
        parts.pop();
    }
    parts
}

/// A declared path template (`/pets/{id}`).
#[derive(Debug, Clone)]
pub struct ApiPath {
    original: String,
    normalised: String,
    parts: Vec<PathPart>,
    specificity: usize,
}

impl ApiPath {
    /// Parses a template. Fails only if a composite part yields an invalid pattern.
    pub fn new(template: &str, strict: bool) -> AppResult<Self> {
        let parts = split_parts(template, strict)
            .into_iter()
            .map(PathPart::parse)
            .collect::<AppResult<Vec<_>>>()?;

        let normalised = if strict || template.len() <= 1 {
            template.to_lowercase()
        } else {
            template.trim_end_matches('/').to_lowercase()
        };

        Ok(Self {
            original: template.to_string(),
            normalised,
            specificity: specificity(template),
            parts,
        })
    }

    /// The template as written in the contract (operation table key).
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Lowercased template.
    pub fn normalised(&self) -> &str {
        &self.normalised
    }

    /// Number of parts, used to bucket templates.
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Template length with every `{param}` counted as one character.
    pub fn specificity(&self) -> usize {
        self.specificity
    }

    /// Whether every part of `path` is accepted by the corresponding template part.
    pub fn matches(&self, path: &NormalisedPath) -> bool {
        self.parts.len() == path.parts.len()
            && self
                .parts
                .iter()
                .zip(&path.parts)
                .all(|(template, actual)| template.matches(actual))
    }

    /// Whether `path` is literally this template, ignoring case.
    pub fn is_exact(&self, path: &NormalisedPath) -> bool {
        self.normalised == path.normalised
    }

    /// Percent-decoded placeholder values taken from a matching `path`.
    pub fn extract_params(&self, path: &NormalisedPath) -> Vec<(String, String)> {
        let mut out = Vec::new();
        for (template, actual) in self.parts.iter().zip(&path.parts) {
            match template {
                PathPart::Param(name) => out.push((name.clone(), decode(actual))),
                PathPart::Composite { pattern, names } => {
                    if let Some(caps) = pattern.captures(actual) {
                        for (idx, name) in names.iter().enumerate() {
                            if let Some(m) = caps.get(idx + 1) {
                                out.push((name.clone(), decode(m.as_str())));
                            }
                        }
                    }
                }
                PathPart::Literal(_) => {}
            }
        }
        out
    }
}

impl fmt::Display for ApiPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

fn specificity(template: &str) -> usize {
    let mut length = 0;
    let mut in_param = false;
    for c in template.chars() {
        match c {
            '{' if !in_param => {
                in_param = true;
                length += 1;
            }
            '}' if in_param => in_param = false,
            _ if in_param => {}
            _ => length += 1,
        }
    }
    length
}

fn decode(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

/// An incoming request path with the query string and base path removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalisedPath {
    raw: String,
    original: String,
    normalised: String,
    parts: Vec<String>,
}

impl NormalisedPath {
    /// Normalises `raw` against `base_path`.
    ///
    /// Returns `None` when the path does not live under the base path; the base
    /// path only matches whole segments (`/api` does not prefix `/apix`).
    pub fn new(raw: &str, base_path: &str, strict: bool) -> Option<Self> {
        let without_query = raw.split(['?', '#']).next().unwrap_or_default();
        let relative = strip_base_path(without_query, base_path)?;
        let relative = if relative.starts_with('/') {
            relative.to_string()
        } else {
            format!("/{}", relative)
        };

        let parts = split_parts(&relative, strict)
            .into_iter()
            .map(str::to_string)
            .collect();
        let normalised = if strict {
            relative.to_lowercase()
        } else {
            let trimmed = relative.trim_end_matches('/');
            if trimmed.is_empty() {
                "/".to_string()
            } else {
                trimmed.to_lowercase()
            }
        };

        Some(Self {
            raw: without_query.to_string(),
            original: relative,
            normalised,
            parts,
        })
    }

    /// The request path as sent, without the query string.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The path relative to the base path.
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Raw parts.
    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// Number of parts.
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }
}

fn strip_base_path<'a>(path: &'a str, base_path: &str) -> Option<&'a str> {
    let base = base_path.trim_end_matches('/');
    if base.is_empty() {
        return Some(path);
    }
    let head = path.get(..base.len())?;
    if !head.eq_ignore_ascii_case(base) {
        return None;
    }
    let rest = &path[base.len()..];
    if rest.is_empty() || rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}
