//! Base path derivation from the `servers` block.

use crate::contract::shims::ShimServer;
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

static VARIABLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}]*)\}").expect("valid server variable pattern"));

/// The base path requests are served under.
///
/// Uses the first server: `{variables}` are replaced by their defaults (an
/// undeclared variable becomes an empty string) and only the URL path is kept.
/// Relative or malformed URLs are used verbatim. No server, or a server with
/// no URL, means `/`.
pub(crate) fn base_path(servers: &[ShimServer]) -> String {
    let Some(server) = servers.first() else {
        return "/".to_string();
    };
    let Some(url) = server.url.as_deref() else {
        return "/".to_string();
    };

    let substituted = VARIABLE_RE.replace_all(url, |caps: &regex::Captures<'_>| {
        server
            .variables
            .get(&caps[1])
            .and_then(|v| v.default.clone())
            .unwrap_or_default()
    });

    let path = match Url::parse(&substituted) {
        Ok(parsed) if !parsed.cannot_be_a_base() => parsed.path().to_string(),
        _ => substituted.into_owned(),
    };

    normalize_base_path(&path)
}

/// Ensures a leading `/` and drops a trailing `/` unless the path is root.
pub(crate) fn normalize_base_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".to_string();
    }
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}
