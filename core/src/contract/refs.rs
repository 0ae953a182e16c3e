#![deny(missing_docs)]

//! # Reference Utilities
//!
//! Helpers for resolving local `$ref` targets (`#/components/{section}/{name}`).
//!
//! External documents are never fetched. A reference that does not point into
//! the current document's components fails contract loading.

use crate::error::{AppError, AppResult};
use indexmap::IndexMap;
use percent_encoding::percent_decode_str;
use utoipa::openapi::RefOr;

/// Upper bound on `$ref -> $ref` chains before a reference is considered cyclic.
const MAX_REF_DEPTH: usize = 32;

/// Extracts a component name from a `$ref` if it points to `#/components/{section}/{name}`.
///
/// Returns `None` if the reference is not local or targets another section.
pub(crate) fn extract_component_name(ref_str: &str, section: &str) -> Option<String> {
    let pointer = ref_str.strip_prefix("#/")?;
    let segments: Vec<&str> = pointer.split('/').collect();

    if segments.len() != 3 {
        return None;
    }
    if segments[0] != "components" || segments[1] != section {
        return None;
    }

    let name = decode_pointer_segment(segments[2]);
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Decodes a JSON Pointer segment (handles `~1` and `~0`).
pub(crate) fn decode_pointer_segment(segment: &str) -> String {
    let decoded = segment.replace("~1", "/").replace("~0", "~");
    percent_decode_str(&decoded)
        .decode_utf8_lossy()
        .into_owned()
}

/// Follows a `RefOr` through `components.{section}` until an inline value is found.
pub(crate) fn resolve_component<'a, T>(
    item: &'a RefOr<T>,
    components: &'a IndexMap<String, RefOr<T>>,
    section: &str,
) -> AppResult<&'a T> {
    let mut current = item;
    for _ in 0..MAX_REF_DEPTH {
        match current {
            RefOr::T(value) => return Ok(value),
            RefOr::Ref(r) => {
                let name = extract_component_name(&r.ref_location, section).ok_or_else(|| {
                    AppError::Contract(format!(
                        "Unsupported reference '{}' (expected #/components/{}/...)",
                        r.ref_location, section
                    ))
                })?;
                current = components.get(&name).ok_or_else(|| {
                    AppError::Contract(format!("Unresolved reference '{}'", r.ref_location))
                })?;
            }
        }
    }
    Err(AppError::Contract(format!(
        "Reference chain in components.{} exceeds {} levels",
        section, MAX_REF_DEPTH
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use utoipa::openapi::Ref;

    #[test]
    fn test_extract_component_name_success() {
        let name = extract_component_name("#/components/parameters/Limit", "parameters").unwrap();
        assert_eq!(name, "Limit");
    }

    #[test]
    fn test_extract_component_name_wrong_section() {
        let name = extract_component_name("#/components/responses/Limit", "parameters");
        assert!(name.is_none());
    }

    #[test]
    fn test_extract_component_name_external_ref() {
        let external = "other.yaml#/components/schemas/Pet";
        assert!(extract_component_name(external, "schemas").is_none());
    }

    #[test]
    fn test_decode_pointer_segment_percent_encoding() {
        let decoded = decode_pointer_segment("User%20Profile~1details");
        assert_eq!(decoded, "User Profile/details");
    }

    #[test]
    fn test_resolve_component_follows_chain() {
        let mut components: IndexMap<String, RefOr<u32>> = IndexMap::new();
        components.insert("A".into(), RefOr::Ref(Ref::new("#/components/headers/B")));
        components.insert("B".into(), RefOr::T(7));

        let start = RefOr::Ref(Ref::new("#/components/headers/A"));
        assert_eq!(
            *resolve_component(&start, &components, "headers").unwrap(),
            7
        );
    }

    #[test]
    fn test_resolve_component_dangling_and_cyclic() {
        let mut components: IndexMap<String, RefOr<u32>> = IndexMap::new();
        let cycle = RefOr::Ref(Ref::new("#/components/headers/Loop"));
        components.insert("Loop".into(), cycle);

        let dangling = RefOr::Ref(Ref::new("#/components/headers/Missing"));
        assert!(matches!(
            resolve_component(&dangling, &components, "headers"),
            Err(AppError::Contract(_))
        ));

        let cyclic = RefOr::Ref(Ref::new("#/components/headers/Loop"));
        assert!(resolve_component(&cyclic, &components, "headers").is_err());
    }
}
