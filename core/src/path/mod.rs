//! # Path Matching
//!
//! Maps a raw request path and method onto the operation declared for it.
//!
//! Matching is case-insensitive on literal parts. When several templates fit,
//! an exact template wins, then the most specific one (longest template with
//! placeholders collapsed), then the first in document order.

mod api_path;
mod resolver;

pub use api_path::{ApiPath, NormalisedPath};
pub use resolver::{ApiOperation, OperationMatch, OperationResolver};
