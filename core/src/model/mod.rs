#![deny(missing_docs)]

//! # Interaction Model
//!
//! Framework-neutral representations of the HTTP exchange being validated.
//! Adapters convert their native request/response objects into these types.
//!
//! - **method**: HTTP verbs an OpenAPI path item can declare.
//! - **headers**: case-insensitive multi-valued header map.
//! - **body**: raw payload, parsed on demand.
//! - **request** / **response**: the two sides of an interaction.

pub mod body;
pub mod headers;
pub mod method;
pub mod request;
pub mod response;

pub use body::Body;
pub use headers::Headers;
pub use method::Method;
pub use request::{Request, RequestBuilder};
pub use response::{Response, ResponseBuilder};
