//! # Error Handling
//!
//! Provides the unified `AppError` enum used for construction-time failures.
//!
//! Contract violations found while validating an interaction are never errors:
//! they are reported as `Message`s inside a `ValidationReport`. `AppError` is
//! reserved for problems with the contract or configuration themselves.

use derive_more::{Display, From};

/// The Global Error Enum.
///
/// We use `derive_more` for boilerplate.
/// Note: String errors default to `General`.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// Wrapper for standard IO errors.
    #[display("IO Error: {_0}")]
    Io(std::io::Error),

    /// Invalid regular expression in a path template or whitelist rule.
    #[display("Regex Error: {_0}")]
    Regex(regex::Error),

    /// The contract document could not be parsed or is structurally unusable.
    #[from(ignore)]
    #[display("Contract Error: {_0}")]
    Contract(String),

    /// Invalid validator configuration (levels, rules, options).
    #[from(ignore)]
    #[display("Configuration Error: {_0}")]
    Config(String),

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;
