// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for the rules engine.

use thiserror::Error;

/// Errors raised by rule evaluation and catalog loading.
///
/// None of these are retryable. Callers treat them as programming or
/// configuration defects, log them, and fall back to a safe default.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Malformed or unrecognized input, such as an unknown sentiment label.
    #[error("validation error: {0}")]
    Validation(String),

    /// Malformed static configuration or catalog.
    #[error("configuration error: {0}")]
    Config(String),

    /// A referenced ability, quest or user is absent.
    #[error("not found: {0}")]
    NotFound(String),
}

impl EngineError {
    /// Shorthand for a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Shorthand for a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Shorthand for a not-found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        Self::Config(format!("invalid JSON: {e}"))
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
