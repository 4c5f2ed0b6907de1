//! Error types for the conformance runner

use thiserror::Error;

/// Harness-level failures.
///
/// Contract violations found on the system under test are not errors of this
/// type; they are collected as [`crate::oracle::Violation`]s and reported.
/// `E2eError` covers the harness itself: a broken model, a browser that
/// could not be driven, a suspension point that timed out.
#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Model error: {0}")]
    Model(#[from] wizcheck_common::ModelError),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Browser support not compiled in (enable the `chromium` feature)")]
    BrowserUnavailable,

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Element not interactable: {target} - {reason}")]
    NotInteractable { target: String, reason: String },

    #[error("Timeout after {timeout_ms} ms waiting for: {what}")]
    Timeout { what: String, timeout_ms: u64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlWrite(#[from] toml::ser::Error),
}

#[cfg(feature = "chromium")]
impl From<chromiumoxide::error::CdpError> for E2eError {
    fn from(e: chromiumoxide::error::CdpError) -> Self {
        E2eError::Browser(e.to_string())
    }
}

pub type E2eResult<T> = Result<T, E2eError>;
