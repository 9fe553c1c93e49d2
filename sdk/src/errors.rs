//! Error types and handling
//!
//! This module provides the error types used throughout the Daybook engine.
//! All errors implement the `DaybookErrorExt` trait which provides user-friendly
//! hints and indicates whether errors are recoverable.
//!
//! Error messages are safe to display to end users: they never embed API keys
//! or bearer tokens, only the names of the environment variables that carry them.

use thiserror::Error;

/// Trait for Daybook error extensions
///
/// This trait provides additional context for errors, including user-friendly
/// hints and recoverability information. All engine errors implement this trait.
pub trait DaybookErrorExt {
    /// Returns a user-friendly hint for the error
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors can be retried or worked around. Non-recoverable
    /// errors typically require fixing the environment or configuration first.
    fn is_recoverable(&self) -> bool;
}

/// Main engine error type
///
/// # Error Categories
///
/// - **Configuration**: Invalid or missing configuration
/// - **Credentials**: Attempting a remote call without the required token.
///   This is a usage error, not a runtime condition to recover from; callers
///   are expected to check availability before publishing.
/// - **LLM**: Model provider failures that escaped the never-fails call surface
/// - **Remote**: Task-service failures
///
/// # Examples
///
/// ```
/// use sdk::errors::{DaybookErrorExt, EngineError};
///
/// let error = EngineError::MissingCredential("TODOIST_API_TOKEN");
/// println!("Hint: {}", error.user_hint());
/// assert!(!error.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Path canonicalization failed for {0:?}: {1}")]
    PathCanonicalization(std::path::PathBuf, String),

    // Credential errors
    #[error("Missing credential: {0} is not set")]
    MissingCredential(&'static str),

    // LLM provider errors
    #[error("LLM provider error: {0}")]
    Llm(String),

    // Remote task service errors
    #[error("Remote task service error: {0}")]
    Remote(String),

    // Memory search errors
    #[error("Memory search error: {0}")]
    Memory(String),

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DaybookErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Config(_) => "Check your config.toml file for errors",
            Self::PathCanonicalization(_, _) => "Invalid path specified",
            Self::MissingCredential(_) => {
                "Set the named environment variable before publishing tasks"
            }
            Self::Llm(_) => "LLM provider unavailable. Check your API keys and network",
            Self::Remote(_) => "Task service unavailable. Check TODOIST_API_TOKEN and network",
            Self::Memory(_) => "Memory archive could not be searched. Check the archive file",
            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            // The environment has to change before these can succeed.
            Self::MissingCredential(_) | Self::PathCanonicalization(_, _) => false,

            // All other errors are potentially recoverable
            _ => true,
        }
    }
}
