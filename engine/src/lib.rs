//! Daybook Engine Library
//!
//! This library provides the core functionality of the Daybook engine:
//! turning unstructured morning pages into validated, publishable tasks.
//! It is used by both the main binary and integration tests.

/// Configuration management module
pub mod config;

/// Model client and provider abstraction layer
pub mod llm;

/// Archive-backed memory search implementation
pub mod memory;

/// Task extraction pipeline
pub mod extractor;

/// Todoist REST client
pub mod todoist;

/// Task publisher module
pub mod publisher;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
