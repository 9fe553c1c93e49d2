//! Task data model shared across the pipeline
//!
//! `ExtractedTask` is the record that flows through the whole system: created
//! by response parsing, mutated by enrichment and the constraint engine, and
//! consumed read-only by the publisher.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Task priority levels, P1 (urgent) through P4 (low).
///
/// The wire form is the string "P1".."P4". Unknown strings deserialize to the
/// default (P3) rather than failing the whole task record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Priority {
    /// Urgent. Never survives validation; the constraint engine downgrades it.
    #[serde(rename = "P1")]
    P1,
    /// High
    #[serde(rename = "P2")]
    P2,
    /// Normal
    #[default]
    #[serde(rename = "P3")]
    P3,
    /// Low
    #[serde(rename = "P4")]
    P4,
}

impl Priority {
    /// Map to the Todoist numeric scale (4 = urgent .. 1 = normal).
    ///
    /// Total over all variants: P1 should not reach the publisher after
    /// validation, but the mapping still covers it.
    pub fn to_remote(self) -> u8 {
        match self {
            Priority::P1 => 4,
            Priority::P2 => 3,
            Priority::P3 => 2,
            Priority::P4 => 1,
        }
    }

    /// Parse from the wire string, falling back to P3 for unknown values.
    pub fn parse_or_default(s: &str) -> Self {
        match s {
            "P1" => Priority::P1,
            "P2" => Priority::P2,
            "P3" => Priority::P3,
            "P4" => Priority::P4,
            _ => Priority::default(),
        }
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Priority::parse_or_default(&s))
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::P1 => write!(f, "P1"),
            Priority::P2 => write!(f, "P2"),
            Priority::P3 => write!(f, "P3"),
            Priority::P4 => write!(f, "P4"),
        }
    }
}

/// A task extracted from free-form text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractedTask {
    /// Actionable task description
    pub content: String,

    /// Project category label, if the model assigned one
    #[serde(default)]
    pub project: Option<String>,

    /// Priority level (defaults to P3)
    #[serde(default)]
    pub priority: Priority,

    /// Free-text relative due date ("today", "this week", ...)
    #[serde(default)]
    pub due_date: Option<String>,

    /// Context notes; enrichment appends to this
    #[serde(default)]
    pub context: Option<String>,

    /// Model-reported certainty in [0, 1]; the admission-control threshold
    #[serde(default)]
    pub confidence: f64,

    /// Whether the task needs human approval before publishing
    #[serde(default)]
    pub requires_confirmation: bool,

    /// Why the task was flagged (set whenever `requires_confirmation` is)
    #[serde(default)]
    pub confirmation_reason: Option<String>,
}

impl ExtractedTask {
    /// Create a task with just content, everything else defaulted.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            project: None,
            priority: Priority::default(),
            due_date: None,
            context: None,
            confidence: 0.0,
            requires_confirmation: false,
            confirmation_reason: None,
        }
    }
}
