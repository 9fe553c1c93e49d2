//! Model-output parsing
//!
//! Models are asked for a JSON array but wrap it in prose, markdown fences,
//! or apologies often enough that parsing has to be defensive. The strategy:
//! cut out the widest `[` .. `]` span and decode it; if decoding fails, fall
//! back to scraping bullet or numbered line items out of the raw text.
//!
//! Finding no array at all is different from finding a broken one: no array
//! means the model refused or returned prose, and scraping that prose for
//! "tasks" would invent work out of narrative. The fallback only runs when an
//! array was found but would not decode.

use regex::Regex;
use sdk::types::{ExtractedTask, Priority};
use std::sync::OnceLock;

/// Ceiling on tasks recovered by the line-item fallback
const FALLBACK_MAX_TASKS: usize = 10;

/// Line items shorter than this (trimmed) are noise, not tasks
const FALLBACK_MIN_LEN: usize = 10;

/// Confidence assigned to fallback-recovered tasks
const FALLBACK_CONFIDENCE: f64 = 0.5;

fn array_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Greedy across newlines: first '[' through last ']'
    PATTERN.get_or_init(|| Regex::new(r"(?s)\[.*\]").expect("Invalid array pattern"))
}

fn bullet_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[-•*]\s*(.+)").expect("Invalid bullet pattern"))
}

fn numbered_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d+\.\s*(.+)").expect("Invalid numbered pattern"))
}

/// Parse a model response into tasks.
///
/// Returns an empty vector when no array is present; invokes the line-item
/// fallback only when an array is present but fails to decode.
pub fn parse_model_output(raw: &str) -> Vec<ExtractedTask> {
    let Some(matched) = array_pattern().find(raw) else {
        tracing::debug!("No JSON array in model output, yielding zero tasks");
        return Vec::new();
    };

    match serde_json::from_str::<Vec<ExtractedTask>>(matched.as_str()) {
        Ok(tasks) => tasks,
        Err(e) => {
            tracing::warn!("Model output array failed to decode ({}), using fallback", e);
            fallback_parse(raw)
        }
    }
}

/// Scrape bullet and numbered line items out of free text, in that order.
/// Short items are dropped; results are capped.
fn fallback_parse(raw: &str) -> Vec<ExtractedTask> {
    let mut items: Vec<&str> = Vec::new();
    for pattern in [bullet_pattern(), numbered_pattern()] {
        items.extend(
            pattern
                .captures_iter(raw)
                .filter_map(|c| c.get(1))
                .map(|m| m.as_str()),
        );
    }

    items
        .into_iter()
        .map(str::trim)
        .filter(|item| item.len() > FALLBACK_MIN_LEN)
        .take(FALLBACK_MAX_TASKS)
        .map(|item| {
            let mut task = ExtractedTask::new(item);
            task.priority = Priority::P3;
            task.confidence = FALLBACK_CONFIDENCE;
            task
        })
        .collect()
}
