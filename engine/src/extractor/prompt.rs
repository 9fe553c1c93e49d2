//! Prompt construction for the extraction call
//!
//! The system prompt carries the caller's current context (active projects
//! scraped from the context document, allowed categories) plus the fixed
//! extraction rules and response schema. The user prompt carries the raw
//! text and its source label.

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// Most project headings embedded in the prompt
const MAX_ACTIVE_PROJECTS: usize = 5;

fn heading_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?m)^### (.+)$").expect("Invalid heading pattern"))
}

/// Scrape active project names from the context document.
///
/// Level-3 markdown headings name the projects; only the first few count.
/// A missing or unreadable document yields no projects, not an error.
pub fn active_projects(context_file: &Path) -> Vec<String> {
    let contents = match std::fs::read_to_string(context_file) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::debug!("Context document not loaded ({}): {:?}", e, context_file);
            return Vec::new();
        }
    };

    heading_pattern()
        .captures_iter(&contents)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .take(MAX_ACTIVE_PROJECTS)
        .collect()
}

/// Build the system prompt from the active projects and allowed categories.
pub fn build_system_prompt(active_projects: &[String], allowed_projects: &[String]) -> String {
    let projects = if active_projects.is_empty() {
        "None specified".to_string()
    } else {
        active_projects.join(", ")
    };
    let allowed = if allowed_projects.is_empty() {
        "Work, Personal, Learning".to_string()
    } else {
        allowed_projects.join(", ")
    };

    format!(
        r#"You are a task extraction agent. Your job is to identify actionable tasks from text.

CURRENT CONTEXT:
- Active Projects: {projects}
- Allowed Project Categories: {allowed}

EXTRACTION RULES:
1. Only extract clearly actionable items (verbs like: call, email, write, research, book, schedule, etc.)
2. Ignore vague thoughts, reflections, or general notes
3. Each task should be specific and achievable
4. Assign appropriate project category from allowed list
5. Set priority levels: P1 (urgent), P2 (high), P3 (normal), P4 (low)

CONSTRAINTS:
- Maximum priority assignable: P2 (cannot create P1 without confirmation)
- Flag tasks over 4 hours for confirmation
- Flag tasks with financial impact for confirmation
- Flag tasks affecting family schedule for confirmation

RESPONSE FORMAT:
Return a JSON array of tasks with this structure:
[
  {{
    "content": "Clear, actionable task description",
    "project": "Project category from allowed list",
    "priority": "P2|P3|P4",
    "due_date": "relative date if mentioned (e.g., 'today', 'tomorrow', 'this week')",
    "context": "Brief context or notes",
    "confidence": 0.9,
    "requires_confirmation": false,
    "confirmation_reason": null
  }}
]

Be conservative - it's better to miss a vague item than create unclear tasks."#
    )
}

/// Build the user prompt carrying the raw text and its source label.
pub fn build_user_prompt(text: &str, source: &str) -> String {
    format!(
        r#"Please extract actionable tasks from the following text:

SOURCE: {source}
TEXT:
{text}

Extract only clear, actionable items that can be completed. Ignore general thoughts, reflections, or vague ideas. Focus on specific actions with verbs like: call, email, write, research, book, schedule, buy, fix, etc.

Return the tasks as a JSON array following the specified format."#
    )
}
