//! Constraint and confirmation engine
//!
//! Pure post-processing over extracted tasks: a hard priority ceiling and a
//! set of keyword-triggered confirmation rules. No I/O, no model calls; the
//! same input always produces the same output.

use sdk::types::{ExtractedTask, Priority};
use serde::{Deserialize, Serialize};

/// Keywords suggesting a task is a multi-hour effort
const LONG_TASK_KEYWORDS: &[&str] = &[
    "project",
    "complete",
    "finish",
    "implement",
    "build",
    "create system",
    "redesign",
    "overhaul",
    "research extensively",
    "deep dive",
];

/// Keywords suggesting financial impact
const FINANCIAL_KEYWORDS: &[&str] = &[
    "buy",
    "purchase",
    "pay",
    "invoice",
    "bill",
    "cost",
    "price",
    "budget",
    "expense",
    "money",
    "$",
    "invest",
    "subscribe",
];

/// Keywords suggesting the family schedule is affected
const FAMILY_KEYWORDS: &[&str] = &[
    "family",
    "wife",
    "husband",
    "kids",
    "children",
    "school",
    "vacation",
    "weekend",
    "evening",
    "dinner",
    "appointment",
];

/// A confirmation rule the constraint engine can apply
///
/// Closed set; config refers to these by their snake_case names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfirmationRule {
    #[serde(rename = "tasks_over_4_hours")]
    TasksOver4Hours,
    #[serde(rename = "tasks_with_financial_impact")]
    TasksWithFinancialImpact,
    #[serde(rename = "tasks_affecting_family_schedule")]
    TasksAffectingFamilySchedule,
}

impl ConfirmationRule {
    fn keywords(&self) -> &'static [&'static str] {
        match self {
            ConfirmationRule::TasksOver4Hours => LONG_TASK_KEYWORDS,
            ConfirmationRule::TasksWithFinancialImpact => FINANCIAL_KEYWORDS,
            ConfirmationRule::TasksAffectingFamilySchedule => FAMILY_KEYWORDS,
        }
    }

    fn reason(&self) -> &'static str {
        match self {
            ConfirmationRule::TasksOver4Hours => "Task appears to take over 4 hours",
            ConfirmationRule::TasksWithFinancialImpact => "Task has potential financial impact",
            ConfirmationRule::TasksAffectingFamilySchedule => "Task affects family schedule",
        }
    }

    fn matches(&self, content_lower: &str) -> bool {
        self.keywords().iter().any(|kw| content_lower.contains(kw))
    }
}

/// Reason attached when a P1 task is clamped down to P2
pub const P1_CLAMP_REASON: &str = "Priority downgraded from P1 to P2 (agent constraint)";

/// Fallback reason for tasks the model flagged without saying why
const MODEL_FLAGGED_REASON: &str = "Flagged by extraction model";

/// Apply the priority ceiling and confirmation rules to one task.
///
/// P1 is never allowed through: it is clamped to P2 and flagged. Rules are
/// checked in the order given; when several match, the last match's reason
/// wins. A task the model already flagged keeps its flag, and gets a generic
/// reason if it arrived without one.
pub fn apply_constraints(task: &mut ExtractedTask, rules: &[ConfirmationRule]) {
    if task.priority == Priority::P1 {
        task.priority = Priority::P2;
        task.requires_confirmation = true;
        task.confirmation_reason = Some(P1_CLAMP_REASON.to_string());
        tracing::debug!("Clamped P1 task to P2: {}", task.content);
    }

    let content_lower = task.content.to_lowercase();
    for rule in rules {
        if rule.matches(&content_lower) {
            task.requires_confirmation = true;
            task.confirmation_reason = Some(rule.reason().to_string());
        }
    }

    if task.requires_confirmation && task.confirmation_reason.is_none() {
        task.confirmation_reason = Some(MODEL_FLAGGED_REASON.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_rules() -> Vec<ConfirmationRule> {
        vec![
            ConfirmationRule::TasksOver4Hours,
            ConfirmationRule::TasksWithFinancialImpact,
            ConfirmationRule::TasksAffectingFamilySchedule,
        ]
    }

    #[test]
    fn test_p1_clamped_to_p2_and_flagged() {
        let mut task = ExtractedTask::new("urgent: reply to legal notice");
        task.priority = Priority::P1;

        apply_constraints(&mut task, &all_rules());

        assert_eq!(task.priority, Priority::P2);
        assert!(task.requires_confirmation);
        assert_eq!(task.confirmation_reason.as_deref(), Some(P1_CLAMP_REASON));
    }

    #[test]
    fn test_benign_task_untouched() {
        let mut task = ExtractedTask::new("water the plants");
        task.priority = Priority::P3;

        apply_constraints(&mut task, &all_rules());

        assert_eq!(task.priority, Priority::P3);
        assert!(!task.requires_confirmation);
        assert!(task.confirmation_reason.is_none());
    }

    #[test]
    fn test_family_keyword_flags_task() {
        // "Schedule dentist appointment" trips the family-schedule rule
        let mut task = ExtractedTask::new("Schedule dentist appointment");

        apply_constraints(&mut task, &all_rules());

        assert!(task.requires_confirmation);
        assert_eq!(
            task.confirmation_reason.as_deref(),
            Some("Task affects family schedule")
        );
    }

    #[test]
    fn test_financial_keyword_case_insensitive() {
        let mut task = ExtractedTask::new("PAY the electricity provider");

        apply_constraints(&mut task, &all_rules());

        assert!(task.requires_confirmation);
        assert_eq!(
            task.confirmation_reason.as_deref(),
            Some("Task has potential financial impact")
        );
    }

    #[test]
    fn test_overlapping_rules_last_reason_wins() {
        // Matches long-task ("project"), financial ("budget") and family
        // ("family") rules; the last rule in the list supplies the reason.
        let mut task = ExtractedTask::new("complete the family budget project");

        apply_constraints(&mut task, &all_rules());

        assert!(task.requires_confirmation);
        assert_eq!(
            task.confirmation_reason.as_deref(),
            Some("Task affects family schedule")
        );
    }

    #[test]
    fn test_rule_order_controls_winning_reason() {
        let mut task = ExtractedTask::new("complete the family budget project");
        let reordered = vec![
            ConfirmationRule::TasksAffectingFamilySchedule,
            ConfirmationRule::TasksOver4Hours,
        ];

        apply_constraints(&mut task, &reordered);

        assert_eq!(
            task.confirmation_reason.as_deref(),
            Some("Task appears to take over 4 hours")
        );
    }

    #[test]
    fn test_rule_reason_overwrites_clamp_reason() {
        let mut task = ExtractedTask::new("pay the contractor invoice");
        task.priority = Priority::P1;

        apply_constraints(&mut task, &all_rules());

        assert_eq!(task.priority, Priority::P2);
        assert_eq!(
            task.confirmation_reason.as_deref(),
            Some("Task has potential financial impact")
        );
    }

    #[test]
    fn test_model_flagged_without_reason_gets_fallback() {
        let mut task = ExtractedTask::new("follow up with Sam");
        task.requires_confirmation = true;

        apply_constraints(&mut task, &all_rules());

        assert_eq!(
            task.confirmation_reason.as_deref(),
            Some("Flagged by extraction model")
        );
    }

    #[test]
    fn test_model_provided_reason_preserved_when_no_rule_matches() {
        let mut task = ExtractedTask::new("follow up with Sam");
        task.requires_confirmation = true;
        task.confirmation_reason = Some("Ambiguous ownership".to_string());

        apply_constraints(&mut task, &all_rules());

        assert_eq!(
            task.confirmation_reason.as_deref(),
            Some("Ambiguous ownership")
        );
    }

    #[test]
    fn test_rule_serde_snake_case_names() {
        let rule: ConfirmationRule = serde_json::from_str("\"tasks_over_4_hours\"").unwrap();
        assert_eq!(rule, ConfirmationRule::TasksOver4Hours);

        let json = serde_json::to_string(&ConfirmationRule::TasksAffectingFamilySchedule).unwrap();
        assert_eq!(json, "\"tasks_affecting_family_schedule\"");
    }
}
