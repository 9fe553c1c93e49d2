//! Task publisher
//!
//! Pushes validated tasks to the remote task service. Every input task gets
//! exactly one `PublishResult`, in input order; one task failing never stops
//! the rest. The remote catalog is fetched fresh each cycle, never cached.

use crate::config::TodoistConfig;
use crate::todoist::{NewTask, TodoistClient, TodoistProject};
use sdk::errors::EngineError;
use sdk::types::ExtractedTask;
use serde::Serialize;
use std::time::Duration;

/// Provenance line appended to every published task description
const PROVENANCE: &str = "Extracted from: daybook extractor";

/// Identifier reported for tasks that were only simulated
const SIMULATED_ID: &str = "dry-run-id";

/// Outcome of publishing one task
#[derive(Debug, Clone, Serialize)]
pub struct PublishResult {
    /// Task content, as extracted
    pub content: String,

    /// What happened to it
    pub status: PublishStatus,
}

/// Per-task publish status
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PublishStatus {
    /// Task was created remotely
    Created { id: String, url: String },

    /// Simulate mode: nothing was sent
    Simulated { id: String },

    /// Task was withheld, with the reason it needs confirmation
    Skipped { reason: String },

    /// The remote call failed for this task
    Failed { error: String },
}

/// Publishes extracted tasks to the remote task service
pub struct Publisher {
    client: TodoistClient,
    config: TodoistConfig,
}

impl Publisher {
    pub fn new(client: TodoistClient, config: TodoistConfig) -> Self {
        Self { client, config }
    }

    /// Publish tasks, returning one result per input task in input order.
    ///
    /// Flagged tasks are skipped unless `simulate` is set; in simulate mode
    /// nothing is sent and every task reports `Simulated`.
    pub async fn publish(
        &self,
        tasks: &[ExtractedTask],
        simulate: bool,
    ) -> Result<Vec<PublishResult>, EngineError> {
        if tasks.is_empty() {
            return Ok(Vec::new());
        }

        let projects = self.client.get_projects().await;
        tracing::debug!("Catalog holds {} projects", projects.len());

        let mut results = Vec::with_capacity(tasks.len());
        for task in tasks {
            results.push(self.publish_one(task, &projects, simulate).await);

            // Pacing between creation calls, to stay under remote rate limits
            tokio::time::sleep(Duration::from_millis(self.config.pacing_ms)).await;
        }

        Ok(results)
    }

    async fn publish_one(
        &self,
        task: &ExtractedTask,
        projects: &[TodoistProject],
        simulate: bool,
    ) -> PublishResult {
        if task.requires_confirmation && !simulate {
            let reason = task
                .confirmation_reason
                .clone()
                .unwrap_or_else(|| "requires confirmation".to_string());
            tracing::warn!("Skipping task requiring confirmation: {} ({})", task.content, reason);
            return PublishResult {
                content: task.content.clone(),
                status: PublishStatus::Skipped { reason },
            };
        }

        let mut project_id = None;
        let mut section_id = None;

        if let Some(wanted) = &task.project {
            project_id = resolve_project(wanted, projects).map(|p| p.id.clone());

            match &project_id {
                Some(id) => {
                    match self
                        .client
                        .find_section_by_name(&self.config.default_section, id)
                        .await
                    {
                        Some(section) => section_id = Some(section.id),
                        None => tracing::warn!(
                            "No '{}' section found in project {}",
                            self.config.default_section,
                            wanted
                        ),
                    }
                }
                None => tracing::warn!("No remote project matches '{}'", wanted),
            }
        }

        let new_task = NewTask {
            content: task.content.clone(),
            priority: task.priority.to_remote(),
            project_id,
            section_id,
            due_string: task.due_date.clone(),
            description: Some(describe(task)),
            ..NewTask::default()
        };

        if simulate {
            tracing::info!("[DRY RUN] Would create task: {}", new_task.content);
            return PublishResult {
                content: task.content.clone(),
                status: PublishStatus::Simulated {
                    id: SIMULATED_ID.to_string(),
                },
            };
        }

        match self.client.create_task(&new_task).await {
            Ok(created) => PublishResult {
                content: task.content.clone(),
                status: PublishStatus::Created {
                    id: created.id,
                    url: created.url,
                },
            },
            Err(e) => {
                tracing::error!("Failed to create task '{}': {}", task.content, e);
                PublishResult {
                    content: task.content.clone(),
                    status: PublishStatus::Failed {
                        error: e.to_string(),
                    },
                }
            }
        }
    }
}

/// Resolve a category name against the remote catalog.
///
/// Exact name match first; otherwise the first project (in catalog order)
/// whose name contains the category or is contained by it, case-insensitively.
fn resolve_project<'a>(wanted: &str, projects: &'a [TodoistProject]) -> Option<&'a TodoistProject> {
    if let Some(exact) = projects.iter().find(|p| p.name == wanted) {
        return Some(exact);
    }

    let wanted_lower = wanted.to_lowercase();
    projects.iter().find(|p| {
        let name_lower = p.name.to_lowercase();
        name_lower.contains(&wanted_lower) || wanted_lower.contains(&name_lower)
    })
}

/// Compose the task description from context, provenance, and any flag.
fn describe(task: &ExtractedTask) -> String {
    let mut parts = Vec::new();
    if let Some(context) = &task.context {
        parts.push(format!("Context: {}", context));
    }
    parts.push(PROVENANCE.to_string());
    if task.requires_confirmation {
        parts.push(format!(
            "⚠️ Flagged: {}",
            task.confirmation_reason.as_deref().unwrap_or("unspecified")
        ));
    }
    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdk::types::Priority;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn project(id: &str, name: &str) -> TodoistProject {
        TodoistProject {
            id: id.to_string(),
            name: name.to_string(),
            color: String::new(),
            is_shared: false,
            order: 0,
        }
    }

    fn publisher_for(server: &MockServer) -> Publisher {
        let config = TodoistConfig {
            base_url: server.uri(),
            pacing_ms: 0,
            ..TodoistConfig::default()
        };
        Publisher::new(
            TodoistClient::with_token(config.clone(), "test-token".to_string()),
            config,
        )
    }

    #[test]
    fn test_resolve_project_exact_beats_substring() {
        let projects = vec![project("1", "Work Projects"), project("2", "Work")];
        let resolved = resolve_project("Work", &projects).unwrap();
        assert_eq!(resolved.id, "2");
    }

    #[test]
    fn test_resolve_project_substring_both_directions() {
        let projects = vec![project("1", "Work Projects"), project("2", "Personal")];

        // Category contained in project name
        assert_eq!(resolve_project("work", &projects).unwrap().id, "1");
        // Project name contained in category
        assert_eq!(
            resolve_project("Personal Errands", &projects).unwrap().id,
            "2"
        );
        assert!(resolve_project("Learning", &projects).is_none());
    }

    #[test]
    fn test_description_composition() {
        let mut task = ExtractedTask::new("Pay the invoice");
        task.context = Some("from Tuesday's note".to_string());
        task.requires_confirmation = true;
        task.confirmation_reason = Some("Task has potential financial impact".to_string());

        let description = describe(&task);
        assert_eq!(
            description,
            "Context: from Tuesday's note\nExtracted from: daybook extractor\n⚠️ Flagged: Task has potential financial impact"
        );
    }

    #[tokio::test]
    async fn test_simulate_sends_nothing() {
        // No mocks mounted for POST /tasks: any creation attempt would 404
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/projects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let mut flagged = ExtractedTask::new("Pay the invoice");
        flagged.requires_confirmation = true;
        flagged.confirmation_reason = Some("Task has potential financial impact".to_string());
        let tasks = vec![ExtractedTask::new("Water the plants"), flagged];

        let results = publisher_for(&server).publish(&tasks, true).await.unwrap();
        assert_eq!(results.len(), 2);
        for result in &results {
            assert!(matches!(result.status, PublishStatus::Simulated { .. }));
        }
    }

    #[tokio::test]
    async fn test_flagged_task_skipped_with_reason() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/projects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/tasks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "t-1", "content": "Water the plants", "url": "https://todoist.com/task/t-1"
            })))
            .mount(&server)
            .await;

        let mut flagged = ExtractedTask::new("Pay the invoice");
        flagged.requires_confirmation = true;
        flagged.confirmation_reason = Some("Task has potential financial impact".to_string());
        let tasks = vec![flagged, ExtractedTask::new("Water the plants")];

        let results = publisher_for(&server).publish(&tasks, false).await.unwrap();
        assert!(matches!(
            &results[0].status,
            PublishStatus::Skipped { reason } if reason == "Task has potential financial impact"
        ));
        assert!(matches!(results[1].status, PublishStatus::Created { .. }));
    }

    #[tokio::test]
    async fn test_partial_failure_still_publishes_the_rest() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/projects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;
        // The middle task fails, the other two succeed
        Mock::given(method("POST"))
            .and(path("/tasks"))
            .and(body_partial_json(serde_json::json!({"content": "Task two"})))
            .respond_with(ResponseTemplate::new(500).set_body_string("server error"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/tasks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "t-ok", "content": "ok", "url": "https://todoist.com/task/t-ok"
            })))
            .mount(&server)
            .await;

        let tasks = vec![
            ExtractedTask::new("Task one"),
            ExtractedTask::new("Task two"),
            ExtractedTask::new("Task three"),
        ];

        let results = publisher_for(&server).publish(&tasks, false).await.unwrap();
        assert_eq!(results.len(), 3);
        assert!(matches!(results[0].status, PublishStatus::Created { .. }));
        assert!(matches!(results[1].status, PublishStatus::Failed { .. }));
        assert!(matches!(results[2].status, PublishStatus::Created { .. }));
    }

    #[tokio::test]
    async fn test_project_resolution_and_backlog_section() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/projects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": "p1", "name": "Work Projects", "color": "blue"}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/sections"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": "s1", "name": "Backlog", "project_id": "p1", "order": 1}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/tasks"))
            .and(body_partial_json(serde_json::json!({
                "project_id": "p1",
                "section_id": "s1",
                "priority": 3
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "t-1", "content": "Draft the report", "url": "https://todoist.com/task/t-1"
            })))
            .mount(&server)
            .await;

        let mut task = ExtractedTask::new("Draft the report");
        task.project = Some("work".to_string());
        task.priority = Priority::P2;

        let results = publisher_for(&server).publish(&[task], false).await.unwrap();
        assert!(matches!(
            &results[0].status,
            PublishStatus::Created { id, .. } if id == "t-1"
        ));
    }
}
