//! Todoist REST v2 client
//!
//! Thin authenticated wrapper over the task service. Catalog reads (projects,
//! sections) degrade to empty lists on failure so a publish cycle can report
//! per-task outcomes instead of aborting; task creation reports its error to
//! the caller.

use crate::config::TodoistConfig;
use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};

/// Environment variable holding the Todoist API token
pub const TODOIST_API_TOKEN_VAR: &str = "TODOIST_API_TOKEN";

/// A project as reported by the remote catalog
#[derive(Debug, Clone, Deserialize)]
pub struct TodoistProject {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub is_shared: bool,
    #[serde(default)]
    pub order: i64,
}

/// A section within a project
#[derive(Debug, Clone, Deserialize)]
pub struct TodoistSection {
    pub id: String,
    pub name: String,
    pub project_id: String,
    #[serde(default)]
    pub order: i64,
}

/// Payload for task creation
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewTask {
    pub content: String,

    /// Remote priority scale, 1 (normal) to 4 (urgent)
    pub priority: u8,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_string: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_datetime: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A created task, as echoed back by the service
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedTask {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub url: String,
}

/// Client for the Todoist REST API
pub struct TodoistClient {
    config: TodoistConfig,
    api_token: String,
    client: reqwest::Client,
}

impl TodoistClient {
    /// Create a client reading the API token from the environment.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::MissingCredential` when the token is not set.
    pub fn new(config: TodoistConfig) -> Result<Self, EngineError> {
        let api_token = std::env::var(TODOIST_API_TOKEN_VAR)
            .map_err(|_| EngineError::MissingCredential(TODOIST_API_TOKEN_VAR))?;
        Ok(Self::with_token(config, api_token))
    }

    /// Create a client with an explicit token.
    pub fn with_token(config: TodoistConfig, api_token: String) -> Self {
        Self {
            config,
            api_token,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.config.base_url, endpoint)
    }

    /// Fetch all projects. Failures are logged and yield an empty catalog.
    pub async fn get_projects(&self) -> Vec<TodoistProject> {
        match self.fetch_list::<TodoistProject>("projects").await {
            Ok(projects) => projects,
            Err(e) => {
                tracing::error!("Failed to get projects: {}", e);
                Vec::new()
            }
        }
    }

    /// Fetch sections, optionally scoped to one project. Failures are logged
    /// and yield an empty list.
    pub async fn get_sections(&self, project_id: Option<&str>) -> Vec<TodoistSection> {
        let endpoint = match project_id {
            Some(id) => format!("sections?project_id={}", id),
            None => "sections".to_string(),
        };
        match self.fetch_list::<TodoistSection>(&endpoint).await {
            Ok(sections) => sections,
            Err(e) => {
                tracing::error!("Failed to get sections: {}", e);
                Vec::new()
            }
        }
    }

    /// Find a section by name within a project, case-insensitively.
    pub async fn find_section_by_name(
        &self,
        section_name: &str,
        project_id: &str,
    ) -> Option<TodoistSection> {
        self.get_sections(Some(project_id))
            .await
            .into_iter()
            .find(|s| s.name.eq_ignore_ascii_case(section_name))
    }

    /// Create one task.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Remote` on network failure or a non-2xx status.
    pub async fn create_task(&self, task: &NewTask) -> Result<CreatedTask, EngineError> {
        let response = self
            .client
            .post(self.url("tasks"))
            .header("Authorization", format!("Bearer {}", self.api_token))
            .header("Content-Type", "application/json")
            .json(task)
            .send()
            .await
            .map_err(|e| EngineError::Remote(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(EngineError::Remote(format!(
                "task creation returned {}: {}",
                status, text
            )));
        }

        let created: CreatedTask = response
            .json()
            .await
            .map_err(|e| EngineError::Remote(format!("invalid task creation response: {}", e)))?;

        tracing::info!("Created task: {} (ID: {})", created.content, created.id);
        Ok(created)
    }

    async fn fetch_list<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
    ) -> Result<Vec<T>, EngineError> {
        let response = self
            .client
            .get(self.url(endpoint))
            .header("Authorization", format!("Bearer {}", self.api_token))
            .send()
            .await
            .map_err(|e| EngineError::Remote(e.to_string()))?;

        if !response.status().is_success() {
            return Err(EngineError::Remote(format!(
                "{} returned {}",
                endpoint,
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| EngineError::Remote(format!("invalid {} response: {}", endpoint, e)))
    }
}
