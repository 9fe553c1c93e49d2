//! Task extraction pipeline
//!
//! Turns a raw morning-pages note into validated tasks in five steps:
//! prompt build, model call, parse, memory enrichment, validation. Memory is
//! an injected capability (`MemorySearch`); an extractor built without one
//! simply skips enrichment.

pub mod constraints;
pub mod parse;
pub mod prompt;

use crate::config::Config;
use crate::llm::ModelClient;
use sdk::memory::MemorySearch;
use sdk::types::ExtractedTask;
use std::sync::Arc;

pub use constraints::{apply_constraints, ConfirmationRule};

/// Memory snippets longer than this are truncated with an ellipsis
const SNIPPET_MAX_CHARS: usize = 150;

/// Outcome of one extraction run
#[derive(Debug)]
pub struct ExtractionOutcome {
    /// Validated tasks, in the order the model produced them
    pub tasks: Vec<ExtractedTask>,

    /// Resolved model name that served the call
    pub model: String,

    /// Total tokens used by the call
    pub tokens_used: u32,

    /// Estimated cost of the call in USD
    pub cost: f64,
}

/// The extraction pipeline
pub struct TaskExtractor {
    client: ModelClient,
    memory: Option<Arc<dyn MemorySearch>>,
    config: Config,
}

impl TaskExtractor {
    /// Build an extractor. Passing `None` for memory disables enrichment.
    pub fn new(config: Config, client: ModelClient, memory: Option<Arc<dyn MemorySearch>>) -> Self {
        Self {
            client,
            memory,
            config,
        }
    }

    /// Extract validated tasks from raw text.
    ///
    /// A failed model call is logged and yields zero tasks; enrichment
    /// failures are logged per task and never abort the run.
    pub async fn extract(&self, text: &str, source: &str) -> ExtractionOutcome {
        let active = prompt::active_projects(&self.config.context_file_path());
        let system_prompt =
            prompt::build_system_prompt(&active, &self.config.extraction.allowed_projects);
        let user_prompt = prompt::build_user_prompt(text, source);

        let response = self
            .client
            .call(
                &self.config.llm.primary_model,
                &user_prompt,
                Some(&system_prompt),
                self.config.llm.max_tokens,
            )
            .await;

        if !response.success {
            tracing::error!(
                "Model call failed: {}",
                response.error.as_deref().unwrap_or("unknown error")
            );
            return ExtractionOutcome {
                tasks: Vec::new(),
                model: response.model,
                tokens_used: response.tokens_used,
                cost: response.cost,
            };
        }

        let mut tasks = parse::parse_model_output(&response.content);

        self.enrich(&mut tasks).await;

        let validated = self.validate(tasks);

        tracing::info!("Extracted {} tasks from {}", validated.len(), source);
        ExtractionOutcome {
            tasks: validated,
            model: response.model,
            tokens_used: response.tokens_used,
            cost: response.cost,
        }
    }

    /// Append relevant memory hits to each task's context.
    async fn enrich(&self, tasks: &mut [ExtractedTask]) {
        let Some(memory) = &self.memory else {
            return;
        };
        if !self.config.memory.enabled {
            return;
        }

        for task in tasks.iter_mut() {
            let hits = match memory
                .search(
                    &task.content,
                    self.config.memory.limit,
                    self.config.memory.min_score,
                )
                .await
            {
                Ok(hits) => hits,
                Err(e) => {
                    tracing::warn!("Failed to enrich task '{}': {}", task.content, e);
                    continue;
                }
            };

            if hits.is_empty() {
                continue;
            }

            let lines: Vec<String> = hits
                .iter()
                .map(|hit| {
                    format!(
                        "• From {} ({}): {}",
                        hit.source,
                        hit.timestamp.format("%Y-%m-%d"),
                        snippet(&hit.content)
                    )
                })
                .collect();

            let block = format!("\nPRE-FLIGHT CONTEXT:\n{}", lines.join("\n"));
            match &mut task.context {
                Some(context) => {
                    context.push('\n');
                    context.push_str(&block);
                }
                None => task.context = Some(block),
            }
        }
    }

    /// Apply the constraint engine, then drop low-confidence tasks.
    fn validate(&self, tasks: Vec<ExtractedTask>) -> Vec<ExtractedTask> {
        let rules = &self.config.extraction.require_confirmation_for;
        let floor = self.config.extraction.min_confidence;

        tasks
            .into_iter()
            .map(|mut task| {
                apply_constraints(&mut task, rules);
                task
            })
            .filter(|task| {
                if task.confidence >= floor {
                    true
                } else {
                    tracing::debug!("Skipping low-confidence task: {}", task.content);
                    false
                }
            })
            .collect()
    }
}

/// First 150 characters of a memory, ellipsis appended when truncated.
fn snippet(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(SNIPPET_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AnthropicConfig, OpenAiConfig};
    use crate::llm::anthropic::AnthropicProvider;
    use crate::llm::openai::OpenAiProvider;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use sdk::errors::EngineError;
    use sdk::memory::MemoryHit;
    use sdk::types::Priority;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct FixedMemory {
        hits: Vec<MemoryHit>,
    }

    #[async_trait]
    impl MemorySearch for FixedMemory {
        async fn search(
            &self,
            _query: &str,
            limit: usize,
            _min_score: f64,
        ) -> Result<Vec<MemoryHit>, EngineError> {
            Ok(self.hits.iter().take(limit).cloned().collect())
        }
    }

    struct FailingMemory;

    #[async_trait]
    impl MemorySearch for FailingMemory {
        async fn search(
            &self,
            _query: &str,
            _limit: usize,
            _min_score: f64,
        ) -> Result<Vec<MemoryHit>, EngineError> {
            Err(EngineError::Memory("index unavailable".to_string()))
        }
    }

    fn test_config(dir: &tempfile::TempDir) -> Config {
        let toml = format!(
            "[core]\ndata_root = \"{}\"\n",
            dir.path().join("data").display()
        );
        let path = dir.path().join("config.toml");
        std::fs::write(&path, toml).unwrap();
        Config::load_from_path(&path).unwrap()
    }

    async fn extractor_against(
        server: &MockServer,
        dir: &tempfile::TempDir,
        memory: Option<Arc<dyn MemorySearch>>,
    ) -> TaskExtractor {
        let config = test_config(dir);
        let client = ModelClient::with_providers(
            OpenAiProvider::with_api_key(
                OpenAiConfig {
                    base_url: server.uri(),
                },
                Some("key".to_string()),
            ),
            AnthropicProvider::with_api_key(AnthropicConfig::default(), None),
        );
        TaskExtractor::new(config, client, memory)
    }

    async fn mount_model_output(server: &MockServer, content: &str) {
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": content}}],
                "usage": {"prompt_tokens": 400, "completion_tokens": 120}
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_full_pipeline_validates_and_clamps() {
        let server = MockServer::start().await;
        mount_model_output(
            &server,
            r#"[
                {"content": "Reply to the landlord immediately", "priority": "P1", "confidence": 0.9},
                {"content": "Water the plants", "priority": "P4", "confidence": 0.8},
                {"content": "Maybe think about hobbies", "priority": "P3", "confidence": 0.3}
            ]"#,
        )
        .await;

        let dir = tempfile::tempdir().unwrap();
        let extractor = extractor_against(&server, &dir, None).await;
        let outcome = extractor.extract("note text", "morning_pages").await;

        // Low-confidence task dropped, order preserved
        assert_eq!(outcome.tasks.len(), 2);
        assert_eq!(outcome.tasks[0].priority, Priority::P2);
        assert!(outcome.tasks[0].requires_confirmation);
        assert_eq!(outcome.tasks[1].content, "Water the plants");
        assert_eq!(outcome.tokens_used, 520);
        assert_eq!(outcome.model, "gpt-4o-mini");
    }

    #[tokio::test]
    async fn test_model_failure_yields_zero_tasks() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let extractor = extractor_against(&server, &dir, None).await;
        let outcome = extractor.extract("note text", "morning_pages").await;

        assert!(outcome.tasks.is_empty());
        assert_eq!(outcome.cost, 0.0);
    }

    #[tokio::test]
    async fn test_enrichment_appends_preflight_block() {
        let server = MockServer::start().await;
        mount_model_output(
            &server,
            r#"[{"content": "Call the dentist office", "context": "mentioned twice", "confidence": 0.9}]"#,
        )
        .await;

        let memory = Arc::new(FixedMemory {
            hits: vec![MemoryHit {
                content: "Dentist said to book a cleaning every six months".to_string(),
                source: "health.md".to_string(),
                timestamp: chrono::Utc.with_ymd_and_hms(2024, 11, 5, 8, 0, 0).unwrap(),
                score: 0.9,
            }],
        });

        let dir = tempfile::tempdir().unwrap();
        let extractor = extractor_against(&server, &dir, Some(memory)).await;
        let outcome = extractor.extract("note text", "morning_pages").await;

        let context = outcome.tasks[0].context.as_deref().unwrap();
        assert!(context.starts_with("mentioned twice\n"));
        assert!(context.contains("PRE-FLIGHT CONTEXT:"));
        assert!(context.contains("• From health.md (2024-11-05): Dentist said"));
    }

    #[tokio::test]
    async fn test_enrichment_failure_is_swallowed() {
        let server = MockServer::start().await;
        mount_model_output(
            &server,
            r#"[{"content": "Call the dentist office", "confidence": 0.9}]"#,
        )
        .await;

        let dir = tempfile::tempdir().unwrap();
        let extractor = extractor_against(&server, &dir, Some(Arc::new(FailingMemory))).await;
        let outcome = extractor.extract("note text", "morning_pages").await;

        assert_eq!(outcome.tasks.len(), 1);
        assert!(outcome.tasks[0].context.is_none());
    }

    #[test]
    fn test_snippet_truncates_long_memories() {
        let long = "x".repeat(200);
        let cut = snippet(&long);
        assert_eq!(cut.chars().count(), SNIPPET_MAX_CHARS + 3);
        assert!(cut.ends_with("..."));

        assert_eq!(snippet("short"), "short");
    }
}
