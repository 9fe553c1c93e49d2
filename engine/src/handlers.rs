//! Command handlers for CLI operations
//!
//! This module implements the handlers for all CLI commands:
//! - extract: Run the extraction pipeline over a note, optionally publishing
//! - status: Show provider and credential availability
//! - doctor: Validate configuration and check dependencies
//! - config show/validate: Inspect the loaded configuration

use anyhow::{Context, Result};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;
use crate::extractor::TaskExtractor;
use crate::llm::anthropic::ANTHROPIC_API_KEY_VAR;
use crate::llm::openai::OPENAI_API_KEY_VAR;
use crate::llm::ModelClient;
use crate::memory::ArchiveMemory;
use crate::publisher::{PublishStatus, Publisher};
use crate::todoist::{TodoistClient, TODOIST_API_TOKEN_VAR};
use sdk::memory::MemorySearch;

/// Output format for command results
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Run the extraction pipeline over a note
///
/// Reads the note from a file or stdin, extracts and validates tasks, and
/// optionally publishes them. `simulate` walks the publish path without
/// creating anything remotely.
pub async fn handle_extract(
    file: Option<PathBuf>,
    source: String,
    publish: bool,
    simulate: bool,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let text = match &file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read note file {:?}", path))?,
        None => std::io::read_to_string(std::io::stdin()).context("Failed to read stdin")?,
    };

    if text.trim().is_empty() {
        return Err(anyhow::anyhow!("Note is empty, nothing to extract"));
    }

    let client = ModelClient::new(&config.llm);
    let memory = load_memory(config);
    let extractor = TaskExtractor::new(config.clone(), client, memory);

    let outcome = extractor.extract(&text, &source).await;

    match format {
        OutputFormat::Text => {
            if outcome.tasks.is_empty() {
                println!("No tasks extracted.");
            } else {
                println!("Extracted {} task(s):", outcome.tasks.len());
                println!();
                for task in &outcome.tasks {
                    let flag = if task.requires_confirmation {
                        " ⚠"
                    } else {
                        ""
                    };
                    println!(
                        "  [{}] {}{} ({})",
                        task.priority,
                        task.content,
                        flag,
                        task.project.as_deref().unwrap_or("no project")
                    );
                    if let Some(reason) = &task.confirmation_reason {
                        println!("      Flagged: {}", reason);
                    }
                }
            }
            println!();
            println!(
                "  Model: {}  Tokens: {}  Cost: ${:.4}",
                outcome.model, outcome.tokens_used, outcome.cost
            );
        }
        OutputFormat::Json => {
            let output = json!({
                "source": source,
                "tasks": outcome.tasks,
                "model": outcome.model,
                "tokens_used": outcome.tokens_used,
                "cost": outcome.cost,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    if !publish && !simulate {
        return Ok(());
    }

    let todoist = TodoistClient::new(config.todoist.clone())?;
    let publisher = Publisher::new(todoist, config.todoist.clone());
    let results = publisher.publish(&outcome.tasks, simulate).await?;

    match format {
        OutputFormat::Text => {
            println!();
            for result in &results {
                match &result.status {
                    PublishStatus::Created { url, .. } => {
                        println!("✓ Created: {} ({})", result.content, url)
                    }
                    PublishStatus::Simulated { .. } => {
                        println!("~ Simulated: {}", result.content)
                    }
                    PublishStatus::Skipped { reason } => {
                        println!("- Skipped: {} ({})", result.content, reason)
                    }
                    PublishStatus::Failed { error } => {
                        println!("✗ Failed: {} ({})", result.content, error)
                    }
                }
            }
        }
        OutputFormat::Json => {
            let output = json!({ "results": results });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

/// Load the archive-backed memory if enrichment is enabled.
fn load_memory(config: &Config) -> Option<Arc<dyn MemorySearch>> {
    if !config.memory.enabled {
        return None;
    }
    match ArchiveMemory::load(&config.archive_file_path()) {
        Ok(memory) => Some(Arc::new(memory) as Arc<dyn MemorySearch>),
        Err(e) => {
            tracing::warn!("Failed to load memory archive: {}", e);
            None
        }
    }
}

/// Show provider and credential availability
pub async fn handle_status(config: &Config, format: OutputFormat) -> Result<()> {
    let client = ModelClient::new(&config.llm);
    let (openai, anthropic) = client.availability();
    let todoist = std::env::var(TODOIST_API_TOKEN_VAR).is_ok();

    match format {
        OutputFormat::Text => {
            println!("Primary model: {}", config.llm.primary_model);
            println!("Credentials:");
            println!("  OpenAI:    {}", availability(openai));
            println!("  Anthropic: {}", availability(anthropic));
            println!("  Todoist:   {}", availability(todoist));
        }
        OutputFormat::Json => {
            let output = json!({
                "primary_model": config.llm.primary_model,
                "credentials": {
                    "openai": openai,
                    "anthropic": anthropic,
                    "todoist": todoist,
                }
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

fn availability(present: bool) -> &'static str {
    if present {
        "available"
    } else {
        "unavailable"
    }
}

/// Run system diagnostics
pub async fn handle_doctor(config: &Config, format: OutputFormat) -> Result<()> {
    let mut checks: Vec<(&str, String)> = Vec::new();
    let mut issues = Vec::new();

    // Config is already validated when loaded
    checks.push(("Configuration", "Valid".to_string()));

    if config.core.data_root.exists() {
        checks.push(("Data root", "Exists".to_string()));
    } else {
        checks.push(("Data root", "Missing".to_string()));
        issues.push(format!("Data root does not exist: {:?}", config.core.data_root));
    }

    let context_file = config.context_file_path();
    if context_file.exists() {
        checks.push(("Context document", "Exists".to_string()));
    } else {
        checks.push(("Context document", "Missing".to_string()));
        issues.push(format!(
            "Context document not found: {:?} (prompts will carry no active projects)",
            context_file
        ));
    }

    let archive = config.archive_file_path();
    if archive.exists() {
        match ArchiveMemory::load(&archive) {
            Ok(memory) => checks.push(("Memory archive", format!("{} memories", memory.len()))),
            Err(e) => {
                checks.push(("Memory archive", "Unreadable".to_string()));
                issues.push(format!("Cannot read memory archive: {}", e));
            }
        }
    } else {
        checks.push(("Memory archive", "Not initialized".to_string()));
    }

    let openai = std::env::var(OPENAI_API_KEY_VAR).is_ok();
    let anthropic = std::env::var(ANTHROPIC_API_KEY_VAR).is_ok();
    let todoist = std::env::var(TODOIST_API_TOKEN_VAR).is_ok();

    checks.push(("OpenAI API key", configured(openai).to_string()));
    checks.push(("Anthropic API key", configured(anthropic).to_string()));
    checks.push(("Todoist API token", configured(todoist).to_string()));

    if !openai && !anthropic {
        issues.push(format!(
            "No model provider credential set. Set {} or {}.",
            OPENAI_API_KEY_VAR, ANTHROPIC_API_KEY_VAR
        ));
    }
    if !todoist {
        issues.push(format!(
            "{} not set; publishing will be unavailable.",
            TODOIST_API_TOKEN_VAR
        ));
    }

    match format {
        OutputFormat::Text => {
            println!("Daybook Doctor");
            println!();
            for (name, status) in &checks {
                println!("  {:<22} {}", name, status);
            }
            if issues.is_empty() {
                println!();
                println!("✓ All checks passed");
            } else {
                println!();
                println!("Issues found:");
                for issue in &issues {
                    println!("  ✗ {}", issue);
                }
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "checks": checks.iter().map(|(name, status)| {
                    json!({ "name": name, "status": status })
                }).collect::<Vec<_>>(),
                "issues": issues,
                "healthy": issues.is_empty(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

fn configured(present: bool) -> &'static str {
    if present {
        "Configured"
    } else {
        "Not configured"
    }
}

/// Show the loaded configuration
pub fn handle_config_show(config: &Config, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!("{}", toml::to_string_pretty(config)?);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
    }
    Ok(())
}

/// Report that the configuration loaded and validated cleanly
pub fn handle_config_validate(config: &Config, format: OutputFormat) -> Result<()> {
    // Reaching this handler means load-time validation already passed
    match format {
        OutputFormat::Text => {
            println!("✓ Configuration is valid");
            println!("  Data root: {:?}", config.core.data_root);
            println!("  Primary model: {}", config.llm.primary_model);
        }
        OutputFormat::Json => {
            let output = json!({
                "valid": true,
                "data_root": config.core.data_root,
                "primary_model": config.llm.primary_model,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}
