//! Archive-backed memory search
//!
//! A small, file-backed implementation of the `MemorySearch` collaborator the
//! extraction pipeline uses for context enrichment. Memories live in a
//! JSON-lines archive under the data root; relevance is keyword overlap
//! between the query and the memory text. A missing archive is not an error,
//! it just means no enrichment.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sdk::errors::EngineError;
use sdk::memory::{MemoryHit, MemorySearch};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

/// One line of the archive file
#[derive(Debug, Deserialize)]
struct ArchiveEntry {
    content: String,
    #[serde(default = "default_source")]
    source: String,
    timestamp: DateTime<Utc>,
}

fn default_source() -> String {
    "unknown".to_string()
}

/// Memory search over a JSON-lines archive file
pub struct ArchiveMemory {
    entries: Vec<ArchiveEntry>,
}

impl ArchiveMemory {
    /// Load the archive from disk.
    ///
    /// A missing file yields an empty archive. Malformed lines are skipped
    /// with a warning rather than failing the whole load.
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        if !path.exists() {
            tracing::debug!("Memory archive not found at {:?}, enrichment disabled", path);
            return Ok(Self {
                entries: Vec::new(),
            });
        }

        let contents = std::fs::read_to_string(path)?;
        let mut entries = Vec::new();
        for (line_no, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<ArchiveEntry>(line) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    tracing::warn!("Skipping malformed archive line {}: {}", line_no + 1, e);
                }
            }
        }

        tracing::debug!("Loaded {} memories from {:?}", entries.len(), path);
        Ok(Self { entries })
    }

    /// Build an archive from in-memory entries (tests).
    #[cfg(test)]
    fn from_parts(parts: Vec<(&str, &str, DateTime<Utc>)>) -> Self {
        Self {
            entries: parts
                .into_iter()
                .map(|(content, source, timestamp)| ArchiveEntry {
                    content: content.to_string(),
                    source: source.to_string(),
                    timestamp,
                })
                .collect(),
        }
    }

    /// Number of loaded memories
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the archive is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fraction of query keywords that appear in the memory text.
fn overlap_score(query: &str, memory: &str) -> f64 {
    let query_tokens = keywords(query);
    if query_tokens.is_empty() {
        return 0.0;
    }
    let memory_tokens = keywords(memory);

    let matched = query_tokens
        .iter()
        .filter(|t| memory_tokens.contains(*t))
        .count();

    matched as f64 / query_tokens.len() as f64
}

/// Lower-cased alphanumeric tokens, short stop-words dropped.
fn keywords(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 2)
        .map(String::from)
        .collect()
}

#[async_trait]
impl MemorySearch for ArchiveMemory {
    async fn search(
        &self,
        query: &str,
        limit: usize,
        min_score: f64,
    ) -> Result<Vec<MemoryHit>, EngineError> {
        let mut hits: Vec<MemoryHit> = self
            .entries
            .iter()
            .map(|entry| MemoryHit {
                score: overlap_score(query, &entry.content),
                content: entry.content.clone(),
                source: entry.source.clone(),
                timestamp: entry.timestamp,
            })
            .filter(|hit| hit.score >= min_score)
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(limit);

        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, 5, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_overlap_score_full_and_none() {
        assert_eq!(
            overlap_score("dentist appointment", "dentist appointment confirmed"),
            1.0
        );
        assert_eq!(overlap_score("dentist appointment", "tax return forms"), 0.0);
    }

    #[test]
    fn test_keywords_drop_short_tokens() {
        let tokens = keywords("go to the gym at 6");
        assert!(tokens.contains("gym"));
        assert!(!tokens.contains("to"));
        assert!(!tokens.contains("6"));
    }

    #[tokio::test]
    async fn test_search_applies_threshold_and_limit() {
        let memory = ArchiveMemory::from_parts(vec![
            ("dentist appointment at the clinic", "health.md", ts()),
            ("dentist recommended flossing more", "health.md", ts()),
            ("dentist bill paid in november", "finance.md", ts()),
            ("grocery list for the week", "home.md", ts()),
        ]);

        let hits = memory.search("dentist appointment", 2, 0.4).await.unwrap();
        assert_eq!(hits.len(), 2);
        // Best match first
        assert_eq!(hits[0].content, "dentist appointment at the clinic");
        assert!(hits.iter().all(|h| h.score >= 0.4));
    }

    #[tokio::test]
    async fn test_missing_archive_is_empty_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let memory = ArchiveMemory::load(&dir.path().join("nope.jsonl")).unwrap();
        assert!(memory.is_empty());
        assert!(memory.search("anything", 2, 0.6).await.unwrap().is_empty());
    }

    #[test]
    fn test_load_skips_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archive.jsonl");
        std::fs::write(
            &path,
            concat!(
                r#"{"content": "renew passport before trip", "source": "travel.md", "timestamp": "2024-11-05T09:30:00Z"}"#,
                "\n",
                "not json at all\n",
                r#"{"content": "book flights", "timestamp": "2024-11-06T10:00:00Z"}"#,
                "\n",
            ),
        )
        .unwrap();

        let memory = ArchiveMemory::load(&path).unwrap();
        assert_eq!(memory.len(), 2);
    }
}
