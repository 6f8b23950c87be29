//! Knowledge retrieval for the assistant scenario.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::RetrievalError;

/// Results fed into a conversation turn.
pub const DEFAULT_MAX_RESULTS: usize = 3;

/// Name used for an index that was not given one.
pub const DEFAULT_LABEL: &str = "knowledge base";

/// A retrievable passage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub source: Option<String>,
}

/// A chunk matched by a query.
#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeHit {
    pub chunk: KnowledgeChunk,
    pub score: f32,
}

/// Searches a body of knowledge.
#[async_trait]
pub trait KnowledgeRetriever: Send + Sync {
    /// Human name of the source, used in rendered context.
    fn label(&self) -> &str;

    /// Returns at most `max_results` hits, best first.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<KnowledgeHit>, RetrievalError>;
}

fn word_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[a-z0-9]+").expect("valid regex"))
}

fn tokens(text: &str) -> HashSet<String> {
    let lower = text.to_lowercase();
    word_regex()
        .find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|w| w.len() > 2)
        .map(str::to_string)
        .collect()
}

/// In-memory index scored by keyword overlap.
pub struct KeywordIndex {
    label: String,
    chunks: Vec<(KnowledgeChunk, HashSet<String>)>,
}

impl KeywordIndex {
    /// Builds an index over `chunks`.
    pub fn new(chunks: Vec<KnowledgeChunk>) -> Self {
        let chunks = chunks
            .into_iter()
            .map(|chunk| {
                let words = tokens(&chunk.content);
                (chunk, words)
            })
            .collect();
        Self {
            label: DEFAULT_LABEL.to_string(),
            chunks,
        }
    }

    /// Loads chunks from a JSON array file.
    pub fn load(path: &Path) -> Result<Self, RetrievalError> {
        let content = std::fs::read_to_string(path)?;
        let chunks: Vec<KnowledgeChunk> = serde_json::from_str(&content)?;
        debug!(path = %path.display(), chunks = chunks.len(), "loaded knowledge file");
        Ok(Self::new(chunks))
    }

    /// Sets the source name.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

#[async_trait]
impl KnowledgeRetriever for KeywordIndex {
    fn label(&self) -> &str {
        &self.label
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<KnowledgeHit>, RetrievalError> {
        if self.chunks.is_empty() {
            return Err(RetrievalError::Unavailable("index is empty".to_string()));
        }

        let wanted = tokens(query);
        if wanted.is_empty() {
            return Ok(Vec::new());
        }

        let mut hits: Vec<KnowledgeHit> = self
            .chunks
            .iter()
            .filter_map(|(chunk, words)| {
                let overlap = wanted.intersection(words).count();
                (overlap > 0).then(|| KnowledgeHit {
                    chunk: chunk.clone(),
                    score: overlap as f32 / wanted.len() as f32,
                })
            })
            .collect();

        // Stable sort keeps file order among equal scores.
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(max_results);
        debug!(query = %query, hits = hits.len(), "knowledge search");
        Ok(hits)
    }
}

/// Renders hits as context for the model.
pub fn format_context(label: &str, hits: &[KnowledgeHit], query: &str) -> String {
    if hits.is_empty() {
        return format!("No relevant {label} information found for your query.");
    }

    let mut parts = vec![format!(
        "Based on the {label}, here's relevant information for your query: '{query}'\n"
    )];
    for (i, hit) in hits.iter().enumerate() {
        let heading = match hit.chunk.page {
            Some(page) => format!("--- Reference {} (Page {}) ---", i + 1, page),
            None => format!("--- Reference {} ---", i + 1),
        };
        parts.push(format!("{heading}\n{}\n", hit.chunk.content));
    }
    parts.push(
        "\nPlease provide a helpful response based on this information. If the information \
         doesn't fully address the query, mention that additional resources may be needed."
            .to_string(),
    );
    parts.join("\n")
}

/// Searches and renders in one step. An unavailable index reads as no match;
/// other failures become an apology.
pub async fn search_knowledge(retriever: &Arc<dyn KnowledgeRetriever>, query: &str, max_results: usize) -> String {
    match retriever.search(query, max_results).await {
        Ok(hits) => format_context(retriever.label(), &hits, query),
        Err(RetrievalError::Unavailable(reason)) => {
            debug!(reason = %reason, "knowledge index unavailable");
            format_context(retriever.label(), &[], query)
        }
        Err(e) => {
            warn!(error = %e, "knowledge search failed");
            format!(
                "I apologize, but I'm having trouble accessing the {} right now. Please try again later.",
                retriever.label()
            )
        }
    }
}
