//! Read view over approved entries.

use std::sync::Arc;

use qabase_normalizer::expand_query;
use qabase_shared::{QaEntry, Result, Status};
use qabase_storage::Storage;
use tracing::{debug, instrument};

/// Search over approved entries. Nothing else is ever returned.
#[derive(Clone)]
pub struct SearchIndex {
    storage: Arc<Storage>,
    limit: u32,
}

/// Outcome of a chat lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatLookup {
    Found { answer: String },
    NotFound,
}

impl SearchIndex {
    pub fn new(storage: Arc<Storage>, limit: u32) -> Self {
        Self {
            storage,
            limit: limit.max(1),
        }
    }

    /// Approved entries matching `query`, best first. Query words match
    /// their inflected forms and synonyms. Blank or term-less queries
    /// return nothing.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<QaEntry>> {
        let terms = expand_query(query);
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let mut hits = self.storage.search_approved(&terms, self.limit).await?;
        hits.retain(|e| e.status == Status::Approved);
        debug!(terms = ?terms, hits = hits.len(), "search complete");
        Ok(hits)
    }

    /// Best answer for a chat question, preferring the processed text.
    pub async fn chat_lookup(&self, query: &str) -> Result<ChatLookup> {
        let best = self.search(query).await?.into_iter().next();
        Ok(match best.and_then(|e| e.answer_processed.or(e.answer)) {
            Some(answer) => ChatLookup::Found { answer },
            None => ChatLookup::NotFound,
        })
    }
}
