//! Unique word resolver — generate until the content store has never seen
//! the word, then persist it.
//!
//! Bounded by `max_attempts` generation calls per resolve. Failed generations
//! and duplicates both consume an attempt. The `UNIQUE(word_key)` constraint
//! is the source of truth: a conflict on insert (another resolve won the race
//! after our `exists` check) counts as a duplicate.

use thiserror::Error;
use tracing::{debug, info, warn};

use super::{WordEntry, WordGenerator};
use crate::store::{self, ContentStore, StoreError};

/// Default and production bound on generation calls per resolve.
pub const MAX_ATTEMPTS: usize = 5;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no new word after {attempts} attempts")]
    Exhausted { attempts: usize },
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct WordResolver {
    generator: WordGenerator,
    content: ContentStore,
    max_attempts: usize,
}

impl WordResolver {
    pub fn new(generator: WordGenerator, content: ContentStore) -> Self {
        Self { generator, content, max_attempts: MAX_ATTEMPTS }
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Produce one word not yet in the content store, persisting it.
    ///
    /// On success exactly one entry has been written; on failure none.
    pub async fn resolve(&self) -> Result<WordEntry, ResolveError> {
        for attempt in 1..=self.max_attempts {
            let entry = match self.generator.generate().await {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(attempt, error = %e, "word generation failed");
                    continue;
                }
            };

            let (content, word) = (self.content.clone(), entry.word.clone());
            if store::blocking(move || content.exists(&word)).await? {
                debug!(attempt, word = %entry.word, "duplicate word, retrying");
                continue;
            }

            let (content, candidate) = (self.content.clone(), entry.clone());
            match store::blocking(move || content.save(&candidate)).await {
                Ok(()) => {
                    info!(attempt, word = %entry.word, "new word stored");
                    return Ok(entry);
                }
                Err(StoreError::Duplicate(word)) => {
                    debug!(attempt, %word, "word stored concurrently, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        warn!(attempts = self.max_attempts, "no unique word generated");
        Err(ResolveError::Exhausted { attempts: self.max_attempts })
    }
}
