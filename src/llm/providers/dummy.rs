//! Dummy LLM provider — replays a fixed list of replies in rotation.
//!
//! Runs the whole pipeline offline (`[llm] default = "dummy"`) and doubles as
//! the scripted model in tests. An empty reply simulates a provider failure.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::llm::{LlmResponse, ProviderError};

const SAMPLE_REPLIES: &[&str] = &[
    "Word: lucid\n\nMeaning: easy to understand; clear\n\nExample: She gave a lucid explanation of the plan.",
    "Word: ephemeral\n\nMeaning: lasting for a very short time\n\nExample: Fame on the internet is often ephemeral.",
    "Word: candor\n\nMeaning: the quality of being open and honest\n\nExample: I appreciated his candor about the delay.",
    "Word: meticulous\n\nMeaning: very careful about small details\n\nExample: He keeps meticulous notes at every meeting.",
    "Word: serendipity\n\nMeaning: finding something good by chance\n\nExample: Meeting my cofounder on a train was pure serendipity.",
];

#[derive(Debug, Clone)]
pub struct DummyProvider {
    replies: Arc<Vec<String>>,
    calls: Arc<AtomicUsize>,
}

impl DummyProvider {
    /// Replay `replies` in order, wrapping around at the end.
    pub fn new(replies: Vec<String>) -> Self {
        Self { replies: Arc::new(replies), calls: Arc::new(AtomicUsize::new(0)) }
    }

    /// Built-in rotation of well-formed word replies.
    pub fn sample() -> Self {
        Self::new(SAMPLE_REPLIES.iter().map(|s| s.to_string()).collect())
    }

    /// Number of `complete` calls served so far (shared across clones).
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn complete(&self, _prompt: &str) -> Result<LlmResponse, ProviderError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.replies.is_empty() {
            return Err(ProviderError::Request("dummy provider has no replies".into()));
        }
        let text = &self.replies[n % self.replies.len()];
        if text.is_empty() {
            return Err(ProviderError::Request("empty or missing content in response".into()));
        }
        Ok(LlmResponse { text: text.clone(), usage: None })
    }
}
