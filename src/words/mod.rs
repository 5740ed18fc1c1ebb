//! Vocabulary words: generation, parsing, and the unique-word resolver.

pub mod generator;
pub mod resolver;

pub use generator::{GenerateError, WordGenerator, parse_word_reply};
pub use resolver::{ResolveError, WordResolver};

/// One generated word with its meaning and a usage example.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordEntry {
    pub word: String,
    pub meaning: String,
    pub example: String,
}

impl WordEntry {
    pub fn new(word: impl Into<String>, meaning: impl Into<String>, example: impl Into<String>) -> Self {
        Self { word: word.into(), meaning: meaning.into(), example: example.into() }
    }

    /// Render the chat message sent to users under `heading`.
    pub fn to_message(&self, heading: &str) -> String {
        format!(
            "📘 {heading}\n\n🔤 Word: {}\n\n📖 Meaning: {}\n\n📝 Example: {}",
            self.word, self.meaning, self.example
        )
    }
}
