//! Word generator — one LLM round-trip, parsed into a [`WordEntry`].
//!
//! The model is asked for three labeled paragraphs (`Word:`, `Meaning:`,
//! `Example:`) separated by blank lines. Anything else is a parse failure;
//! no partial entry is ever returned.

use thiserror::Error;
use tracing::{debug, warn};

use super::WordEntry;
use crate::llm::{LlmProvider, ProviderError};

/// Prompt sent on every generation request.
pub const WORD_PROMPT: &str = include_str!("../../config/prompts/word_of_the_day.txt");

const LABELS: [&str; 3] = ["Word", "Meaning", "Example"];

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("generation request failed: {0}")]
    Provider(#[from] ProviderError),
    #[error("unparsable reply: {0}")]
    Parse(String),
}

#[derive(Debug, Clone)]
pub struct WordGenerator {
    provider: LlmProvider,
}

impl WordGenerator {
    pub fn new(provider: LlmProvider) -> Self {
        Self { provider }
    }

    /// Ask the model for one word. Transport, status and format problems all
    /// come back as `Err`.
    pub async fn generate(&self) -> Result<WordEntry, GenerateError> {
        let response = self.provider.complete(WORD_PROMPT).await?;
        if let Some(u) = response.usage {
            debug!(input_tokens = u.input_tokens, output_tokens = u.output_tokens, "llm usage");
        }
        parse_word_reply(&response.text).inspect_err(|e| {
            warn!(error = %e, reply = %response.text, "discarding malformed word reply");
        })
    }
}

/// Split `text` into exactly three blank-line separated paragraphs and strip
/// their `Word:` / `Meaning:` / `Example:` labels.
pub fn parse_word_reply(text: &str) -> Result<WordEntry, GenerateError> {
    let paragraphs = paragraphs(text);
    if paragraphs.len() != LABELS.len() {
        return Err(GenerateError::Parse(format!(
            "expected {} paragraphs, got {}",
            LABELS.len(),
            paragraphs.len()
        )));
    }

    let fields = paragraphs
        .iter()
        .zip(LABELS)
        .map(|(para, label)| {
            strip_label(para, label)
                .map(str::to_string)
                .ok_or_else(|| GenerateError::Parse(format!("missing or empty '{label}:' paragraph")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let [word, meaning, example]: [String; 3] = fields
        .try_into()
        .map_err(|_| GenerateError::Parse("expected three fields".into()))?;

    Ok(WordEntry { word, meaning, example })
}

/// Group consecutive non-blank lines; blank (whitespace-only) lines separate.
fn paragraphs(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            if !current.is_empty() {
                out.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        out.push(current.join("\n"));
    }
    out
}

/// `"Word: lucid"` → `"lucid"`. Label match ignores ASCII case and markdown
/// emphasis (`**Word:**`). Empty values are rejected.
fn strip_label<'a>(para: &'a str, label: &str) -> Option<&'a str> {
    let s = para.trim().trim_start_matches('*').trim_start();
    let head = s.get(..label.len())?;
    if !head.eq_ignore_ascii_case(label) {
        return None;
    }
    let rest = s[label.len()..].trim_start_matches('*').trim_start();
    let value = rest.strip_prefix(':')?.trim().trim_matches('*').trim();
    (!value.is_empty()).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::providers::dummy::DummyProvider;

    const LUCID: &str = "Word: lucid\n\nMeaning: clear\n\nExample: a lucid explanation";

    #[test]
    fn prompt_asks_for_three_labels() {
        for label in LABELS {
            assert!(WORD_PROMPT.contains(&format!("{label}:")), "prompt lacks {label}");
        }
    }

    #[test]
    fn parses_well_formed_reply() {
        let e = parse_word_reply(LUCID).unwrap();
        assert_eq!(e, WordEntry::new("lucid", "clear", "a lucid explanation"));
    }

    #[test]
    fn tolerates_crlf_extra_blank_lines_and_emphasis() {
        let text = "\r\n**Word:** Lucid\r\n\r\n\r\n**Meaning**: clear\r\n   \r\nexample: a lucid explanation\r\n";
        let e = parse_word_reply(text).unwrap();
        assert_eq!(e, WordEntry::new("Lucid", "clear", "a lucid explanation"));
    }

    #[test]
    fn missing_third_paragraph_fails() {
        let err = parse_word_reply("Word: lucid\n\nMeaning: clear").unwrap_err();
        assert!(matches!(err, GenerateError::Parse(_)));
    }

    #[test]
    fn extra_paragraph_fails() {
        let text = format!("{LUCID}\n\nHope this helps!");
        assert!(parse_word_reply(&text).is_err());
    }

    #[test]
    fn missing_label_fails() {
        assert!(parse_word_reply("lucid\n\nMeaning: clear\n\nExample: x").is_err());
        assert!(parse_word_reply("Word: lucid\n\nExample: x\n\nMeaning: clear").is_err());
    }

    #[test]
    fn empty_value_fails() {
        assert!(parse_word_reply("Word:\n\nMeaning: clear\n\nExample: x").is_err());
        assert!(parse_word_reply("Word: **\n\nMeaning: clear\n\nExample: x").is_err());
    }

    #[test]
    fn single_paragraph_without_blank_lines_fails() {
        assert!(parse_word_reply("Word: lucid\nMeaning: clear\nExample: x").is_err());
    }

    #[tokio::test]
    async fn generate_parses_provider_reply() {
        let provider = LlmProvider::Dummy(DummyProvider::new(vec![LUCID.into()]));
        let generator = WordGenerator::new(provider);
        assert_eq!(generator.generate().await.unwrap().word, "lucid");
    }

    #[tokio::test]
    async fn generate_surfaces_provider_failure() {
        let provider = LlmProvider::Dummy(DummyProvider::new(vec![String::new()]));
        let err = WordGenerator::new(provider).generate().await.unwrap_err();
        assert!(matches!(err, GenerateError::Provider(_)));
    }
}
