//! Query expansion through paraphrase generation

use regex::Regex;
use std::sync::{Arc, LazyLock};

use docqa_core::{Error, GenerationConfig, LLMProvider, Result};

static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:\d+[.)]|[-*•])\s+").expect("valid list marker regex"));

/// Turns one question into the original plus generated paraphrases
pub struct QueryExpander<L: LLMProvider> {
    llm: Arc<L>,
    expansions: usize,
}

impl<L: LLMProvider> QueryExpander<L> {
    pub fn new(llm: Arc<L>, expansions: usize) -> Self {
        Self { llm, expansions }
    }

    pub fn build_prompt(&self, question: &str) -> String {
        format!(
            "You are an AI assistant. Your task is to generate {} alternative versions of the \
            following user question to improve document retrieval. Keep the same meaning, but use \
            synonyms and different phrasings.\n\
            Reply only with the {} questions, one per line.\n\
            \n\
            Original question: {}\n\
            Alternative questions:",
            self.expansions, self.expansions, question
        )
    }

    /// Produce the query variants, original question first.
    ///
    /// A model that returns fewer lines than requested yields a shorter list.
    pub async fn expand(&self, question: &str) -> Result<Vec<String>> {
        if self.expansions == 0 {
            return Ok(vec![question.to_string()]);
        }

        let config = GenerationConfig {
            model_id: self.llm.model_id().to_string(),
            max_tokens: 256,
            ..Default::default()
        };

        let result = self
            .llm
            .generate_with_config(&self.build_prompt(question), &config)
            .await
            .map_err(|e| Error::Generation(format!("Query expansion failed: {}", e)))?;

        let variants = parse_variants(question, &result.text, self.expansions);
        tracing::debug!(variants = ?variants, "expanded question");
        Ok(variants)
    }
}

/// Original question followed by at most `max` non-empty generated lines
pub fn parse_variants(question: &str, output: &str, max: usize) -> Vec<String> {
    let generated = output
        .lines()
        .map(|line| LIST_MARKER.replace(line, "").trim().to_string())
        .filter(|line| !line.is_empty())
        .take(max);

    std::iter::once(question.to_string()).chain(generated).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_variants_keeps_original_first() {
        let variants = parse_variants(
            "What is the code of conduct?",
            "What does the code of conduct say?\nWhich rules of conduct apply?\nWhat is the ethics policy?",
            3,
        );
        assert_eq!(variants.len(), 4);
        assert_eq!(variants[0], "What is the code of conduct?");
        assert_eq!(variants[3], "What is the ethics policy?");
    }

    #[test]
    fn test_parse_variants_short_output_is_not_an_error() {
        let variants = parse_variants("q", "only one paraphrase\n\n   \n", 3);
        assert_eq!(variants, vec!["q".to_string(), "only one paraphrase".to_string()]);
    }

    #[test]
    fn test_parse_variants_caps_and_strips_list_markers() {
        let variants = parse_variants("q", "1. a\n2) b\n- c\n* d\n", 3);
        assert_eq!(variants, vec!["q", "a", "b", "c"]);
    }

    #[test]
    fn test_parse_variants_empty_output() {
        assert_eq!(parse_variants("q", "", 3), vec!["q".to_string()]);
    }
}
