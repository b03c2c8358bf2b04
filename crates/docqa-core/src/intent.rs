//! User intent classification labels

use serde::{Deserialize, Serialize};

/// Where a user question gets dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Questions answered from the indexed documents
    DocumentSearch,
    /// Explicit arithmetic
    Calculation,
    /// Greetings and everything else
    General,
}

impl Intent {
    /// Canonical label the classifier is asked to produce
    pub fn label(&self) -> &'static str {
        match self {
            Intent::DocumentSearch => "document_search",
            Intent::Calculation => "calculation",
            Intent::General => "general",
        }
    }

    /// Strict mapping of one label to an intent
    pub fn from_label(label: &str) -> Option<Intent> {
        match label.trim().to_lowercase().as_str() {
            "document_search" | "pesquisa_documentos" => Some(Intent::DocumentSearch),
            "calculation" | "calculadora" => Some(Intent::Calculation),
            "general" | "geral" => Some(Intent::General),
            _ => None,
        }
    }

    /// Map free-form classifier output to an intent.
    ///
    /// The reply is first matched as a whole label. Failing that, the first
    /// non-empty line is split into words and must contain exactly one known
    /// label. Anything else falls back to [`Intent::General`].
    pub fn from_model_output(output: &str) -> Intent {
        let cleaned = clean_label(output);
        if let Some(intent) = Intent::from_label(&cleaned) {
            return intent;
        }

        let first_line = output
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or_default();

        let mut found: Option<Intent> = None;
        for word in first_line.split(|c: char| !(c.is_alphanumeric() || c == '_')) {
            if let Some(intent) = Intent::from_label(word) {
                match found {
                    Some(existing) if existing != intent => return Intent::General,
                    _ => found = Some(intent),
                }
            }
        }

        found.unwrap_or(Intent::General)
    }
}

fn clean_label(output: &str) -> String {
    output
        .trim()
        .trim_matches(|c: char| (c.is_ascii_punctuation() && c != '_') || c.is_whitespace())
        .to_lowercase()
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
