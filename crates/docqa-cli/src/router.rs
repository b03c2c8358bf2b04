//! Intent router classifying each question into one handler

use std::sync::Arc;

use docqa_core::{GenerationConfig, Intent, LLMProvider, Result};

/// One classification call per question; no memory across turns
pub struct IntentRouter<L: LLMProvider> {
    llm: Arc<L>,
}

impl<L: LLMProvider> IntentRouter<L> {
    pub fn new(llm: Arc<L>) -> Self {
        Self { llm }
    }

    pub fn build_prompt(&self, question: &str) -> String {
        format!(
            "Your task is to classify a user question into one of three categories: '{}', '{}' or '{}'.\n\
            Reply only with the category word. Do not add any other word or punctuation.\n\
            - Use '{}' for questions about the company, its policies, finances, reports, governance or code of conduct.\n\
            - Use '{}' for questions involving explicit mathematical calculations.\n\
            - Use '{}' for greetings, general questions or anything else.\n\
            User question:\n\
            {}\n\
            Category:",
            Intent::DocumentSearch,
            Intent::Calculation,
            Intent::General,
            Intent::DocumentSearch,
            Intent::Calculation,
            Intent::General,
            question
        )
    }

    /// Classify the question; unrecognised replies route to [`Intent::General`]
    pub async fn route(&self, question: &str) -> Result<Intent> {
        let config = GenerationConfig {
            model_id: self.llm.model_id().to_string(),
            max_tokens: 16,
            temperature: Some(0.0),
            ..Default::default()
        };

        let result = self
            .llm
            .generate_with_config(&self.build_prompt(question), &config)
            .await?;

        let intent = Intent::from_model_output(&result.text);
        tracing::info!(intent = %intent, raw = %result.text.trim(), "routed question");
        Ok(intent)
    }
}
