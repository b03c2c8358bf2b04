//! Calculator handler: natural language → arithmetic expression → value

use std::sync::Arc;

use docqa_core::{GenerationConfig, LLMProvider, Result};

use crate::expression::{Value, evaluate};

/// Outcome of one calculator turn
#[derive(Debug, Clone)]
pub struct Calculation {
    pub expression: String,
    pub value: Value,
}

impl Calculation {
    pub fn answer(&self) -> String {
        format!("The result is: {}", self.value)
    }
}

/// Translates a question into an expression and evaluates it safely
pub struct Calculator<L: LLMProvider> {
    llm: Arc<L>,
}

impl<L: LLMProvider> Calculator<L> {
    pub fn new(llm: Arc<L>) -> Self {
        Self { llm }
    }

    pub fn build_prompt(&self, question: &str) -> String {
        format!(
            "Your task is to translate the user's question into a single arithmetic expression.\n\
            Reply only with the expression. Do not add explanations, code fences or the word 'python'.\n\
            \n\
            Examples:\n\
            Question: what is 5 plus 3?\n\
            Answer: 5 + 3\n\
            \n\
            Question: 15% of 5000\n\
            Answer: 0.15 * 5000\n\
            \n\
            Question: what is the square root of 81?\n\
            Answer: 81**0.5\n\
            \n\
            Question: {}\n\
            Answer:",
            question
        )
    }

    /// Ask the model for an expression
    pub async fn translate(&self, question: &str) -> Result<String> {
        let config = GenerationConfig {
            model_id: self.llm.model_id().to_string(),
            max_tokens: 64,
            temperature: Some(0.0),
            ..Default::default()
        };

        let result = self
            .llm
            .generate_with_config(&self.build_prompt(question), &config)
            .await?;

        let expression = extract_expression(&result.text);
        tracing::info!(expression = %expression, "translated calculation");
        Ok(expression)
    }

    pub async fn calculate(&self, question: &str) -> Result<Calculation> {
        let expression = self.translate(question).await?;
        let value = evaluate(&expression)?;
        Ok(Calculation { expression, value })
    }
}

/// First non-empty line of a completion, without code fences or backticks
pub fn extract_expression(output: &str) -> String {
    let line = output
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with("```"))
        .find(|line| !line.is_empty())
        .unwrap_or_default();

    let line = line.trim_matches('`').trim();
    line.strip_prefix("Answer:").unwrap_or(line).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_expression_plain() {
        assert_eq!(extract_expression("0.15 * 5000"), "0.15 * 5000");
        assert_eq!(extract_expression("  81**0.5\n"), "81**0.5");
    }

    #[test]
    fn test_extract_expression_strips_fences_and_backticks() {
        assert_eq!(extract_expression("```python\n5 + 3\n```"), "5 + 3");
        assert_eq!(extract_expression("`12 / 4`"), "12 / 4");
        assert_eq!(extract_expression("\n\nAnswer: 2 ** 10"), "2 ** 10");
    }

    #[test]
    fn test_extract_expression_empty() {
        assert_eq!(extract_expression(""), "");
        assert_eq!(extract_expression("```\n```"), "");
    }

    #[test]
    fn test_calculation_answer_format() {
        let calculation = Calculation {
            expression: "0.15 * 5000".to_string(),
            value: Value::Float(750.0),
        };
        assert_eq!(calculation.answer(), "The result is: 750.0");
    }
}
