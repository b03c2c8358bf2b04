//! Routed assistant holding every long-lived collaborator

use std::sync::Arc;

use docqa_core::{Intent, LLMProvider, RagAnswer, RagEngine, Result};

use crate::calculator::{Calculation, Calculator};
use crate::router::IntentRouter;

/// What a handler produced for one question
#[derive(Debug, Clone)]
pub enum Outcome {
    Documents(RagAnswer),
    Calculation(Calculation),
    General(String),
}

#[derive(Debug, Clone)]
pub struct Response {
    pub intent: Intent,
    pub outcome: Outcome,
}

impl Response {
    /// Text shown to the user as the final answer
    pub fn text(&self) -> String {
        match &self.outcome {
            Outcome::Documents(answer) => answer.answer.clone(),
            Outcome::Calculation(calculation) => calculation.answer(),
            Outcome::General(text) => text.clone(),
        }
    }
}

/// Explicitly initialised context: model, router, RAG engine and calculator.
///
/// Built once at start-up and only read afterwards.
pub struct Assistant<L: LLMProvider, R: RagEngine> {
    llm: Arc<L>,
    router: IntentRouter<L>,
    calculator: Calculator<L>,
    rag: R,
}

impl<L: LLMProvider, R: RagEngine> Assistant<L, R> {
    pub fn new(llm: Arc<L>, rag: R) -> Self {
        Self {
            router: IntentRouter::new(llm.clone()),
            calculator: Calculator::new(llm.clone()),
            llm,
            rag,
        }
    }

    pub fn rag(&self) -> &R {
        &self.rag
    }

    /// Route one question and run the matching handler
    pub async fn respond(&self, question: &str) -> Result<Response> {
        let intent = self.router.route(question).await?;
        self.dispatch(intent, question).await
    }

    pub async fn dispatch(&self, intent: Intent, question: &str) -> Result<Response> {
        let outcome = match intent {
            Intent::DocumentSearch => Outcome::Documents(self.rag.answer(question).await?),
            Intent::Calculation => Outcome::Calculation(self.calculator.calculate(question).await?),
            Intent::General => Outcome::General(self.general(question).await?),
        };

        Ok(Response { intent, outcome })
    }

    /// Raw input straight to the model
    async fn general(&self, question: &str) -> Result<String> {
        let result = self.llm.generate(question).await?;
        Ok(result.text.trim().to_string())
    }
}
