//! Routing and handler tests against scripted collaborators

#[cfg(test)]
mod assistant_tests {
    use std::sync::Arc;

    use crate::testing::{CannedRag, ScriptedLlm};
    use crate::{Assistant, Error, ExpressionError, Intent, IntentRouter, Outcome};

    const ROUTER_NEEDLE: &str = "Category:";
    const CALCULATOR_NEEDLE: &str = "arithmetic expression";

    #[tokio::test]
    async fn test_percentage_question_is_calculated() {
        let llm = Arc::new(
            ScriptedLlm::new()
                .on(ROUTER_NEEDLE, "calculation")
                .on(CALCULATOR_NEEDLE, "0.15 * 5000"),
        );
        let rag = CannedRag::new("unused");
        let assistant = Assistant::new(llm.clone(), rag);

        let response = assistant.respond("what is 15% of 5000").await.unwrap();

        assert_eq!(response.intent, Intent::Calculation);
        match &response.outcome {
            Outcome::Calculation(calculation) => {
                assert_eq!(calculation.expression, "0.15 * 5000");
                assert_eq!(calculation.value.to_string(), "750.0");
            }
            other => panic!("expected a calculation, got {:?}", other),
        }
        assert_eq!(response.text(), "The result is: 750.0");
        assert_eq!(assistant.rag().calls(), 0);
    }

    #[tokio::test]
    async fn test_document_question_uses_rag() {
        let llm = Arc::new(ScriptedLlm::new().on(ROUTER_NEEDLE, "document_search"));
        let assistant = Assistant::new(llm, CannedRag::new("Employees must act with integrity."));

        let response = assistant
            .respond("What is the company's code of conduct policy?")
            .await
            .unwrap();

        assert_eq!(response.intent, Intent::DocumentSearch);
        assert_eq!(response.text(), "Employees must act with integrity.");
        assert!(matches!(response.outcome, Outcome::Documents(_)));
        assert_eq!(assistant.rag().calls(), 1);
    }

    #[tokio::test]
    async fn test_unrecognised_label_falls_back_to_general() {
        let llm = Arc::new(
            ScriptedLlm::new()
                .on(ROUTER_NEEDLE, "I think this is small talk")
                .on("hello there", "Hi! How can I help?"),
        );
        let assistant = Assistant::new(llm.clone(), CannedRag::new("unused"));

        let response = assistant.respond("hello there").await.unwrap();

        assert_eq!(response.intent, Intent::General);
        assert_eq!(response.text(), "Hi! How can I help?");
        // the general handler sends the raw input
        assert_eq!(llm.prompts().last().unwrap(), "hello there");
    }

    #[tokio::test]
    async fn test_source_language_label_is_accepted() {
        let llm = Arc::new(ScriptedLlm::new().on(ROUTER_NEEDLE, "'pesquisa_documentos'"));
        let router = IntentRouter::new(llm);
        assert_eq!(router.route("qual o código de conduta?").await.unwrap(), Intent::DocumentSearch);
    }

    #[tokio::test]
    async fn test_unsafe_expression_is_rejected() {
        let llm = Arc::new(
            ScriptedLlm::new()
                .on(ROUTER_NEEDLE, "calculation")
                .on(CALCULATOR_NEEDLE, "__import__('os').system('ls')"),
        );
        let assistant = Assistant::new(llm, CannedRag::new("unused"));

        let result = assistant.respond("run ls for me").await;
        assert!(matches!(
            result,
            Err(Error::Expression(ExpressionError::UnexpectedChar { ch: '_', pos: 0 }))
        ));
    }

    #[tokio::test]
    async fn test_router_failure_propagates() {
        let assistant = Assistant::new(Arc::new(ScriptedLlm::new()), CannedRag::new("unused"));
        assert!(matches!(
            assistant.respond("anything").await,
            Err(Error::Generation(_))
        ));
    }

    #[test]
    fn test_router_prompt_snapshot() {
        let router = IntentRouter::new(Arc::new(ScriptedLlm::new()));
        insta::assert_snapshot!(router.build_prompt("hello"), @r###"
        Your task is to classify a user question into one of three categories: 'document_search', 'calculation' or 'general'.
        Reply only with the category word. Do not add any other word or punctuation.
        - Use 'document_search' for questions about the company, its policies, finances, reports, governance or code of conduct.
        - Use 'calculation' for questions involving explicit mathematical calculations.
        - Use 'general' for greetings, general questions or anything else.
        User question:
        hello
        Category:
        "###);
    }
}
