//! End-to-end pipeline tests against scripted collaborators

#[cfg(test)]
mod pipeline_tests {
    use std::sync::Arc;

    use crate::testing::{ScriptedLlm, StaticStore, TableReranker};
    use crate::{Error, NOT_FOUND_ANSWER, RagEngine, RagPipeline, RetrievalConfig};

    const QUESTION: &str = "What is the company's code of conduct policy?";

    fn expanding_llm(answer: &str) -> ScriptedLlm {
        ScriptedLlm::new()
            .on(
                "alternative versions",
                "1. What does the code of conduct say?\n2. Which conduct rules apply to employees?\n3. What is the ethics policy?\n",
            )
            .on("Precise answer:", answer)
    }

    fn conduct_store() -> StaticStore {
        StaticStore::new()
            .with_hits(
                QUESTION,
                &[
                    "The code of conduct applies to all employees and directors.",
                    "Revenue grew 4% in the third quarter.",
                ],
            )
            .with_hits(
                "What does the code of conduct say?",
                &[
                    "The code of conduct applies to all employees and directors.",
                    "Conflicts of interest must be reported to compliance.",
                ],
            )
            .with_hits(
                "Which conduct rules apply to employees?",
                &[
                    "Gifts above a set value must be declared.",
                    "Conflicts of interest must be reported to compliance.",
                ],
            )
            .with_hits(
                "What is the ethics policy?",
                &[
                    "The ethics committee reviews reported violations.",
                    "Board meetings take place monthly.",
                ],
            )
    }

    fn conduct_reranker() -> TableReranker {
        TableReranker::new(&[
            ("The code of conduct applies to all employees and directors.", 9.1),
            ("Conflicts of interest must be reported to compliance.", 7.4),
            ("Gifts above a set value must be declared.", 6.2),
            ("The ethics committee reviews reported violations.", 5.0),
            ("Board meetings take place monthly.", -2.0),
            ("Revenue grew 4% in the third quarter.", -6.5),
        ])
    }

    fn scenario_config() -> RetrievalConfig {
        RetrievalConfig::default().with_top_n(4)
    }

    #[tokio::test]
    async fn test_code_of_conduct_question_selects_top_four() {
        let llm = Arc::new(expanding_llm("All employees must follow the code of conduct."));
        let pipeline = RagPipeline::new(
            llm.clone(),
            Arc::new(conduct_store()),
            Arc::new(conduct_reranker()),
            scenario_config(),
        );

        let answer = pipeline.answer(QUESTION).await.unwrap();

        assert!(answer.retrieval.variants.len() <= 4);
        assert_eq!(answer.retrieval.variants[0], QUESTION);
        assert_eq!(answer.retrieval.candidates, 6);

        let selected: Vec<&str> = answer
            .retrieval
            .passages
            .iter()
            .map(|s| s.passage.content.as_str())
            .collect();
        insta::assert_yaml_snapshot!(selected, @r###"
        - The code of conduct applies to all employees and directors.
        - Conflicts of interest must be reported to compliance.
        - Gifts above a set value must be declared.
        - The ethics committee reviews reported violations.
        "###);

        assert_eq!(answer.answer, "All employees must follow the code of conduct.");

        // the generation prompt carries only the selected passages
        let prompts = llm.prompts();
        let generation_prompt = prompts.last().unwrap();
        assert!(generation_prompt.contains("Gifts above a set value must be declared."));
        assert!(!generation_prompt.contains("Revenue grew"));
    }

    #[tokio::test]
    async fn test_no_hits_still_reaches_generation() {
        let llm = Arc::new(expanding_llm(NOT_FOUND_ANSWER));
        let reranker = Arc::new(TableReranker::new(&[]));
        let pipeline = RagPipeline::new(
            llm.clone(),
            Arc::new(StaticStore::new()),
            reranker.clone(),
            scenario_config(),
        );

        let answer = pipeline.answer(QUESTION).await.unwrap();

        assert_eq!(answer.answer, NOT_FOUND_ANSWER);
        assert_eq!(answer.retrieval.candidates, 0);
        assert!(answer.retrieval.passages.is_empty());
        assert_eq!(reranker.calls(), 0);
        assert_eq!(llm.prompts().len(), 2);
    }

    #[tokio::test]
    async fn test_generation_prompt_snapshot() {
        let llm = Arc::new(expanding_llm("ok"));
        let store = StaticStore::new().with_hits(QUESTION, &["Employees must act with integrity."]);
        let pipeline = RagPipeline::new(
            llm.clone(),
            Arc::new(store),
            Arc::new(TableReranker::new(&[])),
            scenario_config(),
        );

        pipeline.answer(QUESTION).await.unwrap();

        let prompts = llm.prompts();
        insta::assert_snapshot!(prompts.last().unwrap(), @r###"
        You are a highly qualified research assistant. Answer the user's question precisely and concisely, based strictly on the context provided.
        Analyse every context excerpt below before writing your answer.
        If the required information is not present in any of the excerpts, reply exactly: 'Based on the provided documents, I could not find the requested information.'
        Do not use any prior knowledge.

        Context:
        1. [static.pdf p.1] Employees must act with integrity.
        Question:
        What is the company's code of conduct policy?

        Precise answer:
        "###);
    }

    #[tokio::test]
    async fn test_expansion_failure_is_generation_error() {
        let pipeline = RagPipeline::new(
            Arc::new(ScriptedLlm::new()),
            Arc::new(conduct_store()),
            Arc::new(conduct_reranker()),
            scenario_config(),
        );

        let result = pipeline.answer(QUESTION).await;
        assert!(matches!(result, Err(Error::Generation(_))));
    }

    #[tokio::test]
    async fn test_retrieval_failure_is_retrieval_error() {
        let pipeline = RagPipeline::new(
            Arc::new(expanding_llm("unused")),
            Arc::new(StaticStore::failing()),
            Arc::new(conduct_reranker()),
            scenario_config(),
        );

        let result = pipeline.retrieve(QUESTION).await;
        assert!(matches!(result, Err(Error::Retrieval(_))));
    }
}
