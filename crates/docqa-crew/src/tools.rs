//! Tools agents can call before answering

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::env;
use std::time::Duration;

use docqa_core::{Error, Result};

/// Something an agent runs to gather notes for its task
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Run with loosely shaped input (a string or a JSON object)
    async fn run(&self, input: &Value) -> Result<String>;
}

/// Pull a search query out of tool input.
///
/// Models sometimes hand the tool its whole task object instead of a string,
/// so objects are searched for `description` and then `search_query`.
pub fn coerce_query(input: &Value) -> Option<String> {
    let query = match input {
        Value::String(text) => text.as_str(),
        Value::Object(map) => ["description", "search_query"]
            .iter()
            .filter_map(|key| map.get(*key).and_then(Value::as_str))
            .find(|text| !text.trim().is_empty())?,
        _ => return None,
    };

    let query = query.trim();
    (!query.is_empty()).then(|| query.to_string())
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    q: &'a str,
    num: usize,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default, rename = "answerBox")]
    pub answer_box: Option<AnswerBox>,
    #[serde(default)]
    pub organic: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnswerBox {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrganicResult {
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub snippet: String,
}

/// Google search through the Serper API
pub struct SerperSearchTool {
    client: Client,
    api_key: String,
    endpoint: String,
    num_results: usize,
}

impl SerperSearchTool {
    pub const ENDPOINT: &'static str = "https://google.serper.dev/search";

    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: Self::ENDPOINT.to_string(),
            num_results: 5,
        })
    }

    /// Read the key from `SERPER_API_KEY`
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let api_key = env::var("SERPER_API_KEY")
            .map_err(|_| Error::Configuration("SERPER_API_KEY not set".to_string()))?;
        Self::new(api_key)
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_num_results(mut self, num_results: usize) -> Self {
        self.num_results = num_results.max(1);
        self
    }

    pub async fn search(&self, query: &str) -> Result<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .json(&SearchRequest {
                q: query,
                num: self.num_results,
            })
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::Network(format!(
                "Search request failed with status {}: {}",
                status, error_text
            )));
        }

        let results: SearchResponse = response
            .json()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))?;

        tracing::debug!(query, organic = results.organic.len(), "web search");
        Ok(format_results(&results, self.num_results))
    }
}

#[async_trait]
impl Tool for SerperSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Searches the internet and returns the top results with titles, links and snippets"
    }

    async fn run(&self, input: &Value) -> Result<String> {
        let query = coerce_query(input)
            .ok_or_else(|| Error::InvalidInput(format!("No search query in tool input: {}", input)))?;
        self.search(&query).await
    }
}

pub(crate) fn format_results(results: &SearchResponse, limit: usize) -> String {
    let mut formatted = String::new();

    if let Some(answer) = results
        .answer_box
        .as_ref()
        .and_then(|b| b.answer.as_deref().or(b.snippet.as_deref()))
    {
        formatted.push_str(&format!("Answer: {}\n\n", answer.trim()));
    }

    for result in results.organic.iter().take(limit) {
        formatted.push_str(&format!(
            "Title: {}\nLink: {}\nSnippet: {}\n---\n",
            result.title.trim(),
            result.link.trim(),
            result.snippet.trim()
        ));
    }

    if formatted.is_empty() {
        formatted.push_str("No results found.");
    }

    formatted
}
