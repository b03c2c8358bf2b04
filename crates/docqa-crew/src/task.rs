//! Crew tasks and their outputs

use serde::{Deserialize, Serialize};

/// One unit of work assigned to an agent.
///
/// `agent` indexes the crew's agents; `context` lists earlier tasks whose
/// outputs are handed to this one.
#[derive(Debug, Clone)]
pub struct Task {
    pub description: String,
    pub expected_output: String,
    pub agent: usize,
    pub context: Vec<usize>,
}

impl Task {
    pub fn new(description: impl Into<String>, expected_output: impl Into<String>, agent: usize) -> Self {
        Self {
            description: description.into(),
            expected_output: expected_output.into(),
            agent,
            context: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: &[usize]) -> Self {
        self.context = context.to_vec();
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskOutput {
    pub agent_role: String,
    pub description: String,
    pub raw: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrewOutput {
    pub tasks: Vec<TaskOutput>,
}

impl CrewOutput {
    /// Output of the last task
    pub fn final_output(&self) -> &str {
        self.tasks.last().map(|t| t.raw.as_str()).unwrap_or_default()
    }
}
