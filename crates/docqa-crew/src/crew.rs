//! Sequential crew execution

use serde_json::json;
use std::sync::Arc;
use std::time::Instant;

use docqa_core::{Error, GenerationConfig, LLMProvider, Result};

use crate::agent::Agent;
use crate::task::{CrewOutput, Task, TaskOutput};

/// Agents and tasks run one after another against a single model
pub struct Crew<L: LLMProvider> {
    llm: Arc<L>,
    agents: Vec<Agent>,
    tasks: Vec<Task>,
    max_tokens: u32,
}

impl<L: LLMProvider> Crew<L> {
    pub fn new(llm: Arc<L>) -> Self {
        Self {
            llm,
            agents: Vec::new(),
            tasks: Vec::new(),
            max_tokens: 1024,
        }
    }

    /// Register an agent and return its index for tasks
    pub fn add_agent(&mut self, agent: Agent) -> usize {
        self.agents.push(agent);
        self.agents.len() - 1
    }

    /// Register a task and return its index for later context references
    pub fn add_task(&mut self, task: Task) -> usize {
        self.tasks.push(task);
        self.tasks.len() - 1
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Every task must name an existing agent and only earlier tasks as context
    pub fn validate(&self) -> Result<()> {
        if self.tasks.is_empty() {
            return Err(Error::InvalidInput("Crew has no tasks".to_string()));
        }

        for (index, task) in self.tasks.iter().enumerate() {
            if task.agent >= self.agents.len() {
                return Err(Error::InvalidInput(format!(
                    "Task {} is assigned to unknown agent {}",
                    index, task.agent
                )));
            }
            if let Some(&reference) = task.context.iter().find(|&&c| c >= index) {
                return Err(Error::InvalidInput(format!(
                    "Task {} uses task {} as context, but only earlier tasks can be referenced",
                    index, reference
                )));
            }
        }

        Ok(())
    }

    pub fn build_prompt(&self, task: &Task, outputs: &[TaskOutput], notes: &str) -> String {
        let agent = &self.agents[task.agent];
        let mut prompt = agent.preamble();

        prompt.push_str(&format!("\n\nCurrent task: {}\n", task.description.trim()));

        if !task.context.is_empty() {
            prompt.push_str("\nThis is the context you are working with:\n");
            for &reference in &task.context {
                let output = &outputs[reference];
                prompt.push_str(&format!("--- {} ---\n{}\n", output.agent_role, output.raw.trim()));
            }
        }

        if !notes.is_empty() {
            prompt.push_str(&format!("\nResearch notes:\n{}\n", notes.trim()));
        }

        prompt.push_str(&format!(
            "\nThis is the expected criteria for your final answer: {}\n\
            You MUST return the actual complete content as the final answer, not a summary.\n\
            \n\
            Final answer:",
            task.expected_output.trim()
        ));

        prompt
    }

    /// Run every tool of the task's agent with the task description as input
    async fn gather_notes(&self, task: &Task) -> String {
        let agent = &self.agents[task.agent];
        let input = json!({ "description": task.description });
        let mut notes = Vec::new();

        for tool in &agent.tools {
            match tool.run(&input).await {
                Ok(output) => notes.push(format!("[{}]\n{}", tool.name(), output.trim())),
                Err(e) => tracing::warn!(tool = tool.name(), error = %e, "tool failed, continuing without it"),
            }
        }

        notes.join("\n\n")
    }

    /// Run all tasks in order, feeding context outputs forward
    pub async fn kickoff(&self) -> Result<CrewOutput> {
        self.validate()?;

        let config = GenerationConfig {
            model_id: self.llm.model_id().to_string(),
            max_tokens: self.max_tokens,
            ..Default::default()
        };
        let mut outputs: Vec<TaskOutput> = Vec::with_capacity(self.tasks.len());

        for (index, task) in self.tasks.iter().enumerate() {
            let agent = &self.agents[task.agent];
            let started = Instant::now();
            tracing::info!(task = index + 1, agent = %agent.role, "starting task");

            let notes = self.gather_notes(task).await;
            let prompt = self.build_prompt(task, &outputs, &notes);
            let result = self.llm.generate_with_config(&prompt, &config).await?;

            tracing::info!(
                task = index + 1,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "finished task"
            );
            outputs.push(TaskOutput {
                agent_role: agent.role.clone(),
                description: task.description.clone(),
                raw: result.text.trim().to_string(),
            });
        }

        Ok(CrewOutput { tasks: outputs })
    }
}
