//! Crew agents

use std::fmt;
use std::sync::Arc;

use crate::tools::Tool;

/// A role-played persona with optional tools
#[derive(Clone)]
pub struct Agent {
    pub role: String,
    pub goal: String,
    pub backstory: String,
    pub tools: Vec<Arc<dyn Tool>>,
}

impl Agent {
    pub fn new(role: impl Into<String>, goal: impl Into<String>, backstory: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            goal: goal.into(),
            backstory: backstory.into(),
            tools: Vec::new(),
        }
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    /// System preamble opening every prompt this agent sends
    pub fn preamble(&self) -> String {
        let mut preamble = format!(
            "You are {}. {}\nYour personal goal is: {}",
            self.role,
            self.backstory.trim(),
            self.goal
        );

        if !self.tools.is_empty() {
            preamble.push_str("\nTools that prepared your research notes:");
            for tool in &self.tools {
                preamble.push_str(&format!("\n- {}: {}", tool.name(), tool.description()));
            }
        }

        preamble
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tools: Vec<&str> = self.tools.iter().map(|t| t.name()).collect();
        f.debug_struct("Agent")
            .field("role", &self.role)
            .field("goal", &self.goal)
            .field("tools", &tools)
            .finish()
    }
}
