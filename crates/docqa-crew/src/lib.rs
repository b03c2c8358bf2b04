//! Sequential multi-agent crew for docqa
//!
//! Agents with roles and optional tools, tasks chained through context, a
//! Serper web search tool, an on-disk completion cache and the trip-planning
//! crew built from them.

mod agent;
mod cache;
mod crew;
mod render;
mod task;
mod tools;
mod travel;


pub use agent::Agent;
pub use cache::CachedProvider;
pub use crew::Crew;
pub use render::render_markdown;
pub use task::{CrewOutput, Task, TaskOutput};
pub use tools::{SerperSearchTool, Tool, coerce_query};
pub use travel::travel_crew;

pub use docqa_core::{Error, Result};
