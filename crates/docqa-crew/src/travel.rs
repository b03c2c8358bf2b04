//! Trip-planning crew: destination research, local food, itinerary

use std::sync::Arc;

use docqa_core::{Error, LLMProvider, Result};

use crate::agent::Agent;
use crate::crew::Crew;
use crate::task::Task;
use crate::tools::Tool;

/// Three agents and three chained tasks for a `days`-day trip to `city`.
///
/// The researcher and the food specialist receive `search` when given.
pub fn travel_crew<L: LLMProvider>(
    llm: Arc<L>,
    city: &str,
    days: u32,
    search: Option<Arc<dyn Tool>>,
) -> Result<Crew<L>> {
    let city = city.trim();
    if city.is_empty() {
        return Err(Error::InvalidInput("City must not be empty".to_string()));
    }
    if days == 0 {
        return Err(Error::InvalidInput("A trip needs at least one day".to_string()));
    }

    let with_search = |agent: Agent| match &search {
        Some(tool) => agent.with_tool(tool.clone()),
        None => agent,
    };

    let mut crew = Crew::new(llm);

    let researcher = crew.add_agent(with_search(Agent::new(
        "Tourist Destination Researcher",
        "Find the most interesting attractions and cultural events for a specific city.",
        "You are an experienced researcher, a master at using the internet to uncover hidden \
        gems and must-see sights in any city in the world.",
    )));
    let food_critic = crew.add_agent(with_search(Agent::new(
        "Local Food Specialist",
        "Discover the best and most authentic dining experiences in a city.",
        "With a refined palate and a nose for good food, you are the definitive guide to \
        everything from traditional taverns to Michelin-starred restaurants.",
    )));
    let concierge = crew.add_agent(Agent::new(
        "Travel Concierge",
        "Create a detailed day-by-day itinerary that is practical, exciting and well organised.",
        "You are a meticulous trip planner who turns scattered information into a perfect \
        itinerary, balancing activities, rest and food.",
    ));

    let city_research = crew.add_task(Task::new(
        format!(
            "Research the city of {}. Focus on historic monuments, museums, parks and cultural \
            events happening in the coming months. Summarise the top 5 places not to miss.",
            city
        ),
        "A paragraph summarising the city and a list of 5 must-see places with a short description of each.",
        researcher,
    ));

    let food_research = crew.add_task(
        Task::new(
            format!(
                "Based on the information about {}, find 5 restaurants offering an authentic local \
                experience. Include one budget option, one mid-range and one upscale. Describe the \
                food and what makes each place special.",
                city
            ),
            "A list of 5 restaurants with name, price range, cuisine and a short descriptive paragraph for each.",
            food_critic,
        )
        .with_context(&[city_research]),
    );

    let headers: Vec<String> = (1..=days).map(|day| format!("Day {}", day)).collect();
    crew.add_task(
        Task::new(
            format!(
                "Using the attraction and restaurant research, create a detailed {}-day itinerary \
                for {}. Organise the activities by day (Morning, Afternoon, Evening). Make sure the \
                itinerary is logical in terms of location and includes lunch and dinner suggestions \
                for each day.",
                days, city
            ),
            format!(
                "A complete itinerary formatted in Markdown, with headers for {}, and subsections \
                for Morning, Afternoon and Evening.",
                headers.join(", ")
            ),
            concierge,
        )
        .with_context(&[city_research, food_research]),
    );

    Ok(crew)
}
