use super::ToolContext;
use crate::Tool;

use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Deserialize, JsonSchema, Debug)]
#[serde(rename = "recommend_trip")]
#[schemars(description = "Recommend a trip based on destination, budget, and duration.")]
pub struct RecommendTrip {
    #[schemars(description = "The destination city/country for the trip")]
    pub destination: String,

    #[schemars(description = "The total budget in USD")]
    #[serde(deserialize_with = "super::whole_number")]
    pub budget: u32,

    #[schemars(description = "Number of days for the trip")]
    #[serde(deserialize_with = "super::whole_number")]
    pub duration_days: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BudgetTier {
    Low,
    Medium,
    High,
}

impl BudgetTier {
    fn for_budget(budget: u32) -> Self {
        match budget {
            0..1000 => Self::Low,
            1000..3000 => Self::Medium,
            _ => Self::High,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

fn activities(destination: &str, tier: BudgetTier) -> Option<&'static str> {
    use BudgetTier::*;
    let activities = match (destination, tier) {
        ("paris", Low) => "Visit free museums, walk along Seine, picnic in parks",
        ("paris", Medium) => "Eiffel Tower, Louvre, Seine river cruise, local bistros",
        ("paris", High) => "Luxury hotels, Michelin restaurants, private tours, shopping",
        ("tokyo", Low) => "Temple visits, street food, public gardens, local markets",
        ("tokyo", Medium) => "Tokyo Skytree, traditional ryokan, sushi restaurants, theme parks",
        ("tokyo", High) => "Luxury hotels in Ginza, kaiseki dining, private cultural experiences",
        ("new york", Low) => "Central Park, free museums, food trucks, Brooklyn Bridge walk",
        ("new york", Medium) => "Broadway shows, Empire State Building, nice restaurants, shopping",
        ("new york", High) => "Luxury hotels, fine dining, helicopter tours, exclusive experiences",
        ("london", Low) => "Free museums, Hyde Park, Camden Market, pub food",
        ("london", Medium) => "Tower Bridge, West End shows, afternoon tea, historic tours",
        ("london", High) => "Luxury hotels, Michelin dining, private tours, exclusive experiences",
        _ => return None,
    };
    Some(activities)
}

impl Tool for RecommendTrip {
    type Context = ToolContext;

    fn apply(&self, _: Self::Context) -> String {
        let tier = BudgetTier::for_budget(self.budget);
        let destination = self.destination.trim().to_lowercase();
        match activities(&destination, tier) {
            Some(activities) => format!(
                "Trip recommendation for {} ({} days, ${} budget):\n{activities}",
                self.destination, self.duration_days, self.budget
            ),
            None => format!(
                "For {} with a ${} budget for {} days, I recommend researching local attractions, \
                 cultural sites, regional cuisine, and accommodation options that fit your budget tier ({}).",
                self.destination,
                self.budget,
                self.duration_days,
                tier.label()
            ),
        }
    }
}
