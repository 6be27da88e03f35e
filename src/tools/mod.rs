//! The travel-assistant tools served by `wayfarer-tools` and the in-process provider.

mod book_transportation;
mod book_trip;
mod greet;
mod recommend_trip;
pub mod store;
mod weather;

use crate::types::{AsyncToolSet, SyncToolSet, ToolSetCreationError};

use serde::de::{Deserialize, Deserializer, Error as _};

pub use book_transportation::BookTransportation;
pub use book_trip::BookTrip;
pub use greet::Greet;
pub use recommend_trip::RecommendTrip;
pub use store::BookingStore;
pub use weather::{DEFAULT_WEATHER_URL, GetWeather, WeatherClient};

/// State shared by every travel tool invocation.
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub store: BookingStore,
    pub weather: WeatherClient,
}

impl ToolContext {
    pub fn new(store: BookingStore, weather: WeatherClient) -> Self {
        Self { store, weather }
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Self::new(
            BookingStore::new(std::env::temp_dir().join("wayfarer-unused")),
            WeatherClient::default(),
        )
    }
}

/// Accepts `2000` as well as `2000.0`; models sometimes send whole numbers as floats.
pub(crate) fn whole_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if value.fract() != 0.0 || value < 0.0 || value > f64::from(u32::MAX) {
        return Err(D::Error::custom(format!(
            "expected a non-negative whole number, got {value}"
        )));
    }
    Ok(value as u32)
}

pub fn travel_toolset() -> Result<AsyncToolSet<ToolContext>, ToolSetCreationError> {
    SyncToolSet::new()
        .add_tool::<Greet>()?
        .add_tool::<RecommendTrip>()?
        .add_tool::<BookTrip>()?
        .add_tool::<BookTransportation>()?
        .into_async()
        .add_tool::<GetWeather>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toolset_lists_tools_in_registration_order() {
        let toolset = travel_toolset().expect("travel tools validate");
        let names: Vec<_> = toolset
            .descriptors()
            .into_iter()
            .map(|descriptor| descriptor.name)
            .collect();
        assert_eq!(
            names,
            [
                "greet",
                "recommend_trip",
                "book_trip",
                "book_transportation",
                "get_weather"
            ]
        );
    }

    #[tokio::test]
    async fn whole_floats_are_accepted_as_integers() {
        let dir = tempfile::tempdir().expect("tempdir");
        let context = ToolContext::new(BookingStore::new(dir.path()), WeatherClient::default());
        let toolset = travel_toolset().expect("travel tools validate");

        let booked = toolset
            .try_tool_call(
                context.clone(),
                "book_trip",
                r#"{"traveler_name":"Jane","destination":"Paris","start_date":"2025-06-01","end_date":"2025-06-10","budget":2000.0}"#,
            )
            .await
            .expect("whole float budget deserializes")
            .expect("tool succeeds");
        assert!(booked.contains("Budget: $2000"));

        let recommended = toolset
            .try_tool_call(
                context.clone(),
                "recommend_trip",
                r#"{"destination":"Tokyo","budget":500,"duration_days":4.0}"#,
            )
            .await
            .expect("whole float duration deserializes")
            .expect("tool succeeds");
        assert!(recommended.contains("(4 days, $500 budget)"));

        for budget in ["2000.5", "-10"] {
            let arguments = format!(
                r#"{{"destination":"Tokyo","budget":{budget},"duration_days":4}}"#
            );
            assert!(matches!(
                toolset.try_tool_call(context.clone(), "recommend_trip", &arguments).await,
                Err(crate::types::ToolCallError::Deserialization(_))
            ));
        }
    }

    #[test]
    fn book_trip_schema_requires_every_field() {
        let toolset = travel_toolset().expect("travel tools validate");
        let book_trip = toolset
            .descriptors()
            .into_iter()
            .find(|descriptor| descriptor.name == "book_trip")
            .expect("book_trip registered");
        let required = book_trip.parameter_schema["required"]
            .as_array()
            .expect("required list");
        assert_eq!(required.len(), 5);
        assert_eq!(book_trip.parameter_schema["properties"]["budget"]["type"], "integer");
    }
}
