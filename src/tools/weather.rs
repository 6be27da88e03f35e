use super::ToolContext;
use crate::AsyncTool;

use anyhow::Context as _;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

pub const DEFAULT_WEATHER_URL: &str = "https://api.open-meteo.com";
const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,wind_speed_10m,weather_code";

/// Thin client for the Open-Meteo forecast endpoint.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    http: reqwest::Client,
    base_url: String,
}

impl Default for WeatherClient {
    fn default() -> Self {
        Self::new(DEFAULT_WEATHER_URL)
    }
}

impl WeatherClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn current(&self, latitude: f64, longitude: f64) -> anyhow::Result<Value> {
        let url = format!("{}/v1/forecast", self.base_url);
        debug!(%url, latitude, longitude, "Fetching current weather");
        let response = self
            .http
            .get(&url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("current", CURRENT_FIELDS.to_string()),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await
            .context("request failed")?
            .error_for_status()?;
        let body = response.json::<Value>().await.context("invalid response body")?;
        Ok(summarize(latitude, longitude, &body))
    }
}

/// Reduces a forecast response to the fields the assistant cares about.
pub fn summarize(latitude: f64, longitude: f64, forecast: &Value) -> Value {
    let current = &forecast["current"];
    json!({
        "location": format!("{latitude}, {longitude}"),
        "temperature": current["temperature_2m"],
        "humidity": current["relative_humidity_2m"],
        "wind_speed": current["wind_speed_10m"],
        "weather_code": current["weather_code"],
        "time": current["time"],
        "units": forecast.get("current_units").cloned().unwrap_or_else(|| json!({})),
    })
}

#[derive(Deserialize, JsonSchema, Debug)]
#[serde(rename = "get_weather")]
#[schemars(description = "Gets current weather information for the given coordinates.")]
pub struct GetWeather {
    #[schemars(description = "The latitude coordinate")]
    pub latitude: f64,

    #[schemars(description = "The longitude coordinate")]
    pub longitude: f64,
}

#[async_trait]
impl AsyncTool for GetWeather {
    type Context = ToolContext;

    async fn apply(&self, context: Self::Context) -> anyhow::Result<String> {
        let report = match context.weather.current(self.latitude, self.longitude).await {
            Ok(report) => report,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "Weather lookup failed");
                json!({ "error": format!("Failed to fetch weather data: {err:#}") })
            }
        };
        Ok(report.to_string())
    }
}
