//! Current weather lookup via Open-Meteo (no API key needed).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{Tool, ToolError};

const GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// Look up current conditions for a place name.
pub struct Weather {
    client: Client,
}

impl Weather {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    async fn geocode(&self, location: &str) -> Result<Place, ToolError> {
        let url = format!(
            "{}?name={}&count=1",
            GEOCODING_URL,
            urlencoding::encode(location)
        );
        let response: GeocodingResponse = self.get_json(&url).await?;

        response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| ToolError::Execution(format!("Location not found: {}", location)))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, ToolError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ToolError::Execution(format!("Weather request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ToolError::Execution(format!(
                "Weather service returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ToolError::Execution(format!("Invalid weather response: {}", e)))
    }
}

impl Default for Weather {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for Weather {
    fn name(&self) -> &str {
        "weather"
    }

    fn description(&self) -> &str {
        "Look up the weather in a given location"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "location": {
                    "type": "string",
                    "description": "The location to get the weather for"
                }
            },
            "required": ["location"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value, ToolError> {
        let location = args["location"]
            .as_str()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'location' argument".into()))?;

        let place = self.geocode(location).await?;
        let url = format!(
            "{}?latitude={}&longitude={}&current=temperature_2m,weather_code",
            FORECAST_URL, place.latitude, place.longitude
        );
        let forecast: ForecastResponse = self.get_json(&url).await?;

        let display_name = match &place.country {
            Some(country) => format!("{}, {}", place.name, country),
            None => place.name.clone(),
        };

        Ok(json!({
            "location": display_name,
            "temperature": forecast.current.temperature_2m,
            "unit": "°C",
            "conditions": describe_weather_code(forecast.current.weather_code),
        }))
    }
}

/// WMO weather interpretation codes.
fn describe_weather_code(code: u32) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 | 48 => "Fog",
        51 | 53 | 55 => "Drizzle",
        56 | 57 => "Freezing drizzle",
        61 | 63 | 65 => "Rain",
        66 | 67 => "Freezing rain",
        71 | 73 | 75 | 77 => "Snow",
        80..=82 => "Rain showers",
        85 | 86 => "Snow showers",
        95 => "Thunderstorm",
        96 | 99 => "Thunderstorm with hail",
        _ => "Unknown",
    }
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Vec<Place>,
}

#[derive(Debug, Deserialize)]
struct Place {
    name: String,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentWeather,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    temperature_2m: f64,
    weather_code: u32,
}
