use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::http::{client, truncate_body};

const OPENWEATHERMAP_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Default language for weather descriptions.
pub const DEFAULT_LANG: &str = "ja";

/// Raw "current weather" payload, reduced to the fields the advisors read.
/// Every field is defaulted: the upstream occasionally omits keys and the
/// advisors prefer zeroed readings over a failed parse.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurrentWeather {
    #[serde(default)]
    pub weather: Vec<ConditionSummary>,
    #[serde(default)]
    pub main: MainReadings,
    #[serde(default)]
    pub wind: Wind,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConditionSummary {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MainReadings {
    #[serde(default)]
    pub temp: f64,
    #[serde(default)]
    pub feels_like: f64,
    #[serde(default)]
    pub humidity: u8,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Wind {
    #[serde(default)]
    pub speed: f64,
}

/// Raw 5-day/3-hour forecast payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForecastFeed {
    #[serde(default)]
    pub list: Vec<ForecastEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForecastEntry {
    /// Unix seconds, UTC.
    #[serde(default)]
    pub dt: i64,
    #[serde(default)]
    pub main: MainReadings,
    #[serde(default)]
    pub weather: Vec<ConditionSummary>,
    /// Probability of precipitation as a 0..1 fraction.
    #[serde(default)]
    pub pop: f64,
}

/// The weather feed the advisors consume. The production implementation is
/// [`OpenWeatherMapGateway`]; tests substitute canned or failing gateways.
#[async_trait]
pub trait WeatherGateway: Send + Sync + std::fmt::Debug {
    async fn current_weather(&self, city: &str) -> Result<CurrentWeather>;
    async fn forecast(&self, city: &str) -> Result<ForecastFeed>;
}

#[derive(Debug, Clone)]
pub struct OpenWeatherMapGateway {
    api_key: String,
    lang: String,
    http: Client,
}

impl OpenWeatherMapGateway {
    pub fn new(api_key: String) -> Self {
        Self::with_lang(api_key, DEFAULT_LANG.to_string())
    }

    pub fn with_lang(api_key: String, lang: String) -> Self {
        Self {
            api_key,
            lang,
            http: client(),
        }
    }

    fn query_params<'a>(&'a self, city: &'a str) -> [(&'a str, &'a str); 4] {
        [
            ("q", city),
            ("appid", self.api_key.as_str()),
            ("units", "metric"),
            ("lang", self.lang.as_str()),
        ]
    }

    async fn fetch_current(&self, city: &str) -> Result<CurrentWeather> {
        let url = format!("{OPENWEATHERMAP_BASE_URL}/weather");

        let res = self
            .http
            .get(&url)
            .query(&self.query_params(city))
            .send()
            .await
            .context("Failed to send request to OpenWeatherMap (current weather)")?;

        let status = res.status();
        let body = res
            .text()
            .await
            .context("Failed to read OpenWeatherMap current response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "OpenWeatherMap current request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        serde_json::from_str(&body).context("Failed to parse OpenWeatherMap current JSON")
    }

    async fn fetch_forecast(&self, city: &str) -> Result<ForecastFeed> {
        let url = format!("{OPENWEATHERMAP_BASE_URL}/forecast");

        let res = self
            .http
            .get(&url)
            .query(&self.query_params(city))
            .send()
            .await
            .context("Failed to send request to OpenWeatherMap (5-day forecast)")?;

        let status = res.status();
        let body = res
            .text()
            .await
            .context("Failed to read OpenWeatherMap forecast response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "OpenWeatherMap forecast request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        serde_json::from_str(&body).context("Failed to parse OpenWeatherMap forecast JSON")
    }
}

#[async_trait]
impl WeatherGateway for OpenWeatherMapGateway {
    async fn current_weather(&self, city: &str) -> Result<CurrentWeather> {
        self.fetch_current(city).await
    }

    async fn forecast(&self, city: &str) -> Result<ForecastFeed> {
        self.fetch_forecast(city).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn current_weather_parses_the_consumed_fields() {
        let parsed: CurrentWeather = serde_json::from_value(json!({
            "weather": [{"id": 803, "description": "曇りがち", "icon": "04d"}],
            "main": {"temp": 18.4, "feels_like": 17.9, "humidity": 64, "pressure": 1012},
            "wind": {"speed": 4.1, "deg": 250},
            "name": "Tokyo"
        }))
        .expect("current weather should parse");

        assert_eq!(parsed.weather[0].id, 803);
        assert_eq!(parsed.weather[0].description, "曇りがち");
        assert_eq!(parsed.main.humidity, 64);
        assert!((parsed.wind.speed - 4.1).abs() < 1e-9);
    }

    #[test]
    fn missing_keys_default_instead_of_failing() {
        let parsed: CurrentWeather =
            serde_json::from_value(json!({})).expect("empty object should parse");

        assert!(parsed.weather.is_empty());
        assert_eq!(parsed.main.temp, 0.0);
        assert_eq!(parsed.main.humidity, 0);
        assert_eq!(parsed.wind.speed, 0.0);
    }

    #[test]
    fn forecast_entry_defaults_pop_to_zero() {
        let parsed: ForecastFeed = serde_json::from_value(json!({
            "list": [{"dt": 1754265600, "main": {"temp": 21.0}}]
        }))
        .expect("forecast should parse");

        assert_eq!(parsed.list.len(), 1);
        assert_eq!(parsed.list[0].pop, 0.0);
        assert!(parsed.list[0].weather.is_empty());
    }
}
