//! Weather advisory skill backed by OpenWeatherMap.
//!
//! One forecast cycle performs at most two GET requests (current weather and
//! the 5-day/3-hour forecast); everything after that is pure classification.
//! Transport failures degrade into default-valued records carrying an
//! `error` string; only input validation returns `Err`.

pub mod forecast;
pub mod gateway;
mod heatstroke;
mod laundry;
pub mod model;
mod umbrella;

use crate::config::Config;
use crate::error::SkillError;
use gateway::{OpenWeatherMapGateway, WeatherGateway};
pub use model::{
    DailySummary, DryingConditions, ForecastReport, ForecastSlot, HeatConditions, HeatRiskAdvice,
    LaundryAdvice, RiskLevel, UmbrellaAdvice, WeatherObservation,
};

#[derive(Debug)]
pub struct WeatherAdvisor {
    gateway: Box<dyn WeatherGateway>,
}

impl WeatherAdvisor {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_gateway(Box::new(OpenWeatherMapGateway::new(api_key.into())))
    }

    /// Build from config, resolving the API key and description language.
    pub fn from_config(config: &Config) -> Result<Self, SkillError> {
        let api_key = config
            .openweather_api_key()
            .ok_or(SkillError::MissingCredential {
                what: "OpenWeatherMap APIキー",
                env: "OPENWEATHERMAP_API_KEY",
            })?;

        Ok(Self::with_gateway(Box::new(
            OpenWeatherMapGateway::with_lang(api_key, config.openweather_lang()),
        )))
    }

    /// Use an alternative weather feed, e.g. a canned one in tests.
    pub fn with_gateway(gateway: Box<dyn WeatherGateway>) -> Self {
        Self { gateway }
    }

    /// Fetch current conditions plus the per-day forecast summary.
    pub async fn get_forecast(&self, city: &str) -> Result<ForecastReport, SkillError> {
        ensure_city(city)?;

        let current = match self.gateway.current_weather(city).await {
            Ok(current) => current,
            Err(err) => {
                tracing::error!("天気予報の取得に失敗しました: city={city}, error={err:#}");
                return Ok(ForecastReport::unavailable(city, format!("{err:#}")));
            }
        };

        let feed = match self.gateway.forecast(city).await {
            Ok(feed) => feed,
            Err(err) => {
                tracing::error!("天気予報の取得に失敗しました: city={city}, error={err:#}");
                return Ok(ForecastReport::unavailable(city, format!("{err:#}")));
            }
        };

        let slots = forecast::slots(&feed);

        Ok(ForecastReport {
            city: city.to_string(),
            current: Some(forecast::observation(&current)),
            daily: forecast::summarize_daily(&slots),
            error: None,
        })
    }

    /// Decide whether an umbrella is needed today.
    pub async fn check_umbrella(&self, city: &str) -> Result<UmbrellaAdvice, SkillError> {
        ensure_city(city)?;

        let report = self.get_forecast(city).await?;
        let Some(observation) = report.current else {
            return Ok(UmbrellaAdvice::unavailable(report.error.unwrap_or_default()));
        };

        Ok(umbrella::evaluate(&observation, report.daily.first()))
    }

    /// Score today's outdoor-drying conditions.
    pub async fn check_laundry(&self, city: &str) -> Result<LaundryAdvice, SkillError> {
        ensure_city(city)?;

        let report = self.get_forecast(city).await?;
        let Some(observation) = report.current else {
            return Ok(LaundryAdvice::unavailable(report.error.unwrap_or_default()));
        };

        Ok(laundry::evaluate(&observation, report.daily.first()))
    }

    /// Estimate the heat-stress level from current conditions only.
    pub async fn check_heatstroke(&self, city: &str) -> Result<HeatRiskAdvice, SkillError> {
        ensure_city(city)?;

        match self.gateway.current_weather(city).await {
            Ok(current) => Ok(heatstroke::evaluate(&forecast::observation(&current))),
            Err(err) => {
                tracing::error!("熱中症リスクの判定に失敗しました: city={city}, error={err:#}");
                Ok(HeatRiskAdvice::unavailable(format!("{err:#}")))
            }
        }
    }
}

fn ensure_city(city: &str) -> Result<(), SkillError> {
    if city.is_empty() {
        return Err(SkillError::EmptyField("都市名"));
    }
    Ok(())
}
