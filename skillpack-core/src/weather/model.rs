use chrono::{DateTime, Utc};
use serde::Serialize;

/// OpenWeatherMap condition ids that mean precipitation: thunderstorm (2xx),
/// drizzle (3xx), rain (5xx), and snow (6xx) families. Kept sorted for
/// binary search.
const RAIN_CONDITION_CODES: &[u32] = &[
    200, 201, 202, 210, 211, 212, 221, 230, 231, 232, // thunderstorm
    300, 301, 302, 310, 311, 312, 313, 314, 321, // drizzle
    500, 501, 502, 503, 504, 511, 520, 521, 522, 531, // rain
    600, 601, 602, 611, 612, 613, 615, 616, 620, 621, 622, // snow
];

pub fn is_rain_code(code: u32) -> bool {
    RAIN_CONDITION_CODES.binary_search(&code).is_ok()
}

/// Normalized snapshot of the current conditions in one city.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WeatherObservation {
    pub description: String,
    /// Air temperature in °C.
    pub temperature: f64,
    pub feels_like: f64,
    /// Relative humidity in percent.
    pub humidity: u8,
    /// Wind speed in m/s.
    pub wind_speed: f64,
    pub condition_code: u32,
}

impl WeatherObservation {
    pub fn is_rainy(&self) -> bool {
        is_rain_code(self.condition_code)
    }
}

/// One raw forecast entry (a 3-hour slot); many slots map to one calendar day.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSlot {
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub condition_code: u32,
    pub description: String,
    /// Probability of precipitation in percent.
    pub rain_probability: f64,
}

/// Per-calendar-day forecast derived from that day's slots.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DailySummary {
    /// UTC calendar date, "YYYY-MM-DD".
    pub date: String,
    /// The day's most frequent description; ties go to the earliest slot.
    pub description: String,
    pub temp_min: f64,
    pub temp_max: f64,
    /// Peak probability of precipitation across the day's slots, percent.
    pub rain_probability: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ForecastReport {
    pub city: String,
    pub current: Option<WeatherObservation>,
    pub daily: Vec<DailySummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ForecastReport {
    pub(crate) fn unavailable(city: &str, error: String) -> Self {
        Self {
            city: city.to_string(),
            current: None,
            daily: Vec::new(),
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UmbrellaAdvice {
    pub needed: bool,
    pub reason: String,
    pub rain_probability: f64,
    pub current_weather: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UmbrellaAdvice {
    pub(crate) fn unavailable(error: String) -> Self {
        Self {
            needed: false,
            reason: "天気情報を取得できませんでした。".to_string(),
            rain_probability: 0.0,
            current_weather: String::new(),
            error: Some(error),
        }
    }
}

/// The conditions the drying index was computed from.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DryingConditions {
    pub temperature: f64,
    pub humidity: u8,
    pub wind_speed: f64,
    pub weather: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LaundryAdvice {
    pub recommended: bool,
    pub advice: String,
    /// 0-100; higher dries faster.
    pub drying_index: u8,
    pub conditions: Option<DryingConditions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LaundryAdvice {
    pub(crate) fn unavailable(error: String) -> Self {
        Self {
            recommended: false,
            advice: "天気情報を取得できませんでした。".to_string(),
            drying_index: 0,
            conditions: None,
            error: Some(error),
        }
    }
}

/// Heat-stress level on the Japanese 5-grade WBGT scale. `Unknown` is only
/// reported when the weather feed is unavailable; classification itself
/// always yields one of the five named grades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskLevel {
    #[serde(rename = "安全")]
    Safe,
    #[serde(rename = "注意")]
    Caution,
    #[serde(rename = "警戒")]
    Warning,
    #[serde(rename = "厳重警戒")]
    Severe,
    #[serde(rename = "危険")]
    Danger,
    #[serde(rename = "不明")]
    Unknown,
}

impl RiskLevel {
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Safe => "安全",
            RiskLevel::Caution => "注意",
            RiskLevel::Warning => "警戒",
            RiskLevel::Severe => "厳重警戒",
            RiskLevel::Danger => "危険",
            RiskLevel::Unknown => "不明",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HeatConditions {
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: u8,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HeatRiskAdvice {
    pub risk_level: RiskLevel,
    pub wbgt_estimate: f64,
    pub advice: String,
    pub conditions: Option<HeatConditions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HeatRiskAdvice {
    pub(crate) fn unavailable(error: String) -> Self {
        Self {
            risk_level: RiskLevel::Unknown,
            wbgt_estimate: 0.0,
            advice: "天気情報を取得できませんでした。".to_string(),
            conditions: None,
            error: Some(error),
        }
    }
}
