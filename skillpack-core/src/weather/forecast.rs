//! Normalization of raw feed payloads and per-day aggregation of forecast
//! slots.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::gateway::{CurrentWeather, ForecastFeed};
use super::model::{DailySummary, ForecastSlot, WeatherObservation};

pub(crate) const UNKNOWN_DESCRIPTION: &str = "不明";

/// Reduce a raw "current weather" payload to the advisory snapshot.
pub fn observation(current: &CurrentWeather) -> WeatherObservation {
    let (condition_code, description) = current
        .weather
        .first()
        .map(|w| (w.id, w.description.clone()))
        .unwrap_or((0, UNKNOWN_DESCRIPTION.to_string()));

    WeatherObservation {
        description,
        temperature: current.main.temp,
        feels_like: current.main.feels_like,
        humidity: current.main.humidity,
        wind_speed: current.wind.speed,
        condition_code,
    }
}

/// Turn feed entries into forecast slots, dropping entries whose timestamp
/// is out of range. The upstream `pop` fraction becomes a percentage here.
pub fn slots(feed: &ForecastFeed) -> Vec<ForecastSlot> {
    feed.list
        .iter()
        .filter_map(|entry| {
            let timestamp = unix_to_utc(entry.dt)?;
            let (condition_code, description) = entry
                .weather
                .first()
                .map(|w| (w.id, w.description.clone()))
                .unwrap_or((0, String::new()));

            Some(ForecastSlot {
                timestamp,
                temperature: entry.main.temp,
                condition_code,
                description,
                rain_probability: entry.pop * 100.0,
            })
        })
        .collect()
}

struct DayAccumulator {
    temp_min: f64,
    temp_max: f64,
    rain_probability: f64,
    descriptions: Vec<String>,
}

/// Group slots by UTC calendar date and summarize each day. Days come out
/// ascending by date ("YYYY-MM-DD" sorts chronologically).
pub fn summarize_daily(slots: &[ForecastSlot]) -> Vec<DailySummary> {
    let mut days: BTreeMap<String, DayAccumulator> = BTreeMap::new();

    for slot in slots {
        let date = slot.timestamp.date_naive().to_string();
        let day = days.entry(date).or_insert(DayAccumulator {
            temp_min: f64::INFINITY,
            temp_max: f64::NEG_INFINITY,
            rain_probability: 0.0,
            descriptions: Vec::new(),
        });

        day.temp_min = day.temp_min.min(slot.temperature);
        day.temp_max = day.temp_max.max(slot.temperature);
        day.rain_probability = day.rain_probability.max(slot.rain_probability);
        day.descriptions.push(slot.description.clone());
    }

    days.into_iter()
        .map(|(date, day)| DailySummary {
            date,
            description: dominant_description(&day.descriptions),
            temp_min: round_tenth(day.temp_min),
            temp_max: round_tenth(day.temp_max),
            rain_probability: day.rain_probability.round(),
        })
        .collect()
}

/// The most frequent description; on a tie the earliest occurrence wins.
/// Counting utilities are deliberately avoided here since their tie-break
/// order differs between implementations.
fn dominant_description(descriptions: &[String]) -> String {
    let mut best: Option<(&String, usize)> = None;

    for description in descriptions {
        let count = descriptions.iter().filter(|d| *d == description).count();
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((description, count));
        }
    }

    best.map_or_else(|| UNKNOWN_DESCRIPTION.to_string(), |(d, _)| d.clone())
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather::gateway::{ConditionSummary, MainReadings, Wind};

    // 2025-08-04T00:00:00Z
    const AUG_4: i64 = 1_754_265_600;
    const DAY: i64 = 86_400;

    fn slot(ts: i64, temp: f64, description: &str, pop_pct: f64) -> ForecastSlot {
        ForecastSlot {
            timestamp: unix_to_utc(ts).expect("valid timestamp"),
            temperature: temp,
            condition_code: 800,
            description: description.to_string(),
            rain_probability: pop_pct,
        }
    }

    #[test]
    fn observation_reads_first_weather_entry() {
        let current = CurrentWeather {
            weather: vec![ConditionSummary {
                id: 500,
                description: "小雨".to_string(),
            }],
            main: MainReadings {
                temp: 22.3,
                feels_like: 23.0,
                humidity: 78,
            },
            wind: Wind { speed: 3.4 },
        };

        let obs = observation(&current);
        assert_eq!(obs.condition_code, 500);
        assert_eq!(obs.description, "小雨");
        assert_eq!(obs.humidity, 78);
        assert!(obs.is_rainy());
    }

    #[test]
    fn observation_without_weather_array_is_unknown() {
        let obs = observation(&CurrentWeather::default());
        assert_eq!(obs.description, UNKNOWN_DESCRIPTION);
        assert_eq!(obs.condition_code, 0);
        assert!(!obs.is_rainy());
    }

    #[test]
    fn majority_description_wins() {
        let slots = vec![
            slot(AUG_4, 20.0, "晴れ", 10.0),
            slot(AUG_4 + 3 * 3600, 24.0, "晴れ", 20.0),
            slot(AUG_4 + 6 * 3600, 22.0, "雨", 50.0),
        ];

        let daily = summarize_daily(&slots);
        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].date, "2025-08-04");
        assert_eq!(daily[0].description, "晴れ");
        assert_eq!(daily[0].rain_probability, 50.0);
        assert_eq!(daily[0].temp_min, 20.0);
        assert_eq!(daily[0].temp_max, 24.0);
    }

    #[test]
    fn description_tie_breaks_to_first_occurrence() {
        let slots = vec![
            slot(AUG_4, 20.0, "雨", 60.0),
            slot(AUG_4 + 3 * 3600, 21.0, "晴れ", 0.0),
        ];

        let daily = summarize_daily(&slots);
        assert_eq!(daily[0].description, "雨");
    }

    #[test]
    fn days_come_out_in_ascending_date_order() {
        let slots = vec![
            slot(AUG_4 + 2 * DAY, 25.0, "曇り", 0.0),
            slot(AUG_4, 20.0, "晴れ", 0.0),
            slot(AUG_4 + DAY, 22.0, "晴れ", 0.0),
        ];

        let daily = summarize_daily(&slots);
        let dates: Vec<&str> = daily.iter().map(|d| d.date.as_str()).collect();
        assert_eq!(dates, vec!["2025-08-04", "2025-08-05", "2025-08-06"]);
    }

    #[test]
    fn temperatures_round_to_one_decimal() {
        let slots = vec![
            slot(AUG_4, 20.04, "晴れ", 0.0),
            slot(AUG_4 + 3 * 3600, 24.96, "晴れ", 0.0),
        ];

        let daily = summarize_daily(&slots);
        assert_eq!(daily[0].temp_min, 20.0);
        assert_eq!(daily[0].temp_max, 25.0);
    }

    #[test]
    fn min_never_exceeds_max() {
        let slots = vec![
            slot(AUG_4, 18.5, "晴れ", 0.0),
            slot(AUG_4 + 3 * 3600, 27.1, "晴れ", 0.0),
            slot(AUG_4 + DAY, 30.0, "晴れ", 0.0),
        ];

        for day in summarize_daily(&slots) {
            assert!(day.temp_min <= day.temp_max);
        }
    }

    #[test]
    fn no_slots_means_no_days() {
        assert!(summarize_daily(&[]).is_empty());
    }

    #[test]
    fn pop_fraction_becomes_percentage() {
        let feed = ForecastFeed {
            list: vec![crate::weather::gateway::ForecastEntry {
                dt: AUG_4,
                main: MainReadings {
                    temp: 20.0,
                    ..MainReadings::default()
                },
                weather: vec![],
                pop: 0.35,
            }],
        };

        let slots = slots(&feed);
        assert_eq!(slots.len(), 1);
        assert!((slots[0].rain_probability - 35.0).abs() < 1e-9);
        assert_eq!(slots[0].description, "");
    }
}
