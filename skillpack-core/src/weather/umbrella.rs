use super::model::{DailySummary, UmbrellaAdvice, WeatherObservation};

/// At or above this probability an umbrella is strongly recommended.
const STRONG_PROBABILITY: f64 = 60.0;
/// At or above this probability a fold-up umbrella is suggested.
const FOLDING_PROBABILITY: f64 = 30.0;
/// Reported probability floor while it is actually raining.
const RAINING_NOW_FLOOR: f64 = 80.0;

/// Decide whether an umbrella is needed. The current observation overrides
/// the forecast: rain falling right now wins over any probability figure.
pub(crate) fn evaluate(
    observation: &WeatherObservation,
    today: Option<&DailySummary>,
) -> UmbrellaAdvice {
    let today_probability = today.map_or(0.0, |day| day.rain_probability);

    if observation.is_rainy() {
        return UmbrellaAdvice {
            needed: true,
            reason: format!("現在、{}です。傘を持っていきましょう。", observation.description),
            rain_probability: today_probability.max(RAINING_NOW_FLOOR),
            current_weather: observation.description.clone(),
            error: None,
        };
    }

    if today_probability >= STRONG_PROBABILITY {
        return UmbrellaAdvice {
            needed: true,
            reason: format!(
                "降水確率が{today_probability:.0}%です。傘を持っていくことを強くお勧めします。"
            ),
            rain_probability: today_probability,
            current_weather: observation.description.clone(),
            error: None,
        };
    }

    if today_probability >= FOLDING_PROBABILITY {
        return UmbrellaAdvice {
            needed: true,
            reason: format!(
                "降水確率が{today_probability:.0}%です。折りたたみ傘を持っていくと安心です。"
            ),
            rain_probability: today_probability,
            current_weather: observation.description.clone(),
            error: None,
        };
    }

    UmbrellaAdvice {
        needed: false,
        reason: "今日は雨の心配はなさそうです。".to_string(),
        rain_probability: today_probability,
        current_weather: observation.description.clone(),
        error: None,
    }
}
