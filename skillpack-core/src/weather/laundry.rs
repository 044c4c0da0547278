use super::model::{DailySummary, DryingConditions, LaundryAdvice, WeatherObservation};

/// Rain probability at which outdoor drying is vetoed for the day.
const RAIN_VETO_PROBABILITY: f64 = 50.0;
/// Index deduction applied under that veto.
const RAIN_PENALTY: u8 = 30;
const IDEAL_INDEX: u8 = 60;
const POSSIBLE_INDEX: u8 = 40;

/// Synthetic 0-100 score for how quickly outdoor laundry dries. Three
/// additive sub-scores, each clamped to its band before summing:
/// temperature up to 40 points, dryness up to 35, wind up to 25.
pub(crate) fn drying_index(temperature: f64, humidity: u8, wind_speed: f64) -> u8 {
    let humidity = f64::from(humidity);

    let temp_score = ((temperature - 5.0) / 30.0 * 40.0).clamp(0.0, 40.0);
    let humidity_score = ((100.0 - humidity) / 100.0 * 35.0).clamp(0.0, 35.0);
    let wind_score = (wind_speed / 5.0 * 25.0).clamp(0.0, 25.0);

    (temp_score + humidity_score + wind_score).round().clamp(0.0, 100.0) as u8
}

/// Recommend outdoor or indoor drying. Rain falling now dominates every
/// other factor; a wet afternoon forecast knocks the index down instead.
pub(crate) fn evaluate(
    observation: &WeatherObservation,
    today: Option<&DailySummary>,
) -> LaundryAdvice {
    let conditions = DryingConditions {
        temperature: observation.temperature,
        humidity: observation.humidity,
        wind_speed: observation.wind_speed,
        weather: observation.description.clone(),
    };

    if observation.is_rainy() {
        return LaundryAdvice {
            recommended: false,
            advice: "現在雨が降っています。室内干しをお勧めします。".to_string(),
            drying_index: 0,
            conditions: Some(conditions),
            error: None,
        };
    }

    let index = drying_index(
        observation.temperature,
        observation.humidity,
        observation.wind_speed,
    );
    let today_probability = today.map_or(0.0, |day| day.rain_probability);

    if today_probability >= RAIN_VETO_PROBABILITY {
        return LaundryAdvice {
            recommended: false,
            advice: format!(
                "午後の降水確率が{today_probability:.0}%です。室内干しをお勧めします。"
            ),
            drying_index: index.saturating_sub(RAIN_PENALTY),
            conditions: Some(conditions),
            error: None,
        };
    }

    let (recommended, advice) = if index >= IDEAL_INDEX {
        (true, "絶好の洗濯日和です！外干しをお勧めします。")
    } else if index >= POSSIBLE_INDEX {
        (true, "外干しは可能ですが、厚手の衣類は乾きにくいかもしれません。")
    } else {
        (false, "気温が低く湿度が高いため、室内干しまたは乾燥機の使用をお勧めします。")
    };

    LaundryAdvice {
        recommended,
        advice: advice.to_string(),
        drying_index: index,
        conditions: Some(conditions),
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation(
        condition_code: u32,
        temperature: f64,
        humidity: u8,
        wind_speed: f64,
    ) -> WeatherObservation {
        WeatherObservation {
            description: "晴天".to_string(),
            temperature,
            feels_like: temperature,
            humidity,
            wind_speed,
            condition_code,
        }
    }

    fn today(rain_probability: f64) -> DailySummary {
        DailySummary {
            date: "2025-08-04".to_string(),
            description: "晴れ".to_string(),
            temp_min: 18.0,
            temp_max: 28.0,
            rain_probability,
        }
    }

    #[test]
    fn warm_dry_windy_day_scores_seventy_nine() {
        // 33.33 (temp) + 21 (humidity) + 25 (wind) rounds to 79.
        assert_eq!(drying_index(30.0, 40, 5.0), 79);
    }

    #[test]
    fn index_stays_within_bounds() {
        assert_eq!(drying_index(-20.0, 100, 0.0), 0);
        assert_eq!(drying_index(60.0, 0, 30.0), 100);
    }

    #[test]
    fn ideal_day_is_recommended() {
        let advice = evaluate(&observation(800, 30.0, 40, 5.0), Some(&today(0.0)));

        assert!(advice.recommended);
        assert_eq!(advice.drying_index, 79);
        assert_eq!(advice.advice, "絶好の洗濯日和です！外干しをお勧めします。");
    }

    #[test]
    fn rain_now_zeroes_the_index() {
        let advice = evaluate(&observation(501, 30.0, 40, 5.0), Some(&today(0.0)));

        assert!(!advice.recommended);
        assert_eq!(advice.drying_index, 0);
        assert!(advice.advice.contains("現在雨が降っています"));
    }

    #[test]
    fn wet_afternoon_applies_the_penalty() {
        let advice = evaluate(&observation(800, 30.0, 40, 5.0), Some(&today(50.0)));

        assert!(!advice.recommended);
        assert_eq!(advice.drying_index, 49);
        assert!(advice.advice.contains("50%"));
    }

    #[test]
    fn penalty_floors_at_zero() {
        // Cold, damp, still: the raw index is already below the penalty.
        let advice = evaluate(&observation(800, 6.0, 95, 0.0), Some(&today(80.0)));

        assert!(!advice.recommended);
        assert_eq!(advice.drying_index, 0);
    }

    #[test]
    fn middling_index_allows_drying_with_a_caveat() {
        // 20°C, 60% humidity, 1 m/s: 20 + 14 + 5 = 39 -> indoor.
        // 21°C, 55% humidity, 2 m/s: 21.33 + 15.75 + 10 = 47 -> possible.
        let indoor = evaluate(&observation(800, 20.0, 60, 1.0), Some(&today(0.0)));
        assert!(!indoor.recommended);
        assert_eq!(indoor.drying_index, 39);

        let possible = evaluate(&observation(800, 21.0, 55, 2.0), Some(&today(0.0)));
        assert!(possible.recommended);
        assert_eq!(possible.drying_index, 47);
        assert!(possible.advice.contains("厚手の衣類"));
    }
}
