use super::model::{HeatConditions, HeatRiskAdvice, RiskLevel, WeatherObservation};

/// Risk bands as (upper bound, level, advice), scanned lowest to highest:
/// the estimate falls into the first band whose upper bound exceeds it.
const WBGT_BANDS: &[(f64, RiskLevel, &str)] = &[
    (21.0, RiskLevel::Safe, "特に注意は必要ありません。"),
    (25.0, RiskLevel::Caution, "こまめに水分補給をしてください。"),
    (
        28.0,
        RiskLevel::Warning,
        "激しい運動は避け、適度に休憩を取ってください。",
    ),
    (
        31.0,
        RiskLevel::Severe,
        "外出を控え、涼しい環境で過ごしてください。水分・塩分の補給を忘れずに。",
    ),
    (
        f64::INFINITY,
        RiskLevel::Danger,
        "外出を避けてください。エアコンの効いた室内で過ごし、こまめに水分・塩分を補給してください。",
    ),
];

/// Estimate WBGT from air temperature (°C) and relative humidity (%).
///
/// A proper WBGT needs globe and wet-bulb readings; this is the common
/// two-variable approximation, good enough as a daily-life indicator.
/// Rounded to one decimal.
pub(crate) fn estimate_wbgt(temperature: f64, humidity: f64) -> f64 {
    let wbgt =
        0.725 * temperature + 0.0368 * humidity + 0.003_64 * temperature * humidity - 3.246;
    (wbgt * 10.0).round() / 10.0
}

pub(crate) fn classify_wbgt(wbgt: f64) -> (RiskLevel, &'static str) {
    for &(upper_bound, level, advice) in WBGT_BANDS {
        if wbgt < upper_bound {
            return (level, advice);
        }
    }

    // Unreachable for finite estimates; NaN lands here and reads as danger.
    let &(_, level, advice) = &WBGT_BANDS[WBGT_BANDS.len() - 1];
    (level, advice)
}

pub(crate) fn evaluate(observation: &WeatherObservation) -> HeatRiskAdvice {
    let wbgt = estimate_wbgt(observation.temperature, f64::from(observation.humidity));
    let (risk_level, advice) = classify_wbgt(wbgt);

    HeatRiskAdvice {
        risk_level,
        wbgt_estimate: wbgt,
        advice: advice.to_string(),
        conditions: Some(HeatConditions {
            temperature: observation.temperature,
            feels_like: observation.feels_like,
            humidity: observation.humidity,
        }),
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation(temperature: f64, humidity: u8) -> WeatherObservation {
        WeatherObservation {
            description: "晴天".to_string(),
            temperature,
            feels_like: temperature + 2.0,
            humidity,
            wind_speed: 1.0,
            condition_code: 800,
        }
    }

    #[test]
    fn wbgt_formula_matches_known_values() {
        // 0.725*30 + 0.0368*60 + 0.00364*30*60 - 3.246 = 27.264
        assert_eq!(estimate_wbgt(30.0, 60.0), 27.3);
        // 0.725*35 + 0.0368*80 + 0.00364*35*80 - 3.246 = 35.265
        assert_eq!(estimate_wbgt(35.0, 80.0), 35.3);
    }

    #[test]
    fn wbgt_is_monotonic_in_temperature() {
        let mut previous = f64::NEG_INFINITY;
        for tenth_degrees in 0..=450 {
            let wbgt = estimate_wbgt(f64::from(tenth_degrees) / 10.0, 55.0);
            assert!(wbgt >= previous);
            previous = wbgt;
        }
    }

    #[test]
    fn band_boundaries_round_up() {
        // Exactly 21.0 leaves the safe band; exactly 31.0 is danger.
        assert_eq!(classify_wbgt(20.9).0, RiskLevel::Safe);
        assert_eq!(classify_wbgt(21.0).0, RiskLevel::Caution);
        assert_eq!(classify_wbgt(24.9).0, RiskLevel::Caution);
        assert_eq!(classify_wbgt(25.0).0, RiskLevel::Warning);
        assert_eq!(classify_wbgt(28.0).0, RiskLevel::Severe);
        assert_eq!(classify_wbgt(30.9).0, RiskLevel::Severe);
        assert_eq!(classify_wbgt(31.0).0, RiskLevel::Danger);
        assert_eq!(classify_wbgt(45.0).0, RiskLevel::Danger);
    }

    #[test]
    fn classification_only_yields_the_five_grades() {
        for tenth in 0..=500 {
            let (level, advice) = classify_wbgt(f64::from(tenth) / 10.0);
            assert_ne!(level, RiskLevel::Unknown);
            assert!(!advice.is_empty());
        }
    }

    #[test]
    fn hot_humid_day_is_dangerous() {
        let advice = evaluate(&observation(35.0, 80));

        assert_eq!(advice.risk_level, RiskLevel::Danger);
        assert_eq!(advice.wbgt_estimate, 35.3);
        assert!(advice.advice.contains("外出を避けてください"));

        let conditions = advice.conditions.expect("conditions are reported");
        assert_eq!(conditions.humidity, 80);
        assert_eq!(conditions.feels_like, 37.0);
    }

    #[test]
    fn mild_day_is_safe() {
        // 0.725*18 + 0.0368*40 + 0.00364*18*40 - 3.246 = 13.8968
        let advice = evaluate(&observation(18.0, 40));

        assert_eq!(advice.risk_level, RiskLevel::Safe);
        assert_eq!(advice.wbgt_estimate, 13.9);
        assert_eq!(advice.advice, "特に注意は必要ありません。");
    }
}
