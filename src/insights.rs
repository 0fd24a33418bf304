//! Rule-based weather insights attached to every tracked city.
//!
//! Two independent rule sets live here: the insight record persisted with
//! each city, and the typed alerts shown on a city card. They share inputs
//! but not thresholds.

use crate::models::{InsightRecord, Severity, TypedAlert};
use crate::weather::{round_half_up, upcoming, CurrentConditions, TimelineDay};
use chrono::{DateTime, Utc};

struct Conditions {
    raining: bool,
    stormy: bool,
    snowy: bool,
    foggy: bool,
    clear: bool,
}

impl Conditions {
    fn classify(condition: &str) -> Self {
        let has = |words: &[&str]| words.iter().any(|w| condition.contains(w));
        Self {
            raining: has(&["rain", "drizzle", "shower"]),
            stormy: has(&["thunder", "storm"]),
            snowy: has(&["snow", "blizzard"]),
            foggy: has(&["fog", "mist"]),
            clear: has(&["clear", "sun"]),
        }
    }
}

fn rain_forecast(days: &[TimelineDay]) -> bool {
    days.iter().any(|d| {
        let conditions = d.conditions.to_lowercase();
        conditions.contains("rain")
            || conditions.contains("shower")
            || d.precipprob.map_or(false, |p| p > 50.0)
    })
}

pub fn compute_insights(current: &CurrentConditions, days: &[TimelineDay]) -> InsightRecord {
    compute_insights_at(current, days, Utc::now())
}

pub fn compute_insights_at(
    current: &CurrentConditions,
    days: &[TimelineDay],
    now: DateTime<Utc>,
) -> InsightRecord {
    let temp = current.temp;
    let humidity = current.humidity;
    let condition = current.conditions.to_lowercase();
    let window = upcoming(days);
    let rain_ahead = rain_forecast(window);
    let kind = Conditions::classify(&condition);

    let mut alerts = Vec::new();
    if temp > 35.0 {
        alerts.push("High heat warning".to_string());
    }
    if temp < 10.0 {
        alerts.push("Cold weather alert".to_string());
    }
    if humidity > 80.0 {
        alerts.push("High humidity discomfort expected".to_string());
    }
    if rain_ahead {
        alerts.push("Rain expected in coming days".to_string());
    }
    if kind.stormy {
        alerts.push("Thunderstorm warning".to_string());
    }
    if kind.snowy {
        alerts.push("Snowfall alert".to_string());
    }
    if kind.foggy {
        alerts.push("Low visibility warning".to_string());
    }

    InsightRecord {
        summary: summarize(temp, humidity, &condition),
        prediction: predict(window, rain_ahead),
        alerts,
        recommendation: recommend(temp, &kind, rain_ahead),
        last_updated: now,
    }
}

fn summarize(temp: f64, humidity: f64, condition: &str) -> String {
    let t = round_half_up(temp);
    if temp > 40.0 {
        format!("Extreme heat at {}°C — dangerous outdoor conditions.", t)
    } else if temp > 35.0 {
        format!("Very hot at {}°C with {}. Humidity at {}%.", t, condition, humidity)
    } else if temp > 25.0 {
        format!("Warm day at {}°C with {}. Humidity is {}%.", t, condition, humidity)
    } else if temp > 15.0 {
        format!("Pleasant {}°C with {}. Humidity at {}%.", t, condition, humidity)
    } else if temp > 5.0 {
        format!("Cool weather at {}°C. {}. Humidity is {}%.", t, condition, humidity)
    } else {
        format!("Cold conditions at {}°C with {}. Stay warm.", t, condition)
    }
}

fn predict(window: &[TimelineDay], rain_ahead: bool) -> String {
    let delta = match (window.first(), window.last()) {
        (Some(first), Some(last)) => last.tempmax - first.tempmax,
        _ => 0.0,
    };

    let text = if rain_ahead && delta < -2.0 {
        "Rain likely with a cooling trend over the next few days."
    } else if rain_ahead {
        "Rain likely in coming days."
    } else if delta > 3.0 {
        "Warming trend expected over the next few days."
    } else if delta < -3.0 {
        "Cooling trend expected over the next few days."
    } else {
        "Temperatures expected to remain stable over the next few days."
    };
    text.to_string()
}

fn recommend(temp: f64, kind: &Conditions, rain_ahead: bool) -> String {
    let text = if kind.stormy {
        "Avoid outdoor activity. Stay indoors during the storm."
    } else if kind.raining || rain_ahead {
        "Carry an umbrella when going out."
    } else if kind.snowy {
        "Wear warm clothing and drive with caution."
    } else if kind.foggy {
        "Drive slowly — low visibility expected."
    } else if temp > 35.0 {
        "Avoid outdoor activity in the afternoon. Stay hydrated."
    } else if temp < 10.0 {
        "Wear warm clothing when going outside."
    } else if kind.clear && (15.0..=30.0).contains(&temp) {
        "Great conditions for outdoor activity."
    } else {
        "Weather conditions are favorable."
    };
    text.to_string()
}

/// Card alerts. Unlike the insight rules, the rain check includes today.
pub fn dashboard_alerts(current: &CurrentConditions, days: &[TimelineDay]) -> Vec<TypedAlert> {
    let temp = current.temp;
    let condition = current.conditions.to_lowercase();
    let mut alerts = Vec::new();

    if temp > 35.0 {
        alerts.push(TypedAlert::new(
            Severity::Danger,
            "🌡️ High temperature warning — stay hydrated",
        ));
    }
    if temp < 10.0 {
        alerts.push(TypedAlert::new(Severity::Info, "🥶 Cold weather warning — dress warmly"));
    }

    let rain_soon = days
        .iter()
        .take(5)
        .any(|d| d.conditions.to_lowercase().contains("rain"));
    if rain_soon {
        alerts.push(TypedAlert::new(Severity::Info, "🌧️ Rain expected in the coming days"));
    }

    if (condition.contains("clear") || condition.contains("sun")) && temp > 30.0 {
        alerts.push(TypedAlert::new(
            Severity::Warning,
            "☀️ High sunlight exposure — use sunscreen",
        ));
    }

    alerts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn current(temp: f64, humidity: f64, conditions: &str) -> CurrentConditions {
        CurrentConditions {
            temp,
            feelslike: temp,
            conditions: conditions.to_string(),
            humidity,
            windspeed: 10.0,
            icon: String::new(),
        }
    }

    fn day(tempmax: f64, conditions: &str, precipprob: Option<f64>) -> TimelineDay {
        TimelineDay {
            datetime: "2026-10-19".to_string(),
            tempmin: tempmax - 8.0,
            tempmax,
            conditions: conditions.to_string(),
            icon: String::new(),
            precipprob,
        }
    }

    /// Today plus five upcoming days with the given max temperatures.
    fn week(maxes: [f64; 5]) -> Vec<TimelineDay> {
        let mut days = vec![day(20.0, "Rain", Some(100.0))];
        days.extend(maxes.iter().map(|&t| day(t, "Clear", Some(0.0))));
        days
    }

    #[test]
    fn test_summary_bands_partition_temperatures() {
        let cases = [
            (45.0, "Extreme heat at 45°C — dangerous outdoor conditions."),
            (40.0, "Very hot at 40°C with clear. Humidity at 30%."),
            (35.5, "Very hot at 36°C with clear. Humidity at 30%."),
            (35.0, "Warm day at 35°C with clear. Humidity is 30%."),
            (25.0, "Pleasant 25°C with clear. Humidity at 30%."),
            (15.0, "Cool weather at 15°C. clear. Humidity is 30%."),
            (5.0, "Cold conditions at 5°C with clear. Stay warm."),
            (-12.0, "Cold conditions at -12°C with clear. Stay warm."),
        ];

        for (temp, expected) in cases {
            let insight = compute_insights(&current(temp, 30.0, "Clear"), &[]);
            assert_eq!(insight.summary, expected, "temp {}", temp);
        }
    }

    #[test]
    fn test_summary_keeps_fractional_humidity() {
        let insight = compute_insights(&current(20.0, 64.5, "Partially cloudy"), &[]);
        assert_eq!(insight.summary, "Pleasant 20°C with partially cloudy. Humidity at 64.5%.");
    }

    #[test]
    fn test_numeric_and_condition_alerts_are_independent() {
        let insight = compute_insights(&current(38.0, 85.0, "Thunderstorm, Fog"), &[]);
        assert_eq!(
            insight.alerts,
            vec![
                "High heat warning",
                "High humidity discomfort expected",
                "Thunderstorm warning",
                "Low visibility warning",
            ]
        );
    }

    #[test]
    fn test_cold_snow_alerts() {
        let insight = compute_insights(&current(-3.0, 40.0, "Blizzard"), &[]);
        assert_eq!(insight.alerts, vec!["Cold weather alert", "Snowfall alert"]);
        assert_eq!(insight.recommendation, "Wear warm clothing and drive with caution.");
    }

    #[test]
    fn test_rain_forecast_ignores_today() {
        let days = week([20.0, 20.0, 20.0, 20.0, 20.0]);
        let insight = compute_insights(&current(20.0, 50.0, "Clear"), &days);
        assert!(!insight.alerts.contains(&"Rain expected in coming days".to_string()));
        assert_eq!(
            insight.prediction,
            "Temperatures expected to remain stable over the next few days."
        );
    }

    #[test]
    fn test_rain_forecast_from_precipitation_probability() {
        let mut days = week([20.0, 20.0, 20.0, 20.0, 20.0]);
        days[3].precipprob = Some(60.0);
        let insight = compute_insights(&current(20.0, 50.0, "Clear"), &days);
        assert!(insight.alerts.contains(&"Rain expected in coming days".to_string()));
        assert_eq!(insight.prediction, "Rain likely in coming days.");
        assert_eq!(insight.recommendation, "Carry an umbrella when going out.");
    }

    #[test]
    fn test_rain_forecast_from_shower_keyword() {
        let mut days = week([24.0, 23.0, 22.0, 21.0, 20.0]);
        days[2].conditions = "Showers".to_string();
        let insight = compute_insights(&current(20.0, 50.0, "Clear"), &days);
        assert_eq!(
            insight.prediction,
            "Rain likely with a cooling trend over the next few days."
        );
    }

    #[test]
    fn test_trend_predictions() {
        let warming = compute_insights(&current(20.0, 50.0, "Clear"), &week([18.0, 19.0, 20.0, 21.0, 22.0]));
        assert_eq!(warming.prediction, "Warming trend expected over the next few days.");

        let cooling = compute_insights(&current(20.0, 50.0, "Clear"), &week([24.0, 23.0, 22.0, 21.0, 20.0]));
        assert_eq!(cooling.prediction, "Cooling trend expected over the next few days.");

        let edge = compute_insights(&current(20.0, 50.0, "Clear"), &week([20.0, 20.0, 20.0, 20.0, 23.0]));
        assert_eq!(
            edge.prediction,
            "Temperatures expected to remain stable over the next few days."
        );
    }

    #[test]
    fn test_recommendation_priority() {
        let cases = [
            (20.0, "Rain, Thunderstorm", "Avoid outdoor activity. Stay indoors during the storm."),
            (20.0, "Drizzle, Snow", "Carry an umbrella when going out."),
            (20.0, "Fog", "Drive slowly — low visibility expected."),
            (37.0, "Clear", "Avoid outdoor activity in the afternoon. Stay hydrated."),
            (8.0, "Clear", "Wear warm clothing when going outside."),
            (30.0, "Sunny", "Great conditions for outdoor activity."),
            (31.0, "Clear", "Weather conditions are favorable."),
            (20.0, "Overcast", "Weather conditions are favorable."),
        ];

        for (temp, conditions, expected) in cases {
            let insight = compute_insights(&current(temp, 50.0, conditions), &[]);
            assert_eq!(insight.recommendation, expected, "{} {}", temp, conditions);
        }
    }

    #[test]
    fn test_deterministic_apart_from_timestamp() {
        let now = Utc::now();
        let days = week([20.0, 22.0, 25.0, 21.0, 19.0]);
        let c = current(28.0, 82.0, "Mist");
        assert_eq!(compute_insights_at(&c, &days, now), compute_insights_at(&c, &days, now));
    }

    #[test]
    fn test_dashboard_alerts_include_today() {
        let days = vec![day(20.0, "Rain", None)];
        let alerts = dashboard_alerts(&current(20.0, 50.0, "Clear"), &days);
        assert_eq!(alerts, vec![TypedAlert::new(Severity::Info, "🌧️ Rain expected in the coming days")]);
    }

    #[test]
    fn test_dashboard_alerts_heat_and_sun() {
        let alerts = dashboard_alerts(&current(36.0, 20.0, "Sunny"), &[]);
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].severity, Severity::Danger);
        assert_eq!(alerts[1].severity, Severity::Warning);

        let cold = dashboard_alerts(&current(9.0, 20.0, "Overcast"), &[]);
        assert_eq!(cold, vec![TypedAlert::new(Severity::Info, "🥶 Cold weather warning — dress warmly")]);
    }
}
