//! Four-stage weather analysis: model summary, model outlook, rule alerts,
//! rule risk score. Stages run in order and each sees only the input and the
//! output of earlier stages.

use crate::error::AppError;
use crate::llm::{ChatMessage, LanguageModel};
use crate::models::{CurrentWeather, ForecastDay, Severity, TypedAlert};
use log::info;
use serde::Serialize;
use std::fmt::Display;

const MODEL_TEMPERATURE: f32 = 0.3;
const NO_FORECAST: &str = "No forecast data available.";

#[derive(Debug, Clone)]
pub struct AnalysisInput {
    pub city_name: String,
    pub country: String,
    pub current: CurrentWeather,
    pub forecast: Vec<ForecastDay>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskLabel {
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskLabel {
    pub fn for_score(score: u32) -> Self {
        match score {
            s if s >= 70 => RiskLabel::Critical,
            s if s >= 40 => RiskLabel::High,
            s if s >= 20 => RiskLabel::Moderate,
            _ => RiskLabel::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RiskScore {
    pub score: u32,
    pub label: RiskLabel,
}

#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub summary: String,
    pub prediction: String,
    pub alerts: Vec<TypedAlert>,
    pub risk: RiskScore,
}

pub async fn run(model: &dyn LanguageModel, input: &AnalysisInput) -> Result<Analysis, AppError> {
    info!("🧠 Analysis started for {}", input.city_name);

    let summary = summarize(model, input).await?;
    let prediction = outlook(model, input).await?;
    let alerts = rule_alerts(&input.current);
    let risk = risk_score(&input.current, &alerts);

    info!(
        "🧠 Analysis finished for {}: risk {} ({:?})",
        input.city_name, risk.score, risk.label
    );

    Ok(Analysis {
        summary,
        prediction,
        alerts,
        risk,
    })
}

fn or_na<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| v.to_string())
}

fn non_empty(value: &str) -> &str {
    if value.is_empty() {
        "N/A"
    } else {
        value
    }
}

pub fn summary_prompt(input: &AnalysisInput) -> String {
    let w = &input.current;
    format!(
        "You are a weather analysis AI. Analyze the following current weather data and provide a concise 2-3 sentence summary for a general user.

City: {}, {}
Temperature: {}°C
Feels Like: {}°C
Condition: {}
Humidity: {}%
Wind Speed: {} km/h

Provide a friendly summary.",
        if input.city_name.is_empty() { "Unknown" } else { input.city_name.as_str() },
        input.country,
        or_na(w.temperature),
        or_na(w.feels_like),
        non_empty(&w.description),
        or_na(w.humidity),
        or_na(w.wind_speed),
    )
}

/// Returns `None` when there is nothing to forecast.
pub fn outlook_prompt(forecast: &[ForecastDay]) -> Option<String> {
    if forecast.is_empty() {
        return None;
    }

    let lines = forecast
        .iter()
        .take(5)
        .map(|f| {
            format!(
                "{}: High {}°C / Low {}°C, {}",
                f.date, f.max_temp, f.min_temp, f.description
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    Some(format!(
        "Based on this 5-day forecast, give a brief 2-sentence outlook for the coming days.

{}

Keep it conversational and helpful.",
        lines
    ))
}

async fn summarize(model: &dyn LanguageModel, input: &AnalysisInput) -> Result<String, AppError> {
    let prompt = summary_prompt(input);
    model
        .complete(&[ChatMessage::user(prompt)], MODEL_TEMPERATURE)
        .await
}

async fn outlook(model: &dyn LanguageModel, input: &AnalysisInput) -> Result<String, AppError> {
    match outlook_prompt(&input.forecast) {
        Some(prompt) => {
            model
                .complete(&[ChatMessage::user(prompt)], MODEL_TEMPERATURE)
                .await
        }
        None => Ok(NO_FORECAST.to_string()),
    }
}

pub fn rule_alerts(current: &CurrentWeather) -> Vec<TypedAlert> {
    let condition = current.description.to_lowercase();
    let mut alerts = Vec::new();

    if let Some(temp) = current.temperature {
        if temp >= 38 {
            alerts.push(TypedAlert::new(
                Severity::Danger,
                "⚠ Extreme heat detected. Stay indoors and hydrate.",
            ));
        } else if temp >= 33 {
            alerts.push(TypedAlert::new(
                Severity::Warning,
                "🌡 High temperature. Avoid prolonged sun exposure.",
            ));
        } else if temp <= 0 {
            alerts.push(TypedAlert::new(
                Severity::Danger,
                "🧊 Freezing conditions. Risk of ice on roads.",
            ));
        } else if temp <= 5 {
            alerts.push(TypedAlert::new(
                Severity::Warning,
                "🧣 Very cold weather. Dress in layers.",
            ));
        }
    }

    if condition.contains("thunder") || condition.contains("storm") {
        alerts.push(TypedAlert::new(
            Severity::Danger,
            "⛈ Thunderstorm alert. Avoid open areas and tall structures.",
        ));
    }
    if condition.contains("rain") || condition.contains("drizzle") {
        alerts.push(TypedAlert::new(Severity::Info, "🌧 Rain expected. Carry an umbrella."));
    }
    if condition.contains("snow") || condition.contains("blizzard") {
        alerts.push(TypedAlert::new(
            Severity::Warning,
            "❄ Snowfall reported. Drive with caution.",
        ));
    }
    if condition.contains("fog") || condition.contains("mist") {
        alerts.push(TypedAlert::new(
            Severity::Warning,
            "🌫 Low visibility due to fog. Slow down while driving.",
        ));
    }

    alerts
}

pub fn risk_score(current: &CurrentWeather, alerts: &[TypedAlert]) -> RiskScore {
    let temp = current.temperature.unwrap_or(20);
    let condition = current.description.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| condition.contains(w));

    let temperature_part = if temp >= 40 || temp <= -5 {
        40
    } else if temp >= 35 || temp <= 0 {
        25
    } else if temp >= 30 || temp <= 5 {
        10
    } else {
        0
    };

    let condition_part = if has(&["thunder", "storm", "blizzard"]) {
        35
    } else if has(&["rain", "snow"]) {
        20
    } else if has(&["fog", "mist"]) {
        15
    } else if has(&["overcast", "cloud"]) {
        5
    } else {
        0
    };

    let dangers = alerts
        .iter()
        .filter(|a| a.severity == Severity::Danger)
        .count() as u32;
    let danger_part = (dangers * 10).min(20);

    let score = (temperature_part + condition_part + danger_part).min(100);
    RiskScore {
        score,
        label: RiskLabel::for_score(score),
    }
}
