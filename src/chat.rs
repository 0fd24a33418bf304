use crate::error::AppError;
use crate::llm::{ChatMessage, LanguageModel};
use serde::{Deserialize, Serialize};

const MODEL_TEMPERATURE: f32 = 0.5;
const NO_CITIES: &str = "The user has no cities tracked yet.";

/// Flattened city as the dashboard client sends it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatCity {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub temp: Option<f64>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub wind_speed: Option<f64>,
    #[serde(default)]
    pub insights: Option<ChatInsights>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatInsights {
    #[serde(default)]
    pub prediction: Option<String>,
    #[serde(default)]
    pub alerts: Option<Vec<String>>,
    #[serde(default)]
    pub recommendation: Option<String>,
}

/// Null and missing fields are accepted here; `reply` rejects an empty message.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub cities: Option<Vec<ChatCity>>,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub reply: String,
}

fn city_line(c: &ChatCity) -> String {
    let mut line = format!("- {}", c.name);
    if let Some(country) = c.country.as_deref().filter(|s| !s.is_empty()) {
        line.push_str(&format!(", {}", country));
    }

    let temp = c.temp.map_or("N/A".to_string(), |t| format!("{}\u{00b0}C", t));
    let condition = c.condition.as_deref().filter(|s| !s.is_empty()).unwrap_or("N/A");
    let humidity = c.humidity.map_or("N/A".to_string(), |h| format!("{}%", h));
    let wind = c.wind_speed.map_or("N/A".to_string(), |w| format!("{} km/h", w));
    line.push_str(&format!(
        ": {}, {}, humidity {}, wind {}.",
        temp, condition, humidity, wind
    ));

    if let Some(insights) = &c.insights {
        if let Some(prediction) = insights.prediction.as_deref().filter(|s| !s.is_empty()) {
            line.push_str(&format!(" Prediction: {}", prediction));
        }
        if let Some(alerts) = insights.alerts.as_ref().filter(|a| !a.is_empty()) {
            line.push_str(&format!(" Alerts: {}.", alerts.join(", ")));
        }
        if let Some(tip) = insights.recommendation.as_deref().filter(|s| !s.is_empty()) {
            line.push_str(&format!(" Tip: {}", tip));
        }
    }

    line
}

pub fn system_prompt(cities: &[ChatCity]) -> String {
    let context = if cities.is_empty() {
        NO_CITIES.to_string()
    } else {
        cities.iter().map(city_line).collect::<Vec<_>>().join("\n")
    };

    format!(
        "You are a friendly and knowledgeable weather assistant integrated into a personal weather dashboard.
You have access to the user's tracked cities and their current weather data listed below.
Answer questions clearly and helpfully. Keep responses concise (2-4 sentences unless detail is needed).
If asked about a city not in the list, say you don't have data for it but provide general knowledge.

User's tracked cities:
{}",
        context
    )
}

/// One stateless exchange; nothing is kept between calls.
pub async fn reply(
    model: &dyn LanguageModel,
    message: &str,
    cities: &[ChatCity],
) -> Result<String, AppError> {
    if message.is_empty() {
        return Err(AppError::Validation("Message is required".to_string()));
    }

    let messages = [ChatMessage::system(system_prompt(cities)), ChatMessage::user(message)];
    model.complete(&messages, MODEL_TEMPERATURE).await
}
