use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Snapshots kept per city; older ones are evicted first.
pub const HISTORY_LIMIT: usize = 10;
/// Snapshots returned in a city listing, newest first.
pub const HISTORY_VIEW: usize = 7;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// One captured reading. Never modified after it is appended to a city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSnapshot {
    pub temperature: i64,
    pub feels_like: i64,
    pub description: String,
    pub humidity: f64,
    pub wind_speed: i64,
    pub icon: String,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightRecord {
    pub summary: String,
    pub prediction: String,
    pub alerts: Vec<String>,
    pub recommendation: String,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedCity {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user_id: Uuid,
    pub city_name: String,
    pub country: String,
    pub is_favorite: bool,
    pub weather_history: Vec<WeatherSnapshot>,
    pub weather_insights: Option<InsightRecord>,
    pub created_at: DateTime<Utc>,
}

impl TrackedCity {
    pub fn new(user_id: Uuid, city_name: String, country: String, first: WeatherSnapshot) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            city_name,
            country,
            is_favorite: false,
            weather_history: vec![first],
            weather_insights: None,
            created_at: Utc::now(),
        }
    }

    pub fn push_snapshot(&mut self, snapshot: WeatherSnapshot) {
        self.weather_history.push(snapshot);
        if self.weather_history.len() > HISTORY_LIMIT {
            let excess = self.weather_history.len() - HISTORY_LIMIT;
            self.weather_history.drain(..excess);
        }
    }

    pub fn recent_history(&self) -> Vec<WeatherSnapshot> {
        self.weather_history
            .iter()
            .rev()
            .take(HISTORY_VIEW)
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentWeather {
    pub temperature: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feels_like: Option<i64>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl CurrentWeather {
    pub fn unavailable() -> Self {
        Self {
            temperature: None,
            feels_like: None,
            description: "unavailable".to_string(),
            humidity: None,
            wind_speed: None,
            icon: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastDay {
    pub date: String,
    pub min_temp: i64,
    pub max_temp: i64,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Danger,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedAlert {
    #[serde(rename = "type")]
    pub severity: Severity,
    pub message: String,
}

impl TypedAlert {
    pub fn new(severity: Severity, message: &str) -> Self {
        Self {
            severity,
            message: message.to_string(),
        }
    }
}

/// A city as shown on the dashboard after a refresh attempt.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CityView {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub city_name: String,
    pub country: String,
    pub is_favorite: bool,
    pub current_weather: CurrentWeather,
    pub forecast: Vec<ForecastDay>,
    pub alerts: Vec<TypedAlert>,
    pub weather_history: Vec<WeatherSnapshot>,
    pub weather_insights: Option<InsightRecord>,
}

#[derive(Debug, Serialize)]
pub struct CitiesResponse {
    pub favorites: Vec<CityView>,
    pub cities: Vec<CityView>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub username: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(length(min = 3, max = 50, message = "Username must be 3-50 characters"))]
    pub username: String,
    #[serde(default)]
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddCityRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "City name is required"))]
    pub city_name: String,
}
