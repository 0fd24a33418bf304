//! In-memory collaborators for unit and HTTP tests.

use crate::error::AppError;
use crate::llm::{ChatMessage, LanguageModel};
use crate::models::{TrackedCity, User};
use crate::store::Store;
use crate::weather::{CurrentConditions, TimelineDay, TimelineReport, WeatherProvider};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use std::collections::{HashMap, VecDeque};
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<Vec<User>>,
    cities: Mutex<Vec<TrackedCity>>,
}

impl MemoryStore {
    pub async fn city(&self, city_id: Uuid) -> Option<TrackedCity> {
        self.cities.lock().await.iter().find(|c| c.id == city_id).cloned()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, username: &str, email: &str, password_hash: &str) -> Result<User, AppError> {
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        self.users.lock().await.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.lock().await.iter().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .lock()
            .await
            .iter()
            .find(|u| u.username == username || u.email == email)
            .cloned())
    }

    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.lock().await.iter().find(|u| u.id == user_id).cloned())
    }

    async fn list_cities(&self, user_id: Uuid) -> Result<Vec<TrackedCity>, AppError> {
        let mut cities: Vec<TrackedCity> = self
            .cities
            .lock()
            .await
            .iter()
            .rev()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        cities.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(cities)
    }

    async fn find_city_by_name(&self, user_id: Uuid, city_name: &str) -> Result<Option<TrackedCity>, AppError> {
        Ok(self
            .cities
            .lock()
            .await
            .iter()
            .find(|c| c.user_id == user_id && c.city_name.eq_ignore_ascii_case(city_name))
            .cloned())
    }

    async fn get_city(&self, user_id: Uuid, city_id: Uuid) -> Result<Option<TrackedCity>, AppError> {
        Ok(self
            .cities
            .lock()
            .await
            .iter()
            .find(|c| c.user_id == user_id && c.id == city_id)
            .cloned())
    }

    async fn insert_city(&self, city: &TrackedCity) -> Result<(), AppError> {
        let mut cities = self.cities.lock().await;
        if cities
            .iter()
            .any(|c| c.user_id == city.user_id && c.city_name.eq_ignore_ascii_case(&city.city_name))
        {
            return Err(AppError::Validation("City already added".to_string()));
        }
        cities.push(city.clone());
        Ok(())
    }

    async fn save_city(&self, city: &TrackedCity) -> Result<(), AppError> {
        let mut cities = self.cities.lock().await;
        if let Some(existing) = cities
            .iter_mut()
            .find(|c| c.id == city.id && c.user_id == city.user_id)
        {
            *existing = city.clone();
        }
        Ok(())
    }

    async fn delete_city(&self, user_id: Uuid, city_id: Uuid) -> Result<bool, AppError> {
        let mut cities = self.cities.lock().await;
        let before = cities.len();
        cities.retain(|c| !(c.user_id == user_id && c.id == city_id));
        Ok(cities.len() < before)
    }
}

/// Provider that answers from a fixed table, keyed by lowercase city name.
#[derive(Default)]
pub struct FakeWeather {
    reports: HashMap<String, Result<TimelineReport, String>>,
}

impl FakeWeather {
    pub fn with_city(mut self, name: &str, report: TimelineReport) -> Self {
        self.reports.insert(name.to_lowercase(), Ok(report));
        self
    }

    pub fn with_failure(mut self, name: &str) -> Self {
        self.reports
            .insert(name.to_lowercase(), Err(format!("{} lookup failed", name)));
        self
    }
}

#[async_trait]
impl WeatherProvider for FakeWeather {
    async fn fetch(&self, city: &str) -> Result<TimelineReport, AppError> {
        match self.reports.get(&city.to_lowercase()) {
            Some(Ok(report)) => Ok(report.clone()),
            Some(Err(msg)) => Err(AppError::WeatherApi(msg.clone())),
            None => Err(AppError::WeatherApi(format!("Unknown location: {}", city))),
        }
    }
}

/// A provider report for `address` with six flat days starting today.
pub fn report(address: &str, temp: f64, conditions: &str) -> TimelineReport {
    let Some(start) = NaiveDate::from_ymd_opt(2026, 10, 19) else {
        return TimelineReport::default();
    };

    let days = (0..6)
        .map(|i| TimelineDay {
            datetime: (start + Duration::days(i)).format("%Y-%m-%d").to_string(),
            tempmin: temp - 6.0,
            tempmax: temp + 2.0,
            conditions: "Clear".to_string(),
            icon: "clear-day".to_string(),
            precipprob: Some(0.0),
        })
        .collect();

    TimelineReport {
        resolved_address: Some(address.to_string()),
        current_conditions: CurrentConditions {
            temp,
            feelslike: temp - 1.0,
            conditions: conditions.to_string(),
            humidity: 60.0,
            windspeed: 12.4,
            icon: "clear-day".to_string(),
        },
        days,
    }
}

/// Model that replays canned replies in order and fails once they run out.
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedModel {
    pub fn replying(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub async fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().await.clone()
    }

    /// The last message of every call.
    pub async fn prompts(&self) -> Vec<String> {
        self.calls
            .lock()
            .await
            .iter()
            .filter_map(|call| call.last().map(|m| m.content.clone()))
            .collect()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, messages: &[ChatMessage], _temperature: f32) -> Result<String, AppError> {
        self.calls.lock().await.push(messages.to_vec());
        self.replies
            .lock()
            .await
            .pop_front()
            .ok_or_else(|| AppError::LanguageModel("model unavailable".to_string()))
    }
}
