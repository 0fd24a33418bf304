use crate::error::AppError;
use crate::models::{CurrentWeather, ForecastDay, WeatherSnapshot};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Deserializer};

/// Source of current conditions and daily forecasts for a place name.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn fetch(&self, city: &str) -> Result<TimelineReport, AppError>;
}

/// Rounds .5 towards positive infinity, so -2.5 becomes -2.
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineReport {
    #[serde(default)]
    pub resolved_address: Option<String>,
    #[serde(default)]
    pub current_conditions: CurrentConditions,
    #[serde(default, deserialize_with = "nullable")]
    pub days: Vec<TimelineDay>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurrentConditions {
    #[serde(default, deserialize_with = "nullable")]
    pub temp: f64,
    #[serde(default, deserialize_with = "nullable")]
    pub feelslike: f64,
    #[serde(default, deserialize_with = "nullable")]
    pub conditions: String,
    #[serde(default, deserialize_with = "nullable")]
    pub humidity: f64,
    #[serde(default, deserialize_with = "nullable")]
    pub windspeed: f64,
    #[serde(default, deserialize_with = "nullable")]
    pub icon: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimelineDay {
    #[serde(default, deserialize_with = "nullable")]
    pub datetime: String,
    #[serde(default, deserialize_with = "nullable")]
    pub tempmin: f64,
    #[serde(default, deserialize_with = "nullable")]
    pub tempmax: f64,
    #[serde(default, deserialize_with = "nullable")]
    pub conditions: String,
    #[serde(default, deserialize_with = "nullable")]
    pub icon: String,
    #[serde(default)]
    pub precipprob: Option<f64>,
}

impl TimelineReport {
    /// The next five days, skipping today.
    pub fn upcoming_days(&self) -> &[TimelineDay] {
        upcoming(&self.days)
    }

    pub fn current_weather(&self) -> CurrentWeather {
        let c = &self.current_conditions;
        CurrentWeather {
            temperature: Some(round_half_up(c.temp)),
            feels_like: Some(round_half_up(c.feelslike)),
            description: c.conditions.clone(),
            humidity: Some(c.humidity),
            wind_speed: Some(round_half_up(c.windspeed)),
            icon: Some(c.icon.clone()),
        }
    }

    pub fn snapshot(&self, recorded_at: DateTime<Utc>) -> WeatherSnapshot {
        let c = &self.current_conditions;
        WeatherSnapshot {
            temperature: round_half_up(c.temp),
            feels_like: round_half_up(c.feelslike),
            description: c.conditions.clone(),
            humidity: c.humidity,
            wind_speed: round_half_up(c.windspeed),
            icon: c.icon.clone(),
            recorded_at,
        }
    }

    pub fn forecast(&self) -> Vec<ForecastDay> {
        self.upcoming_days()
            .iter()
            .map(|day| ForecastDay {
                date: day.datetime.clone(),
                min_temp: round_half_up(day.tempmin),
                max_temp: round_half_up(day.tempmax),
                description: day.conditions.clone(),
                icon: day.icon.clone(),
            })
            .collect()
    }

    /// Display name and country from the resolved address, e.g. "Paris, Île-de-France, France".
    pub fn place(&self, requested: &str) -> (String, String) {
        match self.resolved_address.as_deref() {
            Some(address) if !address.trim().is_empty() => {
                let mut parts = address.split(',').map(str::trim);
                let name = parts.next().unwrap_or(requested).to_string();
                let country = address.rsplit(',').next().unwrap_or("").trim().to_string();
                (name, country)
            }
            _ => (requested.to_string(), String::new()),
        }
    }
}

pub fn upcoming(days: &[TimelineDay]) -> &[TimelineDay] {
    let start = days.len().min(1);
    let end = days.len().min(6);
    &days[start..end]
}

#[derive(Clone)]
pub struct WeatherClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl WeatherClient {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl WeatherProvider for WeatherClient {
    async fn fetch(&self, city: &str) -> Result<TimelineReport, AppError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| AppError::WeatherApi(format!("Invalid base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| AppError::WeatherApi("Base URL cannot carry a path".to_string()))?
            .push(city);

        info!("🌐 Fetching weather from API: {}", city);

        let response = self
            .client
            .get(url)
            .query(&[
                ("unitGroup", "metric"),
                ("key", self.api_key.as_str()),
                ("contentType", "json"),
                ("include", "current,days"),
            ])
            .send()
            .await
            .map_err(|e| AppError::WeatherApi(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::WeatherApi(format!(
                "API returned status {}: {}",
                status, error_text
            )));
        }

        let report: TimelineReport = response
            .json()
            .await
            .map_err(|e| AppError::WeatherApi(format!("Failed to parse response: {}", e)))?;

        info!(
            "✅ Weather fetched: {} - {}°C, {}",
            city, report.current_conditions.temp, report.current_conditions.conditions
        );

        Ok(report)
    }
}
