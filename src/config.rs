use crate::error::AppError;
use std::env;

pub const DEFAULT_WEATHER_API_URL: &str =
    "https://weather.visualcrossing.com/VisualCrossingWebServices/rest/services/timeline";
pub const DEFAULT_LLM_API_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_LLM_MODEL: &str = "llama-3.1-8b-instant";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub weather_api_key: String,
    pub weather_api_url: String,
    pub llm_api_key: String,
    pub llm_api_url: String,
    pub llm_model: String,
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub port: u16,
    pub static_dir: String,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| AppError::Config("DATABASE_URL not set".to_string()))?,
            weather_api_key: env::var("WEATHER_API_KEY")
                .map_err(|_| AppError::Config("WEATHER_API_KEY not set".to_string()))?,
            weather_api_url: env::var("WEATHER_API_URL")
                .unwrap_or_else(|_| DEFAULT_WEATHER_API_URL.to_string()),
            llm_api_key: env::var("GROQ_API_KEY")
                .map_err(|_| AppError::Config("GROQ_API_KEY not set".to_string()))?,
            llm_api_url: env::var("LLM_API_URL").unwrap_or_else(|_| DEFAULT_LLM_API_URL.to_string()),
            llm_model: env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_LLM_MODEL.to_string()),
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| AppError::Config("JWT_SECRET not set".to_string()))?,
            jwt_expiry_hours: env::var("JWT_EXPIRY_HOURS")
                .unwrap_or_else(|_| "168".to_string())
                .parse()
                .unwrap_or(168),
            port: env::var("PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .unwrap_or(5000),
            static_dir: env::var("STATIC_DIR").unwrap_or_else(|_| "./client".to_string()),
        })
    }
}
