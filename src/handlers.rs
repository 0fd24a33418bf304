use crate::auth::AuthUser;
use crate::chat::{self, ChatReply, ChatRequest};
use crate::cities;
use crate::error::{first_validation_message, AppError};
use crate::models::*;
use crate::pipeline::{self, AnalysisInput};
use crate::AppState;
use actix_web::{web, HttpResponse, Responder};
use log::{error, info, warn};
use uuid::Uuid;
use validator::Validate;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::Validation(err.to_string()).into()),
    )
    // The only path parameters that can fail to parse are city ids.
    .app_data(
        web::PathConfig::default()
            .error_handler(|_err, _req| AppError::NotFound("City not found".to_string()).into()),
    )
    .service(
        web::scope("/api")
            .route("/health", web::get().to(health_check))
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(register))
                    .route("/login", web::post().to(login))
                    .route("/me", web::get().to(me)),
            )
            .service(
                web::scope("/cities")
                    .route("", web::get().to(list_cities))
                    .route("", web::post().to(add_city))
                    .route("/{city_id}/favorite", web::put().to(toggle_favorite))
                    .route("/{city_id}", web::delete().to(delete_city)),
            )
            .service(
                web::scope("/ai")
                    .route("/weather-analysis/{city_name}", web::get().to(weather_analysis))
                    .route("/chat", web::post().to(chat)),
            ),
    );
}

// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "Weather Dashboard",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

// Auth endpoints
async fn register(
    state: web::Data<AppState>,
    req: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let session = state.auth.register(state.store.as_ref(), &req).await?;
    Ok(HttpResponse::Created().json(session))
}

async fn login(
    state: web::Data<AppState>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let session = state.auth.login(state.store.as_ref(), &req).await?;
    info!("🔑 User logged in: {}", session.username);
    Ok(HttpResponse::Ok().json(session))
}

async fn me(state: web::Data<AppState>, user: AuthUser) -> Result<HttpResponse, AppError> {
    let user = state
        .store
        .get_user(user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(HttpResponse::Ok().json(user))
}

// City endpoints
async fn list_cities(state: web::Data<AppState>, user: AuthUser) -> Result<HttpResponse, AppError> {
    let listing =
        cities::list_cities(state.store.as_ref(), state.weather.as_ref(), user.user_id).await?;
    Ok(HttpResponse::Ok().json(listing))
}

async fn add_city(
    state: web::Data<AppState>,
    user: AuthUser,
    req: web::Json<AddCityRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate()
        .map_err(|e| AppError::Validation(first_validation_message(&e)))?;

    let city = cities::add_city(
        state.store.as_ref(),
        state.weather.as_ref(),
        user.user_id,
        &req.city_name,
    )
    .await?;

    Ok(HttpResponse::Created().json(city))
}

async fn toggle_favorite(
    state: web::Data<AppState>,
    user: AuthUser,
    city_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let city = cities::toggle_favorite(state.store.as_ref(), user.user_id, *city_id).await?;
    Ok(HttpResponse::Ok().json(city))
}

async fn delete_city(
    state: web::Data<AppState>,
    user: AuthUser,
    city_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    cities::delete_city(state.store.as_ref(), user.user_id, *city_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "City removed" })))
}

// AI endpoints
async fn weather_analysis(
    state: web::Data<AppState>,
    user: AuthUser,
    city_name: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let city = state
        .store
        .find_city_by_name(user.user_id, &city_name)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("City \"{}\" not found in your dashboard.", city_name))
        })?;

    let report = state.weather.fetch(&city.city_name).await.map_err(|e| {
        warn!("Weather fetch for analysis of {} failed: {}", city.city_name, e);
        AppError::BadGateway("Failed to fetch weather data for AI analysis.".to_string())
    })?;

    let input = AnalysisInput {
        city_name: city.city_name.clone(),
        country: city.country.clone(),
        current: report.current_weather(),
        forecast: report.forecast(),
    };

    let analysis = pipeline::run(state.model.as_ref(), &input).await.map_err(|e| {
        error!("❌ AI analysis failed for {}: {}", city.city_name, e);
        AppError::dependency("AI analysis failed.", e)
    })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "city": input.city_name,
        "country": input.country,
        "currentWeather": input.current,
        "aiSummary": analysis.summary,
        "aiPrediction": analysis.prediction,
        "aiAlerts": analysis.alerts,
        "riskScore": analysis.risk
    })))
}

async fn chat(
    state: web::Data<AppState>,
    _user: AuthUser,
    req: web::Json<ChatRequest>,
) -> Result<HttpResponse, AppError> {
    let message = req.message.as_deref().unwrap_or_default();
    let cities = req.cities.as_deref().unwrap_or_default();

    let reply = chat::reply(state.model.as_ref(), message, cities)
        .await
        .map_err(|e| match e {
            AppError::Validation(_) => e,
            other => {
                error!("❌ Chat failed: {}", other);
                AppError::dependency("Chat failed.", other)
            }
        })?;

    Ok(HttpResponse::Ok().json(ChatReply { reply }))
}
