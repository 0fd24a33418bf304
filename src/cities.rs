use crate::error::AppError;
use crate::insights::{compute_insights, dashboard_alerts};
use crate::models::{CitiesResponse, CityView, CurrentWeather, TrackedCity};
use crate::store::Store;
use crate::weather::WeatherProvider;
use chrono::Utc;
use futures::future::join_all;
use log::{info, warn};
use uuid::Uuid;

pub async fn add_city(
    store: &dyn Store,
    weather: &dyn WeatherProvider,
    user_id: Uuid,
    city_name: &str,
) -> Result<TrackedCity, AppError> {
    if store.find_city_by_name(user_id, city_name).await?.is_some() {
        return Err(AppError::Validation("City already added".to_string()));
    }

    let report = weather.fetch(city_name).await.map_err(|e| {
        warn!("City lookup failed for {}: {}", city_name, e);
        AppError::Validation("City not found. Please check the city name.".to_string())
    })?;

    let (name, country) = report.place(city_name);
    let city = TrackedCity::new(user_id, name, country, report.snapshot(Utc::now()));
    store.insert_city(&city).await?;

    Ok(city)
}

/// Refreshes every city concurrently. A city whose refresh fails is returned
/// as a placeholder; it never fails the listing.
pub async fn list_cities(
    store: &dyn Store,
    weather: &dyn WeatherProvider,
    user_id: Uuid,
) -> Result<CitiesResponse, AppError> {
    let tracked = store.list_cities(user_id).await?;
    info!("📍 Refreshing {} cities for user {}", tracked.len(), user_id);

    let cities: Vec<CityView> = join_all(tracked.into_iter().map(|city| async move {
        match refresh_city(store, weather, city.clone()).await {
            Ok(view) => view,
            Err(e) => {
                warn!("⚠️  Weather unavailable for {}: {}", city.city_name, e);
                placeholder(&city)
            }
        }
    }))
    .await;

    let favorites = cities.iter().filter(|c| c.is_favorite).cloned().collect();
    Ok(CitiesResponse { favorites, cities })
}

async fn refresh_city(
    store: &dyn Store,
    weather: &dyn WeatherProvider,
    mut city: TrackedCity,
) -> Result<CityView, AppError> {
    let report = weather.fetch(&city.city_name).await?;

    city.push_snapshot(report.snapshot(Utc::now()));
    let insights = compute_insights(&report.current_conditions, &report.days);
    city.weather_insights = Some(insights.clone());
    store.save_city(&city).await?;

    Ok(CityView {
        id: city.id,
        city_name: city.city_name.clone(),
        country: city.country.clone(),
        is_favorite: city.is_favorite,
        current_weather: report.current_weather(),
        forecast: report.forecast(),
        alerts: dashboard_alerts(&report.current_conditions, &report.days),
        weather_history: city.recent_history(),
        weather_insights: Some(insights),
    })
}

fn placeholder(city: &TrackedCity) -> CityView {
    CityView {
        id: city.id,
        city_name: city.city_name.clone(),
        country: city.country.clone(),
        is_favorite: city.is_favorite,
        current_weather: CurrentWeather::unavailable(),
        forecast: Vec::new(),
        alerts: Vec::new(),
        weather_history: city.recent_history(),
        weather_insights: city.weather_insights.clone(),
    }
}

pub async fn toggle_favorite(store: &dyn Store, user_id: Uuid, city_id: Uuid) -> Result<TrackedCity, AppError> {
    let mut city = store
        .get_city(user_id, city_id)
        .await?
        .ok_or_else(|| AppError::NotFound("City not found".to_string()))?;

    city.is_favorite = !city.is_favorite;
    store.save_city(&city).await?;

    Ok(city)
}

pub async fn delete_city(store: &dyn Store, user_id: Uuid, city_id: Uuid) -> Result<(), AppError> {
    if !store.delete_city(user_id, city_id).await? {
        return Err(AppError::NotFound("City not found".to_string()));
    }
    info!("🗑️  City {} removed", city_id);
    Ok(())
}
