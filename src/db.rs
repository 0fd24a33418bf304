use crate::error::AppError;
use crate::models::*;
use crate::store::Store;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool};
use std::future::Future;
use std::time::Duration;
use uuid::Uuid;

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct CityRow {
    id: Uuid,
    user_id: Uuid,
    city_name: String,
    country: String,
    is_favorite: bool,
    weather_history: Json<Vec<WeatherSnapshot>>,
    weather_insights: Option<Json<InsightRecord>>,
    created_at: DateTime<Utc>,
}

impl From<CityRow> for TrackedCity {
    fn from(row: CityRow) -> Self {
        TrackedCity {
            id: row.id,
            user_id: row.user_id,
            city_name: row.city_name,
            country: row.country,
            is_favorite: row.is_favorite,
            weather_history: row.weather_history.0,
            weather_insights: row.weather_insights.map(|j| j.0),
            created_at: row.created_at,
        }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|e| e.code())
        .map_or(false, |code| code == UNIQUE_VIOLATION)
}

/// Runs `attempt` once, then up to `retries` more times with `delay` between
/// tries. Returns whether any attempt succeeded.
pub async fn retry_fixed<F, Fut>(retries: u32, delay: Duration, mut attempt: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), AppError>>,
{
    let mut remaining = retries;
    loop {
        match attempt().await {
            Ok(()) => return true,
            Err(e) => {
                error!("❌ Database connection error: {}", e);
                if remaining == 0 {
                    return false;
                }
                info!(
                    "Retrying in {}s... ({} attempts left)",
                    delay.as_secs(),
                    remaining
                );
                remaining -= 1;
                tokio::time::sleep(delay).await;
            }
        }
    }
}

impl Database {
    /// Builds the pool without connecting. Nothing touches the network until
    /// the first query.
    pub fn connect_lazy(database_url: &str) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(10))
            .connect_lazy(database_url)?;

        Ok(Self { pool })
    }

    /// Checks reachability with a bounded fixed-delay retry. An unreachable
    /// database is logged, not fatal: storage calls fail until it comes back.
    pub async fn wait_until_reachable(&self, retries: u32, delay: Duration) -> bool {
        info!("🔌 Connecting to PostgreSQL database...");

        let reachable = retry_fixed(retries, delay, || self.ping()).await;
        if reachable {
            info!("✅ Database connection established");
        } else {
            warn!("Database unreachable after all retries. Server stays up but storage calls will fail.");
        }
        reachable
    }

    pub async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn init_schema(&self) -> Result<(), AppError> {
        info!("📋 Creating database schema...");

        let queries = vec![
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                username VARCHAR(50) UNIQUE NOT NULL,
                email VARCHAR(255) UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
            );
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS tracked_cities (
                id UUID PRIMARY KEY,
                user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                city_name VARCHAR(100) NOT NULL,
                country VARCHAR(100) NOT NULL DEFAULT '',
                is_favorite BOOLEAN NOT NULL DEFAULT false,
                weather_history JSONB NOT NULL DEFAULT '[]',
                weather_insights JSONB,
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
            );
            "#,
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_cities_user_name ON tracked_cities(user_id, LOWER(city_name));",
            "CREATE INDEX IF NOT EXISTS idx_cities_created_at ON tracked_cities(user_id, created_at DESC);",
        ];

        for (i, query) in queries.iter().enumerate() {
            info!("Executing migration query {} of {}", i + 1, queries.len());
            sqlx::query(query).execute(&self.pool).await?;
        }

        info!("✅ Database schema created successfully");
        Ok(())
    }
}

#[async_trait]
impl Store for Database {
    async fn create_user(&self, username: &str, email: &str, password_hash: &str) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Validation("User already exists".to_string())
            } else {
                AppError::Database(e)
            }
        })?;

        info!("✅ User created: {}", user.username);
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users WHERE username = $1 OR email = $2
            LIMIT 1
            "#,
        )
        .bind(username)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn list_cities(&self, user_id: Uuid) -> Result<Vec<TrackedCity>, AppError> {
        let rows = sqlx::query_as::<_, CityRow>(
            r#"
            SELECT * FROM tracked_cities
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(TrackedCity::from).collect())
    }

    async fn find_city_by_name(&self, user_id: Uuid, city_name: &str) -> Result<Option<TrackedCity>, AppError> {
        let row = sqlx::query_as::<_, CityRow>(
            r#"
            SELECT * FROM tracked_cities
            WHERE user_id = $1 AND LOWER(city_name) = LOWER($2)
            "#,
        )
        .bind(user_id)
        .bind(city_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(TrackedCity::from))
    }

    async fn get_city(&self, user_id: Uuid, city_id: Uuid) -> Result<Option<TrackedCity>, AppError> {
        let row = sqlx::query_as::<_, CityRow>(
            r#"
            SELECT * FROM tracked_cities
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(city_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(TrackedCity::from))
    }

    async fn insert_city(&self, city: &TrackedCity) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO tracked_cities
            (id, user_id, city_name, country, is_favorite, weather_history, weather_insights, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(city.id)
        .bind(city.user_id)
        .bind(&city.city_name)
        .bind(&city.country)
        .bind(city.is_favorite)
        .bind(Json(&city.weather_history))
        .bind(city.weather_insights.as_ref().map(Json))
        .bind(city.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Validation("City already added".to_string())
            } else {
                AppError::Database(e)
            }
        })?;

        info!("✅ City added: {} ({})", city.city_name, city.country);
        Ok(())
    }

    async fn save_city(&self, city: &TrackedCity) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE tracked_cities
            SET
                city_name = $3,
                country = $4,
                is_favorite = $5,
                weather_history = $6,
                weather_insights = $7
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(city.id)
        .bind(city.user_id)
        .bind(&city.city_name)
        .bind(&city.country)
        .bind(city.is_favorite)
        .bind(Json(&city.weather_history))
        .bind(city.weather_insights.as_ref().map(Json))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_city(&self, user_id: Uuid, city_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM tracked_cities WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(city_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
