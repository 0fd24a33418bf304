use crate::error::AppError;
use crate::models::{TrackedCity, User};
use async_trait::async_trait;
use uuid::Uuid;

/// Persistence for users and their tracked cities.
///
/// City names are matched case-insensitively. Every city lookup is scoped to
/// its owner, so one user can never see or change another user's cities.
#[async_trait]
pub trait Store: Send + Sync {
    async fn create_user(&self, username: &str, email: &str, password_hash: &str) -> Result<User, AppError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
    async fn find_user_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<User>, AppError>;
    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, AppError>;

    /// Newest first.
    async fn list_cities(&self, user_id: Uuid) -> Result<Vec<TrackedCity>, AppError>;
    async fn find_city_by_name(&self, user_id: Uuid, city_name: &str) -> Result<Option<TrackedCity>, AppError>;
    async fn get_city(&self, user_id: Uuid, city_id: Uuid) -> Result<Option<TrackedCity>, AppError>;
    async fn insert_city(&self, city: &TrackedCity) -> Result<(), AppError>;
    /// Overwrites the stored document. Last write wins.
    async fn save_city(&self, city: &TrackedCity) -> Result<(), AppError>;
    /// Returns false when nothing matched.
    async fn delete_city(&self, user_id: Uuid, city_id: Uuid) -> Result<bool, AppError>;
}
