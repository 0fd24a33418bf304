//! Registration, login and bearer-token verification.

use crate::error::{first_validation_message, AppError};
use crate::models::{AuthResponse, LoginRequest, RegisterRequest};
use crate::store::Store;
use crate::AppState;
use actix_web::{dev::Payload, http::header::AUTHORIZATION, web, FromRequest, HttpRequest};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use log::info;
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct AuthService {
    jwt_secret: String,
    token_expiry_hours: i64,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(jwt_secret: String, token_expiry_hours: i64) -> Self {
        Self {
            jwt_secret,
            token_expiry_hours,
            bcrypt_cost: DEFAULT_COST,
        }
    }

    #[cfg(test)]
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    pub fn issue_token(&self, user_id: Uuid, username: &str) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            username: username.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.token_expiry_hours)).timestamp(),
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )?)
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, AppError> {
        Ok(decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )?
        .claims)
    }

    pub async fn register(
        &self,
        store: &dyn Store,
        req: &RegisterRequest,
    ) -> Result<AuthResponse, AppError> {
        req.validate()
            .map_err(|e| AppError::Validation(first_validation_message(&e)))?;

        if store.find_user_by_username_or_email(&req.username, &req.email).await?.is_some() {
            return Err(AppError::Validation("User already exists".to_string()));
        }

        let password_hash = hash(&req.password, self.bcrypt_cost)?;
        let user = store.create_user(&req.username, &req.email, &password_hash).await?;
        info!("✅ User registered: {}", user.username);

        Ok(AuthResponse {
            token: self.issue_token(user.id, &user.username)?,
            username: user.username,
        })
    }

    pub async fn login(&self, store: &dyn Store, req: &LoginRequest) -> Result<AuthResponse, AppError> {
        req.validate()
            .map_err(|e| AppError::Validation(first_validation_message(&e)))?;

        let invalid = || AppError::Validation("Invalid credentials".to_string());
        let user = store
            .find_user_by_username(&req.username)
            .await?
            .ok_or_else(invalid)?;

        if !verify(&req.password, &user.password_hash)? {
            return Err(invalid());
        }

        Ok(AuthResponse {
            token: self.issue_token(user.id, &user.username)?,
            username: user.username,
        })
    }
}

/// The caller identified by a valid bearer token.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: Uuid,
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthUser, AppError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| AppError::Internal("Application state not configured".to_string()))?;

    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("No token, authorization denied".to_string()))?;

    let claims = state
        .auth
        .verify_token(token)
        .map_err(|_| AppError::Unauthorized("Token is not valid".to_string()))?;

    Ok(AuthUser { user_id: claims.sub })
}
