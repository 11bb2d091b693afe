//! Authentication API endpoints.
//!
//! - POST `/register` - Create an account, returns an access token
//! - POST `/login` - Verify credentials, returns an access token and sets
//!   the refresh-token cookie
//! - POST `/refresh` - Exchange the refresh-token cookie for a new access token
//! - POST `/logout` - Clear the refresh-token cookie
//! - GET `/profile` - Whoami for the authenticated subject
//!
//! The server keeps no token state: logout cannot invalidate access tokens
//! that are already out there; they lapse on their own expiry.

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header::SET_COOKIE},
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

use super::error::{ApiError, ResultExt};
use crate::auth::{
    AuthUser, HasAuthState, REFRESH_COOKIE_NAME, clear_refresh_cookie, get_cookie, refresh_cookie,
};
use crate::db::Database;
use crate::jwt::JwtConfig;

/// Cookie max-age when the user asked to be remembered: 7 days.
const REMEMBER_ME_COOKIE_SECS: u64 = 7 * 24 * 60 * 60;

/// Cookie max-age for a plain login: 1 day. The refresh token inside is
/// still signed for 7 days; the shorter of the two wins.
const DEFAULT_COOKIE_SECS: u64 = 24 * 60 * 60;

#[derive(Clone)]
pub struct AuthState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
    pub secure_cookies: bool,
}

impl HasAuthState for AuthState {
    fn jwt(&self) -> &JwtConfig {
        &self.jwt
    }
}

pub fn router(state: AuthState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .route("/profile", get(profile))
        .with_state(state)
}

#[derive(Serialize)]
struct UserInfo {
    id: String,
    name: String,
    email: String,
}

impl UserInfo {
    fn from_user(user: &crate::db::User) -> Self {
        Self {
            id: user.uuid.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Deserialize)]
struct RegisterRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Serialize)]
struct RegisterResponse {
    message: &'static str,
    token: String,
    user: UserInfo,
}

/// Register a new account. Duplicate emails are rejected before any
/// hashing work; only an access token is issued (no refresh cookie on
/// signup - the first login sets it).
async fn register(
    State(state): State<AuthState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = payload.name.trim();
    let email = payload.email.trim();

    if name.is_empty() || email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::bad_request("All fields are required"));
    }

    let taken = state
        .db
        .users()
        .email_taken(email)
        .await
        .db_err("Failed to check email")?;

    if taken {
        return Err(ApiError::bad_request("User already exists"));
    }

    let password_hash = bcrypt::hash(&payload.password, bcrypt::DEFAULT_COST).map_err(|e| {
        error!("Failed to hash password: {}", e);
        ApiError::internal("Something went wrong")
    })?;

    let uuid = uuid::Uuid::new_v4().to_string();

    state
        .db
        .users()
        .create(&uuid, name, email, &password_hash)
        .await
        .map_err(|e| {
            error!("Failed to create user: {}", e);
            ApiError::internal("Something went wrong")
        })?;

    let access = state.jwt.generate_access_token(&uuid).map_err(|e| {
        error!("Failed to generate access token: {}", e);
        ApiError::internal("Something went wrong")
    })?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully",
            token: access.token,
            user: UserInfo {
                id: uuid,
                name: name.to_string(),
                email: email.to_string(),
            },
        }),
    ))
}

#[derive(Deserialize)]
struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default, rename = "rememberMe")]
    remember_me: bool,
}

#[derive(Serialize)]
struct LoginResponse {
    token: String,
    user: UserInfo,
}

/// Log in with email and password. Unknown email and wrong password get
/// the same answer so the response does not leak which one it was.
async fn login(
    State(state): State<AuthState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .users()
        .get_by_email(payload.email.trim())
        .await
        .db_err("Failed to look up user")?
        .ok_or_else(|| ApiError::bad_request("Invalid credentials"))?;

    let matches = bcrypt::verify(&payload.password, &user.password_hash).map_err(|e| {
        error!("Failed to verify password: {}", e);
        ApiError::internal("Something went wrong")
    })?;

    if !matches {
        return Err(ApiError::bad_request("Invalid credentials"));
    }

    let access = state.jwt.generate_access_token(&user.uuid).map_err(|e| {
        error!("Failed to generate access token: {}", e);
        ApiError::internal("Something went wrong")
    })?;
    let refresh = state.jwt.generate_refresh_token(&user.uuid).map_err(|e| {
        error!("Failed to generate refresh token: {}", e);
        ApiError::internal("Something went wrong")
    })?;

    let max_age = if payload.remember_me {
        REMEMBER_ME_COOKIE_SECS
    } else {
        DEFAULT_COOKIE_SECS
    };
    let cookie = refresh_cookie(&refresh.token, max_age, state.secure_cookies);

    Ok((
        StatusCode::OK,
        [(SET_COOKIE, cookie)],
        Json(LoginResponse {
            token: access.token,
            user: UserInfo::from_user(&user),
        }),
    ))
}

#[derive(Serialize)]
struct TokenResponse {
    token: String,
}

/// Mint a new access token from the refresh-token cookie.
///
/// Deliberately does not require an access token - this endpoint exists
/// to recover from an expired one. The refresh token itself is not
/// rotated: the same cookie keeps working until its own expiry, and only
/// a fresh login replaces it.
async fn refresh(
    State(state): State<AuthState>,
    request: axum::extract::Request,
) -> Result<impl IntoResponse, ApiError> {
    let (parts, _body) = request.into_parts();

    let refresh_token = get_cookie(&parts.headers, REFRESH_COOKIE_NAME)
        .ok_or_else(|| ApiError::unauthorized("No refresh token"))?;

    let claims = state
        .jwt
        .validate_refresh_token(refresh_token)
        .map_err(|_| ApiError::forbidden("Invalid refresh token"))?;

    let access = state.jwt.generate_access_token(&claims.sub).map_err(|e| {
        error!("Failed to generate access token: {}", e);
        ApiError::internal("Server error")
    })?;

    Ok((StatusCode::OK, Json(TokenResponse { token: access.token })))
}

#[derive(Serialize)]
struct LogoutResponse {
    message: &'static str,
}

/// Clear the refresh-token cookie. Access tokens already issued stay
/// valid until they expire; there is no server-side registry to revoke
/// them from.
async fn logout(State(state): State<AuthState>) -> impl IntoResponse {
    let cookie = clear_refresh_cookie(state.secure_cookies);
    (
        StatusCode::OK,
        [(SET_COOKIE, cookie)],
        Json(LogoutResponse {
            message: "Logged out successfully",
        }),
    )
}

#[derive(Serialize)]
struct ProfileResponse {
    message: &'static str,
    #[serde(rename = "userId")]
    user_id: String,
}

async fn profile(AuthUser(claims): AuthUser) -> impl IntoResponse {
    Json(ProfileResponse {
        message: "Access granted",
        user_id: claims.sub,
    })
}
