mod auth;
mod error;
mod tasks;

use axum::Router;
use std::sync::Arc;

use crate::db::Database;
use crate::jwt::JwtConfig;

/// Create the API router.
pub fn create_api_router(db: Database, jwt: Arc<JwtConfig>, secure_cookies: bool) -> Router {
    let auth_state = auth::AuthState {
        db: db.clone(),
        jwt: jwt.clone(),
        secure_cookies,
    };

    let tasks_state = tasks::TasksState { db, jwt };

    Router::new()
        .nest("/auth", auth::router(auth_state))
        .nest("/tasks", tasks::router(tasks_state))
}
