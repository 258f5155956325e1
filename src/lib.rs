pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod security;
pub mod services;

use std::sync::Arc;

use sqlx::PgPool;

use crate::services::SessionManager;

pub use crate::error::{AuthError, Result};

/// Shared application state, cloned into every worker.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub sessions: Arc<SessionManager>,
}
