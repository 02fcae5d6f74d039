use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Store;
use crate::services::{AccountService, SeaOrmAccountService};

pub mod auth;
mod error;
mod types;
mod users;

pub use error::ApiError;
pub use types::*;

pub struct AppState {
    pub config: Config,
    pub store: Store,
    accounts: Arc<dyn AccountService>,
}

impl AppState {
    #[must_use]
    pub fn accounts(&self) -> &Arc<dyn AccountService> {
        &self.accounts
    }
}

pub async fn create_app_state_from_config(config: Config) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    let accounts: Arc<dyn AccountService> = Arc::new(SeaOrmAccountService::new(
        store.clone(),
        config.security.clone(),
    ));

    Ok(Arc::new(AppState {
        config,
        store,
        accounts,
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config.server.cors_allowed_origins.clone();

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .route("/api", get(users::home))
        .route("/users", get(users::list_users))
        .route("/register", post(users::register))
        .route("/changePassword", put(users::change_password))
        .route("/forgetPassword", put(users::forget_password))
        .route("/admin/reset/{username}", put(users::admin_reset))
        .route("/delete", delete(users::delete_user))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::policy_middleware,
        ))
        .with_state(state)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}
