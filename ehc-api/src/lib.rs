//! ehc-api library - club data REST service
//!
//! Routes are grouped by the role they require. Staff and admin groups are
//! gated by middleware that resolves the caller from the `x-user-email`
//! header against the admin and staff directories.

use axum::{middleware, Router};
use sqlx::SqlitePool;

pub mod api;
pub mod error;

pub use error::{ApiError, ApiResult};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
}

impl AppState {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let staff = Router::new()
        .merge(api::bookings::staff_routes())
        .merge(api::events::staff_routes())
        .merge(api::training::staff_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth::require_staff_or_admin,
        ));

    let admin = Router::new()
        .merge(api::gallery::admin_routes())
        .merge(api::training::admin_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth::require_admin,
        ));

    let public = Router::new()
        .merge(api::health_routes())
        .merge(api::resources::routes())
        .merge(api::bookings::routes())
        .merge(api::events::routes())
        .merge(api::gallery::routes());

    Router::new()
        .merge(public)
        .merge(staff)
        .merge(admin)
        .with_state(state)
}
