//! Bookable resources (simulator bays, rooms)

use axum::{extract::State, routing::get, Json, Router};
use ehc_common::db::models::Resource;

use crate::{ApiResult, AppState};

/// GET /api/resources
pub async fn list_resources(State(state): State<AppState>) -> ApiResult<Json<Vec<Resource>>> {
    let resources =
        sqlx::query_as::<_, Resource>("SELECT id, name, type FROM resources ORDER BY type, name")
            .fetch_all(&state.db)
            .await?;

    Ok(Json(resources))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/resources", get(list_resources))
}
