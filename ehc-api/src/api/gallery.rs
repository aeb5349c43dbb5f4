//! Venue photo gallery

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use ehc_common::db::models::GalleryImage;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{ApiError, ApiResult, AppState};

/// Category reported for images stored without one
pub const DEFAULT_CATEGORY: &str = "venue";

#[derive(Debug, Default, Deserialize)]
pub struct GalleryQuery {
    pub category: Option<String>,
}

/// Public gallery entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GalleryItem {
    pub id: i64,
    pub img: String,
    pub category: String,
    pub title: Option<String>,
}

impl From<GalleryImage> for GalleryItem {
    fn from(image: GalleryImage) -> Self {
        Self {
            id: image.id,
            img: image.image_url,
            category: image
                .category
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            title: image.title,
        }
    }
}

/// Body for admin create/update; on update absent fields are unchanged
#[derive(Debug, Default, Deserialize)]
pub struct GalleryImageRequest {
    pub title: Option<String>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub sort_order: Option<i64>,
    pub is_active: Option<bool>,
}

/// GET /api/gallery
pub async fn list_gallery(
    State(state): State<AppState>,
    Query(query): Query<GalleryQuery>,
) -> ApiResult<Json<Vec<GalleryItem>>> {
    let category = query.category.filter(|c| !c.trim().is_empty());

    let images = sqlx::query_as::<_, GalleryImage>(
        r#"
        SELECT * FROM gallery_images
        WHERE is_active = 1
          AND (? IS NULL OR COALESCE(NULLIF(category, ''), ?) = ?)
        ORDER BY sort_order, id
        "#,
    )
    .bind(&category)
    .bind(DEFAULT_CATEGORY)
    .bind(&category)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(images.into_iter().map(GalleryItem::from).collect()))
}

/// POST /api/admin/gallery (admin)
pub async fn create_image(
    State(state): State<AppState>,
    payload: Result<Json<GalleryImageRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<GalleryImage>)> {
    let Json(request) = payload?;

    let image_url = request
        .image_url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::BadRequest("image_url is required".to_string()))?;

    let image = sqlx::query_as::<_, GalleryImage>(
        r#"
        INSERT INTO gallery_images (title, image_url, category, sort_order, is_active)
        VALUES (?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&request.title)
    .bind(image_url)
    .bind(&request.category)
    .bind(request.sort_order.unwrap_or(0))
    .bind(request.is_active.unwrap_or(true))
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(image)))
}

/// PUT /api/admin/gallery/:id (admin)
pub async fn update_image(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<GalleryImageRequest>, JsonRejection>,
) -> ApiResult<Json<GalleryImage>> {
    let Json(request) = payload?;

    if matches!(request.image_url.as_deref().map(str::trim), Some("")) {
        return Err(ApiError::BadRequest("image_url cannot be empty".to_string()));
    }

    let image = sqlx::query_as::<_, GalleryImage>(
        r#"
        UPDATE gallery_images SET
            title = COALESCE(?, title),
            image_url = COALESCE(?, image_url),
            category = COALESCE(?, category),
            sort_order = COALESCE(?, sort_order),
            is_active = COALESCE(?, is_active)
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(&request.title)
    .bind(request.image_url.as_deref().map(str::trim))
    .bind(&request.category)
    .bind(request.sort_order)
    .bind(request.is_active)
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("Gallery image {} not found", id)))?;

    Ok(Json(image))
}

/// DELETE /api/admin/gallery/:id (admin) - hides the image
pub async fn deactivate_image(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let result = sqlx::query("UPDATE gallery_images SET is_active = 0 WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(format!("Gallery image {} not found", id)));
    }

    Ok(Json(json!({ "success": true })))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/gallery", get(list_gallery))
}

/// Routes requiring admin
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/gallery", post(create_image))
        .route(
            "/api/admin/gallery/:id",
            put(update_image).delete(deactivate_image),
        )
}
