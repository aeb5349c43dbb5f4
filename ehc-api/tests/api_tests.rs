//! Integration tests for health, resources, events, RSVPs and gallery

mod common;

use axum::http::StatusCode;
use common::{send, setup_app, ADMIN, STAFF, VIP_MEMBER};
use serde_json::json;

// =============================================================================
// Health and resources
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_no_auth_required() {
    let (app, _pool) = setup_app().await;

    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "ehc-api");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_resources_ordered_by_type_then_name() {
    let (app, _pool) = setup_app().await;

    let (status, body) = send(&app, "GET", "/api/resources", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let resources = body.as_array().unwrap();
    assert_eq!(resources.len(), 2);
    assert_eq!(resources[0]["name"], "Conference Room");
    assert_eq!(resources[0]["type"], "conference_room");
    assert_eq!(resources[1]["name"], "Bay 1");
}

#[tokio::test]
async fn test_unknown_route_is_not_found_without_identity() {
    let (app, _pool) = setup_app().await;

    let (status, _) = send(&app, "GET", "/api/nothing-here", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Events
// =============================================================================

#[tokio::test]
async fn test_create_event_requires_staff() {
    let (app, _pool) = setup_app().await;
    let event = json!({ "title": "Members Mixer", "event_date": "2999-06-01" });

    let (status, body) = send(&app, "POST", "/api/events", None, Some(event.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let (status, body) = send(&app, "POST", "/api/events", Some(VIP_MEMBER), Some(event.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    let (status, body) = send(&app, "POST", "/api/events", Some(STAFF), Some(event)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["title"], "Members Mixer");
    assert_eq!(body["event_date"], "2999-06-01");
}

#[tokio::test]
async fn test_create_event_validation() {
    let (app, _pool) = setup_app().await;

    let (status, _) = send(&app, "POST", "/api/events", Some(STAFF), Some(json!({ "event_date": "2999-06-01" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "POST", "/api/events", Some(STAFF), Some(json!({ "title": "No date" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/api/events",
        Some(STAFF),
        Some(json!({ "title": "Bad date", "event_date": "June 1st" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_events_upcoming_by_default() {
    let (app, _pool) = setup_app().await;
    for (title, date) in [("Later", "2999-07-01"), ("Past", "2000-01-01"), ("Sooner", "2999-06-01")] {
        let (status, _) = send(
            &app,
            "POST",
            "/api/events",
            Some(ADMIN),
            Some(json!({ "title": title, "event_date": date })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, body) = send(&app, "GET", "/api/events", None, None).await;
    let titles: Vec<&str> = body.as_array().unwrap().iter().map(|e| e["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["Sooner", "Later"]);

    let (_, body) = send(&app, "GET", "/api/events?include_past=true", None, None).await;
    assert_eq!(body.as_array().unwrap().len(), 3);

    let (_, body) = send(&app, "GET", "/api/events?date=2000-01-01", None, None).await;
    assert_eq!(body[0]["title"], "Past");
}

#[tokio::test]
async fn test_update_and_delete_event() {
    let (app, _pool) = setup_app().await;
    let (_, event) = send(
        &app,
        "POST",
        "/api/events",
        Some(STAFF),
        Some(json!({ "title": "Mixer", "event_date": "2999-06-01", "location": "Lounge" })),
    )
    .await;
    let id = event["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/events/{}", id),
        Some(STAFF),
        Some(json!({ "start_time": "18:30" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["start_time"], "18:30:00");
    assert_eq!(body["location"], "Lounge");

    let (status, _) = send(&app, "DELETE", &format!("/api/events/{}", id), Some(STAFF), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "DELETE", &format!("/api/events/{}", id), Some(STAFF), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "PUT", "/api/events/999", Some(STAFF), Some(json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// RSVPs
// =============================================================================

#[tokio::test]
async fn test_rsvp_lifecycle() {
    let (app, _pool) = setup_app().await;
    let (_, event) = send(
        &app,
        "POST",
        "/api/events",
        Some(STAFF),
        Some(json!({ "title": "Tasting", "event_date": "2999-06-01", "start_time": "19:00" })),
    )
    .await;
    let event_id = event["id"].as_i64().unwrap();

    let (status, rsvp) = send(
        &app,
        "POST",
        "/api/rsvps",
        None,
        Some(json!({ "event_id": event_id, "user_email": "Guest@Example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(rsvp["status"], "confirmed");
    assert_eq!(rsvp["user_email"], "guest@example.com");

    let (_, list) = send(&app, "GET", "/api/rsvps?user_email=guest@example.com", None, None).await;
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["title"], "Tasting");
    assert_eq!(list[0]["start_time"], "19:00:00");

    let (status, body) = send(
        &app,
        "DELETE",
        &format!("/api/rsvps/{}/guest@example.com", event_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (_, list) = send(&app, "GET", "/api/rsvps?user_email=guest@example.com", None, None).await;
    assert!(list.as_array().unwrap().is_empty());

    // Re-RSVP confirms the same row
    let (status, again) = send(
        &app,
        "POST",
        "/api/rsvps",
        None,
        Some(json!({ "event_id": event_id, "user_email": "guest@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(again["id"], rsvp["id"]);
    assert_eq!(again["status"], "confirmed");
}

#[tokio::test]
async fn test_rsvp_validation_and_past_events_hidden() {
    let (app, _pool) = setup_app().await;

    let (status, _) = send(&app, "POST", "/api/rsvps", None, Some(json!({ "event_id": 1 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/api/rsvps",
        None,
        Some(json!({ "event_id": 404, "user_email": "a@x.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, past) = send(
        &app,
        "POST",
        "/api/events",
        Some(STAFF),
        Some(json!({ "title": "Old", "event_date": "2000-01-01" })),
    )
    .await;
    let (status, _) = send(
        &app,
        "POST",
        "/api/rsvps",
        None,
        Some(json!({ "event_id": past["id"], "user_email": "a@x.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, list) = send(&app, "GET", "/api/rsvps", None, None).await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let (app, _pool) = setup_app().await;

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/rsvps")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let response = tower::util::ServiceExt::oneshot(app, request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Gallery
// =============================================================================

#[tokio::test]
async fn test_gallery_admin_crud_and_public_shape() {
    let (app, _pool) = setup_app().await;

    let image = json!({ "title": "Bay view", "image_url": "/img/bay.webp", "sort_order": 2 });
    let (status, _) = send(&app, "POST", "/api/admin/gallery", Some(STAFF), Some(image.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, first) = send(&app, "POST", "/api/admin/gallery", Some(ADMIN), Some(image)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app,
        "POST",
        "/api/admin/gallery",
        Some(ADMIN),
        Some(json!({ "title": "Bar", "image_url": "/img/bar.webp", "category": "interior", "sort_order": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(&app, "POST", "/api/admin/gallery", Some(ADMIN), Some(json!({ "title": "No url" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, list) = send(&app, "GET", "/api/gallery", None, None).await;
    assert_eq!(
        list,
        json!([
            { "id": list[0]["id"], "img": "/img/bar.webp", "category": "interior", "title": "Bar" },
            { "id": first["id"], "img": "/img/bay.webp", "category": "venue", "title": "Bay view" },
        ])
    );

    let (_, venue) = send(&app, "GET", "/api/gallery?category=venue", None, None).await;
    assert_eq!(venue.as_array().unwrap().len(), 1);
    assert_eq!(venue[0]["title"], "Bay view");

    let id = first["id"].as_i64().unwrap();
    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/api/admin/gallery/{}", id),
        Some(ADMIN),
        Some(json!({ "title": "Bay 1 view" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Bay 1 view");
    assert_eq!(updated["image_url"], "/img/bay.webp");

    let (status, _) = send(&app, "DELETE", &format!("/api/admin/gallery/{}", id), Some(ADMIN), None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, list) = send(&app, "GET", "/api/gallery", None, None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "PUT", "/api/admin/gallery/999", Some(ADMIN), Some(json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "DELETE", "/api/admin/gallery/999", Some(ADMIN), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// File-backed database
// =============================================================================

#[tokio::test]
async fn test_router_over_file_database() {
    let dir = tempfile::tempdir().unwrap();
    let pool = ehc_common::db::init_database(&dir.path().join("data").join("ehc.db"))
        .await
        .unwrap();
    let app = ehc_api::build_router(ehc_api::AppState::new(pool));

    let (status, body) = send(&app, "GET", "/api/resources", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());

    let (status, body) = send(&app, "GET", "/api/gallery", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}
