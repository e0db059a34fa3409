//! Integration tests for story lifecycle, likes and views.

mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use common::{
    authed_json_request, authed_request, create_authenticated_user, create_story, TestApp,
    TestUser,
};
use serde_json::json;
use uuid::Uuid;

async fn insert_expired_story(app: &TestApp, user: &TestUser) -> Uuid {
    let created = Utc::now() - Duration::hours(25);
    sqlx::query_scalar(
        "INSERT INTO stories (user_id, image, created_at, expires_at) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(Uuid::parse_str(&user.id).unwrap())
    .bind("https://cdn.example.com/old.jpg")
    .bind(created)
    .bind(created + Duration::hours(24))
    .fetch_one(&app.pool)
    .await
    .unwrap()
}

#[tokio::test]
async fn test_create_story() {
    let app = TestApp::new().await;
    let user = create_authenticated_user(&app).await;

    let (status, body) = app
        .call(authed_json_request(
            Method::POST,
            "/api/stories",
            &user.token,
            json!({
                "image": "data:image/png;base64,iVBORw0KGgo=",
                "locationName": "  Old Town  ",
                "latitude": 24.7136,
                "longitude": 46.6753
            }),
        ))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    let story = &body["data"];
    assert_eq!(story["userId"], user.id);
    assert_eq!(story["locationName"], "Old Town");
    assert_eq!(story["latitude"], 24.7136);
    assert_eq!(story["likesCount"], 0);
    assert_eq!(story["viewsCount"], 0);
    assert_eq!(story["likedByMe"], false);

    let created: chrono::DateTime<Utc> =
        serde_json::from_value(story["createdAt"].clone()).unwrap();
    let expires: chrono::DateTime<Utc> =
        serde_json::from_value(story["expiresAt"].clone()).unwrap();
    assert_eq!(expires - created, Duration::hours(24));
}

#[tokio::test]
async fn test_create_story_validation() {
    let app = TestApp::new().await;
    let user = create_authenticated_user(&app).await;

    let cases = [
        (json!({}), None),
        (json!({ "image": "" }), None),
        (
            json!({ "image": "https://cdn.example.com/a.jpg", "latitude": 10.0 }),
            Some("Latitude and longitude must be provided together"),
        ),
        (
            json!({ "image": "https://cdn.example.com/a.jpg", "latitude": 91.0, "longitude": 0.0 }),
            None,
        ),
        (json!({ "image": "data:text/plain;base64,aGVsbG8=" }), None),
        (json!({ "image": "file:///etc/passwd" }), None),
    ];

    for (payload, message) in cases {
        let (status, body) = app
            .call(authed_json_request(
                Method::POST,
                "/api/stories",
                &user.token,
                payload.clone(),
            ))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {}", payload);
        if let Some(message) = message {
            assert_eq!(body["error"]["message"], message);
        }
    }
}

#[tokio::test]
async fn test_inline_image_size_limit() {
    let app = TestApp::with_config(common::test_config_with(&[(
        "limits.max_image_bytes",
        "16",
    )]))
    .await;
    let user = create_authenticated_user(&app).await;

    // 24 bytes once decoded
    let (status, _) = app
        .call(authed_json_request(
            Method::POST,
            "/api/stories",
            &user.token,
            json!({ "image": "data:image/jpeg;base64,AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA" }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_my_stories_and_user_stories() {
    let app = TestApp::new().await;
    let owner = create_authenticated_user(&app).await;
    let viewer = create_authenticated_user(&app).await;

    let first = create_story(&app, &owner, None).await;
    let second = create_story(&app, &owner, None).await;
    insert_expired_story(&app, &owner).await;

    let (status, body) = app
        .call(authed_request(Method::GET, "/api/stories/me", &owner.token))
        .await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<_> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_str().unwrap().to_string())
        .collect();
    // newest first, expired hidden
    assert_eq!(ids, vec![second.clone(), first]);

    let (status, body) = app
        .call(authed_request(
            Method::GET,
            &format!("/api/stories/user/{}", owner.id),
            &viewer.token,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (status, _) = app
        .call(authed_request(
            Method::GET,
            &format!("/api/stories/user/{}", Uuid::new_v4()),
            &viewer.token,
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_story() {
    let app = TestApp::new().await;
    let user = create_authenticated_user(&app).await;
    let story = create_story(&app, &user, None).await;
    let expired = insert_expired_story(&app, &user).await;

    let (status, body) = app
        .call(authed_request(
            Method::GET,
            &format!("/api/stories/{}", story),
            &user.token,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], story);

    let (status, body) = app
        .call(authed_request(
            Method::GET,
            &format!("/api/stories/{}", expired),
            &user.token,
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "Story not found");

    let (status, _) = app
        .call(authed_request(Method::GET, "/api/stories/not-a-uuid", &user.token))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_story_owner_only() {
    let app = TestApp::new().await;
    let owner = create_authenticated_user(&app).await;
    let other = create_authenticated_user(&app).await;
    let story = create_story(&app, &owner, None).await;
    let uri = format!("/api/stories/{}", story);

    let (status, body) = app
        .call(authed_request(Method::DELETE, &uri, &other.token))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["message"], "You can only delete your own stories");

    let response = app
        .send(authed_request(Method::DELETE, &uri, &owner.token))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let (status, _) = app
        .call(authed_request(Method::DELETE, &uri, &owner.token))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_like_and_unlike() {
    let app = TestApp::new().await;
    let owner = create_authenticated_user(&app).await;
    let fan = create_authenticated_user(&app).await;
    let story = create_story(&app, &owner, None).await;
    let uri = format!("/api/stories/{}/like", story);

    let (status, body) = app.call(authed_request(Method::POST, &uri, &fan.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({ "liked": true, "likesCount": 1 }));

    let (status, body) = app.call(authed_request(Method::POST, &uri, &fan.token)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["message"], "Story already liked");

    // owners may like their own story
    let (_, body) = app.call(authed_request(Method::POST, &uri, &owner.token)).await;
    assert_eq!(body["data"]["likesCount"], 2);

    let (_, body) = app
        .call(authed_request(
            Method::GET,
            &format!("/api/stories/{}", story),
            &fan.token,
        ))
        .await;
    assert_eq!(body["data"]["likedByMe"], true);

    let (status, body) = app.call(authed_request(Method::DELETE, &uri, &fan.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({ "liked": false, "likesCount": 1 }));

    let (status, body) = app.call(authed_request(Method::DELETE, &uri, &fan.token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "Story not liked");
}

#[tokio::test]
async fn test_views_counted_once_per_viewer() {
    let app = TestApp::new().await;
    let owner = create_authenticated_user(&app).await;
    let viewer = create_authenticated_user(&app).await;
    let story = create_story(&app, &owner, None).await;
    let uri = format!("/api/stories/{}/view", story);

    let (_, body) = app.call(authed_request(Method::POST, &uri, &owner.token)).await;
    assert_eq!(body["data"], json!({ "counted": false, "viewsCount": 0 }));

    let (_, body) = app.call(authed_request(Method::POST, &uri, &viewer.token)).await;
    assert_eq!(body["data"], json!({ "counted": true, "viewsCount": 1 }));

    let (_, body) = app.call(authed_request(Method::POST, &uri, &viewer.token)).await;
    assert_eq!(body["data"], json!({ "counted": false, "viewsCount": 1 }));

    let (_, body) = app
        .call(authed_request(
            Method::GET,
            &format!("/api/stories/{}", story),
            &viewer.token,
        ))
        .await;
    assert_eq!(body["data"]["viewedByMe"], true);
}

#[tokio::test]
async fn test_interactions_on_expired_story() {
    let app = TestApp::new().await;
    let owner = create_authenticated_user(&app).await;
    let viewer = create_authenticated_user(&app).await;
    let expired = insert_expired_story(&app, &owner).await;

    for (method, suffix) in [
        (Method::POST, "like"),
        (Method::DELETE, "like"),
        (Method::POST, "view"),
    ] {
        let (status, _) = app
            .call(authed_request(
                method,
                &format!("/api/stories/{}/{}", expired, suffix),
                &viewer.token,
            ))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn test_update_location() {
    let app = TestApp::new().await;
    let user = create_authenticated_user(&app).await;

    let (status, body) = app
        .call(authed_json_request(
            Method::PUT,
            "/api/stories/location",
            &user.token,
            json!({ "latitude": 21.4858, "longitude": 39.1925 }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["latitude"], 21.4858);
    assert_eq!(body["data"]["longitude"], 39.1925);
    assert!(body["data"]["locationUpdatedAt"].is_string());

    let (status, _) = app
        .call(authed_json_request(
            Method::PUT,
            "/api/stories/location",
            &user.token,
            json!({ "latitude": 0.0, "longitude": 181.0 }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
