use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use parley::{db, AppState};
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;
use tower_sessions::{MemoryStore, SessionManagerLayer};
use uuid::Uuid;

async fn app() -> Router {
    let db_pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    db::migrate(&db_pool).await.unwrap();

    let avatar_dir = std::env::temp_dir().join("parley-test-avatars");
    let session_layer = SessionManagerLayer::new(MemoryStore::default()).with_secure(false);

    parley::router(AppState { db_pool, avatar_dir }).layer(session_layer)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn home_renders_without_a_session() {
    let response = app().await.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn public_pages_render() {
    let app = app().await;
    for uri in ["/topics", "/activity", "/login", "/register"] {
        let response = app.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "GET {uri}");
    }
}

#[tokio::test]
async fn unknown_room_is_not_found() {
    let response = app()
        .await
        .oneshot(get(&format!("/r/{}", Uuid::now_v7())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_profile_is_not_found() {
    let response = app()
        .await
        .oneshot(get(&format!("/p/{}", Uuid::now_v7())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn room_edit_redirects_anonymous_callers_to_login() {
    let room_id = Uuid::now_v7();
    let response = app()
        .await
        .oneshot(get(&format!("/r/{room_id}/edit")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(location.starts_with("/login"), "redirected to {location}");
}

#[tokio::test]
async fn room_create_redirects_anonymous_callers_to_login() {
    let response = app().await.oneshot(get("/r/new")).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert_eq!(location, "/login?return_url=/r/new");
}

#[tokio::test]
async fn posting_a_message_requires_a_session() {
    let room_id = Uuid::now_v7();
    let request = Request::builder()
        .method("POST")
        .uri(format!("/r/{room_id}"))
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("body=hello"))
        .unwrap();

    let response = app().await.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(location.starts_with("/login"), "redirected to {location}");
}
