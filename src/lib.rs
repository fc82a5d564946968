pub mod activity;
pub mod appresult;
pub mod auth;
pub mod db;
pub mod index;
pub mod profiles;
pub mod res;
pub mod rooms;
pub mod session;
pub mod topics;

use std::path::PathBuf;

use axum::{extract::FromRef, routing::get, Router};
use sqlx::SqlitePool;
use tower_http::services::ServeDir;

pub use appresult::{AppError, AppResult};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub avatar_dir: PathBuf,
}

pub fn router(app_state: AppState) -> Router {
    let avatar_dir = app_state.avatar_dir.clone();

    Router::new()
        .route("/", get(index::home))
        .route("/topics", get(topics::topics_page))
        .route("/activity", get(activity::activity_page))

        .merge(auth::router())
        .nest("/r", rooms::router())
        .nest("/m", rooms::message_router())
        .nest("/p", profiles::router())

        .nest_service("/avatars", ServeDir::new(avatar_dir))
        .with_state(app_state)
}
