use axum::{
    debug_handler,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{db, include_res, res, session, AppResult};

#[derive(Debug, Deserialize)]
pub(crate) struct RoomForm {
    pub(crate) topic: String,
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) description: String,
}

pub(crate) fn topic_options(topics: &[db::TopicCount]) -> String {
    topics
        .iter()
        .map(|t| format!("<option value=\"{}\">", res::escape(&t.name)))
        .collect()
}

#[debug_handler]
pub(crate) async fn new_room_page(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(user) = session::current_user(&session, &db_pool).await? else {
        return Ok(Redirect::to("/login?return_url=/r/new").into_response());
    };

    let topics = db::search_topics(&db_pool, "").await?;

    let body = include_res!(str, "/pages/room_form.html")
        .replace("{nav}", &res::nav(Some(&user)))
        .replace("{action}", "/r/new")
        .replace("{topic_options}", &topic_options(&topics))
        .replace("{topic}", "")
        .replace("{name}", "")
        .replace("{description}", "");

    Ok(Html(body).into_response())
}

#[debug_handler]
pub(crate) async fn new_room(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(RoomForm { topic, name, description }): Form<RoomForm>,
) -> AppResult<Response> {
    let Some(user) = session::current_user(&session, &db_pool).await? else {
        return Ok(Redirect::to("/login?return_url=/r/new").into_response());
    };

    let room_id = db::create_room(&db_pool, &user.id, &topic, &name, &description).await?;
    tracing::info!(room = %room_id, host = %user.username, "room created");

    Ok(Redirect::to("/").into_response())
}
