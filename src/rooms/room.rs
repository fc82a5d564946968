use axum::{
    debug_handler,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{db, include_res, res, session, AppError, AppResult};

use super::msg;

#[debug_handler]
pub(crate) async fn room_page(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Path(room_id): Path<Uuid>,
) -> AppResult<Response> {
    let room_id = room_id.to_string();
    let user = session::current_user(&session, &db_pool).await?;

    let room = db::room_listing_by_id(&db_pool, &room_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let messages = db::room_messages(&db_pool, &room_id).await?;
    let participants = db::participants(&db_pool, &room_id).await?;

    let caller_id = user.as_ref().map(|u| u.id.as_str());
    let message_items: String = messages
        .iter()
        .map(|m| msg::message_html(m, caller_id))
        .collect();

    let participant_items: String = participants
        .iter()
        .map(|(id, username)| {
            format!(
                r#"<li><a href="/p/{id}">@{}</a></li>"#,
                res::escape(username)
            )
        })
        .collect();

    let composer = if user.is_some() {
        include_res!(str, "/pages/composer.html").replace("{room_id}", &room.id)
    } else {
        format!(
            r#"<p><a href="/login?return_url=/r/{}">Log in</a> to join the conversation.</p>"#,
            room.id
        )
    };

    let body = include_res!(str, "/pages/room.html")
        .replace("{nav}", &res::nav(user.as_ref()))
        .replace("{room_id}", &room.id)
        .replace("{room_name}", &res::escape(&room.name))
        .replace("{topic}", &res::escape(&room.topic_name))
        .replace("{description}", &res::escape(&room.description))
        .replace("{host_id}", &room.host_id)
        .replace("{host}", &res::escape(&room.host_username))
        .replace("{messages}", &message_items)
        .replace("{participants}", &participant_items)
        .replace("{composer}", &composer);

    Ok(Html(body).into_response())
}

#[derive(Debug, Deserialize)]
pub(crate) struct PostMessageForm {
    body: String,
}

/// Posting requires a logged-in caller; the author is joined to the room and
/// the browser is bounced back to the room view (redirect-after-post).
#[debug_handler]
pub(crate) async fn post_message(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Path(room_id): Path<Uuid>,
    Form(PostMessageForm { body }): Form<PostMessageForm>,
) -> AppResult<Response> {
    let Some(user) = session::current_user(&session, &db_pool).await? else {
        return Ok(Redirect::to(&format!("/login?return_url=/r/{room_id}")).into_response());
    };

    db::post_message(&db_pool, &user.id, &room_id.to_string(), &body).await?;

    Ok(Redirect::to(&format!("/r/{room_id}")).into_response())
}
