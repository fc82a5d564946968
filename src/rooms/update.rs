use axum::{
    debug_handler,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{db, include_res, res, session, AppError, AppResult};

use super::new::{topic_options, RoomForm};

#[debug_handler]
pub(crate) async fn edit_room_page(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Path(room_id): Path<Uuid>,
) -> AppResult<Response> {
    let Some(user) = session::current_user(&session, &db_pool).await? else {
        return Ok(Redirect::to(&format!("/login?return_url=/r/{room_id}/edit")).into_response());
    };

    let room = db::room_listing_by_id(&db_pool, &room_id.to_string())
        .await?
        .ok_or(AppError::NotFound)?;
    if room.host_id != user.id {
        return Err(AppError::forbidden("Only the host can edit the room."));
    }

    let topics = db::search_topics(&db_pool, "").await?;

    let body = include_res!(str, "/pages/room_form.html")
        .replace("{nav}", &res::nav(Some(&user)))
        .replace("{action}", &format!("/r/{room_id}/edit"))
        .replace("{topic_options}", &topic_options(&topics))
        .replace("{topic}", &res::escape(&room.topic_name))
        .replace("{name}", &res::escape(&room.name))
        .replace("{description}", &res::escape(&room.description));

    Ok(Html(body).into_response())
}

#[debug_handler]
pub(crate) async fn edit_room(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Path(room_id): Path<Uuid>,
    Form(RoomForm { topic, name, description }): Form<RoomForm>,
) -> AppResult<Response> {
    let Some(user) = session::current_user(&session, &db_pool).await? else {
        return Ok(Redirect::to(&format!("/login?return_url=/r/{room_id}/edit")).into_response());
    };

    db::update_room(&db_pool, &user.id, &room_id.to_string(), &topic, &name, &description).await?;

    Ok(Redirect::to("/").into_response())
}
