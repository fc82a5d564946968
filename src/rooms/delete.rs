use axum::{
    debug_handler,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{db, include_res, res, session, AppError, AppResult};

/// GET renders the confirmation prompt; the actual delete only happens on
/// POST. Host-only, same as editing.
#[debug_handler]
pub(crate) async fn delete_room_page(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Path(room_id): Path<Uuid>,
) -> AppResult<Response> {
    let Some(user) = session::current_user(&session, &db_pool).await? else {
        return Ok(
            Redirect::to(&format!("/login?return_url=/r/{room_id}/delete")).into_response(),
        );
    };

    let room = db::room_by_id(&db_pool, &room_id.to_string())
        .await?
        .ok_or(AppError::NotFound)?;
    if room.host_id != user.id {
        return Err(AppError::forbidden("Only the host can delete the room."));
    }

    let body = include_res!(str, "/pages/delete.html")
        .replace("{nav}", &res::nav(Some(&user)))
        .replace("{action}", &format!("/r/{room_id}/delete"))
        .replace("{obj}", &res::escape(&room.name));

    Ok(Html(body).into_response())
}

#[debug_handler]
pub(crate) async fn delete_room(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Path(room_id): Path<Uuid>,
) -> AppResult<Response> {
    let Some(user) = session::current_user(&session, &db_pool).await? else {
        return Ok(
            Redirect::to(&format!("/login?return_url=/r/{room_id}/delete")).into_response(),
        );
    };

    db::delete_room(&db_pool, &user.id, &room_id.to_string()).await?;
    tracing::info!(room = %room_id, host = %user.username, "room deleted");

    Ok(Redirect::to("/").into_response())
}
