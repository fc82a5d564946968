use axum::{
    debug_handler,
    extract::State,
    response::{Html, IntoResponse, Response},
};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{db, include_res, res, session, AppResult};

/// Site-wide activity feed: the three newest messages.
#[debug_handler]
pub async fn activity_page(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let user = session::current_user(&session, &db_pool).await?;
    let room_messages = db::recent_messages(&db_pool, 3).await?;

    let feed_items: String = room_messages.iter().map(res::feed_item).collect();

    let body = include_res!(str, "/pages/activity.html")
        .replace("{nav}", &res::nav(user.as_ref()))
        .replace("{room_messages}", &feed_items);

    Ok(Html(body).into_response())
}
