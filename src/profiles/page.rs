use axum::{
    debug_handler,
    extract::{Path, State},
    response::{Html, IntoResponse, Response},
};
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{db, include_res, res, session, AppError, AppResult};

/// Public profile: the user's hosted and joined rooms, every topic with its
/// room count, and the messages they have written.
#[debug_handler]
pub(crate) async fn profile(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Path(user_id): Path<Uuid>,
) -> AppResult<Response> {
    let user_id = user_id.to_string();
    let viewer = session::current_user(&session, &db_pool).await?;

    let user = db::user_by_id(&db_pool, &user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let rooms = db::rooms_for_user(&db_pool, &user_id).await?;
    let topics = db::search_topics(&db_pool, "").await?;
    let room_messages = db::messages_by_user(&db_pool, &user_id).await?;
    let total_rooms = db::count_rooms(&db_pool).await?;

    let room_items: String = rooms.iter().map(res::room_item).collect();
    let topic_items: String = topics.iter().map(res::topic_item).collect();
    let feed_items: String = room_messages.iter().map(res::feed_item).collect();

    let avatar = match &user.avatar {
        Some(path) => format!(r#"<img src="{}" alt="avatar" width="96">"#, res::escape(path)),
        None => String::new(),
    };

    let body = include_res!(str, "/pages/profile.html")
        .replace("{nav}", &res::nav(viewer.as_ref()))
        .replace("{username}", &res::escape(&user.username))
        .replace("{bio}", &res::escape(&user.bio))
        .replace("{avatar}", &avatar)
        .replace("{rooms}", &room_items)
        .replace("{topics}", &topic_items)
        .replace("{room_messages}", &feed_items)
        .replace("{total_rooms_count}", &total_rooms.to_string());

    Ok(Html(body).into_response())
}
