use axum::{
    debug_handler,
    extract::{Query, State},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{db, include_res, res, session, AppResult};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// Home page: room search results, the five busiest topics, and the message
/// feed for rooms whose topic matches the query.
#[debug_handler]
pub async fn home(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Query(SearchQuery { q }): Query<SearchQuery>,
) -> AppResult<Response> {
    let q = q.unwrap_or_default();
    let user = session::current_user(&session, &db_pool).await?;

    let rooms = db::search_rooms(&db_pool, &q).await?;
    let topics = db::top_topics(&db_pool, 5).await?;
    let room_messages = db::feed_messages(&db_pool, &q).await?;
    let total_rooms = db::count_rooms(&db_pool).await?;

    let room_items: String = rooms.iter().map(res::room_item).collect();
    let topic_items: String = topics.iter().map(res::topic_item).collect();
    let feed_items: String = room_messages.iter().map(res::feed_item).collect();

    let body = include_res!(str, "/pages/home.html")
        .replace("{nav}", &res::nav(user.as_ref()))
        .replace("{q}", &res::escape(&q))
        .replace("{rooms}", &room_items)
        .replace("{topics}", &topic_items)
        .replace("{room_messages}", &feed_items)
        .replace("{rooms_count}", &rooms.len().to_string())
        .replace("{total_rooms_count}", &total_rooms.to_string());

    Ok(Html(body).into_response())
}
