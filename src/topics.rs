use axum::{
    debug_handler,
    extract::{Query, State},
    response::{Html, IntoResponse, Response},
};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{db, include_res, index::SearchQuery, res, session, AppResult};

/// Topic directory: name-filtered, annotated with room counts, busiest first.
#[debug_handler]
pub async fn topics_page(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Query(SearchQuery { q }): Query<SearchQuery>,
) -> AppResult<Response> {
    let q = q.unwrap_or_default();
    let user = session::current_user(&session, &db_pool).await?;

    let topics = db::search_topics(&db_pool, &q).await?;
    let total_rooms = db::count_rooms(&db_pool).await?;

    let topic_items: String = topics.iter().map(res::topic_item).collect();

    let body = include_res!(str, "/pages/topics.html")
        .replace("{nav}", &res::nav(user.as_ref()))
        .replace("{q}", &res::escape(&q))
        .replace("{topics}", &topic_items)
        .replace("{total_rooms_count}", &total_rooms.to_string());

    Ok(Html(body).into_response())
}
