use axum::{
    debug_handler,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{db, include_res, res, session, AppError, AppResult};

/// Renders one message for the room view. Bodies go through the markdown
/// renderer with raw HTML downgraded to text, so blockquotes and emphasis
/// work but markup cannot reach the page. The delete link only shows for
/// the author.
pub(crate) fn message_html(message: &db::FeedMessage, caller_id: Option<&str>) -> String {
    use pulldown_cmark::Event;

    let parser = pulldown_cmark::Parser::new(&message.body).map(|event| match event {
        Event::Html(html) => Event::Text(html),
        Event::InlineHtml(html) => Event::Text(html),
        event => event,
    });

    let mut body_html = String::new();
    pulldown_cmark::html::push_html(&mut body_html, parser);

    let actions = if caller_id == Some(message.user_id.as_str()) {
        format!(r#" <a href="/m/{}/delete">delete</a>"#, message.id)
    } else {
        String::new()
    };

    include_res!(str, "/pages/room_message.html")
        .replace("{id}", &message.id)
        .replace("{user_id}", &message.user_id)
        .replace("{username}", &res::escape(&message.username))
        .replace("{body}", &body_html)
        .replace("{actions}", &actions)
}

#[debug_handler]
pub(crate) async fn delete_message_page(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Path(message_id): Path<Uuid>,
) -> AppResult<Response> {
    let Some(user) = session::current_user(&session, &db_pool).await? else {
        return Ok(
            Redirect::to(&format!("/login?return_url=/m/{message_id}/delete")).into_response(),
        );
    };

    let message = db::message_by_id(&db_pool, &message_id.to_string())
        .await?
        .ok_or(AppError::NotFound)?;
    if message.user_id != user.id {
        return Err(AppError::forbidden(
            "You cannot delete the message as you are not the author.",
        ));
    }

    let body = include_res!(str, "/pages/delete.html")
        .replace("{nav}", &res::nav(Some(&user)))
        .replace("{action}", &format!("/m/{message_id}/delete"))
        .replace("{obj}", &res::escape(&message.body));

    Ok(Html(body).into_response())
}

#[debug_handler]
pub(crate) async fn delete_message(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Path(message_id): Path<Uuid>,
) -> AppResult<Response> {
    let Some(user) = session::current_user(&session, &db_pool).await? else {
        return Ok(
            Redirect::to(&format!("/login?return_url=/m/{message_id}/delete")).into_response(),
        );
    };

    let room_id = db::delete_message(&db_pool, &user.id, &message_id.to_string()).await?;

    Ok(Redirect::to(&format!("/r/{room_id}")).into_response())
}

#[cfg(test)]
mod tests {
    use super::message_html;
    use crate::db::FeedMessage;

    fn message(body: &str) -> FeedMessage {
        FeedMessage {
            id: "m1".to_owned(),
            body: body.to_owned(),
            created: 0,
            user_id: "u1".to_owned(),
            username: "alice".to_owned(),
            room_id: "r1".to_owned(),
            room_name: "openings".to_owned(),
        }
    }

    #[test]
    fn markdown_constructs_render() {
        let html = message_html(&message("> c4 is *fine*"), None);
        assert!(html.contains("<blockquote>"), "got: {html}");
        assert!(html.contains("<em>fine</em>"), "got: {html}");
    }

    #[test]
    fn raw_html_is_rendered_as_text() {
        let html = message_html(&message("<script>alert(1)</script>"), None);
        assert!(!html.contains("<script>"), "got: {html}");
        assert!(html.contains("&lt;script&gt;"), "got: {html}");
    }

    #[test]
    fn delete_link_only_shows_for_the_author() {
        assert!(message_html(&message("hi"), Some("u1")).contains("/m/m1/delete"));
        assert!(!message_html(&message("hi"), Some("u2")).contains("/m/m1/delete"));
        assert!(!message_html(&message("hi"), None).contains("/m/m1/delete"));
    }
}
