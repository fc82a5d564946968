use axum::{
    debug_handler,
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{
    db, include_res, res,
    session::{self, RETURN_URL},
    AppResult,
};

use super::verify_password;

#[derive(Debug, Deserialize)]
pub(crate) struct LoginQuery {
    pub(crate) return_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginForm {
    email: String,
    password: String,
}

#[debug_handler]
pub(crate) async fn login_page(
    State(db_pool): State<SqlitePool>,
    Query(LoginQuery { return_url }): Query<LoginQuery>,
    session: Session,
) -> AppResult<Response> {
    if session::current_user(&session, &db_pool).await?.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    if let Some(return_url) = return_url {
        session.insert(RETURN_URL, return_url).await?;
    }

    let notice = session::take_flash(&session).await?;
    let body = include_res!(str, "/pages/login.html").replace("{flash}", &res::flash_html(notice));
    Ok(Html(body).into_response())
}

#[debug_handler]
pub(crate) async fn login(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(LoginForm { email, password }): Form<LoginForm>,
) -> AppResult<Response> {
    if session::current_user(&session, &db_pool).await?.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    // Unknown email short-circuits; the password is not checked against a
    // nonexistent account.
    let Some(user) = db::user_by_email(&db_pool, &email).await? else {
        session::flash(&session, "User does not exist").await?;
        return Ok(Redirect::to("/login").into_response());
    };

    if !verify_password(&password, &user.password_hash) {
        session::flash(&session, "Email OR password does not exist").await?;
        return Ok(Redirect::to("/login").into_response());
    }

    session::log_in(&session, &user.id).await?;
    tracing::info!(user = %user.username, "logged in");

    let return_url = session
        .remove::<String>(RETURN_URL)
        .await?
        .unwrap_or_else(|| "/".to_owned());
    Ok(Redirect::to(&return_url).into_response())
}
