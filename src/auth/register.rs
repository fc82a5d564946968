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

use super::hash_password;

#[derive(Debug, Deserialize)]
pub(crate) struct RegisterForm {
    username: String,
    email: String,
    password1: String,
    password2: String,
}

#[debug_handler]
pub(crate) async fn register_page(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    if session::current_user(&session, &db_pool).await?.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let notice = session::take_flash(&session).await?;
    let body =
        include_res!(str, "/pages/register.html").replace("{flash}", &res::flash_html(notice));
    Ok(Html(body).into_response())
}

fn validate(form: &RegisterForm) -> Result<(), &'static str> {
    if form.username.trim().is_empty() {
        return Err("Username must not be empty");
    }
    if form.email.trim().is_empty() || !form.email.contains('@') {
        return Err("A valid email address is required");
    }
    if form.password1.is_empty() {
        return Err("Password must not be empty");
    }
    if form.password1 != form.password2 {
        return Err("Passwords do not match");
    }
    Ok(())
}

#[debug_handler]
pub(crate) async fn register(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> AppResult<Response> {
    if session::current_user(&session, &db_pool).await?.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    if let Err(notice) = validate(&form) {
        session::flash(&session, notice).await?;
        return Ok(Redirect::to("/register").into_response());
    }

    if db::user_by_email(&db_pool, &form.email).await?.is_some() {
        session::flash(&session, "An account with this email already exists").await?;
        return Ok(Redirect::to("/register").into_response());
    }

    let password_hash = hash_password(&form.password1)?;
    let user_id = db::create_user(&db_pool, &form.email, &form.username, &password_hash).await?;

    session::log_in(&session, &user_id).await?;
    tracing::info!(user = %form.username.to_lowercase(), "registered");

    Ok(Redirect::to("/").into_response())
}
