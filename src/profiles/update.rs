use std::path::PathBuf;

use axum::{
    debug_handler,
    extract::{Multipart, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{db, include_res, res, session, AppResult, AppState};

#[debug_handler(state = AppState)]
pub(crate) async fn edit_profile_page(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(user) = session::current_user(&session, &db_pool).await? else {
        return Ok(Redirect::to("/login?return_url=/p/edit").into_response());
    };

    let notice = session::take_flash(&session).await?;

    let body = include_res!(str, "/pages/edit_user.html")
        .replace("{nav}", &res::nav(Some(&user)))
        .replace("{flash}", &res::flash_html(notice))
        .replace("{username}", &res::escape(&user.username))
        .replace("{email}", &res::escape(&user.email))
        .replace("{bio}", &res::escape(&user.bio));

    Ok(Html(body).into_response())
}

#[derive(Debug, Default)]
struct ProfileForm {
    username: String,
    email: String,
    bio: String,
    avatar: Option<(String, Vec<u8>)>,
}

async fn read_form(mut multipart: Multipart) -> AppResult<ProfileForm> {
    let mut form = ProfileForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("username") => form.username = field.text().await?,
            Some("email") => form.email = field.text().await?,
            Some("bio") => form.bio = field.text().await?,
            Some("avatar") => {
                let file_name = field.file_name().unwrap_or_default().to_owned();
                let bytes = field.bytes().await?;
                if !file_name.is_empty() && !bytes.is_empty() {
                    form.avatar = Some((file_name, bytes.to_vec()));
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Updates the caller's own profile. The avatar file, when present, lands in
/// the avatar directory under a fresh name and is served from `/avatars`.
#[debug_handler(state = AppState)]
pub(crate) async fn edit_profile(
    State(db_pool): State<SqlitePool>,
    State(avatar_dir): State<PathBuf>,
    session: Session,
    multipart: Multipart,
) -> AppResult<Response> {
    let Some(user) = session::current_user(&session, &db_pool).await? else {
        return Ok(Redirect::to("/login?return_url=/p/edit").into_response());
    };

    let form = read_form(multipart).await?;

    if form.username.trim().is_empty() || form.email.trim().is_empty() {
        session::flash(&session, "Username and email must not be empty").await?;
        return Ok(Redirect::to("/p/edit").into_response());
    }

    let avatar_path = match form.avatar {
        Some((file_name, bytes)) => {
            let ext = std::path::Path::new(&file_name)
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("bin");
            let stored = format!("{}.{ext}", Uuid::now_v7());

            tokio::fs::create_dir_all(&avatar_dir).await?;
            tokio::fs::write(avatar_dir.join(&stored), bytes).await?;
            Some(format!("/avatars/{stored}"))
        }
        None => None,
    };

    db::update_user(
        &db_pool,
        &user.id,
        &form.username,
        &form.email,
        &form.bio,
        avatar_path.as_deref(),
    )
    .await?;

    Ok(Redirect::to(&format!("/p/{}", user.id)).into_response())
}
