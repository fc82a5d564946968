use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{db, AppResult};

pub const USER_ID: &str = "user_id";
pub const RETURN_URL: &str = "return_url";
pub const FLASH: &str = "flash";

/// Resolves the session's `user_id` to a full user row. A session pointing at
/// a user that no longer exists reads as logged out.
pub async fn current_user(session: &Session, db_pool: &SqlitePool) -> AppResult<Option<db::User>> {
    let Some(user_id) = session.get::<String>(USER_ID).await? else {
        return Ok(None);
    };

    db::user_by_id(db_pool, &user_id).await
}

pub async fn log_in(session: &Session, user_id: &str) -> AppResult<()> {
    session.insert(USER_ID, user_id).await?;
    Ok(())
}

/// One-shot notice shown on the next rendered page.
pub async fn flash(session: &Session, notice: &str) -> AppResult<()> {
    session.insert(FLASH, notice).await?;
    Ok(())
}

pub async fn take_flash(session: &Session) -> AppResult<Option<String>> {
    Ok(session.remove::<String>(FLASH).await?)
}
