mod page;
mod update;

use axum::{routing::get, Router};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/edit", get(update::edit_profile_page).post(update::edit_profile))
        .route("/{uuid}", get(page::profile))
}
