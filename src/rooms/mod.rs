mod delete;
mod msg;
mod new;
mod room;
mod update;

use axum::{routing::get, Router};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/new", get(new::new_room_page).post(new::new_room))
        .route("/{uuid}", get(room::room_page).post(room::post_message))
        .route("/{uuid}/edit", get(update::edit_room_page).post(update::edit_room))
        .route("/{uuid}/delete", get(delete::delete_room_page).post(delete::delete_room))
}

pub fn message_router() -> Router<AppState> {
    Router::new().route(
        "/{uuid}/delete",
        get(msg::delete_message_page).post(msg::delete_message),
    )
}
