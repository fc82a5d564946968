use crate::db;

#[macro_export]
macro_rules! include_res {
    (bytes, $p:expr) => {
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
    (str, $p:expr) => {
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
}

/// Minimal HTML escaping for user-supplied text dropped into templates.
pub fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn nav(user: Option<&db::User>) -> String {
    let auth = match user {
        Some(user) => format!(
            r#"<a href="/p/{}">@{}</a> <a href="/p/edit">Settings</a> <a href="/logout">Logout</a>"#,
            user.id,
            escape(&user.username),
        ),
        None => r#"<a href="/login">Login</a> <a href="/register">Register</a>"#.to_owned(),
    };

    include_res!(str, "/pages/nav.html").replace("{auth}", &auth)
}

pub fn flash_html(notice: Option<String>) -> String {
    match notice {
        Some(notice) => format!("<p class=\"flash\">{}</p>", escape(&notice)),
        None => String::new(),
    }
}

pub fn room_item(room: &db::RoomListing) -> String {
    include_res!(str, "/pages/room_item.html")
        .replace("{id}", &room.id)
        .replace("{name}", &escape(&room.name))
        .replace("{topic}", &escape(&room.topic_name))
        .replace("{host_id}", &room.host_id)
        .replace("{host}", &escape(&room.host_username))
}

pub fn topic_item(topic: &db::TopicCount) -> String {
    include_res!(str, "/pages/topic_item.html")
        .replace("{name}", &escape(&topic.name))
        .replace("{count}", &topic.rooms.to_string())
}

pub fn feed_item(message: &db::FeedMessage) -> String {
    include_res!(str, "/pages/feed_item.html")
        .replace("{user_id}", &message.user_id)
        .replace("{username}", &escape(&message.username))
        .replace("{room_id}", &message.room_id)
        .replace("{room_name}", &escape(&message.room_name))
        .replace("{body}", &escape(&message.body))
}
