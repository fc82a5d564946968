//! Entities and the query/mutation functions behind every handler.
//!
//! Handlers resolve the caller from the session and pass their id in
//! explicitly, so everything here is testable against a plain pool.

use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{AppError, AppResult};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        username TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        bio TEXT NOT NULL DEFAULT '',
        avatar TEXT,
        created INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS topics (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL UNIQUE
    )",
    "CREATE TABLE IF NOT EXISTS rooms (
        id TEXT PRIMARY KEY,
        host_id TEXT NOT NULL REFERENCES users(id),
        topic_id TEXT NOT NULL REFERENCES topics(id),
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        created INTEGER NOT NULL,
        updated INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS participants (
        room_id TEXT NOT NULL REFERENCES rooms(id) ON DELETE CASCADE,
        user_id TEXT NOT NULL REFERENCES users(id),
        PRIMARY KEY (room_id, user_id)
    )",
    "CREATE TABLE IF NOT EXISTS messages (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL REFERENCES users(id),
        room_id TEXT NOT NULL REFERENCES rooms(id) ON DELETE CASCADE,
        body TEXT NOT NULL,
        created INTEGER NOT NULL
    )",
];

pub async fn migrate(db_pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for stmt in SCHEMA {
        sqlx::query(stmt).execute(db_pool).await?;
    }
    Ok(())
}

fn now() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

fn new_id() -> String {
    Uuid::now_v7().to_string()
}

/// Builds a `%term%` LIKE pattern with `%`/`_` in the term matching
/// literally. Queries using it must carry `ESCAPE '\'`.
fn like_pattern(q: &str) -> String {
    let escaped = q
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub bio: String,
    pub avatar: Option<String>,
    pub created: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct Topic {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct Room {
    pub id: String,
    pub host_id: String,
    pub topic_id: String,
    pub name: String,
    pub description: String,
    pub created: i64,
    pub updated: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct Message {
    pub id: String,
    pub user_id: String,
    pub room_id: String,
    pub body: String,
    pub created: i64,
}

/// Room row joined with its topic and host, as shown in listings.
#[derive(Debug, Clone, FromRow)]
pub struct RoomListing {
    pub id: String,
    pub name: String,
    pub description: String,
    pub topic_name: String,
    pub host_id: String,
    pub host_username: String,
}

/// Topic annotated with how many rooms carry it.
#[derive(Debug, Clone, FromRow)]
pub struct TopicCount {
    pub id: String,
    pub name: String,
    pub rooms: i64,
}

/// Message joined with author and room, as shown in feeds.
#[derive(Debug, Clone, FromRow)]
pub struct FeedMessage {
    pub id: String,
    pub body: String,
    pub created: i64,
    pub user_id: String,
    pub username: String,
    pub room_id: String,
    pub room_name: String,
}

// ---- users ----

pub async fn user_by_id(db_pool: &SqlitePool, user_id: &str) -> AppResult<Option<User>> {
    Ok(sqlx::query_as("SELECT * FROM users WHERE id=?")
        .bind(user_id)
        .fetch_optional(db_pool)
        .await?)
}

pub async fn user_by_email(db_pool: &SqlitePool, email: &str) -> AppResult<Option<User>> {
    Ok(sqlx::query_as("SELECT * FROM users WHERE email=?")
        .bind(email)
        .fetch_optional(db_pool)
        .await?)
}

/// Usernames are stored lowercased, matching the registration rule.
pub async fn create_user(
    db_pool: &SqlitePool,
    email: &str,
    username: &str,
    password_hash: &str,
) -> AppResult<String> {
    let id = new_id();
    sqlx::query("INSERT INTO users (id,email,username,password_hash,created) VALUES (?,?,?,?,?)")
        .bind(&id)
        .bind(email)
        .bind(username.to_lowercase())
        .bind(password_hash)
        .bind(now())
        .execute(db_pool)
        .await?;
    Ok(id)
}

pub async fn update_user(
    db_pool: &SqlitePool,
    user_id: &str,
    username: &str,
    email: &str,
    bio: &str,
    avatar: Option<&str>,
) -> AppResult<()> {
    sqlx::query(
        "UPDATE users SET username=?, email=?, bio=?, avatar=COALESCE(?, avatar) WHERE id=?",
    )
    .bind(username)
    .bind(email)
    .bind(bio)
    .bind(avatar)
    .bind(user_id)
    .execute(db_pool)
    .await?;
    Ok(())
}

// ---- topics ----

/// Exact-name lookup-or-create. The UNIQUE constraint plus DO NOTHING keeps
/// this idempotent under concurrent creates.
pub async fn get_or_create_topic(db_pool: &SqlitePool, name: &str) -> AppResult<String> {
    sqlx::query("INSERT INTO topics (id,name) VALUES (?,?) ON CONFLICT(name) DO NOTHING")
        .bind(new_id())
        .bind(name)
        .execute(db_pool)
        .await?;

    let (id,): (String,) = sqlx::query_as("SELECT id FROM topics WHERE name=?")
        .bind(name)
        .fetch_one(db_pool)
        .await?;
    Ok(id)
}

pub async fn top_topics(db_pool: &SqlitePool, limit: i64) -> AppResult<Vec<TopicCount>> {
    Ok(sqlx::query_as(
        "SELECT t.id, t.name, COUNT(r.id) AS rooms
         FROM topics t LEFT JOIN rooms r ON r.topic_id = t.id
         GROUP BY t.id ORDER BY rooms DESC, t.name ASC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(db_pool)
    .await?)
}

pub async fn search_topics(db_pool: &SqlitePool, q: &str) -> AppResult<Vec<TopicCount>> {
    Ok(sqlx::query_as(
        "SELECT t.id, t.name, COUNT(r.id) AS rooms
         FROM topics t LEFT JOIN rooms r ON r.topic_id = t.id
         WHERE t.name LIKE ?1 ESCAPE '\\'
         GROUP BY t.id ORDER BY rooms DESC, t.name ASC",
    )
    .bind(like_pattern(q))
    .fetch_all(db_pool)
    .await?)
}

// ---- rooms ----

pub async fn count_rooms(db_pool: &SqlitePool) -> AppResult<i64> {
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM rooms")
        .fetch_one(db_pool)
        .await?;
    Ok(n)
}

/// Free-text room search. Topic and room names match on a case-insensitive
/// substring; description matches exactly. The asymmetry is inherited
/// behavior, kept on purpose.
pub async fn search_rooms(db_pool: &SqlitePool, q: &str) -> AppResult<Vec<RoomListing>> {
    Ok(sqlx::query_as(
        "SELECT r.id, r.name, r.description, t.name AS topic_name,
                u.id AS host_id, u.username AS host_username
         FROM rooms r
         JOIN topics t ON t.id = r.topic_id
         JOIN users u ON u.id = r.host_id
         WHERE t.name LIKE ?1 ESCAPE '\\'
            OR r.name LIKE ?1 ESCAPE '\\'
            OR r.description = ?2
         ORDER BY r.updated DESC, r.created DESC",
    )
    .bind(like_pattern(q))
    .bind(q)
    .fetch_all(db_pool)
    .await?)
}

pub async fn room_by_id(db_pool: &SqlitePool, room_id: &str) -> AppResult<Option<Room>> {
    Ok(sqlx::query_as("SELECT * FROM rooms WHERE id=?")
        .bind(room_id)
        .fetch_optional(db_pool)
        .await?)
}

pub async fn room_listing_by_id(
    db_pool: &SqlitePool,
    room_id: &str,
) -> AppResult<Option<RoomListing>> {
    Ok(sqlx::query_as(
        "SELECT r.id, r.name, r.description, t.name AS topic_name,
                u.id AS host_id, u.username AS host_username
         FROM rooms r
         JOIN topics t ON t.id = r.topic_id
         JOIN users u ON u.id = r.host_id
         WHERE r.id=?",
    )
    .bind(room_id)
    .fetch_optional(db_pool)
    .await?)
}

/// The creating user becomes host and the first participant.
pub async fn create_room(
    db_pool: &SqlitePool,
    host_id: &str,
    topic_name: &str,
    name: &str,
    description: &str,
) -> AppResult<String> {
    let topic_id = get_or_create_topic(db_pool, topic_name).await?;

    let id = new_id();
    let ts = now();
    sqlx::query(
        "INSERT INTO rooms (id,host_id,topic_id,name,description,created,updated)
         VALUES (?,?,?,?,?,?,?)",
    )
    .bind(&id)
    .bind(host_id)
    .bind(&topic_id)
    .bind(name)
    .bind(description)
    .bind(ts)
    .bind(ts)
    .execute(db_pool)
    .await?;

    add_participant(db_pool, &id, host_id).await?;
    Ok(id)
}

/// Only the host may edit a room.
pub async fn update_room(
    db_pool: &SqlitePool,
    caller_id: &str,
    room_id: &str,
    topic_name: &str,
    name: &str,
    description: &str,
) -> AppResult<()> {
    let room = room_by_id(db_pool, room_id).await?.ok_or(AppError::NotFound)?;
    if room.host_id != caller_id {
        return Err(AppError::forbidden("Only the host can edit the room."));
    }

    let topic_id = get_or_create_topic(db_pool, topic_name).await?;
    sqlx::query("UPDATE rooms SET name=?, description=?, topic_id=?, updated=? WHERE id=?")
        .bind(name)
        .bind(description)
        .bind(&topic_id)
        .bind(now())
        .bind(room_id)
        .execute(db_pool)
        .await?;
    Ok(())
}

/// Only the host may delete a room. Participants and messages go with it.
pub async fn delete_room(db_pool: &SqlitePool, caller_id: &str, room_id: &str) -> AppResult<()> {
    let room = room_by_id(db_pool, room_id).await?.ok_or(AppError::NotFound)?;
    if room.host_id != caller_id {
        return Err(AppError::forbidden("Only the host can delete the room."));
    }

    sqlx::query("DELETE FROM messages WHERE room_id=?")
        .bind(room_id)
        .execute(db_pool)
        .await?;
    sqlx::query("DELETE FROM participants WHERE room_id=?")
        .bind(room_id)
        .execute(db_pool)
        .await?;
    sqlx::query("DELETE FROM rooms WHERE id=?")
        .bind(room_id)
        .execute(db_pool)
        .await?;
    Ok(())
}

pub async fn add_participant(db_pool: &SqlitePool, room_id: &str, user_id: &str) -> AppResult<()> {
    sqlx::query("INSERT OR IGNORE INTO participants (room_id,user_id) VALUES (?,?)")
        .bind(room_id)
        .bind(user_id)
        .execute(db_pool)
        .await?;
    Ok(())
}

pub async fn participants(db_pool: &SqlitePool, room_id: &str) -> AppResult<Vec<(String, String)>> {
    Ok(sqlx::query_as(
        "SELECT u.id, u.username
         FROM participants p JOIN users u ON u.id = p.user_id
         WHERE p.room_id=? ORDER BY u.username ASC",
    )
    .bind(room_id)
    .fetch_all(db_pool)
    .await?)
}

pub async fn is_participant(db_pool: &SqlitePool, room_id: &str, user_id: &str) -> AppResult<bool> {
    Ok(
        sqlx::query_as::<_, (i64,)>("SELECT 1 FROM participants WHERE room_id=? AND user_id=?")
            .bind(room_id)
            .bind(user_id)
            .fetch_optional(db_pool)
            .await?
            .is_some(),
    )
}

/// Rooms the user hosts plus rooms they have joined, newest activity first.
pub async fn rooms_for_user(db_pool: &SqlitePool, user_id: &str) -> AppResult<Vec<RoomListing>> {
    Ok(sqlx::query_as(
        "SELECT DISTINCT r.id, r.name, r.description, t.name AS topic_name,
                u.id AS host_id, u.username AS host_username,
                r.updated, r.created
         FROM rooms r
         JOIN topics t ON t.id = r.topic_id
         JOIN users u ON u.id = r.host_id
         LEFT JOIN participants p ON p.room_id = r.id
         WHERE r.host_id = ?1 OR p.user_id = ?1
         ORDER BY r.updated DESC, r.created DESC",
    )
    .bind(user_id)
    .fetch_all(db_pool)
    .await?)
}

// ---- messages ----

/// Posting also joins the author to the room (idempotent).
pub async fn post_message(
    db_pool: &SqlitePool,
    author_id: &str,
    room_id: &str,
    body: &str,
) -> AppResult<String> {
    if room_by_id(db_pool, room_id).await?.is_none() {
        return Err(AppError::NotFound);
    }

    let id = new_id();
    sqlx::query("INSERT INTO messages (id,user_id,room_id,body,created) VALUES (?,?,?,?,?)")
        .bind(&id)
        .bind(author_id)
        .bind(room_id)
        .bind(body)
        .bind(now())
        .execute(db_pool)
        .await?;

    add_participant(db_pool, room_id, author_id).await?;
    Ok(id)
}

pub async fn message_by_id(db_pool: &SqlitePool, message_id: &str) -> AppResult<Option<Message>> {
    Ok(sqlx::query_as("SELECT * FROM messages WHERE id=?")
        .bind(message_id)
        .fetch_optional(db_pool)
        .await?)
}

/// Only the author may delete a message. Returns the parent room id for the
/// post-delete redirect.
pub async fn delete_message(
    db_pool: &SqlitePool,
    caller_id: &str,
    message_id: &str,
) -> AppResult<String> {
    let message = message_by_id(db_pool, message_id)
        .await?
        .ok_or(AppError::NotFound)?;
    if message.user_id != caller_id {
        return Err(AppError::forbidden(
            "You cannot delete the message as you are not the author.",
        ));
    }

    sqlx::query("DELETE FROM messages WHERE id=?")
        .bind(message_id)
        .execute(db_pool)
        .await?;
    Ok(message.room_id)
}

pub async fn room_messages(db_pool: &SqlitePool, room_id: &str) -> AppResult<Vec<FeedMessage>> {
    Ok(sqlx::query_as(
        "SELECT m.id, m.body, m.created, u.id AS user_id, u.username,
                r.id AS room_id, r.name AS room_name
         FROM messages m
         JOIN users u ON u.id = m.user_id
         JOIN rooms r ON r.id = m.room_id
         WHERE m.room_id=? ORDER BY m.created DESC",
    )
    .bind(room_id)
    .fetch_all(db_pool)
    .await?)
}

/// Messages posted in rooms whose topic name matches the search term.
pub async fn feed_messages(db_pool: &SqlitePool, q: &str) -> AppResult<Vec<FeedMessage>> {
    Ok(sqlx::query_as(
        "SELECT m.id, m.body, m.created, u.id AS user_id, u.username,
                r.id AS room_id, r.name AS room_name
         FROM messages m
         JOIN users u ON u.id = m.user_id
         JOIN rooms r ON r.id = m.room_id
         JOIN topics t ON t.id = r.topic_id
         WHERE t.name LIKE ?1 ESCAPE '\\'
         ORDER BY m.created DESC",
    )
    .bind(like_pattern(q))
    .fetch_all(db_pool)
    .await?)
}

pub async fn messages_by_user(db_pool: &SqlitePool, user_id: &str) -> AppResult<Vec<FeedMessage>> {
    Ok(sqlx::query_as(
        "SELECT m.id, m.body, m.created, u.id AS user_id, u.username,
                r.id AS room_id, r.name AS room_name
         FROM messages m
         JOIN users u ON u.id = m.user_id
         JOIN rooms r ON r.id = m.room_id
         WHERE m.user_id=? ORDER BY m.created DESC",
    )
    .bind(user_id)
    .fetch_all(db_pool)
    .await?)
}

pub async fn recent_messages(db_pool: &SqlitePool, limit: i64) -> AppResult<Vec<FeedMessage>> {
    Ok(sqlx::query_as(
        "SELECT m.id, m.body, m.created, u.id AS user_id, u.username,
                r.id AS room_id, r.name AS room_name
         FROM messages m
         JOIN users u ON u.id = m.user_id
         JOIN rooms r ON r.id = m.room_id
         ORDER BY m.created DESC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(db_pool)
    .await?)
}
