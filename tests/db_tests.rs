use parley::db;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

// One connection so every handle sees the same in-memory database.
async fn pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    db::migrate(&pool).await.unwrap();
    pool
}

async fn user(pool: &SqlitePool, name: &str) -> String {
    db::create_user(pool, &format!("{name}@example.com"), name, "hash")
        .await
        .unwrap()
}

#[tokio::test]
async fn creator_becomes_host_and_participant() {
    let pool = pool().await;
    let alice = user(&pool, "alice").await;

    let room_id = db::create_room(&pool, &alice, "chess", "openings", "").await.unwrap();

    let room = db::room_by_id(&pool, &room_id).await.unwrap().unwrap();
    assert_eq!(room.host_id, alice);
    assert!(db::is_participant(&pool, &room_id, &alice).await.unwrap());
}

#[tokio::test]
async fn posting_joins_the_author_idempotently() {
    let pool = pool().await;
    let alice = user(&pool, "alice").await;
    let bob = user(&pool, "bob").await;
    let room_id = db::create_room(&pool, &alice, "chess", "openings", "").await.unwrap();

    db::post_message(&pool, &bob, &room_id, "hi").await.unwrap();
    db::post_message(&pool, &bob, &room_id, "hi again").await.unwrap();

    let participants = db::participants(&pool, &room_id).await.unwrap();
    let bobs = participants.iter().filter(|(id, _)| *id == bob).count();
    assert_eq!(bobs, 1);
    assert_eq!(participants.len(), 2); // alice + bob
}

#[tokio::test]
async fn posting_into_a_missing_room_is_not_found() {
    let pool = pool().await;
    let alice = user(&pool, "alice").await;

    let err = db::post_message(&pool, &alice, "no-such-room", "hi")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn topic_resolution_is_idempotent() {
    let pool = pool().await;
    let alice = user(&pool, "alice").await;

    let a = db::create_room(&pool, &alice, "chess", "room a", "").await.unwrap();
    let b = db::create_room(&pool, &alice, "chess", "room b", "").await.unwrap();

    let topics = db::search_topics(&pool, "chess").await.unwrap();
    assert_eq!(topics.len(), 1);
    assert_eq!(topics[0].name, "chess");
    assert_eq!(topics[0].rooms, 2);

    let room_a = db::room_by_id(&pool, &a).await.unwrap().unwrap();
    let room_b = db::room_by_id(&pool, &b).await.unwrap().unwrap();
    assert_eq!(room_a.topic_id, room_b.topic_id);
}

#[tokio::test]
async fn only_the_host_may_update_a_room() {
    let pool = pool().await;
    let alice = user(&pool, "alice").await;
    let bob = user(&pool, "bob").await;
    let room_id = db::create_room(&pool, &alice, "chess", "openings", "pawns").await.unwrap();

    let err = db::update_room(&pool, &bob, &room_id, "go", "renamed", "stones")
        .await
        .unwrap_err();
    assert!(err.is_forbidden());

    let room = db::room_by_id(&pool, &room_id).await.unwrap().unwrap();
    assert_eq!(room.name, "openings");
    assert_eq!(room.description, "pawns");

    db::update_room(&pool, &alice, &room_id, "go", "renamed", "stones")
        .await
        .unwrap();
    let room = db::room_by_id(&pool, &room_id).await.unwrap().unwrap();
    assert_eq!(room.name, "renamed");
}

#[tokio::test]
async fn only_the_host_may_delete_a_room() {
    let pool = pool().await;
    let alice = user(&pool, "alice").await;
    let bob = user(&pool, "bob").await;
    let room_id = db::create_room(&pool, &alice, "chess", "openings", "").await.unwrap();

    let err = db::delete_room(&pool, &bob, &room_id).await.unwrap_err();
    assert!(err.is_forbidden());
    assert!(db::room_by_id(&pool, &room_id).await.unwrap().is_some());
}

#[tokio::test]
async fn deleted_room_disappears_from_lookup_and_listing() {
    let pool = pool().await;
    let alice = user(&pool, "alice").await;
    let room_id = db::create_room(&pool, &alice, "chess", "openings", "").await.unwrap();
    db::post_message(&pool, &alice, &room_id, "last words").await.unwrap();

    db::delete_room(&pool, &alice, &room_id).await.unwrap();

    assert!(db::room_by_id(&pool, &room_id).await.unwrap().is_none());
    let listed = db::search_rooms(&pool, "").await.unwrap();
    assert!(listed.iter().all(|r| r.id != room_id));
    assert!(db::room_messages(&pool, &room_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn only_the_author_may_delete_a_message() {
    let pool = pool().await;
    let alice = user(&pool, "alice").await;
    let bob = user(&pool, "bob").await;
    let room_id = db::create_room(&pool, &alice, "chess", "openings", "").await.unwrap();
    let message_id = db::post_message(&pool, &bob, &room_id, "hi").await.unwrap();

    let err = db::delete_message(&pool, &alice, &message_id).await.unwrap_err();
    assert!(err.is_forbidden());
    assert!(db::message_by_id(&pool, &message_id).await.unwrap().is_some());

    let parent = db::delete_message(&pool, &bob, &message_id).await.unwrap();
    assert_eq!(parent, room_id);
    assert!(db::message_by_id(&pool, &message_id).await.unwrap().is_none());
}

#[tokio::test]
async fn empty_search_returns_every_room() {
    let pool = pool().await;
    let alice = user(&pool, "alice").await;
    db::create_room(&pool, &alice, "chess", "openings", "").await.unwrap();
    db::create_room(&pool, &alice, "go", "joseki", "").await.unwrap();
    db::create_room(&pool, &alice, "rust", "borrowck", "").await.unwrap();

    let rooms = db::search_rooms(&pool, "").await.unwrap();
    assert_eq!(rooms.len() as i64, db::count_rooms(&pool).await.unwrap());
    assert_eq!(rooms.len(), 3);
}

#[tokio::test]
async fn search_matches_substrings_but_description_exactly() {
    let pool = pool().await;
    let alice = user(&pool, "alice").await;
    db::create_room(&pool, &alice, "Chess", "endgames", "rook studies").await.unwrap();

    // case-insensitive substring on topic name
    assert_eq!(db::search_rooms(&pool, "che").await.unwrap().len(), 1);
    // case-insensitive substring on room name
    assert_eq!(db::search_rooms(&pool, "END").await.unwrap().len(), 1);
    // description only matches on the full string
    assert_eq!(db::search_rooms(&pool, "rook").await.unwrap().len(), 0);
    assert_eq!(db::search_rooms(&pool, "rook studies").await.unwrap().len(), 1);
}

#[tokio::test]
async fn search_treats_like_wildcards_literally() {
    let pool = pool().await;
    let alice = user(&pool, "alice").await;
    db::create_room(&pool, &alice, "chess", "openings", "").await.unwrap();
    db::create_room(&pool, &alice, "go", "joseki", "").await.unwrap();

    // wildcard characters in the term must not match everything
    assert_eq!(db::search_rooms(&pool, "%").await.unwrap().len(), 0);
    assert_eq!(db::search_rooms(&pool, "_").await.unwrap().len(), 0);
    assert_eq!(db::search_topics(&pool, "%").await.unwrap().len(), 0);
    assert_eq!(db::feed_messages(&pool, "%").await.unwrap().len(), 0);

    // but they still match their literal occurrences
    db::create_room(&pool, &alice, "sales", "50% off", "").await.unwrap();
    let hits = db::search_rooms(&pool, "%").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "50% off");
}

#[tokio::test]
async fn profile_updates_keep_the_submitted_username() {
    let pool = pool().await;
    let id = db::create_user(&pool, "dave@example.com", "dave", "hash")
        .await
        .unwrap();

    db::update_user(&pool, &id, "DaveTheGreat", "dave@example.com", "", None)
        .await
        .unwrap();

    let dave = db::user_by_id(&pool, &id).await.unwrap().unwrap();
    assert_eq!(dave.username, "DaveTheGreat");
}

#[tokio::test]
async fn topic_search_orders_by_room_count() {
    let pool = pool().await;
    let alice = user(&pool, "alice").await;
    db::create_room(&pool, &alice, "go", "a", "").await.unwrap();
    db::create_room(&pool, &alice, "chess", "b", "").await.unwrap();
    db::create_room(&pool, &alice, "chess", "c", "").await.unwrap();

    let topics = db::top_topics(&pool, 5).await.unwrap();
    assert_eq!(topics[0].name, "chess");
    assert_eq!(topics[0].rooms, 2);
    assert_eq!(topics[1].name, "go");
    assert_eq!(topics[1].rooms, 1);
}

#[tokio::test]
async fn feed_follows_the_topic_filter() {
    let pool = pool().await;
    let alice = user(&pool, "alice").await;
    let chess = db::create_room(&pool, &alice, "chess", "a", "").await.unwrap();
    let go = db::create_room(&pool, &alice, "go", "b", "").await.unwrap();
    db::post_message(&pool, &alice, &chess, "c4").await.unwrap();
    db::post_message(&pool, &alice, &go, "tenuki").await.unwrap();

    let feed = db::feed_messages(&pool, "chess").await.unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].body, "c4");

    let all = db::feed_messages(&pool, "").await.unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn activity_feed_is_capped_at_three() {
    let pool = pool().await;
    let alice = user(&pool, "alice").await;
    let room_id = db::create_room(&pool, &alice, "chess", "a", "").await.unwrap();
    for i in 0..5 {
        db::post_message(&pool, &alice, &room_id, &format!("msg {i}")).await.unwrap();
    }

    let recent = db::recent_messages(&pool, 3).await.unwrap();
    assert_eq!(recent.len(), 3);
}

#[tokio::test]
async fn usernames_are_stored_lowercase() {
    let pool = pool().await;
    let id = db::create_user(&pool, "carol@example.com", "CaRoL", "hash")
        .await
        .unwrap();

    let carol = db::user_by_id(&pool, &id).await.unwrap().unwrap();
    assert_eq!(carol.username, "carol");
}

#[tokio::test]
async fn profile_rooms_include_hosted_and_joined() {
    let pool = pool().await;
    let alice = user(&pool, "alice").await;
    let bob = user(&pool, "bob").await;
    let hosted = db::create_room(&pool, &bob, "go", "bob's", "").await.unwrap();
    let joined = db::create_room(&pool, &alice, "chess", "alice's", "").await.unwrap();
    db::post_message(&pool, &bob, &joined, "hello").await.unwrap();

    let rooms = db::rooms_for_user(&pool, &bob).await.unwrap();
    let ids: Vec<&str> = rooms.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(rooms.len(), 2);
    assert!(ids.contains(&hosted.as_str()));
    assert!(ids.contains(&joined.as_str()));
}
