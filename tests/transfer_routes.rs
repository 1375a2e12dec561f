use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

use viewvault::{
    config::AppConfig,
    db::connection,
    routes::{API_PREFIX, router},
    state::AppState,
};

async fn app_state() -> Arc<AppState> {
    let cfg = AppConfig::from_env().expect("load app config");
    let db = connection::connect(&cfg).await.expect("connect to database");
    AppState::new(cfg, db)
}

fn api_path(path: &str) -> String {
    format!("{API_PREFIX}{path}")
}

async fn json_response(
    state: &Arc<AppState>,
    request: Request<Body>,
) -> (StatusCode, serde_json::Value) {
    let response = router(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let body = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    (status, json)
}

fn json_data(json: &serde_json::Value) -> &serde_json::Value {
    json.get("data").unwrap_or(json)
}

async fn post_json(
    state: &Arc<AppState>,
    path: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    json_response(
        state,
        Request::builder()
            .method("POST")
            .uri(api_path(path))
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

async fn create_list(state: &Arc<AppState>, owner_id: &Uuid, name: &str) -> Uuid {
    let (status, list) = post_json(
        state,
        "/lists",
        json!({ "owner_id": owner_id, "name": name }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    Uuid::parse_str(json_data(&list)["id"].as_str().unwrap()).unwrap()
}

async fn create_movie(state: &Arc<AppState>, title: &str) -> Uuid {
    let (status, movie) = post_json(state, "/movies", json!({ "title": title })).await;
    assert_eq!(status, StatusCode::CREATED);
    Uuid::parse_str(json_data(&movie)["id"].as_str().unwrap()).unwrap()
}

async fn add_item(state: &Arc<AppState>, list_id: &Uuid, item_id: &Uuid, item_type: &str) {
    let (status, _) = post_json(
        state,
        &format!("/lists/{list_id}/items"),
        json!({ "item_id": item_id, "item_type": item_type }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

async fn list_items(state: &Arc<AppState>, list_id: &Uuid) -> Vec<serde_json::Value> {
    let (status, page) = json_response(
        state,
        Request::builder()
            .uri(api_path(&format!("/lists/{list_id}/items?page=1&page_size=100")))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    json_data(&page)["items"].as_array().unwrap().clone()
}

#[tokio::test]
#[ignore = "requires Postgres database"]
async fn copy_blocks_on_second_attempt() {
    let state = app_state().await;
    let owner_id = Uuid::new_v4();
    let list_a = create_list(&state, &owner_id, "List A").await;
    let list_b = create_list(&state, &owner_id, "List B").await;
    let movie_id = create_movie(&state, "Inception").await;
    add_item(&state, &list_a, &movie_id, "movie").await;

    let transfer_body = json!({
        "item_id": movie_id,
        "item_type": "movie",
        "source_list_id": list_a,
        "target_list_id": list_b,
        "operation": "copy",
        "on_duplicate": "block"
    });

    let (status, report) = post_json(&state, "/lists/transfer", transfer_body.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_data(&report)["status"].as_str(), Some("ok"));
    assert_eq!(json_data(&report)["copied"].as_u64(), Some(1));
    assert_eq!(list_items(&state, &list_b).await.len(), 1);

    let (status, report) = post_json(&state, "/lists/transfer", transfer_body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json_data(&report)["status"].as_str(),
        Some("duplicate_found")
    );
    assert_eq!(list_items(&state, &list_b).await.len(), 1);
}

#[tokio::test]
#[ignore = "requires Postgres database"]
async fn copy_is_non_destructive() {
    let state = app_state().await;
    let owner_id = Uuid::new_v4();
    let list_a = create_list(&state, &owner_id, "List A").await;
    let list_b = create_list(&state, &owner_id, "List B").await;
    let movie_id = create_movie(&state, &format!("Movie {}", Uuid::new_v4())).await;
    add_item(&state, &list_a, &movie_id, "movie").await;

    let (status, _) = post_json(
        &state,
        "/lists/transfer",
        json!({
            "item_id": movie_id,
            "item_type": "movie",
            "source_list_id": list_a,
            "target_list_id": list_b,
            "operation": "copy",
            "on_duplicate": "block"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let source_items = list_items(&state, &list_a).await;
    assert_eq!(source_items.len(), 1);
    assert_eq!(
        source_items[0]["item_id"].as_str(),
        Some(movie_id.to_string().as_str())
    );
}

#[tokio::test]
#[ignore = "requires Postgres database"]
async fn series_move_transfers_every_episode() {
    let state = app_state().await;
    let owner_id = Uuid::new_v4();
    let list_a = create_list(&state, &owner_id, "List A").await;
    let list_b = create_list(&state, &owner_id, "List B").await;

    let (status, series) = post_json(&state, "/series", json!({ "title": "Lost" })).await;
    assert_eq!(status, StatusCode::CREATED);
    let series_id = Uuid::parse_str(json_data(&series)["id"].as_str().unwrap()).unwrap();

    let mut episode_ids = Vec::new();
    for number in 1..=5 {
        let (status, episode) = post_json(
            &state,
            &format!("/series/{series_id}/episodes"),
            json!({ "season": 1, "number": number, "title": format!("Episode {number}") }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let episode_id =
            Uuid::parse_str(json_data(&episode)["id"].as_str().unwrap()).unwrap();
        add_item(&state, &list_a, &episode_id, "episode").await;
        episode_ids.push(episode_id.to_string());
    }

    let (status, report) = post_json(
        &state,
        "/lists/transfer",
        json!({
            "item_id": series_id,
            "item_type": "series",
            "source_list_id": list_a,
            "target_list_id": list_b,
            "operation": "move",
            "on_duplicate": "skip"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_data(&report)["moved"].as_u64(), Some(5));

    let target_items = list_items(&state, &list_b).await;
    assert_eq!(target_items.len(), 5);
    let moved_ids: HashSet<&str> = target_items
        .iter()
        .map(|item| item["item_id"].as_str().unwrap())
        .collect();
    for episode_id in &episode_ids {
        assert!(moved_ids.contains(episode_id.as_str()));
    }
    assert!(list_items(&state, &list_a).await.is_empty());
}

#[tokio::test]
#[ignore = "requires Postgres database"]
async fn move_with_remove_source_only_deletes_without_insert() {
    let state = app_state().await;
    let owner_id = Uuid::new_v4();
    let list_a = create_list(&state, &owner_id, "List A").await;
    let list_b = create_list(&state, &owner_id, "List B").await;
    let movie_id = create_movie(&state, &format!("Movie {}", Uuid::new_v4())).await;
    add_item(&state, &list_a, &movie_id, "movie").await;
    add_item(&state, &list_b, &movie_id, "movie").await;

    let (status, report) = post_json(
        &state,
        "/lists/transfer",
        json!({
            "item_id": movie_id,
            "item_type": "movie",
            "source_list_id": list_a,
            "target_list_id": list_b,
            "operation": "move",
            "on_duplicate": "remove_source_only"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_data(&report)["moved"].as_u64(), Some(1));

    assert!(list_items(&state, &list_a).await.is_empty());
    assert_eq!(list_items(&state, &list_b).await.len(), 1);
}

#[tokio::test]
#[ignore = "requires Postgres database"]
async fn bulk_skip_is_idempotent() {
    let state = app_state().await;
    let owner_id = Uuid::new_v4();
    let list_a = create_list(&state, &owner_id, "List A").await;
    let list_b = create_list(&state, &owner_id, "List B").await;

    let mut items = Vec::new();
    for index in 0..3 {
        let movie_id =
            create_movie(&state, &format!("Movie {index} {}", Uuid::new_v4())).await;
        add_item(&state, &list_a, &movie_id, "movie").await;
        items.push(json!({ "item_id": movie_id, "item_type": "movie" }));
    }

    let bulk_body = json!({
        "items": items,
        "source_list_id": list_a,
        "target_list_id": list_b,
        "operation": "copy",
        "on_duplicate": "skip"
    });

    let (status, report) = post_json(&state, "/lists/bulk-transfer", bulk_body.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_data(&report)["copied_count"].as_u64(), Some(3));
    assert_eq!(json_data(&report)["skipped_count"].as_u64(), Some(0));

    // A second identical call changes nothing.
    let (status, report) = post_json(&state, "/lists/bulk-transfer", bulk_body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_data(&report)["copied_count"].as_u64(), Some(0));
    assert_eq!(json_data(&report)["skipped_count"].as_u64(), Some(3));
    assert_eq!(list_items(&state, &list_b).await.len(), 3);
}

#[tokio::test]
#[ignore = "requires Postgres database"]
async fn bulk_move_reports_dangling_items() {
    let state = app_state().await;
    let owner_id = Uuid::new_v4();
    let list_a = create_list(&state, &owner_id, "List A").await;
    let list_b = create_list(&state, &owner_id, "List B").await;

    let present = create_movie(&state, &format!("Movie {}", Uuid::new_v4())).await;
    add_item(&state, &list_a, &present, "movie").await;
    let dangling = Uuid::new_v4();

    let (status, report) = post_json(
        &state,
        "/lists/bulk-transfer",
        json!({
            "items": [
                { "item_id": present, "item_type": "movie" },
                { "item_id": dangling, "item_type": "movie" }
            ],
            "source_list_id": list_a,
            "target_list_id": list_b,
            "operation": "move",
            "on_duplicate": "skip"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let report = json_data(&report);
    assert_eq!(report["moved_count"].as_u64(), Some(1));
    assert_eq!(report["errors"].as_array().unwrap().len(), 1);
    assert_eq!(
        report["errors"][0]["item_id"].as_str(),
        Some(dangling.to_string().as_str())
    );
}

#[tokio::test]
#[ignore = "requires Postgres database"]
async fn no_duplicates_survive_skip_transfers() {
    let state = app_state().await;
    let owner_id = Uuid::new_v4();
    let list_a = create_list(&state, &owner_id, "List A").await;
    let list_b = create_list(&state, &owner_id, "List B").await;

    let movie_id = create_movie(&state, &format!("Movie {}", Uuid::new_v4())).await;
    add_item(&state, &list_a, &movie_id, "movie").await;
    add_item(&state, &list_b, &movie_id, "movie").await;

    // Copying an item the target already holds must not create a second row.
    let (status, report) = post_json(
        &state,
        "/lists/transfer",
        json!({
            "item_id": movie_id,
            "item_type": "movie",
            "source_list_id": list_a,
            "target_list_id": list_b,
            "operation": "copy",
            "on_duplicate": "skip"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_data(&report)["skipped"].as_u64(), Some(1));

    let items = list_items(&state, &list_b).await;
    let mut pairs = HashSet::new();
    for item in &items {
        let pair = (
            item["item_id"].as_str().unwrap().to_string(),
            item["item_type"].as_str().unwrap().to_string(),
        );
        assert!(pairs.insert(pair), "duplicate pair in target list");
    }
}
