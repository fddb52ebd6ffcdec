mod common;

use std::sync::Arc;

use api::domains::standings::{Standing, StandingsStrategy};
use api::error::AppError;
use axum::http::{Method, StatusCode};
use common::*;
use infra::models::{TournamentMatchRow, TournamentParticipantRow};
use serde_json::{json, Value};

struct OfflineRanking;

impl StandingsStrategy for OfflineRanking {
    fn compute(
        &self,
        _participants: &[TournamentParticipantRow],
        _results: &[TournamentMatchRow],
    ) -> Result<Vec<Standing>, AppError> {
        Err(AppError::Internal("ranking backend offline".to_string()))
    }
}

fn group_sizes(groups: &Value) -> Vec<usize> {
    let mut sizes: Vec<usize> = groups
        .as_array()
        .cloned()
        .unwrap_or_default()
        .iter()
        .map(|g| g["participants"].as_array().map(Vec::len).unwrap_or(0))
        .collect();
    sizes.sort_unstable();
    sizes
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn group_draw_fixtures_and_standings() {
    let state = setup_test_db().await;
    let (_, admin) = token_for(&state, "admin");
    let tournament_id = create_test_tournament(&state, "Torneo sociale").await;
    create_confirmed_participants(&state, tournament_id, 10).await;

    let groups_uri = format!("/tournaments/{tournament_id}/groups");
    let draw = json!({ "num_groups": 3, "participants_per_group": 4, "advancement_count": 2 });
    let (status, body) = send(router(&state), Method::POST, &groups_uri, Some(&admin), Some(draw.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(group_sizes(&body["groups"]), vec![3, 3, 4]);
    let labels: Vec<&str> = body["groups"]
        .as_array()
        .map(|gs| gs.iter().filter_map(|g| g["label"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(labels, vec!["A", "B", "C"]);

    let (status, tournament) = send(
        router(&state),
        Method::GET,
        &format!("/tournaments/{tournament_id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tournament["phase"], "groups");

    // A redraw before any match is played replaces the previous groups.
    let (status, body) = send(router(&state), Method::POST, &groups_uri, Some(&admin), Some(draw.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(group_sizes(&body["groups"]), vec![3, 3, 4]);

    let fixtures_uri = format!("/tournaments/{tournament_id}/groups/matches");
    let (status, fixtures) = send(router(&state), Method::POST, &fixtures_uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::CREATED);
    // 4 players play 6 matches, 3 players play 3.
    assert_eq!(fixtures["count"], 12);

    let (status, _) = send(router(&state), Method::POST, &groups_uri, Some(&admin), Some(draw)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, listing) = send(router(&state), Method::GET, &groups_uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    for group in listing["groups"].as_array().cloned().unwrap_or_default() {
        let standings = group["standings"].as_array().cloned().unwrap_or_default();
        assert_eq!(standings.len(), group["participants"].as_array().map(Vec::len).unwrap_or(0));
        assert!(standings.iter().all(|s| s["points"] == 0));
    }
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn group_listing_survives_a_failing_ranking() {
    let state = setup_test_db()
        .await
        .with_standings_strategy(Arc::new(OfflineRanking));
    let (_, admin) = token_for(&state, "admin");
    let tournament_id = create_test_tournament(&state, "Torneo serale").await;
    create_confirmed_participants(&state, tournament_id, 6).await;

    let groups_uri = format!("/tournaments/{tournament_id}/groups");
    let draw = json!({ "num_groups": 2, "participants_per_group": 3, "advancement_count": 1 });
    let (status, _) = send(router(&state), Method::POST, &groups_uri, Some(&admin), Some(draw)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, listing) = send(router(&state), Method::GET, &groups_uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let groups = listing["groups"].as_array().cloned().unwrap_or_default();
    assert_eq!(groups.len(), 2);
    for group in groups {
        assert!(group["standings"].is_null());
        assert_eq!(group["participants"].as_array().map(Vec::len), Some(3));
    }
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn oversized_pool_is_rejected() {
    let state = setup_test_db().await;
    let (_, admin) = token_for(&state, "admin");
    let tournament_id = create_test_tournament(&state, "Torneo pieno").await;
    create_confirmed_participants(&state, tournament_id, 9).await;

    let (status, _) = send(
        router(&state),
        Method::POST,
        &format!("/tournaments/{tournament_id}/groups"),
        Some(&admin),
        Some(json!({ "num_groups": 2, "participants_per_group": 4, "advancement_count": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn match_status_moves_forward_and_stamps_once() {
    let state = setup_test_db().await;
    let (_, coach) = token_for(&state, "maestro");
    let tournament_id = create_test_tournament(&state, "Tabellone finale").await;
    let players = create_confirmed_participants(&state, tournament_id, 2).await;

    let (status, created) = send(
        router(&state),
        Method::POST,
        &format!("/tournaments/{tournament_id}/matches"),
        Some(&coach),
        Some(json!({
            "stage": "knockout",
            "round_name": "Finale",
            "round_order": 1,
            "player1_id": players[0],
            "player2_id": players[1]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "scheduled");
    assert!(created["started_at"].is_null());

    let uri = format!("/tournaments/matches/{}", created["id"].as_str().unwrap_or_default());

    let (status, started) = send(
        router(&state),
        Method::PUT,
        &uri,
        Some(&coach),
        Some(json!({ "status": "in_progress" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let started_at = started["started_at"].clone();
    assert!(started_at.is_string());

    let (status, finished) = send(
        router(&state),
        Method::PUT,
        &uri,
        Some(&coach),
        Some(json!({
            "status": "completed",
            "player1_score": 2,
            "player2_score": 0,
            "score_details": [{ "player1": 6, "player2": 4 }, { "player1": 6, "player2": 3 }],
            "winner_id": players[0]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(finished["status"], "completed");
    assert_eq!(finished["started_at"], started_at);
    assert!(finished["completed_at"].is_string());

    let (status, _) = send(
        router(&state),
        Method::PUT,
        &uri,
        Some(&coach),
        Some(json!({ "status": "scheduled" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, listing) = send(
        router(&state),
        Method::GET,
        &format!("/tournaments/{tournament_id}/matches?stage=knockout"),
        Some(&coach),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["rounds"][0]["round_name"], "Finale");
    assert_eq!(listing["rounds"][0]["matches"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn players_register_themselves_once() {
    let state = setup_test_db().await;
    let (player_id, player) = token_for(&state, "atleta");
    let tournament_id = create_test_tournament(&state, "Open giovanile").await;
    let uri = format!("/tournaments/{tournament_id}/participants");

    let (status, row) = send(router(&state), Method::POST, &uri, Some(&player), Some(json!({}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(row["user_id"], player_id.to_string());
    assert_eq!(row["status"], "pending");

    let (status, _) = send(router(&state), Method::POST, &uri, Some(&player), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        router(&state),
        Method::POST,
        &uri,
        Some(&player),
        Some(json!({ "seed": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
