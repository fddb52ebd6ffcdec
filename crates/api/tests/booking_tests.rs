mod common;

use axum::http::{Method, StatusCode};
use common::*;
use serde_json::json;

fn encoded(court: &str) -> String {
    court.replace(' ', "%20")
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn confirmed_block_makes_overlapping_slot_unavailable() {
    let state = setup_test_db().await;
    let (_, admin) = token_for(&state, "admin");
    let court = unique_court("Campo 1");

    let (status, block) = send(
        router(&state),
        Method::POST,
        "/courts/blocks",
        Some(&admin),
        Some(json!({
            "court": court,
            "start_time": "2025-06-02T10:00:00Z",
            "end_time": "2025-06-02T11:00:00Z",
            "reason": "Lezione collettiva"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(block["manager_confirmed"], true);

    let (_, player) = token_for(&state, "atleta");
    let uri = format!(
        "/bookings/availability?date=2025-06-02&court={}&start_time=10:30&end_time=11:30",
        encoded(&court)
    );
    let (status, body) = send(router(&state), Method::GET, &uri, Some(&player), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available"], false);
    assert_eq!(body["conflicting_bookings"], 1);

    // Touching intervals do not overlap; the default slot is one hour.
    let uri = format!(
        "/bookings/availability?date=2025-06-02&court={}&start_time=11:00",
        encoded(&court)
    );
    let (status, body) = send(router(&state), Method::GET, &uri, Some(&player), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available"], true);
    assert_eq!(body["slot"]["end_time"], "12:00:00");
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn batch_with_one_conflict_inserts_nothing() {
    let state = setup_test_db().await;
    let (_, admin) = token_for(&state, "admin");
    let (_, coach) = token_for(&state, "maestro");
    let (student, _) = token_for(&state, "atleta");
    let court = unique_court("Campo 3");

    let (status, _) = send(
        router(&state),
        Method::POST,
        "/courts/blocks",
        Some(&admin),
        Some(json!({
            "court": court,
            "start_time": "2025-06-03T10:00:00Z",
            "end_time": "2025-06-03T11:00:00Z"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let batch = json!({
        "bookings": [
            { "user_id": student, "court": court,
              "start_time": "2025-06-03T09:00:00Z", "end_time": "2025-06-03T10:00:00Z" },
            { "user_id": student, "court": court,
              "start_time": "2025-06-03T10:30:00Z", "end_time": "2025-06-03T11:30:00Z" },
            { "user_id": student, "court": court,
              "start_time": "2025-06-03T12:00:00Z", "end_time": "2025-06-03T13:00:00Z" }
        ]
    });
    let (status, body) = send(
        router(&state),
        Method::POST,
        "/bookings/batch",
        Some(&coach),
        Some(batch),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["conflict_count"], 1);
    assert_eq!(body["conflicts"][0]["index"], 1);
    assert_eq!(body["conflicts"][0]["conflict_count"], 1);

    let uri = format!("/bookings?court={}", encoded(&court));
    let (status, rows) = send(router(&state), Method::GET, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let rows = rows.as_array().cloned().unwrap_or_default();
    assert_eq!(rows.len(), 1, "only the block should exist: {rows:?}");
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn clean_batch_is_inserted_confirmed() {
    let state = setup_test_db().await;
    let (_, manager) = token_for(&state, "gestore");
    let (student, _) = token_for(&state, "atleta");
    let court = unique_court("Campo 4");

    let batch = json!({
        "bookings": [
            { "user_id": student, "court": court,
              "start_time": "2025-06-04T09:00:00Z", "end_time": "2025-06-04T10:00:00Z" },
            { "user_id": student, "court": court,
              "start_time": "2025-06-04T10:00:00Z", "end_time": "2025-06-04T11:00:00Z" }
        ]
    });
    let (status, body) = send(
        router(&state),
        Method::POST,
        "/bookings/batch",
        Some(&manager),
        Some(batch),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["count"], 2);
    for booking in body["bookings"].as_array().cloned().unwrap_or_default() {
        assert_eq!(booking["manager_confirmed"], true);
        assert_eq!(booking["status"], "active");
    }
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn pending_requests_do_not_block_until_confirmed() {
    let state = setup_test_db().await;
    let (_, admin) = token_for(&state, "admin");
    let (_, first) = token_for(&state, "atleta");
    let (_, second) = token_for(&state, "atleta");
    let court = unique_court("Campo 2");
    let slot = json!({
        "court": court,
        "start_time": "2025-06-05T18:00:00Z",
        "end_time": "2025-06-05T19:00:00Z"
    });

    let (status, a) = send(router(&state), Method::POST, "/bookings", Some(&first), Some(slot.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(a["manager_confirmed"], false);

    let (status, b) = send(router(&state), Method::POST, "/bookings", Some(&second), Some(slot)).await;
    assert_eq!(status, StatusCode::CREATED);

    let uri = format!("/bookings/{}/confirm", a["id"].as_str().unwrap_or_default());
    let (status, confirmed) = send(router(&state), Method::PUT, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(confirmed["manager_confirmed"], true);

    let uri = format!("/bookings/{}/confirm", b["id"].as_str().unwrap_or_default());
    let (status, body) = send(router(&state), Method::PUT, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["conflicts"][0]["conflict_count"], 1);

    // A new request against the confirmed slot is refused outright.
    let (status, _) = send(
        router(&state),
        Method::POST,
        "/bookings",
        Some(&second),
        Some(json!({
            "court": court,
            "start_time": "2025-06-05T18:30:00Z",
            "end_time": "2025-06-05T19:30:00Z"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn only_owner_or_staff_can_cancel() {
    let state = setup_test_db().await;
    let (_, owner) = token_for(&state, "atleta");
    let (_, stranger) = token_for(&state, "atleta");
    let court = unique_court("Campo 5");

    let (status, booking) = send(
        router(&state),
        Method::POST,
        "/bookings",
        Some(&owner),
        Some(json!({
            "court": court,
            "start_time": "2025-06-06T08:00:00Z",
            "end_time": "2025-06-06T09:00:00Z"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!("/bookings/{}/cancel", booking["id"].as_str().unwrap_or_default());

    let (status, _) = send(router(&state), Method::PUT, &uri, Some(&stranger), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, cancelled) = send(router(&state), Method::PUT, &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "cancelled");

    // Cancelling twice is harmless.
    let (status, _) = send(router(&state), Method::PUT, &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
}
