use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use infra::models::TournamentMatchRow;
use infra::repos::{
    tournament_groups, tournament_matches, tournament_participants, tournaments,
    CreateTournamentMatch, MatchFilter, MatchStage, MatchStatus, TournamentPhase,
    UpdateTournamentMatch,
};

use super::types::{CreateMatchInput, MatchListResponse, RoundMatches, UpdateMatchInput};
use crate::domains::standings::strategy::{validate_set_scores, MAX_SETS};
use crate::error::AppError;

/// Shape checks that need no database access.
pub fn validate_new_match(input: &CreateMatchInput) -> Result<(), AppError> {
    match input.stage {
        MatchStage::Groups => {
            if input.group_id.is_none() {
                return Err(AppError::BadRequest(
                    "Group-stage matches require a group_id".to_string(),
                ));
            }
        }
        MatchStage::Knockout => {
            let named = input
                .round_name
                .as_deref()
                .is_some_and(|name| !name.trim().is_empty());
            if !named || input.round_order.is_none() {
                return Err(AppError::BadRequest(
                    "Knockout matches require round_name and round_order".to_string(),
                ));
            }
        }
    }

    if input.round_order.is_some_and(|order| order < 1) {
        return Err(AppError::BadRequest(
            "round_order must be at least 1".to_string(),
        ));
    }
    if input.match_number.is_some_and(|n| n < 1) {
        return Err(AppError::BadRequest(
            "match_number must be at least 1".to_string(),
        ));
    }
    if let (Some(p1), Some(p2)) = (input.player1_id, input.player2_id) {
        if p1 == p2 {
            return Err(AppError::BadRequest(
                "A participant cannot play against themselves".to_string(),
            ));
        }
    }
    Ok(())
}

/// Turn a requested update into the columns to write.
///
/// Status only moves forward (`scheduled → in_progress → completed`).
/// The first entry into `in_progress` and into `completed` stamps
/// `started_at` / `completed_at`; an existing stamp is never replaced.
pub fn plan_update(
    current: &TournamentMatchRow,
    input: &UpdateMatchInput,
    now: DateTime<Utc>,
) -> Result<UpdateTournamentMatch, AppError> {
    for score in [input.player1_score, input.player2_score].into_iter().flatten() {
        if score < 0 {
            return Err(AppError::BadRequest("Scores cannot be negative".to_string()));
        }
        if score > MAX_SETS as i32 {
            return Err(AppError::BadRequest(format!(
                "A player cannot win more than {MAX_SETS} sets"
            )));
        }
    }
    if let Some(details) = &input.score_details {
        validate_set_scores(details)?;
    }

    if let Some(winner) = input.winner_id {
        if !current.has_player(winner) {
            return Err(AppError::BadRequest(
                "winner_id must be one of the match's players".to_string(),
            ));
        }
    }

    let mut patch = UpdateTournamentMatch {
        player1_score: input.player1_score,
        player2_score: input.player2_score,
        score_details: input.score_details.clone(),
        winner_id: input.winner_id,
        court: input.court.clone(),
        scheduled_at: input.scheduled_at,
        ..Default::default()
    };

    if let Some(next) = input.status {
        if next < current.status {
            return Err(AppError::BadRequest(format!(
                "Match status cannot go back from {} to {}",
                current.status.as_str(),
                next.as_str()
            )));
        }
        if next != current.status {
            patch.status = Some(next);
        }
        if next == MatchStatus::InProgress && current.started_at.is_none() {
            patch.started_at = Some(now);
        }
        if next == MatchStatus::Completed && current.completed_at.is_none() {
            patch.completed_at = Some(now);
        }
    }

    Ok(patch)
}

/// Group knockout matches by round, rounds ascending by `round_order`.
pub fn organize_rounds(matches: &[TournamentMatchRow]) -> Vec<RoundMatches> {
    let mut rounds: BTreeMap<(i32, String), Vec<TournamentMatchRow>> = BTreeMap::new();
    for m in matches.iter().filter(|m| m.stage == MatchStage::Knockout) {
        let key = (
            m.round_order.unwrap_or(i32::MAX),
            m.round_name.clone().unwrap_or_default(),
        );
        rounds.entry(key).or_default().push(m.clone());
    }

    rounds
        .into_iter()
        .map(|((round_order, round_name), mut list)| {
            list.sort_by_key(|m| {
                (
                    m.match_number.unwrap_or(i32::MAX),
                    m.scheduled_at,
                    m.created_at,
                )
            });
            RoundMatches {
                round_name,
                round_order,
                matches: list,
            }
        })
        .collect()
}

/// Round-robin pairings by the circle method. Each pair meets exactly once;
/// with an odd count one player rests per round.
pub fn round_robin_rounds<T: Clone>(players: &[T]) -> Vec<Vec<(T, T)>> {
    if players.len() < 2 {
        return Vec::new();
    }

    let mut ring: Vec<Option<T>> = players.iter().cloned().map(Some).collect();
    if ring.len() % 2 == 1 {
        ring.push(None);
    }
    let size = ring.len();

    let mut rounds = Vec::with_capacity(size - 1);
    for _ in 0..size - 1 {
        let pairs = (0..size / 2)
            .filter_map(|i| match (&ring[i], &ring[size - 1 - i]) {
                (Some(a), Some(b)) => Some((a.clone(), b.clone())),
                _ => None,
            })
            .collect();
        rounds.push(pairs);
        // First seat stays put, everyone else rotates one step.
        ring[1..].rotate_right(1);
    }
    rounds
}

pub async fn create_match(
    pool: &PgPool,
    tournament_id: Uuid,
    input: CreateMatchInput,
) -> Result<TournamentMatchRow, AppError> {
    validate_new_match(&input)?;

    tournaments::get_by_id(pool, tournament_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Tournament {tournament_id} not found")))?;

    if let Some(group_id) = input.group_id {
        let group = tournament_groups::get_by_id(pool, group_id)
            .await?
            .ok_or_else(|| AppError::BadRequest(format!("Group {group_id} does not exist")))?;
        if group.tournament_id != tournament_id {
            return Err(AppError::BadRequest(
                "Group belongs to a different tournament".to_string(),
            ));
        }
    }

    for player_id in [input.player1_id, input.player2_id].into_iter().flatten() {
        let participant = tournament_participants::get_by_id(pool, player_id)
            .await?
            .filter(|p| p.tournament_id == tournament_id)
            .ok_or_else(|| {
                AppError::BadRequest(format!(
                    "Participant {player_id} is not registered in this tournament"
                ))
            })?;
        if input.stage == MatchStage::Groups && participant.group_id != input.group_id {
            return Err(AppError::BadRequest(format!(
                "Participant {player_id} is not a member of the match's group"
            )));
        }
    }

    let row = tournament_matches::create(
        pool,
        CreateTournamentMatch {
            tournament_id,
            group_id: input.group_id,
            player1_id: input.player1_id,
            player2_id: input.player2_id,
            stage: input.stage,
            round_name: input.round_name,
            round_order: input.round_order,
            match_number: input.match_number,
            court: input.court,
            scheduled_at: input.scheduled_at,
        },
    )
    .await?;

    tracing::info!(match_id = %row.id, %tournament_id, stage = row.stage.as_str(), "Match created");
    Ok(row)
}

pub async fn list_matches(
    pool: &PgPool,
    tournament_id: Uuid,
    filter: MatchFilter,
) -> Result<MatchListResponse, AppError> {
    tournaments::get_by_id(pool, tournament_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Tournament {tournament_id} not found")))?;

    let matches = tournament_matches::list_by_tournament(pool, tournament_id, filter).await?;
    let rounds = organize_rounds(&matches);
    Ok(MatchListResponse { matches, rounds })
}

pub async fn update_match(
    pool: &PgPool,
    match_id: Uuid,
    input: UpdateMatchInput,
) -> Result<TournamentMatchRow, AppError> {
    let mut tx = pool.begin().await?;

    let current = tournament_matches::get_by_id_for_update(&mut *tx, match_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Match {match_id} not found")))?;

    let patch = plan_update(&current, &input, Utc::now())?;
    let updated = tournament_matches::update(&mut *tx, match_id, patch).await?;
    tx.commit().await?;

    if updated.status != current.status {
        tracing::info!(
            %match_id,
            from = current.status.as_str(),
            to = updated.status.as_str(),
            "Match status changed"
        );
    }
    Ok(updated)
}

/// Create the full round-robin schedule for every group of a tournament.
pub async fn generate_group_fixtures(
    pool: &PgPool,
    tournament_id: Uuid,
) -> Result<Vec<TournamentMatchRow>, AppError> {
    let mut tx = pool.begin().await?;

    let tournament = tournaments::get_by_id_for_update(&mut *tx, tournament_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Tournament {tournament_id} not found")))?;
    if tournament.phase != TournamentPhase::Groups {
        return Err(AppError::BadRequest(format!(
            "Fixtures can only be generated during the groups phase (current: {})",
            tournament.phase.as_str()
        )));
    }

    let existing =
        tournament_matches::count_by_stage(&mut *tx, tournament_id, MatchStage::Groups).await?;
    if existing > 0 {
        return Err(AppError::BadRequest(
            "Group-stage matches already exist for this tournament".to_string(),
        ));
    }

    let groups = tournament_groups::list_by_tournament(&mut *tx, tournament_id).await?;
    if groups.is_empty() {
        return Err(AppError::BadRequest(
            "Draw the groups before generating fixtures".to_string(),
        ));
    }

    let mut created = Vec::new();
    for group in &groups {
        let members = tournament_participants::list_by_group(&mut *tx, group.id).await?;
        let ids: Vec<Uuid> = members.iter().map(|p| p.id).collect();

        let mut match_number = 0;
        for (round_index, pairs) in round_robin_rounds(&ids).into_iter().enumerate() {
            for (player1, player2) in pairs {
                match_number += 1;
                let row = tournament_matches::create(
                    &mut *tx,
                    CreateTournamentMatch {
                        tournament_id,
                        group_id: Some(group.id),
                        player1_id: Some(player1),
                        player2_id: Some(player2),
                        stage: MatchStage::Groups,
                        round_name: Some(format!("Giornata {}", round_index + 1)),
                        round_order: Some(round_index as i32 + 1),
                        match_number: Some(match_number),
                        court: None,
                        scheduled_at: None,
                    },
                )
                .await?;
                created.push(row);
            }
        }
    }

    tx.commit().await?;
    tracing::info!(%tournament_id, matches = created.len(), "Group fixtures generated");
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::collections::HashSet;

    fn base_match(stage: MatchStage) -> TournamentMatchRow {
        let created = Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap();
        TournamentMatchRow {
            id: Uuid::new_v4(),
            tournament_id: Uuid::nil(),
            group_id: None,
            player1_id: Some(Uuid::new_v4()),
            player2_id: Some(Uuid::new_v4()),
            stage,
            round_name: None,
            round_order: None,
            match_number: None,
            court: None,
            scheduled_at: None,
            status: MatchStatus::Scheduled,
            player1_score: None,
            player2_score: None,
            score_details: None,
            winner_id: None,
            started_at: None,
            completed_at: None,
            created_at: created,
            updated_at: created,
        }
    }

    fn knockout(round: &str, order: i32, number: i32) -> TournamentMatchRow {
        let mut m = base_match(MatchStage::Knockout);
        m.round_name = Some(round.to_string());
        m.round_order = Some(order);
        m.match_number = Some(number);
        m
    }

    fn status_update(status: MatchStatus) -> UpdateMatchInput {
        UpdateMatchInput {
            status: Some(status),
            ..Default::default()
        }
    }

    #[test]
    fn entering_in_progress_stamps_start_once() {
        let now = Utc::now();
        let current = base_match(MatchStage::Groups);

        let patch = plan_update(&current, &status_update(MatchStatus::InProgress), now).unwrap();
        assert_eq!(patch.status, Some(MatchStatus::InProgress));
        assert_eq!(patch.started_at, Some(now));
        assert_eq!(patch.completed_at, None);

        let mut started = current.clone();
        started.status = MatchStatus::InProgress;
        started.started_at = Some(now - Duration::minutes(30));
        let patch = plan_update(&started, &status_update(MatchStatus::InProgress), now).unwrap();
        assert_eq!(patch.status, None);
        assert_eq!(patch.started_at, None);
    }

    #[test]
    fn completion_stamp_is_never_overwritten_or_reversed() {
        let now = Utc::now();
        let mut done = base_match(MatchStage::Knockout);
        done.status = MatchStatus::Completed;
        done.completed_at = Some(now - Duration::hours(1));

        let back = plan_update(&done, &status_update(MatchStatus::InProgress), now);
        assert!(matches!(back, Err(AppError::BadRequest(_))));

        let again = plan_update(&done, &status_update(MatchStatus::Completed), now).unwrap();
        assert_eq!(again.completed_at, None);
        assert_eq!(again.status, None);
    }

    #[test]
    fn jumping_straight_to_completed_stamps_completion() {
        let now = Utc::now();
        let current = base_match(MatchStage::Groups);
        let patch = plan_update(&current, &status_update(MatchStatus::Completed), now).unwrap();
        assert_eq!(patch.status, Some(MatchStatus::Completed));
        assert_eq!(patch.completed_at, Some(now));
        assert_eq!(patch.started_at, None);
    }

    #[test]
    fn scores_and_winner_update_without_status_change() {
        let current = base_match(MatchStage::Groups);
        let winner = current.player2_id.unwrap();
        let input = UpdateMatchInput {
            player1_score: Some(1),
            player2_score: Some(2),
            winner_id: Some(winner),
            score_details: Some(serde_json::json!([{"player1": 6, "player2": 4}])),
            ..Default::default()
        };

        let patch = plan_update(&current, &input, Utc::now()).unwrap();
        assert_eq!(patch.status, None);
        assert_eq!(patch.winner_id, Some(winner));
        assert_eq!(patch.player2_score, Some(2));
        assert!(patch.started_at.is_none() && patch.completed_at.is_none());
    }

    #[test]
    fn winner_must_play_in_the_match() {
        let current = base_match(MatchStage::Groups);
        let input = UpdateMatchInput {
            winner_id: Some(Uuid::new_v4()),
            ..Default::default()
        };
        assert!(plan_update(&current, &input, Utc::now()).is_err());

        let negative = UpdateMatchInput {
            player1_score: Some(-1),
            ..Default::default()
        };
        assert!(plan_update(&current, &negative, Utc::now()).is_err());
    }

    #[test]
    fn out_of_range_results_are_refused() {
        let current = base_match(MatchStage::Groups);
        let refused = |input: UpdateMatchInput| {
            matches!(
                plan_update(&current, &input, Utc::now()),
                Err(AppError::BadRequest(_))
            )
        };

        assert!(refused(UpdateMatchInput {
            player1_score: Some(i32::MAX),
            ..Default::default()
        }));
        assert!(refused(UpdateMatchInput {
            score_details: Some(serde_json::json!([
                {"player1": 2147483647, "player2": -5},
                {"player1": 1, "player2": 0}
            ])),
            ..Default::default()
        }));
        assert!(refused(UpdateMatchInput {
            score_details: Some(serde_json::json!({"player1": 6, "player2": 4})),
            ..Default::default()
        }));
        assert!(refused(UpdateMatchInput {
            score_details: Some(serde_json::Value::Array(vec![
                serde_json::json!({"player1": 6, "player2": 4});
                6
            ])),
            ..Default::default()
        }));

        let five_setter = UpdateMatchInput {
            player1_score: Some(3),
            player2_score: Some(2),
            score_details: Some(serde_json::json!([
                {"player1": 6, "player2": 4},
                {"player1": 3, "player2": 6},
                {"player1": 7, "player2": 6},
                {"player1": 4, "player2": 6},
                {"player1": 18, "player2": 16}
            ])),
            ..Default::default()
        };
        assert!(plan_update(&current, &five_setter, Utc::now()).is_ok());
    }

    #[test]
    fn rounds_are_ordered_by_round_order_then_match_number() {
        let matches = vec![
            knockout("Finale", 3, 1),
            knockout("Quarti", 1, 2),
            knockout("Semifinali", 2, 1),
            knockout("Quarti", 1, 1),
            base_match(MatchStage::Groups),
        ];

        let rounds = organize_rounds(&matches);
        let names: Vec<&str> = rounds.iter().map(|r| r.round_name.as_str()).collect();
        assert_eq!(names, vec!["Quarti", "Semifinali", "Finale"]);

        let quarter_numbers: Vec<Option<i32>> =
            rounds[0].matches.iter().map(|m| m.match_number).collect();
        assert_eq!(quarter_numbers, vec![Some(1), Some(2)]);
        assert_eq!(rounds.iter().map(|r| r.matches.len()).sum::<usize>(), 4);
    }

    #[test]
    fn round_robin_pairs_everyone_exactly_once() {
        for size in 2..=9usize {
            let players: Vec<usize> = (0..size).collect();
            let rounds = round_robin_rounds(&players);

            let expected_rounds = if size % 2 == 0 { size - 1 } else { size };
            assert_eq!(rounds.len(), expected_rounds);

            let mut seen = HashSet::new();
            for round in &rounds {
                let mut busy = HashSet::new();
                for &(a, b) in round {
                    assert_ne!(a, b);
                    assert!(busy.insert(a) && busy.insert(b), "player twice in a round");
                    assert!(seen.insert((a.min(b), a.max(b))), "pair repeated");
                }
            }
            assert_eq!(seen.len(), size * (size - 1) / 2);
        }
    }

    #[test]
    fn round_robin_needs_two_players() {
        assert!(round_robin_rounds::<u8>(&[]).is_empty());
        assert!(round_robin_rounds(&[1]).is_empty());
    }

    #[test]
    fn new_match_shape_is_checked() {
        let group_id = Uuid::new_v4();
        let p = Uuid::new_v4();
        let valid = CreateMatchInput {
            player1_id: Some(p),
            player2_id: None,
            stage: MatchStage::Knockout,
            round_name: Some("Quarti".into()),
            round_order: Some(1),
            group_id: None,
            match_number: Some(1),
            scheduled_at: None,
            court: Some("Campo 1".into()),
        };
        assert!(validate_new_match(&valid).is_ok());

        let unnamed = CreateMatchInput {
            round_name: Some("  ".into()),
            ..valid.clone()
        };
        assert!(validate_new_match(&unnamed).is_err());

        let same_player = CreateMatchInput {
            player2_id: Some(p),
            ..valid.clone()
        };
        assert!(validate_new_match(&same_player).is_err());

        let group_without_id = CreateMatchInput {
            stage: MatchStage::Groups,
            ..valid.clone()
        };
        assert!(validate_new_match(&group_without_id).is_err());

        let group_ok = CreateMatchInput {
            stage: MatchStage::Groups,
            group_id: Some(group_id),
            round_name: None,
            round_order: None,
            ..valid
        };
        assert!(validate_new_match(&group_ok).is_ok());
    }
}
