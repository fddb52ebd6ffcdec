use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use infra::models::{TournamentMatchRow, TournamentParticipantRow};
use infra::repos::MatchStatus;

use crate::error::AppError;

/// Most sets a single match can record.
pub const MAX_SETS: usize = 5;
/// Upper bound for games in one set and for a player's set score.
pub const MAX_SET_GAMES: i32 = 99;

/// One row of a group table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Standing {
    pub rank: usize,
    pub participant_id: Uuid,
    pub user_id: Uuid,
    pub played: i32,
    pub wins: i32,
    pub losses: i32,
    pub sets_won: i32,
    pub sets_lost: i32,
    pub games_won: i32,
    pub games_lost: i32,
    pub points: i32,
}

impl Standing {
    fn empty(participant: &TournamentParticipantRow) -> Self {
        Self {
            rank: 0,
            participant_id: participant.id,
            user_id: participant.user_id,
            played: 0,
            wins: 0,
            losses: 0,
            sets_won: 0,
            sets_lost: 0,
            games_won: 0,
            games_lost: 0,
            points: 0,
        }
    }

    pub fn set_difference(&self) -> i32 {
        self.sets_won.saturating_sub(self.sets_lost)
    }

    pub fn game_difference(&self) -> i32 {
        self.games_won.saturating_sub(self.games_lost)
    }
}

/// Ranks the members of one group from its match results.
///
/// Implementations may fail (an external ranking source, a broken result);
/// callers decide whether that failure is fatal.
pub trait StandingsStrategy: Send + Sync {
    fn compute(
        &self,
        participants: &[TournamentParticipantRow],
        results: &[TournamentMatchRow],
    ) -> Result<Vec<Standing>, AppError>;
}

/// Games of one set as stored in `score_details`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SetScore {
    pub player1: i32,
    pub player2: i32,
}

/// Reads `score_details`; anything that isn't a list of sets counts as no games.
pub fn parse_set_scores(details: Option<&serde_json::Value>) -> Vec<SetScore> {
    details
        .and_then(|value| serde_json::from_value::<Vec<SetScore>>(value.clone()).ok())
        .unwrap_or_default()
}

/// Strict form of [`parse_set_scores`] for incoming results: a list of at
/// most [`MAX_SETS`] sets, each side between 0 and [`MAX_SET_GAMES`] games.
pub fn validate_set_scores(details: &serde_json::Value) -> Result<Vec<SetScore>, AppError> {
    let sets = serde_json::from_value::<Vec<SetScore>>(details.clone()).map_err(|_| {
        AppError::BadRequest(
            r#"score_details must be a list of sets like [{"player1": 6, "player2": 4}]"#
                .to_string(),
        )
    })?;
    if sets.len() > MAX_SETS {
        return Err(AppError::BadRequest(format!(
            "score_details cannot hold more than {MAX_SETS} sets"
        )));
    }
    let in_range = |games: i32| (0..=MAX_SET_GAMES).contains(&games);
    if let Some(i) = sets
        .iter()
        .position(|set| !in_range(set.player1) || !in_range(set.player2))
    {
        return Err(AppError::BadRequest(format!(
            "set {} must have between 0 and {MAX_SET_GAMES} games per player",
            i + 1
        )));
    }
    Ok(sets)
}

/// Classic points table: fixed points per win and loss, ties broken by set
/// difference, game difference, then sets won.
#[derive(Debug, Clone, Copy)]
pub struct PointsTableStrategy {
    pub points_per_win: i32,
    pub points_per_loss: i32,
}

impl Default for PointsTableStrategy {
    fn default() -> Self {
        Self {
            points_per_win: 2,
            points_per_loss: 0,
        }
    }
}

impl StandingsStrategy for PointsTableStrategy {
    fn compute(
        &self,
        participants: &[TournamentParticipantRow],
        results: &[TournamentMatchRow],
    ) -> Result<Vec<Standing>, AppError> {
        let mut table: HashMap<Uuid, Standing> = participants
            .iter()
            .map(|p| (p.id, Standing::empty(p)))
            .collect();

        for result in results {
            if result.status != MatchStatus::Completed {
                continue;
            }
            let (Some(p1), Some(p2), Some(winner)) =
                (result.player1_id, result.player2_id, result.winner_id)
            else {
                continue;
            };
            if !table.contains_key(&p1) || !table.contains_key(&p2) || !result.has_player(winner)
            {
                continue;
            }

            let p1_sets = result.player1_score.unwrap_or(0);
            let p2_sets = result.player2_score.unwrap_or(0);
            let (p1_games, p2_games) = parse_set_scores(result.score_details.as_ref())
                .iter()
                .fold((0i32, 0i32), |(a, b), set| {
                    (a.saturating_add(set.player1), b.saturating_add(set.player2))
                });

            for (id, sets_won, sets_lost, games_won, games_lost) in [
                (p1, p1_sets, p2_sets, p1_games, p2_games),
                (p2, p2_sets, p1_sets, p2_games, p1_games),
            ] {
                if let Some(row) = table.get_mut(&id) {
                    row.played = row.played.saturating_add(1);
                    row.sets_won = row.sets_won.saturating_add(sets_won);
                    row.sets_lost = row.sets_lost.saturating_add(sets_lost);
                    row.games_won = row.games_won.saturating_add(games_won);
                    row.games_lost = row.games_lost.saturating_add(games_lost);
                    if id == winner {
                        row.wins = row.wins.saturating_add(1);
                        row.points = row.points.saturating_add(self.points_per_win);
                    } else {
                        row.losses = row.losses.saturating_add(1);
                        row.points = row.points.saturating_add(self.points_per_loss);
                    }
                }
            }
        }

        let mut standings: Vec<Standing> = table.into_values().collect();
        standings.sort_by(compare_standings);
        for (i, standing) in standings.iter_mut().enumerate() {
            standing.rank = i + 1;
        }
        Ok(standings)
    }
}

fn compare_standings(a: &Standing, b: &Standing) -> Ordering {
    b.points
        .cmp(&a.points)
        .then_with(|| b.set_difference().cmp(&a.set_difference()))
        .then_with(|| b.game_difference().cmp(&a.game_difference()))
        .then_with(|| b.sets_won.cmp(&a.sets_won))
        .then_with(|| a.participant_id.cmp(&b.participant_id))
}
