use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use infra::models::{TournamentGroupRow, TournamentMatchRow, TournamentParticipantRow};
use infra::repos::{tournament_groups, tournament_matches, tournament_participants, MatchFilter, MatchStage};

use super::strategy::{Standing, StandingsStrategy};
use crate::error::AppError;

#[derive(Debug, Serialize)]
pub struct GroupWithStandings {
    #[serde(flatten)]
    pub group: TournamentGroupRow,
    pub participants: Vec<TournamentParticipantRow>,
    /// `None` when the table could not be computed for this group.
    pub standings: Option<Vec<Standing>>,
}

/// Standings of one group. Errors propagate to the caller.
pub async fn group_standings(
    pool: &PgPool,
    strategy: &dyn StandingsStrategy,
    group_id: Uuid,
) -> Result<Vec<Standing>, AppError> {
    let group = tournament_groups::get_by_id(pool, group_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Group {group_id} not found")))?;
    let participants = tournament_participants::list_by_group(pool, group.id).await?;
    let results = group_results(pool, &group).await?;
    strategy.compute(&participants, &results)
}

async fn group_results(
    pool: &PgPool,
    group: &TournamentGroupRow,
) -> Result<Vec<TournamentMatchRow>, AppError> {
    Ok(tournament_matches::list_by_tournament(
        pool,
        group.tournament_id,
        MatchFilter {
            stage: Some(MatchStage::Groups),
            status: None,
            group_id: Some(group.id),
        },
    )
    .await?)
}

/// Attach a table to one group. Loading the results or ranking them may
/// fail; either failure is logged and leaves `standings` as `None`.
pub fn rank_group(
    strategy: &dyn StandingsStrategy,
    group: TournamentGroupRow,
    participants: Vec<TournamentParticipantRow>,
    results: Result<Vec<TournamentMatchRow>, AppError>,
) -> GroupWithStandings {
    let standings = match results.and_then(|r| strategy.compute(&participants, &r)) {
        Ok(table) => Some(table),
        Err(e) => {
            tracing::warn!(
                group_id = %group.id,
                "Failed to compute standings for group {}: {}",
                group.label,
                e
            );
            None
        }
    };

    GroupWithStandings {
        group,
        participants,
        standings,
    }
}

/// All groups of a tournament with their members and tables.
///
/// Standings are best-effort: a failure for one group is logged and leaves
/// that group's `standings` empty instead of failing the listing.
pub async fn list_groups_with_standings(
    pool: &PgPool,
    strategy: &dyn StandingsStrategy,
    tournament_id: Uuid,
) -> Result<Vec<GroupWithStandings>, AppError> {
    let groups = tournament_groups::list_by_tournament(pool, tournament_id).await?;

    let mut enriched = Vec::with_capacity(groups.len());
    for group in groups {
        let participants = tournament_participants::list_by_group(pool, group.id).await?;
        let results = group_results(pool, &group).await;
        enriched.push(rank_group(strategy, group, participants, results));
    }

    Ok(enriched)
}
