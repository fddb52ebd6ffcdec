use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use infra::models::{TournamentGroupRow, TournamentParticipantRow};
use infra::repos::{
    tournament_groups, tournament_matches, tournament_participants, tournaments,
    CreateTournamentGroup, MatchStage, ParticipantStatus, TournamentPhase,
};

use crate::error::AppError;

/// Most groups a single draw may create.
pub const MAX_GROUPS: i32 = 64;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct GroupDrawParams {
    pub num_groups: i32,
    pub participants_per_group: i32,
    pub advancement_count: i32,
}

impl GroupDrawParams {
    pub fn validate(&self) -> Result<(), AppError> {
        if !(1..=MAX_GROUPS).contains(&self.num_groups) {
            return Err(AppError::BadRequest(format!(
                "num_groups must be between 1 and {MAX_GROUPS}"
            )));
        }
        if self.participants_per_group < 1 {
            return Err(AppError::BadRequest(
                "participants_per_group must be at least 1".to_string(),
            ));
        }
        if self.advancement_count < 1 || self.advancement_count > self.participants_per_group {
            return Err(AppError::BadRequest(format!(
                "advancement_count must be between 1 and {}",
                self.participants_per_group
            )));
        }
        Ok(())
    }

    /// Fail unless `confirmed` players fit the requested groups.
    pub fn check_capacity(&self, confirmed: usize) -> Result<(), AppError> {
        if confirmed == 0 {
            return Err(AppError::BadRequest(
                "No confirmed participants to distribute into groups".to_string(),
            ));
        }
        if self.num_groups as usize > confirmed {
            return Err(AppError::BadRequest(format!(
                "Cannot draw {} groups from {confirmed} confirmed participants",
                self.num_groups
            )));
        }
        let capacity = self.num_groups as usize * self.participants_per_group as usize;
        if confirmed > capacity {
            return Err(AppError::BadRequest(format!(
                "{confirmed} confirmed participants do not fit in {} groups of {}",
                self.num_groups, self.participants_per_group
            )));
        }
        Ok(())
    }
}

/// Where a participant landed: zero-based group index and 1-based position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupSlot {
    pub group_index: usize,
    pub position: i32,
}

/// Shuffle `participants` uniformly with `rng`, then deal them out like
/// cards: shuffled index `i` goes to group `i % num_groups` at position
/// `i / num_groups + 1`. Group sizes therefore differ by at most one.
pub fn assign_groups<T, R>(participants: &[T], num_groups: usize, rng: &mut R) -> Vec<(T, GroupSlot)>
where
    T: Clone,
    R: Rng + ?Sized,
{
    if num_groups == 0 {
        return Vec::new();
    }

    let mut shuffled = participants.to_vec();
    shuffled.shuffle(rng);

    shuffled
        .into_iter()
        .enumerate()
        .map(|(i, participant)| {
            let slot = GroupSlot {
                group_index: i % num_groups,
                position: (i / num_groups) as i32 + 1,
            };
            (participant, slot)
        })
        .collect()
}

/// Spreadsheet-style labels: A..Z, AA, AB, ...
pub fn group_label(index: usize) -> String {
    let mut n = index + 1;
    let mut label = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        label.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    label.reverse();
    String::from_utf8(label).unwrap_or_default()
}

#[derive(Debug, Serialize)]
pub struct DrawnGroup {
    #[serde(flatten)]
    pub group: TournamentGroupRow,
    pub participants: Vec<TournamentParticipantRow>,
}

/// Draw the group stage of a tournament.
///
/// Runs in one transaction: any previous draw is discarded, the groups are
/// created, every confirmed participant gets a group and position, and the
/// tournament moves to the group phase.
pub async fn generate_groups<R>(
    pool: &PgPool,
    rng: &mut R,
    tournament_id: Uuid,
    params: GroupDrawParams,
) -> Result<Vec<DrawnGroup>, AppError>
where
    R: Rng + Send + ?Sized,
{
    params.validate()?;

    let mut tx = pool.begin().await?;

    let tournament = tournaments::get_by_id_for_update(&mut *tx, tournament_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Tournament {tournament_id} not found")))?;
    if !tournament.phase.allows_group_draw() {
        return Err(AppError::BadRequest(format!(
            "Groups cannot be drawn while the tournament is in the {} phase",
            tournament.phase.as_str()
        )));
    }

    let confirmed = tournament_participants::list_by_tournament(
        &mut *tx,
        tournament_id,
        Some(ParticipantStatus::Confirmed),
    )
    .await?;
    params.check_capacity(confirmed.len())?;

    let existing_matches =
        tournament_matches::count_by_stage(&mut *tx, tournament_id, MatchStage::Groups).await?;
    if existing_matches > 0 {
        return Err(AppError::BadRequest(
            "Group-stage matches already exist; groups can no longer be redrawn".to_string(),
        ));
    }

    tournament_participants::clear_group_assignments(&mut *tx, tournament_id).await?;
    let removed = tournament_groups::delete_by_tournament(&mut *tx, tournament_id).await?;
    if removed > 0 {
        tracing::info!(%tournament_id, removed, "Discarded previous group draw");
    }

    let ids: Vec<Uuid> = confirmed.iter().map(|p| p.id).collect();
    let assignment = assign_groups(&ids, params.num_groups as usize, rng);

    let mut drawn = Vec::with_capacity(params.num_groups as usize);
    for index in 0..params.num_groups as usize {
        let group = tournament_groups::create(
            &mut *tx,
            CreateTournamentGroup {
                tournament_id,
                label: group_label(index),
                display_order: index as i32 + 1,
                capacity: params.participants_per_group,
                advancement_count: params.advancement_count,
            },
        )
        .await?;
        drawn.push(DrawnGroup {
            group,
            participants: Vec::new(),
        });
    }

    for (participant_id, slot) in assignment {
        let target = &mut drawn[slot.group_index];
        let updated = tournament_participants::assign_group(
            &mut *tx,
            participant_id,
            target.group.id,
            slot.position,
        )
        .await?;
        target.participants.push(updated);
    }

    if tournament.phase == TournamentPhase::Registration {
        tournaments::set_phase(&mut *tx, tournament_id, TournamentPhase::Groups).await?;
    }

    tx.commit().await?;

    for group in &mut drawn {
        group.participants.sort_by_key(|p| p.group_position);
    }
    tracing::info!(
        %tournament_id,
        groups = drawn.len(),
        participants = ids.len(),
        "Group stage drawn"
    );
    Ok(drawn)
}
