use crate::models::TournamentGroupRow;
use sqlx::{PgExecutor, Result as SqlxResult};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CreateTournamentGroup {
    pub tournament_id: Uuid,
    pub label: String,
    pub display_order: i32,
    pub capacity: i32,
    pub advancement_count: i32,
}

pub async fn create<'e>(
    executor: impl PgExecutor<'e>,
    data: CreateTournamentGroup,
) -> SqlxResult<TournamentGroupRow> {
    sqlx::query_as::<_, TournamentGroupRow>(
        r#"
        INSERT INTO tournament_groups (
            tournament_id, label, display_order, capacity, advancement_count
        )
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, tournament_id, label, display_order, capacity,
                  advancement_count, created_at, updated_at
        "#,
    )
    .bind(data.tournament_id)
    .bind(data.label)
    .bind(data.display_order)
    .bind(data.capacity)
    .bind(data.advancement_count)
    .fetch_one(executor)
    .await
}

pub async fn get_by_id<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> SqlxResult<Option<TournamentGroupRow>> {
    sqlx::query_as::<_, TournamentGroupRow>(
        r#"
        SELECT id, tournament_id, label, display_order, capacity,
               advancement_count, created_at, updated_at
        FROM tournament_groups
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn list_by_tournament<'e>(
    executor: impl PgExecutor<'e>,
    tournament_id: Uuid,
) -> SqlxResult<Vec<TournamentGroupRow>> {
    sqlx::query_as::<_, TournamentGroupRow>(
        r#"
        SELECT id, tournament_id, label, display_order, capacity,
               advancement_count, created_at, updated_at
        FROM tournament_groups
        WHERE tournament_id = $1
        ORDER BY display_order ASC
        "#,
    )
    .bind(tournament_id)
    .fetch_all(executor)
    .await
}

/// Remove all groups of a tournament. Group-stage matches cascade with them.
pub async fn delete_by_tournament<'e>(
    executor: impl PgExecutor<'e>,
    tournament_id: Uuid,
) -> SqlxResult<u64> {
    let result = sqlx::query("DELETE FROM tournament_groups WHERE tournament_id = $1")
        .bind(tournament_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}
