use sqlx::PgPool;

/// Shared connection pool handle. Owned by the process entry point and
/// cloned into every repository and handler.
pub type Db = PgPool;

/// SQLSTATE raised by an `EXCLUDE` constraint.
pub const EXCLUSION_VIOLATION: &str = "23P01";

/// Returns true when `err` is a database error carrying the given SQLSTATE.
pub fn has_sqlstate(err: &sqlx::Error, code: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some(code),
        _ => false,
    }
}
