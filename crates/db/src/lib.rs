pub mod migrate;
pub mod repo;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Create a SQLite connection pool with WAL mode enabled.
///
/// `:memory:` databases get a single connection so every query sees the
/// same database.
pub async fn connect(db_path: &str) -> Result<SqlitePool, sqlx::Error> {
    let in_memory = db_path == ":memory:" || db_path.starts_with("sqlite::memory:");

    if !in_memory {
        if let Some(parent) = Path::new(db_path).parent() {
            std::fs::create_dir_all(parent).ok();
        }
    }

    let mut opts = SqliteConnectOptions::from_str(db_path)?.create_if_missing(true);
    if !in_memory {
        opts = opts.journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);
    }

    let mut pool_opts = SqlitePoolOptions::new().max_connections(if in_memory { 1 } else { 5 });
    if in_memory {
        pool_opts = pool_opts.idle_timeout(None).max_lifetime(None);
    }

    let pool = pool_opts.connect_with(opts).await?;

    Ok(pool)
}
