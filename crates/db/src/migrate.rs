use sqlx::SqlitePool;
use tracing::info;

const MIGRATIONS: &[(&str, &str)] = &[(
    "001_initial_schema",
    include_str!("../migrations/001_initial_schema.sql"),
)];

/// Apply pending forward-only migrations, each in its own transaction.
///
/// Applied names are tracked in `_migrations`. Returns how many were applied.
pub async fn run(pool: &SqlitePool) -> Result<usize, sqlx::Error> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS _migrations (
            name TEXT PRIMARY KEY,
            applied_ts INTEGER NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    let done = applied(pool).await?;
    let mut count = 0;

    for (name, sql) in MIGRATIONS.iter().filter(|(name, _)| !done.iter().any(|d| d == name)) {
        info!(migration = name, "applying migration");
        let mut tx = pool.begin().await?;

        for statement in statements(sql) {
            sqlx::query(statement).execute(&mut *tx).await?;
        }

        sqlx::query("INSERT INTO _migrations (name, applied_ts) VALUES (?, ?)")
            .bind(name)
            .bind(chrono::Utc::now().timestamp())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        count += 1;
    }

    Ok(count)
}

/// Names of migrations already applied, oldest first.
pub async fn applied(pool: &SqlitePool) -> Result<Vec<String>, sqlx::Error> {
    let rows: Vec<(String,)> = sqlx::query_as("SELECT name FROM _migrations ORDER BY name")
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(|(name,)| name).collect())
}

/// Split a script on `;`, dropping blank and comment-only chunks.
fn statements(sql: &str) -> impl Iterator<Item = &str> {
    sql.split(';').map(str::trim).filter(|chunk| {
        chunk
            .lines()
            .any(|line| !line.trim().is_empty() && !line.trim_start().starts_with("--"))
    })
}
