use sqlx::SqlitePool;

/// Known show names, used to canonicalise parsed show segments.
pub async fn list(pool: &SqlitePool) -> Result<Vec<String>, sqlx::Error> {
    let rows: Vec<(String,)> = sqlx::query_as("SELECT name FROM known_show ORDER BY name")
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(|(name,)| name).collect())
}

/// Add a show. Returns `false` if it was already known (case-insensitively).
pub async fn add(pool: &SqlitePool, name: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("INSERT OR IGNORE INTO known_show (name, added_ts) VALUES (?, ?)")
        .bind(name)
        .bind(chrono::Utc::now().timestamp())
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn remove(pool: &SqlitePool, name: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM known_show WHERE name = ?")
        .bind(name)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
