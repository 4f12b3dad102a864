//! Per-source settings: enabled flag and stored authentication cookies.
//!
//! A source without a row is enabled and has no cookies.

use sqlx::SqlitePool;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SourceSettingsRow {
    pub name: String,
    pub enabled: bool,
    pub cookies: Option<String>,
    pub updated_ts: i64,
}

/// All stored source settings, by name.
pub async fn list(pool: &SqlitePool) -> Result<Vec<SourceSettingsRow>, sqlx::Error> {
    let rows: Vec<(String, bool, Option<String>, i64)> = sqlx::query_as(
        "SELECT name, enabled, cookies, updated_ts FROM source_settings ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(name, enabled, cookies, updated_ts)| SourceSettingsRow {
            name,
            enabled,
            cookies,
            updated_ts,
        })
        .collect())
}

/// Settings for one source, if any were stored.
pub async fn get(pool: &SqlitePool, name: &str) -> Result<Option<SourceSettingsRow>, sqlx::Error> {
    let row: Option<(String, bool, Option<String>, i64)> = sqlx::query_as(
        "SELECT name, enabled, cookies, updated_ts FROM source_settings WHERE name = ?",
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(name, enabled, cookies, updated_ts)| SourceSettingsRow {
        name,
        enabled,
        cookies,
        updated_ts,
    }))
}

/// Update a source's settings. `None` leaves a field as it is; an empty
/// cookie string clears the stored cookies.
pub async fn upsert(
    pool: &SqlitePool,
    name: &str,
    enabled: Option<bool>,
    cookies: Option<&str>,
) -> Result<SourceSettingsRow, sqlx::Error> {
    let now = chrono::Utc::now().timestamp();
    sqlx::query(
        "INSERT INTO source_settings (name, enabled, cookies, updated_ts) \
         VALUES (?, COALESCE(?, 1), ?, ?) \
         ON CONFLICT(name) DO UPDATE SET \
         enabled = COALESCE(?, enabled), \
         cookies = COALESCE(?, cookies), \
         updated_ts = excluded.updated_ts",
    )
    .bind(name)
    .bind(enabled)
    .bind(cookies)
    .bind(now)
    .bind(enabled)
    .bind(cookies)
    .execute(pool)
    .await?;

    get(pool, name)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

/// Names of explicitly disabled sources.
pub async fn disabled_names(pool: &SqlitePool) -> Result<Vec<String>, sqlx::Error> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT name FROM source_settings WHERE enabled = 0 ORDER BY name")
            .fetch_all(pool)
            .await?;
    Ok(rows.into_iter().map(|(name,)| name).collect())
}

/// Which of `registered` are enabled. Sources without a row count as enabled.
pub async fn enabled_names(
    pool: &SqlitePool,
    registered: &[&str],
) -> Result<Vec<String>, sqlx::Error> {
    let disabled = disabled_names(pool).await?;
    Ok(registered
        .iter()
        .filter(|name| !disabled.iter().any(|d| d == *name))
        .map(|name| name.to_string())
        .collect())
}

/// Stored non-empty cookie strings, by source name.
pub async fn credentials(pool: &SqlitePool) -> Result<HashMap<String, String>, sqlx::Error> {
    let rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT name, cookies FROM source_settings WHERE cookies IS NOT NULL AND cookies != ''",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().collect())
}
