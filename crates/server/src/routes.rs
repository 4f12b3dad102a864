use axum::extract::{Path, Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use showscout_core::error::ApiError;
use showscout_core::{Link, ParsedEpisode, QualityTier, SourceError};
use showscout_sources::{Download, GuessedShow, SourceInfo, SourceReport};
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::AppError;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

fn api_router() -> Router<AppState> {
    Router::new()
        // Sources
        .route("/sources", get(list_sources))
        .route("/sources/{name}", patch(update_source))
        // Search
        .route("/search", get(search))
        .route("/search/stream", get(crate::live::search_stream))
        .route("/guess", get(guess))
        .route("/download", get(download))
        // Classification
        .route("/classify", post(classify))
        .route("/scan", post(scan))
        // Known shows
        .route("/shows", get(list_shows).post(add_show))
        .route("/shows/{name}", axum::routing::delete(remove_show))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    sqlx::query("SELECT 1")
        .execute(&state.db)
        .await
        .map_err(|e| ApiError::Internal(format!("database check failed: {e}")))?;

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
    }))
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct SourceResponse {
    #[serde(flatten)]
    info: SourceInfo,
    enabled: bool,
    has_cookies: bool,
    missing_cookies: Vec<String>,
    updated_ts: Option<i64>,
}

async fn list_sources(State(state): State<AppState>) -> Result<Json<Vec<SourceResponse>>, AppError> {
    let rows = showscout_db::repo::sources::list(&state.db).await?;
    let stored = showscout_db::repo::sources::credentials(&state.db).await?;
    let creds = showscout_sources::CredentialStore::from_cookie_strings(stored);

    let result = state
        .registry
        .all()
        .iter()
        .map(|source| {
            let row = rows.iter().find(|r| r.name == source.name());
            SourceResponse {
                info: source.info(),
                enabled: row.is_none_or(|r| r.enabled),
                has_cookies: creds.has_cookies(source.name()),
                missing_cookies: creds.missing(source.name(), source.required_cookies()),
                updated_ts: row.map(|r| r.updated_ts),
            }
        })
        .collect();

    Ok(Json(result))
}

#[derive(Deserialize)]
struct UpdateSourceRequest {
    enabled: Option<bool>,
    /// `name=value; name=value`; an empty string clears stored cookies.
    cookies: Option<String>,
}

async fn update_source(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(body): Json<UpdateSourceRequest>,
) -> Result<Json<SourceResponse>, AppError> {
    let source = state
        .registry
        .get(&name)
        .ok_or_else(|| ApiError::NotFound(format!("unknown source: {name}")))?;

    if body.enabled.is_none() && body.cookies.is_none() {
        return Err(ApiError::BadRequest("nothing to update".into()).into());
    }

    let row = showscout_db::repo::sources::upsert(
        &state.db,
        source.name(),
        body.enabled,
        body.cookies.as_deref().map(str::trim),
    )
    .await?;
    info!(source = source.name(), enabled = row.enabled, "source settings updated");

    let mut creds = showscout_sources::CredentialStore::new();
    if let Some(cookies) = &row.cookies {
        creds.insert(source.name(), cookies);
    }

    Ok(Json(SourceResponse {
        info: source.info(),
        enabled: row.enabled,
        has_cookies: creds.has_cookies(source.name()),
        missing_cookies: creds.missing(source.name(), source.required_cookies()),
        updated_ts: Some(row.updated_ts),
    }))
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct SearchQuery {
    pub(crate) q: Option<String>,
    /// Comma separated subset of the enabled sources.
    pub(crate) sources: Option<String>,
}

impl SearchQuery {
    pub(crate) fn query(&self) -> Result<String, ApiError> {
        self.q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ApiError::BadRequest("query must not be empty".into()))
    }

    pub(crate) fn only(&self) -> Option<Vec<String>> {
        self.sources.as_ref().map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
    }
}

#[derive(Serialize)]
struct SearchResponse {
    id: uuid::Uuid,
    query: String,
    links: Vec<Link>,
    reports: Vec<SourceReport>,
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, AppError> {
    let query = params.query()?;
    let only = params.only();
    let sources = state.enabled_sources(only.as_deref()).await?;
    let aggregator = state.aggregator().await?;

    let id = uuid::Uuid::new_v4();
    info!(search_id = %id, query = %query, sources = sources.len(), "search started");

    // Dropping this handler (client gone) drops the guard and stops the sources.
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();
    let outcome = aggregator.search(&query, &sources, &cancel).await;

    Ok(Json(SearchResponse {
        id,
        query,
        links: outcome.links,
        reports: outcome.reports,
    }))
}

#[derive(Deserialize)]
struct GuessQuery {
    show: Option<String>,
}

async fn guess(
    State(state): State<AppState>,
    Query(params): Query<GuessQuery>,
) -> Result<Json<GuessedShow>, AppError> {
    let show = params
        .show
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("show must not be empty".into()))?
        .to_string();

    let sources = state.enabled_sources(None).await?;
    let aggregator = state.aggregator().await?;
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let anchor_year = chrono::Utc::now().year();
    let guessed =
        showscout_sources::infer_calendar(&aggregator, &show, &sources, anchor_year, &cancel).await;
    Ok(Json(guessed))
}

#[derive(Deserialize)]
struct DownloadQuery {
    source: String,
    url: String,
    release: Option<String>,
}

/// Follow a search result: magnets redirect, payloads are proxied with the
/// source's cookies.
async fn download(
    State(state): State<AppState>,
    Query(params): Query<DownloadQuery>,
) -> Result<Response, AppError> {
    let source = state
        .registry
        .get(&params.source)
        .ok_or_else(|| ApiError::NotFound(format!("unknown source: {}", params.source)))?;

    let release = params
        .release
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or("download");
    let link = Link {
        release: release.to_string(),
        quality: showscout_scanner::classify_quality(release),
        file_url: params.url.trim().to_string(),
        info_url: None,
        size: String::new(),
        infos: String::new(),
        source: source.name().to_string(),
        kind: source.kind(),
    };

    let ctx = state.search_context().await?;
    let fetched = source.download(&link, &ctx).await.map_err(download_error)?;
    info!(source = source.name(), release = %link.release, "link followed");

    match fetched {
        Download::Magnet(uri) => {
            let location = HeaderValue::from_str(&uri)
                .map_err(|_| ApiError::BadRequest("malformed magnet link".into()))?;
            Ok((StatusCode::TEMPORARY_REDIRECT, [(header::LOCATION, location)]).into_response())
        }
        Download::File {
            name,
            content_type,
            bytes,
        } => {
            let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{name}\""))
                .map_err(|e| ApiError::Internal(format!("bad file name: {e}")))?;
            Ok((
                [
                    (header::CONTENT_TYPE, HeaderValue::from_static(content_type)),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                bytes,
            )
                .into_response())
        }
    }
}

fn download_error(e: SourceError) -> ApiError {
    match e {
        SourceError::ForeignLink(_) | SourceError::MissingCookies(_) => {
            ApiError::BadRequest(e.to_string())
        }
        other => ApiError::Upstream(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ClassifyRequest {
    label: String,
    /// Overrides the stored show catalog for this call.
    known_shows: Option<Vec<String>>,
}

#[derive(Serialize)]
struct ClassifyResponse {
    label: String,
    quality: QualityTier,
    quality_label: &'static str,
    episode: Option<ParsedEpisode>,
    show: Option<String>,
    title: Option<String>,
}

async fn classify(
    State(state): State<AppState>,
    Json(body): Json<ClassifyRequest>,
) -> Result<Json<ClassifyResponse>, AppError> {
    if body.label.trim().is_empty() {
        return Err(ApiError::BadRequest("label must not be empty".into()).into());
    }

    let known = match body.known_shows {
        Some(known) => known,
        None => showscout_db::repo::shows::list(&state.db).await?,
    };

    let quality = showscout_scanner::classify_quality(&body.label);
    let parsed = showscout_scanner::extract_show_episode_title(&body.label, &known);

    Ok(Json(ClassifyResponse {
        quality,
        quality_label: quality.label(),
        episode: parsed.as_ref().map(|p| p.episode()),
        show: parsed.as_ref().and_then(|p| p.show.clone()),
        title: parsed.and_then(|p| p.title),
        label: body.label,
    }))
}

#[derive(Deserialize)]
struct ScanRequest {
    path: String,
}

async fn scan(
    State(state): State<AppState>,
    Json(body): Json<ScanRequest>,
) -> Result<Json<Vec<showscout_scanner::ShowFile>>, AppError> {
    let root = std::path::PathBuf::from(body.path.trim());
    if !root.is_dir() {
        return Err(ApiError::BadRequest(format!("not a directory: {}", root.display())).into());
    }

    let known = showscout_db::repo::shows::list(&state.db).await?;
    let files = tokio::task::spawn_blocking(move || showscout_scanner::scan_dir(&root, &known))
        .await
        .map_err(|e| ApiError::Internal(format!("scan task failed: {e}")))?;

    Ok(Json(files))
}

// ---------------------------------------------------------------------------
// Known shows
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct AddShowRequest {
    name: String,
}

async fn list_shows(State(state): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(showscout_db::repo::shows::list(&state.db).await?))
}

async fn add_show(
    State(state): State<AppState>,
    Json(body): Json<AddShowRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("name must not be empty".into()).into());
    }

    if !showscout_db::repo::shows::add(&state.db, name).await? {
        return Err(ApiError::Conflict(format!("show already known: {name}")).into());
    }

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "name": name })),
    ))
}

async fn remove_show(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !showscout_db::repo::shows::remove(&state.db, &name).await? {
        return Err(ApiError::NotFound("show not found".into()).into());
    }
    Ok(Json(serde_json::json!({ "ok": true })))
}
