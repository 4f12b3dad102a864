use std::sync::Arc;

use showscout_sources::{
    Aggregator, CredentialStore, Fetch, SearchContext, Source, SourceRegistry, SourceSelection,
};
use sqlx::SqlitePool;

use crate::config::ServerConfig;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub registry: Arc<SourceRegistry>,
    pub fetcher: Arc<dyn Fetch>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Fetcher plus the cookies stored right now.
    pub async fn search_context(&self) -> Result<SearchContext, sqlx::Error> {
        let stored = showscout_db::repo::sources::credentials(&self.db).await?;
        Ok(SearchContext::new(
            Arc::clone(&self.fetcher),
            Arc::new(CredentialStore::from_cookie_strings(stored)),
        ))
    }

    pub async fn aggregator(&self) -> Result<Aggregator, sqlx::Error> {
        let ctx = self.search_context().await?;
        Ok(Aggregator::new(ctx).with_timeout(self.config.source_timeout))
    }

    /// Registered sources that are enabled, optionally narrowed to `only`.
    pub async fn enabled_sources(
        &self,
        only: Option<&[String]>,
    ) -> Result<Vec<Arc<dyn Source>>, sqlx::Error> {
        let mut enabled =
            showscout_db::repo::sources::enabled_names(&self.db, &self.registry.names()).await?;
        if let Some(only) = only {
            enabled.retain(|name| only.iter().any(|o| o.eq_ignore_ascii_case(name)));
        }
        Ok(self.registry.select(&SourceSelection::Only(enabled)))
    }
}
