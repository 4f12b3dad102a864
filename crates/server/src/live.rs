//! Progressive search over server-sent events.
//!
//! Emits a `link` event per result as sources deliver them, then one
//! `done` event carrying the per-source reports. Closing the connection
//! cancels the sources still running.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use showscout_sources::{LinkCollector, SourceReport};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::AppError;
use crate::routes::SearchQuery;
use crate::state::AppState;

const POLL_INTERVAL: Duration = Duration::from_millis(200);

enum Tick {
    Poll,
    Finished(Vec<SourceReport>),
}

pub async fn search_stream(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let query = params.query()?;
    let only = params.only();
    let sources = state.enabled_sources(only.as_deref()).await?;
    let aggregator = state.aggregator().await?;

    let id = uuid::Uuid::new_v4();
    info!(search_id = %id, query = %query, sources = sources.len(), "live search started");

    let cancel = CancellationToken::new();
    let collector = LinkCollector::new();
    let mut task = {
        let cancel = cancel.clone();
        let collector = collector.clone();
        tokio::spawn(async move {
            aggregator
                .search_into(&query, &sources, &cancel, &collector)
                .await
        })
    };

    let stream = async_stream::stream! {
        let _guard = cancel.drop_guard();
        let mut ticker = tokio::time::interval(POLL_INTERVAL);
        let mut sent = 0usize;

        loop {
            let tick = tokio::select! {
                joined = &mut task => match joined {
                    Ok(reports) => Tick::Finished(reports),
                    Err(e) => {
                        warn!(search_id = %id, error = %e, "search task failed");
                        Tick::Finished(Vec::new())
                    }
                },
                _ = ticker.tick() => Tick::Poll,
            };

            let links = collector.snapshot().await;
            for link in links.iter().skip(sent) {
                if let Ok(event) = Event::default().event("link").json_data(link) {
                    yield Ok(event);
                }
            }
            sent = links.len();

            if let Tick::Finished(reports) = tick {
                let done = serde_json::json!({ "id": id, "links": sent, "reports": reports });
                if let Ok(event) = Event::default().event("done").json_data(done) {
                    yield Ok(event);
                }
                break;
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}
