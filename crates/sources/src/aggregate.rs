//! Concurrent fan-out of one query across several sources.

use futures::StreamExt;
use serde::Serialize;
use showscout_core::{Link, SourceError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::source::{SearchContext, Source};

pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(15);

/// Append-only link collection shared by the per-source tasks.
#[derive(Clone, Default)]
pub struct LinkCollector {
    links: Arc<Mutex<Vec<Link>>>,
}

impl LinkCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, link: Link) {
        self.links.lock().await.push(link);
    }

    pub async fn len(&self) -> usize {
        self.links.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Copy of everything collected so far.
    pub async fn snapshot(&self) -> Vec<Link> {
        self.links.lock().await.clone()
    }

    /// Move the collected links out, leaving the collector empty.
    pub async fn take(&self) -> Vec<Link> {
        std::mem::take(&mut *self.links.lock().await)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum SourceStatus {
    Completed,
    Failed(String),
    TimedOut,
    Cancelled,
}

/// How one source fared during a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    pub source: String,
    pub status: SourceStatus,
    /// Links this source contributed, including any before a failure.
    pub links: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub links: Vec<Link>,
    pub reports: Vec<SourceReport>,
}

impl SearchOutcome {
    pub fn failed_sources(&self) -> impl Iterator<Item = &SourceReport> {
        self.reports
            .iter()
            .filter(|r| r.status != SourceStatus::Completed)
    }
}

pub struct Aggregator {
    ctx: SearchContext,
    source_timeout: Duration,
}

impl Aggregator {
    pub fn new(ctx: SearchContext) -> Self {
        Self {
            ctx,
            source_timeout: DEFAULT_SOURCE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, source_timeout: Duration) -> Self {
        self.source_timeout = source_timeout;
        self
    }

    /// Search every given source concurrently and gather what they return.
    ///
    /// Failing, slow or cancelled sources contribute what they produced
    /// before stopping; they never fail the whole search.
    pub async fn search(
        &self,
        query: &str,
        sources: &[Arc<dyn Source>],
        cancel: &CancellationToken,
    ) -> SearchOutcome {
        let collector = LinkCollector::new();
        let reports = self.search_into(query, sources, cancel, &collector).await;
        SearchOutcome {
            links: collector.take().await,
            reports,
        }
    }

    /// Like [`search`](Self::search) but fills a caller-owned collector, so
    /// results can be read with [`LinkCollector::snapshot`] while sources
    /// are still running. Reports come back in `sources` order.
    pub async fn search_into(
        &self,
        query: &str,
        sources: &[Arc<dyn Source>],
        cancel: &CancellationToken,
        collector: &LinkCollector,
    ) -> Vec<SourceReport> {
        let mut reports: Vec<SourceReport> = sources
            .iter()
            .map(|s| SourceReport {
                source: s.name().to_string(),
                status: SourceStatus::Failed("task aborted".into()),
                links: 0,
            })
            .collect();

        let mut tasks = JoinSet::new();
        for (index, source) in sources.iter().enumerate() {
            let source = Arc::clone(source);
            let query = query.to_string();
            let ctx = self.ctx.clone();
            let collector = collector.clone();
            let cancel = cancel.child_token();
            let limit = self.source_timeout;

            tasks.spawn(async move {
                let (status, links) =
                    drain_source(source.as_ref(), &query, &ctx, &collector, &cancel, limit).await;
                (index, status, links)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, status, links)) => {
                    reports[index].status = status;
                    reports[index].links = links;
                }
                Err(e) => warn!(error = %e, "source task did not finish"),
            }
        }

        info!(
            query = %query,
            sources = sources.len(),
            links = reports.iter().map(|r| r.links).sum::<usize>(),
            "search finished"
        );
        reports
    }
}

async fn drain_source(
    source: &dyn Source,
    query: &str,
    ctx: &SearchContext,
    collector: &LinkCollector,
    cancel: &CancellationToken,
    limit: Duration,
) -> (SourceStatus, usize) {
    let name = source.name();
    let mut count = 0usize;

    let run = async {
        let mut stream = source.search(query, ctx);
        while let Some(item) = stream.next().await {
            collector.push(item?).await;
            count += 1;
        }
        Ok::<(), SourceError>(())
    };

    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(SourceError::Cancelled),
        finished = tokio::time::timeout(limit, run) => {
            finished.unwrap_or(Err(SourceError::TimedOut(limit)))
        }
    };

    let status = match result {
        Ok(()) => {
            debug!(source = name, links = count, "source finished");
            SourceStatus::Completed
        }
        Err(SourceError::Cancelled) => {
            debug!(source = name, links = count, "source cancelled");
            SourceStatus::Cancelled
        }
        Err(SourceError::TimedOut(after)) => {
            warn!(source = name, links = count, after_secs = after.as_secs_f32(), "source timed out");
            SourceStatus::TimedOut
        }
        Err(e) => {
            warn!(source = name, links = count, error = %e, "source failed");
            SourceStatus::Failed(e.to_string())
        }
    };
    (status, count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::CredentialStore;
    use crate::fetch::StaticFetcher;
    use crate::source::LinkStream;
    use showscout_core::{LinkKind, QualityTier};

    /// Yields `count` links, each after `delay`, then optionally fails.
    struct Scripted {
        name: &'static str,
        count: usize,
        delay: Duration,
        fail: Option<SourceError>,
    }

    impl Scripted {
        fn new(name: &'static str, count: usize) -> Self {
            Self {
                name,
                count,
                delay: Duration::ZERO,
                fail: None,
            }
        }

        fn slow(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn failing(mut self, err: SourceError) -> Self {
            self.fail = Some(err);
            self
        }
    }

    impl Source for Scripted {
        fn name(&self) -> &'static str {
            self.name
        }
        fn site(&self) -> &'static str {
            "https://scripted.test/"
        }
        fn requires_auth(&self) -> bool {
            false
        }
        fn kind(&self) -> LinkKind {
            LinkKind::Http
        }
        fn search<'a>(&'a self, query: &'a str, _ctx: &'a SearchContext) -> LinkStream<'a> {
            Box::pin(async_stream::try_stream! {
                for i in 0..self.count {
                    if !self.delay.is_zero() {
                        tokio::time::sleep(self.delay).await;
                    }
                    yield link(self.name, &format!("{query}.S01E{:02}", i + 1));
                }
                if let Some(err) = self.fail.clone() {
                    Err::<(), SourceError>(err)?;
                }
            })
        }
    }

    fn link(source: &str, release: &str) -> Link {
        Link {
            release: release.to_string(),
            quality: QualityTier::Unknown,
            file_url: format!("https://scripted.test/{release}"),
            info_url: None,
            size: String::new(),
            infos: String::new(),
            source: source.to_string(),
            kind: LinkKind::Http,
        }
    }

    fn aggregator() -> Aggregator {
        let ctx = SearchContext::new(
            Arc::new(StaticFetcher::new()),
            Arc::new(CredentialStore::new()),
        );
        Aggregator::new(ctx).with_timeout(Duration::from_millis(200))
    }

    fn sources(list: Vec<Scripted>) -> Vec<Arc<dyn Source>> {
        list.into_iter()
            .map(|s| Arc::new(s) as Arc<dyn Source>)
            .collect()
    }

    #[tokio::test]
    async fn failures_do_not_affect_other_sources() {
        let sources = sources(vec![
            Scripted::new("a", 3),
            Scripted::new("b", 0).failing(SourceError::Unavailable("down".into())),
            Scripted::new("c", 2),
            Scripted::new("d", 5).slow(Duration::from_secs(5)),
        ]);

        let outcome = aggregator()
            .search("Show", &sources, &CancellationToken::new())
            .await;

        assert_eq!(outcome.links.len(), 5);
        assert_eq!(outcome.links.iter().filter(|l| l.source == "a").count(), 3);
        assert_eq!(outcome.links.iter().filter(|l| l.source == "c").count(), 2);

        let statuses: Vec<&SourceStatus> = outcome.reports.iter().map(|r| &r.status).collect();
        assert_eq!(statuses[0], &SourceStatus::Completed);
        assert_eq!(
            statuses[1],
            &SourceStatus::Failed("source unavailable: down".into())
        );
        assert_eq!(statuses[2], &SourceStatus::Completed);
        assert_eq!(statuses[3], &SourceStatus::TimedOut);
        assert_eq!(outcome.failed_sources().count(), 2);
    }

    #[tokio::test]
    async fn links_before_a_failure_are_kept() {
        let sources = sources(vec![
            Scripted::new("a", 2).failing(SourceError::MalformedPage("row".into())),
        ]);
        let outcome = aggregator()
            .search("Show", &sources, &CancellationToken::new())
            .await;
        assert_eq!(outcome.links.len(), 2);
        assert_eq!(outcome.reports[0].links, 2);
        assert!(matches!(outcome.reports[0].status, SourceStatus::Failed(_)));
    }

    #[tokio::test]
    async fn cancel_returns_partial_results() {
        let sources = sources(vec![
            Scripted::new("fast", 1),
            Scripted::new("slow", 10).slow(Duration::from_millis(30)),
        ]);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let outcome = aggregator()
            .with_timeout(Duration::from_secs(10))
            .search("Show", &sources, &cancel)
            .await;

        assert_eq!(outcome.reports[0].status, SourceStatus::Completed);
        assert_eq!(outcome.reports[1].status, SourceStatus::Cancelled);
        let slow = outcome.reports[1].links;
        assert!(slow >= 1 && slow < 10, "slow source produced {slow}");
        assert_eq!(outcome.links.len(), 1 + slow);
    }

    #[tokio::test]
    async fn snapshot_sees_results_in_flight() {
        let sources = sources(vec![
            Scripted::new("fast", 2),
            Scripted::new("slow", 1).slow(Duration::from_millis(150)),
        ]);
        let agg = aggregator();
        let collector = LinkCollector::new();
        let cancel = CancellationToken::new();

        let search = agg.search_into("Show", &sources, &cancel, &collector);
        let peek = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            collector.snapshot().await
        };
        let (reports, early) = tokio::join!(search, peek);

        assert_eq!(early.len(), 2);
        assert!(early.iter().all(|l| l.source == "fast"));
        assert_eq!(reports.len(), 2);
        assert_eq!(collector.len().await, 3);
    }

    #[tokio::test]
    async fn no_sources_is_empty_outcome() {
        let outcome = aggregator()
            .search("Show", &[], &CancellationToken::new())
            .await;
        assert!(outcome.links.is_empty());
        assert!(outcome.reports.is_empty());
    }

    #[tokio::test]
    async fn missing_cookies_fail_only_that_source() {
        let fetcher = StaticFetcher::new()
            .with_page("https://iplay.ro/", include_str!("../tests/fixtures/iplay_browse.html"));
        let ctx = SearchContext::new(Arc::new(fetcher), Arc::new(CredentialStore::new()));
        let agg = Aggregator::new(ctx);

        let sources: Vec<Arc<dyn Source>> = vec![
            Arc::new(crate::iplay::IPlay::new()),
            Arc::new(Scripted::new("open", 1)),
        ];
        let outcome = agg.search("lost", &sources, &CancellationToken::new()).await;

        assert_eq!(outcome.links.len(), 1);
        assert_eq!(
            outcome.reports[0].status,
            SourceStatus::Failed("missing required cookies: uid, pass".into())
        );
    }
}
