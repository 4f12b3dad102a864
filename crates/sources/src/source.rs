use futures::future::BoxFuture;
use futures::stream::BoxStream;
use serde::Serialize;
use showscout_core::{Link, LinkKind, SourceError};
use std::sync::Arc;

use crate::credentials::CredentialStore;
use crate::fetch::Fetch;
use crate::site::{Download, SiteClient};

/// Lazy, finite sequence of links produced by one source for one query.
pub type LinkStream<'a> = BoxStream<'a, Result<Link, SourceError>>;

/// What a source needs from its caller at search time.
#[derive(Clone)]
pub struct SearchContext {
    pub fetcher: Arc<dyn Fetch>,
    pub credentials: Arc<CredentialStore>,
}

impl SearchContext {
    pub fn new(fetcher: Arc<dyn Fetch>, credentials: Arc<CredentialStore>) -> Self {
        Self {
            fetcher,
            credentials,
        }
    }
}

/// Capability metadata of a source, as shown to users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceInfo {
    pub name: String,
    pub site: String,
    pub requires_auth: bool,
    pub required_cookies: Vec<String>,
    pub kind: LinkKind,
}

/// One external site that can be searched for links.
pub trait Source: Send + Sync {
    fn name(&self) -> &'static str;

    fn site(&self) -> &'static str;

    fn requires_auth(&self) -> bool;

    fn required_cookies(&self) -> &'static [&'static str] {
        &[]
    }

    fn kind(&self) -> LinkKind;

    /// Search the site. Nothing is fetched until the stream is polled.
    fn search<'a>(&'a self, query: &'a str, ctx: &'a SearchContext) -> LinkStream<'a>;

    /// Follow one of this source's links.
    fn download<'a>(
        &'a self,
        link: &'a Link,
        ctx: &'a SearchContext,
    ) -> BoxFuture<'a, Result<Download, SourceError>> {
        Box::pin(async move {
            SiteClient::new(self.name(), self.site(), self.required_cookies())
                .download(ctx, link)
                .await
        })
    }

    fn info(&self) -> SourceInfo {
        SourceInfo {
            name: self.name().to_string(),
            site: self.site().to_string(),
            requires_auth: self.requires_auth(),
            required_cookies: self
                .required_cookies()
                .iter()
                .map(|c| c.to_string())
                .collect(),
            kind: self.kind(),
        }
    }
}

/// Which registered sources a search should use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSelection {
    All,
    Only(Vec<String>),
}

impl SourceSelection {
    pub fn contains(&self, name: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(names) => names.iter().any(|n| n.eq_ignore_ascii_case(name)),
        }
    }
}

/// Explicit set of available sources, in registration order.
#[derive(Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<Arc<dyn Source>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in source.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(crate::iplay::IPlay::new());
        registry.register(crate::broadcasthenet::BroadcasTheNet::new());
        registry
    }

    /// Add a source, replacing one already registered under the same name.
    pub fn register(&mut self, source: impl Source + 'static) {
        self.register_arc(Arc::new(source));
    }

    pub fn register_arc(&mut self, source: Arc<dyn Source>) {
        match self
            .sources
            .iter_mut()
            .find(|s| s.name().eq_ignore_ascii_case(source.name()))
        {
            Some(slot) => *slot = source,
            None => self.sources.push(source),
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Source>> {
        self.sources
            .iter()
            .find(|s| s.name().eq_ignore_ascii_case(name))
            .cloned()
    }

    pub fn all(&self) -> &[Arc<dyn Source>] {
        &self.sources
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub fn select(&self, selection: &SourceSelection) -> Vec<Arc<dyn Source>> {
        self.sources
            .iter()
            .filter(|s| selection.contains(s.name()))
            .cloned()
            .collect()
    }
}
