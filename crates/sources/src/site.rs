use regex::Regex;
use showscout_core::{Link, QualityTier, SourceError};
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::fetch::FetchRequest;
use crate::source::SearchContext;

static RE_PASSWORD_INPUT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<input[^>]+type\s*=\s*["']?password"#).unwrap());

/// A followed link: magnet URIs go straight to the client, everything else
/// is fetched with the site's cookies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Download {
    Magnet(String),
    File {
        name: String,
        content_type: &'static str,
        bytes: Vec<u8>,
    },
}

/// Behaviour every scraping source shares: cookie checks, page fetches
/// with the stored cookies, and the quality fallback.
#[derive(Debug, Clone, Copy)]
pub struct SiteClient {
    name: &'static str,
    site: &'static str,
    required_cookies: &'static [&'static str],
}

impl SiteClient {
    pub const fn new(
        name: &'static str,
        site: &'static str,
        required_cookies: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            site,
            required_cookies,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn site(&self) -> &'static str {
        self.site
    }

    pub fn required_cookies(&self) -> &'static [&'static str] {
        self.required_cookies
    }

    pub fn requires_auth(&self) -> bool {
        !self.required_cookies.is_empty()
    }

    /// Absolute URL for a path or href relative to the site root.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") || path.starts_with("magnet:")
        {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.site.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// `Cookie` header for this site, or `MissingCookies` if a required one is absent.
    pub fn cookies(&self, ctx: &SearchContext) -> Result<Option<String>, SourceError> {
        let missing = ctx.credentials.missing(self.name, self.required_cookies);
        if !missing.is_empty() {
            return Err(SourceError::MissingCookies(missing));
        }
        Ok(ctx.credentials.cookie_header(self.name))
    }

    /// Fetch a page with this site's cookies.
    ///
    /// A login form served to an authenticated site means the session
    /// expired, and is reported as unavailable.
    pub async fn fetch_page(&self, ctx: &SearchContext, url: &str) -> Result<String, SourceError> {
        let cookies = self.cookies(ctx)?;
        debug!(source = self.name, url = %url, "requesting page");

        let body = ctx
            .fetcher
            .fetch(&FetchRequest::get(url).with_cookies(cookies))
            .await?;

        if self.requires_auth() && is_login_page(&body) {
            warn!(source = self.name, "login page served, cookies probably expired");
            return Err(SourceError::Unavailable("not logged in".into()));
        }
        Ok(body)
    }

    /// Follow `link`. Payloads are only fetched from this site, so stored
    /// cookies never leave it.
    pub async fn download(&self, ctx: &SearchContext, link: &Link) -> Result<Download, SourceError> {
        if link.is_magnet() {
            return Ok(Download::Magnet(link.file_url.clone()));
        }
        if !link.file_url.starts_with(self.site) {
            return Err(SourceError::ForeignLink(link.file_url.clone()));
        }

        let cookies = self.cookies(ctx)?;
        debug!(source = self.name, url = %link.file_url, "downloading payload");
        let request = FetchRequest::get(&link.file_url)
            .with_cookies(cookies)
            .with_header("Referer", self.site);
        let bytes = ctx.fetcher.fetch_bytes(&request).await?;

        if self.requires_auth() && is_login_page(&String::from_utf8_lossy(&bytes)) {
            warn!(source = self.name, "login page served instead of payload");
            return Err(SourceError::Unavailable("not logged in".into()));
        }

        Ok(Download::File {
            name: link.file_name(),
            content_type: link.kind.content_type(),
            bytes,
        })
    }

    /// Site-declared quality wins; the label heuristic fills in `Unknown`.
    pub fn resolve_quality(&self, declared: QualityTier, release: &str) -> QualityTier {
        showscout_scanner::resolve_quality(declared, release)
    }
}

pub fn is_login_page(body: &str) -> bool {
    RE_PASSWORD_INPUT.is_match(body)
}

/// Collapse runs of whitespace into single spaces.
pub(crate) fn squash_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
