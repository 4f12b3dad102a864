//! iPlay, a Romanian private tracker.

use async_stream::try_stream;
use scraper::{ElementRef, Html, Selector};
use showscout_core::{Link, LinkKind, QualityTier};
use std::sync::LazyLock;
use tracing::debug;

use crate::site::{SiteClient, squash_whitespace};
use crate::source::{LinkStream, SearchContext, Source};

static SEL_TORRENT: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a.torrent").unwrap());
static SEL_DOWNLOAD_IMG: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img.dld").unwrap());
static SEL_HALF: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"img[alt="half"]"#).unwrap());

const FREELEECH_NOTE: &str = ", 50% Down / 100% Up";

pub struct IPlay {
    site: SiteClient,
}

impl IPlay {
    pub fn new() -> Self {
        Self {
            site: SiteClient::new("iPlay", "https://iplay.ro/", &["uid", "pass"]),
        }
    }
}

impl Default for IPlay {
    fn default() -> Self {
        Self::new()
    }
}

impl Source for IPlay {
    fn name(&self) -> &'static str {
        self.site.name()
    }

    fn site(&self) -> &'static str {
        self.site.site()
    }

    fn requires_auth(&self) -> bool {
        true
    }

    fn required_cookies(&self) -> &'static [&'static str] {
        self.site.required_cookies()
    }

    fn kind(&self) -> LinkKind {
        LinkKind::Torrent
    }

    fn search<'a>(&'a self, query: &'a str, ctx: &'a SearchContext) -> LinkStream<'a> {
        Box::pin(try_stream! {
            let url = self.site.url(&format!("browse.php?search={}", urlencoding::encode(query)));
            let body = self.site.fetch_page(ctx, &url).await?;
            for link in parse_browse(&self.site, &body) {
                yield link;
            }
        })
    }
}

/// Rows of a `browse.php` result page, in page order.
fn parse_browse(site: &SiteClient, body: &str) -> Vec<Link> {
    let document = Html::parse_document(body);
    let mut links = Vec::new();

    for anchor in document.select(&SEL_TORRENT) {
        match parse_row(site, anchor) {
            Some(link) => links.push(link),
            None => debug!(source = site.name(), "skipping incomplete result row"),
        }
    }
    links
}

fn parse_row(site: &SiteClient, anchor: ElementRef<'_>) -> Option<Link> {
    let name_cell = anchor.parent().and_then(ElementRef::wrap)?;
    let row = name_cell.parent().and_then(ElementRef::wrap)?;
    let cells: Vec<ElementRef<'_>> = row
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "td")
        .collect();

    let release = anchor
        .value()
        .attr("title")
        .map(str::to_string)
        .unwrap_or_else(|| squash_whitespace(&anchor.text().collect::<String>()));
    if release.is_empty() {
        return None;
    }

    let file_url = name_cell
        .select(&SEL_DOWNLOAD_IMG)
        .next()
        .and_then(|img| img.parent().and_then(ElementRef::wrap))
        .and_then(|a| a.value().attr("href"))?;

    let mut infos = format!(
        "{} seed / {} leech",
        cell_text(cells.get(6)),
        cell_text(cells.get(7))
    );
    if name_cell.select(&SEL_HALF).next().is_some() {
        infos.push_str(FREELEECH_NOTE);
    }

    Some(Link {
        quality: site.resolve_quality(QualityTier::Unknown, &release),
        file_url: site.url(file_url),
        info_url: anchor.value().attr("href").map(|href| site.url(href)),
        // "1.37<br>GB" renders as "1.37 GB"
        size: cell_text(cells.get(4)),
        infos,
        source: site.name().to_string(),
        kind: LinkKind::Torrent,
        release,
    })
}

fn cell_text(cell: Option<&ElementRef<'_>>) -> String {
    cell.map(|td| {
        td.text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::CredentialStore;
    use crate::fetch::StaticFetcher;
    use futures::TryStreamExt;
    use showscout_core::SourceError;
    use std::sync::Arc;

    const BROWSE: &str = include_str!("../tests/fixtures/iplay_browse.html");
    const EMPTY: &str = include_str!("../tests/fixtures/iplay_empty.html");

    fn ctx(fetcher: Arc<StaticFetcher>, cookies: &str) -> SearchContext {
        let mut creds = CredentialStore::new();
        creds.insert("iPlay", cookies);
        SearchContext::new(fetcher, Arc::new(creds))
    }

    #[test]
    fn parses_browse_rows() {
        let site = IPlay::new().site;
        let links = parse_browse(&site, BROWSE);
        assert_eq!(links.len(), 2);

        let first = &links[0];
        assert_eq!(first.release, "Lost.S03E07.720p.HDTV.x264-CTU");
        assert_eq!(first.quality, QualityTier::Hdtv720p);
        assert_eq!(first.file_url, "https://iplay.ro/download.php/1001/Lost.S03E07.torrent");
        assert_eq!(
            first.info_url.as_deref(),
            Some("https://iplay.ro/details.php?id=1001&hit=1")
        );
        assert_eq!(first.size, "1.37 GB");
        assert_eq!(first.infos, "45 seed / 3 leech, 50% Down / 100% Up");
        assert_eq!(first.source, "iPlay");

        let second = &links[1];
        assert_eq!(second.quality, QualityTier::HdtvXvid);
        assert_eq!(second.size, "350.12 MB");
        assert_eq!(second.infos, "12 seed / 0 leech");
    }

    #[tokio::test]
    async fn search_sends_query_and_cookies() {
        let fetcher = Arc::new(StaticFetcher::new().with_page("https://iplay.ro/browse.php", BROWSE));
        let source = IPlay::new();
        let ctx = ctx(fetcher.clone(), "uid=1; pass=secret");

        let links: Vec<Link> = source.search("lost s03", &ctx).try_collect().await.unwrap();
        assert_eq!(links.len(), 2);

        let sent = fetcher.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].url, "https://iplay.ro/browse.php?search=lost%20s03");
        assert_eq!(sent[0].cookies.as_deref(), Some("uid=1; pass=secret"));
    }

    #[tokio::test]
    async fn no_results_is_empty_stream() {
        let fetcher = Arc::new(StaticFetcher::new().with_page("https://iplay.ro/", EMPTY));
        let links: Vec<Link> = IPlay::new()
            .search("nothing", &ctx(fetcher, "uid=1; pass=x"))
            .try_collect()
            .await
            .unwrap();
        assert!(links.is_empty());
    }

    #[tokio::test]
    async fn missing_cookie_fails_search() {
        let fetcher = Arc::new(StaticFetcher::new().with_page("https://iplay.ro/", BROWSE));
        let result: Result<Vec<Link>, _> = IPlay::new()
            .search("lost", &ctx(fetcher, "uid=1"))
            .try_collect()
            .await;
        assert_eq!(result, Err(SourceError::MissingCookies(vec!["pass".into()])));
    }
}
