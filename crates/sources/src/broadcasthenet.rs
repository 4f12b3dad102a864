//! BroadcasTheNet, a private TV tracker.
//!
//! Result rows carry a bracketed descriptor after the episode anchor, e.g.
//! `[ x264 / MKV / HDTV / 720p ]`, and usually an embedded scene release
//! name. Rows without a release name get one built from the anchors.
//!
//! Quality comes from the embedded release name when it has one the
//! heuristic recognises, otherwise from the descriptor.

use async_stream::try_stream;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use showscout_core::{Link, LinkKind, QualityTier};
use std::sync::LazyLock;
use tracing::debug;

use crate::site::{SiteClient, squash_whitespace};
use crate::source::{LinkStream, SearchContext, Source};

static SEL_ROWS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table#torrent_table tr").unwrap());
static SEL_DOWNLOAD: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"span > a[href*="action=download"]"#).unwrap());
static SEL_BOLD: LazyLock<Selector> = LazyLock::new(|| Selector::parse("b").unwrap());

pub struct BroadcasTheNet {
    site: SiteClient,
}

impl BroadcasTheNet {
    pub fn new() -> Self {
        Self {
            site: SiteClient::new("BroadcasTheNet", "https://broadcasthe.net/", &["keeplogged"]),
        }
    }
}

impl Default for BroadcasTheNet {
    fn default() -> Self {
        Self::new()
    }
}

impl Source for BroadcasTheNet {
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
            let url = self.site.url(&format!("torrents.php?searchstr={}", urlencoding::encode(query)));
            let body = self.site.fetch_page(ctx, &url).await?;
            for link in parse_torrents(&self.site, &body) {
                yield link;
            }
        })
    }
}

fn parse_torrents(site: &SiteClient, body: &str) -> Vec<Link> {
    let document = Html::parse_document(body);
    let mut links = Vec::new();

    // First row is the column header.
    for row in document.select(&SEL_ROWS).skip(1) {
        let cells: Vec<ElementRef<'_>> = child_elements(row, "td").collect();
        let Some(name_cell) = cells.get(2) else {
            continue;
        };
        match parse_row(site, *name_cell, cells.get(4)) {
            Some(link) => links.push(link),
            None => debug!(source = site.name(), "skipping incomplete result row"),
        }
    }
    links
}

fn parse_row(site: &SiteClient, cell: ElementRef<'_>, size_cell: Option<&ElementRef<'_>>) -> Option<Link> {
    let anchors: Vec<ElementRef<'_>> = child_elements(cell, "a").collect();
    let descriptor = anchors.get(1).map(|a| following_text(*a)).unwrap_or_default();

    let embedded = embedded_release_name(cell)
        .filter(|name| !name.is_empty() && !name.contains("Not Available"));

    let (release, from_release) = match embedded {
        Some(name) => {
            let quality = showscout_scanner::classify_quality(&name);
            (name, quality)
        }
        None => {
            let anchor_text = |i: usize| {
                anchors
                    .get(i)
                    .map(|a| a.text().collect::<String>())
                    .unwrap_or_default()
            };
            let bare = descriptor.replace(['[', ']'], "").replace(" / ", " ");
            let built = squash_whitespace(&format!("{} {} {}", anchor_text(0), anchor_text(1), bare));
            (built, QualityTier::Unknown)
        }
    };
    if release.is_empty() {
        return None;
    }

    let download = cell.select(&SEL_DOWNLOAD).next()?.value().attr("href")?;

    Some(Link {
        quality: site.resolve_quality(from_release, &descriptor),
        file_url: site.url(download),
        info_url: anchors
            .get(1)
            .and_then(|a| a.value().attr("href"))
            .map(|href| site.url(href)),
        size: size_cell
            .map(|td| squash_whitespace(&td.text().collect::<String>()))
            .unwrap_or_default(),
        infos: String::new(),
        source: site.name().to_string(),
        kind: LinkKind::Torrent,
        release,
    })
}

fn child_elements<'a>(parent: ElementRef<'a>, tag: &'static str) -> impl Iterator<Item = ElementRef<'a>> {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |el| el.value().name() == tag)
}

/// Text after the `<b>Release Name</b>` label, with entities decoded.
fn embedded_release_name(cell: ElementRef<'_>) -> Option<String> {
    let label = cell
        .select(&SEL_BOLD)
        .find(|b| b.text().collect::<String>().trim() == "Release Name")?;
    Some(following_text(label).trim_start_matches(':').trim().to_string())
}

/// Text node directly after `el`, trimmed.
fn following_text(el: ElementRef<'_>) -> String {
    el.next_sibling()
        .and_then(|node| match node.value() {
            Node::Text(text) => Some(text.trim().to_string()),
            _ => None,
        })
        .unwrap_or_default()
}
