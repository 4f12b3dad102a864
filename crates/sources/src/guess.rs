//! Placeholder episode calendars inferred from search results.
//!
//! Used when no guide has data for a show: the highest season and episode
//! numbers seen in release names are taken as the show's extent and every
//! episode in that grid gets a made-up air date.

use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::aggregate::{Aggregator, SourceReport};
use crate::source::Source;

pub const DEFAULT_RUNTIME_MINUTES: u32 = 30;
pub const DEFAULT_AIR_TIME: &str = "20:00";

/// Numbering past these is treated as a mislabelled release.
pub const MAX_PLAUSIBLE_SEASON: u32 = 100;
pub const MAX_PLAUSIBLE_EPISODE: u32 = 300;

/// Highest season and episode numbers observed. Zero means nothing parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Extent {
    pub max_season: u32,
    pub max_episode: u32,
}

impl Extent {
    pub fn is_empty(&self) -> bool {
        self.max_season == 0 || self.max_episode == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuessedEpisode {
    pub season: u32,
    pub episode: u32,
    pub title: String,
    pub airdate: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct GuessedShow {
    pub title: String,
    pub runtime_minutes: u32,
    pub air_time: String,
    pub airing: bool,
    /// Always true: nothing here was observed from a broadcaster.
    pub heuristic: bool,
    pub extent: Extent,
    pub episodes: Vec<GuessedEpisode>,
    /// Per-source results of the search the guess was based on.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reports: Vec<SourceReport>,
}

/// Search for `show` and build a placeholder calendar from the results.
pub async fn infer_calendar(
    aggregator: &Aggregator,
    show: &str,
    sources: &[Arc<dyn Source>],
    anchor_year: i32,
    cancel: &CancellationToken,
) -> GuessedShow {
    let outcome = aggregator.search(show, sources, cancel).await;
    let extent = observed_extent(outcome.links.iter().map(|l| l.release.as_str()));

    info!(
        show = %show,
        links = outcome.links.len(),
        max_season = extent.max_season,
        max_episode = extent.max_episode,
        "calendar inferred"
    );

    let mut guessed = synthesize_calendar(show, extent, anchor_year);
    guessed.reports = outcome.reports;
    guessed
}

/// Highest season and highest episode across every label that parses.
///
/// The two maxima are independent; they need not come from the same label.
/// Labels numbered beyond [`MAX_PLAUSIBLE_SEASON`] or [`MAX_PLAUSIBLE_EPISODE`]
/// are skipped.
pub fn observed_extent<'a>(labels: impl IntoIterator<Item = &'a str>) -> Extent {
    labels
        .into_iter()
        .filter_map(|label| {
            let ep = showscout_scanner::extract_episode(label)?;
            if ep.season > MAX_PLAUSIBLE_SEASON || ep.episode > MAX_PLAUSIBLE_EPISODE {
                warn!(label = %label, numbering = %ep, "ignoring implausible numbering");
                return None;
            }
            Some(ep)
        })
        .fold(Extent::default(), |acc, ep| Extent {
            max_season: acc.max_season.max(ep.season),
            max_episode: acc.max_episode.max(ep.episode),
        })
}

/// Every `(season, episode)` in `[1, max_season] × [1, max_episode]`, with
/// later seasons dated closer to `anchor_year`.
pub fn synthesize_calendar(title: &str, extent: Extent, anchor_year: i32) -> GuessedShow {
    let mut episodes = Vec::new();

    if !extent.is_empty() {
        episodes.reserve((extent.max_season * extent.max_episode) as usize);
        for season in 1..=extent.max_season {
            for episode in 1..=extent.max_episode {
                episodes.push(GuessedEpisode {
                    season,
                    episode,
                    title: format!("Season {season}, Episode {episode}"),
                    airdate: placeholder_airdate(extent.max_season, season, episode, anchor_year),
                });
            }
        }
    }

    GuessedShow {
        title: title.to_string(),
        runtime_minutes: DEFAULT_RUNTIME_MINUTES,
        air_time: DEFAULT_AIR_TIME.to_string(),
        airing: true,
        heuristic: true,
        extent,
        episodes,
        reports: Vec::new(),
    }
}

/// Year counts back from the anchor by season; episodes 1-10 land in
/// January, 11-20 in February and so on, ten days apart at most.
fn placeholder_airdate(max_season: u32, season: u32, episode: u32, anchor_year: i32) -> NaiveDate {
    let year = anchor_year - (max_season - season) as i32;
    let month = episode.div_ceil(10).clamp(1, 12);
    let day = episode % 10 + 1;
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}
