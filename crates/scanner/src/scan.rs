use serde::Serialize;
use showscout_core::QualityTier;
use std::path::Path;
use tracing::{debug, info};

use crate::parser;
use crate::quality::classify_quality;
use crate::walk;

/// Classification of one local video file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShowFile {
    /// File name including the extension.
    pub name: String,
    /// Extension with its leading dot, empty when the file has none.
    pub extension: String,
    pub quality: QualityTier,
    pub show: Option<String>,
    pub season: u32,
    pub episode: u32,
    pub second_episode: Option<u32>,
    pub title: Option<String>,
}

impl ShowFile {
    /// Classify the file at `path`. `None` when its name carries no episode numbering.
    pub fn from_path(path: &Path, known_shows: &[String]) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy().into_owned();
        let extension = path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();

        let stem = name.strip_suffix(extension.as_str()).unwrap_or(&name);
        let mut parsed = parser::extract_show_episode_title(stem, known_shows)?;

        // "Show Name/Season 01/S01E02.mkv": take the show from the folder.
        if parsed.show.is_none() {
            parsed.show = series_dir(path).map(|dir| {
                parser::extract_show_episode_title(&format!("{dir} S01E01"), known_shows)
                    .and_then(|p| p.show)
                    .unwrap_or(dir)
            });
        }

        Some(Self {
            quality: classify_quality(&name),
            name,
            extension,
            show: parsed.show,
            season: parsed.season,
            episode: parsed.episode,
            second_episode: parsed.second_episode,
            title: parsed.title,
        })
    }
}

/// Walk `root` and classify every video file that names an episode.
pub fn scan_dir(root: &Path, known_shows: &[String]) -> Vec<ShowFile> {
    let paths = walk::walk_video_files(root);
    let mut files = Vec::with_capacity(paths.len());

    for path in &paths {
        match ShowFile::from_path(path, known_shows) {
            Some(file) => files.push(file),
            None => debug!(path = %path.display(), "no episode numbering in file name"),
        }
    }

    info!(
        root = %root.display(),
        videos = paths.len(),
        episodes = files.len(),
        "scan finished"
    );
    files
}

/// Nearest ancestor directory that is not a season folder.
fn series_dir(path: &Path) -> Option<String> {
    path.ancestors()
        .skip(1)
        .filter_map(|dir| dir.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .find(|name| !is_season_dir(name))
}

fn is_season_dir(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower == "specials"
        || lower
            .strip_prefix("season")
            .is_some_and(|rest| rest.trim().chars().all(|c| c.is_ascii_digit()))
}
