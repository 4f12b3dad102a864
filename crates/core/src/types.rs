use serde::{Deserialize, Serialize};

/// Normalized quality of a release.
///
/// Variants are declared lowest first so the derived `Ord` puts
/// `WebDl1080p` on top and `Unknown` at the bottom.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    #[default]
    Unknown,
    TvRip,
    HdtvXvid,
    HrX264,
    Hdtv720p,
    BluRay720p,
    WebDl720p,
    Hdtv1080i,
    BluRay1080p,
    WebDl1080p,
}

impl QualityTier {
    /// Every tier, highest first.
    pub const ALL: [QualityTier; 10] = [
        Self::WebDl1080p,
        Self::BluRay1080p,
        Self::Hdtv1080i,
        Self::WebDl720p,
        Self::BluRay720p,
        Self::Hdtv720p,
        Self::HrX264,
        Self::HdtvXvid,
        Self::TvRip,
        Self::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::WebDl1080p => "web_dl_1080p",
            Self::BluRay1080p => "blu_ray_1080p",
            Self::Hdtv1080i => "hdtv_1080i",
            Self::WebDl720p => "web_dl_720p",
            Self::BluRay720p => "blu_ray_720p",
            Self::Hdtv720p => "hdtv_720p",
            Self::HrX264 => "hr_x264",
            Self::HdtvXvid => "hdtv_xvid",
            Self::TvRip => "tv_rip",
            Self::Unknown => "unknown",
        }
    }

    /// Human readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::WebDl1080p => "WEB-DL 1080p",
            Self::BluRay1080p => "Blu-ray 1080p",
            Self::Hdtv1080i => "HDTV 1080i",
            Self::WebDl720p => "WEB-DL 720p",
            Self::BluRay720p => "Blu-ray 720p",
            Self::Hdtv720p => "HDTV 720p",
            Self::HrX264 => "HR x264",
            Self::HdtvXvid => "HDTV XviD",
            Self::TvRip => "TVRip",
            Self::Unknown => "Unknown",
        }
    }

    pub fn is_known(self) -> bool {
        self != Self::Unknown
    }
}

impl std::fmt::Display for QualityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// What a source hands out when a link is followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    Torrent,
    Usenet,
    Http,
}

impl LinkKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Torrent => "torrent",
            Self::Usenet => "usenet",
            Self::Http => "http",
        }
    }

    /// Extension of the payload file a link of this kind downloads to.
    pub fn file_extension(self) -> Option<&'static str> {
        match self {
            Self::Torrent => Some("torrent"),
            Self::Usenet => Some("nzb"),
            Self::Http => None,
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Torrent => "application/x-bittorrent",
            Self::Usenet => "application/x-nzb",
            Self::Http => "application/octet-stream",
        }
    }
}

impl std::fmt::Display for LinkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Season/episode numbering parsed out of a release label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParsedEpisode {
    /// Season 0 holds specials.
    pub season: u32,
    pub episode: u32,
    /// Set for double-episode releases, always greater than `episode`.
    pub second_episode: Option<u32>,
}

impl ParsedEpisode {
    pub fn new(season: u32, episode: u32) -> Self {
        Self {
            season,
            episode,
            second_episode: None,
        }
    }

    /// Attach a second episode, dropping it if it would not follow `episode`.
    pub fn with_second(mut self, second: Option<u32>) -> Self {
        self.second_episode = second.filter(|&s| s > self.episode);
        self
    }
}

impl std::fmt::Display for ParsedEpisode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "S{:02}E{:02}", self.season, self.episode)?;
        if let Some(second) = self.second_episode {
            write!(f, "E{second:02}")?;
        }
        Ok(())
    }
}

/// One normalized search result produced by a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub release: String,
    pub quality: QualityTier,
    /// URL of the payload (torrent, nzb or file).
    pub file_url: String,
    /// URL of the details page on the source, if it has one.
    pub info_url: Option<String>,
    pub size: String,
    pub infos: String,
    /// Name of the source that produced the link.
    pub source: String,
    pub kind: LinkKind,
}

impl Link {
    pub fn is_magnet(&self) -> bool {
        self.file_url.starts_with("magnet:")
    }

    /// Name a downloaded payload is saved under: the release made safe for
    /// file systems, plus the extension for the link's kind.
    pub fn file_name(&self) -> String {
        let slug: String = self
            .release
            .chars()
            .map(|c| match c {
                c if c.is_ascii_alphanumeric() => c,
                '.' | '-' | '_' => c,
                _ => '_',
            })
            .collect();
        let slug = match slug.trim_matches(['.', '_']) {
            "" => "download",
            trimmed => trimmed,
        };
        match self.kind.file_extension() {
            Some(ext) => format!("{slug}.{ext}"),
            None => slug.to_string(),
        }
    }
}
