use regex::{Captures, Regex};
use serde::Serialize;
use showscout_core::ParsedEpisode;
use std::ops::Range;
use std::sync::LazyLock;

/// Show, numbering and title pulled out of one release label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShowEpisodeTitle {
    pub show: Option<String>,
    pub season: u32,
    pub episode: u32,
    pub second_episode: Option<u32>,
    pub title: Option<String>,
}

impl ShowEpisodeTitle {
    pub fn episode(&self) -> ParsedEpisode {
        ParsedEpisode::new(self.season, self.episode).with_second(self.second_episode)
    }
}

// Patterns to ignore
static IGNORE_NAMES: &[&str] = &[
    ".DS_Store",
    "Thumbs.db",
    "@eaDir",
    ".nfo",
    ".txt",
    ".jpg",
    ".jpeg",
    ".png",
    ".srt",
    ".sub",
    ".idx",
    ".ass",
    ".ssa",
    ".sfv",
    ".par2",
];

static VIDEO_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "avi", "m4v", "mov", "wmv", "flv", "webm", "ts", "mpg", "mpeg", "3gp", "ogv",
    "m2ts", "mts", "vob", "mxf", "f4v", "3g2", "asf", "mpe", "mpv", "divx",
];

// S01E02, s1e3, S01E02E03, S01E02-E03, S01.E02
static RE_SXXEXX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)S(\d{1,2})[\s._-]?E(\d{1,3})(?:[\s._-]?E(\d{1,3}))?").unwrap()
});

// 1x02, 10x103
static RE_XEP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})x(\d{2,3})\b").unwrap()
});

// "Season X Episode Y", "Season X, Episode Y"
static RE_SEASON_EPISODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Season[\s._]*(\d{1,3})[\s._]*,?[\s._]*Episode[\s._]*(\d{1,4})").unwrap()
});

// 105 -> S01E05, only as a standalone token
static RE_BARE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[\s._\-\[(])([1-9])(\d{2})(?:$|[\s._\-\])])").unwrap()
});

// Numbers that are part of technical tags, blanked out before the bare pass.
static RE_TECH_NUMBERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\d{3,4}[pi]\b|[hx]\.?26[45]|\bdd[p+]?\d\.\d|\b\d\.\d\b|\b(?:19|20)\d{2}\b")
        .unwrap()
});

// First token of the trailing release junk after an episode title.
static RE_TITLE_STOP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:^|[\s._\-\[(])(?:\d{3,4}[pi]|hdtv|web(?:-?dl|rip)?|blu-?ray|bdrip|brrip|hddvd|dvdrip|dsr|tvrip|pdtv|x26[45]|h\.?26[45]|xvid|divx|proper|repack|internal|limited|dubbed|subbed|ws|ddp?\d\.?\d|aac(?:\d\.\d)?|ac3|mkv|e\d{1,3})(?:$|[\s._\-\])])",
    )
    .unwrap()
});

// Scene release group suffix: ".Pilot-LOL"
static RE_GROUP_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"-[A-Za-z0-9]+$").unwrap()
});

static RE_TRAILING_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\s(\[]*\b(?:19|20)\d{2}\b[)\]]*\s*$").unwrap()
});

/// Check if a filename should be ignored.
pub fn should_ignore(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    IGNORE_NAMES
        .iter()
        .any(|pat| lower == pat.to_lowercase() || lower.ends_with(&pat.to_lowercase()))
}

/// Check if a file has a video extension.
pub fn is_video_file(filename: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()),
        None => false,
    }
}

/// Clean up a label segment: dots/underscores to spaces, collapse runs, trim separators.
fn clean_title(raw: &str) -> String {
    raw.replace(['.', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c == '-' || c == ' ' || c == '[' || c == '(')
        .trim()
        .to_string()
}

/// Extract season/episode numbering from a release label.
pub fn extract_episode(label: &str) -> Option<ParsedEpisode> {
    locate_episode(label).map(|(ep, _)| ep)
}

/// Extract show, numbering and episode title from a release label.
///
/// When the text in front of the numbering names one of `known_shows`, the
/// catalog spelling is returned as the show.
pub fn extract_show_episode_title(label: &str, known_shows: &[String]) -> Option<ShowEpisodeTitle> {
    let (ep, span) = locate_episode(label)?;

    let raw_show = clean_title(&label[..span.start]);
    let show = if raw_show.is_empty() {
        None
    } else {
        Some(match_known_show(&raw_show, known_shows).unwrap_or(raw_show))
    };

    Some(ShowEpisodeTitle {
        show,
        season: ep.season,
        episode: ep.episode,
        second_episode: ep.second_episode,
        title: extract_title(&label[span.end..]),
    })
}

/// Find the numbering and the byte range it occupies in `label`.
fn locate_episode(label: &str) -> Option<(ParsedEpisode, Range<usize>)> {
    if let Some(found) = RE_SXXEXX
        .captures_iter(label)
        .find_map(|caps| numbered(&caps, 1, 2, Some(3)))
        .filter(|(_, span)| !followed_by_digit(label, span.end))
    {
        return Some(found);
    }

    if let Some(found) = RE_XEP
        .captures_iter(label)
        .find_map(|caps| numbered(&caps, 1, 2, None))
    {
        return Some(found);
    }

    if let Some(found) = RE_SEASON_EPISODE
        .captures_iter(label)
        .find_map(|caps| numbered(&caps, 1, 2, None))
        .filter(|(_, span)| !followed_by_digit(label, span.end))
    {
        return Some(found);
    }

    // Same-length blanking keeps byte offsets valid against `label`.
    let blanked = RE_TECH_NUMBERS.replace_all(label, |caps: &Captures| " ".repeat(caps[0].len()));
    RE_BARE.captures_iter(&blanked).find_map(|caps| {
        let (ep, _) = numbered(&caps, 1, 2, None)?;
        // The outer match includes the delimiters; report only the digits.
        Some((ep, caps.get(1)?.start()..caps.get(2)?.end()))
    })
}

/// An episode number running on past what the pattern captured is not one.
fn followed_by_digit(label: &str, end: usize) -> bool {
    label[end..].starts_with(|c: char| c.is_ascii_digit())
}

fn numbered(
    caps: &Captures,
    season_group: usize,
    episode_group: usize,
    second_group: Option<usize>,
) -> Option<(ParsedEpisode, Range<usize>)> {
    let season: u32 = caps.get(season_group)?.as_str().parse().ok()?;
    let episode: u32 = caps.get(episode_group)?.as_str().parse().ok()?;
    if episode == 0 {
        return None;
    }
    let second = second_group
        .and_then(|g| caps.get(g))
        .and_then(|m| m.as_str().parse().ok());
    let whole = caps.get(0)?;
    Some((
        ParsedEpisode::new(season, episode).with_second(second),
        whole.range(),
    ))
}

fn extract_title(after: &str) -> Option<String> {
    let mut rest = after;
    if let Some(stop) = RE_TITLE_STOP.find(rest) {
        rest = &rest[..stop.start()];
    } else if !rest.contains(' ') {
        // Scene style names end in "-GROUP".
        if let Some(group) = RE_GROUP_SUFFIX.find(rest) {
            rest = &rest[..group.start()];
        }
    }
    let title = clean_title(rest);
    if title.is_empty() { None } else { Some(title) }
}

/// Comparable form of a show name: lowercase words, no leading "the", no year.
pub fn normalize_show_name(name: &str) -> String {
    let lowered = name.to_lowercase().replace('&', " and ").replace(['\'', '’'], "");
    let without_year = RE_TRAILING_YEAR.replace(&lowered, "");
    let words: Vec<&str> = without_year
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    match words.split_first() {
        Some((&"the", rest)) if !rest.is_empty() => rest.join(" "),
        _ => words.join(" "),
    }
}

fn match_known_show(raw_show: &str, known_shows: &[String]) -> Option<String> {
    let wanted = normalize_show_name(raw_show);
    if wanted.is_empty() {
        return None;
    }
    known_shows
        .iter()
        .find(|known| normalize_show_name(known) == wanted)
        .cloned()
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn ep(season: u32, episode: u32) -> Option<ParsedEpisode> {
        Some(ParsedEpisode::new(season, episode))
    }

    #[test]
    fn parse_sxxexx() {
        assert_eq!(extract_episode("Show.S01E02.720p"), ep(1, 2));
        assert_eq!(extract_episode("Breaking.Bad.S02E05.Episode.Title.mkv"), ep(2, 5));
    }

    #[test]
    fn parse_sxxexx_lowercase() {
        assert_eq!(extract_episode("the.office.s01e01.pilot.mp4"), ep(1, 1));
        assert_eq!(extract_episode("show s4e7"), ep(4, 7));
    }

    #[test]
    fn parse_double_episode() {
        let parsed = extract_episode("Show.Name.S02E05E06.720p").unwrap();
        assert_eq!(parsed.season, 2);
        assert_eq!(parsed.episode, 5);
        assert_eq!(parsed.second_episode, Some(6));

        let parsed = extract_episode("Show.Name.S02E05-E06.HDTV").unwrap();
        assert_eq!(parsed.second_episode, Some(6));
    }

    #[test]
    fn second_episode_not_after_first_is_dropped() {
        let parsed = extract_episode("Show.S02E06E05").unwrap();
        assert_eq!(parsed.episode, 6);
        assert_eq!(parsed.second_episode, None);
    }

    #[test]
    fn parse_xep_format() {
        assert_eq!(extract_episode("Seinfeld.3x12.avi"), ep(3, 12));
        assert_eq!(extract_episode("Show - 10x103 - Title"), ep(10, 103));
    }

    #[test]
    fn xep_ignores_codec_and_resolution() {
        assert_eq!(extract_episode("Movie.1920x1080.x264"), None);
    }

    #[test]
    fn parse_season_episode_format() {
        assert_eq!(extract_episode("Friends Season 2 Episode 14.mkv"), ep(2, 14));
        assert_eq!(extract_episode("friends season 2, episode 14"), ep(2, 14));
    }

    #[test]
    fn parse_bare_three_digit() {
        assert_eq!(extract_episode("Show.Name.105.HDTV.XviD"), ep(1, 5));
        assert_eq!(extract_episode("show name 912"), ep(9, 12));
    }

    #[test]
    fn bare_form_skips_technical_numbers() {
        assert_eq!(extract_episode("Show.Name.720p.HDTV.H.264"), None);
        assert_eq!(extract_episode("Show.Name.2010.DD5.1"), None);
        assert_eq!(extract_episode("Show.Name.720p.HDTV.210"), ep(2, 10));
    }

    #[test]
    fn episode_zero_is_rejected() {
        assert_eq!(extract_episode("Show.S01E00"), None);
        assert_eq!(extract_episode("Show.100.HDTV"), None);
    }

    #[test]
    fn overlong_episode_numbers_are_not_truncated() {
        assert_eq!(extract_episode("Show Season 1 Episode 10000"), None);
        assert_eq!(extract_episode("Show.S01E1000.HDTV"), None);
        assert_eq!(extract_episode("Show Season 1 Episode 1000"), ep(1, 1000));
    }

    #[test]
    fn specials_season_zero() {
        assert_eq!(extract_episode("Show.Name.S00E01.Special.mkv"), ep(0, 1));
    }

    #[test]
    fn no_match_is_none() {
        assert_eq!(extract_episode("random text"), None);
        assert_eq!(extract_episode(""), None);
    }

    #[test]
    fn extraction_is_repeatable() {
        let label = "Show.Name.S02E05E06.720p";
        assert_eq!(extract_episode(label), extract_episode(label));
    }

    #[test]
    fn show_and_title_segments() {
        let r = extract_show_episode_title("Breaking.Bad.S02E05.Episode.Title.720p.HDTV.x264-CTU", &[])
            .unwrap();
        assert_eq!(
            r,
            ShowEpisodeTitle {
                show: Some("Breaking Bad".into()),
                season: 2,
                episode: 5,
                second_episode: None,
                title: Some("Episode Title".into()),
            }
        );
    }

    #[test]
    fn group_suffix_is_not_a_title() {
        let r = extract_show_episode_title("Show.S01E01-LOL", &[]).unwrap();
        assert_eq!(r.title, None);
        let r = extract_show_episode_title("Show.S01E01.Pilot-LOL", &[]).unwrap();
        assert_eq!(r.title.as_deref(), Some("Pilot"));
    }

    #[test]
    fn audio_tags_and_extra_episodes_are_not_titles() {
        let r = extract_show_episode_title("Show.Name.S01E02.AAC2.0.H264", &[]).unwrap();
        assert_eq!(r.title, None);
        let r = extract_show_episode_title("Show.Name.S01E02.Pilot.DDP5.1.H.264-NTb", &[]).unwrap();
        assert_eq!(r.title.as_deref(), Some("Pilot"));

        let r = extract_show_episode_title("Lost.s01e01e02e03", &[]).unwrap();
        assert_eq!(r.episode(), ParsedEpisode::new(1, 1).with_second(Some(2)));
        assert_eq!(r.title, None);
    }

    #[test]
    fn known_show_spelling_wins() {
        let known = vec!["Grey's Anatomy".to_string(), "The Office (US)".to_string()];
        let r = extract_show_episode_title("greys.anatomy.s07e01.720p.hdtv", &known).unwrap();
        assert_eq!(r.show.as_deref(), Some("Grey's Anatomy"));
        assert_eq!(r.title, None);
    }

    #[test]
    fn unknown_show_keeps_raw_segment() {
        let known = vec!["Lost".to_string()];
        let r = extract_show_episode_title("Fringe.S01E01.Pilot.mkv", &known).unwrap();
        assert_eq!(r.show.as_deref(), Some("Fringe"));
        assert_eq!(r.title.as_deref(), Some("Pilot"));
    }

    #[test]
    fn label_starting_with_numbering_has_no_show() {
        let r = extract_show_episode_title("S01E02 - The Title", &[]).unwrap();
        assert_eq!(r.show, None);
        assert_eq!(r.title.as_deref(), Some("The Title"));
    }

    #[test]
    fn normalizes_show_names() {
        assert_eq!(normalize_show_name("The Office"), "office");
        assert_eq!(normalize_show_name("Doctor Who (2005)"), "doctor who");
        assert_eq!(normalize_show_name("Law & Order"), "law and order");
        assert_eq!(normalize_show_name("Grey's Anatomy"), "greys anatomy");
        assert_eq!(normalize_show_name("The"), "the");
    }

    #[test]
    fn ignore_patterns() {
        assert!(should_ignore(".DS_Store"));
        assert!(should_ignore("Thumbs.db"));
        assert!(should_ignore("movie.nfo"));
        assert!(should_ignore("poster.jpg"));
        assert!(!should_ignore("movie.mkv"));
    }

    #[test]
    fn video_extension_check() {
        assert!(is_video_file("episode.mkv"));
        assert!(is_video_file("Episode.MP4"));
        assert!(is_video_file("ep.avi"));
        assert!(!is_video_file("poster.jpg"));
        assert!(!is_video_file("subs.srt"));
        assert!(!is_video_file("README"));
    }
}
