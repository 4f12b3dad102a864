//! Release quality heuristic.
//!
//! Rules are conjunctions of case-insensitive patterns, tried top to bottom.
//! The first rule whose patterns all match decides the tier; nothing is
//! scored, so a `1080p` + `WEB` label stays WEB-DL even when it also
//! carries an encoder tag.

use regex::Regex;
use showscout_core::QualityTier;
use std::sync::LazyLock;

struct Rule {
    tier: QualityTier,
    patterns: Vec<Regex>,
}

impl Rule {
    fn new(tier: QualityTier, patterns: &[&str]) -> Self {
        Self {
            tier,
            patterns: patterns
                .iter()
                .map(|p| Regex::new(&format!("(?i){p}")).unwrap())
                .collect(),
        }
    }

    fn matches(&self, label: &str) -> bool {
        self.patterns.iter().all(|re| re.is_match(label))
    }
}

static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::new(QualityTier::WebDl1080p, &[r"1080(i|p)", r"WEB"]),
        Rule::new(QualityTier::BluRay1080p, &[r"1080(i|p)", r"(Bluray|BD|HDDVD)"]),
        Rule::new(QualityTier::Hdtv1080i, &[r"1080(i|p)", r"HDTV"]),
        Rule::new(QualityTier::WebDl720p, &[r"720p", r"WEB"]),
        Rule::new(QualityTier::BluRay720p, &[r"720p", r"(Bluray|BD|HDDVD)"]),
        Rule::new(QualityTier::Hdtv720p, &[r"720p", r"HDTV"]),
        Rule::new(QualityTier::HrX264, &[r"(x264|h.264|MKV)"]),
        Rule::new(QualityTier::HdtvXvid, &[r"(HDTV|DSR|DVDRip)"]),
        Rule::new(QualityTier::TvRip, &[r"TVRip"]),
    ]
});

/// Classify a release label into a quality tier. `Unknown` when nothing matches.
pub fn classify_quality(label: &str) -> QualityTier {
    RULES
        .iter()
        .find(|rule| rule.matches(label))
        .map(|rule| rule.tier)
        .unwrap_or_default()
}

/// Prefer what the source itself declared; fall back to the heuristic.
pub fn resolve_quality(declared: QualityTier, label: &str) -> QualityTier {
    if declared.is_known() {
        declared
    } else {
        classify_quality(label)
    }
}
