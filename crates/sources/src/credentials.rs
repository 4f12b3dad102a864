use std::collections::HashMap;

/// Authentication cookies per source, read-only once a search starts.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    cookies: HashMap<String, Vec<(String, String)>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from stored `name=value; name=value` strings keyed by source name.
    pub fn from_cookie_strings(stored: HashMap<String, String>) -> Self {
        let mut store = Self::new();
        for (source, raw) in stored {
            store.insert(&source, &raw);
        }
        store
    }

    pub fn insert(&mut self, source: &str, raw: &str) {
        let parsed = parse_cookie_string(raw);
        if parsed.is_empty() {
            self.cookies.remove(source);
        } else {
            self.cookies.insert(source.to_string(), parsed);
        }
    }

    pub fn has_cookies(&self, source: &str) -> bool {
        self.cookies.contains_key(source)
    }

    pub fn cookie(&self, source: &str, name: &str) -> Option<&str> {
        self.cookies
            .get(source)?
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Required cookie names that are not stored for `source`.
    pub fn missing(&self, source: &str, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|name| self.cookie(source, name).is_none())
            .map(|name| name.to_string())
            .collect()
    }

    /// `Cookie` header value for `source`, if any cookies are stored.
    pub fn cookie_header(&self, source: &str) -> Option<String> {
        let pairs = self.cookies.get(source)?;
        Some(
            pairs
                .iter()
                .map(|(n, v)| format!("{n}={v}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// Parse `a=b; c=d`. Pairs without `=` or with an empty name are dropped.
pub fn parse_cookie_string(raw: &str) -> Vec<(String, String)> {
    raw.split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cookie_pairs() {
        let parsed = parse_cookie_string(" uid=42; pass=a=b ;junk; =x");
        assert_eq!(
            parsed,
            vec![
                ("uid".to_string(), "42".to_string()),
                ("pass".to_string(), "a=b".to_string()),
            ]
        );
    }

    #[test]
    fn reports_missing_cookies() {
        let mut store = CredentialStore::new();
        store.insert("iPlay", "uid=42");
        assert_eq!(store.missing("iPlay", &["uid", "pass"]), vec!["pass"]);
        assert_eq!(store.missing("Other", &["keeplogged"]), vec!["keeplogged"]);
        assert!(store.missing("iPlay", &[]).is_empty());
    }

    #[test]
    fn builds_cookie_header() {
        let store = CredentialStore::from_cookie_strings(HashMap::from([(
            "iPlay".to_string(),
            "uid=42;pass=abc".to_string(),
        )]));
        assert_eq!(store.cookie_header("iPlay").as_deref(), Some("uid=42; pass=abc"));
        assert_eq!(store.cookie("iPlay", "pass"), Some("abc"));
        assert!(store.cookie_header("Other").is_none());
    }

    #[test]
    fn empty_string_clears_source() {
        let mut store = CredentialStore::new();
        store.insert("iPlay", "uid=1");
        store.insert("iPlay", "");
        assert!(!store.has_cookies("iPlay"));
    }
}
