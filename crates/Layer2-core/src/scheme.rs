//! URL scheme handling
//!
//! The cache is keyed by full URL string, and the `http://` and `https://`
//! spellings of the same resource are separate keys. Lookups therefore try both.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            Scheme::Http => "http://",
            Scheme::Https => "https://",
        }
    }

    /// Scheme of an absolute http(s) URL, case-insensitive
    pub fn of(url: &str) -> Option<Scheme> {
        split_scheme(url).map(|(scheme, _)| scheme)
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Split `scheme://rest` into its scheme and the part after `://`
fn split_scheme(url: &str) -> Option<(Scheme, &str)> {
    for scheme in [Scheme::Https, Scheme::Http] {
        let prefix = scheme.prefix();
        let matches = url
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix));
        if matches {
            return Some((scheme, &url[prefix.len()..]));
        }
    }
    None
}

/// Rewrite the scheme prefix of an absolute http(s) URL
pub fn with_scheme(url: &str, scheme: Scheme) -> Option<String> {
    let (_, rest) = split_scheme(url)?;
    Some(format!("{}{}", scheme.prefix(), rest))
}

/// Both cache keys for one requested target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemeForms {
    pub https: String,
    pub http: String,
    requested: Scheme,
}

impl SchemeForms {
    /// `None` when the target is not an absolute http(s) URL with a host part
    pub fn of(target: &str) -> Option<Self> {
        let (requested, rest) = split_scheme(target)?;
        if rest.is_empty() {
            return None;
        }
        Some(Self {
            https: format!("{}{}", Scheme::Https.prefix(), rest),
            http: format!("{}{}", Scheme::Http.prefix(), rest),
            requested,
        })
    }

    pub fn for_scheme(&self, scheme: Scheme) -> &str {
        match scheme {
            Scheme::Http => &self.http,
            Scheme::Https => &self.https,
        }
    }

    /// Scheme the client asked for
    pub fn requested(&self) -> Scheme {
        self.requested
    }

    /// Key a fresh response is stored under: the URL as requested, before
    /// scheme negotiation, with a lowercase scheme
    pub fn requested_key(&self) -> &str {
        self.for_scheme(self.requested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forms() {
        let forms = SchemeForms::of("http://example.com/a?b=c").unwrap();
        assert_eq!(forms.https, "https://example.com/a?b=c");
        assert_eq!(forms.http, "http://example.com/a?b=c");
        assert_eq!(forms.requested(), Scheme::Http);
        assert_eq!(forms.requested_key(), "http://example.com/a?b=c");
    }

    #[test]
    fn test_only_prefix_is_rewritten() {
        let forms = SchemeForms::of("https://example.com/?next=http://other/").unwrap();
        assert_eq!(forms.http, "http://example.com/?next=http://other/");
        assert_eq!(forms.requested_key(), "https://example.com/?next=http://other/");
    }

    #[test]
    fn test_case_insensitive_scheme() {
        let forms = SchemeForms::of("HTTP://Example.com/").unwrap();
        assert_eq!(forms.http, "http://Example.com/");
        assert_eq!(Scheme::of("HtTpS://x"), Some(Scheme::Https));
    }

    #[test]
    fn test_rejects_non_http_targets() {
        assert!(SchemeForms::of("example.com:443").is_none());
        assert!(SchemeForms::of("/relative/path").is_none());
        assert!(SchemeForms::of("ftp://example.com/").is_none());
        assert!(SchemeForms::of("http://").is_none());
    }

    #[test]
    fn test_with_scheme() {
        assert_eq!(
            with_scheme("https://example.com/x", Scheme::Http).as_deref(),
            Some("http://example.com/x")
        );
        assert_eq!(with_scheme("mailto:a@b", Scheme::Http), None);
    }
}
