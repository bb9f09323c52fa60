use std::str::FromStr;

use crate::websearch::AllowedDomain;

/// Startup configuration failures. Any of these stops the process before it serves.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} not set")]
    MissingVar(&'static str),

    #[error("invalid domain '{0}': expected NAME=URL")]
    InvalidDomain(String),

    #[error("invalid domain URL '{url}': {reason}")]
    InvalidDomainUrl { url: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

impl FromStr for AllowedDomain {
    type Err = ConfigError;

    /// Parses `NAME=URL`, e.g. `Wikipedia=https://en.wikipedia.org`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, raw_url) = s
            .split_once('=')
            .map(|(n, u)| (n.trim(), u.trim()))
            .filter(|(n, u)| !n.is_empty() && !u.is_empty())
            .ok_or_else(|| ConfigError::InvalidDomain(s.to_string()))?;

        let parsed = url::Url::parse(raw_url).map_err(|e| ConfigError::InvalidDomainUrl {
            url: raw_url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(ConfigError::InvalidDomainUrl {
                url: raw_url.to_string(),
                reason: "must be an absolute http(s) URL".to_string(),
            });
        }

        Ok(AllowedDomain {
            name: name.to_string(),
            url: raw_url.trim_end_matches('/').to_string(),
        })
    }
}

/// Allow-list used when none is given on the command line.
pub fn default_domains() -> Vec<AllowedDomain> {
    [
        ("Wikipedia", "https://en.wikipedia.org"),
        ("OpenAI", "https://openai.com"),
        ("Rust", "https://www.rust-lang.org"),
        ("docs.rs", "https://docs.rs"),
    ]
    .into_iter()
    .map(|(name, url)| AllowedDomain {
        name: name.to_string(),
        url: url.to_string(),
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_name_and_url() {
        let d: AllowedDomain = "Wikipedia=https://en.wikipedia.org/".parse().unwrap();
        assert_eq!(d.name, "Wikipedia");
        assert_eq!(d.url, "https://en.wikipedia.org");
    }

    #[test]
    fn name_may_contain_spaces() {
        let d: AllowedDomain = "Rust Blog = https://blog.rust-lang.org".parse().unwrap();
        assert_eq!(d.name, "Rust Blog");
        assert_eq!(d.url, "https://blog.rust-lang.org");
    }

    #[test]
    fn rejects_missing_separator() {
        let err = "https://en.wikipedia.org".parse::<AllowedDomain>().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDomain(_)), "got: {err:?}");
    }

    #[test]
    fn rejects_empty_parts() {
        assert!("=https://a.com".parse::<AllowedDomain>().is_err());
        assert!("A=".parse::<AllowedDomain>().is_err());
    }

    #[test]
    fn rejects_non_http_urls() {
        for raw in ["Files=file:///etc", "Ftp=ftp://example.com", "Rel=example.com"] {
            assert!(
                matches!(
                    raw.parse::<AllowedDomain>(),
                    Err(ConfigError::InvalidDomainUrl { .. })
                ),
                "should reject {raw}"
            );
        }
    }

    #[test]
    fn default_domains_are_valid() {
        for d in default_domains() {
            let reparsed: AllowedDomain = format!("{}={}", d.name, d.url).parse().unwrap();
            assert_eq!(reparsed, d);
        }
    }
}
