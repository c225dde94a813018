use std::path::PathBuf;

pub const DEFAULT_SAGE_URL: &str = "https://sage.ci.dev/current/p";
pub const DEFAULT_SHERLODOC_URL: &str = "https://doc.sherlocode.com";

/// Where documentation is looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base of the sage.ci.dev package tree, without trailing slash.
    pub sage_url: String,
    pub sherlodoc_url: String,
    /// Root of a local odoc output directory (`_build/default/_doc/_html`).
    pub local_docs: Option<PathBuf>,
}

impl Config {
    pub fn new(sage_url: &str, sherlodoc_url: &str, local_docs: Option<PathBuf>) -> Self {
        Self {
            sage_url: sage_url.trim_end_matches('/').to_string(),
            sherlodoc_url: sherlodoc_url.trim_end_matches('/').to_string(),
            local_docs,
        }
    }

}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_SAGE_URL, DEFAULT_SHERLODOC_URL, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slashes_are_trimmed() {
        let config = Config::new("http://localhost:1234/p/", "http://localhost:5678//", None);
        assert_eq!(config.sage_url, "http://localhost:1234/p");
        assert_eq!(config.sherlodoc_url, "http://localhost:5678");
    }

    #[test]
    fn test_default_points_at_public_services() {
        let config = Config::default();
        assert_eq!(config.sage_url, DEFAULT_SAGE_URL);
        assert_eq!(config.sherlodoc_url, DEFAULT_SHERLODOC_URL);
        assert_eq!(config.local_docs, None);
    }
}
