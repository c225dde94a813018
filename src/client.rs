//! HTTP access to sage.ci.dev and Sherlodoc.
//!
//! sage serves odoc output as plain directories: `/{package}/` lists versions,
//! `/{package}/{version}/status.json` describes a build, and every generated
//! page has an `.html.json` sibling holding its preamble and content.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::Config;
use crate::docs_parser::{self, SignatureHit};
use crate::error::{DocsError, Result};

/// sage's description of one package build.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct BuildStatus {
    #[serde(default = "default_failed")]
    pub failed: bool,
    #[serde(default)]
    pub files: Vec<String>,
}

fn default_failed() -> bool {
    true
}

#[derive(Debug, Clone)]
pub struct DocsClient {
    client: Client,
    sage_url: String,
    sherlodoc_url: String,
}

impl DocsClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            sage_url: config.sage_url.clone(),
            sherlodoc_url: config.sherlodoc_url.clone(),
        })
    }

    /// GET `url`, mapping 404 to `None` and other failures to errors.
    async fn fetch(&self, url: &str) -> Result<Option<reqwest::Response>> {
        tracing::debug!("Fetching {}", url);
        let response = self.client.get(url).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response)),
            status => Err(DocsError::RemoteStatus {
                url: url.to_string(),
                status: status.as_u16(),
            }),
        }
    }

    pub async fn fetch_text(&self, url: &str) -> Result<Option<String>> {
        match self.fetch(url).await? {
            Some(response) => Ok(Some(response.text().await?)),
            None => Ok(None),
        }
    }

    pub async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        // sage does not always label JSON as such, so decode the text ourselves.
        match self.fetch_text(url).await? {
            Some(body) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }

    /// Every package name known to sage.
    pub async fn list_packages(&self) -> Result<Vec<String>> {
        let url = format!("{}/", self.sage_url);
        Ok(self
            .fetch_text(&url)
            .await?
            .map(|html| docs_parser::parse_directory_listing(&html))
            .unwrap_or_default())
    }

    /// Published versions of `package`, or `None` if sage does not know it.
    pub async fn list_versions(&self, package: &str) -> Result<Option<Vec<String>>> {
        let url = format!("{}/{}/", self.sage_url, package);
        Ok(self
            .fetch_text(&url)
            .await?
            .map(|html| docs_parser::parse_directory_listing(&html)))
    }

    pub async fn build_status(&self, package: &str, version: &str) -> Result<Option<BuildStatus>> {
        let url = format!("{}/{}/{}/status.json", self.sage_url, package, version);
        self.fetch_json(&url).await
    }

    /// Raw `.html.json` page for a generated HTML path such as
    /// `doc/lwt/Lwt/index.html`. Decoding is left to the caller so a broken
    /// page can be reported as such.
    pub async fn odoc_page(&self, package: &str, version: &str, html_path: &str) -> Result<Option<String>> {
        let url = format!(
            "{}/{}/{}/{}.json",
            self.sage_url,
            package,
            version,
            html_path.trim_start_matches('/')
        );
        self.fetch_text(&url).await
    }

    /// Query Sherlodoc by name or type signature.
    pub async fn sherlodoc(&self, query: &str) -> Result<Vec<SignatureHit>> {
        let url = Url::parse_with_params(&format!("{}/api", self.sherlodoc_url), &[("q", query)])?;
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DocsError::RemoteStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let html = response.text().await?;
        Ok(docs_parser::parse_sherlodoc_results(&html, docs_parser::SHERLODOC_LIMIT))
    }
}
