//! Resolve a blog's display name from its homepage

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;

static OG_SITE_NAME: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r#"(?is)<meta[^>]+property\s*=\s*["']og:site_name["'][^>]*content\s*=\s*["']([^"']*)["']"#)
        .ok()
});
static TITLE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").ok());

#[async_trait]
pub trait SiteNameResolver: Send + Sync {
    async fn fetch_site_name(&self, url: &str) -> Result<String, anyhow::Error>;
}

pub struct HttpSiteNameResolver {
    client: reqwest::Client,
}

impl HttpSiteNameResolver {
    pub fn new(timeout: Duration) -> Self {
        let client = match reqwest::Client::builder().timeout(timeout).build() {
            Ok(client) => client,
            Err(err) => {
                tracing::warn!(
                    "Failed to build HTTP client with {:?} timeout, using defaults: {}",
                    timeout,
                    err
                );
                reqwest::Client::new()
            }
        };

        Self { client }
    }
}

impl Default for HttpSiteNameResolver {
    fn default() -> Self {
        Self::new(Duration::from_secs(15))
    }
}

#[async_trait]
impl SiteNameResolver for HttpSiteNameResolver {
    async fn fetch_site_name(&self, url: &str) -> Result<String, anyhow::Error> {
        let response = self
            .client
            .get(url)
            .header("User-Agent", "BlogDesk/1.0")
            .header("Accept", "text/html")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "Blog homepage returned status: {}",
                response.status()
            ));
        }

        let body = response.text().await?;
        extract_site_name(&body).ok_or_else(|| anyhow::anyhow!("No site name found at {}", url))
    }
}

/// `og:site_name` if present, otherwise the `<title>`
pub fn extract_site_name(html: &str) -> Option<String> {
    [&*OG_SITE_NAME, &*TITLE]
        .into_iter()
        .flatten()
        .filter_map(|re| re.captures(html))
        .filter_map(|caps| caps.get(1))
        .map(|m| decode_entities(m.as_str().trim()))
        .find(|name| !name.is_empty())
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_og_site_name() {
        let html = r#"<html><head>
            <title>Welcome | Staff</title>
            <meta property="og:site_name" content="Staff Picks">
        </head></html>"#;
        assert_eq!(extract_site_name(html).as_deref(), Some("Staff Picks"));
    }

    #[test]
    fn falls_back_to_title() {
        let html = "<html><head><TITLE>\n  Tom &amp; Jerry's Blog \n</TITLE></head></html>";
        assert_eq!(extract_site_name(html).as_deref(), Some("Tom & Jerry's Blog"));
    }

    #[test]
    fn empty_names_are_ignored() {
        assert_eq!(extract_site_name("<title>   </title>"), None);
        assert_eq!(extract_site_name("<p>no head</p>"), None);
    }
}
