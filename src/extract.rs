//! Hoster link extraction from free text.

use std::collections::HashSet;
use std::sync::Arc;

use crate::config::HosterConfig;
use crate::error::{Error, Result};
use crate::http::HttpClient;

/// Pushes every direct hoster link found in `text` that has not been seen.
fn collect_direct(
    config: &HosterConfig,
    text: &str,
    seen: &mut HashSet<String>,
    result: &mut Vec<String>,
) {
    for m in config.direct_link.find_iter(text) {
        let url = m.as_str().to_string();
        if seen.insert(url.clone()) {
            result.push(url);
        }
    }
}

/// Extracts direct hoster links from `text`, without following redirectors.
///
/// Links are returned in order of first appearance, without duplicates.
#[must_use]
pub fn scan_direct_links(config: &HosterConfig, text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut result = Vec::new();
    collect_direct(config, text, &mut seen, &mut result);
    result
}

/// Rewrites a redirector match (`host/dl/ID`) to the page listing its
/// targets (`http://host/rd/ID/2`).
#[must_use]
pub fn redirector_target(link: &str) -> String {
    format!("http://{}/2", link.replacen("/dl/", "/rd/", 1))
}

/// Finds hoster links in text, following one redirector hop.
pub struct LinkExtractor<H: HttpClient> {
    config: Arc<HosterConfig>,
    http: Arc<H>,
}

impl<H: HttpClient> LinkExtractor<H> {
    /// Creates an extractor sharing the given configuration and HTTP client.
    #[must_use]
    pub const fn new(config: Arc<HosterConfig>, http: Arc<H>) -> Self {
        Self { config, http }
    }

    /// Extracts every hoster link in `text`.
    ///
    /// Direct links come first, then links found behind each redirector in
    /// order. A redirector that cannot be fetched contributes nothing.
    pub async fn extract_links(&self, text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        collect_direct(&self.config, text, &mut seen, &mut result);

        let mut hops = HashSet::new();
        for m in self.config.redirector_link.find_iter(text) {
            let link = m.as_str();
            if !hops.insert(link.to_ascii_lowercase()) {
                continue;
            }
            match self.follow(link).await {
                Ok(body) => collect_direct(&self.config, &body, &mut seen, &mut result),
                Err(e) => log::warn!("Skipping redirector {link}: {e}"),
            }
        }

        result
    }

    async fn follow(&self, link: &str) -> Result<String> {
        let url = redirector_target(link);
        let page = self.http.get(&url).await?;
        if !page.is_ok() {
            return Err(Error::Fetch {
                url,
                reason: format!("status {}", page.status),
            });
        }
        Ok(page.body)
    }
}
