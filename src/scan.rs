//! Link scanning façade: extraction, probing and grouping in one place.

use std::sync::Arc;

use crate::config::HosterConfig;
use crate::error::Result;
use crate::extract::LinkExtractor;
use crate::group::{Group, group_files};
use crate::http::HttpClient;
use crate::probe::FileProber;
use crate::resolve::{DownloadLinkResolver, ResolveProgress, Sleeper, TokioSleeper};

/// What an external download executor needs to fetch one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    /// Filename to save as.
    pub filename: String,
    /// Time-limited direct URL.
    pub url: String,
}

/// Turns text or link lists into release groups and direct links.
pub struct LinkScanner<H: HttpClient, S: Sleeper = TokioSleeper> {
    config: Arc<HosterConfig>,
    extractor: LinkExtractor<H>,
    prober: FileProber<H>,
    resolver: DownloadLinkResolver<H, S>,
}

impl<H: HttpClient> LinkScanner<H, TokioSleeper> {
    /// Creates a scanner whose resolver sleeps on the tokio timer.
    #[must_use]
    pub fn new(config: Arc<HosterConfig>, http: Arc<H>) -> Self {
        Self::with_sleeper(config, http, TokioSleeper)
    }
}

impl<H: HttpClient, S: Sleeper> LinkScanner<H, S> {
    /// Creates a scanner with a custom sleeper for the resolver.
    #[must_use]
    pub fn with_sleeper(config: Arc<HosterConfig>, http: Arc<H>, sleeper: S) -> Self {
        Self {
            extractor: LinkExtractor::new(Arc::clone(&config), Arc::clone(&http)),
            prober: FileProber::new(Arc::clone(&config), Arc::clone(&http)),
            resolver: DownloadLinkResolver::with_sleeper(Arc::clone(&config), http, sleeper),
            config,
        }
    }

    /// Returns the link extractor.
    #[must_use]
    pub const fn extractor(&self) -> &LinkExtractor<H> {
        &self.extractor
    }

    /// Returns the direct-link resolver.
    #[must_use]
    pub const fn resolver(&self) -> &DownloadLinkResolver<H, S> {
        &self.resolver
    }

    /// Probes `links` and groups the results into releases.
    ///
    /// # Errors
    ///
    /// Returns the first probe that failed on every attempt.
    pub async fn check_links<L: AsRef<str>>(&self, links: &[L]) -> Result<Vec<Group>> {
        let files = self.prober.probe_all(links).await?;
        let groups = group_files(&files, self.config.name());
        log::info!(
            "Checked {} link(s): {} file(s) in {} group(s)",
            links.len(),
            files.len(),
            groups.len()
        );
        Ok(groups)
    }

    /// Extracts links from `text`, then probes and groups them.
    ///
    /// # Errors
    ///
    /// Returns the first probe that failed on every attempt.
    pub async fn scan_text(&self, text: &str) -> Result<Vec<Group>> {
        let links = self.extractor.extract_links(text).await;
        self.check_links(&links).await
    }

    /// Probes a single link and negotiates its direct URL.
    ///
    /// Entry point for download executors that hold one hoster link and
    /// skip the scan and grouping steps. Returns `Ok(None)` for dead links
    /// and for links whose negotiation gave up.
    ///
    /// # Errors
    ///
    /// Returns an error if the link could not be probed.
    pub async fn download(
        &self,
        url: &str,
        progress: &dyn ResolveProgress,
    ) -> Result<Option<DownloadJob>> {
        let file = self.prober.probe(url).await?;
        if file.is_dead {
            return Ok(None);
        }
        Ok(self
            .resolver
            .resolve(&file, progress)
            .await
            .map(|url| DownloadJob {
                filename: file.display_name.clone(),
                url,
            }))
    }
}
