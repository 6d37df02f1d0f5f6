//! Hoster page probing: liveness, size, filename and form tokens.

use std::sync::Arc;

use crate::config::HosterConfig;
use crate::error::{Error, Result};
use crate::format::parse_size;
use crate::http::{HttpClient, Page};
use crate::retry::attempt_or_raise;

/// Sentinel used for the tokens and filename of a dead link.
pub const DEAD: &str = "DEAD";

const PROBE_TRIES: u32 = 3;

/// One probed hoster entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Hoster page URL.
    pub url: String,
    /// Hoster file identifier, the last path segment of `url`.
    pub id: String,
    /// Value of the hidden `rand` form field.
    pub rand_token: String,
    /// Value of the hidden `fname` form field, as sent back when negotiating.
    pub form_token: String,
    /// Filename as reported by the hoster, without service branding.
    pub display_name: String,
    /// `display_name` without extension and multi-part suffix.
    pub base_name: String,
    /// The hoster did not answer with a 200.
    pub is_dead: bool,
    /// File size in bytes.
    pub size_bytes: u64,
}

impl FileRecord {
    /// Creates the record of a link the hoster no longer serves.
    #[must_use]
    pub fn dead(url: &str) -> Self {
        Self {
            url: url.to_string(),
            id: file_id(url),
            rand_token: DEAD.to_string(),
            form_token: DEAD.to_string(),
            display_name: DEAD.to_string(),
            base_name: String::new(),
            is_dead: true,
            size_bytes: 0,
        }
    }
}

fn file_id(url: &str) -> String {
    url.rsplit('/').next().unwrap_or_default().to_string()
}

/// Strips the extension from `filename`, and the `partNN` segment too when
/// one is left behind.
///
/// `Show.S01E01.part1.rar` becomes `Show.S01E01`, `Movie.2020.mkv` becomes
/// `Movie.2020`.
#[must_use]
pub fn base_name(filename: &str) -> String {
    let strip = |name: &str| name.rsplit_once('.').map_or("", |(head, _)| head).to_string();

    let base = strip(filename);
    if ends_with_part_number(&base) {
        strip(&base)
    } else {
        base
    }
}

fn ends_with_part_number(name: &str) -> bool {
    let digits = name.trim_end_matches(|c: char| c.is_ascii_digit());
    digits.len() < name.len() && digits.ends_with("part")
}

fn first_capture(re: &regex::Regex, body: &str) -> Option<String> {
    re.captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Extracts a [`FileRecord`] from a fetched hoster page.
///
/// Missing fields degrade to empty strings or zero instead of failing.
#[must_use]
pub fn parse_page(config: &HosterConfig, url: &str, page: &Page) -> FileRecord {
    if !page.is_ok() {
        return FileRecord::dead(url);
    }

    let body = &page.body;
    let rand_token = first_capture(&config.rand_field, body).unwrap_or_default();
    let form_token = first_capture(&config.fname_field, body).unwrap_or_default();
    let size = first_capture(&config.size_annotation, body);
    let display_name = config.branding.replace_all(&form_token, "").into_owned();

    if rand_token.is_empty() || form_token.is_empty() || size.is_none() {
        log::debug!("{url}: incomplete hoster page");
    }

    FileRecord {
        url: url.to_string(),
        id: file_id(url),
        rand_token,
        base_name: base_name(&display_name),
        form_token,
        display_name,
        is_dead: false,
        size_bytes: parse_size(size.as_deref()),
    }
}

/// Fetches hoster pages and turns them into [`FileRecord`]s.
pub struct FileProber<H: HttpClient> {
    config: Arc<HosterConfig>,
    http: Arc<H>,
}

impl<H: HttpClient> Clone for FileProber<H> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            http: Arc::clone(&self.http),
        }
    }
}

impl<H: HttpClient> FileProber<H> {
    /// Creates a prober sharing the given configuration and HTTP client.
    #[must_use]
    pub const fn new(config: Arc<HosterConfig>, http: Arc<H>) -> Self {
        Self { config, http }
    }

    /// Probes one hoster page.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Probe`] if the page could not be fetched in three
    /// attempts. A non-200 answer is not an error: it yields a dead record.
    pub async fn probe(&self, url: &str) -> Result<FileRecord> {
        let http = &self.http;
        let page = attempt_or_raise(PROBE_TRIES, || http.get(url))
            .await
            .map_err(|e| Error::Probe {
                url: url.to_string(),
                source: Box::new(e),
            })?
            .ok_or_else(|| Error::Probe {
                url: url.to_string(),
                source: Box::new(Error::Fetch {
                    url: url.to_string(),
                    reason: "no attempt made".to_string(),
                }),
            })?;

        let file = parse_page(&self.config, url, &page);
        if file.is_dead {
            log::warn!("{url} - Dead link");
        } else {
            log::debug!("{url} - {} ({} bytes)", file.display_name, file.size_bytes);
        }
        Ok(file)
    }

    /// Probes every URL that is a direct hoster link, in order.
    ///
    /// URLs that do not match the hoster pattern are skipped.
    ///
    /// # Errors
    ///
    /// Returns the first probe failure.
    pub async fn probe_all<S: AsRef<str>>(&self, urls: &[S]) -> Result<Vec<FileRecord>> {
        let mut files = Vec::with_capacity(urls.len());
        for url in urls.iter().map(AsRef::as_ref) {
            if !self.config.is_direct_link(url) {
                log::debug!("Skipping {url}: not a {} link", self.config.name());
                continue;
            }
            files.push(self.probe(url).await?);
        }
        Ok(files)
    }
}
