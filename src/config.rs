//! Configuration types for hoster scanning and HTTP access.

use std::path::{Path, PathBuf};
use std::time::Duration;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Service branding appended to filenames by the source site, stored
/// reversed so the plain name never appears in the binary.
const BRANDING_REVERSED: &str = r"?_?))looc|skcor|gro|ten:?(.\:?(yellavldd?_";

/// Immutable description of the supported hoster and its page patterns.
///
/// Built once and shared by every component through an `Arc`.
#[derive(Debug, Clone)]
pub struct HosterConfig {
    name: String,
    host: String,
    redirector_host: String,
    pub(crate) direct_link: Regex,
    pub(crate) redirector_link: Regex,
    pub(crate) rand_field: Regex,
    pub(crate) fname_field: Regex,
    pub(crate) size_annotation: Regex,
    pub(crate) branding: Regex,
    pub(crate) wait_notice: Regex,
    pub(crate) skipped_countdown: Regex,
    pub(crate) delivery_link: Regex,
}

fn build(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| Error::Config(format!("invalid pattern {pattern:?}: {e}")))
}

impl HosterConfig {
    /// Compiles the patterns for a hoster and its redirector.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a host name produces an invalid pattern.
    pub fn new(name: &str, host: &str, redirector_host: &str) -> Result<Self> {
        let h = regex::escape(host);
        let r = regex::escape(redirector_host);
        let branding: String = BRANDING_REVERSED.chars().rev().collect();

        Ok(Self {
            name: name.to_string(),
            host: host.to_string(),
            redirector_host: redirector_host.to_string(),
            direct_link: build(&format!(r"https?://(?:www\.)?{h}/[a-z\d]{{12}}"))?,
            redirector_link: build(&format!(r"{r}/dl/[a-z\d]{{12,14}}"))?,
            rand_field: build(r#"(?s)['"]rand['"] value=['"](.*?)['"]"#)?,
            fname_field: build(r#"(?s)['"]fname['"] value=['"](.*?)['"]"#)?,
            size_annotation: build(r"(?s)para_title.*?\(\s*(.*?)\s*\)")?,
            branding: build(&branding)?,
            wait_notice: build(r"(You have to wait.*?)<br")?,
            skipped_countdown: build(r"Skipped countdown")?,
            delivery_link: build(&format!(r#"(https?://.{{1,10}}\.{h}/d/.*?)['"]"#))?,
        })
    }

    /// Configuration for UpToBox links reached directly or through go4up.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a pattern fails to compile.
    pub fn uptobox() -> Result<Self> {
        Self::new("UpToBox", "uptobox.com", "go4up.com")
    }

    /// Hoster name reported on groups.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Hoster host name, without `www.`.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Redirector host name.
    #[must_use]
    pub fn redirector_host(&self) -> &str {
        &self.redirector_host
    }

    /// Returns `true` if `url` contains a direct hoster link.
    #[must_use]
    pub fn is_direct_link(&self, url: &str) -> bool {
        self.direct_link.is_match(url)
    }

    /// Marker that every delivery URL must contain.
    #[must_use]
    pub fn delivery_marker(&self) -> String {
        format!("{}/d/", self.host.to_ascii_lowercase())
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// User agent sent with every request.
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: concat!("boxgrab/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpConfig {
    /// Returns the request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP settings.
    pub http: HttpConfig,
}

impl AppConfig {
    /// Creates a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the request timeout in seconds.
    #[must_use]
    pub const fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.http.timeout_secs = secs;
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.http.user_agent = user_agent.into();
        self
    }

    /// Default location of the configuration file.
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("boxgrab")
            .join("config.toml")
    }

    /// Loads configuration from `path`, falling back to defaults when the
    /// file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Loads configuration from the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }
}
