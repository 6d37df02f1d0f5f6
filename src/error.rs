//! Error types for the boxgrab library.

use std::error::Error as _;
use std::fmt::Write as _;

use thiserror::Error;

/// Errors that can occur while scanning, probing or resolving hoster links.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A fetch completed but could not be used.
    #[error("Fetch failed for {url}: {reason}")]
    Fetch {
        /// URL that was requested.
        url: String,
        /// Why the response was rejected.
        reason: String,
    },

    /// Probing a hoster page failed on every attempt.
    #[error("Couldn't probe {url}")]
    Probe {
        /// URL of the hoster page.
        url: String,
        /// Last failure seen.
        #[source]
        source: Box<Error>,
    },

    /// The hoster answered but no usable direct link was found.
    #[error("Negotiation failed: {0}")]
    Negotiation(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be parsed.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Short name of the error kind, used in operator reports.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Http(_) => "Http",
            Self::Fetch { .. } => "Fetch",
            Self::Probe { .. } => "Probe",
            Self::Negotiation(_) => "Negotiation",
            Self::Config(_) => "Config",
            Self::Toml(_) => "Toml",
            Self::Io(_) => "Io",
        }
    }
}

/// A specialized `Result` type for boxgrab operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Renders an error for the operator log.
///
/// The report names the error kind, the optional additional message and the
/// error itself, followed by its first cause, or by the whole cause chain
/// when `full` is set.
#[must_use]
pub fn describe(err: &Error, context: Option<&str>, full: bool) -> String {
    let mut lines = Vec::new();
    if let Some(message) = context {
        lines.push(format!("*Additional message: {message}"));
    }
    lines.push(format!("*Error: {err}"));

    let mut causes = Vec::new();
    let mut source = err.source();
    while let Some(cause) = source {
        causes.push(cause.to_string());
        source = cause.source();
    }
    if let Some(first) = causes.first() {
        if full {
            let mut line = String::from("*Caused by:");
            for cause in &causes {
                let _ = write!(line, "\n\t{cause}");
            }
            lines.push(line);
        } else {
            lines.push(format!("*Caused by: {first}"));
        }
    }

    format!("Caught error: {} {{\n{}\n}}", err.kind(), lines.join("\n"))
}
