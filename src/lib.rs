//! boxgrab - find, check and unlock file-hoster links.
//!
//! This library scans free text for hoster links (following one hop through
//! a redirector), probes each hoster page for liveness and download
//! metadata, groups multi-part archives into releases and negotiates the
//! time-limited direct link through the hoster's wait queue.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use boxgrab::{HosterConfig, HttpConfig, LinkScanner, NoProgress, ReqwestClient};
//!
//! # async fn example() -> boxgrab::Result<()> {
//! let hoster = Arc::new(HosterConfig::uptobox()?);
//! let http = Arc::new(ReqwestClient::new(&HttpConfig::default())?);
//! let scanner = LinkScanner::new(hoster, http);
//!
//! let groups = scanner.scan_text("see http://uptobox.com/hrfow01yixy4").await?;
//! for group in &groups {
//!     for file in &group.files {
//!         if let Some(url) = scanner.resolver().resolve(file, &NoProgress).await {
//!             println!("{}\t{url}", file.display_name);
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod config;
pub mod error;
pub mod extract;
pub mod format;
pub mod group;
pub mod http;
pub mod probe;
pub mod resolve;
pub mod retry;
pub mod scan;

#[cfg(feature = "cli")]
pub mod cli;

// Re-export main types for convenience
pub use config::{AppConfig, HosterConfig, HttpConfig};
pub use error::{Error, Result, describe};
pub use extract::{LinkExtractor, scan_direct_links};
pub use format::{bytes_of, format_bytes, parse_size};
pub use group::{Group, group_files, match_release_names};
pub use http::{HttpClient, Page, ReqwestClient};
pub use probe::{DEAD, FileProber, FileRecord, base_name};
pub use resolve::{
    DownloadLinkResolver, Negotiation, NoProgress, ResolveProgress, Sleeper, TokioSleeper,
};
pub use retry::{attempt, attempt_or_raise};
pub use scan::{DownloadJob, LinkScanner};
