//! CLI mode: scan text for hoster links and print direct download links.
//!
//! Human-readable output goes to stderr. Every resolved file is written to
//! stdout as `filename<TAB>url`, ready for an external download program.

mod progress;

use std::sync::Arc;

use tokio::io::AsyncReadExt;

use crate::{AppConfig, HosterConfig, LinkScanner, ReqwestClient, describe, match_release_names};

use progress::{CliProgress, make_spinner, print_groups, print_header};

/// Options understood by the CLI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOptions {
    /// Only list the groups, do not negotiate direct links.
    pub check_only: bool,
    /// Catalog release names used to rename the groups found.
    pub releases: Vec<String>,
    /// Text to scan for links.
    pub text: String,
}

impl CliOptions {
    /// Builds options from command-line arguments (program name excluded).
    ///
    /// Flags and their values are consumed; every other argument is
    /// scanned as text.
    #[must_use]
    pub fn from_args(args: &[String]) -> Self {
        let mut options = Self::default();
        let mut words = Vec::new();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "-c" | "--check" => options.check_only = true,
                "-r" | "--release" => {
                    if let Some(name) = iter.next() {
                        options.releases.push(name.clone());
                    }
                }
                flag if flag.starts_with('-') => {}
                word => words.push(word),
            }
        }
        options.text = words.join(" ");
        options
    }
}

/// Reads the text to scan from stdin.
async fn read_stdin() -> crate::Result<String> {
    let mut text = String::new();
    tokio::io::stdin().read_to_string(&mut text).await?;
    Ok(text)
}

/// Runs a scan with the given options.
///
/// When no text was given on the command line it is read from stdin.
///
/// # Errors
///
/// Returns an error if the configuration or the HTTP client cannot be set
/// up, or stdin cannot be read.
pub async fn run(options: CliOptions) -> crate::Result<()> {
    let config = AppConfig::load()?;
    let hoster = Arc::new(HosterConfig::uptobox()?);
    let http = Arc::new(ReqwestClient::new(&config.http)?);
    let scanner = LinkScanner::new(hoster, http);

    let text = if options.text.trim().is_empty() {
        read_stdin().await?
    } else {
        options.text
    };

    print_header("Boxgrab");

    let spinner = make_spinner("Scanning links...");
    let links = scanner.extractor().extract_links(&text).await;
    if links.is_empty() {
        spinner.finish_and_clear();
        eprintln!("No links");
        return Ok(());
    }
    spinner.set_message(format!("Checking {} link(s)...", links.len()));
    let groups = scanner.check_links(&links).await;
    spinner.finish_and_clear();

    let mut groups = match groups {
        Ok(groups) => groups,
        Err(e) => {
            log::error!("{}", describe(&e, Some("Couldn't check the given links."), true));
            eprintln!("No valid links");
            return Ok(());
        }
    };

    if groups.is_empty() {
        print_header("No results.");
        return Ok(());
    }
    if !options.releases.is_empty() {
        match_release_names(&mut groups, &options.releases);
    }
    print_groups(&groups);

    if options.check_only {
        return Ok(());
    }

    let progress = CliProgress;
    let mut resolved = 0usize;
    for file in groups.iter().flat_map(|g| &g.files) {
        eprintln!("Resolving {}", file.display_name);
        if let Some(url) = scanner.resolver().resolve(file, &progress).await {
            println!("{}\t{url}", file.display_name);
            resolved += 1;
        }
    }

    eprintln!("Done! {resolved} direct link(s).");
    Ok(())
}
