//! Direct-link negotiation with the hoster's wait queue.
//!
//! A negotiation POSTs the download form scraped by the prober and reads
//! the answer. The hoster either asks the client to wait, reports that the
//! countdown was skipped, or hands out a time-limited delivery URL. Waiting
//! and skipped countdowns loop back to a new submission with the same
//! tokens; three whole negotiations are attempted before the session is
//! thrown away, the file re-probed and everything tried once more.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::HosterConfig;
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::probe::{FileProber, FileRecord};
use crate::retry::attempt;

const NEGOTIATION_TRIES: u32 = 3;
const WAIT_DELAY: Duration = Duration::from_secs(60);
const COUNTDOWN_DELAY: Duration = Duration::from_secs(120);

/// Outcome of one form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Negotiation {
    /// The hoster wants the client to wait; carries its notice.
    Wait(String),
    /// The hoster noticed the countdown was skipped.
    CountdownSkipped,
    /// A delivery URL was handed out.
    Found(String),
    /// Neither a notice nor a well-formed delivery URL.
    MalformedResponse,
}

/// Classifies a negotiation response body.
#[must_use]
pub fn classify(config: &HosterConfig, body: &str) -> Negotiation {
    if let Some(notice) = config.wait_notice.captures(body).and_then(|c| c.get(1)) {
        return Negotiation::Wait(notice.as_str().to_string());
    }
    if config.skipped_countdown.is_match(body) {
        return Negotiation::CountdownSkipped;
    }

    let marker = config.delivery_marker();
    config
        .delivery_link
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .filter(|url| url.to_ascii_lowercase().contains(&marker))
        .map_or(Negotiation::MalformedResponse, |url| {
            Negotiation::Found(url.to_string())
        })
}

/// Suspends the negotiation between submissions.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Sleeps for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Sleeper backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Trait for receiving negotiation notices meant for the operator.
///
/// All methods have default no-op implementations.
pub trait ResolveProgress: Send + Sync {
    /// The hoster asked to wait; `notice` is its message.
    fn on_wait(&self, _notice: &str) {}

    /// The hoster reported a skipped countdown.
    fn on_countdown(&self) {}

    /// Negotiation failed and is restarted with a freshly probed session.
    fn on_new_session(&self, _url: &str) {}

    /// Negotiation failed for good and the file is skipped.
    fn on_give_up(&self, _url: &str) {}
}

/// A progress implementation that ignores all notices.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ResolveProgress for NoProgress {}

/// Negotiates direct download URLs for probed files.
pub struct DownloadLinkResolver<H: HttpClient, S: Sleeper = TokioSleeper> {
    config: Arc<HosterConfig>,
    http: Arc<H>,
    prober: FileProber<H>,
    sleeper: S,
}

impl<H: HttpClient> DownloadLinkResolver<H, TokioSleeper> {
    /// Creates a resolver that sleeps on the tokio timer.
    #[must_use]
    pub fn new(config: Arc<HosterConfig>, http: Arc<H>) -> Self {
        Self::with_sleeper(config, http, TokioSleeper)
    }
}

impl<H: HttpClient, S: Sleeper> DownloadLinkResolver<H, S> {
    /// Creates a resolver with a custom sleeper.
    #[must_use]
    pub fn with_sleeper(config: Arc<HosterConfig>, http: Arc<H>, sleeper: S) -> Self {
        let prober = FileProber::new(Arc::clone(&config), Arc::clone(&http));
        Self {
            config,
            http,
            prober,
            sleeper,
        }
    }

    /// Resolves the direct download URL for `file`.
    ///
    /// Returns `None` for dead files, and for files whose negotiation still
    /// fails after one retry with a freshly probed session.
    pub async fn resolve(
        &self,
        file: &FileRecord,
        progress: &dyn ResolveProgress,
    ) -> Option<String> {
        self.resolve_session(file, false, progress).await
    }

    async fn resolve_session(
        &self,
        file: &FileRecord,
        is_retry: bool,
        progress: &dyn ResolveProgress,
    ) -> Option<String> {
        if file.is_dead {
            return None;
        }

        let link = attempt(NEGOTIATION_TRIES, || self.negotiate(file, progress))
            .await
            .filter(|url| !url.is_empty());
        if link.is_some() {
            return link;
        }

        if is_retry {
            log::warn!("{}: skipping, servers might be down", file.url);
            progress.on_give_up(&file.url);
            return None;
        }

        log::info!("{}: trying again with a new download session", file.url);
        progress.on_new_session(&file.url);
        match self.prober.probe(&file.url).await {
            Ok(fresh) if fresh.is_dead => {
                log::warn!("{}: link died during negotiation, skipping", file.url);
                progress.on_give_up(&file.url);
                None
            }
            Ok(fresh) => Box::pin(self.resolve_session(&fresh, true, progress)).await,
            Err(e) => {
                log::warn!("{}: re-probe failed: {e}", file.url);
                progress.on_give_up(&file.url);
                None
            }
        }
    }

    /// Submits the download form until the hoster stops asking to wait.
    async fn negotiate(&self, file: &FileRecord, progress: &dyn ResolveProgress) -> Result<String> {
        let form = [
            ("rand", file.rand_token.as_str()),
            ("op", "download2"),
            ("id", file.id.as_str()),
            ("referer", ""),
            ("method_free", ""),
            ("method_premium", ""),
            ("down_direct", "1"),
            ("fname", file.form_token.as_str()),
        ];

        loop {
            let page = self.http.post_form(&file.url, &form, &file.url).await?;
            match classify(&self.config, &page.body) {
                Negotiation::Wait(notice) => {
                    log::info!("{}: {notice}", file.url);
                    progress.on_wait(&notice);
                    self.sleeper.sleep(WAIT_DELAY).await;
                }
                Negotiation::CountdownSkipped => {
                    log::info!("{}: waiting for countdown", file.url);
                    progress.on_countdown();
                    self.sleeper.sleep(COUNTDOWN_DELAY).await;
                }
                Negotiation::Found(url) => return Ok(url),
                Negotiation::MalformedResponse => {
                    return Err(Error::Negotiation(format!(
                        "couldn't get direct link for {}",
                        file.url
                    )));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::http::testing::{Reply, ScriptedHttp};
    use crate::probe::fixtures::hoster_page;

    const URL: &str = "http://uptobox.com/aaaaaaaaaaaa";
    const WAIT: &str = "<p>You have to wait 2 minutes till next download<br></p>";
    const SKIPPED: &str = "<p>Skipped countdown</p>";
    const FOUND: &str = r#"<a href="http://www42.uptobox.com/d/abcd/a.mkv">Download</a>"#;
    const FOUND_FRESH: &str = r#"<a href="http://www7.uptobox.com/d/fresh/a.mkv">Download</a>"#;

    #[derive(Default)]
    struct RecordingSleeper(Mutex<Vec<Duration>>);

    impl RecordingSleeper {
        fn slept(&self) -> Vec<Duration> {
            self.0.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.0.lock().unwrap().push(duration);
        }
    }

    #[async_trait]
    impl Sleeper for Arc<RecordingSleeper> {
        async fn sleep(&self, duration: Duration) {
            self.as_ref().sleep(duration).await;
        }
    }

    #[derive(Default)]
    struct RecordingProgress(Mutex<Vec<String>>);

    impl RecordingProgress {
        fn events(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    impl ResolveProgress for RecordingProgress {
        fn on_wait(&self, notice: &str) {
            self.0.lock().unwrap().push(format!("wait: {notice}"));
        }
        fn on_countdown(&self) {
            self.0.lock().unwrap().push("countdown".to_string());
        }
        fn on_new_session(&self, _url: &str) {
            self.0.lock().unwrap().push("new session".to_string());
        }
        fn on_give_up(&self, _url: &str) {
            self.0.lock().unwrap().push("give up".to_string());
        }
    }

    fn config() -> Arc<HosterConfig> {
        Arc::new(HosterConfig::uptobox().unwrap())
    }

    fn file() -> FileRecord {
        FileRecord {
            url: URL.to_string(),
            id: "aaaaaaaaaaaa".to_string(),
            rand_token: "r4nd".to_string(),
            form_token: "a.mkv".to_string(),
            display_name: "a.mkv".to_string(),
            base_name: "a".to_string(),
            is_dead: false,
            size_bytes: 1024,
        }
    }

    fn resolver(
        http: ScriptedHttp,
    ) -> (
        DownloadLinkResolver<ScriptedHttp, Arc<RecordingSleeper>>,
        Arc<ScriptedHttp>,
        Arc<RecordingSleeper>,
    ) {
        let http = Arc::new(http);
        let sleeper = Arc::new(RecordingSleeper::default());
        let resolver =
            DownloadLinkResolver::with_sleeper(config(), Arc::clone(&http), Arc::clone(&sleeper));
        (resolver, http, sleeper)
    }

    #[test]
    fn classify_responses() {
        let config = config();
        assert_eq!(
            classify(&config, WAIT),
            Negotiation::Wait("You have to wait 2 minutes till next download".to_string())
        );
        assert_eq!(classify(&config, SKIPPED), Negotiation::CountdownSkipped);
        assert_eq!(
            classify(&config, FOUND),
            Negotiation::Found("http://www42.uptobox.com/d/abcd/a.mkv".to_string())
        );
        assert_eq!(
            classify(&config, "<html>nothing here</html>"),
            Negotiation::MalformedResponse
        );
        assert_eq!(
            classify(&config, r#"<a href="http://www42.uptobox.com/x/abcd">"#),
            Negotiation::MalformedResponse
        );
    }

    #[tokio::test]
    async fn dead_file_resolves_to_none_without_requests() {
        let (resolver, http, _) = resolver(ScriptedHttp::new());
        let link = resolver.resolve(&FileRecord::dead(URL), &NoProgress).await;
        assert_eq!(link, None);
        assert!(http.posted().is_empty());
    }

    #[tokio::test]
    async fn wait_loop_sleeps_then_finds_link() {
        let (resolver, http, sleeper) = resolver(
            ScriptedHttp::new()
                .on_post(Reply::ok(WAIT))
                .on_post(Reply::ok(WAIT))
                .on_post(Reply::ok(FOUND)),
        );
        let progress = RecordingProgress::default();

        let link = resolver.resolve(&file(), &progress).await;
        assert_eq!(link.as_deref(), Some("http://www42.uptobox.com/d/abcd/a.mkv"));
        assert_eq!(sleeper.slept(), vec![WAIT_DELAY, WAIT_DELAY]);
        assert_eq!(http.posted().len(), 3);
        assert_eq!(progress.events().len(), 2);
        assert!(progress.events()[0].starts_with("wait: You have to wait"));
    }

    #[tokio::test]
    async fn skipped_countdown_sleeps_longer() {
        let (resolver, _, sleeper) = resolver(
            ScriptedHttp::new()
                .on_post(Reply::ok(SKIPPED))
                .on_post(Reply::ok(FOUND)),
        );

        let link = resolver.resolve(&file(), &NoProgress).await;
        assert!(link.is_some());
        assert_eq!(sleeper.slept(), vec![COUNTDOWN_DELAY]);
    }

    #[tokio::test]
    async fn form_carries_session_tokens() {
        let (resolver, http, _) = resolver(ScriptedHttp::new().on_post(Reply::ok(FOUND)));
        resolver.resolve(&file(), &NoProgress).await;

        let posted = http.posted();
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0].url, URL);
        assert_eq!(posted[0].referer, URL);
        let field = |name: &str| {
            posted[0]
                .form
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
        };
        assert_eq!(field("rand").as_deref(), Some("r4nd"));
        assert_eq!(field("op").as_deref(), Some("download2"));
        assert_eq!(field("id").as_deref(), Some("aaaaaaaaaaaa"));
        assert_eq!(field("referer").as_deref(), Some(""));
        assert_eq!(field("down_direct").as_deref(), Some("1"));
        assert_eq!(field("fname").as_deref(), Some("a.mkv"));
    }

    #[tokio::test]
    async fn malformed_answers_retry_then_new_session() {
        let http = ScriptedHttp::new()
            .on_post(Reply::ok("busy"))
            .on_post(Reply::ok("busy"))
            .on_post(Reply::ok("busy"))
            .on_post(Reply::ok(FOUND_FRESH))
            .on_get(URL, Reply::ok(&hoster_page("fresh", "a.mkv", "1 KB")));
        let (resolver, http, _) = resolver(http);
        let progress = RecordingProgress::default();

        let link = resolver.resolve(&file(), &progress).await;
        assert_eq!(link.as_deref(), Some("http://www7.uptobox.com/d/fresh/a.mkv"));
        assert_eq!(http.get_count(URL), 1);

        let posted = http.posted();
        assert_eq!(posted.len(), 4);
        assert!(posted[3].form.contains(&("rand".to_string(), "fresh".to_string())));
        assert_eq!(progress.events(), vec!["new session"]);
    }

    #[tokio::test]
    async fn gives_up_after_second_session() {
        let http = ScriptedHttp::new()
            .on_post(Reply::Fail("reset".to_string()))
            .on_get(URL, Reply::ok(&hoster_page("fresh", "a.mkv", "1 KB")));
        let (resolver, http, _) = resolver(http);
        let progress = RecordingProgress::default();

        let link = resolver.resolve(&file(), &progress).await;
        assert_eq!(link, None);
        assert_eq!(http.posted().len(), 6);
        assert_eq!(http.get_count(URL), 1);
        assert_eq!(progress.events(), vec!["new session", "give up"]);
    }

    #[tokio::test]
    async fn dead_on_reprobe_stops() {
        let http = ScriptedHttp::new()
            .on_post(Reply::ok("busy"))
            .on_get(URL, Reply::status(404));
        let (resolver, http, _) = resolver(http);
        let progress = RecordingProgress::default();

        assert_eq!(resolver.resolve(&file(), &progress).await, None);
        assert_eq!(http.posted().len(), 3);
        assert_eq!(http.get_count(URL), 1);
        assert_eq!(progress.events(), vec!["new session", "give up"]);
    }

    #[tokio::test]
    async fn failed_reprobe_gives_up() {
        let http = ScriptedHttp::new().on_post(Reply::ok("busy"));
        let (resolver, http, _) = resolver(http);
        let progress = RecordingProgress::default();

        assert_eq!(resolver.resolve(&file(), &progress).await, None);
        assert_eq!(http.get_count(URL), 3);
        assert_eq!(progress.events(), vec!["new session", "give up"]);
    }
}
