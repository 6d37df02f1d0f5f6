//! HTTP abstraction for testability.

use async_trait::async_trait;

use crate::config::HttpConfig;
use crate::error::Result;

/// A fetched page: status code and decoded body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl Page {
    /// Creates a page from a status and body.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns `true` for a 200 response.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Abstraction over the two request shapes the hoster protocol needs.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Performs a GET request.
    async fn get(&self, url: &str) -> Result<Page>;

    /// POSTs a url-encoded form with a `Referer` header.
    async fn post_form(&self, url: &str, form: &[(&str, &str)], referer: &str) -> Result<Page>;
}

/// Default HTTP implementation backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    inner: reqwest::Client,
}

impl ReqwestClient {
    /// Builds a client from the HTTP settings.
    ///
    /// Redirects are not followed: a hoster answering 3xx reports that
    /// status to the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let inner = client_builder(config).build()?;
        Ok(Self { inner })
    }

    /// Wraps an existing `reqwest` client.
    #[must_use]
    pub const fn from_client(inner: reqwest::Client) -> Self {
        Self { inner }
    }
}

fn client_builder(config: &HttpConfig) -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.timeout())
        .redirect(reqwest::redirect::Policy::none())
}

async fn into_page(resp: reqwest::Response) -> Result<Page> {
    let status = resp.status().as_u16();
    let body = resp.text().await?;
    Ok(Page { status, body })
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, url: &str) -> Result<Page> {
        let resp = self.inner.get(url).send().await?;
        into_page(resp).await
    }

    async fn post_form(&self, url: &str, form: &[(&str, &str)], referer: &str) -> Result<Page> {
        let resp = self
            .inner
            .post(url)
            .header(reqwest::header::REFERER, referer)
            .form(form)
            .send()
            .await?;
        into_page(resp).await
    }
}
