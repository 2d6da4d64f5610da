//! Blocking HTTP helper shared by the feed, image download, host and publisher.
//!
//! Every request carries the configured user agent. Timeouts come from the
//! client configuration; there is no retry layer.

use std::time::Duration;
use thiserror::Error;

/// Browser-like user agent; the feed rejects default library agents.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/103.0.0.0 Safari/537.36";

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP {status} from {url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },
    #[error("malformed payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// Downloads raw image bytes.
pub trait ImageFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Thin wrapper around `reqwest::blocking::Client`.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::blocking::Client,
}

impl HttpClient {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let inner = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { inner })
    }

    /// GET `url` with query parameters and return the body as text.
    pub fn get_text(&self, url: &str, query: &[(&str, &str)]) -> Result<String, FetchError> {
        let resp = self.inner.get(url).query(query).send()?;
        let resp = check_status(url, resp)?;
        Ok(resp.text()?)
    }

    pub fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let resp = self.inner.get(url).send()?;
        let resp = check_status(url, resp)?;
        Ok(resp.bytes()?.to_vec())
    }

    /// POST with parameters in the query string and an empty body.
    pub fn post_query(&self, url: &str, query: &[(&str, &str)]) -> Result<String, FetchError> {
        let resp = self.inner.post(url).query(query).send()?;
        let resp = check_status(url, resp)?;
        Ok(resp.text()?)
    }

    /// POST a url-encoded form with an optional `Authorization` header.
    pub fn post_form(
        &self,
        url: &str,
        authorization: Option<&str>,
        form: &[(&str, &str)],
    ) -> Result<String, FetchError> {
        let mut req = self.inner.post(url).form(form);
        if let Some(auth) = authorization {
            req = req.header(reqwest::header::AUTHORIZATION, auth);
        }
        let resp = check_status(url, req.send()?)?;
        Ok(resp.text()?)
    }
}

impl ImageFetcher for HttpClient {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.get_bytes(url)
    }
}

fn check_status(
    url: &str,
    resp: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response, FetchError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    Err(FetchError::Status {
        status: status.as_u16(),
        url: url.to_string(),
        body,
    })
}
