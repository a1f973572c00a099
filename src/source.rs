//! Blocking transport capabilities the adapters are bound to.
//!
//! [`HttpClient`] feeds the structured JSON source and [`Crawler`] feeds the
//! scraped HTML source. [`ReqwestClient`] provides both.

use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::Client;

use crate::error::{FetchError, FetchResult};

pub trait HttpClient: Send + Sync {
    /// Body of a successful GET, as text.
    fn get(&self, url: &str) -> FetchResult<String>;
}

pub trait Crawler: Send + Sync {
    /// HTML document served at `url`.
    fn crawl(&self, url: &str) -> FetchResult<String>;
}

impl<T: HttpClient + ?Sized> HttpClient for Arc<T> {
    fn get(&self, url: &str) -> FetchResult<String> {
        (**self).get(url)
    }
}

impl<T: Crawler + ?Sized> Crawler for Arc<T> {
    fn crawl(&self, url: &str) -> FetchResult<String> {
        (**self).crawl(url)
    }
}

#[derive(Clone)]
pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    pub fn new(timeout: Duration, user_agent: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    fn get_text(&self, url: &str) -> FetchResult<String> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| FetchError::request(url, err))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        response.text().map_err(|err| FetchError::decode(url, err))
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> FetchResult<String> {
        self.get_text(url)
    }
}

impl Crawler for ReqwestClient {
    fn crawl(&self, url: &str) -> FetchResult<String> {
        self.get_text(url)
    }
}
