use std::collections::HashMap;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use tracing::debug;

use crate::config::PipelineConfig;
use crate::http_cache::fetch_text_cached;

const REQUEST_TIMEOUT_SECS: u64 = 30;
const USER_AGENT: &str = "nhl_dops/0.1 (dataset research)";

static CLIENT: OnceCell<Client> = OnceCell::new();

pub fn http_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build http client")
    })
}

/// Anything that can hand back the body of a page by URL.
///
/// The pipeline stages only talk to this trait so that tests can feed them
/// canned HTML/JSON instead of the network.
pub trait PageSource {
    fn fetch(&mut self, url: &str) -> Result<String>;
}

/// Enforces a fixed pause between successive requests.
#[derive(Debug)]
pub struct Pacer {
    delay: Duration,
    last: Option<Instant>,
}

impl Pacer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, last: None }
    }

    pub fn wait(&mut self) {
        if let Some(last) = self.last {
            let elapsed = last.elapsed();
            if elapsed < self.delay {
                thread::sleep(self.delay - elapsed);
            }
        }
        self.last = Some(Instant::now());
    }
}

pub struct HttpSource {
    client: &'static Client,
    pacer: Pacer,
    use_cache: bool,
}

impl HttpSource {
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            pacer: Pacer::new(config.request_delay),
            use_cache: config.use_http_cache,
        })
    }
}

impl PageSource for HttpSource {
    fn fetch(&mut self, url: &str) -> Result<String> {
        self.pacer.wait();
        debug!(url, "fetching");
        if self.use_cache {
            return fetch_text_cached(self.client, url);
        }
        let resp = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("request failed: {url}"))?;
        let status = resp.status();
        let body = resp.text().context("failed reading body")?;
        if !status.is_success() {
            return Err(anyhow!("http {status} for {url}"));
        }
        Ok(body)
    }
}

/// In-memory pages keyed by URL, for offline runs and tests.
#[derive(Debug, Default, Clone)]
pub struct StaticSource {
    pages: HashMap<String, String>,
    requested: Vec<String>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.pages.insert(url.into(), body.into());
        self
    }

    /// URLs requested so far, in order.
    pub fn requested(&self) -> &[String] {
        &self.requested
    }
}

impl PageSource for StaticSource {
    fn fetch(&mut self, url: &str) -> Result<String> {
        self.requested.push(url.to_string());
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("http 404 Not Found for {url}"))
    }
}
