use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::{self, HeaderMap, HeaderValue};
use url::Url;

use crate::types::{CookieSet, FetchResult};

const USER_AGENTS: [&str; 5] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:123.0) Gecko/20100101 Firefox/123.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
];

const REFERERS: [&str; 4] = [
    "https://www.google.com/",
    "https://www.bing.com/",
    "https://www.linkedin.com/feed/",
    "https://www.linkedin.com/jobs/",
];

const ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

const LOGIN_MARKERS: [&str; 2] = ["Sign in", "/login"];

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] header::InvalidHeaderValue),
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Failed to fetch {url} after {attempts} attempt(s)")]
    RetriesExhausted { url: String, attempts: u32 },
    #[error("Received a login page instead of {url}; cookie authentication failed")]
    LoginPage { url: String },
}

/// One outgoing GET with its client-identifying headers already chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest<'a> {
    pub url: &'a str,
    pub user_agent: &'static str,
    pub referer: Option<&'static str>,
    pub cookies: &'a CookieSet,
}

impl<'a> PageRequest<'a> {
    /// Picks a user agent uniformly from the pool and attaches a referer half of the time.
    pub fn randomized(url: &'a str, cookies: &'a CookieSet) -> Self {
        let referer = fastrand::bool().then(|| REFERERS[fastrand::usize(..REFERERS.len())]);
        Self {
            url,
            user_agent: USER_AGENTS[fastrand::usize(..USER_AGENTS.len())],
            referer,
            cookies,
        }
    }
}

pub trait Transport {
    fn send(
        &self,
        request: &PageRequest<'_>,
    ) -> impl Future<Output = Result<FetchResult, TransportError>>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers(browser_headers())
            .build()?;

        Ok(Self { client })
    }
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT));
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.5"),
    );
    headers.insert(header::DNT, HeaderValue::from_static("1"));
    headers.insert(
        header::UPGRADE_INSECURE_REQUESTS,
        HeaderValue::from_static("1"),
    );
    headers.insert("sec-fetch-dest", HeaderValue::from_static("document"));
    headers.insert("sec-fetch-mode", HeaderValue::from_static("navigate"));
    headers.insert("sec-fetch-site", HeaderValue::from_static("none"));
    headers.insert("sec-fetch-user", HeaderValue::from_static("?1"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
    headers
}

impl Transport for ReqwestTransport {
    async fn send(&self, request: &PageRequest<'_>) -> Result<FetchResult, TransportError> {
        let mut builder = self
            .client
            .get(request.url)
            .header(header::USER_AGENT, request.user_agent);
        if let Some(referer) = request.referer {
            builder = builder.header(header::REFERER, referer);
        }
        if let Some(cookie) = request.cookies.header_value() {
            builder = builder.header(header::COOKIE, HeaderValue::from_str(&cookie)?);
        }

        let response = builder
            .send()
            .await
            .inspect_err(|e| log::error!("HTTP error: {e:?}"))?;
        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = response
            .text()
            .await
            .inspect_err(|e| log::error!("Decode error: {e:?}"))?;

        Ok(FetchResult {
            status,
            body,
            final_url,
        })
    }
}

/// Bounded, fixed-delay retry settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    /// Total number of requests the fetcher will make; never less than one.
    pub fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }
}

/// True when a page body looks like the site's sign-in page.
pub fn looks_like_login_page(body: &str) -> bool {
    LOGIN_MARKERS.iter().all(|marker| body.contains(marker))
}

#[derive(Debug, Clone)]
pub struct PageFetcher<T = ReqwestTransport> {
    transport: T,
    policy: RetryPolicy,
    verbose: bool,
}

impl PageFetcher<ReqwestTransport> {
    pub fn new(policy: RetryPolicy) -> Result<Self, TransportError> {
        Ok(Self::with_transport(ReqwestTransport::new()?, policy))
    }
}

impl<T: Transport> PageFetcher<T> {
    pub fn with_transport(transport: T, policy: RetryPolicy) -> Self {
        Self {
            transport,
            policy,
            verbose: true,
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn fetch(&self, url: &str, cookies: &CookieSet) -> Result<FetchResult, FetchError> {
        let domain = Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| url.to_string());
        let attempts = self.policy.attempts();

        for attempt in 1..=attempts {
            if attempt > 1 {
                if self.verbose {
                    log::info!(
                        "Waiting {:.2} seconds before attempt {}/{}",
                        self.policy.delay.as_secs_f64(),
                        attempt,
                        attempts
                    );
                }
                tokio::time::sleep(self.policy.delay).await;
            }

            let request = PageRequest::randomized(url, cookies);
            if self.verbose {
                log::info!("Fetching {} (attempt {}/{})", url, attempt, attempts);
                if !cookies.is_empty() {
                    log::info!("Using {} authentication cookies", cookies.len());
                }
            }

            match self.transport.send(&request).await {
                Ok(page) if page.is_success() => {
                    if looks_like_login_page(&page.body) {
                        log::warn!(
                            "Got status {} from {} but the body is a login page",
                            page.status,
                            domain
                        );
                        return Err(FetchError::LoginPage { url: url.into() });
                    }
                    if self.verbose {
                        log::info!(
                            "Successfully fetched {} - {} bytes",
                            domain,
                            page.body.len()
                        );
                    }
                    return Ok(page);
                }
                Ok(page) if matches!(page.status, 403 | 429) => {
                    log::warn!("Blocked by {}: status code {}", domain, page.status);
                }
                Ok(page) => {
                    log::warn!("Failed to fetch {}: status code {}", domain, page.status);
                }
                Err(e) => {
                    log::error!("Error fetching {}: {}", domain, e);
                }
            }
        }

        log::error!("Failed to fetch {} after {} attempt(s)", url, attempts);
        Err(FetchError::RetriesExhausted {
            url: url.into(),
            attempts,
        })
    }
}
