//! HTTP fetcher with a hard rate ceiling and charset-aware decoding
//!
//! This module provides the single outbound HTTP path used by both sources:
//! - User-Agent rotation
//! - Requests-per-second ceiling with governor
//! - Charset detection from the `Content-Type` header
//!
//! Retries are deliberately absent here. The pagination driver owns the
//! consecutive-failure budget, so one call is exactly one request.

use encoding_rs::{Encoding, UTF_8};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use rand::seq::SliceRandom;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, USER_AGENT},
    Client, Response,
};
use std::num::NonZeroU32;
use std::time::Duration;

use crate::config::HttpConfig;
use crate::utils::error::TransportError;

/// Pool of realistic User-Agent strings for rotation
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
];

/// A successfully fetched response body
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: String,
    pub body: String,
}

/// Outbound HTTP client shared by the HTML and XML sources
pub struct PageFetcher {
    /// HTTP client with configured timeout and compression
    client: Client,

    /// Rate limiter to cap request frequency
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,

    /// Fixed user agent; rotates when `None`
    user_agent: Option<String>,
}

impl PageFetcher {
    /// Create a new fetcher with default settings
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Http` if the HTTP client cannot be created
    pub fn new(requests_per_second: u32) -> Result<Self, TransportError> {
        Self::with_timeout(requests_per_second, Duration::from_secs(30))
    }

    /// Create a fetcher with an explicit request timeout
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Http` if the HTTP client cannot be created
    pub fn with_timeout(
        requests_per_second: u32,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .cookie_store(true)
            .build()?;

        Ok(Self::from_parts(client, requests_per_second, None))
    }

    /// Create a fetcher from the HTTP section of the configuration
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Http` if the HTTP client cannot be created
    pub fn from_config(config: &HttpConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .gzip(true)
            .cookie_store(config.enable_cookies)
            .build()?;

        Ok(Self::from_parts(
            client,
            config.max_requests_per_second,
            config.user_agent.clone(),
        ))
    }

    fn from_parts(client: Client, requests_per_second: u32, user_agent: Option<String>) -> Self {
        let rate = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_second(rate));

        Self {
            client,
            rate_limiter,
            user_agent,
        }
    }

    /// Fetch a URL and decode its body as text
    ///
    /// # Errors
    ///
    /// - `TransportError::InvalidUrl` for unparseable URLs
    /// - `TransportError::Timeout` when the request exceeds the client timeout
    /// - `TransportError::Status` for any non-2xx response
    /// - `TransportError::Decode` when the body cannot be decoded
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, TransportError> {
        let parsed =
            url::Url::parse(url).map_err(|e| TransportError::InvalidUrl(format!("{url}: {e}")))?;

        self.rate_limiter.until_ready().await;

        tracing::trace!(url = %parsed, "Sending request");

        let response = self
            .client
            .get(parsed)
            .headers(self.build_headers())
            .send()
            .await
            .map_err(TransportError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        let final_url = response.url().to_string();
        let body = self.decode_response(response).await?;

        Ok(FetchedPage {
            url: final_url,
            body,
        })
    }

    /// Decode response body honoring the declared charset
    async fn decode_response(&self, response: Response) -> Result<String, TransportError> {
        // Get Content-Type header and convert to owned String before consuming response
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .unwrap_or_default();

        let bytes = response.bytes().await.map_err(TransportError::from_reqwest)?;

        decode_bytes(&bytes, &content_type)
    }

    /// Build HTTP headers for a page request
    fn build_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        let agent = self
            .user_agent
            .as_deref()
            .and_then(|ua| HeaderValue::from_str(ua).ok())
            .unwrap_or_else(|| HeaderValue::from_static(random_user_agent()));
        headers.insert(USER_AGENT, agent);

        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.9"),
        );

        headers
    }
}

/// Get a random user agent from the pool
fn random_user_agent() -> &'static str {
    let mut rng = rand::thread_rng();
    USER_AGENTS.choose(&mut rng).copied().unwrap_or(USER_AGENTS[0])
}

/// Decode bytes to a UTF-8 string
///
/// Uses the `charset` parameter of `content_type` when it names a known
/// encoding, otherwise UTF-8. Malformed sequences are replaced rather than
/// rejected, except for an unknown non-UTF-8 label with undecodable bytes.
///
/// # Errors
///
/// Returns `TransportError::Decode` if the bytes are not valid in the
/// declared encoding and no fallback applies
pub fn decode_bytes(bytes: &[u8], content_type: &str) -> Result<String, TransportError> {
    let encoding = charset_label(content_type)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8);

    let (cow, _encoding, had_errors) = encoding.decode(bytes);

    if had_errors {
        if encoding == UTF_8 {
            tracing::debug!("Body contained invalid UTF-8, replacement characters inserted");
        } else {
            return Err(TransportError::Decode(format!(
                "invalid {} content",
                encoding.name()
            )));
        }
    }

    Ok(cow.into_owned())
}

fn charset_label(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .map(str::trim)
        .find_map(|part| {
            let (key, value) = part.split_once('=')?;
            key.trim()
                .eq_ignore_ascii_case("charset")
                .then(|| value.trim().trim_matches('"').to_ascii_lowercase())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_rotation() {
        let mut agents = std::collections::HashSet::new();
        for _ in 0..100 {
            let agent = random_user_agent();
            assert!(USER_AGENTS.contains(&agent));
            agents.insert(agent);
        }

        assert!(agents.len() > 1, "User agents should rotate");
    }

    #[test]
    fn test_fixed_user_agent() {
        let config = HttpConfig {
            user_agent: Some("review-harvester/0.1".to_string()),
            ..HttpConfig::default()
        };
        let fetcher = PageFetcher::from_config(&config).unwrap();
        let headers = fetcher.build_headers();
        assert_eq!(
            headers.get(USER_AGENT).unwrap().to_str().unwrap(),
            "review-harvester/0.1"
        );
        assert!(headers.contains_key(ACCEPT));
    }

    #[test]
    fn test_decode_utf8() {
        let text = "Great service, café staff were lovely";
        let decoded = decode_bytes(text.as_bytes(), "text/html; charset=utf-8").unwrap();
        assert_eq!(decoded, text);
    }

    #[test]
    fn test_decode_latin1_label() {
        // "café" in windows-1252
        let bytes: &[u8] = &[0x63, 0x61, 0x66, 0xe9];
        let decoded = decode_bytes(bytes, "text/html; charset=ISO-8859-1").unwrap();
        assert_eq!(decoded, "café");
    }

    #[test]
    fn test_decode_without_charset_defaults_to_utf8() {
        let decoded = decode_bytes("plain".as_bytes(), "text/xml").unwrap();
        assert_eq!(decoded, "plain");
    }

    #[test]
    fn test_charset_label_quoted() {
        assert_eq!(
            charset_label("text/html; Charset=\"UTF-8\""),
            Some("utf-8".to_string())
        );
        assert_eq!(charset_label("text/html"), None);
    }

    #[tokio::test]
    async fn test_invalid_url_is_transport_error() {
        let fetcher = PageFetcher::new(10).unwrap();
        let result = fetcher.fetch("not a url").await;
        assert!(matches!(result, Err(TransportError::InvalidUrl(_))));
    }
}
