//! Minimal HTML-fetching HTTP client with bounded timeouts and safe logging.
//!
//! - Request options: query params, timeout
//! - One attempt per request; callers decide what a failure means
//! - Redacts sensitive query params and authorization headers in logs
//! - Optional *raw* request/response logging via `FANCY_HTTP_RAW=1`
//!
//! Example (no_run):
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let client = fancy_http::HttpClient::new()?;
//! let url = fancy_http::Url::parse("https://blog.naver.com/x/1")?;
//! let page = client.get_page(&url, fancy_http::RequestOpts::default()).await?;
//! println!("{} -> {} bytes", page.status, page.body.len());
//! # Ok(()) }
//! ```
//!
//! Observability: structured `tracing` events are emitted for request start,
//! response headers, body snippets (truncated), final errors, and (optionally)
//! raw request/response lines (target `http.raw`) when `FANCY_HTTP_RAW=1`.

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Method};
use std::borrow::Cow;
use std::env;
use std::time::{Duration, Instant};
use thiserror::Error;

pub use reqwest::{StatusCode, Url};

// ==============================
// Raw logging toggles
// ==============================

const RAW_ENV: &str = "FANCY_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024; // cap raw body logs (64 KiB)

const SECRET_QUERY_KEYS: &[&str] = &[
    "access_token",
    "authorization",
    "auth",
    "key",
    "api_key",
    "token",
    "secret",
    "client_secret",
    "bearer",
];

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

/// Render a best-effort curl command for repro/debug, with secrets redacted.
fn make_curl(method: &Method, url: &Url, headers: &HeaderMap) -> String {
    let mut parts = vec!["curl".to_string(), format!("-X{}", method)];
    for (name, val) in redact_headers(headers) {
        parts.push(format!("-H '{}: {}'", name, val.replace('\'', r"'\''")));
    }
    let (host_path, query) = redact_query(url);
    let rendered = if query.is_empty() {
        host_path
    } else {
        let q = query
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        format!("{host_path}?{q}")
    };
    parts.push(format!("'{}://{}'", url.scheme(), rendered));
    parts.join(" ")
}

/// Redact sensitive headers for logging
fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let key = k.as_str().to_string();
            let mut val = v.to_str().unwrap_or("").to_string();
            if key.eq_ignore_ascii_case("authorization") || key.eq_ignore_ascii_case("cookie") {
                val = "<redacted>".into();
            }
            (key, val)
        })
        .collect()
}

// ==============================
// Errors
// ==============================

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request build failed: {0}")]
    Build(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("network error: {0}")]
    Network(String),
    #[error("server returned {status} for {url}")]
    Status { status: StatusCode, url: String },
}

// ==============================
// Request options & responses
// ==============================

/// Per-request tuning knobs for the HTTP client.
///
/// ```
/// use fancy_http::RequestOpts;
/// use std::borrow::Cow;
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(5)),
///     query: Some(vec![("pageNo", Cow::Borrowed("2"))]),
///     ..Default::default()
/// };
///
/// assert_eq!(opts.timeout.unwrap().as_secs(), 5);
/// assert_eq!(opts.query.as_ref().map(Vec::len), Some(1));
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub timeout: Option<Duration>,
    pub query: Option<Vec<(&'a str, Cow<'a, str>)>>,
}

/// A fetched document. Non-success statuses are returned as data, not errors.
#[derive(Clone, Debug)]
pub struct FetchedPage {
    /// Final URL after redirects.
    pub url: Url,
    pub status: StatusCode,
    pub body: String,
}

impl FetchedPage {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Turn a non-2xx page into [`HttpError::Status`].
    pub fn into_success(self) -> Result<Self, HttpError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(HttpError::Status {
                status: self.status,
                url: self.url.to_string(),
            })
        }
    }
}

// ==============================
// Client
// ==============================

#[derive(Clone)]
pub struct HttpClient {
    inner: Client,
    pub default_timeout: Duration,
}

impl HttpClient {
    /// Construct a client with a browser-like user agent.
    ///
    /// ```no_run
    /// use fancy_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new()?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(15));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new() -> Result<Self, HttpError> {
        Self::with_user_agent(DEFAULT_USER_AGENT)
    }

    /// Construct a client that identifies itself with `user_agent`.
    pub fn with_user_agent(user_agent: &str) -> Result<Self, HttpError> {
        let ua = HeaderValue::from_str(user_agent)
            .map_err(|e| HttpError::Build(format!("invalid user agent: {e}")))?;
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, ua);
        headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
        );
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            inner,
            default_timeout: Duration::from_secs(15),
        })
    }

    /// Override the default timeout returned by [`HttpClient::new`].
    ///
    /// ```no_run
    /// use fancy_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new()?.with_timeout(Duration::from_secs(2));
    /// assert_eq!(client.default_timeout, Duration::from_secs(2));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    /// GET a document and decode its body as text.
    ///
    /// Exactly one attempt is made. Transport failures and timeouts are
    /// errors; any HTTP status (including 4xx/5xx) is returned in the page.
    pub async fn get_page(
        &self,
        url: &Url,
        opts: RequestOpts<'_>,
    ) -> Result<FetchedPage, HttpError> {
        let timeout = opts.timeout.unwrap_or(self.default_timeout);

        let mut rb = self.inner.request(Method::GET, url.clone()).timeout(timeout);
        if let Some(q) = &opts.query {
            let pairs: Vec<(&str, &str)> = q.iter().map(|(k, v)| (*k, v.as_ref())).collect();
            rb = rb.query(&pairs);
        }

        let request = rb.build().map_err(|e| HttpError::Build(e.to_string()))?;
        let (host_path, redacted_q) = redact_query(request.url());
        let req_id = next_request_id();

        tracing::debug!(
            req_id=%req_id,
            method=%Method::GET,
            host_path=%host_path,
            query=?redacted_q,
            timeout_ms=timeout.as_millis() as u64,
            "http.request.start"
        );

        if raw_enabled() {
            let curl = make_curl(request.method(), request.url(), request.headers());
            tracing::debug!(target: "http.raw", %req_id, %curl, "request");
        }

        let t0 = Instant::now();
        let resp = match self.inner.execute(request).await {
            Ok(resp) => resp,
            Err(err) => return Err(log_transport_error(&req_id, err, timeout, "send")),
        };
        let status = resp.status();
        let final_url = resp.url().clone();
        let headers = resp.headers().clone();
        let bytes = match resp.bytes().await {
            Ok(bytes) => bytes,
            Err(err) => return Err(log_transport_error(&req_id, err, timeout, "body")),
        };
        let dur_ms = t0.elapsed().as_millis() as u64;

        tracing::debug!(
            req_id=%req_id,
            %status,
            duration_ms=dur_ms,
            body_len=bytes.len(),
            final_url=%final_url,
            "http.response.headers"
        );

        if raw_enabled() {
            let hdrs = redact_headers(&headers);
            let truncated = bytes.len() > RAW_MAX_BODY;
            let text = String::from_utf8_lossy(&bytes[..bytes.len().min(RAW_MAX_BODY)]);
            tracing::info!(
                target:"http.raw",
                %req_id,
                status=%status,
                duration_ms=dur_ms,
                headers=?hdrs,
                body=%text,
                truncated
            );
        }

        let body = String::from_utf8_lossy(&bytes).into_owned();
        if !status.is_success() {
            tracing::warn!(
                req_id=%req_id,
                %status,
                host_path=%host_path,
                body_snippet=%snip_body(&body),
                "http.error"
            );
        } else {
            tracing::trace!(
                req_id=%req_id,
                body_snippet=%snip_body(&body),
                "http.response.body_snippet"
            );
        }

        Ok(FetchedPage {
            url: final_url,
            status,
            body,
        })
    }
}

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

// ==============================
// Helpers
// ==============================

fn log_transport_error(
    req_id: &str,
    err: reqwest::Error,
    timeout: Duration,
    stage: &str,
) -> HttpError {
    let message = err.to_string();
    tracing::warn!(req_id=%req_id, stage, message=%message, "http.network_error");
    if err.is_timeout() {
        HttpError::Timeout(timeout)
    } else {
        HttpError::Network(message)
    }
}

fn next_request_id() -> String {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    format!("r{:x}", COUNTER.fetch_add(1, Ordering::Relaxed))
}

fn snip_body(body: &str) -> String {
    if body.len() <= 500 {
        return body.to_string();
    }
    let mut end = 500;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

fn redact_query(url: &Url) -> (String, Vec<(String, String)>) {
    // Return "host + path" string and redacted query list for logging
    let host_path = format!("{}{}", url.host_str().unwrap_or("-"), url.path());
    let redacted = url
        .query_pairs()
        .map(|(k, v)| {
            let k = k.to_string();
            let is_secret = SECRET_QUERY_KEYS.contains(&k.to_ascii_lowercase().as_str());
            (k, if is_secret { "<redacted>".into() } else { v.to_string() })
        })
        .collect::<Vec<_>>();
    (host_path, redacted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_secret_query_params() {
        let url = Url::parse("https://blog.naver.com/PostView?logNo=1&token=abc").unwrap();
        let (host_path, q) = redact_query(&url);
        assert_eq!(host_path, "blog.naver.com/PostView");
        assert_eq!(
            q,
            vec![
                ("logNo".to_string(), "1".to_string()),
                ("token".to_string(), "<redacted>".to_string()),
            ]
        );
    }

    #[test]
    fn curl_line_hides_authorization() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer secret"));
        let url = Url::parse("https://example.com/a?key=zzz").unwrap();
        let curl = make_curl(&Method::GET, &url, &headers);
        assert!(curl.contains("<redacted>"));
        assert!(!curl.contains("secret"));
        assert!(!curl.contains("zzz"));
    }

    #[test]
    fn snip_respects_char_boundaries() {
        let body = "한".repeat(300);
        let snip = snip_body(&body);
        assert!(snip.ends_with("..."));
        assert!(snip.len() <= 503);
    }

    #[test]
    fn into_success_rejects_error_statuses() {
        let page = FetchedPage {
            url: Url::parse("https://blog.naver.com/x/1").unwrap(),
            status: StatusCode::NOT_FOUND,
            body: String::new(),
        };
        let err = page.into_success().unwrap_err();
        assert!(matches!(err, HttpError::Status { status, .. } if status == StatusCode::NOT_FOUND));
    }
}
