//! Iframe-aware text extraction for blog posts.
//!
//! The blog renders posts inside a frame (`#mainFrame`) whose document holds
//! the actual content container. Extraction therefore:
//!
//! 1. validates that the URL belongs to the allowed host,
//! 2. fetches it and, if a frame is present, swaps in the frame document
//!    (falling back to the outer page when the frame fetch fails),
//! 3. finds the content container by class list + `lang`,
//! 4. returns the stripped text of every text-bearing element, in order,
//!    with empty ones dropped.
//!
//! HTML parsing is synchronous and kept out of `.await` points: `scraper`
//! documents are not `Send`.

use std::sync::Arc;
use std::time::Instant;

use fancy_http::Url;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use thiserror::Error;

use crate::fetch::PageFetcher;

/// Filename suggested when a page yields no text at all.
pub const DEFAULT_SUGGESTED_NAME: &str = "extracted_text";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },
    #[error("target container not found or no text available")]
    ContainerNotFound,
}

impl ExtractError {
    /// Stable tag for the failure class.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "InvalidInput",
            Self::Fetch { .. } => "FetchError",
            Self::ContainerNotFound => "ContainerNotFound",
        }
    }
}

/// Raised when the configured selectors cannot be compiled.
#[derive(Debug, Error)]
#[error("invalid selector `{selector}`: {reason}")]
pub struct SelectorError {
    pub selector: String,
    pub reason: String,
}

/// Text pulled from the content container, one entry per text element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedText {
    pub lines: Vec<String>,
}

impl ExtractedText {
    pub fn joined(&self) -> String {
        self.lines.join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// First line, or [`DEFAULT_SUGGESTED_NAME`] when nothing was extracted.
    pub fn suggested_filename(&self) -> &str {
        self.lines
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_SUGGESTED_NAME)
    }
}

/// JSON body returned for single-URL extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextPayload {
    pub text: String,
    pub filename: String,
}

impl From<&ExtractedText> for TextPayload {
    fn from(extracted: &ExtractedText) -> Self {
        Self {
            text: extracted.joined(),
            filename: extracted.suggested_filename().to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExtractorSettings {
    /// URLs must be on this host or one of its subdomains.
    pub allowed_host: String,
    pub frame_id: String,
    pub container_classes: Vec<String>,
    pub container_lang: String,
    pub text_tag: String,
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        Self {
            allowed_host: "naver.com".into(),
            frame_id: "mainFrame".into(),
            container_classes: vec!["se-viewer".into(), "se-theme-default".into()],
            container_lang: "ko-KR".into(),
            text_tag: "span".into(),
        }
    }
}

struct CompiledSelectors {
    frame: Selector,
    container: Selector,
    text: Selector,
}

impl CompiledSelectors {
    fn compile(settings: &ExtractorSettings) -> Result<Self, SelectorError> {
        // Exact class attribute: a div with extra classes is a different container.
        let classes = settings.container_classes.join(" ");
        Ok(Self {
            frame: parse_selector(&format!(
                "iframe[id=\"{}\"]",
                css_string(&settings.frame_id)
            ))?,
            container: parse_selector(&format!(
                "div[class=\"{}\"][lang=\"{}\"]",
                css_string(&classes),
                css_string(&settings.container_lang)
            ))?,
            text: parse_selector(&settings.text_tag)?,
        })
    }
}

fn parse_selector(raw: &str) -> Result<Selector, SelectorError> {
    Selector::parse(raw).map_err(|e| SelectorError {
        selector: raw.to_string(),
        reason: e.to_string(),
    })
}

fn css_string(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Fetches a blog post and extracts its visible text.
#[derive(Clone)]
pub struct PageTextExtractor {
    fetcher: Arc<dyn PageFetcher>,
    settings: Arc<ExtractorSettings>,
    selectors: Arc<CompiledSelectors>,
}

impl PageTextExtractor {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        settings: ExtractorSettings,
    ) -> Result<Self, SelectorError> {
        let selectors = CompiledSelectors::compile(&settings)?;
        Ok(Self {
            fetcher,
            settings: Arc::new(settings),
            selectors: Arc::new(selectors),
        })
    }

    pub fn settings(&self) -> &ExtractorSettings {
        &self.settings
    }

    /// Validate, fetch and extract. No retries; the only soft failure is the
    /// frame fetch, which falls back to the outer document.
    pub async fn extract(&self, raw_url: &str) -> Result<ExtractedText, ExtractError> {
        let url = validate_url(raw_url, &self.settings.allowed_host)?;
        let started = Instant::now();
        tracing::info!(target: "web.extract", url = %url, "extract.start");

        let primary = self.fetcher.fetch(&url).await.map_err(|e| {
            tracing::warn!(target: "web.extract", url = %url, error = %e, "extract.fetch.failed");
            ExtractError::Fetch {
                url: url.to_string(),
                reason: e.to_string(),
            }
        })?;
        if !primary.is_success() {
            tracing::warn!(
                target: "web.extract",
                url = %url,
                status = %primary.status,
                "extract.fetch.status"
            );
            return Err(ExtractError::Fetch {
                url: url.to_string(),
                reason: format!("server returned {}", primary.status),
            });
        }

        let mut body = primary.body;
        if let Some(src) = find_frame_src(&body, &self.selectors.frame) {
            if let Some(frame_body) = self.fetch_frame(&url, &src).await {
                body = frame_body;
            }
        }

        let lines = extract_lines(&body, &self.selectors)?;
        tracing::info!(
            target: "web.extract",
            url = %url,
            line_count = lines.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "extract.done"
        );
        Ok(ExtractedText { lines })
    }

    /// Resolve and fetch the frame document; `None` keeps the outer page.
    async fn fetch_frame(&self, base: &Url, src: &str) -> Option<String> {
        let frame_url = match base.join(src) {
            Ok(u) => u,
            Err(e) => {
                tracing::warn!(target: "web.extract", src, error = %e, "extract.frame.fallback");
                return None;
            }
        };
        match self.fetcher.fetch(&frame_url).await {
            Ok(page) if page.is_success() => {
                tracing::debug!(
                    target: "web.extract",
                    frame_url = %frame_url,
                    "extract.frame.followed"
                );
                Some(page.body)
            }
            Ok(page) => {
                tracing::warn!(
                    target: "web.extract",
                    frame_url = %frame_url,
                    status = %page.status,
                    "extract.frame.fallback"
                );
                None
            }
            Err(e) => {
                tracing::warn!(
                    target: "web.extract",
                    frame_url = %frame_url,
                    error = %e,
                    "extract.frame.fallback"
                );
                None
            }
        }
    }
}

/// Reject empty, malformed, non-http(s) and off-domain URLs before any I/O.
pub fn validate_url(raw: &str, allowed_host: &str) -> Result<Url, ExtractError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ExtractError::InvalidInput("missing URL".into()));
    }
    let url = Url::parse(raw)
        .map_err(|e| ExtractError::InvalidInput(format!("malformed URL `{raw}`: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ExtractError::InvalidInput(format!(
            "unsupported scheme `{}`",
            url.scheme()
        )));
    }
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    let allowed = allowed_host.trim().to_ascii_lowercase();
    let on_domain = host == allowed || host.ends_with(&format!(".{allowed}"));
    if !on_domain {
        return Err(ExtractError::InvalidInput(format!(
            "host `{host}` is not part of {allowed}"
        )));
    }
    Ok(url)
}

fn find_frame_src(html: &str, frame: &Selector) -> Option<String> {
    let doc = Html::parse_document(html);
    doc.select(frame)
        .next()
        .and_then(|el| el.value().attr("src"))
        .map(str::trim)
        .filter(|src| !src.is_empty())
        .map(str::to_string)
}

fn extract_lines(html: &str, selectors: &CompiledSelectors) -> Result<Vec<String>, ExtractError> {
    let doc = Html::parse_document(html);
    let container = doc
        .select(&selectors.container)
        .next()
        .ok_or(ExtractError::ContainerNotFound)?;
    Ok(container
        .select(&selectors.text)
        .map(stripped_text)
        .filter(|text| !text.is_empty())
        .collect())
}

/// Concatenate an element's text nodes, each trimmed, skipping blank ones.
fn stripped_text(el: ElementRef<'_>) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}
