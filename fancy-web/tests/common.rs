#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use async_trait::async_trait;
use fancy_common::observability::{LogConfig, LogFormat};
use fancy_http::{FetchedPage, HttpError, StatusCode, Url};
use fancy_web::PageFetcher;

static INIT_PATH: OnceLock<std::path::PathBuf> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "fancy-tests",
            emit_stderr: true,
            format: if std::env::var("FANCY_LOG_FORMAT")
                .map(|raw| raw.trim().eq_ignore_ascii_case("json"))
                .unwrap_or(false)
            {
                LogFormat::Json
            } else {
                LogFormat::Text
            },
            default_filter: "debug".into(),
            ..LogConfig::default()
        };

        fancy_common::observability::init_logging(config).unwrap_or_default()
    });
}

enum Canned {
    Page(u16, String),
    NetworkError,
}

/// In-memory fetcher keyed by exact URL; unknown URLs answer 404.
#[derive(Default)]
pub struct FakeFetcher {
    pages: Mutex<HashMap<String, Canned>>,
    calls: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, url: &str, status: u16, body: &str) -> Self {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), Canned::Page(status, body.to_string()));
        self
    }

    pub fn network_error(self, url: &str) -> Self {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), Canned::NetworkError);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, HttpError> {
        self.calls.lock().unwrap().push(url.to_string());
        let pages = self.pages.lock().unwrap();
        match pages.get(url.as_str()) {
            Some(Canned::Page(status, body)) => Ok(FetchedPage {
                url: url.clone(),
                status: StatusCode::from_u16(*status).unwrap(),
                body: body.clone(),
            }),
            Some(Canned::NetworkError) => Err(HttpError::Network("connection reset".into())),
            None => Ok(FetchedPage {
                url: url.clone(),
                status: StatusCode::NOT_FOUND,
                body: String::new(),
            }),
        }
    }
}

/// A post page whose content container holds one `<span>` per entry.
pub fn post_html(spans: &[&str]) -> String {
    let body: String = spans
        .iter()
        .map(|s| format!("<p class=\"se-text\"><span>{s}</span></p>\n"))
        .collect();
    format!(
        "<html><body><div class=\"se-viewer se-theme-default\" lang=\"ko-KR\">\n{body}</div></body></html>"
    )
}

/// An outer page delegating to a frame at `src`.
pub fn frame_html(src: &str) -> String {
    format!("<html><body><iframe id=\"mainFrame\" src=\"{src}\"></iframe></body></html>")
}
