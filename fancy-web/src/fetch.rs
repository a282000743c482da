//! Fetch capability consumed by the extractor and the search exporter.
use async_trait::async_trait;
use fancy_http::{FetchedPage, HttpClient, HttpError, RequestOpts, Url};

/// Issue a single GET and hand back whatever the server answered.
///
/// Implementations must not retry, and must report non-2xx responses as a
/// [`FetchedPage`] with that status rather than as an error.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, HttpError>;
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, HttpError> {
        self.get_page(url, RequestOpts::default()).await
    }
}
