//! Keyword search over blog posts, exported as a `url,title` CSV.
//!
//! The live search page is rendered client-side, so turning a results URL
//! into HTML is delegated to a [`SearchPageSource`]. A plain HTTP source is
//! provided for server-rendered result pages; a headless browser can be
//! plugged in behind the same trait.

use std::borrow::Cow;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use fancy_http::{HttpClient, RequestOpts, Url};
use scraper::{Html, Selector};
use serde::Serialize;
use thiserror::Error;

const RESULT_ITEM_SELECTOR: &str = ".list_search_post .desc_inner";
const RESULT_TITLE_SELECTOR: &str = ".title";
const INVALID_INPUTS: &str = "Invalid inputs!";

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("failed to render {url}: {reason}")]
    Render { url: String, reason: String },
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchOrder {
    /// Relevance.
    #[default]
    Sim,
    RecentDate,
}

impl SearchOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sim => "sim",
            Self::RecentDate => "recentdate",
        }
    }
}

impl FromStr for SearchOrder {
    type Err = SearchError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sim" => Ok(Self::Sim),
            "recentdate" => Ok(Self::RecentDate),
            other => Err(SearchError::InvalidInput(format!("unknown order `{other}`"))),
        }
    }
}

/// A validated search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub keyword: String,
    pub pages: u32,
    pub order: SearchOrder,
}

impl SearchQuery {
    /// Validate raw request parameters.
    ///
    /// `number` must be a decimal page count between 1 and `max_pages`.
    ///
    /// ```
    /// use fancy_web::search::{SearchOrder, SearchQuery};
    ///
    /// let q = SearchQuery::parse(Some("맛집"), Some("3"), None, SearchOrder::Sim, 10).unwrap();
    /// assert_eq!(q.pages, 3);
    /// assert!(SearchQuery::parse(Some("맛집"), Some("3a"), None, SearchOrder::Sim, 10).is_err());
    /// assert!(SearchQuery::parse(None, Some("3"), None, SearchOrder::Sim, 10).is_err());
    /// ```
    pub fn parse(
        keyword: Option<&str>,
        number: Option<&str>,
        order: Option<&str>,
        default_order: SearchOrder,
        max_pages: u32,
    ) -> Result<Self, SearchError> {
        let keyword = keyword.map(str::trim).unwrap_or_default();
        let number = number.map(str::trim).unwrap_or_default();
        if keyword.is_empty() || number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SearchError::InvalidInput(INVALID_INPUTS.into()));
        }
        let pages: u32 = number
            .parse()
            .map_err(|_| SearchError::InvalidInput(INVALID_INPUTS.into()))?;
        if pages == 0 || pages > max_pages {
            return Err(SearchError::InvalidInput(format!(
                "page count must be between 1 and {max_pages}"
            )));
        }
        let order = match order.map(str::trim).filter(|o| !o.is_empty()) {
            Some(raw) => raw.parse()?,
            None => default_order,
        };
        Ok(Self {
            keyword: keyword.to_string(),
            pages,
            order,
        })
    }

    /// Results page `page_no` (1-based) under `base`.
    pub fn page_url(&self, base: &Url, page_no: u32) -> Url {
        let mut url = base.clone();
        url.query_pairs_mut()
            .append_pair("pageNo", &page_no.to_string())
            .append_pair("rangeType", "ALL")
            .append_pair("orderBy", self.order.as_str())
            .append_pair("keyword", &self.keyword);
        url
    }

    /// `<keyword>_CountNumber_<pages>.csv`
    pub fn export_filename(&self) -> String {
        format!("{}_CountNumber_{}.csv", self.keyword, self.pages)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
}

/// Turns a results URL into rendered HTML.
#[async_trait]
pub trait SearchPageSource: Send + Sync {
    async fn render(&self, url: &Url) -> Result<String, SearchError>;
}

#[async_trait]
impl SearchPageSource for HttpClient {
    async fn render(&self, url: &Url) -> Result<String, SearchError> {
        let render_err = |reason: String| SearchError::Render {
            url: url.to_string(),
            reason,
        };
        let page = self
            .get_page(url, RequestOpts::default())
            .await
            .map_err(|e| render_err(e.to_string()))?
            .into_success()
            .map_err(|e| render_err(e.to_string()))?;
        Ok(page.body)
    }
}

/// Pull `(href, .title text)` pairs from a rendered results page.
pub fn parse_search_page(html: &str) -> Vec<SearchHit> {
    let (Ok(item_sel), Ok(title_sel)) = (
        Selector::parse(RESULT_ITEM_SELECTOR),
        Selector::parse(RESULT_TITLE_SELECTOR),
    ) else {
        return Vec::new();
    };
    let doc = Html::parse_document(html);
    let mut hits = Vec::new();
    for (i, item) in doc.select(&item_sel).enumerate() {
        let url = item.value().attr("href").map(str::trim).unwrap_or_default();
        let title = item
            .select(&title_sel)
            .next()
            .map(|t| t.text().collect::<String>().trim().to_string())
            .unwrap_or_default();
        if url.is_empty() || title.is_empty() {
            tracing::warn!(target: "web.search", index = i, "search.hit.incomplete");
            continue;
        }
        hits.push(SearchHit {
            url: url.to_string(),
            title,
        });
    }
    hits
}

/// Render every page of `query` and gather hits in page order. Pages that
/// fail to render or contain no posts are logged and skipped.
pub async fn collect_hits(
    source: &dyn SearchPageSource,
    base: &Url,
    query: &SearchQuery,
) -> Vec<SearchHit> {
    let mut hits = Vec::new();
    for page_no in 1..=query.pages {
        let url = query.page_url(base, page_no);
        let html = match source.render(&url).await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!(target: "web.search", page_no, error = %e, "search.page.failed");
                continue;
            }
        };
        let page_hits = parse_search_page(&html);
        if page_hits.is_empty() {
            tracing::info!(target: "web.search", page_no, "search.page.empty");
            continue;
        }
        tracing::debug!(target: "web.search", page_no, hits = page_hits.len(), "search.page.done");
        hits.extend(page_hits);
    }
    hits
}

/// CSV with a `url,title` header row, even when there are no hits.
pub fn hits_to_csv(hits: &[SearchHit]) -> Result<String, SearchError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());
    writer.write_record(["url", "title"])?;
    for hit in hits {
        writer.write_record([hit.url.as_str(), hit.title.as_str()])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| SearchError::Csv(e.into_error().into()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// `Content-Disposition` value carrying both the plain and RFC 5987 forms.
pub fn content_disposition(filename: &str) -> String {
    let encoded: Cow<'_, str> = urlencoding::encode(filename);
    format!("attachment; filename={encoded}; filename*=UTF-8''{encoded}")
}

/// A finished search export, ready to be sent as a download.
#[derive(Debug, Clone)]
pub struct SearchExport {
    pub filename: String,
    pub csv: String,
    pub hit_count: usize,
}

/// Collects search hits through a [`SearchPageSource`] and renders the CSV.
#[derive(Clone)]
pub struct SearchExporter {
    source: Arc<dyn SearchPageSource>,
    base_url: Url,
    pub default_order: SearchOrder,
    pub max_pages: u32,
}

impl SearchExporter {
    pub fn new(source: Arc<dyn SearchPageSource>, base_url: Url) -> Self {
        Self {
            source,
            base_url,
            default_order: SearchOrder::default(),
            max_pages: 50,
        }
    }

    pub fn with_default_order(mut self, order: SearchOrder) -> Self {
        self.default_order = order;
        self
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub async fn export(&self, query: &SearchQuery) -> Result<SearchExport, SearchError> {
        tracing::info!(
            target: "web.search",
            keyword = %query.keyword,
            pages = query.pages,
            order = query.order.as_str(),
            "search.start"
        );
        let hits = collect_hits(self.source.as_ref(), &self.base_url, query).await;
        let csv = hits_to_csv(&hits)?;
        tracing::info!(target: "web.search", hits = hits.len(), "search.done");
        Ok(SearchExport {
            filename: query.export_filename(),
            csv,
            hit_count: hits.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULTS: &str = r#"
        <div class="list_search_post">
          <a class="desc_inner" href="https://blog.naver.com/a/1"><strong class="title"> 첫 글 </strong></a>
          <a class="desc_inner" href="https://blog.naver.com/a/2"><span class="title">Second, post</span></a>
          <a class="desc_inner"><span class="title">no link</span></a>
        </div>
        <a class="desc_inner" href="https://elsewhere/x"><span class="title">outside list</span></a>"#;

    #[test]
    fn parses_hits_inside_result_list() {
        let hits = parse_search_page(RESULTS);
        assert_eq!(
            hits,
            vec![
                SearchHit {
                    url: "https://blog.naver.com/a/1".into(),
                    title: "첫 글".into()
                },
                SearchHit {
                    url: "https://blog.naver.com/a/2".into(),
                    title: "Second, post".into()
                },
            ]
        );
    }

    #[test]
    fn csv_quotes_and_keeps_header() {
        let csv = hits_to_csv(&parse_search_page(RESULTS)).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "url,title");
        assert_eq!(lines[2], "https://blog.naver.com/a/2,\"Second, post\"");

        let empty = hits_to_csv(&[]).unwrap();
        assert_eq!(empty, "url,title\r\n");
    }

    #[test]
    fn builds_page_urls() {
        let base = Url::parse("https://section.blog.naver.com/Search/Post.naver").unwrap();
        let q = SearchQuery::parse(
            Some("서울 카페"),
            Some("2"),
            Some("recentdate"),
            SearchOrder::Sim,
            5,
        )
        .unwrap();
        let url = q.page_url(&base, 2);
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("pageNo".into(), "2".into()),
                ("rangeType".into(), "ALL".into()),
                ("orderBy".into(), "recentdate".into()),
                ("keyword".into(), "서울 카페".into()),
            ]
        );
    }

    #[test]
    fn validates_inputs() {
        let parse = |k, n, o| SearchQuery::parse(k, n, o, SearchOrder::Sim, 5);
        assert!(parse(Some(""), Some("1"), None).is_err());
        assert!(parse(Some("k"), Some("-1"), None).is_err());
        assert!(parse(Some("k"), Some("0"), None).is_err());
        assert!(parse(Some("k"), Some("6"), None).is_err());
        assert!(parse(Some("k"), Some("1"), Some("popular")).is_err());
        assert_eq!(parse(Some("k"), Some("1"), Some("")).unwrap().order, SearchOrder::Sim);
    }

    #[test]
    fn filename_and_disposition() {
        let q = SearchQuery::parse(Some("맛집"), Some("3"), None, SearchOrder::Sim, 5).unwrap();
        assert_eq!(q.export_filename(), "맛집_CountNumber_3.csv");
        let header = content_disposition(&q.export_filename());
        assert!(header.starts_with("attachment; filename=%EB%A7%9B"));
        assert!(header.contains("filename*=UTF-8''%EB%A7%9B"));
    }
}
