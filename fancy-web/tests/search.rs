use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use fancy_http::{HttpClient, Url};
use fancy_web::search::{SearchError, SearchExporter, SearchOrder, SearchPageSource, SearchQuery};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn results_page(posts: &[(&str, &str)]) -> String {
    let items: String = posts
        .iter()
        .map(|(href, title)| {
            format!("<div class=\"desc\"><a class=\"desc_inner\" href=\"{href}\"><strong class=\"title\"><span>{title}</span></strong></a></div>")
        })
        .collect();
    format!("<html><body><div class=\"list_search_post\">{items}</div></body></html>")
}

/// Serves canned HTML by `pageNo`; missing pages fail to render.
struct PagedSource(HashMap<String, String>);

#[async_trait]
impl SearchPageSource for PagedSource {
    async fn render(&self, url: &Url) -> Result<String, SearchError> {
        let page_no = url
            .query_pairs()
            .find(|(k, _)| k == "pageNo")
            .map(|(_, v)| v.into_owned())
            .unwrap_or_default();
        self.0.get(&page_no).cloned().ok_or_else(|| SearchError::Render {
            url: url.to_string(),
            reason: "timed out waiting for results".into(),
        })
    }
}

fn base() -> Url {
    Url::parse("https://section.blog.naver.com/Search/Post.naver").unwrap()
}

#[tokio::test]
async fn collects_hits_across_pages_and_skips_bad_pages() {
    let mut pages = HashMap::new();
    pages.insert(
        "1".to_string(),
        results_page(&[("https://blog.naver.com/a/1", "one"), ("https://blog.naver.com/a/2", "two")]),
    );
    pages.insert("2".to_string(), results_page(&[]));
    pages.insert("4".to_string(), results_page(&[("https://blog.naver.com/a/4", "four")]));
    let exporter = SearchExporter::new(Arc::new(PagedSource(pages)), base());
    let query = SearchQuery::parse(Some("카페"), Some("4"), None, SearchOrder::Sim, 10).unwrap();

    let export = exporter.export(&query).await.unwrap();

    assert_eq!(export.hit_count, 3);
    assert_eq!(export.filename, "카페_CountNumber_4.csv");
    let lines: Vec<&str> = export.csv.lines().collect();
    assert_eq!(
        lines,
        vec![
            "url,title",
            "https://blog.naver.com/a/1,one",
            "https://blog.naver.com/a/2,two",
            "https://blog.naver.com/a/4,four",
        ]
    );
}

#[tokio::test]
async fn http_source_fetches_each_page() {
    let server = MockServer::start().await;
    for page in ["1", "2"] {
        Mock::given(method("GET"))
            .and(path("/Search/Post.naver"))
            .and(query_param("pageNo", page))
            .and(query_param("rangeType", "ALL"))
            .and(query_param("orderBy", "recentdate"))
            .and(query_param("keyword", "rust"))
            .respond_with(ResponseTemplate::new(200).set_body_string(results_page(&[(
                &format!("https://blog.naver.com/p/{page}"),
                "post",
            )])))
            .expect(1)
            .mount(&server)
            .await;
    }

    let base = Url::parse(&format!("{}/Search/Post.naver", server.uri())).unwrap();
    let exporter = SearchExporter::new(Arc::new(HttpClient::new().unwrap()), base)
        .with_default_order(SearchOrder::RecentDate);
    let query = SearchQuery::parse(Some("rust"), Some("2"), None, exporter.default_order, exporter.max_pages)
        .unwrap();

    let export = exporter.export(&query).await.unwrap();

    assert_eq!(export.hit_count, 2);
    assert!(export.csv.contains("https://blog.naver.com/p/2,post"));
}
