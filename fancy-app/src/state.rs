use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use fancy_config::{CollisionMode, FancyConfig};
use fancy_http::{HttpClient, Url};
use fancy_web::{
    BulkExporter, BulkSettings, CollisionPolicy, ExtractorSettings, PageFetcher,
    PageTextExtractor, SearchExporter, SearchOrder, SearchPageSource,
};

#[derive(Clone)]
pub struct AppState {
    pub extractor: PageTextExtractor,
    pub bulk: Arc<BulkExporter>,
    pub search: SearchExporter,
    pub archive_name: Arc<str>,
}

impl AppState {
    /// Wire the services against the live network.
    pub fn from_config(config: &FancyConfig) -> anyhow::Result<Self> {
        let client = HttpClient::with_user_agent(&config.extractor.user_agent)?
            .with_timeout(Duration::from_secs(config.extractor.timeout_secs));
        tracing::info!(
            target: "app",
            allowed_host = %config.extractor.allowed_host,
            timeout_secs = config.extractor.timeout_secs,
            "app.http_client.ready"
        );
        let client = Arc::new(client);
        Self::with_sources(config, client.clone(), client)
    }

    pub fn with_sources(
        config: &FancyConfig,
        fetcher: Arc<dyn PageFetcher>,
        search_source: Arc<dyn SearchPageSource>,
    ) -> anyhow::Result<Self> {
        let ex = &config.extractor;
        let settings = ExtractorSettings {
            allowed_host: ex.allowed_host.clone(),
            frame_id: ex.frame_id.clone(),
            container_classes: ex
                .container_classes
                .split_whitespace()
                .map(str::to_string)
                .collect(),
            container_lang: ex.container_lang.clone(),
            text_tag: ex.text_tag.clone(),
        };
        let extractor = PageTextExtractor::new(fetcher, settings)?;

        let bulk = BulkExporter::new(
            extractor.clone(),
            BulkSettings {
                fallback_label: config.bulk.fallback_label.clone(),
                collision: match config.bulk.collision {
                    CollisionMode::Disambiguate => CollisionPolicy::Disambiguate,
                    CollisionMode::Overwrite => CollisionPolicy::Overwrite,
                },
            },
        );

        let base_url = Url::parse(&config.search.base_url)
            .with_context(|| format!("search.base_url: {}", config.search.base_url))?;
        let default_order: SearchOrder = config
            .search
            .default_order
            .parse()
            .context("search.default_order")?;
        let search = SearchExporter::new(search_source, base_url)
            .with_default_order(default_order)
            .with_max_pages(config.search.max_pages);

        Ok(Self {
            extractor,
            bulk: Arc::new(bulk),
            search,
            archive_name: Arc::from(config.bulk.archive_name.as_str()),
        })
    }
}
