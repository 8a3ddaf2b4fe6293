//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers for both the crawled pages and the
//! indexing service, and test the full crawl cycle end-to-end.

use async_trait::async_trait;
use asura_crow::config::{Config, CrawlerConfig};
use asura_crow::crawler::{Coordinator, FetchError, PageBody, PageSource};
use asura_crow::output::{Document, DocumentSink, SinkError, TaskError};
use asura_crow::storage::{seeds_from_store, SqliteUrlStore, UrlStore};
use asura_crow::{ConfigError, CrawlerError};
use bytes::Bytes;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration posting to `indexer`
fn create_test_config(indexer: &MockServer, workers: usize) -> Config {
    let mut config = Config::default();
    config.crawler.workers = workers;
    config.crawler.request_timeout_secs = 5;
    config.user_agent.crawler_name = "TestBot".to_string();
    config.indexer.endpoint = format!("{}/index", indexer.uri());
    config
}

fn html_page(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html")
}

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html_page(body))
        .mount(server)
        .await;
}

/// Page source serving an in-memory link graph
struct GraphSource {
    pages: HashMap<String, String>,
}

#[async_trait]
impl PageSource for GraphSource {
    async fn fetch(&self, url: &str) -> Result<PageBody, FetchError> {
        let html = self.pages.get(url).ok_or_else(|| FetchError::Status {
            url: url.to_string(),
            status: 404,
        })?;

        // Split the body to exercise chunked extraction
        let (head, tail) = html.split_at(html.len() / 2);
        let chunks: Vec<std::io::Result<Bytes>> = vec![
            Ok(Bytes::from(head.to_string())),
            Ok(Bytes::from(tail.to_string())),
        ];
        Ok(futures::stream::iter(chunks).boxed())
    }
}

/// Page source for which every host is unreachable
struct UnreachableSource;

#[async_trait]
impl PageSource for UnreachableSource {
    async fn fetch(&self, url: &str) -> Result<PageBody, FetchError> {
        Err(FetchError::Unreachable {
            url: url.to_string(),
            message: "no route to host".to_string(),
        })
    }
}

#[derive(Default)]
struct CollectingSink {
    documents: Mutex<Vec<Document>>,
}

#[async_trait]
impl DocumentSink for CollectingSink {
    async fn submit(&self, document: &Document) -> Result<(), SinkError> {
        self.documents.lock().unwrap().push(document.clone());
        Ok(())
    }
}

/// Builds a graph of `size` pages where page n links to pages 2n+1 and 2n+2 (mod size)
fn binary_graph(size: usize) -> HashMap<String, String> {
    let url = |n: usize| format!("https://graph.example/n{}", n);
    (0..size)
        .map(|n| {
            let html = format!(
                r#"<html><body><h1>Node {n}</h1>
                <a href="{}">left</a> <a href="{}">right</a>
                <a href="/relative">ignored</a>
                </body></html>"#,
                url((2 * n + 1) % size),
                url((2 * n + 2) % size),
            );
            (url(n), html)
        })
        .collect()
}

#[tokio::test]
async fn test_full_crawl_indexes_every_page() {
    let site = MockServer::start().await;
    let indexer = MockServer::start().await;
    let base_url = site.uri();

    mount_page(
        &site,
        "/",
        format!(
            r#"<html><head><script>var tracking = true;</script></head><body>
            <a href="{base_url}/page1">Page 1</a>
            <a href="{base_url}/page2">Page 2</a>
            </body></html>"#
        ),
    )
    .await;
    mount_page(
        &site,
        "/page1",
        format!(r#"<html><body><p>Content one</p> <a href="{base_url}/">home</a></body></html>"#),
    )
    .await;
    mount_page(
        &site,
        "/page2",
        "<html><body><p>Content two</p></body></html>".to_string(),
    )
    .await;

    // The document for page1 must arrive with exactly this body
    Mock::given(method("POST"))
        .and(path("/index"))
        .and(body_json(serde_json::json!({
            "url": format!("{}/page1", base_url),
            "content": "content one home",
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&indexer)
        .await;

    Mock::given(method("POST"))
        .and(path("/index"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&indexer)
        .await;

    let config = create_test_config(&indexer, 4);
    let coordinator = Coordinator::from_config(&config).expect("Failed to create coordinator");

    let report = coordinator
        .run(vec![format!("{}/", base_url)])
        .await
        .expect("Crawl failed");

    assert!(report.is_success(), "Unexpected failures: {:?}", report.failures);
    assert_eq!(report.pages_crawled, 3);
    assert_eq!(report.documents_emitted, 3);
    assert_eq!(
        report.visited,
        vec![
            format!("{}/", base_url),
            format!("{}/page1", base_url),
            format!("{}/page2", base_url),
        ]
    );

    // Script text never reaches the indexer
    let requests = indexer.received_requests().await.unwrap();
    let home: Document = requests
        .iter()
        .map(|r| serde_json::from_slice::<Document>(&r.body).unwrap())
        .find(|d| d.url() == format!("{}/", base_url))
        .expect("Home page was not indexed");
    assert_eq!(home.content(), "page 1 page 2");
}

#[tokio::test]
async fn test_non_2xx_page_is_fetch_failure() {
    let site = MockServer::start().await;
    let indexer = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&site)
        .await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&indexer)
        .await;

    let config = create_test_config(&indexer, 2);
    let coordinator = Coordinator::from_config(&config).unwrap();

    let seed = format!("{}/missing", site.uri());
    let report = coordinator.run(vec![seed.clone()]).await.unwrap();

    assert!(!report.is_success());
    assert_eq!(report.failure_count(), 1);
    assert_eq!(report.failures[0].url, seed);
    assert!(matches!(
        report.failures[0].error,
        TaskError::Fetch(FetchError::Status { status: 404, .. })
    ));
    assert_eq!(report.documents_emitted, 0);
}

#[tokio::test]
async fn test_indexer_failure_stops_link_following() {
    let site = MockServer::start().await;
    let indexer = MockServer::start().await;
    let base_url = site.uri();

    mount_page(
        &site,
        "/",
        format!(r#"<a href="{base_url}/next">next</a>"#),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/next"))
        .respond_with(html_page("never".to_string()))
        .expect(0)
        .mount(&site)
        .await;

    Mock::given(method("POST"))
        .and(path("/index"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&indexer)
        .await;

    let config = create_test_config(&indexer, 2);
    let coordinator = Coordinator::from_config(&config).unwrap();

    let report = coordinator
        .run(vec![format!("{}/", base_url)])
        .await
        .unwrap();

    assert_eq!(report.failure_count(), 1);
    assert!(matches!(
        report.failures[0].error,
        TaskError::Sink(SinkError::Status { status: 500, .. })
    ));
    assert_eq!(report.visited, vec![format!("{}/", base_url)]);
    assert_eq!(report.links_enqueued, 0);
}

#[tokio::test]
async fn test_unreachable_seeds_terminate_with_failures() {
    let sink = Arc::new(CollectingSink::default());
    let coordinator = Coordinator::new(
        CrawlerConfig {
            workers: 8,
            ..CrawlerConfig::default()
        },
        Arc::new(UnreachableSource),
        sink.clone(),
    );

    let seeds = vec![
        "https://apple.com".to_string(),
        "https://www.apple.com/at/".to_string(),
        "https://mcshark.at".to_string(),
    ];
    let report = tokio::time::timeout(std::time::Duration::from_secs(5), coordinator.run(seeds))
        .await
        .expect("Crawl did not terminate")
        .unwrap();

    assert_eq!(report.failure_count(), 3);
    assert_eq!(report.failures_by_kind().get("fetch"), Some(&3));
    assert!(sink.documents.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_worker_count_does_not_change_outcome() {
    let graph = binary_graph(40);
    let seed = "https://graph.example/n0".to_string();

    let mut outcomes = Vec::new();
    for workers in [1, 4, 64] {
        let sink = Arc::new(CollectingSink::default());
        let coordinator = Coordinator::new(
            CrawlerConfig {
                workers,
                ..CrawlerConfig::default()
            },
            Arc::new(GraphSource {
                pages: graph.clone(),
            }),
            sink.clone(),
        );

        let report = coordinator.run(vec![seed.clone()]).await.unwrap();
        assert!(report.is_success());
        assert_eq!(report.worker_count, workers);

        let mut documents = sink.documents.lock().unwrap().clone();
        documents.sort_by(|a, b| a.url().cmp(b.url()));
        outcomes.push((report.visited, documents));
    }

    assert_eq!(outcomes[0].0.len(), 40);
    assert_eq!(outcomes[0].1.len(), 40);
    assert_eq!(outcomes[0], outcomes[1]);
    assert_eq!(outcomes[1], outcomes[2]);
}

#[tokio::test]
async fn test_empty_seeds_is_config_error() {
    let indexer = MockServer::start().await;
    let config = create_test_config(&indexer, 2);
    let coordinator = Coordinator::from_config(&config).unwrap();

    let result = coordinator.run(Vec::new()).await;
    assert!(matches!(
        result,
        Err(CrawlerError::Config(ConfigError::NoSeeds))
    ));
}

#[tokio::test]
async fn test_shared_link_fetched_once() {
    let site = MockServer::start().await;
    let indexer = MockServer::start().await;
    let base_url = site.uri();

    let links_to_shared = format!(
        r#"<a href="{base_url}/shared">s</a> <a href="{base_url}/shared">again</a>"#
    );
    mount_page(&site, "/a", links_to_shared.clone()).await;
    mount_page(&site, "/b", links_to_shared).await;

    Mock::given(method("GET"))
        .and(path("/shared"))
        .respond_with(html_page("<p>shared</p>".to_string()))
        .expect(1)
        .mount(&site)
        .await;

    Mock::given(method("POST"))
        .and(path("/index"))
        .respond_with(ResponseTemplate::new(200))
        .expect(3)
        .mount(&indexer)
        .await;

    let config = create_test_config(&indexer, 8);
    let coordinator = Coordinator::from_config(&config).unwrap();

    let report = coordinator
        .run(vec![format!("{}/a", base_url), format!("{}/b", base_url)])
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.pages_crawled, 3);
    assert_eq!(report.links_enqueued, 1);
}

#[tokio::test]
async fn test_store_records_discoveries_for_next_run() {
    let site = MockServer::start().await;
    let indexer = MockServer::start().await;
    let base_url = site.uri();

    mount_page(
        &site,
        "/",
        format!(r#"<a href="{base_url}/found">found</a>"#),
    )
    .await;
    mount_page(&site, "/found", "<p>leaf</p>".to_string()).await;

    Mock::given(method("POST"))
        .and(path("/index"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&indexer)
        .await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("urls.db");
    let store = Arc::new(Mutex::new(SqliteUrlStore::new(&db_path).unwrap()));

    let config = create_test_config(&indexer, 2);
    let coordinator = Coordinator::from_config(&config)
        .unwrap()
        .with_store(store.clone());

    coordinator
        .run(vec![format!("{}/", base_url)])
        .await
        .unwrap();

    // Only discovered URLs are recorded, not the seed
    let reopened = SqliteUrlStore::new(&db_path).unwrap();
    assert_eq!(
        reopened.get_website_urls().unwrap(),
        vec![format!("{}/found", base_url)]
    );

    // The next run starts from the stored URLs
    let seeds = seeds_from_store(&reopened);
    let report = coordinator.run(seeds).await.unwrap();
    assert_eq!(report.visited, vec![format!("{}/found", base_url)]);
    assert!(report.is_success());
}
