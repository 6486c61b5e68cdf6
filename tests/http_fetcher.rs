//! HttpFetcher and the full pipeline against a local mock server.

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crwlr::error::{AppError, FetchError};
use crwlr::models::{Config, CrawlerConfig, HeaderPair, Termination};
use crwlr::pipeline;
use crwlr::services::{ContentKind, Fetcher, HttpFetcher};
use crwlr::storage::{ExportFormat, ResultExporter};
use crwlr::utils::url::NormalizedUrl;

fn crawler_config() -> CrawlerConfig {
    CrawlerConfig {
        timeout_secs: 0.5,
        rate_limit_secs: 0.0,
        ..CrawlerConfig::default()
    }
}

fn url(server: &MockServer, route: &str) -> NormalizedUrl {
    NormalizedUrl::parse(&format!("{}{}", server.uri(), route)).unwrap()
}

fn html_page(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html")
}

#[tokio::test]
async fn test_fetch_html_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page("<a href=\"/a\">a</a>"))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(&crawler_config()).unwrap();
    let page = fetcher.fetch(&url(&server, "/")).await.unwrap();

    assert_eq!(page.status, 200);
    assert_eq!(page.content_kind(), ContentKind::Html);
    assert!(page.body.contains("/a"));
}

#[tokio::test]
async fn test_http_error_status() {
    let server = MockServer::start().await;

    let fetcher = HttpFetcher::new(&crawler_config()).unwrap();
    let error = fetcher.fetch(&url(&server, "/missing")).await.unwrap_err();

    assert_eq!(error, FetchError::Http { status: 404 });
}

#[tokio::test]
async fn test_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html_page("late").set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(&crawler_config()).unwrap();
    let error = fetcher.fetch(&url(&server, "/slow")).await.unwrap_err();

    assert_eq!(error, FetchError::Timeout);
}

#[tokio::test]
async fn test_redirect_loop() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/loop"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/loop"))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(&crawler_config()).unwrap();
    let error = fetcher.fetch(&url(&server, "/loop")).await.unwrap_err();

    assert_eq!(error, FetchError::TooManyRedirects);
}

#[tokio::test]
async fn test_redirect_reports_final_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/new"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(html_page("moved"))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(&crawler_config()).unwrap();
    let page = fetcher.fetch(&url(&server, "/old")).await.unwrap();

    assert_eq!(page.final_url.path(), "/new");
    assert_eq!(page.body, "moved");
}

#[tokio::test]
async fn test_custom_headers_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/private"))
        .and(header("x-api-key", "secret"))
        .and(header("accept-language", "de-DE"))
        .respond_with(html_page("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let config = CrawlerConfig {
        headers: vec![
            HeaderPair::new("X-Api-Key", "secret"),
            HeaderPair::new("Accept-Language", "de-DE"),
        ],
        ..crawler_config()
    };
    let fetcher = HttpFetcher::new(&config).unwrap();

    assert!(fetcher.fetch(&url(&server, "/private")).await.is_ok());
}

#[tokio::test]
async fn test_binary_content_is_not_read() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/logo.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0x89u8, 0x50, 0x4e, 0x47], "image/png"))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(&crawler_config()).unwrap();
    let page = fetcher.fetch(&url(&server, "/logo.png")).await.unwrap();

    assert_eq!(page.content_kind(), ContentKind::Other);
    assert!(page.body.is_empty());
}

#[tokio::test]
async fn test_pipeline_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            r#"<a href="/docs">docs</a> <a href="/api">api</a> <a href="https://other.org/">x</a>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/docs"))
        .respond_with(html_page(r#"<a href="/">home</a> <a href="/docs/intro">intro</a>"#))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"next": "/api/v2"}"#.to_string(), "application/json"),
        )
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let records_file = tmp.path().join("records.jsonl");

    let mut config = Config::default();
    config.crawler = crawler_config();
    config.crawler.max_depth = 2;
    config.storage.records_file = Some(records_file.clone());
    config.storage.buffer_size = 2;

    let fetcher = Arc::new(HttpFetcher::new(&config.crawler).unwrap());
    let exporter = ResultExporter::new(tmp.path().join("scan"), ExportFormat::Json);
    let seed = format!("{}/", server.uri());

    let report = pipeline::run_with_fetcher(
        &config,
        &seed,
        fetcher,
        Some(&exporter),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    let paths: Vec<&str> = report.results.paths.iter().map(String::as_str).collect();
    assert_eq!(paths, vec!["/", "/api", "/api/v2", "/docs", "/docs/intro"]);
    assert_eq!(report.results.counters.external, 1);
    assert_eq!(report.results.counters.fetched, 3);
    assert_eq!(report.results.counters.failed, 2);
    assert_eq!(report.stats.termination, Termination::Completed);

    let log = tokio::fs::read_to_string(&records_file).await.unwrap();
    assert_eq!(log.lines().count(), report.records.len());

    let export = tokio::fs::read(tmp.path().join("scan_results.json"))
        .await
        .unwrap();
    let export: serde_json::Value = serde_json::from_slice(&export).unwrap();
    assert_eq!(export["stats"]["total_paths"], 5);
    assert_eq!(export["stats"]["total_visited"], 5);
}

fn recording_config(records_file: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.crawler = crawler_config();
    config.crawler.workers = 2;
    config.crawler.max_depth = 2;
    config.storage.records_file = Some(records_file.to_path_buf());
    // Larger than the run produces, so only the final flush writes
    config.storage.buffer_size = 1000;
    config
}

async fn read_statuses(records_file: &std::path::Path) -> Vec<String> {
    let log = tokio::fs::read_to_string(records_file).await.unwrap();
    log.lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            value["status"].as_str().unwrap().to_string()
        })
        .collect()
}

#[tokio::test]
async fn test_cancelled_pipeline_flushes_records() {
    let server = MockServer::start().await;
    let links: String = (0..20)
        .map(|n| format!("<a href=\"/p{n}\">p{n}</a>"))
        .collect();
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(&links))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/p\d+$"))
        .respond_with(html_page("slow").set_delay(Duration::from_millis(200)))
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let records_file = tmp.path().join("records.jsonl");
    let config = recording_config(&records_file);
    let fetcher = Arc::new(HttpFetcher::new(&config.crawler).unwrap());

    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        canceller.cancel();
    });

    let seed = format!("{}/", server.uri());
    let report = pipeline::run_with_fetcher(&config, &seed, fetcher, None, &cancel)
        .await
        .unwrap();

    assert_eq!(report.stats.termination, Termination::Cancelled);
    assert!(report.results.counters.fetched < 21);

    let statuses = read_statuses(&records_file).await;
    assert_eq!(statuses.len(), report.records.len());
    assert_eq!(statuses.iter().filter(|s| *s == "discovered").count(), 21);
}

#[tokio::test]
async fn test_seed_failure_flushes_records() {
    let server = MockServer::start().await;

    let tmp = TempDir::new().unwrap();
    let records_file = tmp.path().join("records.jsonl");
    let config = recording_config(&records_file);
    let fetcher = Arc::new(HttpFetcher::new(&config.crawler).unwrap());

    let seed = format!("{}/", server.uri());
    let result =
        pipeline::run_with_fetcher(&config, &seed, fetcher, None, &CancellationToken::new()).await;

    assert!(matches!(
        result,
        Err(AppError::SeedFetch {
            source: FetchError::Http { status: 404 },
            ..
        })
    ));
    assert_eq!(read_statuses(&records_file).await, vec!["discovered", "failed"]);
}
