//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run the fetcher,
//! probe and full crawl end-to-end over real HTTP.

use std::sync::Arc;
use std::time::{Duration, Instant};
use sumi_scroll::config::{Config, DEFAULT_COOKIE};
use sumi_scroll::crawler::{NoJitter, PageFetcher, PageSource, RandomSource, SeededRandom};
use sumi_scroll::output::write_artifact;
use sumi_scroll::{CrawlJob, ErrorKind, NovelCrawler};
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HTML: &str = "text/html; charset=utf-8";

/// Creates a test configuration with millisecond backoff and no batch pauses
fn create_test_config() -> Config {
    let mut config = Config::default();
    config.crawler.chunk_delay_min_ms = 0;
    config.crawler.chunk_delay_max_ms = 0;
    config.fetcher.timeout_secs = 5;
    config.fetcher.backoff_base_ms = 1;
    config.fetcher.backoff_jitter_ms = 0;
    config.fetcher.max_backoff_ms = 5;
    config
}

fn create_crawler(config: Config) -> NovelCrawler {
    let random: Arc<dyn RandomSource> = Arc::new(SeededRandom::new(7));
    let fetcher = PageFetcher::new(&config.fetcher, random.clone()).expect("fetcher builds");
    NovelCrawler::with_parts(config, Arc::new(fetcher), random)
}

fn create_fetcher(config: &Config) -> PageFetcher {
    PageFetcher::new(&config.fetcher, Arc::new(NoJitter)).expect("fetcher builds")
}

fn html(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.into(), HTML)
}

fn chapter_html(n: usize) -> String {
    format!(
        r#"<html><head><title>第{n}章</title></head><body>
        <div class="bookname"><h1>第{n}章 标题{n}</h1></div>
        <div id="content">&nbsp;&nbsp;&nbsp;&nbsp;这是第{n}章的正文。<br><br>&nbsp;&nbsp;&nbsp;&nbsp;第二段。</div>
        </body></html>"#
    )
}

fn toc_html(server_uri: &str, count: usize) -> String {
    let items: String = (1..=count)
        .map(|n| {
            format!(
                r#"<dd><a href="{}/book/{}.html">第{}章 标题{}</a></dd>"#,
                server_uri, n, n, n
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html><html><head><title>测试小说最新章节_测试小说全文阅读</title></head>
        <body><div id="list"><dl><dt>正文</dt>{}</dl></div></body></html>"#,
        items
    )
}

async fn mount_toc(server: &MockServer, count: usize) {
    Mock::given(method("GET"))
        .and(path("/book"))
        .respond_with(html(toc_html(&server.uri(), count)))
        .mount(server)
        .await;
}

async fn mount_chapter(server: &MockServer, n: usize) {
    Mock::given(method("GET"))
        .and(path(format!("/book/{}.html", n)))
        .respond_with(html(chapter_html(n)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_with_transient_and_permanent_failures() {
    let server = MockServer::start().await;
    mount_toc(&server, 25).await;

    // Chapters 5 and 17 fail once, then recover on retry
    for n in [5, 17] {
        Mock::given(method("GET"))
            .and(path(format!("/book/{}.html", n)))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
    }

    // Chapter 9 never recovers and is tried exactly max_attempts times
    Mock::given(method("GET"))
        .and(path("/book/9.html"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    for n in (1..=25).filter(|n| *n != 9) {
        mount_chapter(&server, n).await;
    }

    let crawler = create_crawler(create_test_config());
    let job = CrawlJob::new(&format!("{}/book/", server.uri()), "测试小说", Some(5), Some(20))
        .unwrap();

    let result = crawler.crawl(&job).await.unwrap();

    assert_eq!(result.succeeded, 24);
    assert_eq!(result.failed, 1);
    assert!(result.filename.starts_with("测试小说_"));
    assert!(result.filename.ends_with(".txt"));
    assert!(!result.content.contains("第9章 标题9"));

    // Chapters appear in ascending order
    let mut last_position = 0;
    for n in (1..=25).filter(|n| *n != 9) {
        let title = format!("第{}章 标题{}\n\n", n, n);
        let position = result
            .content
            .find(&title)
            .unwrap_or_else(|| panic!("chapter {} missing", n));
        assert!(position >= last_position, "chapter {} out of order", n);
        last_position = position;
    }

    assert!(result.content.contains("这是第1章的正文。\n\n第二段。"));
    assert_eq!(result.content.matches(&"=".repeat(50)).count(), 23);
}

#[tokio::test]
async fn test_crawl_aborts_when_too_many_chapters_fail() {
    let server = MockServer::start().await;
    mount_toc(&server, 10).await;

    for n in 1..=3 {
        Mock::given(method("GET"))
            .and(path(format!("/book/{}.html", n)))
            .respond_with(html("<html><body>访问太频繁，请稍后再试</body></html>"))
            .expect(1)
            .mount(&server)
            .await;
    }
    for n in 4..=10 {
        mount_chapter(&server, n).await;
    }

    let crawler = create_crawler(create_test_config());
    let job = CrawlJob::new(&format!("{}/book", server.uri()), "测试小说", Some(5), Some(10))
        .unwrap();

    let err = crawler.crawl(&job).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::TooManyFailures);
    assert!(err.to_string().contains("3 of 10"));
}

#[tokio::test]
async fn test_crawl_writes_artifact() {
    let server = MockServer::start().await;
    mount_toc(&server, 10).await;
    for n in 1..=10 {
        mount_chapter(&server, n).await;
    }

    let crawler = create_crawler(create_test_config());
    let job = CrawlJob::new(&format!("{}/book", server.uri()), "测试/小说", None, Some(10)).unwrap();
    let result = crawler.crawl(&job).await.unwrap();

    let dir = TempDir::new().unwrap();
    let written = write_artifact(&result, &dir.path().join("out")).unwrap();

    assert!(written
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("测试_小说_"));
    assert_eq!(std::fs::read_to_string(&written).unwrap(), result.content);
}

#[tokio::test]
async fn test_crawl_toc_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let crawler = create_crawler(create_test_config());
    let job = CrawlJob::new(&format!("{}/missing", server.uri()), "测试小说", None, None).unwrap();

    let err = crawler.crawl(&job).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
}

/// Points every 404 fallback at `paths` on `mirror`
fn mirror_alternates(
    mirror: &MockServer,
    paths: &[&str],
) -> impl Fn(&Url) -> Vec<Url> + Send + Sync + 'static {
    let urls: Vec<Url> = paths
        .iter()
        .map(|p| Url::parse(&format!("{}{}", mirror.uri(), p)).unwrap())
        .collect();
    move |_: &Url| urls.clone()
}

#[tokio::test]
async fn test_not_found_falls_back_to_alternate() {
    let origin = MockServer::start().await;
    let mirror = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/book"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&origin)
        .await;
    Mock::given(method("GET"))
        .and(path("/book"))
        .respond_with(html("<html><body>镜像目录</body></html>"))
        .expect(1)
        .mount(&mirror)
        .await;

    let fetcher = create_fetcher(&create_test_config())
        .with_alternates(mirror_alternates(&mirror, &["/gone", "/book"]));
    let url = Url::parse(&format!("{}/book", origin.uri())).unwrap();

    let body = fetcher.fetch(&url).await.unwrap();

    assert!(body.contains("镜像目录"));
    let tried: Vec<String> = mirror
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|request| request.url.path().to_string())
        .collect();
    assert_eq!(tried, vec!["/gone", "/book"]);
}

#[tokio::test]
async fn test_not_found_attempts_are_bounded() {
    let origin = MockServer::start().await;
    let mirror = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/book"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&origin)
        .await;

    let config = create_test_config();
    let fetcher = create_fetcher(&config)
        .with_alternates(mirror_alternates(&mirror, &["/m1", "/m2", "/m3", "/m4"]));
    let url = Url::parse(&format!("{}/book", origin.uri())).unwrap();

    let err = fetcher.fetch(&url).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(err.to_string().contains(url.as_str()));
    let tried: Vec<String> = mirror
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|request| request.url.path().to_string())
        .collect();
    assert_eq!(tried, vec!["/m1", "/m2"]);
    assert_eq!(tried.len() + 1, config.fetcher.max_not_found_attempts as usize);
}

#[tokio::test]
async fn test_probe_short_heading_without_title() {
    let server = MockServer::start().await;
    let body = format!(
        r#"<html><head></head><body><h1>我的小说名字是这个好书吧</h1>
        <div id="list"><dl>
            <dd><a href="{uri}/book/2.html">第二章</a></dd>
            <dd><a href="{uri}/book/1.html">第一章</a></dd>
        </dl></div></body></html>"#,
        uri = server.uri()
    );
    Mock::given(method("GET"))
        .and(path("/book"))
        .respond_with(html(body))
        .expect(1)
        .mount(&server)
        .await;

    let crawler = create_crawler(create_test_config());
    let report = crawler.probe(&format!("{}/book/", server.uri())).await.unwrap();

    assert_eq!(report.novel_name.as_deref(), Some("我的小说名字是这个好书吧"));
    assert_eq!(report.chapter_count, Some(2));
    assert_eq!(
        report.first_chapter,
        Some(format!("{}/book/1.html", server.uri()))
    );
}

#[tokio::test]
async fn test_anti_bot_page_fails_without_retry_delay() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/book/1.html"))
        .respond_with(html("<html><body>请输入验证码</body></html>"))
        .expect(1)
        .mount(&server)
        .await;

    // A retry would sleep for at least two seconds
    let mut config = create_test_config();
    config.fetcher.backoff_base_ms = 2_000;
    config.fetcher.max_backoff_ms = 2_000;
    let fetcher = create_fetcher(&config);

    let url = Url::parse(&format!("{}/book/1.html", server.uri())).unwrap();
    let started = Instant::now();
    let err = fetcher.fetch(&url).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn test_forbidden_status_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/book"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = create_fetcher(&create_test_config());
    let url = Url::parse(&format!("{}/book", server.uri())).unwrap();

    let err = fetcher.fetch(&url).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_server_errors_retried_until_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(html("<html><body>终于</body></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = create_fetcher(&create_test_config());
    let url = Url::parse(&format!("{}/flaky", server.uri())).unwrap();

    let body = fetcher.fetch(&url).await.unwrap();

    assert!(body.contains("终于"));
}

#[tokio::test]
async fn test_meta_refresh_is_followed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(html(
            r#"<html><head><meta http-equiv="refresh" content="0;url=/new"></head></html>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(html("<html><body>新地址</body></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = create_fetcher(&create_test_config());
    let url = Url::parse(&format!("{}/old", server.uri())).unwrap();

    let body = fetcher.fetch(&url).await.unwrap();

    assert!(body.contains("新地址"));
}

#[tokio::test]
async fn test_redirect_loop_is_bounded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html(
            r#"<html><script>window.location.href='/b';</script></html>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(html(
            r#"<html><script>window.location.href='/a';</script></html>"#,
        ))
        .mount(&server)
        .await;

    let config = create_test_config();
    let fetcher = create_fetcher(&config);
    let url = Url::parse(&format!("{}/a", server.uri())).unwrap();

    // After the hop budget the last redirect page is inspected as-is
    let body = fetcher.fetch(&url).await.unwrap();

    assert!(body.contains("window.location.href"));
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), config.fetcher.max_redirect_hops as usize + 1);
}

#[tokio::test]
async fn test_soft_not_found_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(html("<html><body><h1>404</h1><p>页面不存在</p></body></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = create_fetcher(&create_test_config());
    let url = Url::parse(&format!("{}/gone", server.uri())).unwrap();

    let err = fetcher.fetch(&url).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_non_html_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{\"ok\":true}", "application/json"))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = create_fetcher(&create_test_config());
    let url = Url::parse(&format!("{}/api", server.uri())).unwrap();

    let err = fetcher.fetch(&url).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MalformedResponse);
}

#[tokio::test]
async fn test_browser_headers_are_sent() {
    let server = MockServer::start().await;
    let page_url = format!("{}/book", server.uri());
    Mock::given(method("GET"))
        .and(path("/book"))
        .and(header("cookie", DEFAULT_COOKIE))
        .and(header("referer", page_url.as_str()))
        .and(header_exists("user-agent"))
        .and(header_exists("accept-language"))
        .respond_with(html("<html><body>ok</body></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = create_fetcher(&create_test_config());
    let url = Url::parse(&page_url).unwrap();

    assert!(fetcher.fetch(&url).await.is_ok());
}
