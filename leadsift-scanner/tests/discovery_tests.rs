// Tests for the discovery cascade against mock sites

use async_trait::async_trait;
use leadsift_scanner::error::{Result, ScanError};
use leadsift_scanner::{
    DiscoveryConfig, DiscoveryResult, DiscoverySource, DiscoveryStrategy, Discoverer, Fetcher,
    HttpFetcher, PageCategory, ResolvedUrls, SiteRoot,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

fn fetcher() -> Arc<dyn Fetcher> {
    Arc::new(HttpFetcher::new().unwrap())
}

fn config() -> DiscoveryConfig {
    DiscoveryConfig::default().with_timeouts(Duration::from_secs(2))
}

fn urlset(locs: &[String]) -> String {
    let entries: String = locs
        .iter()
        .map(|loc| format!("<url><loc>{}</loc></url>", loc))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</urlset>"#,
        entries
    )
}

fn sitemap_index(locs: &[String]) -> String {
    let entries: String = locs
        .iter()
        .map(|loc| format!("<sitemap><loc>{}</loc></sitemap>", loc))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</sitemapindex>"#,
        entries
    )
}

async fn mount_xml(server: &MockServer, at: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "application/xml"),
        )
        .mount(server)
        .await;
}

async fn mount_html(server: &MockServer, at: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

async fn discover(server: &MockServer, config: DiscoveryConfig) -> DiscoveryResult {
    let site = SiteRoot::parse(&server.uri()).unwrap();
    Discoverer::new(fetcher(), config).discover(&site).await
}

// ============================================================================
// Sitemap Stage Tests
// ============================================================================

#[tokio::test]
async fn test_sitemap_urlset_is_classified() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_xml(
        &server,
        "/sitemap.xml",
        urlset(&[
            format!("{}/", base),
            format!("{}/pages/about-us", base),
            format!("{}/pages/contact", base),
            format!("{}/collections/all", base),
            format!("{}/products/blue-mug", base),
        ]),
    )
    .await;

    let result = discover(&server, config()).await;

    assert_eq!(result.source_used, DiscoverySource::Sitemap);
    assert_eq!(result.all_urls.len(), 5);
    assert_eq!(
        result.url_for(PageCategory::About),
        Some(format!("{}/pages/about-us", base).as_str())
    );
    assert_eq!(
        result.url_for(PageCategory::Product),
        Some(format!("{}/products/blue-mug", base).as_str())
    );
    assert_eq!(result.location, Some(format!("{}/sitemap.xml", base)));
}

#[tokio::test]
async fn test_sitemap_index_expands_children() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_xml(
        &server,
        "/sitemap.xml",
        sitemap_index(&[
            format!("{}/sitemap-pages.xml", base),
            format!("{}/sitemap-products.xml", base),
        ]),
    )
    .await;
    mount_xml(
        &server,
        "/sitemap-pages.xml",
        urlset(&[
            format!("{}/about", base),
            format!("{}/contact", base),
            format!("{}/blog", base),
        ]),
    )
    .await;
    mount_xml(
        &server,
        "/sitemap-products.xml",
        urlset(&[
            format!("{}/products/a", base),
            format!("{}/products/b", base),
            format!("{}/products/c", base),
            format!("{}/products/d", base),
        ]),
    )
    .await;

    let result = discover(&server, config()).await;

    assert_eq!(result.source_used, DiscoverySource::SitemapIndex);
    assert_eq!(result.all_urls.len(), 7);
    // children keep index order
    assert_eq!(result.all_urls[0], format!("{}/about", base));
    assert_eq!(result.all_urls[6], format!("{}/products/d", base));
}

const CHILD_DELAY: Duration = Duration::from_millis(300);

/// An index with three children that each answer after `CHILD_DELAY`.
async fn mount_slow_index(server: &MockServer) {
    let base = server.uri();
    let children: Vec<String> = (0..3)
        .map(|i| format!("{}/sitemap-{}.xml", base, i))
        .collect();
    mount_xml(server, "/sitemap.xml", sitemap_index(&children)).await;

    for i in 0..3 {
        Mock::given(method("GET"))
            .and(path(format!("/sitemap-{}.xml", i)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(urlset(&[format!("{}/page-{}", base, i)]))
                    .set_delay(CHILD_DELAY),
            )
            .expect(1)
            .mount(server)
            .await;
    }
}

#[tokio::test]
async fn test_index_children_respect_concurrency_cap() {
    let server = MockServer::start().await;
    mount_slow_index(&server).await;

    let start = Instant::now();
    let result = discover(&server, config().with_index_concurrency(1)).await;

    assert_eq!(result.all_urls.len(), 3);
    // one child at a time
    assert!(start.elapsed() >= CHILD_DELAY * 3);
}

#[tokio::test]
async fn test_index_children_fetched_concurrently_under_cap() {
    let server = MockServer::start().await;
    mount_slow_index(&server).await;

    let start = Instant::now();
    let result = discover(&server, config().with_index_concurrency(3)).await;

    assert_eq!(result.all_urls.len(), 3);
    assert_eq!(result.all_urls[0], format!("{}/page-0", server.uri()));
    assert!(start.elapsed() < CHILD_DELAY * 3);
}

#[tokio::test]
async fn test_failing_child_sitemap_is_skipped() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_xml(
        &server,
        "/sitemap.xml",
        sitemap_index(&[
            format!("{}/broken.xml", base),
            format!("{}/good.xml", base),
        ]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/broken.xml"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_xml(&server, "/good.xml", urlset(&[format!("{}/about", base)])).await;

    let result = discover(&server, config()).await;

    assert_eq!(result.source_used, DiscoverySource::SitemapIndex);
    assert_eq!(result.all_urls, vec![format!("{}/about", base)]);
}

#[tokio::test]
async fn test_malformed_first_candidate_falls_through_to_next() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_html(&server, "/sitemap.xml", "<html><body>Page not found</body></html>").await;
    mount_xml(
        &server,
        "/sitemap_index.xml",
        urlset(&[format!("{}/our-story", base)]),
    )
    .await;

    let result = discover(&server, config()).await;

    assert_eq!(result.source_used, DiscoverySource::Sitemap);
    assert_eq!(result.location, Some(format!("{}/sitemap_index.xml", base)));
    assert_eq!(
        result.url_for(PageCategory::About),
        Some(format!("{}/our-story", base).as_str())
    );
}

#[tokio::test]
async fn test_empty_sitemap_does_not_win() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_xml(&server, "/sitemap.xml", urlset(&[])).await;
    mount_xml(
        &server,
        "/sitemap/sitemap.xml",
        urlset(&[format!("{}/blog", base)]),
    )
    .await;

    let result = discover(&server, config()).await;

    assert_eq!(result.location, Some(format!("{}/sitemap/sitemap.xml", base)));
    assert_eq!(result.all_urls, vec![format!("{}/blog", base)]);
}

// ============================================================================
// robots.txt Stage Tests
// ============================================================================

#[tokio::test]
async fn test_robots_sitemap_directive() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "User-agent: *\nDisallow: /checkout\nsitemap: {}/maps/main.xml\n",
            base
        )))
        .mount(&server)
        .await;
    mount_xml(
        &server,
        "/maps/main.xml",
        urlset(&[format!("{}/contact-us", base), format!("{}/shop", base)]),
    )
    .await;

    let result = discover(&server, config()).await;

    assert_eq!(result.source_used, DiscoverySource::RobotsTxt);
    assert_eq!(
        result.url_for(PageCategory::Contact),
        Some(format!("{}/contact-us", base).as_str())
    );
    assert_eq!(
        result.url_for(PageCategory::Collections),
        Some(format!("{}/shop", base).as_str())
    );
}

#[tokio::test]
async fn test_robots_pointing_at_index_falls_through_to_homepage() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(format!("Sitemap: {}/maps/index.xml", base)),
        )
        .mount(&server)
        .await;
    mount_xml(
        &server,
        "/maps/index.xml",
        sitemap_index(&[format!("{}/maps/pages.xml", base)]),
    )
    .await;
    mount_html(&server, "/", r#"<html><body><a href="/about">About</a></body></html>"#).await;

    let result = discover(&server, config().with_probing(false)).await;

    assert_eq!(result.source_used, DiscoverySource::HomepageCrawl);
    assert_eq!(result.all_urls, vec![format!("{}/about", base)]);
}

// ============================================================================
// Homepage Crawl Stage Tests
// ============================================================================

#[tokio::test]
async fn test_homepage_links_are_normalized_and_filtered() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_html(
        &server,
        "/",
        r##"<html><body>
            <a href="/about">About</a>
            <a href="#top">Top</a>
            <a href="mailto:a@b.com">Mail</a>
            <a href="javascript:void(0)">Menu</a>
            <a href="https://other.com/about">Partner</a>
            <a href="blog?page=1#latest">Blog</a>
        </body></html>"##,
    )
    .await;

    let result = discover(&server, config().with_probing(false)).await;

    assert_eq!(result.source_used, DiscoverySource::HomepageCrawl);
    assert_eq!(
        result.all_urls,
        vec![format!("{}/about", base), format!("{}/blog", base)]
    );
    assert!(!result.all_urls.iter().any(|u| u.contains("other.com")));
    assert_eq!(
        result.url_for(PageCategory::About),
        Some(format!("{}/about", base).as_str())
    );
}

#[tokio::test]
async fn test_probed_paths_are_appended_after_links() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_html(&server, "/", r#"<html><body><a href="/blog">Blog</a></body></html>"#).await;
    mount_html(&server, "/about-us", "<html><body>About</body></html>").await;
    mount_html(&server, "/collections", "<html><body>All</body></html>").await;

    let result = discover(&server, config()).await;

    assert_eq!(result.source_used, DiscoverySource::HomepageCrawl);
    assert_eq!(
        result.all_urls,
        vec![
            format!("{}/blog", base),
            format!("{}/about-us", base),
            format!("{}/collections", base),
        ]
    );
}

#[tokio::test]
async fn test_total_failure_returns_empty_result() {
    let server = MockServer::start().await;

    // homepage fails, so guessed paths must never be probed
    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = discover(&server, config()).await;

    assert_eq!(result.source_used, DiscoverySource::None);
    assert!(result.all_urls.is_empty());
    assert!(result.categorized_urls.is_empty());
    assert!(result.location.is_none());
}

#[tokio::test]
async fn test_unreachable_site_returns_empty_result() {
    // Nothing listens on port 9 locally
    let site = SiteRoot::parse("http://127.0.0.1:9").unwrap();
    let result = Discoverer::new(fetcher(), config()).discover(&site).await;

    assert_eq!(result.source_used, DiscoverySource::None);
    assert!(result.is_empty());
}

#[tokio::test]
async fn test_deadline_aborts_slow_discovery() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let site = SiteRoot::parse(&server.uri()).unwrap();
    let discoverer = Discoverer::new(
        fetcher(),
        DiscoveryConfig::default().with_timeouts(Duration::from_secs(10)),
    );

    let result = discoverer
        .discover_with_deadline(&site, Duration::from_millis(200))
        .await;

    assert_eq!(result.source_used, DiscoverySource::None);
    assert!(result.is_empty());
}

// ============================================================================
// Cascade Tests
// ============================================================================

struct CountingStrategy {
    name: &'static str,
    urls: Vec<String>,
    source: DiscoverySource,
    calls: Arc<AtomicUsize>,
}

impl CountingStrategy {
    fn boxed(
        name: &'static str,
        urls: &[&str],
        source: DiscoverySource,
    ) -> (Box<dyn DiscoveryStrategy>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let strategy = CountingStrategy {
            name,
            urls: urls.iter().map(|u| u.to_string()).collect(),
            source,
            calls: calls.clone(),
        };
        (Box::new(strategy), calls)
    }
}

#[async_trait]
impl DiscoveryStrategy for CountingStrategy {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn resolve(&self, _site: &SiteRoot) -> Result<ResolvedUrls> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.urls.is_empty() {
            return Err(ScanError::NotFound(self.name.to_string()));
        }
        Ok(ResolvedUrls::new(self.urls.clone(), self.source, self.name))
    }
}

#[tokio::test]
async fn test_cascade_short_circuits_on_sitemap_success() {
    let (sitemap, sitemap_calls) = CountingStrategy::boxed(
        "sitemap",
        &["https://x.com/about"],
        DiscoverySource::Sitemap,
    );
    let (robots, robots_calls) =
        CountingStrategy::boxed("robots_txt", &["https://x.com/contact"], DiscoverySource::RobotsTxt);
    let (homepage, homepage_calls) = CountingStrategy::boxed(
        "homepage_crawl",
        &["https://x.com/blog"],
        DiscoverySource::HomepageCrawl,
    );

    let discoverer = Discoverer::with_strategies(vec![sitemap, robots, homepage]);
    let site = SiteRoot::parse("https://x.com").unwrap();
    let result = discoverer.discover(&site).await;

    assert_eq!(result.source_used, DiscoverySource::Sitemap);
    assert_eq!(sitemap_calls.load(Ordering::SeqCst), 1);
    assert_eq!(robots_calls.load(Ordering::SeqCst), 0);
    assert_eq!(homepage_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_cascade_tries_stages_in_order() {
    let (sitemap, sitemap_calls) = CountingStrategy::boxed("sitemap", &[], DiscoverySource::Sitemap);
    let (robots, robots_calls) = CountingStrategy::boxed("robots_txt", &[], DiscoverySource::RobotsTxt);
    let (homepage, homepage_calls) = CountingStrategy::boxed(
        "homepage_crawl",
        &["https://x.com/team", "https://x.com/team"],
        DiscoverySource::HomepageCrawl,
    );

    let discoverer = Discoverer::with_strategies(vec![sitemap, robots, homepage]);
    let site = SiteRoot::parse("https://x.com").unwrap();
    let result = discoverer.discover(&site).await;

    assert_eq!(result.source_used, DiscoverySource::HomepageCrawl);
    assert_eq!(result.all_urls, vec!["https://x.com/team"]);
    assert_eq!(sitemap_calls.load(Ordering::SeqCst), 1);
    assert_eq!(robots_calls.load(Ordering::SeqCst), 1);
    assert_eq!(homepage_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_default_cascade_order() {
    let discoverer = Discoverer::new(fetcher(), DiscoveryConfig::default());
    assert_eq!(
        discoverer.strategy_names(),
        vec!["sitemap", "robots_txt", "homepage_crawl"]
    );
}
