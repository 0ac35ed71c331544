use crate::config::{DiscoveryConfig, PROBE_PATHS};
use crate::fetch::Fetcher;
use crate::site::SiteRoot;
use futures::future::join_all;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::{Arc, LazyLock};
use tracing::{debug, info, warn};
use url::Url;

static LINK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// Resolve an anchor href against the site root.
///
/// Script, mail, phone and in-page anchors are dropped. The returned URL has
/// no query string or fragment.
pub fn normalize_href(site: &SiteRoot, href: &str) -> Option<Url> {
    let href = href.trim();
    let lower = href.to_ascii_lowercase();

    if href.is_empty()
        || href.starts_with('#')
        || lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
    {
        return None;
    }

    let mut url = site.url().join(href).ok()?;
    url.set_fragment(None);
    url.set_query(None);
    Some(url)
}

/// Same-origin links of a page, in document order, without duplicates.
pub fn extract_links(html: &str, site: &SiteRoot) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&LINK_SELECTOR) {
        if let Some(href) = element.value().attr("href")
            && let Some(url) = normalize_href(site, href)
        {
            if !site.is_same_origin(&url) {
                debug!("  -> Cross-origin link {}, skipping", url);
                continue;
            }

            let url = url.to_string();
            if seen.insert(url.clone()) {
                links.push(url);
            }
        }
    }

    links
}

/// Last stage of discovery: one hop of links from the homepage plus a few
/// guessed paths.
#[derive(Clone)]
pub struct HomepageCrawler {
    fetcher: Arc<dyn Fetcher>,
    config: DiscoveryConfig,
}

impl HomepageCrawler {
    pub fn new(fetcher: Arc<dyn Fetcher>, config: DiscoveryConfig) -> Self {
        Self { fetcher, config }
    }

    /// Never fails; an unreachable homepage yields an empty list and no
    /// probes are sent.
    pub async fn crawl(&self, site: &SiteRoot) -> Vec<String> {
        let homepage = site.join("/");

        let html = match self
            .fetcher
            .get_text(&homepage, self.config.homepage_timeout)
            .await
        {
            Ok(html) => html,
            Err(e) => {
                warn!("Could not fetch homepage {}: {}", homepage, e);
                return Vec::new();
            }
        };

        let mut urls = extract_links(&html, site);
        debug!("Homepage {} links to {} same-origin URLs", homepage, urls.len());

        if self.config.probe_common_paths {
            for url in self.probe(site).await {
                if !urls.contains(&url) {
                    urls.push(url);
                }
            }
        }

        info!("Homepage crawl of {} found {} URLs", site, urls.len());
        urls
    }

    /// Guessed paths answering with a status below 400, in probe order.
    pub async fn probe(&self, site: &SiteRoot) -> Vec<String> {
        let checks = PROBE_PATHS.iter().map(|path| {
            let url = site.join(path);
            async move {
                match self.fetcher.status(&url, self.config.probe_timeout).await {
                    Ok(status) if status < 400 => {
                        debug!("Probe {} answered {}", url, status);
                        Some(url)
                    }
                    Ok(status) => {
                        debug!("Probe {} answered {}, skipping", url, status);
                        None
                    }
                    Err(e) => {
                        debug!("Probe {} failed: {}", url, e);
                        None
                    }
                }
            }
        });

        join_all(checks).await.into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> SiteRoot {
        SiteRoot::parse("https://example.com").unwrap()
    }

    #[test]
    fn test_normalize_root_relative() {
        let url = normalize_href(&site(), "/about").unwrap();
        assert_eq!(url.as_str(), "https://example.com/about");
    }

    #[test]
    fn test_normalize_plain_relative() {
        let url = normalize_href(&site(), "pages/contact").unwrap();
        assert_eq!(url.as_str(), "https://example.com/pages/contact");
    }

    #[test]
    fn test_normalize_strips_query_and_fragment() {
        let url = normalize_href(&site(), "/collections/all?page=2#grid").unwrap();
        assert_eq!(url.as_str(), "https://example.com/collections/all");
    }

    #[test]
    fn test_normalize_discards_non_navigational_links() {
        for href in [
            "#top",
            "mailto:a@b.com",
            "javascript:void(0)",
            "JavaScript:void(0)",
            "tel:+15551234567",
            "",
            "   ",
        ] {
            assert!(normalize_href(&site(), href).is_none(), "{} was kept", href);
        }
    }

    #[test]
    fn test_extract_links_keeps_document_order_and_dedups() {
        let html = r#"<html><body>
            <a href="/about">About</a>
            <a href="https://example.com/shop">Shop</a>
            <a href="/about#team">Team</a>
            <a href="/contact?ref=nav">Contact</a>
        </body></html>"#;

        let links = extract_links(html, &site());

        assert_eq!(
            links,
            vec![
                "https://example.com/about",
                "https://example.com/shop",
                "https://example.com/contact",
            ]
        );
    }

    #[test]
    fn test_extract_links_excludes_other_origins() {
        let html = r#"<html><body>
            <a href="https://other.com/about">Other</a>
            <a href="https://blog.example.com/post">Blog</a>
            <a href="http://example.com/insecure">Insecure</a>
            <a href="//cdn.example.net/file">CDN</a>
            <a href="/story">Story</a>
        </body></html>"#;

        let links = extract_links(html, &site());

        assert_eq!(links, vec!["https://example.com/story"]);
    }

    #[test]
    fn test_extract_links_without_anchors() {
        assert!(extract_links("<html><body><p>hi</p></body></html>", &site()).is_empty());
        assert!(extract_links("", &site()).is_empty());
    }
}
