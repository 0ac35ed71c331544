use crate::config::DiscoveryConfig;
use crate::error::{Result, ScanError};
use crate::fetch::Fetcher;
use crate::result::{DiscoverySource, ResolvedUrls, unique_in_order};
use crate::site::SiteRoot;
use crate::sitemap::{SitemapDocument, parse_sitemap};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::{debug, info};

static SITEMAP_DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)sitemap:\s*(.+)").unwrap());

/// URL of the first `Sitemap:` directive in a robots.txt body.
pub fn find_sitemap_directive(robots: &str) -> Option<String> {
    robots.lines().find_map(|line| {
        SITEMAP_DIRECTIVE
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|url| !url.is_empty())
    })
}

/// Second stage of discovery: the sitemap advertised by robots.txt.
#[derive(Clone)]
pub struct RobotsResolver {
    fetcher: Arc<dyn Fetcher>,
    config: DiscoveryConfig,
}

impl RobotsResolver {
    pub fn new(fetcher: Arc<dyn Fetcher>, config: DiscoveryConfig) -> Self {
        Self { fetcher, config }
    }

    pub async fn resolve(&self, site: &SiteRoot) -> Result<ResolvedUrls> {
        let robots_url = site.join("/robots.txt");
        let robots = self
            .fetcher
            .get_text(&robots_url, self.config.robots_timeout)
            .await?;

        let sitemap_url = find_sitemap_directive(&robots).ok_or_else(|| {
            ScanError::NotFound(format!("no Sitemap directive in {}", robots_url))
        })?;
        debug!("robots.txt for {} points to {}", site, sitemap_url);

        let body = self
            .fetcher
            .get_text(&sitemap_url, self.config.sitemap_timeout)
            .await?;

        match parse_sitemap(&body)? {
            SitemapDocument::UrlSet(urls) if !urls.is_empty() => {
                info!(
                    "Found sitemap via robots.txt at {} with {} URLs",
                    sitemap_url,
                    urls.len()
                );
                Ok(ResolvedUrls::new(
                    unique_in_order(urls),
                    DiscoverySource::RobotsTxt,
                    sitemap_url,
                ))
            }
            SitemapDocument::UrlSet(_) => Err(ScanError::NotFound(format!(
                "sitemap {} lists no URLs",
                sitemap_url
            ))),
            SitemapDocument::Index(_) => Err(ScanError::NotFound(format!(
                "sitemap {} is an index",
                sitemap_url
            ))),
        }
    }
}
