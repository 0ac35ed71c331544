//! The discovery cascade: sitemap, then robots.txt, then homepage crawl.
//!
//! Each stage is a [`DiscoveryStrategy`]. [`first_success`] runs them in
//! order and stops at the first one that yields URLs, so a later stage is
//! never contacted once an earlier one succeeded. [`Discoverer`] wraps the
//! cascade and always produces a [`DiscoveryResult`], empty in the worst case.

use crate::config::DiscoveryConfig;
use crate::error::{Result, ScanError};
use crate::fetch::Fetcher;
use crate::homepage::HomepageCrawler;
use crate::result::{DiscoveryResult, DiscoverySource, ResolvedUrls};
use crate::robots::RobotsResolver;
use crate::site::SiteRoot;
use crate::sitemap::SitemapResolver;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[async_trait]
pub trait DiscoveryStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// URLs for `site`, or an error when this stage found nothing usable.
    async fn resolve(&self, site: &SiteRoot) -> Result<ResolvedUrls>;
}

#[async_trait]
impl DiscoveryStrategy for SitemapResolver {
    fn name(&self) -> &'static str {
        "sitemap"
    }

    async fn resolve(&self, site: &SiteRoot) -> Result<ResolvedUrls> {
        SitemapResolver::resolve(self, site).await
    }
}

#[async_trait]
impl DiscoveryStrategy for RobotsResolver {
    fn name(&self) -> &'static str {
        "robots_txt"
    }

    async fn resolve(&self, site: &SiteRoot) -> Result<ResolvedUrls> {
        RobotsResolver::resolve(self, site).await
    }
}

#[async_trait]
impl DiscoveryStrategy for HomepageCrawler {
    fn name(&self) -> &'static str {
        "homepage_crawl"
    }

    async fn resolve(&self, site: &SiteRoot) -> Result<ResolvedUrls> {
        let urls = self.crawl(site).await;
        if urls.is_empty() {
            return Err(ScanError::NotFound(format!(
                "no links discovered on {}",
                site
            )));
        }
        Ok(ResolvedUrls::new(
            urls,
            DiscoverySource::HomepageCrawl,
            site.join("/"),
        ))
    }
}

/// Run `strategies` in order and return the first non-empty result.
pub async fn first_success(
    strategies: &[Box<dyn DiscoveryStrategy>],
    site: &SiteRoot,
) -> Option<ResolvedUrls> {
    for strategy in strategies {
        match strategy.resolve(site).await {
            Ok(resolved) if !resolved.urls.is_empty() => {
                info!(
                    "{} stage found {} URLs for {}",
                    strategy.name(),
                    resolved.urls.len(),
                    site
                );
                return Some(resolved);
            }
            Ok(_) => debug!("{} stage found no URLs for {}", strategy.name(), site),
            Err(e) => debug!("{} stage failed for {}: {}", strategy.name(), site, e),
        }
    }
    None
}

pub struct Discoverer {
    strategies: Vec<Box<dyn DiscoveryStrategy>>,
}

impl Discoverer {
    /// The standard three-stage cascade over a shared fetcher.
    pub fn new(fetcher: Arc<dyn Fetcher>, config: DiscoveryConfig) -> Self {
        Self::with_strategies(vec![
            Box::new(SitemapResolver::new(fetcher.clone(), config.clone())),
            Box::new(RobotsResolver::new(fetcher.clone(), config.clone())),
            Box::new(HomepageCrawler::new(fetcher, config)),
        ])
    }

    pub fn with_strategies(strategies: Vec<Box<dyn DiscoveryStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub async fn discover(&self, site: &SiteRoot) -> DiscoveryResult {
        match first_success(&self.strategies, site).await {
            Some(resolved) => DiscoveryResult::from_resolved(site.clone(), resolved),
            None => {
                warn!("No URLs discovered for {}", site);
                DiscoveryResult::empty(site.clone())
            }
        }
    }

    /// Like [`Discoverer::discover`], but gives up once `deadline` elapses
    /// and returns the empty result.
    pub async fn discover_with_deadline(
        &self,
        site: &SiteRoot,
        deadline: Duration,
    ) -> DiscoveryResult {
        match tokio::time::timeout(deadline, self.discover(site)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Discovery for {} exceeded {:?}", site, deadline);
                DiscoveryResult::empty(site.clone())
            }
        }
    }
}
