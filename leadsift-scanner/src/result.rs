use crate::classify::{CategorizedUrls, PageCategory, classify};
use crate::site::SiteRoot;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Which stage of the discovery cascade produced the URL list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoverySource {
    Sitemap,
    SitemapIndex,
    RobotsTxt,
    HomepageCrawl,
    None,
}

impl DiscoverySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscoverySource::Sitemap => "sitemap",
            DiscoverySource::SitemapIndex => "sitemap_index",
            DiscoverySource::RobotsTxt => "robots_txt",
            DiscoverySource::HomepageCrawl => "homepage_crawl",
            DiscoverySource::None => "none",
        }
    }
}

impl fmt::Display for DiscoverySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// URLs produced by one successful strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUrls {
    pub urls: Vec<String>,
    pub source: DiscoverySource,
    /// Document the URLs were read from (sitemap URL or homepage).
    pub location: Option<String>,
}

impl ResolvedUrls {
    pub fn new(urls: Vec<String>, source: DiscoverySource, location: impl Into<String>) -> Self {
        Self {
            urls,
            source,
            location: Some(location.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscoveryResult {
    pub site: SiteRoot,
    pub categorized_urls: CategorizedUrls,
    pub all_urls: Vec<String>,
    pub source_used: DiscoverySource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl DiscoveryResult {
    /// Nothing discovered: every category empty, no URLs.
    pub fn empty(site: SiteRoot) -> Self {
        Self {
            site,
            categorized_urls: CategorizedUrls::default(),
            all_urls: Vec::new(),
            source_used: DiscoverySource::None,
            location: None,
        }
    }

    /// Deduplicate the resolved list and classify it.
    pub fn from_resolved(site: SiteRoot, resolved: ResolvedUrls) -> Self {
        let all_urls = unique_in_order(resolved.urls);
        let categorized_urls = classify(&all_urls);

        Self {
            site,
            categorized_urls,
            all_urls,
            source_used: resolved.source,
            location: resolved.location,
        }
    }

    pub fn url_for(&self, category: PageCategory) -> Option<&str> {
        self.categorized_urls.get(category)
    }

    pub fn is_empty(&self) -> bool {
        self.all_urls.is_empty()
    }
}

/// Drop exact duplicates, keeping the first occurrence.
pub(crate) fn unique_in_order(urls: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(urls.len());
    urls.into_iter()
        .filter(|url| seen.insert(url.clone()))
        .collect()
}
