use crate::fetch::BROWSER_USER_AGENT;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Well-known sitemap locations, tried in this order.
pub const SITEMAP_PATHS: &[&str] = &[
    "/sitemap.xml",
    "/sitemap_index.xml",
    "/sitemap-index.xml",
    "/sitemap/sitemap.xml",
    "/sitemap/sitemap-index.xml",
];

/// Paths probed after a homepage crawl even when nothing links to them.
pub const PROBE_PATHS: &[&str] = &[
    "/about",
    "/about-us",
    "/shop",
    "/products",
    "/collections",
    "/store",
    "/catalog",
    "/contact",
    "/contact-us",
];

/// Timeouts and limits for one discovery cascade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    pub sitemap_timeout: Duration,
    pub robots_timeout: Duration,
    pub homepage_timeout: Duration,
    pub probe_timeout: Duration,
    /// Child sitemaps of an index fetched at once.
    pub index_concurrency: usize,
    pub probe_common_paths: bool,
    pub user_agent: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            sitemap_timeout: Duration::from_secs(10),
            robots_timeout: Duration::from_secs(5),
            homepage_timeout: Duration::from_secs(15),
            probe_timeout: Duration::from_secs(5),
            index_concurrency: 4,
            probe_common_paths: true,
            user_agent: BROWSER_USER_AGENT.to_string(),
        }
    }
}

impl DiscoveryConfig {
    pub fn with_probing(mut self, enabled: bool) -> Self {
        self.probe_common_paths = enabled;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_index_concurrency(mut self, concurrency: usize) -> Self {
        self.index_concurrency = concurrency.max(1);
        self
    }

    /// Scale every timeout down, mostly for tests against local servers.
    pub fn with_timeouts(mut self, timeout: Duration) -> Self {
        self.sitemap_timeout = timeout;
        self.robots_timeout = timeout;
        self.homepage_timeout = timeout;
        self.probe_timeout = timeout;
        self
    }
}
