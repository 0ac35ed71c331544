pub mod classify;
pub mod config;
pub mod contact;
pub mod content;
pub mod discovery;
pub mod error;
pub mod fetch;
pub mod homepage;
pub mod platform;
pub mod result;
pub mod robots;
pub mod site;
pub mod sitemap;

pub use classify::{CategorizedUrls, PageCategory, classify};
pub use config::DiscoveryConfig;
pub use contact::{ContactExtractor, ContactInfo, SocialPlatform};
pub use content::ContentScraper;
pub use discovery::{Discoverer, DiscoveryStrategy, first_success};
pub use error::ScanError;
pub use fetch::{Fetcher, HttpFetcher};
pub use homepage::HomepageCrawler;
pub use platform::{Integrations, Platform, PlatformDetector};
pub use result::{DiscoveryResult, DiscoverySource, ResolvedUrls};
pub use robots::RobotsResolver;
pub use site::SiteRoot;
pub use sitemap::SitemapResolver;
