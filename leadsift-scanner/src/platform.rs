use crate::fetch::Fetcher;
use crate::site::SiteRoot;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Platform {
    Shopify,
    WooCommerce,
    BigCommerce,
    Webflow,
    #[default]
    Unknown,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Shopify => "Shopify",
            Platform::WooCommerce => "WooCommerce",
            Platform::BigCommerce => "BigCommerce",
            Platform::Webflow => "Webflow",
            Platform::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lower-cased substrings that identify a platform in raw page source.
const PLATFORM_SIGNATURES: &[(Platform, &[&str])] = &[
    (
        Platform::Shopify,
        &["cdn.shopify.com", "window.shopify", "shopify.com", "myshopify.com"],
    ),
    (
        Platform::WooCommerce,
        &["woocommerce", "wp-content/plugins/woocommerce", "wc-", "woocommerce-"],
    ),
    (
        Platform::BigCommerce,
        &["stencil-utils", "cdn.bcapps.net", "bigcommerce.com", "bc-sf-filter"],
    ),
    (
        Platform::Webflow,
        &["webflow.js", "data-wf-page", "webflow.push", "webflow.com"],
    ),
];

/// Marketing integrations found on a page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Integrations {
    pub klaviyo: bool,
    pub meta: bool,
}

const KLAVIYO_SIGNATURES: &[&str] = &["klaviyo.js", "static.klaviyo.com", "klaviyo.com", "klaviyo"];

const META_SIGNATURES: &[&str] = &[
    "fbq('init')",
    "connect.facebook.net",
    "facebook.com",
    "fbq(",
    "facebook pixel",
];

static GENERATOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[name="generator"]"#).unwrap());

/// Marker elements checked once no source signature matched.
static MARKERS: LazyLock<Vec<(Platform, Selector)>> = LazyLock::new(|| {
    [
        (Platform::Shopify, ".shopify-section"),
        (Platform::WooCommerce, ".woocommerce"),
        (Platform::BigCommerce, "[data-bc-sf-filter]"),
    ]
    .into_iter()
    .map(|(platform, css)| (platform, Selector::parse(css).unwrap()))
    .collect()
});

/// Identify the storefront platform from raw page source.
///
/// Source signatures win, then the generator meta tag, then marker classes.
pub fn detect_platform(html: &str) -> Platform {
    let lower = html.to_lowercase();

    for (platform, signatures) in PLATFORM_SIGNATURES {
        if signatures.iter().any(|s| lower.contains(s)) {
            return *platform;
        }
    }

    let document = Html::parse_document(html);

    if let Some(meta) = document.select(&GENERATOR).next()
        && let Some(generator) = meta.value().attr("content")
    {
        let generator = generator.to_lowercase();
        if generator.contains("shopify") {
            return Platform::Shopify;
        }
        if generator.contains("woocommerce") {
            return Platform::WooCommerce;
        }
    }

    MARKERS
        .iter()
        .find(|(_, selector)| document.select(selector).next().is_some())
        .map(|(platform, _)| *platform)
        .unwrap_or_default()
}

pub fn detect_integrations(html: &str) -> Integrations {
    let lower = html.to_lowercase();
    Integrations {
        klaviyo: KLAVIYO_SIGNATURES.iter().any(|s| lower.contains(s)),
        meta: META_SIGNATURES.iter().any(|s| lower.contains(s)),
    }
}

/// Fetches a site's homepage once and fingerprints it.
#[derive(Clone)]
pub struct PlatformDetector {
    fetcher: Arc<dyn Fetcher>,
    timeout: Duration,
}

impl PlatformDetector {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            timeout: Duration::from_secs(10),
        }
    }

    /// Platform and integrations of `site`; an unreachable homepage gives
    /// `Unknown` and no integrations.
    pub async fn inspect(&self, site: &SiteRoot) -> (Platform, Integrations) {
        let homepage = site.join("/");
        match self.fetcher.get_text(&homepage, self.timeout).await {
            Ok(html) => {
                let platform = detect_platform(&html);
                let integrations = detect_integrations(&html);
                debug!("{} runs on {} ({:?})", site, platform, integrations);
                (platform, integrations)
            }
            Err(e) => {
                warn!("Error detecting platform for {}: {}", site, e);
                (Platform::Unknown, Integrations::default())
            }
        }
    }
}
