use crate::content::clean_content;
use crate::fetch::Fetcher;
use crate::site::SiteRoot;
use regex::Regex;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tracing::{debug, warn};

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap());

static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\+?1?[-.\s]?)?\(?([0-9]{3})\)?[-.\s]?([0-9]{3})[-.\s]?([0-9]{4})").unwrap()
});

static EXTERNAL_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"a[href*="http"]"#).unwrap());

static MAILTO_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"a[href^="mailto:"]"#).unwrap());

static ADDRESS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    [
        r#"[itemtype*="PostalAddress"]"#,
        ".address",
        "#address",
        r#"[class*="address"]"#,
        r#"[id*="address"]"#,
    ]
    .into_iter()
    .map(|css| Selector::parse(css).unwrap())
    .collect()
});

/// Paths that usually carry contact details, in preference order.
pub const CONTACT_PATHS: &[&str] = &[
    "/contact",
    "/about",
    "/about-us",
    "/contact-us",
    "/get-in-touch",
    "/reach-us",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocialPlatform {
    Facebook,
    Linkedin,
    Twitter,
    Instagram,
    Youtube,
    Tiktok,
}

impl SocialPlatform {
    pub const ALL: [SocialPlatform; 6] = [
        SocialPlatform::Facebook,
        SocialPlatform::Linkedin,
        SocialPlatform::Twitter,
        SocialPlatform::Instagram,
        SocialPlatform::Youtube,
        SocialPlatform::Tiktok,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SocialPlatform::Facebook => "facebook",
            SocialPlatform::Linkedin => "linkedin",
            SocialPlatform::Twitter => "twitter",
            SocialPlatform::Instagram => "instagram",
            SocialPlatform::Youtube => "youtube",
            SocialPlatform::Tiktok => "tiktok",
        }
    }

    fn patterns(&self) -> &'static [&'static str] {
        match self {
            SocialPlatform::Facebook => &["facebook.com", "fb.com", "facebook"],
            SocialPlatform::Linkedin => &["linkedin.com", "linkedin"],
            SocialPlatform::Twitter => &["twitter.com", "x.com", "twitter"],
            SocialPlatform::Instagram => &["instagram.com", "instagram"],
            SocialPlatform::Youtube => &["youtube.com", "youtu.be", "youtube"],
            SocialPlatform::Tiktok => &["tiktok.com", "tiktok"],
        }
    }

    fn matches(&self, href: &str) -> bool {
        let lower = href.to_lowercase();
        self.patterns().iter().any(|p| lower.contains(p))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLinks {
    pub facebook: Vec<String>,
    pub linkedin: Vec<String>,
    pub twitter: Vec<String>,
    pub instagram: Vec<String>,
    pub youtube: Vec<String>,
    pub tiktok: Vec<String>,
}

impl SocialLinks {
    pub fn links(&self, platform: SocialPlatform) -> &[String] {
        match platform {
            SocialPlatform::Facebook => &self.facebook,
            SocialPlatform::Linkedin => &self.linkedin,
            SocialPlatform::Twitter => &self.twitter,
            SocialPlatform::Instagram => &self.instagram,
            SocialPlatform::Youtube => &self.youtube,
            SocialPlatform::Tiktok => &self.tiktok,
        }
    }

    /// Links for one platform as a single `, `-separated cell.
    pub fn joined(&self, platform: SocialPlatform) -> String {
        self.links(platform).join(", ")
    }

    fn push_unique(&mut self, platform: SocialPlatform, href: &str) {
        let links = match platform {
            SocialPlatform::Facebook => &mut self.facebook,
            SocialPlatform::Linkedin => &mut self.linkedin,
            SocialPlatform::Twitter => &mut self.twitter,
            SocialPlatform::Instagram => &mut self.instagram,
            SocialPlatform::Youtube => &mut self.youtube,
            SocialPlatform::Tiktok => &mut self.tiktok,
        };
        if !links.iter().any(|l| l == href) {
            links.push(href.to_string());
        }
    }
}

/// Contact details scraped from one page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub emails: Vec<String>,
    pub social_links: SocialLinks,
    pub address: String,
    pub phone: String,
}

/// Pull emails, social profiles, a postal address and a phone number out of
/// a page.
pub fn extract_contact_info(html: &str) -> ContactInfo {
    let document = Html::parse_document(html);
    let text: String = document.root_element().text().collect();

    let mut seen = HashSet::new();
    let mut emails = Vec::new();
    let mailto = document
        .select(&MAILTO_LINK)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| href.strip_prefix("mailto:"))
        .map(|addr| addr.split('?').next().unwrap_or(addr).trim().to_string());

    for email in EMAIL
        .find_iter(&text)
        .map(|m| m.as_str().to_string())
        .chain(mailto)
    {
        if !email.is_empty() && seen.insert(email.to_lowercase()) {
            emails.push(email);
        }
    }

    let mut social_links = SocialLinks::default();
    for href in document
        .select(&EXTERNAL_LINK)
        .filter_map(|a| a.value().attr("href"))
    {
        for platform in SocialPlatform::ALL {
            if platform.matches(href) {
                social_links.push_unique(platform, href);
            }
        }
    }

    let address = ADDRESS
        .iter()
        .find_map(|selector| {
            let matches: Vec<_> = document.select(selector).collect();
            (!matches.is_empty()).then(|| {
                let raw: String = matches.iter().flat_map(|e| e.text()).collect();
                clean_content(&raw)
            })
        })
        .unwrap_or_default();

    let phone = PHONE
        .find(&text)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();

    ContactInfo {
        emails,
        social_links,
        address,
        phone,
    }
}

#[derive(Clone)]
pub struct ContactExtractor {
    fetcher: Arc<dyn Fetcher>,
    timeout: Duration,
    probe_timeout: Duration,
}

impl ContactExtractor {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            timeout: Duration::from_secs(10),
            probe_timeout: Duration::from_secs(5),
        }
    }

    /// Contact details of the page at `url`; empty when it cannot be fetched.
    pub async fn extract(&self, url: &str) -> ContactInfo {
        match self.fetcher.get_text(url, self.timeout).await {
            Ok(html) => extract_contact_info(&html),
            Err(e) => {
                warn!("Error extracting contact info from {}: {}", url, e);
                ContactInfo::default()
            }
        }
    }

    /// A discovered URL that looks like a contact or about page, else the
    /// first well-known contact path answering 200.
    pub async fn find_contact_page(&self, site: &SiteRoot, all_urls: &[String]) -> Option<String> {
        if let Some(url) = all_urls.iter().find(|url| {
            let lower = url.to_lowercase();
            CONTACT_PATHS.iter().any(|p| lower.contains(p))
        }) {
            return Some(url.clone());
        }

        for path in CONTACT_PATHS {
            let url = site.join(path);
            match self.fetcher.status(&url, self.probe_timeout).await {
                Ok(200) => return Some(url),
                Ok(status) => debug!("Contact probe {} answered {}", url, status),
                Err(e) => debug!("Contact probe {} failed: {}", url, e),
            }
        }

        None
    }
}
