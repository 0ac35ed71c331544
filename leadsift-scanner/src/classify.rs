//! Deterministic URL → page category assignment.
//!
//! Every discovery source feeds its URL list through [`classify`]. URLs are
//! ordered shortest first, so `/about` beats `/about/our-extended-team`, and
//! each category keeps the first URL that matched it.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageCategory {
    About,
    Contact,
    Collections,
    Product,
    Blog,
}

impl PageCategory {
    pub const ALL: [PageCategory; 5] = [
        PageCategory::About,
        PageCategory::Contact,
        PageCategory::Collections,
        PageCategory::Product,
        PageCategory::Blog,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PageCategory::About => "about",
            PageCategory::Contact => "contact",
            PageCategory::Collections => "collections",
            PageCategory::Product => "product",
            PageCategory::Blog => "blog",
        }
    }

    /// Path fragments, each anchored at the start of a path segment.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            PageCategory::About => &[
                "/about",
                "/about-us",
                "/about-our-company",
                "/our-story",
                "/who-we-are",
                "/company",
                "/team",
                "/story",
                "/mission",
                "/vision",
                "/values",
            ],
            PageCategory::Contact => &[
                "/contact",
                "/contact-us",
                "/get-in-touch",
                "/reach-us",
                "/connect",
                "/support",
                "/help",
                "/get-help",
            ],
            PageCategory::Collections => &[
                "/collections",
                "/shop",
                "/category",
                "/products",
                "/store",
                "/catalog",
                "/browse",
                "/menu",
                "/services",
                "/offerings",
            ],
            PageCategory::Product => &[
                "/product/",
                "/products/",
                "/item/",
                "/p/",
                "/product-detail",
                "/buy/",
                "/shop/",
                "/detail/",
                "/view/",
            ],
            PageCategory::Blog => &[
                "/blog",
                "/news",
                "/articles",
                "/posts",
                "/journal",
                "/magazine",
                "/insights",
                "/resources",
                "/updates",
            ],
        }
    }

    /// `path` must already be lower-cased.
    pub fn matches_path(&self, path: &str) -> bool {
        self.keywords().iter().any(|keyword| path.contains(keyword))
    }
}

impl fmt::Display for PageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One optional URL per page category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorizedUrls {
    pub about: Option<String>,
    pub contact: Option<String>,
    pub collections: Option<String>,
    pub product: Option<String>,
    pub blog: Option<String>,
}

impl CategorizedUrls {
    pub fn get(&self, category: PageCategory) -> Option<&str> {
        self.slot(category).as_deref()
    }

    /// Copy of `self` with `category` filled, unless it already was.
    pub fn with(mut self, category: PageCategory, url: &str) -> Self {
        let slot = self.slot_mut(category);
        if slot.is_none() {
            *slot = Some(url.to_string());
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        PageCategory::ALL.iter().all(|c| self.slot(*c).is_none())
    }

    /// Filled categories with their URLs, in category order.
    pub fn iter(&self) -> impl Iterator<Item = (PageCategory, &str)> + '_ {
        PageCategory::ALL
            .into_iter()
            .filter_map(move |c| self.get(c).map(|url| (c, url)))
    }

    fn slot(&self, category: PageCategory) -> &Option<String> {
        match category {
            PageCategory::About => &self.about,
            PageCategory::Contact => &self.contact,
            PageCategory::Collections => &self.collections,
            PageCategory::Product => &self.product,
            PageCategory::Blog => &self.blog,
        }
    }

    fn slot_mut(&mut self, category: PageCategory) -> &mut Option<String> {
        match category {
            PageCategory::About => &mut self.about,
            PageCategory::Contact => &mut self.contact,
            PageCategory::Collections => &mut self.collections,
            PageCategory::Product => &mut self.product,
            PageCategory::Blog => &mut self.blog,
        }
    }
}

/// Assign at most one URL to each page category.
///
/// Input order does not matter: URLs are ordered by length, then
/// lexicographically, before a single pass fills every empty category the
/// URL matches. One URL may fill several categories.
pub fn classify<S: AsRef<str>>(urls: &[S]) -> CategorizedUrls {
    let mut sorted: Vec<&str> = urls.iter().map(AsRef::as_ref).collect();
    sorted.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));

    sorted.into_iter().fold(CategorizedUrls::default(), |acc, url| {
        let path = lowercase_path(url);
        let hits: Vec<PageCategory> = PageCategory::ALL
            .into_iter()
            .filter(|c| acc.get(*c).is_none() && c.matches_path(&path))
            .collect();

        hits.into_iter().fold(acc, |acc, category| acc.with(category, url))
    })
}

/// Lower-cased path of `url`; hostnames and query strings never match.
fn lowercase_path(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => parsed.path().to_lowercase(),
        Err(_) => {
            let end = url.find(['?', '#']).unwrap_or(url.len());
            url[..end].to_lowercase()
        }
    }
}
