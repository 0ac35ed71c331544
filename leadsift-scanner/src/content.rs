use crate::fetch::Fetcher;
use scraper::{ElementRef, Html, Selector};
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tracing::{debug, warn};

/// Elements whose text is never part of page copy.
const EXCLUDED_TAGS: &[&str] = &[
    "script", "style", "noscript", "iframe", "svg", "img", "video", "audio", "form", "nav",
    "footer", "header",
];

/// Tried in order; the first selector with any match supplies the text.
const CONTENT_SELECTORS: &[&str] = &[
    "main",
    "article",
    ".main-content",
    ".content",
    "#content",
    ".post-content",
    ".entry-content",
    ".product-description",
    ".product-content",
];

const ECOMMERCE_PATTERNS: &[&str] = &[
    "/cart",
    "/product",
    "/products",
    "/collections",
    "/shop",
    "/checkout",
    "/basket",
    "/store",
    "/catalog",
    "/category",
    "/add-to-cart",
    "/shopping-cart",
    "/my-account",
    "/account",
    "/wishlist",
];

static CONTENT: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    CONTENT_SELECTORS
        .iter()
        .map(|s| Selector::parse(s).unwrap())
        .collect()
});

static BODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").unwrap());

/// Collapse runs of whitespace and drop zero-width characters.
pub fn clean_content(content: &str) -> String {
    content
        .chars()
        .filter(|c| !matches!(c, '\u{200B}'..='\u{200D}' | '\u{FEFF}'))
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Cleaned main copy of an HTML document.
pub fn extract_main_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let mut text = String::new();
    for selector in CONTENT.iter() {
        let mut matched = false;
        for element in document.select(selector).filter(|e| !is_excluded(e)) {
            matched = true;
            collect_text(element, &mut text);
        }
        if matched {
            break;
        }
    }

    if text.trim().is_empty() {
        text.clear();
        if let Some(body) = document.select(&BODY).next() {
            collect_text(body, &mut text);
        }
    }

    clean_content(&text)
}

fn is_excluded(element: &ElementRef<'_>) -> bool {
    EXCLUDED_TAGS.contains(&element.value().name())
        || element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|a| EXCLUDED_TAGS.contains(&a.value().name()))
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child) = ElementRef::wrap(child)
            && !EXCLUDED_TAGS.contains(&child.value().name())
        {
            collect_text(child, out);
        }
    }
}

/// True when any URL looks like part of a storefront (cart, products, ...).
pub fn is_ecommerce_store<S: AsRef<str>>(urls: &[S]) -> bool {
    urls.iter().any(|url| {
        let lower = url.as_ref().to_lowercase();
        ECOMMERCE_PATTERNS.iter().any(|p| lower.contains(p))
    })
}

#[derive(Clone)]
pub struct ContentScraper {
    fetcher: Arc<dyn Fetcher>,
    timeout: Duration,
}

impl ContentScraper {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Main copy of the page at `url`; `None` when the fetch fails or the
    /// page has no text.
    pub async fn scrape(&self, url: &str) -> Option<String> {
        let html = match self.fetcher.get_text(url, self.timeout).await {
            Ok(html) => html,
            Err(e) => {
                warn!("Error scraping content from {}: {}", url, e);
                return None;
            }
        };

        let text = extract_main_text(&html);
        debug!("Scraped {} characters from {}", text.len(), url);
        (!text.is_empty()).then_some(text)
    }

    /// Scrape an optional URL, for category slots that may be empty.
    pub async fn scrape_opt(&self, url: Option<&str>) -> Option<String> {
        match url {
            Some(url) => self.scrape(url).await,
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_content() {
        assert_eq!(clean_content("  Hello \n\n\t world\u{200B}!  "), "Hello world!");
        assert_eq!(clean_content("\u{FEFF}"), "");
        assert_eq!(clean_content(""), "");
    }

    #[test]
    fn test_main_text_prefers_main_element() {
        let html = r#"<html><body>
            <header>Site header</header>
            <main>
                <h1>Our Story</h1>
                <p>We roast coffee.</p>
                <script>var x = 1;</script>
            </main>
            <footer>Footer</footer>
        </body></html>"#;

        assert_eq!(extract_main_text(html), "Our Story We roast coffee.");
    }

    #[test]
    fn test_main_text_falls_back_to_body_without_chrome() {
        let html = r#"<html><body>
            <nav>Menu</nav>
            <div> Handmade   mugs </div>
            <form><label>Email</label></form>
            <style>.x { color: red }</style>
        </body></html>"#;

        assert_eq!(extract_main_text(html), "Handmade mugs");
    }

    #[test]
    fn test_main_text_uses_class_selector() {
        let html = r#"<html><body>
            <div class="sidebar">Ignore me</div>
            <div class="entry-content"><p>The real post.</p></div>
        </body></html>"#;

        assert_eq!(extract_main_text(html), "The real post.");
    }

    #[test]
    fn test_main_text_skips_matches_inside_excluded_elements() {
        let html = r#"<html><body>
            <nav><div class="content">Nav content</div></nav>
            <p>Body text</p>
        </body></html>"#;

        assert_eq!(extract_main_text(html), "Body text");
    }

    #[test]
    fn test_is_ecommerce_store() {
        assert!(is_ecommerce_store(&["https://x.com/", "https://x.com/cart"]));
        assert!(is_ecommerce_store(&["https://x.com/Collections/all"]));
        assert!(!is_ecommerce_store(&["https://x.com/about", "https://x.com/blog"]));

        let none: Vec<String> = Vec::new();
        assert!(!is_ecommerce_store(&none));
    }
}
