use crate::config::{DiscoveryConfig, SITEMAP_PATHS};
use crate::error::{Result, ScanError};
use crate::fetch::Fetcher;
use crate::result::{DiscoverySource, ResolvedUrls, unique_in_order};
use crate::site::SiteRoot;
use futures::stream::{self, StreamExt};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A parsed sitemap: either page URLs or child sitemap URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapDocument {
    UrlSet(Vec<String>),
    Index(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RootKind {
    UrlSet,
    Index,
}

impl RootKind {
    fn from_root(name: &str) -> Result<Self> {
        match name {
            "urlset" => Ok(RootKind::UrlSet),
            "sitemapindex" => Ok(RootKind::Index),
            other => Err(ScanError::ParseError(format!(
                "unexpected root element <{}>",
                other
            ))),
        }
    }

    fn entry_tag(&self) -> &'static str {
        match self {
            RootKind::UrlSet => "url",
            RootKind::Index => "sitemap",
        }
    }
}

/// Parse a sitemap or sitemap index.
///
/// Only `<loc>` elements directly inside a `<url>` (or `<sitemap>`) entry are
/// collected. Namespace prefixes are ignored. A document that ends with open
/// elements, has no root, or has a root other than `urlset`/`sitemapindex`
/// is a [`ScanError::ParseError`].
pub fn parse_sitemap(xml: &str) -> Result<SitemapDocument> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut kind: Option<RootKind> = None;
    let mut open: Vec<String> = Vec::new();
    let mut locs = Vec::new();
    let mut current_loc: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                match kind {
                    None => kind = Some(RootKind::from_root(&name)?),
                    Some(_) if open.is_empty() => {
                        return Err(ScanError::ParseError(
                            "more than one root element".to_string(),
                        ));
                    }
                    Some(k) => {
                        if name == "loc" && open.len() == 2 && open[1] == k.entry_tag() {
                            current_loc = Some(String::new());
                        }
                    }
                }
                open.push(name);
            }
            Event::Empty(e) if open.is_empty() => {
                if kind.is_some() {
                    return Err(ScanError::ParseError(
                        "more than one root element".to_string(),
                    ));
                }
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                kind = Some(RootKind::from_root(&name)?);
            }
            Event::Text(e) => {
                if let Some(buf) = current_loc.as_mut() {
                    let text = e
                        .unescape()
                        .map_err(|err| ScanError::ParseError(err.to_string()))?;
                    buf.push_str(&text);
                }
            }
            Event::CData(e) => {
                if let Some(buf) = current_loc.as_mut() {
                    buf.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::End(_) => {
                if let Some(name) = open.pop()
                    && name == "loc"
                    && let Some(loc) = current_loc.take()
                {
                    let loc = loc.trim();
                    if !loc.is_empty() {
                        locs.push(loc.to_string());
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(unclosed) = open.last() {
        return Err(ScanError::ParseError(format!(
            "document ended inside <{}>",
            unclosed
        )));
    }

    match kind {
        Some(RootKind::UrlSet) => Ok(SitemapDocument::UrlSet(locs)),
        Some(RootKind::Index) => Ok(SitemapDocument::Index(locs)),
        None => Err(ScanError::ParseError("no root element".to_string())),
    }
}

/// First stage of discovery: well-known sitemap locations.
#[derive(Clone)]
pub struct SitemapResolver {
    fetcher: Arc<dyn Fetcher>,
    config: DiscoveryConfig,
}

impl SitemapResolver {
    pub fn new(fetcher: Arc<dyn Fetcher>, config: DiscoveryConfig) -> Self {
        Self { fetcher, config }
    }

    /// Try every candidate path in order; the first that yields at least one
    /// URL wins. A failing candidate never stops the search.
    pub async fn resolve(&self, site: &SiteRoot) -> Result<ResolvedUrls> {
        for path in SITEMAP_PATHS {
            let candidate = site.join(path);

            match self.resolve_candidate(&candidate).await {
                Ok(resolved) if !resolved.urls.is_empty() => {
                    info!(
                        "Found sitemap at {} with {} URLs",
                        candidate,
                        resolved.urls.len()
                    );
                    return Ok(resolved);
                }
                Ok(_) => debug!("Sitemap at {} lists no URLs", candidate),
                Err(e) => debug!("Sitemap not found at {}: {}", candidate, e),
            }
        }

        Err(ScanError::NotFound(format!("no sitemap found for {}", site)))
    }

    /// Fetch one sitemap URL, expanding it if it is an index.
    pub async fn resolve_candidate(&self, url: &str) -> Result<ResolvedUrls> {
        match self.fetch_document(url).await? {
            SitemapDocument::UrlSet(urls) => Ok(ResolvedUrls::new(
                unique_in_order(urls),
                DiscoverySource::Sitemap,
                url,
            )),
            SitemapDocument::Index(children) => {
                debug!("{} is a sitemap index with {} children", url, children.len());
                let urls = self.expand_index(children).await;
                Ok(ResolvedUrls::new(urls, DiscoverySource::SitemapIndex, url))
            }
        }
    }

    pub async fn fetch_document(&self, url: &str) -> Result<SitemapDocument> {
        let body = self
            .fetcher
            .get_text(url, self.config.sitemap_timeout)
            .await?;
        parse_sitemap(&body)
    }

    /// Children are fetched concurrently but concatenated in index order.
    /// Failing children and nested indexes are skipped.
    async fn expand_index(&self, children: Vec<String>) -> Vec<String> {
        let cap = self.config.index_concurrency.max(1);

        let expanded: Vec<Vec<String>> = stream::iter(children)
            .map(|child| async move {
                match self.fetch_document(&child).await {
                    Ok(SitemapDocument::UrlSet(urls)) => urls,
                    Ok(SitemapDocument::Index(_)) => {
                        debug!("Skipping nested sitemap index {}", child);
                        Vec::new()
                    }
                    Err(e) => {
                        warn!("Skipping child sitemap {}: {}", child, e);
                        Vec::new()
                    }
                }
            })
            .buffered(cap)
            .collect()
            .await;

        unique_in_order(expanded.into_iter().flatten().collect())
    }
}
