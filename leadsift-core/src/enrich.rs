use crate::config::EnrichConfig;
use crate::email::{EmailOutcome, EmailService};
use crate::error::{EnrichError, Result};
use crate::icebreaker::IcebreakerService;
use crate::lead::Lead;
use crate::row::LeadRow;
use indicatif::{ProgressBar, ProgressStyle};
use leadsift_scanner::content::is_ecommerce_store;
use leadsift_scanner::{
    ContactExtractor, ContactInfo, ContentScraper, Discoverer, DiscoveryConfig, DiscoveryResult,
    Fetcher, Integrations, PageCategory, Platform, PlatformDetector, SiteRoot, SocialPlatform,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Default per-lead discovery deadline.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(60);

/// Options for configuring an enrichment run
pub struct EnrichOptions {
    pub leads: Vec<Lead>,
    pub workers: usize,
    pub deadline: Duration,
    pub show_progress_bars: bool,
}

/// Callback for reporting enrichment progress
pub type EnrichProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Everything a lead is run through. Cheap to clone; clones share the HTTP
/// pool and the icebreaker's rate limiter.
#[derive(Clone)]
pub struct EnrichServices {
    pub discoverer: Arc<Discoverer>,
    pub scraper: ContentScraper,
    pub platform: PlatformDetector,
    pub contact: ContactExtractor,
    pub email: Option<EmailService>,
    pub icebreaker: Option<IcebreakerService>,
}

impl EnrichServices {
    pub fn new(fetcher: Arc<dyn Fetcher>, discovery: DiscoveryConfig, config: &EnrichConfig) -> Self {
        Self {
            discoverer: Arc::new(Discoverer::new(fetcher.clone(), discovery)),
            scraper: ContentScraper::new(fetcher.clone()),
            platform: PlatformDetector::new(fetcher.clone()),
            contact: ContactExtractor::new(fetcher),
            email: EmailService::from_config(config),
            icebreaker: IcebreakerService::from_config(config),
        }
    }
}

/// Scraped main copy of each category page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageCopy {
    pub about: Option<String>,
    pub collections: Option<String>,
    pub product: Option<String>,
    pub blog: Option<String>,
}

/// Everything learned about one lead, before flattening into a row.
#[derive(Debug, Clone)]
pub struct LeadFindings {
    pub lead: Lead,
    pub site: SiteRoot,
    pub discovery: DiscoveryResult,
    pub about_url: Option<String>,
    pub contact_url: Option<String>,
    pub copy: PageCopy,
    pub platform: Platform,
    pub integrations: Integrations,
    pub contact: ContactInfo,
    pub email: EmailOutcome,
    pub about_summary: String,
    pub icebreaker: String,
}

fn or_else(primary: &str, fallback: Option<&String>) -> String {
    if primary.is_empty() {
        fallback.cloned().unwrap_or_default()
    } else {
        primary.to_string()
    }
}

impl LeadFindings {
    pub fn into_row(self) -> LeadRow {
        let LeadFindings {
            lead,
            site,
            discovery,
            about_url,
            contact_url,
            copy,
            platform,
            integrations,
            contact,
            email,
            about_summary,
            icebreaker,
        } = self;

        let social = &contact.social_links;
        let pages_is_ecommerce = is_ecommerce_store(&discovery.all_urls);
        let category = |c: PageCategory| discovery.url_for(c).unwrap_or_default().to_string();

        let mut seen = HashSet::new();
        let email_candidates: Vec<String> = email
            .email
            .iter()
            .chain(lead.email.iter())
            .chain(contact.emails.iter())
            .filter(|e| seen.insert(e.to_lowercase()))
            .cloned()
            .collect();

        let all_social: Vec<&str> = SocialPlatform::ALL
            .iter()
            .flat_map(|p| social.links(*p).iter().map(String::as_str))
            .collect();

        LeadRow {
            id: uuid::Uuid::new_v4().to_string(),
            domain: site.domain().to_string(),
            updated_at: chrono::Utc::now().to_rfc3339(),
            contact_first_name: lead.first_name.clone().unwrap_or_default(),
            contact_last_name: lead.last_name.clone().unwrap_or_default(),
            contact_full_name: lead.full_name(),
            contact_email: email.email.clone().or(lead.email.clone()).unwrap_or_default(),
            contact_title: lead.title.clone().unwrap_or_default(),
            contact_headline: String::new(),
            contact_linkedin_url: String::new(),
            contact_is_valid_email: email.is_valid,
            contact_validation_status: email.validation_status,
            contact_validation_source: email.validation_source,
            organization_primary_domain: site.domain().to_string(),
            organization_linkedin_url: or_else(&email.company.linkedin_url, social.linkedin.first()),
            organization_facebook_url: or_else(&email.company.facebook_url, social.facebook.first()),
            organization_founded_year: email.company.founded,
            organization_city: String::new(),
            organization_country: String::new(),
            organization_address: contact.address.clone(),
            organization_estimated_num_employees: email.company.size,
            organization_platform: platform.as_str().to_string(),
            organization_is_ecommerce: platform != Platform::Unknown || pages_is_ecommerce,
            pages_all: discovery.all_urls.join(", "),
            pages_about: about_url.unwrap_or_default(),
            pages_contact: category(PageCategory::Contact),
            pages_product: category(PageCategory::Product),
            pages_collection: category(PageCategory::Collections),
            pages_blog: category(PageCategory::Blog),
            pages_is_ecommerce,
            pages_contact_page_url: contact_url.unwrap_or_default(),
            pages_contact_page_email: contact.emails.join(", "),
            pages_contact_page_social_links_youtube: social.joined(SocialPlatform::Youtube),
            pages_contact_page_social_links_instagram: social.joined(SocialPlatform::Instagram),
            pages_contact_page_social_links_tiktok: social.joined(SocialPlatform::Tiktok),
            pages_about_copy: if about_summary.is_empty() {
                copy.about.unwrap_or_default()
            } else {
                about_summary
            },
            pages_product_copy: copy.product.or(copy.collections).unwrap_or_default(),
            pages_blog_copy: copy.blog.unwrap_or_default(),
            email_candidates: email_candidates.join(", "),
            integrations_klaviyo: integrations.klaviyo,
            integrations_meta: integrations.meta,
            pages_contact_page_social_links_facebook: social.joined(SocialPlatform::Facebook),
            pages_contact_page_social_links_linkedin: social.joined(SocialPlatform::Linkedin),
            pages_contact_page_social_links: all_social.join(", "),
            pages_contact_page_social_links_twitter: social.joined(SocialPlatform::Twitter),
            personalized_icebreaker: icebreaker,
        }
    }
}

/// About page for a lead: the categorized one, or the site root when
/// discovery categorized nothing at all.
pub fn about_page(site: &SiteRoot, discovery: &DiscoveryResult) -> Option<String> {
    match discovery.url_for(PageCategory::About) {
        Some(url) => Some(url.to_string()),
        None if discovery.categorized_urls.is_empty() => Some(site.join("/")),
        None => None,
    }
}

async fn email_outcome(services: &EnrichServices, lead: &Lead, site: &SiteRoot) -> EmailOutcome {
    let Some(email_service) = &services.email else {
        return EmailOutcome::skipped(lead.email.as_deref());
    };

    let first = lead.first_name.as_deref().unwrap_or_default();
    let last = lead.last_name.as_deref().unwrap_or_default();
    if lead.email.is_none() && (first.is_empty() || last.is_empty()) {
        debug!("No email or full name for {}, skipping email lookup", site);
        return EmailOutcome::default();
    }

    email_service
        .process_email(lead.email.as_deref(), first, last, site.domain())
        .await
}

/// Run one lead through discovery, scraping, fingerprinting, email
/// resolution and icebreaker generation.
pub async fn enrich_lead(
    lead: Lead,
    services: &EnrichServices,
    deadline: Duration,
) -> Result<LeadFindings> {
    let site = lead.site_root()?;
    debug!("Enriching {}", site);

    let discovery = services.discoverer.discover_with_deadline(&site, deadline).await;
    let about_url = about_page(&site, &discovery);

    let contact_url = match discovery.url_for(PageCategory::Contact) {
        Some(url) => Some(url.to_string()),
        None => {
            services
                .contact
                .find_contact_page(&site, &discovery.all_urls)
                .await
        }
    };

    let scraper = &services.scraper;
    let (about, collections, product, blog, (platform, integrations), contact, email) = tokio::join!(
        scraper.scrape_opt(about_url.as_deref()),
        scraper.scrape_opt(discovery.url_for(PageCategory::Collections)),
        scraper.scrape_opt(discovery.url_for(PageCategory::Product)),
        scraper.scrape_opt(discovery.url_for(PageCategory::Blog)),
        services.platform.inspect(&site),
        async {
            match contact_url.as_deref() {
                Some(url) => services.contact.extract(url).await,
                None => ContactInfo::default(),
            }
        },
        email_outcome(services, &lead, &site),
    );

    let (about_summary, icebreaker) = match &services.icebreaker {
        Some(ai) => {
            let summary = ai.generate_about_summary(about.as_deref()).await;
            let one_liner = ai
                .generate_one_liner(about.as_deref(), lead.first_name.as_deref())
                .await;
            (summary, one_liner)
        }
        None => (String::new(), String::new()),
    };

    info!(
        "Enriched {} via {} ({} URLs)",
        site,
        discovery.source_used,
        discovery.all_urls.len()
    );

    Ok(LeadFindings {
        lead,
        site,
        discovery,
        about_url,
        contact_url,
        copy: PageCopy {
            about,
            collections,
            product,
            blog,
        },
        platform,
        integrations,
        contact,
        email,
        about_summary,
        icebreaker,
    })
}

/// Execute an enrichment run with the given options
/// Returns one row per lead that could be enriched, in input order
pub async fn execute_enrichment(
    options: EnrichOptions,
    services: EnrichServices,
    progress_callback: Option<EnrichProgressCallback>,
) -> Result<Vec<LeadRow>> {
    let EnrichOptions {
        leads,
        workers,
        deadline,
        show_progress_bars,
    } = options;

    if leads.is_empty() {
        return Err(EnrichError::InvalidLead("No leads provided".to_string()));
    }

    let total = leads.len();
    let progress_bar = if show_progress_bars {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(120));
        pb.set_message(format!("Enriching {} leads...", total));
        Some(pb)
    } else {
        None
    };

    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let completed = Arc::new(AtomicUsize::new(0));
    let mut tasks = Vec::with_capacity(total);

    for lead in leads {
        let services = services.clone();
        let semaphore = semaphore.clone();
        let completed = completed.clone();
        let progress_bar = progress_bar.clone();
        let progress_callback = progress_callback.clone();

        tasks.push(tokio::spawn(async move {
            let website = lead.website.clone();
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => return Err(EnrichError::Config(e.to_string())),
            };

            let result = enrich_lead(lead, &services, deadline).await;

            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            let message = match &result {
                Ok(_) => format!("[{}/{}] {} done", done, total, website),
                Err(e) => format!("[{}/{}] {} failed: {}", done, total, website, e),
            };
            if let Some(pb) = &progress_bar {
                pb.set_message(message.clone());
            }
            if let Some(callback) = &progress_callback {
                callback(message);
            }

            result.map(LeadFindings::into_row)
        }));
    }

    let mut rows = Vec::with_capacity(total);
    for task in tasks {
        match task.await {
            Ok(Ok(row)) => rows.push(row),
            Ok(Err(e)) => warn!("Lead failed: {}", e),
            Err(e) => warn!("Enrichment task failed: {}", e),
        }
    }

    if let Some(pb) = progress_bar {
        pb.finish_with_message(format!("Enriched {}/{} leads", rows.len(), total));
    }

    Ok(rows)
}
