pub mod config;
pub mod email;
pub mod enrich;
pub mod error;
pub mod icebreaker;
pub mod lead;
pub mod report;
pub mod row;
pub mod store;

pub use config::EnrichConfig;
pub use email::{CompanyInfo, EmailOutcome, EmailService};
pub use enrich::{EnrichOptions, EnrichServices, execute_enrichment};
pub use error::{EnrichError, Result};
pub use icebreaker::IcebreakerService;
pub use lead::{Lead, load_leads_from_file, parse_lead_line};
pub use row::{LeadRow, SHEET_HEADER};
pub use store::{LeadStore, RunStatus, RunSummary};
