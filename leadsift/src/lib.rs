// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

pub use handlers::{export_report, load_leads_from_source, open_store, resolve_db_path, seeds_json};

pub use leadsift_core::enrich::{EnrichOptions, EnrichProgressCallback, execute_enrichment};
