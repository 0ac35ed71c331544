use crate::error::{EnrichError, Result};
use csv::StringRecord;
use leadsift_scanner::SiteRoot;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::warn;

/// One input lead: a website plus whatever contact details came with it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub website: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub title: Option<String>,
}

impl Lead {
    pub fn from_website(website: impl Into<String>) -> Self {
        Self {
            website: website.into(),
            ..Default::default()
        }
    }

    /// `first last`, or whichever half is present.
    pub fn full_name(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn site_root(&self) -> Result<SiteRoot> {
        SiteRoot::parse(&self.website)
            .map_err(|e| EnrichError::InvalidLead(format!("{}: {}", self.website, e)))
    }
}

fn lead_reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_reader(input)
}

fn non_empty(field: Option<&str>) -> Option<String> {
    field.filter(|value| !value.is_empty()).map(String::from)
}

/// Build a lead from one `website[,first_name,last_name,email,title]`
/// record. Fields past the fifth are an unquoted title that kept its commas.
///
/// An all-blank record yields `Ok(None)`.
pub fn lead_from_record(record: &StringRecord) -> Result<Option<Lead>> {
    if record.iter().all(str::is_empty) {
        return Ok(None);
    }

    let title: Vec<&str> = record.iter().skip(4).filter(|f| !f.is_empty()).collect();
    let lead = Lead {
        website: record.get(0).unwrap_or_default().to_string(),
        first_name: non_empty(record.get(1)),
        last_name: non_empty(record.get(2)),
        email: non_empty(record.get(3)),
        title: (!title.is_empty()).then(|| title.join(", ")),
    };

    // Reject early so a bad record points at its own text
    lead.site_root()?;
    Ok(Some(lead))
}

/// Parse one lead line. Quoted fields may contain commas.
///
/// Blank lines and `#` comments yield `Ok(None)`.
pub fn parse_lead_line(line: &str) -> Result<Option<Lead>> {
    let mut records = lead_reader(line.trim().as_bytes()).into_records();
    match records.next() {
        Some(record) => lead_from_record(&record?),
        None => Ok(None),
    }
}

/// Load leads from a headerless CSV file. Invalid records are skipped with
/// a warning; an input with no usable lead is an error.
pub fn load_leads_from_file(path: &Path) -> Result<Vec<Lead>> {
    let mut reader = lead_reader(File::open(path)?);

    let mut leads = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        match result.map_err(EnrichError::from).and_then(|r| lead_from_record(&r)) {
            Ok(Some(lead)) => leads.push(lead),
            Ok(None) => {}
            Err(e) => warn!("Skipping record {} of {}: {}", idx + 1, path.display(), e),
        }
    }

    if leads.is_empty() {
        return Err(EnrichError::InvalidLead(format!(
            "No valid leads found in {}",
            path.display()
        )));
    }

    Ok(leads)
}
