// Report generation from the lead store

use crate::error::{EnrichError, Result};
use crate::row::{LeadRow, SHEET_HEADER};
use crate::store::{LeadStore, RunSummary};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

const HEAVY_RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n";
const LIGHT_RULE: &str = "────────────────────────────────────────────────────────────────────────────────\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
    Csv,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "csv" => Some(ReportFormat::Csv),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Text => "txt",
            ReportFormat::Json => "json",
            ReportFormat::Csv => "csv",
        }
    }
}

/// Rows to export, with the run they belong to when exporting a single run.
#[derive(Debug, Clone)]
pub struct ReportData {
    pub run: Option<RunSummary>,
    pub rows: Vec<LeadRow>,
}

/// Rows of `run_id`, or of every run when `None`.
pub fn gather_report_data(store: &LeadStore, run_id: Option<&str>) -> Result<ReportData> {
    match run_id {
        Some(id) => {
            let run = store
                .get_run(id)?
                .ok_or_else(|| EnrichError::Config(format!("No run with id {}", id)))?;
            let rows = store.rows_for_run(id)?;
            Ok(ReportData {
                run: Some(run),
                rows,
            })
        }
        None => Ok(ReportData {
            run: None,
            rows: store.all_rows()?,
        }),
    }
}

pub fn generate_report(data: &ReportData, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(data)),
        ReportFormat::Json => {
            generate_json_report(data).map_err(|e| EnrichError::Parse(e.to_string()))
        }
        ReportFormat::Csv => generate_csv_report(&data.rows),
    }
}

pub fn generate_text_report(data: &ReportData) -> String {
    let mut report = String::new();

    report.push_str(HEAVY_RULE);
    report.push_str("                          LEADSIFT ENRICHMENT REPORT\n");
    report.push_str(HEAVY_RULE);
    report.push('\n');

    if let Some(run) = &data.run {
        report.push_str(&format!("Run ID:       {}\n", run.id));
        report.push_str(&format!("Status:       {}\n", status_label(run)));
        report.push_str(&format!("Started:      {}\n", format_timestamp(run.start_time)));
        if let Some(end_time) = run.end_time {
            report.push_str(&format!("Duration:     {} seconds\n", end_time - run.start_time));
        }
        report.push_str(&format!("Targets:      {}\n", parse_targets(&run.seeds).len()));
    } else {
        report.push_str("Scope:        all runs\n");
    }
    report.push_str(&format!("Leads:        {}\n\n", data.rows.len()));

    // Summary
    report.push_str(HEAVY_RULE);
    report.push_str("SUMMARY\n");
    report.push_str(HEAVY_RULE);
    report.push('\n');

    let valid_emails = data.rows.iter().filter(|r| r.contact_is_valid_email).count();
    let ecommerce = data.rows.iter().filter(|r| r.organization_is_ecommerce).count();
    let with_about = data.rows.iter().filter(|r| !r.pages_about.is_empty()).count();
    report.push_str(&format!("  Valid emails:      {}\n", valid_emails));
    report.push_str(&format!("  E-commerce sites:  {}\n", ecommerce));
    report.push_str(&format!("  About page found:  {}\n", with_about));

    let mut platforms: BTreeMap<&str, usize> = BTreeMap::new();
    for row in &data.rows {
        *platforms.entry(row.organization_platform.as_str()).or_default() += 1;
    }
    if !platforms.is_empty() {
        report.push_str("\n  Platforms:\n");
        for (platform, count) in &platforms {
            let name = if platform.is_empty() { "Unknown" } else { platform };
            report.push_str(&format!("    {:<14}{}\n", name, count));
        }
    }
    report.push('\n');

    if !data.rows.is_empty() {
        report.push_str(HEAVY_RULE);
        report.push_str("LEADS\n");
        report.push_str(HEAVY_RULE);
        report.push('\n');

        for (idx, row) in data.rows.iter().enumerate() {
            report.push_str(&format!("[{}] {}\n", idx + 1, row.domain));
            if !row.contact_full_name.is_empty() {
                report.push_str(&format!("Contact:      {}\n", row.contact_full_name));
            }
            if !row.contact_email.is_empty() {
                report.push_str(&format!(
                    "Email:        {} ({})\n",
                    row.contact_email, row.contact_validation_status
                ));
            }
            report.push_str(&format!("Platform:     {}\n", row.organization_platform));
            for (label, url) in [
                ("About:", &row.pages_about),
                ("Contact:", &row.pages_contact_page_url),
                ("Collection:", &row.pages_collection),
                ("Product:", &row.pages_product),
                ("Blog:", &row.pages_blog),
            ] {
                if !url.is_empty() {
                    report.push_str(&format!("{:<14}{}\n", label, url));
                }
            }

            if !row.personalized_icebreaker.is_empty() {
                report.push_str("\nIcebreaker:\n");
                report.push_str(&wrap_text(&row.personalized_icebreaker, 80, "  "));
                report.push('\n');
            }
            report.push('\n');
            report.push_str(LIGHT_RULE);
            report.push('\n');
        }
    }

    report.push_str(HEAVY_RULE);
    report.push_str("                                End of Report\n");
    report.push_str(HEAVY_RULE);

    report
}

pub fn generate_json_report(data: &ReportData) -> std::result::Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "leadsift",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "format": "json"
            },
            "run": data.run.as_ref().map(|run| serde_json::json!({
                "id": run.id,
                "status": run.status.as_str(),
                "start_time": format_timestamp(run.start_time),
                "end_time": run.end_time.map(format_timestamp),
                "duration_seconds": run.end_time.map(|end| end - run.start_time),
                "targets": parse_targets(&run.seeds),
            })),
            "summary": {
                "total_leads": data.rows.len(),
                "valid_emails": data.rows.iter().filter(|r| r.contact_is_valid_email).count(),
                "ecommerce": data.rows.iter().filter(|r| r.organization_is_ecommerce).count(),
            },
            "rows": data.rows,
        }
    });

    serde_json::to_string_pretty(&json_report)
}

/// Sheet-ordered CSV, header first, CRLF line endings.
pub fn generate_csv_report(rows: &[LeadRow]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());

    writer.write_record(SHEET_HEADER)?;
    for row in rows {
        writer.write_record(row.to_record())?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| EnrichError::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| EnrichError::Parse(format!("CSV output: {}", e)))
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

// Helper functions
fn status_label(run: &RunSummary) -> &'static str {
    match run.status.as_str() {
        "completed" => "Completed",
        "failed" => "Failed",
        _ => "Running",
    }
}

fn format_timestamp(timestamp: i64) -> String {
    chrono::DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| timestamp.to_string())
}

fn parse_targets(seeds: &str) -> Vec<String> {
    serde_json::from_str(seeds).unwrap_or_default()
}

fn wrap_text(text: &str, width: usize, indent: &str) -> String {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() && indent.len() + current.len() + 1 + word.len() > width {
            lines.push(format!("{}{}", indent, current));
            current.clear();
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(format!("{}{}", indent, current));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_text_respects_width() {
        let wrapped = wrap_text(&"word ".repeat(40), 20, "  ");
        assert!(wrapped.lines().all(|l| l.len() <= 20));
        assert!(wrapped.lines().all(|l| l.starts_with("  ")));
    }

    #[test]
    fn test_parse_targets_tolerates_garbage() {
        assert_eq!(parse_targets(r#"["a.com","b.com"]"#), vec!["a.com", "b.com"]);
        assert!(parse_targets("not json").is_empty());
    }
}
