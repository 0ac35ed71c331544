use anyhow::{Context, Result, anyhow, bail};
use clap::ArgMatches;
use colored::Colorize;
use leadsift_core::config::EnrichConfig;
use leadsift_core::enrich::{EnrichOptions, EnrichServices, execute_enrichment};
use leadsift_core::lead::{Lead, load_leads_from_file};
use leadsift_core::report::{ReportFormat, gather_report_data, generate_report, save_report};
use leadsift_core::row::LeadRow;
use leadsift_core::store::LeadStore;
use leadsift_scanner::{
    Discoverer, DiscoveryConfig, DiscoveryResult, Fetcher, HttpFetcher, PageCategory, SiteRoot,
};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub const DB_FILE_NAME: &str = "leadsift.db";

// Helper functions for enrich handler

/// Load leads from either a file or a single website argument
pub fn load_leads_from_source(url: Option<&String>, leads_file: Option<&PathBuf>) -> Result<Vec<Lead>> {
    if let Some(path) = leads_file {
        load_leads_from_file(path)
            .with_context(|| format!("Failed to load leads from {}", path.display()))
    } else if let Some(url) = url {
        let lead = Lead::from_website(url.trim());
        lead.site_root()?;
        Ok(vec![lead])
    } else {
        bail!("Either --url or --leads-file must be provided")
    }
}

/// Expand `~` in a database path.
pub fn resolve_db_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

/// Open the store, creating its directory on first use.
pub fn open_store(db_path: &Path) -> Result<LeadStore> {
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    LeadStore::new(db_path).with_context(|| format!("Failed to open database {}", db_path.display()))
}

/// JSON array of the lead websites, recorded on the run.
pub fn seeds_json(leads: &[Lead]) -> String {
    let websites: Vec<&str> = leads.iter().map(|l| l.website.as_str()).collect();
    serde_json::to_string(&websites).unwrap_or_else(|_| "[]".to_string())
}

/// Render rows from the store. `run_id` of `None` with `all == false`
/// selects the most recent run.
pub fn export_report(store: &LeadStore, run_id: Option<&str>, all: bool, format: ReportFormat) -> Result<String> {
    let run_id = match (run_id, all) {
        (Some(id), _) => Some(id.to_string()),
        (None, true) => None,
        (None, false) => Some(
            store
                .latest_run()?
                .ok_or_else(|| anyhow!("No runs recorded yet; run `leadsift enrich` first"))?
                .id,
        ),
    };

    let data = gather_report_data(store, run_id.as_deref())?;
    Ok(generate_report(&data, format)?)
}

pub fn print_banner() {
    println!(
        "{}",
        r#"
  _                _     _  __ _
 | | ___  __ _  __| |___(_)/ _| |_
 | |/ _ \/ _` |/ _` / __| | |_| __|
 | |  __/ (_| | (_| \__ \ |  _| |_
 |_|\___|\__,_|\__,_|___/_|_|  \__|
"#
        .bright_cyan()
        .bold()
    );
    println!(
        "  {} {}\n",
        "lead discovery & enrichment".bright_white(),
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black()
    );
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_prompt(msg: &str) -> Result<String> {
    print!("{} ", msg.bright_cyan().bold());
    io::stdout().flush()?;
    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    Ok(response.trim().to_lowercase())
}

fn discovery_config(args: &ArgMatches) -> DiscoveryConfig {
    DiscoveryConfig::default().with_probing(!args.get_flag("no-probe"))
}

fn shared_fetcher(config: &DiscoveryConfig) -> Result<Arc<dyn Fetcher>> {
    Ok(Arc::new(
        HttpFetcher::from_config(config).context("Failed to build HTTP client")?,
    ))
}

pub fn handle_init(args: &ArgMatches) -> Result<()> {
    print_divider();
    println!("{}", "  LEADSIFT INITIALIZATION".bright_white().bold());
    print_divider();
    println!();

    let config_dir = args
        .get_one::<String>("PATH")
        .ok_or_else(|| anyhow!("No database path given"))?;
    let force = args.get_flag("force");
    let config_dir = resolve_db_path(config_dir);
    let db_path = config_dir.join(DB_FILE_NAME);

    println!(
        "{} Target: {}",
        "→".blue(),
        config_dir.display().to_string().bright_white()
    );
    println!();

    if LeadStore::exists(&db_path) {
        let overwrite = if force {
            true
        } else {
            println!("{}", "⚠ WARNING".yellow().bold());
            println!("Database already exists at:");
            println!(
                "  {} {}",
                "•".yellow(),
                db_path.display().to_string().bright_white()
            );
            println!();
            let response = print_prompt("Would you like to overwrite it? [y/N]:")?;
            println!();
            response == "y" || response == "yes"
        };

        if overwrite {
            LeadStore::drop(&db_path)?;
            println!("{} Existing database removed", "✓".green().bold());
        } else {
            println!("{} Keeping existing database", "→".blue());
        }
    }

    if !LeadStore::exists(&db_path) {
        println!("{} Creating database...", "→".blue());
        open_store(&db_path)?;
        println!(
            "{} Database initialized: {}",
            "✓".green().bold(),
            db_path.display().to_string().bright_white()
        );
    }

    let config = EnrichConfig::from_env();
    println!();
    print_divider();
    println!("{}", "  INITIALIZATION COMPLETE".green().bold());
    print_divider();
    println!();
    print_collaborators(&config);
    println!();
    Ok(())
}

fn print_collaborators(config: &EnrichConfig) {
    let status = |enabled: bool, key: &str| {
        if enabled {
            format!("{} {} set", "✓".green().bold(), key)
        } else {
            format!("{} {} missing (step skipped)", "⚠".yellow().bold(), key)
        }
    };
    println!("{}", status(config.has_leadmagic(), "LEADMAGIC_API_KEY"));
    println!("{}", status(config.has_openai(), "OPENAI_API_KEY"));
}

pub async fn handle_discover(args: &ArgMatches) -> Result<()> {
    let raw = args
        .get_one::<String>("url")
        .ok_or_else(|| anyhow!("--url is required"))?;
    let site = SiteRoot::parse(raw)?;
    let deadline = Duration::from_secs(*args.get_one::<u64>("deadline").unwrap_or(&60));

    let config = discovery_config(args);
    let discoverer = Discoverer::new(shared_fetcher(&config)?, config);
    let result = discoverer.discover_with_deadline(&site, deadline).await;

    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_discovery(&result);
    }
    Ok(())
}

fn print_discovery(result: &DiscoveryResult) {
    print_divider();
    println!("{} {}", "  SITE".bright_white().bold(), result.site.as_str().bright_white());
    print_divider();
    println!(
        "{} Source: {}{}",
        "→".blue(),
        result.source_used.as_str().cyan(),
        result
            .location
            .as_ref()
            .map(|l| format!(" ({})", l))
            .unwrap_or_default()
    );
    println!("{} URLs found: {}", "→".blue(), result.all_urls.len().to_string().cyan());
    println!();

    for category in PageCategory::ALL {
        match result.url_for(category) {
            Some(url) => println!("  {} {:<12} {}", "✓".green().bold(), category.as_str(), url),
            None => println!("  {} {:<12} {}", "•".bright_black(), category.as_str(), "-".bright_black()),
        }
    }
    println!();
}

pub async fn handle_enrich(args: &ArgMatches) -> Result<()> {
    let url = args.get_one::<String>("url");
    let leads_file = args.get_one::<PathBuf>("leads-file");
    let workers = *args.get_one::<usize>("threads").unwrap_or(&5);
    let deadline = Duration::from_secs(*args.get_one::<u64>("deadline").unwrap_or(&60));
    let db_path = resolve_db_path(
        args.get_one::<String>("db")
            .ok_or_else(|| anyhow!("No database path given"))?,
    );

    let leads = load_leads_from_source(url, leads_file)?;
    let config = EnrichConfig::from_env();

    println!("\n{} Enriching {} lead(s)", "→".blue(), leads.len().to_string().cyan());
    println!("Workers: {}", workers);
    println!("Deadline: {}s per lead", deadline.as_secs());
    print_collaborators(&config);
    println!();

    let store = open_store(&db_path)?;
    let run_id = store.create_run(&seeds_json(&leads))?;

    let discovery = discovery_config(args);
    let services = EnrichServices::new(shared_fetcher(&discovery)?, discovery, &config);
    let options = EnrichOptions {
        leads,
        workers,
        deadline,
        show_progress_bars: true,
    };

    let rows = match execute_enrichment(options, services, None).await {
        Ok(rows) => rows,
        Err(e) => {
            store.fail_run(&run_id)?;
            return Err(e.into());
        }
    };

    if let Err(e) = record_rows(&store, &run_id, &rows) {
        store.fail_run(&run_id)?;
        return Err(e);
    }
    store.complete_run(&run_id)?;

    println!();
    print_divider();
    println!("{}", "  ENRICHMENT COMPLETE".green().bold());
    print_divider();
    for row in &rows {
        println!(
            "  {} {:<30} {}",
            "✓".green().bold(),
            row.domain,
            row.pages_about.bright_black()
        );
    }
    println!();
    println!("{} Run: {}", "✓".green().bold(), run_id.bright_white());
    println!(
        "{} Database: {}",
        "✓".green().bold(),
        db_path.display().to_string().bright_white()
    );
    println!(
        "{} Export with: leadsift export --run {} -f csv -o leads.csv",
        "→".blue(),
        run_id
    );
    Ok(())
}

fn record_rows(store: &LeadStore, run_id: &str, rows: &[LeadRow]) -> Result<()> {
    for row in rows {
        store
            .append_row(run_id, row)
            .with_context(|| format!("Failed to record row for {}", row.domain))?;
    }
    Ok(())
}

pub fn handle_export(args: &ArgMatches) -> Result<()> {
    let db_path = resolve_db_path(
        args.get_one::<String>("db")
            .ok_or_else(|| anyhow!("No database path given"))?,
    );
    if !LeadStore::exists(&db_path) {
        bail!(
            "No database at {}; run `leadsift init` or `leadsift enrich` first",
            db_path.display()
        );
    }

    let format_name = args.get_one::<String>("format").map(String::as_str).unwrap_or("text");
    let format = ReportFormat::from_str(format_name)
        .ok_or_else(|| anyhow!("Unknown report format: {}", format_name))?;

    let store = LeadStore::new(&db_path)?;
    let report = export_report(
        &store,
        args.get_one::<String>("run").map(String::as_str),
        args.get_flag("all"),
        format,
    )?;

    match args.get_one::<PathBuf>("output") {
        Some(path) => {
            save_report(&report, path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "{} Report saved: {}",
                "✓".green().bold(),
                path.display().to_string().bright_white()
            );
        }
        None => print!("{}", report),
    }
    Ok(())
}
