use clap::ArgMatches;
use colored::Colorize;
use commands::command_argument_builder;
use leadsift::handlers::{handle_discover, handle_enrich, handle_export, handle_init, print_banner};
use tracing_subscriber::EnvFilter;

mod commands;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    // JSON output goes to stdout untouched
    if !quiet && !wants_json(&chosen_command) {
        print_banner();
    }

    if chosen_command.subcommand().is_none() {
        return;
    }

    let result = match chosen_command.subcommand() {
        Some(("init", primary_command)) => handle_init(primary_command),
        Some(("discover", primary_command)) => handle_discover(primary_command).await,
        Some(("enrich", primary_command)) => handle_enrich(primary_command).await,
        Some(("export", primary_command)) => handle_export(primary_command),
        _ => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}

fn wants_json(matches: &ArgMatches) -> bool {
    match matches.subcommand() {
        Some(("discover", args)) => args.get_flag("json"),
        Some(("export", args)) => {
            args.get_one::<String>("format").map(String::as_str) == Some("json")
                && args.get_one::<std::path::PathBuf>("output").is_none()
        }
        _ => false,
    }
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
