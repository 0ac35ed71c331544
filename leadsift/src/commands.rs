use crate::CLAP_STYLING;
use clap::{arg, command};

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("leadsift")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("leadsift")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("init")
                .about("Initializes the leadsift database on your filesystem")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Directory to store the leadsift database")
                        .default_value("~/.config/leadsift/"),
                )
                .arg(
                    arg!(-f --"force")
                        .help("Overwrite any existing database at the specified location.")
                        .required(false),
                ),
        )
        .subcommand(
            command!("discover")
                .about(
                    "Discover and categorize the pages of a single site: sitemap, then \
                robots.txt, then a homepage crawl.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("Site to discover, e.g. example.com or https://example.com"),
                )
                .arg(
                    arg!(--"json")
                        .required(false)
                        .help("Print the discovery result as JSON")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"no-probe")
                        .required(false)
                        .help("Do not probe common paths after a homepage crawl")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"deadline" <SECONDS>)
                        .required(false)
                        .help("Give up on the site after this many seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("60"),
                ),
        )
        .subcommand(
            command!("enrich")
                .about(
                    "Enrich a lead or a file of leads and record one row per lead in the \
                database.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(false)
                        .help("A single website to enrich")
                        .conflicts_with("leads-file"),
                )
                .arg(
                    arg!(-L --"leads-file" <PATH>)
                        .required(false)
                        .help(
                            "Newline-delimited leads: website[,first_name,last_name,email,title]",
                        )
                        .value_parser(clap::value_parser!(std::path::PathBuf))
                        .conflicts_with("url"),
                )
                .arg(
                    arg!(-t --"threads" <NUM_WORKERS>)
                        .required(false)
                        .help("The number of leads enriched concurrently.")
                        .value_parser(clap::value_parser!(usize))
                        .env("LEADSIFT_WORKERS")
                        .default_value("5"),
                )
                .arg(
                    arg!(--"deadline" <SECONDS>)
                        .required(false)
                        .help("Per-lead discovery deadline in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .env("LEADSIFT_DEADLINE")
                        .default_value("60"),
                )
                .arg(
                    arg!(--"no-probe")
                        .required(false)
                        .help("Do not probe common paths after a homepage crawl")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"db" <PATH>)
                        .required(false)
                        .help("Path to the leadsift database")
                        .env("LEADSIFT_DB")
                        .default_value("~/.config/leadsift/leadsift.db"),
                ),
        )
        .subcommand(
            command!("export")
                .about("Export recorded lead rows as a report")
                .arg(
                    arg!(--"run" <RUN_ID>)
                        .required(false)
                        .help("Run to export (default: the most recent run)")
                        .conflicts_with("all"),
                )
                .arg(
                    arg!(--"all")
                        .required(false)
                        .help("Export rows from every run")
                        .action(clap::ArgAction::SetTrue)
                        .conflicts_with("run"),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json, csv")
                        .value_parser(["text", "json", "csv"])
                        .default_value("text"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(--"db" <PATH>)
                        .required(false)
                        .help("Path to the leadsift database")
                        .env("LEADSIFT_DB")
                        .default_value("~/.config/leadsift/leadsift.db"),
                ),
        )
}
