use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, Command};
use seqqc_core::{HttpOutcomesService, OutcomesService};
use seqqc_model::{
    build_query, build_update_query, classify_page, Category, Outcome, OutcomeChange,
    OutcomesPayload, QcConfig,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("seqqc")
        .version(seqqc_core::VERSION)
        .about("Query and update manual QC outcomes of sequencing runs")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("url")
                .long("url")
                .global(true)
                .help("QC outcomes service URL (overrides the configuration)"),
        )
        .subcommand(
            Command::new("fetch")
                .about("Print stored outcomes for rpt keys")
                .arg(
                    Arg::new("keys")
                        .required(true)
                        .action(ArgAction::Append)
                        .help("Rpt keys, e.g. 18245:1 or 18245:1:2"),
                ),
        )
        .subcommand(
            Command::new("update")
                .about("Set the manual QC outcome of lanes or libraries")
                .arg(
                    Arg::new("category")
                        .long("category")
                        .required(true)
                        .value_parser(["seq", "lib"])
                        .help("seq for lanes, lib for libraries"),
                )
                .arg(
                    Arg::new("outcome")
                        .long("outcome")
                        .required(true)
                        .value_parser(value_parser!(Outcome))
                        .help("Outcome, e.g. \"Accepted preliminary\""),
                )
                .arg(
                    Arg::new("keys")
                        .required(true)
                        .action(ArgAction::Append)
                        .help("Rpt keys to update"),
                ),
        )
        .subcommand(
            Command::new("classify")
                .about("Classify a page for manual or utility QC")
                .arg(Arg::new("title").long("title").required(true).help("Page title"))
                .arg(
                    Arg::new("user")
                        .long("user")
                        .required(true)
                        .help("Header text, e.g. \"Logged in as aa11 (mqc)\""),
                ),
        )
}

fn load_config(matches: &clap::ArgMatches) -> anyhow::Result<QcConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => QcConfig::from_path(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => QcConfig::default(),
    };
    if let Some(url) = matches.get_one::<String>("url") {
        config = config.with_outcomes_url(url.clone());
    }
    config.validate()?;
    Ok(config)
}

fn keys(args: &clap::ArgMatches) -> Vec<String> {
    args.get_many::<String>("keys")
        .map(|keys| keys.cloned().collect())
        .unwrap_or_default()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();

    match matches.subcommand() {
        Some(("fetch", args)) => {
            let config = load_config(&matches)?;
            let service = HttpOutcomesService::new(&config)?;
            let keys = keys(args);
            let reply = service.post_json(&build_query(&keys)).await?;
            let payload = OutcomesPayload::from_value(reply)?;
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        Some(("update", args)) => {
            let config = load_config(&matches)?;
            let service = HttpOutcomesService::new(&config)?;
            let category = match args.get_one::<String>("category").map(String::as_str) {
                Some("lib") => Category::Lib,
                _ => Category::Seq,
            };
            let outcome = *args
                .get_one::<Outcome>("outcome")
                .context("outcome is required")?;
            let changes: Vec<OutcomeChange> = keys(args)
                .into_iter()
                .map(|key| OutcomeChange::new(key, outcome))
                .collect();
            tracing::info!("Updating {} {} outcomes to {}", changes.len(), category.as_str(), outcome);
            service
                .post_json(&build_update_query(category, &changes))
                .await
                .context("QC outcome update failed")?;
            println!("Updated {} rpt keys to {}", changes.len(), outcome);
        }
        Some(("classify", args)) => {
            let title = args.get_one::<String>("title").map_or("", String::as_str);
            let user = args.get_one::<String>("user").map_or("", String::as_str);
            let page = classify_page(title, user)?;
            println!("{}", serde_json::to_string_pretty(&page)?);
        }
        _ => {}
    }
    Ok(())
}
