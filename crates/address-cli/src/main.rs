//! Address scanner command line
//!
//! Parses typed or photographed addresses and manages the stored results.

mod commands;

use address_core::ScannerConfig;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::Path;

fn address_field_args() -> Vec<Arg> {
    [
        ("salutation", "Salutation (Herr, Frau, Mr, Mrs, Ms, Dr)"),
        ("first-name", "First name"),
        ("last-name", "Last name"),
        ("company", "Company"),
        ("street-name", "Street name without number"),
        ("street-number", "Street number"),
        ("postal-code", "Postal code"),
        ("place", "City or place"),
    ]
    .into_iter()
    .map(|(name, help)| Arg::new(name).long(name).value_name("VALUE").help(help))
    .collect()
}

fn build_cli() -> Command {
    Command::new("address-scanner")
        .version("1.0.0")
        .about("Extract, store and search postal addresses")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("./config/credentials.json")
                .global(true),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("parse")
                .about("Extract address fields from text (argument or stdin)")
                .arg(Arg::new("text").value_name("TEXT").help("Address text; read from stdin when absent"))
                .arg(
                    Arg::new("manual")
                        .long("manual")
                        .help("Keep the text exactly as typed as full text")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("heuristic")
                        .long("heuristic")
                        .help("Use the rule-based extractor even when an OpenAI key is configured")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("save-local")
                        .long("save-local")
                        .help("Append the result to the local history")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("scan")
                .about("Recognize an address from an image file")
                .arg(Arg::new("image").value_name("IMAGE").required(true).help("Image file"))
                .arg(
                    Arg::new("save-local")
                        .long("save-local")
                        .help("Append the result to the local history")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("save-remote")
                        .long("save-remote")
                        .help("Store the result in the remote database")
                        .action(ArgAction::SetTrue),
                )
                .arg(Arg::new("company").long("company").value_name("VALUE").help("Company stored with the address")),
        )
        .subcommand(
            Command::new("add")
                .about("Store an address in the remote database")
                .arg(
                    Arg::new("full-text")
                        .long("full-text")
                        .value_name("TEXT")
                        .required(true)
                        .help("Complete address text"),
                )
                .args(address_field_args())
                .arg(Arg::new("image").long("image").value_name("FILE").help("Image to attach")),
        )
        .subcommand(
            Command::new("update")
                .about("Update a stored address")
                .arg(Arg::new("id").value_name("ID").required(true).help("Address ID"))
                .arg(Arg::new("full-text").long("full-text").value_name("TEXT").help("Complete address text"))
                .args(address_field_args())
                .arg(Arg::new("image").long("image").value_name("FILE").help("Image to attach")),
        )
        .subcommand(
            Command::new("search")
                .about("Search stored addresses (case-insensitive, newest first, at most 10)")
                .arg(Arg::new("company").long("company").value_name("VALUE"))
                .arg(Arg::new("first-name").long("first-name").value_name("VALUE"))
                .arg(Arg::new("last-name").long("last-name").value_name("VALUE"))
                .arg(Arg::new("place").long("place").value_name("VALUE")),
        )
        .subcommand(
            Command::new("history")
                .about("Manage the local scan history")
                .subcommand_required(true)
                .subcommand(Command::new("list").about("Show saved entries, newest first"))
                .subcommand(
                    Command::new("delete")
                        .about("Delete one entry")
                        .arg(Arg::new("id").value_name("ID").required(true)),
                )
                .subcommand(Command::new("clear").about("Delete all entries")),
        )
}

fn load_config(matches: &ArgMatches) -> Result<ScannerConfig, Box<dyn std::error::Error + Send + Sync>> {
    let config_path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or("./config/credentials.json");
    let path = Path::new(config_path);

    if path.exists() {
        log::info!("Loading configuration from {}", config_path);
    } else {
        log::info!("No configuration file at {}, using environment only", config_path);
    }

    Ok(ScannerConfig::load(Some(path))?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging with INFO as default if RUST_LOG not set
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = build_cli().get_matches();
    let config = load_config(&matches)?;

    let result = match matches.subcommand() {
        Some(("parse", sub)) => commands::parse(&config, sub).await,
        Some(("scan", sub)) => commands::scan(&config, sub).await,
        Some(("add", sub)) => commands::add(&config, sub).await,
        Some(("update", sub)) => commands::update(&config, sub).await,
        Some(("search", sub)) => commands::search(&config, sub).await,
        Some(("history", sub)) => commands::history(&config, sub),
        _ => {
            log::error!("No action specified. Use --help for options.");
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        log::error!("{}", e);
        std::process::exit(1);
    }

    Ok(())
}
