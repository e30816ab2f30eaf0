//! Subcommand handlers

use address_core::image::read_image_as_data_url;
use address_core::{
    select_extractor, AddressExtractor, AddressInput, AddressPatch, FullTextMode,
    HeuristicExtractor, LlmExtractor, LocalHistory, ParsedAddressFields, Result, ScannerConfig,
    ScannerError, SearchParams, SupabaseClient,
};
use clap::ArgMatches;
use serde::Serialize;
use std::io::Read;
use std::path::Path;

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn string_arg(matches: &ArgMatches, name: &str) -> Option<String> {
    matches.get_one::<String>(name).cloned()
}

fn read_stdin() -> Result<String> {
    let mut text = String::new();
    std::io::stdin().read_to_string(&mut text)?;
    Ok(text)
}

async fn image_arg(matches: &ArgMatches) -> Result<Option<String>> {
    match matches.get_one::<String>("image") {
        Some(path) => Ok(Some(read_image_as_data_url(Path::new(path)).await?)),
        None => Ok(None),
    }
}

fn address_input(matches: &ArgMatches) -> AddressInput {
    AddressInput {
        full_text: string_arg(matches, "full-text").unwrap_or_default(),
        salutation: string_arg(matches, "salutation"),
        first_name: string_arg(matches, "first-name"),
        last_name: string_arg(matches, "last-name"),
        company: string_arg(matches, "company"),
        street_name: string_arg(matches, "street-name"),
        street_number: string_arg(matches, "street-number"),
        postal_code: string_arg(matches, "postal-code"),
        place: string_arg(matches, "place"),
        image_data: None,
    }
}

fn address_patch(matches: &ArgMatches) -> AddressPatch {
    AddressPatch {
        full_text: string_arg(matches, "full-text"),
        salutation: string_arg(matches, "salutation"),
        first_name: string_arg(matches, "first-name"),
        last_name: string_arg(matches, "last-name"),
        company: string_arg(matches, "company"),
        street_name: string_arg(matches, "street-name"),
        street_number: string_arg(matches, "street-number"),
        postal_code: string_arg(matches, "postal-code"),
        place: string_arg(matches, "place"),
        image_data: None,
    }
}

fn search_params(matches: &ArgMatches) -> SearchParams {
    SearchParams {
        company: string_arg(matches, "company"),
        first_name: string_arg(matches, "first-name"),
        last_name: string_arg(matches, "last-name"),
        place: string_arg(matches, "place"),
    }
}

fn save_local(config: &ScannerConfig, fields: &ParsedAddressFields, image_data: Option<String>) -> Result<()> {
    if fields.is_not_found() {
        log::warn!("Nothing recognized, not saving to local history");
        return Ok(());
    }

    let entry = LocalHistory::new(&config.storage.history_dir).save(fields, image_data)?;
    log::info!("Saved to local history as {}", entry.id);
    Ok(())
}

pub async fn parse(config: &ScannerConfig, matches: &ArgMatches) -> Result<()> {
    let text = match string_arg(matches, "text") {
        Some(text) => text,
        None => read_stdin()?,
    };

    let mode = if matches.get_flag("manual") {
        FullTextMode::Verbatim
    } else {
        FullTextMode::JoinedLines
    };
    let heuristic = HeuristicExtractor::new(mode);

    let extractor: Box<dyn AddressExtractor> = if matches.get_flag("heuristic") {
        Box::new(heuristic)
    } else {
        select_extractor(config, heuristic)?
    };

    log::info!("Extracting address fields with the {} extractor", extractor.name());
    let fields = extractor.extract(&text).await?;

    if matches.get_flag("save-local") {
        save_local(config, &fields, None)?;
    }

    print_json(&fields)
}

pub async fn scan(config: &ScannerConfig, matches: &ArgMatches) -> Result<()> {
    let image_path = string_arg(matches, "image")
        .ok_or_else(|| ScannerError::Validation("Image path is required".to_string()))?;

    let extractor = LlmExtractor::new(config.openai()?.clone())?;
    let data_url = read_image_as_data_url(Path::new(&image_path)).await?;

    log::info!("Recognizing address in {}", image_path);
    let fields = extractor.extract_image(&data_url).await?;

    if matches.get_flag("save-local") {
        save_local(config, &fields, Some(data_url.clone()))?;
    }

    if matches.get_flag("save-remote") {
        if fields.is_not_found() {
            log::warn!("Nothing recognized, not storing remotely");
        } else {
            let client = SupabaseClient::new(config.supabase()?.clone())?;
            let mut input = AddressInput::from(&fields);
            input.company = string_arg(matches, "company");
            input.image_data = Some(data_url);
            let stored = client.insert_address(&input).await?;
            log::info!("Stored remotely as {}", stored.id);
        }
    }

    print_json(&fields)
}

pub async fn add(config: &ScannerConfig, matches: &ArgMatches) -> Result<()> {
    let client = SupabaseClient::new(config.supabase()?.clone())?;

    let mut input = address_input(matches);
    input.image_data = image_arg(matches).await?;

    let stored = client.insert_address(&input).await?;
    print_json(&stored)
}

pub async fn update(config: &ScannerConfig, matches: &ArgMatches) -> Result<()> {
    let id = string_arg(matches, "id")
        .ok_or_else(|| ScannerError::Validation("Address ID is required".to_string()))?;

    let mut patch = address_patch(matches);
    patch.image_data = image_arg(matches).await?;
    if patch.is_empty() {
        log::warn!("No fields given, only the update timestamp changes");
    }

    let client = SupabaseClient::new(config.supabase()?.clone())?;
    let updated = client.update_address(&id, &patch).await?;
    print_json(&updated)
}

pub async fn search(config: &ScannerConfig, matches: &ArgMatches) -> Result<()> {
    let client = SupabaseClient::new(config.supabase()?.clone())?;
    let addresses = client.search_addresses(&search_params(matches)).await?;
    print_json(&addresses)
}

pub fn history(config: &ScannerConfig, matches: &ArgMatches) -> Result<()> {
    let history = LocalHistory::new(&config.storage.history_dir);

    match matches.subcommand() {
        Some(("list", _)) => print_json(&history.list()),
        Some(("delete", sub)) => {
            let id = string_arg(sub, "id")
                .ok_or_else(|| ScannerError::Validation("Entry ID is required".to_string()))?;
            if history.delete(&id) {
                log::info!("Deleted history entry {}", id);
                Ok(())
            } else {
                Err(ScannerError::Processing(format!("Failed to delete history entry {}", id)))
            }
        }
        Some(("clear", _)) => {
            history.clear_all()?;
            log::info!("Local history cleared");
            Ok(())
        }
        _ => Err(ScannerError::Validation("Unknown history action".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_cli;
    use tempfile::TempDir;

    fn subcommand_matches(args: &[&str]) -> ArgMatches {
        let matches = build_cli().try_get_matches_from(args).unwrap();
        matches.subcommand().unwrap().1.clone()
    }

    #[test]
    fn test_patch_only_contains_given_flags() {
        let sub = subcommand_matches(&[
            "address-scanner",
            "update",
            "42",
            "--place",
            "Bern",
            "--company",
            "",
        ]);

        let patch = address_patch(&sub);
        assert_eq!(patch.place.as_deref(), Some("Bern"));
        assert_eq!(patch.company.as_deref(), Some(""));
        assert_eq!(patch.first_name, None);
        assert_eq!(patch.full_text, None);
    }

    #[test]
    fn test_input_from_add_flags() {
        let sub = subcommand_matches(&[
            "address-scanner",
            "add",
            "--full-text",
            "Main Street 12a, 8000 Zurich",
            "--street-number",
            "12a",
        ]);

        let input = address_input(&sub);
        assert_eq!(input.full_text, "Main Street 12a, 8000 Zurich");
        assert_eq!(input.street_number.as_deref(), Some("12a"));
        assert_eq!(input.image_data, None);
    }

    #[test]
    fn test_search_params_from_flags() {
        let sub = subcommand_matches(&["address-scanner", "search", "--first-name", "Anna"]);

        let params = search_params(&sub);
        assert_eq!(params.first_name.as_deref(), Some("Anna"));
        assert_eq!(params.company, None);
    }

    #[test]
    fn test_history_commands() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = ScannerConfig::default();
        config.storage.history_dir = temp_dir.path().to_path_buf();

        let fields = HeuristicExtractor::default().extract("8000 Zurich");
        save_local(&config, &fields, None).unwrap();
        save_local(&config, &ParsedAddressFields::not_found(), None).unwrap();

        let history = LocalHistory::new(temp_dir.path());
        let entries = history.list();
        assert_eq!(entries.len(), 1);

        let delete = subcommand_matches(&["address-scanner", "history", "delete", &entries[0].id]);
        super::history(&config, &delete).unwrap();
        assert!(history.list().is_empty());

        let clear = subcommand_matches(&["address-scanner", "history", "clear"]);
        super::history(&config, &clear).unwrap();
    }
}
