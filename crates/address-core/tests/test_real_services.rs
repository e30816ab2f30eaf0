//! Integration tests with real external services
//!
//! These tests talk to the configured Supabase project and OpenAI account.
//!
//! Run with: cargo test --features integration --test test_real_services -- --ignored

#![cfg(feature = "integration")]

use address_core::{
    AddressInput, AddressPatch, LlmExtractor, ScannerConfig, SearchParams, SupabaseClient,
};
use std::path::PathBuf;

/// Load real configuration from config/credentials.json in the project root
fn load_real_config() -> ScannerConfig {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let project_root = manifest_dir.parent().unwrap().parent().unwrap();
    let credentials_path = project_root.join("config").join("credentials.json");

    println!("Loading credentials from: {:?}", credentials_path);

    ScannerConfig::load(Some(credentials_path.as_path()))
        .expect("Failed to load credentials.json - ensure it exists with valid configuration")
}

#[tokio::test]
#[ignore] // Only run when explicitly requested with --ignored flag
async fn test_supabase_add_update_search() {
    let config = load_real_config();
    let client = SupabaseClient::new(config.supabase().unwrap().clone()).unwrap();

    let input = AddressInput {
        full_text: "Herr Integration Test, Teststrasse 1, 8000 Zurich".to_string(),
        first_name: Some("Integration".to_string()),
        last_name: Some("Test".to_string()),
        place: Some("Zurich".to_string()),
        ..Default::default()
    };

    let stored = client.insert_address(&input).await.expect("Insert failed");
    println!("✓ Inserted address {}", stored.id);

    let patch = AddressPatch {
        company: Some("Integration AG".to_string()),
        ..Default::default()
    };
    let updated = client.update_address(&stored.id, &patch).await.expect("Update failed");
    assert_eq!(updated.company.as_deref(), Some("Integration AG"));
    assert!(updated.updated_at >= stored.updated_at);

    let results = client
        .search_addresses(&SearchParams {
            company: Some("integration ag".to_string()),
            ..Default::default()
        })
        .await
        .expect("Search failed");
    assert!(results.iter().any(|row| row.id == stored.id));
    assert!(results.len() <= 10);
}

#[tokio::test]
#[ignore] // Only run when explicitly requested
async fn test_openai_text_extraction() {
    let config = load_real_config();
    let extractor = LlmExtractor::new(config.openai().unwrap().clone()).unwrap();

    let fields = extractor
        .extract_text("Herr Hans Mueller\nBahnhofstrasse 1\n8001 Zurich")
        .await
        .expect("LLM extraction failed");

    println!("✓ Extracted: {:?}", fields);
    assert_eq!(fields.postal_code.as_deref(), Some("8001"));
    assert_eq!(fields.full_text, "Herr Hans Mueller\nBahnhofstrasse 1\n8001 Zurich");
}
