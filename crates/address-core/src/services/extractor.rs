//! Extraction strategy abstraction
//!
//! Callers depend on [`AddressExtractor`] only and do not know whether the
//! heuristic rules or a language model produced the fields.

use crate::config::ScannerConfig;
use crate::error::Result;
use crate::services::heuristic_extractor::HeuristicExtractor;
use crate::services::llm_extractor::LlmExtractor;
use address_types::ParsedAddressFields;
use async_trait::async_trait;

#[async_trait]
pub trait AddressExtractor: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Extract structured fields from raw address text
    async fn extract(&self, text: &str) -> Result<ParsedAddressFields>;
}

#[async_trait]
impl AddressExtractor for HeuristicExtractor {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    async fn extract(&self, text: &str) -> Result<ParsedAddressFields> {
        Ok(HeuristicExtractor::extract(self, text))
    }
}

#[async_trait]
impl AddressExtractor for LlmExtractor {
    fn name(&self) -> &'static str {
        "llm"
    }

    async fn extract(&self, text: &str) -> Result<ParsedAddressFields> {
        self.extract_text(text).await
    }
}

/// The LLM extractor when an API key is configured, the heuristic one otherwise
pub fn select_extractor(
    config: &ScannerConfig,
    heuristic: HeuristicExtractor,
) -> Result<Box<dyn AddressExtractor>> {
    match &config.openai {
        Some(openai) => {
            log::info!("Using LLM address extraction ({})", openai.text_model);
            Ok(Box::new(LlmExtractor::new(openai.clone())?))
        }
        None => {
            log::info!("No OpenAI API key configured, using heuristic address extraction");
            Ok(Box::new(heuristic))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::heuristic_extractor::FullTextMode;

    #[tokio::test]
    async fn test_heuristic_through_trait() {
        let extractor: Box<dyn AddressExtractor> = Box::new(HeuristicExtractor::default());
        let fields = extractor.extract("Herr Hans Mueller\n8000 Zurich").await.unwrap();

        assert_eq!(extractor.name(), "heuristic");
        assert_eq!(fields.first_name.as_deref(), Some("Hans"));
        assert_eq!(fields.postal_code.as_deref(), Some("8000"));
    }

    #[test]
    fn test_select_without_key_is_heuristic() {
        let config = ScannerConfig::default();
        let extractor = select_extractor(&config, HeuristicExtractor::new(FullTextMode::Verbatim)).unwrap();
        assert_eq!(extractor.name(), "heuristic");
    }

    #[test]
    fn test_select_with_key_is_llm() {
        let config = ScannerConfig::from_json_str(
            r#"{"openai": {"api_key": "sk-test"}}"#,
        )
        .unwrap();
        let extractor = select_extractor(&config, HeuristicExtractor::default()).unwrap();
        assert_eq!(extractor.name(), "llm");
    }

    #[test]
    fn test_select_with_placeholder_key_is_heuristic() {
        let config = ScannerConfig::from_json_str(
            r#"{"openai": {"api_key": "your_openai_api_key_here"}}"#,
        )
        .unwrap();
        let extractor = select_extractor(&config, HeuristicExtractor::default()).unwrap();
        assert_eq!(extractor.name(), "heuristic");
    }
}
