//! Address extraction through a chat-completions model

use crate::clients::openai::{CompletionOptions, OpenAIClient};
use crate::config::OpenAIConfig;
use crate::error::{Result, ScannerError};
use crate::services::heuristic_extractor::is_valid_postal_code;
use crate::services::response_cleaner::extract_json_object;
use address_types::{ParsedAddressFields, Salutation};
use serde_json::{json, Map, Value};

const TEXT_SYSTEM_PROMPT: &str = "You are an address parser. Extract the following fields from the given address text:
- salutation (e.g., Mr., Mrs., Ms., Dr., etc.)
- first_name
- last_name
- street_name
- street_number
- postal_code
- place (city/town)

Return ONLY a valid JSON object with these fields. If a field cannot be found, set it to null. Do not include any explanation or additional text.";

const IMAGE_PROMPT: &str = r#"Please extract the address information from this image and return it in the following JSON format:
{
  "fullText": "complete address as single line",
  "salutation": "title like Herr, Frau, Mr, Mrs, Dr, etc. or null",
  "first_name": "first name or null",
  "last_name": "last name or null",
  "street_name": "street name without number or null",
  "street_number": "street number or null",
  "postal_code": "postal/zip code or null",
  "place": "city/place name or null"
}

Return ONLY the JSON object, no additional text or explanation."#;

/// Where the full text of an LLM result comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FullTextSource<'a> {
    /// The text that was sent to the model
    Input(&'a str),
    /// The `fullText` field the model reports (image input)
    Model,
}

pub struct LlmExtractor {
    client: OpenAIClient,
    config: OpenAIConfig,
}

impl LlmExtractor {
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        let client = OpenAIClient::new(&config)?;
        Ok(Self { client, config })
    }

    /// Parse typed or OCR text with the text model
    pub async fn extract_text(&self, text: &str) -> Result<ParsedAddressFields> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(ParsedAddressFields::not_found());
        }

        let messages = vec![
            json!({"role": "system", "content": TEXT_SYSTEM_PROMPT}),
            json!({"role": "user", "content": format!("Parse this address:\n{}", text)}),
        ];
        let options = CompletionOptions {
            max_tokens: None,
            temperature: Some(0.0),
        };

        log::info!("Parsing address text with {}", self.config.text_model);
        let content = self
            .client
            .chat_completion(&self.config.text_model, messages, &options)
            .await?;

        parse_model_output(&content, FullTextSource::Input(text))
    }

    /// Read an address from an image given as a data URL
    pub async fn extract_image(&self, image_data_url: &str) -> Result<ParsedAddressFields> {
        if !image_data_url.starts_with("data:") {
            return Err(ScannerError::Validation(
                "Image must be provided as a data URL".to_string(),
            ));
        }

        let messages = vec![json!({
            "role": "user",
            "content": [
                {"type": "text", "text": IMAGE_PROMPT},
                {"type": "image_url", "image_url": {"url": image_data_url}}
            ]
        })];
        let options = CompletionOptions {
            max_tokens: Some(self.config.max_tokens),
            temperature: None,
        };

        log::info!("Recognizing address from image with {}", self.config.model);
        let content = self
            .client
            .chat_completion(&self.config.model, messages, &options)
            .await?;

        parse_model_output(&content, FullTextSource::Model)
    }
}

fn parse_model_output(content: &str, source: FullTextSource<'_>) -> Result<ParsedAddressFields> {
    let json_text = extract_json_object(content)?;
    let value: Value = serde_json::from_str(json_text).map_err(|e| {
        log::error!("Failed to parse model response: {}", content);
        ScannerError::Processing(format!("Invalid response format from model: {}", e))
    })?;

    let object = value.as_object().ok_or_else(|| {
        ScannerError::Processing("Model response is not a JSON object".to_string())
    })?;

    let full_text = match source {
        FullTextSource::Input(text) => text.to_string(),
        FullTextSource::Model => {
            let reported = string_field(object, "fullText").or_else(|| string_field(object, "full_text"));
            match reported {
                Some(text) => text,
                None => return Ok(ParsedAddressFields::not_found()),
            }
        }
    };

    let mut fields = ParsedAddressFields::new(full_text);
    fields.salutation = string_field(object, "salutation").and_then(|raw| {
        let salutation = Salutation::from_loose(&raw);
        if salutation.is_none() {
            log::warn!("Dropping unknown salutation from model output: {}", raw);
        }
        salutation
    });
    fields.first_name = string_field(object, "first_name");
    fields.last_name = string_field(object, "last_name");
    fields.street_name = string_field(object, "street_name");
    fields.street_number = string_field(object, "street_number");
    fields.postal_code = string_field(object, "postal_code").and_then(|code| {
        if is_valid_postal_code(&code) {
            Some(code)
        } else {
            log::warn!("Dropping postal code that is not 4-5 digits: {}", code);
            None
        }
    });
    fields.place = string_field(object, "place");

    Ok(fields)
}

/// Trimmed string value of a field; numbers are accepted, blanks and nulls are absent
fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    let text = match object.get(key)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };

    if text.is_empty() || text.eq_ignore_ascii_case("null") {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_text_response_uses_input_as_full_text() {
        let content = r#"{
            "salutation": "Mr.",
            "first_name": "John",
            "last_name": "Smith",
            "street_name": "Baker Street",
            "street_number": "221b",
            "postal_code": null,
            "place": "London"
        }"#;

        let fields = parse_model_output(content, FullTextSource::Input("Mr. John Smith, 221b Baker Street, London")).unwrap();

        assert_eq!(fields.full_text, "Mr. John Smith, 221b Baker Street, London");
        assert_eq!(fields.salutation, Some(Salutation::Mr));
        assert_eq!(fields.first_name.as_deref(), Some("John"));
        assert_eq!(fields.street_number.as_deref(), Some("221b"));
        assert_eq!(fields.postal_code, None);
        assert_eq!(fields.place.as_deref(), Some("London"));
    }

    #[test]
    fn test_image_response_with_fences() {
        let content = "```json\n{\"fullText\": \"Frau Eva Keller, Lange Gasse 4b, 4052 Basel\", \"salutation\": \"Frau\", \"first_name\": \"Eva\", \"last_name\": \"Keller\", \"street_name\": \"Lange Gasse\", \"street_number\": \"4b\", \"postal_code\": \"4052\", \"place\": \"Basel\"}\n```";

        let fields = parse_model_output(content, FullTextSource::Model).unwrap();

        let expected = ParsedAddressFields {
            full_text: "Frau Eva Keller, Lange Gasse 4b, 4052 Basel".to_string(),
            salutation: Some(Salutation::Frau),
            first_name: Some("Eva".to_string()),
            last_name: Some("Keller".to_string()),
            street_name: Some("Lange Gasse".to_string()),
            street_number: Some("4b".to_string()),
            postal_code: Some("4052".to_string()),
            place: Some("Basel".to_string()),
        };
        assert_eq!(fields, expected);
    }

    #[test]
    fn test_image_response_without_full_text_is_not_found() {
        let content = r#"{"fullText": "", "place": "Basel"}"#;
        let fields = parse_model_output(content, FullTextSource::Model).unwrap();
        assert_eq!(fields, ParsedAddressFields::not_found());

        let content = r#"{"place": "Basel"}"#;
        let fields = parse_model_output(content, FullTextSource::Model).unwrap();
        assert!(fields.is_not_found());
    }

    #[test]
    fn test_numeric_values_and_invalid_postal_codes() {
        let content = r#"{"fullText": "x", "street_number": 12, "postal_code": 8000}"#;
        let fields = parse_model_output(content, FullTextSource::Model).unwrap();
        assert_eq!(fields.street_number.as_deref(), Some("12"));
        assert_eq!(fields.postal_code.as_deref(), Some("8000"));

        let content = r#"{"fullText": "x", "postal_code": "SW1A 1AA", "salutation": "Prof."}"#;
        let fields = parse_model_output(content, FullTextSource::Model).unwrap();
        assert_eq!(fields.postal_code, None);
        assert_eq!(fields.salutation, None);
    }

    #[test]
    fn test_unparseable_output_is_error() {
        let result = parse_model_output("Sorry, I cannot read this image.", FullTextSource::Model);
        assert!(matches!(result, Err(ScannerError::Processing(_))));

        let result = parse_model_output("{\"place\": Basel}", FullTextSource::Input("Basel"));
        assert!(matches!(result, Err(ScannerError::Processing(_))));
    }

    #[tokio::test]
    async fn test_blank_text_skips_model() {
        let extractor = LlmExtractor::new(OpenAIConfig {
            api_key: "sk-test".to_string(),
            model: "gpt-4o".to_string(),
            text_model: "gpt-3.5-turbo".to_string(),
            base_url: Some("http://127.0.0.1:9".to_string()),
            max_tokens: 500,
        })
        .unwrap();

        let fields = extractor.extract_text("  \n ").await.unwrap();
        assert!(fields.is_not_found());

        let result = extractor.extract_image("/tmp/not-a-data-url.png").await;
        assert!(matches!(result, Err(ScannerError::Validation(_))));
    }
}
