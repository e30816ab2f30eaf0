//! Supabase REST client for the stored address table

use crate::config::SupabaseConfig;
use crate::constants::SEARCH_RESULT_LIMIT;
use crate::error::{Result, ScannerError};
use address_types::{AddressInput, AddressPatch, SearchParams, StoredAddress};
use chrono::{DateTime, Utc};
use reqwest::{Client as HttpClient, RequestBuilder, Response};
use serde_json::{Map, Value};

pub struct SupabaseClient {
    config: SupabaseConfig,
    http_client: HttpClient,
}

impl SupabaseClient {
    pub fn new(config: SupabaseConfig) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| ScannerError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn table_url(&self) -> String {
        format!(
            "{}/rest/v1/{}",
            self.config.url.trim_end_matches('/'),
            self.config.table
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.config.service_role_key)
            .bearer_auth(&self.config.service_role_key)
    }

    /// Insert a new address and return the stored row
    pub async fn insert_address(&self, input: &AddressInput) -> Result<StoredAddress> {
        let row = insert_row(input)?;

        let response = self
            .authorized(self.http_client.post(self.table_url()))
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await?;

        let rows: Vec<StoredAddress> = check_status(response, "add address").await?.json().await?;
        let stored = rows.into_iter().next().ok_or_else(|| {
            ScannerError::Processing("Insert returned no row".to_string())
        })?;

        log::info!("Stored address {}", stored.id);
        Ok(stored)
    }

    /// Update the given columns of an existing address
    pub async fn update_address(&self, id: &str, patch: &AddressPatch) -> Result<StoredAddress> {
        let id = id.trim();
        if id.is_empty() {
            return Err(ScannerError::Validation("Address ID is required".to_string()));
        }

        let body = update_row(patch, Utc::now());

        let response = self
            .authorized(self.http_client.patch(self.table_url()))
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await?;

        let rows: Vec<StoredAddress> = check_status(response, "update address").await?.json().await?;
        let updated = rows
            .into_iter()
            .next()
            .ok_or_else(|| ScannerError::NotFound(format!("Address {} not found", id)))?;

        log::info!("Updated address {}", updated.id);
        Ok(updated)
    }

    /// Case-insensitive substring search, most recently updated first
    pub async fn search_addresses(&self, params: &SearchParams) -> Result<Vec<StoredAddress>> {
        let Some(query) = search_query(params) else {
            log::debug!("Search without filters, returning no addresses");
            return Ok(Vec::new());
        };

        let response = self
            .authorized(self.http_client.get(self.table_url()))
            .query(&query)
            .send()
            .await?;

        let rows: Vec<StoredAddress> = check_status(response, "search addresses").await?.json().await?;
        log::info!("Search returned {} addresses", rows.len());
        Ok(rows)
    }
}

async fn check_status(response: Response, operation: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
    log::error!("Failed to {}: {} {}", operation, status, error_text);
    Err(ScannerError::ServiceUnavailable(format!(
        "Failed to {}: {} - {}",
        operation, status, error_text
    )))
}

/// Blank strings are stored as null
fn nullable(value: &Option<String>) -> Value {
    match value.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => Value::String(text.to_string()),
        _ => Value::Null,
    }
}

fn insert_row(input: &AddressInput) -> Result<Map<String, Value>> {
    if input.full_text.trim().is_empty() {
        return Err(ScannerError::Validation("full_text is required".to_string()));
    }

    let full_text = Value::String(input.full_text.clone());
    let mut row = Map::new();
    row.insert("address".to_string(), full_text.clone());
    row.insert("full_text".to_string(), full_text);
    row.insert("salutation".to_string(), nullable(&input.salutation));
    row.insert("first_name".to_string(), nullable(&input.first_name));
    row.insert("last_name".to_string(), nullable(&input.last_name));
    row.insert("company".to_string(), nullable(&input.company));
    row.insert("street_name".to_string(), nullable(&input.street_name));
    row.insert("street_number".to_string(), nullable(&input.street_number));
    row.insert("postal_code".to_string(), nullable(&input.postal_code));
    row.insert("place".to_string(), nullable(&input.place));
    row.insert("image_data".to_string(), nullable(&input.image_data));
    Ok(row)
}

fn update_row(patch: &AddressPatch, now: DateTime<Utc>) -> Map<String, Value> {
    let mut row = Map::new();
    row.insert("updated_at".to_string(), Value::String(now.to_rfc3339()));

    if let Some(full_text) = &patch.full_text {
        row.insert("address".to_string(), Value::String(full_text.clone()));
        row.insert("full_text".to_string(), Value::String(full_text.clone()));
    }

    let columns = [
        ("salutation", &patch.salutation),
        ("first_name", &patch.first_name),
        ("last_name", &patch.last_name),
        ("company", &patch.company),
        ("street_name", &patch.street_name),
        ("street_number", &patch.street_number),
        ("postal_code", &patch.postal_code),
        ("place", &patch.place),
        ("image_data", &patch.image_data),
    ];
    for (column, value) in columns {
        if value.is_some() {
            row.insert(column.to_string(), nullable(value));
        }
    }

    row
}

/// Query pairs for a search, or `None` when no filter is usable
fn search_query(params: &SearchParams) -> Option<Vec<(String, String)>> {
    let filters = [
        ("company", &params.company),
        ("first_name", &params.first_name),
        ("last_name", &params.last_name),
        ("place", &params.place),
    ];

    let conditions: Vec<(String, String)> = filters
        .into_iter()
        .filter_map(|(column, value)| {
            let value = value.as_deref()?.trim();
            if value.is_empty() {
                None
            } else {
                Some((column.to_string(), format!("ilike.*{}*", value)))
            }
        })
        .collect();

    if conditions.is_empty() {
        return None;
    }

    let mut query = vec![("select".to_string(), "*".to_string())];
    query.extend(conditions);
    query.push(("order".to_string(), "updated_at.desc".to_string()));
    query.push(("limit".to_string(), SEARCH_RESULT_LIMIT.to_string()));
    Some(query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn pair(key: &str, value: &str) -> (String, String) {
        (key.to_string(), value.to_string())
    }

    #[test]
    fn test_table_url() {
        let client = SupabaseClient::new(SupabaseConfig {
            url: "https://project.supabase.co/".to_string(),
            service_role_key: "key".to_string(),
            table: "addresses".to_string(),
        })
        .unwrap();

        assert_eq!(client.table_url(), "https://project.supabase.co/rest/v1/addresses");
    }

    #[test]
    fn test_insert_row_requires_full_text() {
        let input = AddressInput {
            full_text: "   ".to_string(),
            ..Default::default()
        };
        assert!(matches!(insert_row(&input), Err(ScannerError::Validation(_))));
    }

    #[test]
    fn test_insert_row_nulls_blank_fields() {
        let input = AddressInput {
            full_text: "Main Street 12a, 8000 Zurich".to_string(),
            street_name: Some("Main Street".to_string()),
            company: Some(String::new()),
            ..Default::default()
        };

        let row = insert_row(&input).unwrap();
        assert_eq!(row["address"], "Main Street 12a, 8000 Zurich");
        assert_eq!(row["full_text"], "Main Street 12a, 8000 Zurich");
        assert_eq!(row["street_name"], "Main Street");
        assert_eq!(row["company"], Value::Null);
        assert_eq!(row["image_data"], Value::Null);
        assert_eq!(row.len(), 11);
    }

    #[test]
    fn test_insert_row_keeps_full_text_as_sent() {
        let input = AddressInput {
            full_text: "  Lange Gasse 4b\n4052 Basel ".to_string(),
            ..Default::default()
        };

        let row = insert_row(&input).unwrap();
        assert_eq!(row["full_text"], "  Lange Gasse 4b\n4052 Basel ");
        assert_eq!(row["address"], "  Lange Gasse 4b\n4052 Basel ");
    }

    #[test]
    fn test_update_row_only_sends_present_fields() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let patch = AddressPatch {
            place: Some("Bern".to_string()),
            company: Some(String::new()),
            ..Default::default()
        };

        let row = update_row(&patch, now);
        assert_eq!(row["updated_at"], "2024-05-01T12:00:00+00:00");
        assert_eq!(row["place"], "Bern");
        assert_eq!(row["company"], Value::Null);
        assert!(!row.contains_key("first_name"));
        assert!(!row.contains_key("full_text"));
        assert_eq!(row.len(), 3);
    }

    #[test]
    fn test_update_row_full_text_sets_both_columns() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let patch = AddressPatch {
            full_text: Some("Lange Gasse 4b, 4052 Basel".to_string()),
            ..Default::default()
        };

        let row = update_row(&patch, now);
        assert_eq!(row["address"], "Lange Gasse 4b, 4052 Basel");
        assert_eq!(row["full_text"], "Lange Gasse 4b, 4052 Basel");
    }

    #[test]
    fn test_search_query_without_filters() {
        assert_eq!(search_query(&SearchParams::default()), None);

        let blank = SearchParams {
            company: Some("  ".to_string()),
            place: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(search_query(&blank), None);
    }

    #[test]
    fn test_search_query_filters_and_ordering() {
        let params = SearchParams {
            company: None,
            first_name: None,
            last_name: Some(" Mueller ".to_string()),
            place: Some("Zurich".to_string()),
        };

        let query = search_query(&params).unwrap();
        assert_eq!(
            query,
            vec![
                pair("select", "*"),
                pair("last_name", "ilike.*Mueller*"),
                pair("place", "ilike.*Zurich*"),
                pair("order", "updated_at.desc"),
                pair("limit", "10"),
            ]
        );
    }

    #[tokio::test]
    async fn test_search_without_filters_makes_no_request() {
        // Unroutable address: any request would fail
        let client = SupabaseClient::new(SupabaseConfig {
            url: "http://127.0.0.1:9".to_string(),
            service_role_key: "key".to_string(),
            table: "addresses".to_string(),
        })
        .unwrap();

        let rows = client.search_addresses(&SearchParams::default()).await.unwrap();
        assert!(rows.is_empty());

        let result = client.update_address(" ", &AddressPatch::default()).await;
        assert!(matches!(result, Err(ScannerError::Validation(_))));
    }
}
