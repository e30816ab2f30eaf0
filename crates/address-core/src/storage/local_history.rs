//! File-backed local history of scanned addresses
//! The whole list lives under one fixed key, newest entry first

use crate::constants::HISTORY_STORAGE_KEY;
use crate::error::{Result, ScannerError};
use address_types::{HistoryEntry, ParsedAddressFields};
use chrono::Utc;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub struct LocalHistory {
    root_path: PathBuf,
}

impl LocalHistory {
    pub fn new<P: AsRef<Path>>(root_path: P) -> Self {
        Self {
            root_path: root_path.as_ref().to_path_buf(),
        }
    }

    /// File holding the persisted list
    pub fn storage_path(&self) -> PathBuf {
        self.root_path.join(format!("{}.json", HISTORY_STORAGE_KEY))
    }

    fn read_entries(&self) -> Result<Vec<HistoryEntry>> {
        let json = match fs::read_to_string(self.storage_path()) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&json)
            .map_err(|e| ScannerError::Processing(format!("Failed to deserialize history: {}", e)))
    }

    fn write_entries(&self, entries: &[HistoryEntry]) -> Result<()> {
        fs::create_dir_all(&self.root_path)?;

        let json = serde_json::to_string_pretty(entries)?;
        let path = self.storage_path();
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    /// All saved entries, newest first. Unreadable data yields an empty list.
    pub fn list(&self) -> Vec<HistoryEntry> {
        match self.read_entries() {
            Ok(entries) => entries,
            Err(e) => {
                log::error!("Error loading addresses: {}", e);
                Vec::new()
            }
        }
    }

    /// Prepend a new entry for the given fields and persist the list
    pub fn save(
        &self,
        fields: &ParsedAddressFields,
        image_data: Option<String>,
    ) -> Result<HistoryEntry> {
        let mut entries = self.list();

        let entry = HistoryEntry {
            id: generate_id(),
            address: fields.full_text.clone(),
            created_at: Utc::now(),
            image_data,
            salutation: fields.salutation,
            first_name: fields.first_name.clone(),
            last_name: fields.last_name.clone(),
            street_name: fields.street_name.clone(),
            street_number: fields.street_number.clone(),
            postal_code: fields.postal_code.clone(),
            place: fields.place.clone(),
        };

        entries.insert(0, entry.clone());
        self.write_entries(&entries)?;

        log::info!("Saved address {} to local history", entry.id);
        Ok(entry)
    }

    /// Remove every entry with the given id. Returns false when storage failed.
    pub fn delete(&self, id: &str) -> bool {
        let result = self.read_entries().and_then(|entries| {
            let filtered: Vec<HistoryEntry> =
                entries.into_iter().filter(|entry| entry.id != id).collect();
            self.write_entries(&filtered)
        });

        match result {
            Ok(()) => true,
            Err(e) => {
                log::error!("Error deleting address: {}", e);
                false
            }
        }
    }

    /// Drop the stored list entirely
    pub fn clear_all(&self) -> Result<()> {
        match fs::remove_file(self.storage_path()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// `<unix millis>-<7 random alphanumerics>`
fn generate_id() -> String {
    let suffix: String = uuid::Uuid::new_v4().simple().to_string().chars().take(7).collect();
    format!("{}-{}", Utc::now().timestamp_millis(), suffix)
}
