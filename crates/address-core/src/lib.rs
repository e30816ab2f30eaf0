//! Address Scanner Core Library
//!
//! Turns photographed or typed postal addresses into structured fields and
//! stores them. Contains the heuristic and LLM extractors, the remote store
//! client and the local history.

pub mod config;
pub mod clients;
pub mod services;
pub mod storage;
pub mod image;
pub mod error;
pub mod constants;

// Re-export main types for easy access
pub use config::ScannerConfig;
pub use error::{Result, ScannerError};

pub use clients::{OpenAIClient, SupabaseClient};

pub use services::{
    extract_fields,
    select_extractor,
    AddressExtractor,
    FullTextMode,
    HeuristicExtractor,
    LlmExtractor,
};

pub use storage::LocalHistory;

pub use address_types::{
    AddressInput,
    AddressPatch,
    HistoryEntry,
    ParsedAddressFields,
    Salutation,
    SearchParams,
    StoredAddress,
    NO_ADDRESS_FOUND,
};
