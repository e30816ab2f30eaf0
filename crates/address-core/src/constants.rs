/// Shared constants for the address scanner

/// Placeholder shipped in example credential files; treated as "no key"
pub const OPENAI_KEY_PLACEHOLDER: &str = "your_openai_api_key_here";

/// Maximum number of rows returned by a remote search
pub const SEARCH_RESULT_LIMIT: usize = 10;

/// Key under which the local history list is persisted
pub const HISTORY_STORAGE_KEY: &str = "address_scanner_history";

/// Separator used when joining recognised lines into the full text
pub const FULL_TEXT_SEPARATOR: &str = ", ";
