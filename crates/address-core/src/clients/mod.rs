//! Client modules for external services

pub mod openai;
pub mod supabase;

// Re-export all client types
pub use openai::OpenAIClient;
pub use supabase::SupabaseClient;
