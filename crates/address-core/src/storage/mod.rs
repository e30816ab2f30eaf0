//! Local persistence

pub mod local_history;

pub use local_history::LocalHistory;
