//! Persistent storage for the generation ledger.

mod json;

pub use json::{DEFAULT_STATE_DIR, JsonStateStore, STATE_FILE};
