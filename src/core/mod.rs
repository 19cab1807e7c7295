// ============================================================================
// cirkit - Core Module
// Signal keys, payload shapes, errors and configuration shared by every layer
// ============================================================================

pub mod config;
pub mod constants;
pub mod error;
pub mod types;

// Re-export commonly used items
pub use config::BusConfig;
pub use constants::*;
pub use error::{CircuitError, Result};
pub use types::{decode, decode_index, IndexedItem, Selection, SignalKey};
