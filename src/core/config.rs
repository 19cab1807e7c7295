// ============================================================================
// cirkit - Bus Configuration
// ============================================================================

use super::constants::DEFAULT_MAX_CASCADE;

/// Tunables for a [`Bus`](crate::Bus).
///
/// # Example
///
/// ```
/// use cirkit::{Bus, BusConfig};
///
/// let bus = Bus::with_config(BusConfig::default().with_max_cascade(64));
/// assert_eq!(bus.config().max_cascade, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusConfig {
    /// Upper bound on queue entries dispatched by one drain.
    ///
    /// A slot that keeps re-emitting its own signal would otherwise spin
    /// forever; past this bound the drain stops with
    /// [`CircuitError::CascadeOverflow`](crate::CircuitError::CascadeOverflow).
    pub max_cascade: usize,
}

impl BusConfig {
    pub fn with_max_cascade(mut self, limit: usize) -> Self {
        self.max_cascade = limit;
        self
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            max_cascade: DEFAULT_MAX_CASCADE,
        }
    }
}
