// ============================================================================
// cirkit - Collections
// Observable lists and the source interface binders read them through
// ============================================================================

mod collection;

use serde_json::Value;

use crate::core::error::Result;
use crate::core::types::SignalKey;

pub use collection::{Collection, CollectionKeys};

/// What a binder needs from a collection, with the item type erased.
///
/// A binder subscribes by name and renders the current contents once at
/// bind time; after that it only follows the signal stream.
pub trait BoundSource {
    /// Base of the collection's signal keys.
    fn name(&self) -> &SignalKey;

    /// Current items, serialized, in order.
    fn snapshot(&self) -> Result<Vec<Value>>;

    fn selected_index(&self) -> Option<usize>;
}
