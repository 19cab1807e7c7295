// ============================================================================
// cirkit - Constants
// Signal key suffixes and defaults
// ============================================================================

// =============================================================================
// SIGNAL KEY SEGMENTS
// =============================================================================

/// Separator between the segments of a signal key or component path.
pub const SEGMENT_SEPARATOR: char = '.';

/// Suffix of the signal a collection emits after inserting an item.
pub const ADD_SUFFIX: &str = "+";

/// Suffix of the signal a collection emits after deleting an item.
pub const DEL_SUFFIX: &str = "-";

/// Suffix of the signal a collection emits after overwriting an item.
pub const SET_SUFFIX: &str = "*";

/// Suffix of the signal a collection emits when an item is (de)selected.
pub const SEL_SUFFIX: &str = "sel";

/// Prefix marking a declared signal as delegated to collection items.
///
/// `item.click` on a collection component listens for `click` once on the
/// container and emits the index of the item the click landed in.
pub const ITEM_PREFIX: &str = "item.";

// =============================================================================
// DEFAULTS
// =============================================================================

/// Tag used for components that do not name one.
pub const DEFAULT_TAG: &str = "div";

/// Tag of the root node of a fresh `MemoryTree`.
pub const ROOT_TAG: &str = "body";

/// Maximum number of queue entries a single drain dispatches before it is
/// considered a runaway cascade.
pub const DEFAULT_MAX_CASCADE: usize = 10_000;
