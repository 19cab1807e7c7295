// ============================================================================
// cirkit - Ergonomic Macros
// ============================================================================

/// Helper macro to clone variables into a move closure.
///
/// Handles (`Bus`, `Collection`, `Rc`s) are cheap to clone, and slots need
/// their own copy.
///
/// # Usage
///
/// ```rust
/// use cirkit::{cloned, Bus};
/// use serde_json::json;
///
/// let bus = Bus::new();
/// bus.on("ping", cloned!(bus => move |payload, _| bus.emit("pong", payload.clone())));
/// bus.emit("ping", json!(1)).unwrap();
/// ```
#[macro_export]
macro_rules! cloned {
    ($($n:ident),+ => $e:expr) => {
        {
            $( let $n = $n.clone(); )+
            $e
        }
    };
}

/// Build a [`Slot`](crate::Slot) with automatic variable capturing.
///
/// Wraps `slot(cloned!(... => move |payload, signal| ...))` and annotates the
/// closure arguments.
///
/// # Usage
///
/// ```rust
/// use cirkit::{slot, Bus, Collection};
/// use serde_json::json;
///
/// let bus = Bus::new();
/// let colors: Collection<String> = Collection::new("colors", &bus);
///
/// // Clean syntax: list captures => closure
/// bus.wire("ui.pick", slot!(colors => |payload, _| {
///     colors.select(payload.as_u64().map(|i| i as usize))
/// }));
///
/// colors.add("red".to_string(), None).unwrap();
/// bus.emit("ui.pick", json!(0)).unwrap();
/// assert_eq!(colors.selected_index(), Some(0));
/// ```
#[macro_export]
macro_rules! slot {
    // Case 1: With captures
    ($($n:ident),+ => |$payload:pat_param, $signal:pat_param| $body:expr) => {
        $crate::slot($crate::cloned!($($n),+ =>
            move |$payload: &::serde_json::Value, $signal: &$crate::SignalKey| $body
        ))
    };
    // Case 2: No captures
    (|$payload:pat_param, $signal:pat_param| $body:expr) => {
        $crate::slot(move |$payload: &::serde_json::Value, $signal: &$crate::SignalKey| $body)
    };
}
