// ============================================================================
// cirkit - Binding
// Templates, node indexes and the binder that ties them to a collection
// ============================================================================

mod binder;
mod node_index;
mod setters;
mod template;

pub use binder::CollectionBinder;
pub use node_index::{ItemRefs, NodeIndex, RefTree};
pub use setters::{render_value, set_attr, set_class, set_style, set_text, toggle_class};
pub use template::{selector, setter, Blueprint, BlueprintNode, Selector, Setter, Template};
