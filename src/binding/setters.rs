// ============================================================================
// cirkit - Setter Helpers
// Ready-made setters and selectors for templates
// ============================================================================
//
// Paths name a node inside the item and, for most helpers, a property on
// it: "color" is the root's `color` style, "box.boxColor.background-color"
// is `background-color` on the `boxColor` node of a nested item.
// ============================================================================

use std::rc::Rc;

use serde_json::Value;

use super::node_index::ItemRefs;
use super::template::{Selector, Setter};
use crate::core::constants::SEGMENT_SEPARATOR;
use crate::core::error::{CircuitError, Result};
use crate::render::{NodeRef, RenderTarget};

/// Split `"a.b.prop"` into `("a.b", "prop")`.
fn split_property(path: &str) -> (String, String) {
    match path.rsplit_once(SEGMENT_SEPARATOR) {
        Some((node, property)) => (node.to_string(), property.to_string()),
        None => (String::new(), path.to_string()),
    }
}

fn locate(refs: &ItemRefs, path: &str) -> Result<NodeRef> {
    refs.find(path).ok_or_else(|| CircuitError::unresolved(path))
}

/// Text form of a field value: strings verbatim, `null` empty, anything else
/// as JSON.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Null => false,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Set the text of the node at `path` (empty path: the item root).
pub fn set_text(path: &str) -> Setter {
    let path = path.to_string();
    Rc::new(move |target: &dyn RenderTarget, refs: &ItemRefs, value: &Value, _: usize| {
        let node = locate(refs, &path)?;
        target.set_text_content(node, &render_value(value))?;
        Ok(())
    })
}

/// Set a style property; the last path segment is the property name.
pub fn set_style(path: &str) -> Setter {
    let (node_path, property) = split_property(path);
    Rc::new(move |target: &dyn RenderTarget, refs: &ItemRefs, value: &Value, _: usize| {
        let node = locate(refs, &node_path)?;
        target.set_style_property(node, &property, &render_value(value))?;
        Ok(())
    })
}

/// Set an attribute; the last path segment is the attribute name.
pub fn set_attr(path: &str) -> Setter {
    let (node_path, attribute) = split_property(path);
    Rc::new(move |target: &dyn RenderTarget, refs: &ItemRefs, value: &Value, _: usize| {
        let node = locate(refs, &node_path)?;
        target.set_attribute(node, &attribute, &render_value(value))?;
        Ok(())
    })
}

/// Add or remove a class depending on whether the field value is truthy.
pub fn set_class(path: &str) -> Setter {
    let (node_path, class) = split_property(path);
    Rc::new(move |target: &dyn RenderTarget, refs: &ItemRefs, value: &Value, _: usize| {
        let node = locate(refs, &node_path)?;
        target.set_class_presence(node, &class, truthy(value))?;
        Ok(())
    })
}

/// A selector that toggles a class with the selection state.
pub fn toggle_class(path: &str) -> Selector {
    let (node_path, class) = split_property(path);
    Rc::new(move |target: &dyn RenderTarget, refs: &ItemRefs, selected: bool| {
        let node = locate(refs, &node_path)?;
        target.set_class_presence(node, &class, selected)?;
        Ok(())
    })
}
