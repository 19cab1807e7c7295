// ============================================================================
// cirkit - Templates
// How one collection item becomes render nodes
// ============================================================================

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use super::node_index::{ItemRefs, RefTree};
use crate::core::error::Result;
use crate::render::RenderTarget;

/// Applies one item field to the item's nodes: `(target, refs, value, index)`.
pub type Setter = Rc<dyn Fn(&dyn RenderTarget, &ItemRefs, &Value, usize) -> Result<()>>;

/// Marks an item's nodes as selected or not.
pub type Selector = Rc<dyn Fn(&dyn RenderTarget, &ItemRefs, bool) -> Result<()>>;

/// Wrap a closure as a [`Setter`].
pub fn setter<F>(f: F) -> Setter
where
    F: Fn(&dyn RenderTarget, &ItemRefs, &Value, usize) -> Result<()> + 'static,
{
    Rc::new(f)
}

/// Wrap a closure as a [`Selector`].
pub fn selector<F>(f: F) -> Selector
where
    F: Fn(&dyn RenderTarget, &ItemRefs, bool) -> Result<()> + 'static,
{
    Rc::new(f)
}

// =============================================================================
// BLUEPRINT
// =============================================================================

/// One node of a nested item blueprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlueprintNode {
    pub name: String,
    pub tag: String,
    pub class: Option<String>,
    pub text: Option<String>,
    pub style: Vec<(String, String)>,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<BlueprintNode>,
}

impl BlueprintNode {
    pub fn new(name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag: tag.into(),
            class: None,
            text: None,
            style: Vec::new(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn style(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.style.push((name.into(), value.into()));
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn child(mut self, child: BlueprintNode) -> Self {
        self.children.push(child);
        self
    }

    fn plant(&self, target: &dyn RenderTarget) -> Result<RefTree> {
        let node = target.create_node(&self.tag)?;
        if let Some(class) = &self.class {
            for name in class.split_whitespace() {
                target.set_class_presence(node, name, true)?;
            }
        }
        if let Some(text) = &self.text {
            target.set_text_content(node, text)?;
        }
        for (name, value) in &self.style {
            target.set_style_property(node, name, value)?;
        }
        for (name, value) in &self.attributes {
            target.set_attribute(node, name, value)?;
        }

        let mut children = Vec::with_capacity(self.children.len());
        for child in &self.children {
            let planted = child.plant(target)?;
            target.append_child(node, planted.node)?;
            children.push(planted);
        }
        Ok(RefTree {
            name: self.name.clone(),
            node,
            children,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Blueprint {
    /// Each item is a single node with this tag.
    Tag(String),
    /// Each item is a copy of this subtree.
    Nested(BlueprintNode),
}

// =============================================================================
// TEMPLATE
// =============================================================================

/// Blueprint plus per-field setters, attached to a collection component.
///
/// # Example
///
/// ```
/// use cirkit::{set_style, set_text, toggle_class, Template};
///
/// let template = Template::tag("li")
///     .field("text", set_text(""))
///     .field("color", set_style("color"))
///     .selector(toggle_class("todoSelected"));
/// assert!(template.setter("text").is_some());
/// assert!(template.has_selector());
/// ```
#[derive(Clone)]
pub struct Template {
    blueprint: Blueprint,
    setters: HashMap<String, Setter>,
    selector: Option<Selector>,
}

impl Template {
    pub fn new(blueprint: Blueprint) -> Self {
        Self {
            blueprint,
            setters: HashMap::new(),
            selector: None,
        }
    }

    pub fn tag(tag: impl Into<String>) -> Self {
        Self::new(Blueprint::Tag(tag.into()))
    }

    pub fn nested(root: BlueprintNode) -> Self {
        Self::new(Blueprint::Nested(root))
    }

    /// Declare the setter for an item field. A later call for the same field
    /// replaces the earlier setter.
    pub fn field(mut self, name: impl Into<String>, setter: Setter) -> Self {
        self.setters.insert(name.into(), setter);
        self
    }

    pub fn selector(mut self, selector: Selector) -> Self {
        self.selector = Some(selector);
        self
    }

    pub fn blueprint(&self) -> &Blueprint {
        &self.blueprint
    }

    pub fn setter(&self, field: &str) -> Option<&Setter> {
        self.setters.get(field)
    }

    pub fn selector_fn(&self) -> Option<&Selector> {
        self.selector.as_ref()
    }

    pub fn has_selector(&self) -> bool {
        self.selector.is_some()
    }

    /// Create the detached nodes for one item.
    pub fn build(&self, target: &dyn RenderTarget) -> Result<ItemRefs> {
        match &self.blueprint {
            Blueprint::Tag(tag) => Ok(ItemRefs::Single(target.create_node(tag)?)),
            Blueprint::Nested(root) => Ok(ItemRefs::Tree(root.plant(target)?)),
        }
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields: Vec<&str> = self.setters.keys().map(String::as_str).collect();
        fields.sort_unstable();
        f.debug_struct("Template")
            .field("blueprint", &self.blueprint)
            .field("fields", &fields)
            .field("selector", &self.selector.is_some())
            .finish()
    }
}
