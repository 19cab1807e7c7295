// ============================================================================
// cirkit - Components
// The tagged component tree, its router and the mount walk
// ============================================================================

mod mount;
mod router;

use std::fmt;
use std::rc::Rc;

use crate::binding::Template;
use crate::collections::BoundSource;
use crate::core::constants::DEFAULT_TAG;
use crate::core::error::Result;
use crate::render::{NodeRef, RenderTarget};

pub use mount::mount;
pub use router::PathRouter;

// =============================================================================
// PROPS
// =============================================================================

/// Static node properties plus the signals a component declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Props {
    pub tag: String,
    pub class: Option<String>,
    pub text: Option<String>,
    pub style: Vec<(String, String)>,
    pub attributes: Vec<(String, String)>,
    /// Plain names (`"click"`) or delegated item events (`"item.click"`).
    pub signals: Vec<String>,
    /// State key whose value replaces this node's text on
    /// [`PathRouter::update`].
    pub state: Option<String>,
}

impl Default for Props {
    fn default() -> Self {
        Self::new(DEFAULT_TAG)
    }
}

impl Props {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            class: None,
            text: None,
            style: Vec::new(),
            attributes: Vec::new(),
            signals: Vec::new(),
            state: None,
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

    pub fn signal(mut self, name: impl Into<String>) -> Self {
        self.signals.push(name.into());
        self
    }

    /// Bind the node's text to `key` of the state passed to
    /// [`PathRouter::update`] for this component or any ancestor.
    pub fn bind_text(mut self, key: impl Into<String>) -> Self {
        self.state = Some(key.into());
        self
    }

    pub(crate) fn apply(&self, target: &dyn RenderTarget, node: NodeRef) -> Result<()> {
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
        Ok(())
    }
}

// =============================================================================
// COMPONENT
// =============================================================================

/// A node of the declared UI tree.
#[derive(Clone)]
pub enum Component {
    Leaf(Props),
    /// Children mount in declaration order under `path.name`.
    Container {
        props: Props,
        children: Vec<(String, Component)>,
    },
    /// A container whose children come from a bound collection.
    Collection {
        props: Props,
        template: Rc<Template>,
        source: Rc<dyn BoundSource>,
    },
}

impl Component {
    pub fn leaf(props: Props) -> Self {
        Self::Leaf(props)
    }

    pub fn container<I, S>(props: Props, children: I) -> Self
    where
        I: IntoIterator<Item = (S, Component)>,
        S: Into<String>,
    {
        Self::Container {
            props,
            children: children
                .into_iter()
                .map(|(name, child)| (name.into(), child))
                .collect(),
        }
    }

    pub fn collection<S>(props: Props, template: Template, source: &S) -> Self
    where
        S: BoundSource + Clone + 'static,
    {
        Self::Collection {
            props,
            template: Rc::new(template),
            source: Rc::new(source.clone()),
        }
    }

    pub fn props(&self) -> &Props {
        match self {
            Self::Leaf(props) => props,
            Self::Container { props, .. } => props,
            Self::Collection { props, .. } => props,
        }
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf(props) => f.debug_tuple("Leaf").field(props).finish(),
            Self::Container { props, children } => f
                .debug_struct("Container")
                .field("props", props)
                .field("children", children)
                .finish(),
            Self::Collection {
                props,
                template,
                source,
            } => f
                .debug_struct("Collection")
                .field("props", props)
                .field("template", template)
                .field("source", source.name())
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::Bus;
    use crate::collections::Collection;
    use crate::render::MemoryTree;

    #[test]
    fn props_default_to_div() {
        let props = Props::default();
        assert_eq!(props.tag, "div");
        assert!(props.signals.is_empty());
        assert_eq!(props.state, None);
        assert_eq!(Props::new("span").bind_text("val").state.as_deref(), Some("val"));
    }

    #[test]
    fn props_apply_to_node() {
        let tree = MemoryTree::new();
        let node = tree.create_node("span").unwrap();
        Props::new("span")
            .class("HBox wide")
            .text("hi")
            .style("color", "red")
            .attr("id", "greeting")
            .apply(&tree, node)
            .unwrap();
        assert_eq!(
            tree.outer_html(node),
            "<span class=\"HBox wide\" id=\"greeting\" style=\"color: red\">hi</span>"
        );
    }

    #[test]
    fn component_accessors() {
        let bus = Bus::new();
        let colors: Collection<String> = Collection::new("colors", &bus);
        let tree = Component::container(
            Props::default(),
            [
                ("title", Component::leaf(Props::new("h1").text("Colors"))),
                (
                    "colors",
                    Component::collection(Props::new("ul"), Template::tag("li"), &colors),
                ),
            ],
        );

        let Component::Container { children, .. } = &tree else {
            panic!("expected a container");
        };
        assert_eq!(children[0].0, "title");
        assert_eq!(children[1].1.props().tag, "ul");
        assert!(format!("{tree:?}").contains("\"colors\""));
    }
}
