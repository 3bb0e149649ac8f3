//! Type- and mark-keyed HTML serializers
//!
//! Rendering is driven by a registry: node types map to serializer
//! functions, and mark names map to wrapping rules. Callers override
//! entries key by key; the merge is explicit and recursive over the
//! nested mark table, never a wholesale replacement.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::Error;
use crate::html::HtmlBuilder;
use crate::image_url::image_url;
use crate::node::{Mark, Node};

/// A node serializer
///
/// Receives the node with the HTML of its children already rendered, the
/// parent node (if any), and the owning builder for escaping and
/// configuration access.
pub type TypeSerializer =
    Box<dyn Fn(&Rendered<'_>, Option<&Node>, &HtmlBuilder) -> Result<String, Error> + Send + Sync>;

/// A node paired with the rendered HTML of its children, in order
pub struct Rendered<'a> {
    /// The node being serialized
    pub node: &'a Node,

    /// Rendered HTML of each child
    pub children: Vec<String>,
}

impl Rendered<'_> {
    /// Concatenated child HTML
    pub fn children_html(&self) -> String {
        self.children.concat()
    }
}

/// How a mark wraps its rendered children
pub enum MarkSerializer {
    /// Wrap children in `<tag>`/`</tag>`
    Tag(String),

    /// Explicit head/tail pair; either side may be computed from the mark
    Wrap {
        /// Opening markup
        head: Segment,
        /// Closing markup
        tail: Segment,
    },

    /// Full control: receives the mark and the rendered children and
    /// returns complete markup, bypassing head/tail wrapping
    Custom(Box<dyn Fn(&Mark, &[String]) -> String + Send + Sync>),
}

impl MarkSerializer {
    /// A plain tag wrapper
    pub fn tag(name: impl Into<String>) -> Self {
        MarkSerializer::Tag(name.into())
    }

    /// A literal head/tail pair
    pub fn wrap(head: impl Into<String>, tail: impl Into<String>) -> Self {
        MarkSerializer::Wrap {
            head: Segment::Literal(head.into()),
            tail: Segment::Literal(tail.into()),
        }
    }
}

/// One side of a [`MarkSerializer::Wrap`] pair
pub enum Segment {
    /// Fixed markup
    Literal(String),

    /// Markup computed from the mark (e.g. an `href` attribute)
    Dynamic(Box<dyn Fn(&Mark) -> String + Send + Sync>),
}

impl Segment {
    /// A fixed segment
    pub fn literal(markup: impl Into<String>) -> Self {
        Segment::Literal(markup.into())
    }

    /// A segment computed from the mark at render time
    pub fn dynamic<F>(render: F) -> Self
    where
        F: Fn(&Mark) -> String + Send + Sync + 'static,
    {
        Segment::Dynamic(Box::new(render))
    }

    pub(crate) fn render(&self, mark: &Mark) -> String {
        match self {
            Segment::Literal(markup) => markup.clone(),
            Segment::Dynamic(render) => render(mark),
        }
    }
}

/// Caller-supplied serializer overrides, merged over the defaults
#[derive(Default)]
pub struct SerializerOverrides {
    types: HashMap<String, TypeSerializer>,
    marks: HashMap<String, Option<MarkSerializer>>,
}

impl SerializerOverrides {
    /// Empty override set
    pub fn new() -> Self {
        Self::default()
    }

    /// Override (or add) the serializer for a node type
    pub fn with_type<F>(mut self, name: impl Into<String>, serializer: F) -> Self
    where
        F: Fn(&Rendered<'_>, Option<&Node>, &HtmlBuilder) -> Result<String, Error>
            + Send
            + Sync
            + 'static,
    {
        self.types.insert(name.into(), Box::new(serializer));
        self
    }

    /// Override (or add) the serializer for a mark
    pub fn with_mark(mut self, name: impl Into<String>, serializer: MarkSerializer) -> Self {
        self.marks.insert(name.into(), Some(serializer));
        self
    }

    /// Unregister a default mark: its children render unwrapped
    pub fn without_mark(mut self, name: impl Into<String>) -> Self {
        self.marks.insert(name.into(), None);
        self
    }
}

/// Immutable registry mapping node types and mark names to serializers
///
/// Constructed once per [`HtmlBuilder`]; safe to share read-only across
/// parallel renders.
pub struct SerializerSet {
    types: HashMap<String, TypeSerializer>,
    marks: HashMap<String, MarkSerializer>,
}

impl SerializerSet {
    /// Built-in defaults for `block`, `list`, `listItem`, `span` and
    /// `image` nodes plus the well-known marks
    pub fn defaults() -> Self {
        let mut types: HashMap<String, TypeSerializer> = HashMap::new();
        types.insert("block".to_string(), Box::new(default_block));
        types.insert("list".to_string(), Box::new(default_list));
        types.insert("listItem".to_string(), Box::new(default_list_item));
        types.insert("span".to_string(), Box::new(default_span));
        types.insert("image".to_string(), Box::new(default_image));

        let mut marks: HashMap<String, MarkSerializer> = HashMap::new();
        marks.insert("em".to_string(), MarkSerializer::tag("em"));
        marks.insert("code".to_string(), MarkSerializer::tag("code"));
        marks.insert("strong".to_string(), MarkSerializer::tag("strong"));
        marks.insert(
            "underline".to_string(),
            MarkSerializer::wrap("<span style=\"text-decoration: underline;\">", "</span>"),
        );
        marks.insert(
            "link".to_string(),
            MarkSerializer::Wrap {
                head: Segment::dynamic(|mark| {
                    let href = mark
                        .attribute("href")
                        .and_then(Value::as_str)
                        .unwrap_or_default();
                    format!("<a href=\"{href}\">")
                }),
                tail: Segment::literal("</a>"),
            },
        );

        Self { types, marks }
    }

    /// Deep-merge caller overrides over the defaults
    ///
    /// Type and mark entries win per key; a mark override of `None`
    /// removes the default entry.
    pub fn merged(overrides: SerializerOverrides) -> Self {
        let mut set = Self::defaults();
        for (name, serializer) in overrides.types {
            set.types.insert(name, serializer);
        }
        for (name, serializer) in overrides.marks {
            match serializer {
                Some(serializer) => {
                    set.marks.insert(name, serializer);
                }
                None => {
                    set.marks.remove(&name);
                }
            }
        }
        set
    }

    /// Check that the serializers every tree shape relies on are present
    pub fn validate(&self) -> Result<(), Error> {
        for required in ["block", "list", "listItem", "span", "image"] {
            if !self.types.contains_key(required) {
                return Err(Error::Config(format!(
                    "serializer registry is missing the default \"{required}\" entry"
                )));
            }
        }
        Ok(())
    }

    /// Serializer for a node type
    ///
    /// Unknown node types are a configuration error: content-modeling
    /// gaps surface immediately instead of rendering silently wrong.
    pub fn for_type(&self, name: &str) -> Result<&TypeSerializer, Error> {
        self.types.get(name).ok_or_else(|| {
            Error::Config(format!("No serializer registered for node type \"{name}\""))
        })
    }

    /// Serializer for a mark, if one is registered
    ///
    /// Unknown marks are not an error; their children render unwrapped.
    pub fn for_mark(&self, mark: &Mark) -> Option<&MarkSerializer> {
        self.marks.get(mark.name())
    }
}

/// Default `block` serializer
///
/// Style `normal` renders as `<p>`; any other style is used verbatim as
/// the tag name (`h2` becomes `<h2>`).
pub fn default_block(
    rendered: &Rendered<'_>,
    _parent: Option<&Node>,
    _builder: &HtmlBuilder,
) -> Result<String, Error> {
    let style = match rendered.node {
        Node::Block { style, .. } => style.as_str(),
        _ => "normal",
    };
    let tag = if style == "normal" { "p" } else { style };
    Ok(format!("<{tag}>{}</{tag}>", rendered.children_html()))
}

/// Default `list` serializer: `number` lists are ordered
pub fn default_list(
    rendered: &Rendered<'_>,
    _parent: Option<&Node>,
    _builder: &HtmlBuilder,
) -> Result<String, Error> {
    let item_style = match rendered.node {
        Node::List { item_style, .. } => item_style.as_str(),
        _ => "",
    };
    let tag = if item_style == "number" { "ol" } else { "ul" };
    Ok(format!("<{tag}>{}</{tag}>", rendered.children_html()))
}

/// Default `listItem` serializer
pub fn default_list_item(
    rendered: &Rendered<'_>,
    _parent: Option<&Node>,
    _builder: &HtmlBuilder,
) -> Result<String, Error> {
    Ok(format!("<li>{}</li>", rendered.children_html()))
}

/// Default `span` serializer
///
/// Applies the resolved mark wrapping around the rendered children. A
/// span whose attributes carry a `link` with an `href` (inline
/// attributes retained on the span itself) is additionally wrapped in an
/// anchor, outside any mark wrapping.
pub fn default_span(
    rendered: &Rendered<'_>,
    _parent: Option<&Node>,
    builder: &HtmlBuilder,
) -> Result<String, Error> {
    let inner = rendered.children_html();
    let Node::Span {
        mark, attributes, ..
    } = rendered.node
    else {
        return Ok(inner);
    };

    let mut html = match mark
        .as_ref()
        .and_then(|mark| builder.serializers().for_mark(mark).map(|s| (mark, s)))
    {
        Some((_, MarkSerializer::Tag(tag))) => format!("<{tag}>{inner}</{tag}>"),
        Some((mark, MarkSerializer::Wrap { head, tail })) => {
            format!("{}{inner}{}", head.render(mark), tail.render(mark))
        }
        Some((mark, MarkSerializer::Custom(render))) => {
            return Ok(render(mark, &rendered.children))
        }
        None => inner,
    };

    if let Some(href) = attributes
        .get("link")
        .and_then(|link| link.get("href"))
        .and_then(Value::as_str)
    {
        html = format!("<a href=\"{href}\">{html}</a>");
    }
    Ok(html)
}

/// Default `image` serializer
///
/// Resolves the asset reference to a URL (direct or CDN-constructed) and
/// emits a figure.
pub fn default_image(
    rendered: &Rendered<'_>,
    _parent: Option<&Node>,
    builder: &HtmlBuilder,
) -> Result<String, Error> {
    let url = image_url(rendered.node, builder)?;
    Ok(format!("<figure><img src=\"{url}\" /></figure>"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::{HtmlBuilder, HtmlOptions};
    use serde_json::Map;

    fn render_node(node: &Node) -> String {
        HtmlBuilder::new(HtmlOptions::default())
            .build_node(node, None)
            .unwrap()
    }

    #[test]
    fn defaults_pass_validation() {
        assert!(SerializerSet::defaults().validate().is_ok());
    }

    #[test]
    fn block_styles_select_the_tag() {
        let normal = Node::Block {
            style: "normal".to_string(),
            content: vec![Node::Text("text".to_string())],
        };
        let heading = Node::Block {
            style: "h2".to_string(),
            content: vec![Node::Text("text".to_string())],
        };
        assert_eq!(render_node(&normal), "<p>text</p>");
        assert_eq!(render_node(&heading), "<h2>text</h2>");
    }

    #[test]
    fn list_style_selects_ordered_or_unordered() {
        let numbered = Node::List {
            item_style: "number".to_string(),
            items: vec![Node::Block {
                style: "normal".to_string(),
                content: vec![Node::Text("one".to_string())],
            }],
        };
        let bulleted = Node::List {
            item_style: "bullet".to_string(),
            items: vec![Node::Block {
                style: "normal".to_string(),
                content: vec![Node::Text("one".to_string())],
            }],
        };
        assert_eq!(render_node(&numbered), "<ol><li><p>one</p></li></ol>");
        assert_eq!(render_node(&bulleted), "<ul><li><p>one</p></li></ul>");
    }

    #[test]
    fn unknown_marks_render_children_unwrapped() {
        let node = Node::Span {
            mark: Some(Mark::Name("sparkles".to_string())),
            attributes: Map::new(),
            content: vec![Node::Text("plain".to_string())],
        };
        assert_eq!(render_node(&node), "plain");
    }

    #[test]
    fn overriding_a_mark_replaces_only_that_entry() {
        let overrides = SerializerOverrides::new()
            .with_mark("strong", MarkSerializer::tag("b"))
            .without_mark("em");
        let set = SerializerSet::merged(overrides);

        assert!(matches!(
            set.for_mark(&Mark::Name("strong".to_string())),
            Some(MarkSerializer::Tag(tag)) if tag == "b"
        ));
        assert!(set.for_mark(&Mark::Name("em".to_string())).is_none());
        // Untouched defaults survive the merge
        assert!(set.for_mark(&Mark::Name("code".to_string())).is_some());
        assert!(set.for_type("block").is_ok());
    }

    #[test]
    fn unregistered_type_is_a_config_error() {
        let set = SerializerSet::defaults();
        let err = set.for_type("author").err().expect("lookup must fail");
        assert_eq!(
            err,
            Error::Config("No serializer registered for node type \"author\"".to_string())
        );
    }
}
