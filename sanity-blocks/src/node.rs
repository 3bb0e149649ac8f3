//! Content tree node types
//!
//! The tree builder turns flat block documents into a nested tree of
//! these nodes. The tree serializes to the same JSON-compatible shape the
//! document store's other clients produce, so it can be handed off as-is
//! or rendered to HTML.

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A mark definition carried in a block's `markDefs`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkDef {
    /// Generated key referenced by span `marks` entries
    #[serde(rename = "_key")]
    pub key: String,

    /// Mark type, used for serializer lookup (e.g. `link`)
    #[serde(rename = "_type")]
    pub def_type: String,

    /// Remaining attributes of the definition (e.g. `href`)
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// An inline mark attached to a span node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Mark {
    /// A mark defined in the containing block's `markDefs`
    Def(MarkDef),

    /// A bare well-known mark name (`strong`, `em`, ...) or an
    /// unresolved key passed through as-is
    Name(String),
}

impl Mark {
    /// Name used for serializer lookup: the definition type for defined
    /// marks, the name itself otherwise
    pub fn name(&self) -> &str {
        match self {
            Mark::Def(def) => &def.def_type,
            Mark::Name(name) => name,
        }
    }

    /// Attribute lookup on defined marks (`None` for bare names)
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        match self {
            Mark::Def(def) => def.attributes.get(key),
            Mark::Name(_) => None,
        }
    }
}

/// One node of the content tree
///
/// Ordering of `content` and `items` is significant and preserved
/// end-to-end.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Leaf run of plain text
    Text(String),

    /// Paragraph-equivalent unit with a style and inline content
    Block {
        /// Style name; `normal` for plain paragraphs
        style: String,
        /// Ordered child nodes
        content: Vec<Node>,
    },

    /// Run of coalesced list-item blocks sharing one list style
    List {
        /// The `listItem` value of the coalesced blocks (e.g. `bullet`)
        item_style: String,
        /// One converted block per list item
        items: Vec<Node>,
    },

    /// A single list entry, wrapping one block
    ListItem {
        /// Wrapped content (a single block when produced by rendering)
        content: Vec<Node>,
    },

    /// Inline span carrying a mark and/or extra attributes
    Span {
        /// Resolved mark, if this span was opened for one
        mark: Option<Mark>,
        /// Inline attributes retained on the span itself
        attributes: Map<String, Value>,
        /// Ordered child nodes
        content: Vec<Node>,
    },

    /// Any other block type, passed through with its attributes
    Custom {
        /// The block's `_type`
        type_name: String,
        /// All fields of the block except `_type`
        attributes: Map<String, Value>,
    },
}

impl Node {
    /// Serializer registry key for this node
    pub fn type_name(&self) -> &str {
        match self {
            Node::Text(_) => "text",
            Node::Block { .. } => "block",
            Node::List { .. } => "list",
            Node::ListItem { .. } => "listItem",
            Node::Span { .. } => "span",
            Node::Custom { type_name, .. } => type_name,
        }
    }

    /// Attributes of span and custom nodes; `None` for the structural
    /// node kinds
    pub fn attributes(&self) -> Option<&Map<String, Value>> {
        match self {
            Node::Span { attributes, .. } | Node::Custom { attributes, .. } => Some(attributes),
            _ => None,
        }
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Node::Text(text) => serializer.serialize_str(text),
            Node::Block { style, content } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("type", "block")?;
                map.serialize_entry("style", style)?;
                map.serialize_entry("content", content)?;
                map.end()
            }
            Node::List { item_style, items } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("type", "list")?;
                map.serialize_entry("itemStyle", item_style)?;
                map.serialize_entry("items", items)?;
                map.end()
            }
            Node::ListItem { content } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "listItem")?;
                map.serialize_entry("content", content)?;
                map.end()
            }
            Node::Span {
                mark,
                attributes,
                content,
            } => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("type", "span")?;
                if let Some(mark) = mark {
                    map.serialize_entry("mark", mark)?;
                }
                if !attributes.is_empty() {
                    map.serialize_entry("attributes", attributes)?;
                }
                if !content.is_empty() {
                    map.serialize_entry("content", content)?;
                }
                map.end()
            }
            Node::Custom {
                type_name,
                attributes,
            } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", type_name)?;
                map.serialize_entry("attributes", attributes)?;
                map.end()
            }
        }
    }
}

/// Result of building a content tree
///
/// A single block input produces one node; an array input produces a
/// node list (with list blocks coalesced).
#[derive(Debug, Clone, PartialEq)]
pub enum Tree {
    /// Tree built from a single block object
    One(Node),

    /// Trees built from an array of blocks
    Many(Vec<Node>),
}

impl Tree {
    /// The tree's top-level nodes, in order
    pub fn nodes(&self) -> &[Node] {
        match self {
            Tree::One(node) => std::slice::from_ref(node),
            Tree::Many(nodes) => nodes,
        }
    }
}

impl Serialize for Tree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Tree::One(node) => node.serialize(serializer),
            Tree::Many(nodes) => nodes.serialize(serializer),
        }
    }
}
