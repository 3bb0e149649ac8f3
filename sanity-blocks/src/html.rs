//! HTML rendering of content trees
//!
//! Walks a content tree bottom-up: children render first, then the
//! node's type serializer combines them. String leaves are escaped and
//! returned bare. The serializer registry is fixed at construction, so
//! one builder can render any number of documents.

use serde_json::Value;

use crate::error::Error;
use crate::escape::escape;
use crate::node::{Node, Tree};
use crate::serializers::{Rendered, SerializerOverrides, SerializerSet};

/// Options accepted by [`HtmlBuilder::new`]
#[derive(Default)]
pub struct HtmlOptions {
    /// Serializer overrides, deep-merged over the defaults
    pub serializers: SerializerOverrides,

    /// Charset for text escaping (defaults to `utf-8`)
    pub charset: Option<String>,

    /// Query parameters appended to CDN image URLs, in order
    pub image_options: Vec<(String, String)>,

    /// Project identifier, required to construct CDN image URLs
    pub project_id: Option<String>,

    /// Dataset name, required to construct CDN image URLs
    pub dataset: Option<String>,
}

/// Renders content trees to HTML through the serializer registry
pub struct HtmlBuilder {
    serializers: SerializerSet,
    charset: String,
    project_id: Option<String>,
    dataset: Option<String>,
    image_options: Vec<(String, String)>,
}

impl HtmlBuilder {
    /// Build a renderer from the given options
    pub fn new(options: HtmlOptions) -> Self {
        Self {
            serializers: SerializerSet::merged(options.serializers),
            charset: options.charset.unwrap_or_else(|| "utf-8".to_string()),
            project_id: options.project_id,
            dataset: options.dataset,
            image_options: options.image_options,
        }
    }

    /// Render a whole content tree
    pub fn build(&self, tree: &Tree) -> Result<String, Error> {
        self.build_nodes(tree.nodes(), None)
    }

    /// Render sibling nodes in order and concatenate the results
    pub fn build_nodes(&self, nodes: &[Node], parent: Option<&Node>) -> Result<String, Error> {
        let mut html = String::new();
        for node in nodes {
            html.push_str(&self.build_node(node, parent)?);
        }
        Ok(html)
    }

    /// Render one node
    ///
    /// Strings are escaped and returned as-is. For list nodes each item
    /// is wrapped in a synthetic `listItem` node before rendering.
    pub fn build_node(&self, node: &Node, parent: Option<&Node>) -> Result<String, Error> {
        if let Node::Text(text) = node {
            return Ok(self.escape(text));
        }

        let children = match node {
            Node::List { items, .. } => items
                .iter()
                .map(|item| {
                    let wrapped = Node::ListItem {
                        content: vec![item.clone()],
                    };
                    self.build_node(&wrapped, Some(node))
                })
                .collect::<Result<Vec<_>, _>>()?,
            Node::Block { content, .. }
            | Node::ListItem { content }
            | Node::Span { content, .. } => content
                .iter()
                .map(|child| self.build_node(child, Some(node)))
                .collect::<Result<Vec<_>, _>>()?,
            Node::Custom { .. } | Node::Text(_) => Vec::new(),
        };

        let serializer = self.serializers.for_type(node.type_name())?;
        serializer(&Rendered { node, children }, parent, self)
    }

    /// Escape text with the configured charset
    pub fn escape(&self, text: &str) -> String {
        escape(text, &self.charset)
    }

    /// The serializer registry backing this builder
    pub fn serializers(&self) -> &SerializerSet {
        &self.serializers
    }

    /// Configured project identifier, if any
    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    /// Configured dataset name, if any
    pub fn dataset(&self) -> Option<&str> {
        self.dataset.as_deref()
    }

    /// Configured CDN image query parameters
    pub fn image_options(&self) -> &[(String, String)] {
        &self.image_options
    }
}

/// Attribute lookup on span and custom nodes, for custom serializers
pub fn attribute<'a>(node: &'a Node, name: &str) -> Option<&'a Value> {
    node.attributes().and_then(|attributes| attributes.get(name))
}
