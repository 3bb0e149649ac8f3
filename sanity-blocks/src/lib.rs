//! Block content transformation for Sanity-style document stores
//!
//! Rich text arrives from the document store as flat JSON block
//! documents: paragraph-equivalent blocks holding spans of text whose
//! inline formatting is expressed as overlapping mark ranges. This crate
//! turns that format into something renderable, in three stages:
//!
//! 1. [`migrate`] upgrades legacy documents (inline mark objects on the
//!    spans themselves) to the current keyed `children` + `markDefs`
//!    format.
//! 2. [`TreeBuilder`] reconstructs a nested content [`Tree`] from the
//!    flat spans, resolving overlapping mark ranges into properly nested
//!    span nodes and coalescing runs of list-item blocks into lists.
//! 3. [`HtmlBuilder`] renders the tree to HTML through a type-keyed
//!    serializer registry with per-mark inline serializers, all of which
//!    can be overridden entry by entry.
//!
//! The transforms are pure and synchronous; nothing here performs I/O.
//!
//! ```
//! use serde_json::json;
//!
//! let block = json!({
//!     "_type": "block",
//!     "style": "normal",
//!     "markDefs": [],
//!     "children": [
//!         {"_type": "span", "text": "Hello ", "marks": []},
//!         {"_type": "span", "text": "world", "marks": ["strong"]}
//!     ]
//! });
//! let html = sanity_blocks::to_html(&block).unwrap();
//! assert_eq!(html, "<p>Hello <strong>world</strong></p>");
//! ```

#![deny(unsafe_code)]

mod error;
mod escape;
mod html;
mod image_url;
mod key;
mod migrate;
mod node;
mod serializers;
mod tree;

pub use crate::error::Error;
pub use crate::escape::escape;
pub use crate::html::{attribute, HtmlBuilder, HtmlOptions};
pub use crate::image_url::image_url;
pub use crate::key::KeyGenerator;
pub use crate::migrate::{migrate, migrate_block, MigrateOptions, CURRENT_VERSION};
pub use crate::node::{Mark, MarkDef, Node, Tree};
pub use crate::serializers::{
    default_block, default_image, default_list, default_list_item, default_span, MarkSerializer,
    Rendered, Segment, SerializerOverrides, SerializerSet, TypeSerializer,
};
pub use crate::tree::TreeBuilder;

use serde_json::Value;

/// Build a content tree from raw block content
///
/// Accepts a single block object or an array of blocks; legacy content
/// is migrated first.
pub fn to_tree(content: &Value) -> Result<Tree, Error> {
    TreeBuilder::new().build(content)
}

/// Render raw block content straight to HTML with default options
pub fn to_html(content: &Value) -> Result<String, Error> {
    to_html_with(content, HtmlOptions::default())
}

/// Render raw block content to HTML with explicit rendering options
pub fn to_html_with(content: &Value, options: HtmlOptions) -> Result<String, Error> {
    let tree = TreeBuilder::new().build(content)?;
    HtmlBuilder::new(options).build(&tree)
}
