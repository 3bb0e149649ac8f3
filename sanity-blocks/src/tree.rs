//! Flat block documents to nested content trees
//!
//! The interesting work lives in [`TreeBuilder::parse_spans`]: a block's
//! spans arrive as a flat list with overlapping mark ranges, and the
//! builder reconstructs proper nesting with a stack of open nodes. Marks
//! are matched against the open stack by longest common prefix, so two
//! adjacent spans sharing marks reuse the same node for the shared
//! prefix, and the result does not depend on the order marks were listed
//! on each span.

use serde_json::{Map, Value};

use crate::error::Error;
use crate::migrate::{migrate, MigrateOptions};
use crate::node::{Mark, MarkDef, Node, Tree};

/// Builds content trees from raw (possibly legacy) block documents
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeBuilder {
    options: MigrateOptions,
}

impl TreeBuilder {
    /// Builder with default migration options (random mark keys)
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder with explicit migration options, e.g. deterministic keys
    pub fn with_options(options: MigrateOptions) -> Self {
        Self { options }
    }

    /// Build a content tree from a single block or an array of blocks
    ///
    /// Input is migrated first; migration is a no-op on current-format
    /// content. Consecutive list-item blocks in array input are coalesced
    /// into list nodes.
    pub fn build(&self, content: &Value) -> Result<Tree, Error> {
        let migrated = migrate(content, &self.options)?;
        match &migrated {
            Value::Array(blocks) => Ok(Tree::Many(self.parse_array(blocks)?)),
            block => Ok(Tree::One(self.parse_block(block)?)),
        }
    }

    /// Convert an array of blocks, coalescing list-item runs
    fn parse_array(&self, blocks: &[Value]) -> Result<Vec<Node>, Error> {
        let mut parsed = Vec::new();
        let mut list_run: Vec<&Value> = Vec::new();

        for (index, block) in blocks.iter().enumerate() {
            if !is_list_block(block) {
                parsed.push(self.parse_block(block)?);
                continue;
            }

            // Each list item arrives as its own block; buffer the run
            // until the list style changes or the list ends.
            list_run.push(block);
            let run_ends = match blocks.get(index + 1) {
                Some(next) => !is_list_block(next) || list_item(next) != list_item(block),
                None => true,
            };
            if run_ends {
                parsed.push(self.parse_list(&list_run)?);
                list_run.clear();
            }
        }

        Ok(parsed)
    }

    /// Convert one block by type: `block` gets the span treatment, any
    /// other type passes through as an opaque node
    fn parse_block(&self, block: &Value) -> Result<Node, Error> {
        let obj = block
            .as_object()
            .ok_or_else(|| Error::InvalidArgument("block must be a JSON object".to_string()))?;
        let type_name = obj
            .get("_type")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::InvalidArgument("block is missing a `_type` field".to_string()))?;

        match type_name {
            "block" => self.block_node(obj),
            _ => Ok(Node::Custom {
                type_name: type_name.to_string(),
                attributes: obj
                    .iter()
                    .filter(|(name, _)| name.as_str() != "_type")
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect(),
            }),
        }
    }

    fn block_node(&self, block: &Map<String, Value>) -> Result<Node, Error> {
        let style = block
            .get("style")
            .and_then(Value::as_str)
            .unwrap_or("normal")
            .to_string();
        let content = match block.get("children") {
            Some(Value::Array(children)) => self.parse_spans(children, block)?,
            Some(_) => {
                return Err(Error::InvalidArgument(
                    "`children` must be an array".to_string(),
                ))
            }
            None => Vec::new(),
        };
        Ok(Node::Block { style, content })
    }

    /// Wrap a run of same-style list-item blocks in a list node
    fn parse_list(&self, blocks: &[&Value]) -> Result<Node, Error> {
        let item_style = blocks
            .first()
            .and_then(|block| list_item(block))
            .unwrap_or("")
            .to_string();
        let items = blocks
            .iter()
            .map(|block| self.parse_block(block))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Node::List { item_style, items })
    }

    /// Resolve overlapping span mark ranges into nested span nodes
    ///
    /// The stack holds the currently open nodes, rooted at a synthetic
    /// node that is never removed. For each span the sorted mark set is
    /// compared against the open marks from the bottom up; the matched
    /// prefix stays open, everything past the first mismatch is closed,
    /// and the remaining marks open fresh nodes in sorted order. Sorting
    /// makes the outcome independent of each span's mark ordering, and
    /// prefix reuse means adjacent spans sharing marks share nodes.
    fn parse_spans(
        &self,
        spans: &[Value],
        parent: &Map<String, Value>,
    ) -> Result<Vec<Node>, Error> {
        let mut stack = vec![OpenSpan::root()];

        for span in spans {
            let obj = span
                .as_object()
                .ok_or_else(|| Error::InvalidArgument("span must be a JSON object".to_string()))?;
            let text = obj.get("text").and_then(Value::as_str).ok_or_else(|| {
                Error::InvalidArgument("span is missing a `text` field".to_string())
            })?;

            let mut needed = span_marks(obj)?;
            needed.sort();

            // Index 1 upward: the root stays open no matter what.
            let mut keep = 1;
            while keep < stack.len() {
                let open_mark = stack[keep].mark_key.as_deref();
                match needed.iter().position(|mark| Some(mark.as_str()) == open_mark) {
                    Some(found) => {
                        needed.remove(found);
                        keep += 1;
                    }
                    None => break,
                }
            }
            while stack.len() > keep {
                close_top(&mut stack);
            }

            for mark_key in needed {
                let mark = find_mark(&mark_key, parent);
                stack.push(OpenSpan {
                    mark_key: Some(mark_key),
                    mark: Some(mark),
                    content: Vec::new(),
                });
            }

            let attributes = span_attributes(obj);
            let leaf = if attributes.is_empty() {
                Node::Text(text.to_string())
            } else {
                Node::Span {
                    mark: None,
                    attributes,
                    content: vec![Node::Text(text.to_string())],
                }
            };
            if let Some(top) = stack.last_mut() {
                top.content.push(leaf);
            }
        }

        while stack.len() > 1 {
            close_top(&mut stack);
        }
        Ok(stack.pop().map(|root| root.content).unwrap_or_default())
    }
}

/// A node still accepting content during span reconstruction
#[derive(Debug)]
struct OpenSpan {
    mark_key: Option<String>,
    mark: Option<Mark>,
    content: Vec<Node>,
}

impl OpenSpan {
    fn root() -> Self {
        Self {
            mark_key: None,
            mark: None,
            content: Vec::new(),
        }
    }
}

/// Pop the top open node and attach it to its parent's content
fn close_top(stack: &mut Vec<OpenSpan>) {
    if stack.len() < 2 {
        return;
    }
    let Some(closed) = stack.pop() else {
        return;
    };
    let node = Node::Span {
        mark: closed.mark,
        attributes: Map::new(),
        content: closed.content,
    };
    if let Some(parent) = stack.last_mut() {
        parent.content.push(node);
    }
}

/// The span's mark keys, validated as strings
fn span_marks(span: &Map<String, Value>) -> Result<Vec<String>, Error> {
    match span.get("marks") {
        Some(Value::Array(marks)) => marks
            .iter()
            .map(|mark| {
                mark.as_str().map(str::to_string).ok_or_else(|| {
                    Error::InvalidArgument("span marks must be strings".to_string())
                })
            })
            .collect(),
        Some(_) => Err(Error::InvalidArgument(
            "span `marks` must be an array".to_string(),
        )),
        None => Ok(Vec::new()),
    }
}

/// Extra keys retained on the span itself (everything except the
/// structural `_type`/`text`/`marks`)
fn span_attributes(span: &Map<String, Value>) -> Map<String, Value> {
    span.iter()
        .filter(|(name, _)| !matches!(name.as_str(), "_type" | "text" | "marks"))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

/// Resolve a mark key against the block's `markDefs`
///
/// Keys with no matching definition pass through as bare names; callers
/// may still have a serializer registered for them.
fn find_mark(key: &str, parent: &Map<String, Value>) -> Mark {
    if let Some(defs) = parent.get("markDefs").and_then(Value::as_array) {
        for def in defs {
            if def.get("_key").and_then(Value::as_str) == Some(key) {
                if let Ok(parsed) = serde_json::from_value::<MarkDef>(def.clone()) {
                    return Mark::Def(parsed);
                }
            }
        }
    }
    log::debug!("mark key {key:?} has no markDefs entry, passing through");
    Mark::Name(key.to_string())
}

/// A block belongs to a list iff it is a `block` with a `listItem` field
fn is_list_block(block: &Value) -> bool {
    block.get("_type").and_then(Value::as_str) == Some("block")
        && block.get("listItem").is_some()
}

fn list_item(block: &Value) -> Option<&str> {
    block.get("listItem").and_then(Value::as_str)
}
