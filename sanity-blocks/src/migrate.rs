//! Legacy block document migration
//!
//! Version 1 blocks carry a flat `spans` array whose spans embed inline
//! mark objects as extra keys. The current format keys those marks:
//! every inline mark becomes a `markDefs` entry with a generated `_key`,
//! spans reference keys through their `marks` array, and `spans` is
//! renamed to `children`. Migration is idempotent: blocks without a
//! `spans` key pass through untouched.

use serde_json::{Map, Value};

use crate::error::Error;
use crate::key::KeyGenerator;

/// Block content version produced by [`migrate`]
pub const CURRENT_VERSION: u32 = 2;

/// Options controlling a migration run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrateOptions {
    /// Target version; only [`CURRENT_VERSION`] is implemented
    pub version: u32,

    /// Key generation strategy for inline marks lifted into `markDefs`
    pub keys: KeyGenerator,
}

impl Default for MigrateOptions {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            keys: KeyGenerator::Random,
        }
    }
}

impl MigrateOptions {
    /// Options with reproducible mark keys, for golden-output comparisons
    pub fn deterministic() -> Self {
        Self {
            version: CURRENT_VERSION,
            keys: KeyGenerator::Deterministic,
        }
    }
}

/// Migrate a single block or an array of blocks to the current format
///
/// Dispatches on shape: an object with a `_type` field is treated as one
/// block, an array as a sequence of blocks. Anything else is rejected.
pub fn migrate(content: &Value, options: &MigrateOptions) -> Result<Value, Error> {
    match content {
        Value::Object(obj) if obj.contains_key("_type") => migrate_block(content, options),
        Value::Array(blocks) => {
            let migrated = blocks
                .iter()
                .map(|block| migrate_block(block, options))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Array(migrated))
        }
        _ => Err(Error::InvalidArgument(
            "cannot migrate content: expected a block object with a `_type` or an array of blocks"
                .to_string(),
        )),
    }
}

/// Migrate one block document to the current format
///
/// # Parameters
/// * `block` - The raw block document
/// * `options` - Target version and key generation strategy
///
/// # Returns
/// * `Ok(Value)` - The migrated block, or the input unchanged if it has
///   no `spans` key
/// * `Err(Error)` - `UnsupportedVersion` for targets other than 2,
///   `InvalidArgument` for malformed input
pub fn migrate_block(block: &Value, options: &MigrateOptions) -> Result<Value, Error> {
    if options.version != CURRENT_VERSION {
        return Err(Error::UnsupportedVersion(options.version));
    }

    let obj = block
        .as_object()
        .ok_or_else(|| Error::InvalidArgument("block must be a JSON object".to_string()))?;

    let Some(spans) = obj.get("spans") else {
        return Ok(block.clone());
    };
    let spans = spans
        .as_array()
        .ok_or_else(|| Error::InvalidArgument("`spans` must be an array".to_string()))?;

    let mut mark_defs: Vec<Value> = Vec::new();
    let mut children: Vec<Value> = Vec::with_capacity(spans.len());

    for span in spans {
        children.push(migrate_span(span, options, &mut mark_defs)?);
    }

    let mut migrated = Map::new();
    for (name, value) in obj {
        if name != "spans" {
            migrated.insert(name.clone(), value.clone());
        }
    }
    migrated.insert("markDefs".to_string(), Value::Array(mark_defs));
    migrated.insert("children".to_string(), Value::Array(children));
    Ok(Value::Object(migrated))
}

/// Convert one span's unknown keys into markDef entries
fn migrate_span(
    span: &Value,
    options: &MigrateOptions,
    mark_defs: &mut Vec<Value>,
) -> Result<Value, Error> {
    let span_obj = span
        .as_object()
        .ok_or_else(|| Error::InvalidArgument("span must be a JSON object".to_string()))?;

    let mut marks: Vec<Value> = match span_obj.get("marks") {
        Some(Value::Array(marks)) => marks.clone(),
        Some(_) => {
            return Err(Error::InvalidArgument(
                "span `marks` must be an array".to_string(),
            ))
        }
        None => Vec::new(),
    };

    let mut migrated = Map::new();
    for (name, value) in span_obj {
        match name.as_str() {
            "_type" | "text" => {
                migrated.insert(name.clone(), value.clone());
            }
            "marks" => {}
            _ => {
                let key = options.keys.generate(name, value);
                let key_value = Value::String(key.clone());
                if !marks.contains(&key_value) {
                    marks.push(key_value);
                }
                if !has_mark_def(mark_defs, &key) {
                    mark_defs.push(mark_def(&key, name, value));
                }
            }
        }
    }

    migrated.insert("marks".to_string(), Value::Array(marks));
    Ok(Value::Object(migrated))
}

fn has_mark_def(mark_defs: &[Value], key: &str) -> bool {
    mark_defs
        .iter()
        .any(|def| def.get("_key").and_then(Value::as_str) == Some(key))
}

/// Build a markDef entry: `{_key, _type, ..value}`
fn mark_def(key: &str, mark_type: &str, value: &Value) -> Value {
    let mut def = Map::new();
    def.insert("_key".to_string(), Value::String(key.to_string()));
    def.insert("_type".to_string(), Value::String(mark_type.to_string()));
    if let Value::Object(attributes) = value {
        for (name, attribute) in attributes {
            def.insert(name.clone(), attribute.clone());
        }
    }
    Value::Object(def)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key_for(mark_type: &str, value: &Value) -> String {
        KeyGenerator::Deterministic.generate(mark_type, value)
    }

    #[test]
    fn migrates_string_marks_without_mark_defs() {
        let input = json!({
            "_type": "block",
            "style": "normal",
            "spans": [
                {"_type": "span", "text": "Normal", "marks": []},
                {"_type": "span", "text": "only-bold", "marks": ["strong"]},
                {"_type": "span", "text": "bold-and-underline", "marks": ["strong", "underline"]},
                {"_type": "span", "text": "only-underline", "marks": ["underline"]},
                {"_type": "span", "text": "normal", "marks": []}
            ]
        });
        let expected = json!({
            "_type": "block",
            "style": "normal",
            "markDefs": [],
            "children": [
                {"_type": "span", "text": "Normal", "marks": []},
                {"_type": "span", "text": "only-bold", "marks": ["strong"]},
                {"_type": "span", "text": "bold-and-underline", "marks": ["strong", "underline"]},
                {"_type": "span", "text": "only-underline", "marks": ["underline"]},
                {"_type": "span", "text": "normal", "marks": []}
            ]
        });

        let actual = migrate_block(&input, &MigrateOptions::deterministic()).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn migrates_inline_link_to_mark_def() {
        let link = json!({"href": "http://icanhas.cheezburger.com/"});
        let key = key_for("link", &link);
        let input = json!({
            "_type": "block",
            "style": "normal",
            "spans": [
                {"_type": "span", "text": "String before link ", "marks": []},
                {"_type": "span", "text": "actual link text", "marks": [], "link": link},
                {"_type": "span", "text": " the rest", "marks": []}
            ]
        });

        let expected = json!({
            "_type": "block",
            "style": "normal",
            "markDefs": [
                {"_key": key, "_type": "link", "href": "http://icanhas.cheezburger.com/"}
            ],
            "children": [
                {"_type": "span", "text": "String before link ", "marks": []},
                {"_type": "span", "text": "actual link text", "marks": [key]},
                {"_type": "span", "text": " the rest", "marks": []}
            ]
        });

        let actual = migrate_block(&input, &MigrateOptions::deterministic()).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn migrates_multiple_inline_marks_on_one_span() {
        let link = json!({"href": "http://icanhas.cheezburger.com/"});
        let author = json!({"name": "Test Testesen"});
        let link_key = key_for("link", &link);
        let author_key = key_for("author", &author);
        let input = json!({
            "_type": "block",
            "style": "normal",
            "spans": [
                {"_type": "span", "text": "String before link ", "marks": []},
                {"_type": "span", "text": "actual link text", "marks": [], "link": link, "author": author},
                {"_type": "span", "text": " the rest", "marks": []}
            ]
        });

        let expected = json!({
            "_type": "block",
            "style": "normal",
            "markDefs": [
                {"_key": link_key, "_type": "link", "href": "http://icanhas.cheezburger.com/"},
                {"_key": author_key, "_type": "author", "name": "Test Testesen"}
            ],
            "children": [
                {"_type": "span", "text": "String before link ", "marks": []},
                {"_type": "span", "text": "actual link text", "marks": [link_key, author_key]},
                {"_type": "span", "text": " the rest", "marks": []}
            ]
        });

        let actual = migrate(&input, &MigrateOptions::deterministic()).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn repeated_inline_marks_share_one_mark_def() {
        let link = json!({"href": "http://example.com/"});
        let input = json!({
            "_type": "block",
            "style": "normal",
            "spans": [
                {"_type": "span", "text": "one", "marks": [], "link": link.clone()},
                {"_type": "span", "text": "two", "marks": [], "link": link}
            ]
        });

        let migrated = migrate_block(&input, &MigrateOptions::deterministic()).unwrap();
        let defs = migrated.get("markDefs").and_then(Value::as_array).unwrap();
        assert_eq!(defs.len(), 1);
    }

    #[test]
    fn migration_is_idempotent() {
        let input = json!({
            "_type": "block",
            "style": "normal",
            "spans": [
                {"_type": "span", "text": "linked", "marks": [], "link": {"href": "http://example.com/"}}
            ]
        });

        let once = migrate_block(&input, &MigrateOptions::deterministic()).unwrap();
        let twice = migrate_block(&once, &MigrateOptions::deterministic()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn migrates_arrays_block_by_block() {
        let input = json!([
            {"_type": "block", "style": "normal", "spans": [{"_type": "span", "text": "a", "marks": []}]},
            {"_type": "block", "style": "h2", "children": [{"_type": "span", "text": "b", "marks": []}], "markDefs": []}
        ]);

        let migrated = migrate(&input, &MigrateOptions::deterministic()).unwrap();
        let blocks = migrated.as_array().unwrap();
        assert!(blocks[0].get("children").is_some());
        assert!(blocks[0].get("spans").is_none());
        assert_eq!(blocks[1], input.as_array().unwrap()[1]);
    }

    #[test]
    fn rejects_unrecognized_shapes() {
        let err = migrate(&json!("just a string"), &MigrateOptions::deterministic()).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));

        let err = migrate(&json!({"style": "normal"}), &MigrateOptions::deterministic()).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn rejects_unsupported_target_version() {
        let options = MigrateOptions {
            version: 3,
            keys: KeyGenerator::Deterministic,
        };
        let err = migrate_block(&json!({"_type": "block", "spans": []}), &options).unwrap_err();
        assert_eq!(err, Error::UnsupportedVersion(3));
    }
}
