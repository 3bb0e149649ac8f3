//! CDN image URL construction
//!
//! Image nodes reference assets either by direct URL or by a structured
//! reference string (`type-id-dimensions-extension`). References are
//! resolved against the configured project and dataset into a CDN URL,
//! with image transform options appended as a query string.

use itertools::Itertools;
use serde_json::Value;

use crate::error::Error;
use crate::html::HtmlBuilder;
use crate::node::Node;

const CDN_BASE: &str = "https://cdn.sanity.io";

/// Resolve an image node's asset to a URL
///
/// # Parameters
/// * `node` - An image node (opaque node carrying an `asset` attribute)
/// * `builder` - The owning builder, for project/dataset/image options
///
/// # Returns
/// * `Ok(String)` - The asset's own URL, or a constructed CDN URL, with
///   the builder's image options appended as a query string
/// * `Err(Error)` - `Config` when the asset, its reference, or the
///   project/dataset configuration is missing or malformed
pub fn image_url(node: &Node, builder: &HtmlBuilder) -> Result<String, Error> {
    let asset = node
        .attributes()
        .and_then(|attributes| attributes.get("asset"))
        .ok_or_else(|| Error::Config("Image does not have required `asset` property".to_string()))?;

    let query = query_string(builder.image_options());

    if let Some(url) = asset.get("url").and_then(Value::as_str) {
        return Ok(format!("{url}{query}"));
    }

    let reference = asset.get("_ref").and_then(Value::as_str).ok_or_else(|| {
        Error::Config("Invalid image reference in block, no `_ref` found on `asset`".to_string())
    })?;

    let (Some(project_id), Some(dataset)) = (builder.project_id(), builder.dataset()) else {
        return Err(Error::Config(
            "`projectId` and/or `dataset` missing from block content config".to_string(),
        ));
    };

    let parts: Vec<&str> = reference.split('-').collect();
    let [asset_type, asset_id, dimensions, extension] = parts[..] else {
        return Err(Error::Config(format!(
            "malformed asset reference {reference:?}, expected `type-id-dimensions-extension`"
        )));
    };

    // Asset type is pluralized in the CDN path: image -> images
    Ok(format!(
        "{CDN_BASE}/{asset_type}s/{project_id}/{dataset}/{asset_id}-{dimensions}.{extension}{query}"
    ))
}

/// Render image options as a query string, preserving insertion order
fn query_string(options: &[(String, String)]) -> String {
    if options.is_empty() {
        return String::new();
    }
    let pairs = options
        .iter()
        .map(|(name, value)| format!("{}={}", urlencoding::encode(name), urlencoding::encode(value)))
        .join("&");
    format!("?{pairs}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::{HtmlBuilder, HtmlOptions};
    use serde_json::json;

    fn image_node(asset: Value) -> Node {
        let attributes = json!({ "asset": asset });
        Node::Custom {
            type_name: "image".to_string(),
            attributes: attributes.as_object().cloned().unwrap_or_default(),
        }
    }

    fn cdn_builder() -> HtmlBuilder {
        HtmlBuilder::new(HtmlOptions {
            project_id: Some("abc123".to_string()),
            dataset: Some("prod".to_string()),
            image_options: vec![
                ("fit".to_string(), "crop".to_string()),
                ("w".to_string(), "320".to_string()),
                ("h".to_string(), "240".to_string()),
            ],
            ..Default::default()
        })
    }

    #[test]
    fn constructs_cdn_url_from_reference() {
        let node = image_node(json!({"_ref": "image-YiOKD0O6AdjKPaK24WtbOEv0-3456x2304-jpg"}));
        assert_eq!(
            image_url(&node, &cdn_builder()).unwrap(),
            "https://cdn.sanity.io/images/abc123/prod/YiOKD0O6AdjKPaK24WtbOEv0-3456x2304.jpg?fit=crop&w=320&h=240"
        );
    }

    #[test]
    fn direct_asset_url_wins_over_reference() {
        let node = image_node(json!({"url": "https://example.com/cat.png"}));
        assert_eq!(
            image_url(&node, &cdn_builder()).unwrap(),
            "https://example.com/cat.png?fit=crop&w=320&h=240"
        );
    }

    #[test]
    fn no_image_options_means_no_query_string() {
        let node = image_node(json!({"url": "https://example.com/cat.png"}));
        let builder = HtmlBuilder::new(HtmlOptions::default());
        assert_eq!(
            image_url(&node, &builder).unwrap(),
            "https://example.com/cat.png"
        );
    }

    #[test]
    fn missing_asset_is_a_config_error() {
        let node = Node::Custom {
            type_name: "image".to_string(),
            attributes: serde_json::Map::new(),
        };
        let err = image_url(&node, &cdn_builder()).err().expect("must fail");
        assert_eq!(
            err,
            Error::Config("Image does not have required `asset` property".to_string())
        );
    }

    #[test]
    fn missing_project_config_is_a_config_error() {
        let node = image_node(json!({"_ref": "image-YiOKD0O6AdjKPaK24WtbOEv0-3456x2304-jpg"}));
        let builder = HtmlBuilder::new(HtmlOptions::default());
        let err = image_url(&node, &builder).err().expect("must fail");
        assert_eq!(
            err,
            Error::Config("`projectId` and/or `dataset` missing from block content config".to_string())
        );
    }

    #[test]
    fn malformed_reference_is_a_config_error() {
        let node = image_node(json!({"_ref": "image-only-twoparts"}));
        let err = image_url(&node, &cdn_builder()).err().expect("must fail");
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn query_values_are_url_encoded() {
        let options = vec![("label".to_string(), "a b&c".to_string())];
        assert_eq!(query_string(&options), "?label=a%20b%26c");
    }
}
