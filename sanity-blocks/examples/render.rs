//! Render a sample document to HTML on stdout
//!
//! Run with `cargo run --example render`. Pass a JSON file path to
//! render your own block content instead of the built-in sample.

use std::fs;

use sanity_blocks::{to_html_with, HtmlOptions};
use serde_json::{json, Value};

fn main() {
    env_logger::init();

    let content = match std::env::args().nth(1) {
        Some(path) => {
            let raw = fs::read_to_string(&path).expect("readable JSON file");
            serde_json::from_str::<Value>(&raw).expect("valid JSON")
        }
        None => sample_document(),
    };

    let options = HtmlOptions {
        project_id: Some("abc123".to_string()),
        dataset: Some("prod".to_string()),
        ..Default::default()
    };

    match to_html_with(&content, options) {
        Ok(html) => println!("{html}"),
        Err(error) => {
            eprintln!("Error: {error}");
            std::process::exit(1);
        }
    }
}

fn sample_document() -> Value {
    json!([
        {
            "_type": "block",
            "style": "h2",
            "markDefs": [],
            "children": [{"_type": "span", "text": "Release notes", "marks": []}]
        },
        {
            "_type": "block",
            "style": "normal",
            "markDefs": [
                {"_key": "changelog", "_type": "link", "href": "https://example.com/changelog"}
            ],
            "children": [
                {"_type": "span", "text": "See the ", "marks": []},
                {"_type": "span", "text": "full changelog", "marks": ["changelog", "em"]},
                {"_type": "span", "text": " for details.", "marks": []}
            ]
        },
        {
            "_type": "block",
            "style": "normal",
            "listItem": "bullet",
            "markDefs": [],
            "children": [{"_type": "span", "text": "Faster rendering", "marks": []}]
        },
        {
            "_type": "block",
            "style": "normal",
            "listItem": "bullet",
            "markDefs": [],
            "children": [{"_type": "span", "text": "Fewer bugs", "marks": ["strong"]}]
        }
    ])
}
