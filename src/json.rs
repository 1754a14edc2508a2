use serde_json::Value;

use crate::cache::JsonObject;
use crate::stylesheet::{Node, Stylesheet, kebab_to_camel};

/// Converts a processed stylesheet into a JSON object. Declarations become
/// camelCase keys in source order; blocks become nested objects keyed by
/// their prelude, and blocks sharing a prelude fill the same object.
pub fn stylesheet_to_json(sheet: &Stylesheet, minify: bool) -> JsonObject {
    let mut out = JsonObject::new();
    fill_object(&sheet.nodes, minify, &mut out);
    out
}

fn fill_object(nodes: &[Node], minify: bool, out: &mut JsonObject) {
    for node in nodes {
        match node {
            Node::Declaration(decl) => {
                let mut value = decl.render_value(minify);
                if decl.important {
                    value.push_str(" !important");
                }
                out.insert(kebab_to_camel(&decl.property), Value::String(value));
            }
            Node::Block(block) => {
                let prelude = if minify {
                    &block.compact_prelude
                } else {
                    &block.prelude
                };
                let entry = out
                    .entry(prelude.clone())
                    .or_insert_with(|| Value::Object(JsonObject::new()));
                if !entry.is_object() {
                    *entry = Value::Object(JsonObject::new());
                }
                if let Value::Object(nested) = entry {
                    fill_object(&block.children, minify, nested);
                }
            }
            Node::Opaque(_) => {}
        }
    }
}
