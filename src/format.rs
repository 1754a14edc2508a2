//! Post-processing of generated stylesheets into inline CSS.

use crate::cache::JsonObject;
use crate::json::stylesheet_to_json;
use crate::options::ResolvedOptions;
use crate::stylesheet::{Block, Declaration, Node, Stylesheet, parse_stylesheet};

#[derive(Debug, Clone)]
pub struct FormattedCss {
    sheet: Stylesheet,
    minify: bool,
}

pub fn format_css(css: &str) -> FormattedCss {
    FormattedCss {
        sheet: parse_stylesheet(css),
        minify: false,
    }
}

/// Runs the pipeline selected by `options` over raw generator output.
pub fn process(css: &str, options: &ResolvedOptions) -> FormattedCss {
    let mut formatted = format_css(css);

    if options.ignore_media_queries {
        formatted.remove_media_queries();
    } else {
        formatted.remove_undefined();
        formatted.combine_media_queries();
    }

    formatted.fix_rgb();

    if options.merge {
        formatted.merge();
    }
    if options.minify {
        formatted.minify();
    }

    formatted
}

impl FormattedCss {
    pub fn remove_media_queries(&mut self) -> &mut Self {
        strip_media(&mut self.sheet.nodes);
        self
    }

    /// Drops rules mentioning `undefined` and rules left without declarations.
    pub fn remove_undefined(&mut self) -> &mut Self {
        strip_undefined(&mut self.sheet.nodes);
        self
    }

    /// Folds top-level `@media` blocks with the same query into the first one.
    pub fn combine_media_queries(&mut self) -> &mut Self {
        let mut combined: Vec<Node> = Vec::with_capacity(self.sheet.nodes.len());
        for node in std::mem::take(&mut self.sheet.nodes) {
            match node {
                Node::Block(block) if block.is_media() => {
                    let existing = combined.iter_mut().find_map(|n| match n {
                        Node::Block(b) if b.is_media() && b.prelude == block.prelude => Some(b),
                        _ => None,
                    });
                    match existing {
                        Some(target) => target.children.extend(block.children),
                        None => combined.push(Node::Block(block)),
                    }
                }
                other => combined.push(other),
            }
        }
        self.sheet.nodes = combined;
        self
    }

    /// Resolves `var(--tw-*-opacity)` against the custom property declared in
    /// the same rule (falling back to `1`) and drops those custom properties.
    pub fn fix_rgb(&mut self) -> &mut Self {
        fix_rgb_in(&mut self.sheet.nodes);
        self
    }

    /// Collapses style rules into one declaration list per scope: the top
    /// level and each `@media` block. Later duplicates of a property win.
    pub fn merge(&mut self) -> &mut Self {
        self.sheet.nodes = merge_scope(std::mem::take(&mut self.sheet.nodes));
        self
    }

    pub fn minify(&mut self) -> &mut Self {
        self.minify = true;
        self
    }

    pub fn get(&self) -> String {
        self.sheet.render(self.minify)
    }

    pub fn to_json(&self) -> JsonObject {
        stylesheet_to_json(&self.sheet, self.minify)
    }
}

fn strip_media(nodes: &mut Vec<Node>) {
    nodes.retain(|node| !matches!(node, Node::Block(block) if block.is_media()));
    for node in nodes.iter_mut() {
        if let Node::Block(block) = node {
            strip_media(&mut block.children);
        }
    }
}

fn strip_undefined(nodes: &mut Vec<Node>) {
    for node in nodes.iter_mut() {
        if let Node::Block(block) = node {
            strip_undefined(&mut block.children);
        }
    }
    nodes.retain(|node| match node {
        Node::Declaration(decl) => !decl.value.contains("undefined"),
        Node::Block(block) if block.is_at_rule() => !block.children.is_empty(),
        Node::Block(block) => {
            !block.prelude.contains("undefined")
                && block.children.iter().any(|n| matches!(n, Node::Declaration(_)))
        }
        Node::Opaque(_) => true,
    });
}

fn fix_rgb_in(nodes: &mut Vec<Node>) {
    let opacities: Vec<(String, String)> = nodes
        .iter()
        .filter_map(|node| match node {
            Node::Declaration(decl) if is_opacity_var(&decl.property) => {
                Some((decl.property.clone(), decl.value.clone()))
            }
            _ => None,
        })
        .collect();

    for node in nodes.iter_mut() {
        match node {
            Node::Declaration(decl) => decl.value = resolve_opacity_vars(&decl.value, &opacities),
            Node::Block(block) => fix_rgb_in(&mut block.children),
            Node::Opaque(_) => {}
        }
    }

    nodes.retain(|node| !matches!(node, Node::Declaration(d) if is_opacity_var(&d.property)));
}

fn is_opacity_var(property: &str) -> bool {
    property.starts_with("--tw-") && property.ends_with("-opacity")
}

fn resolve_opacity_vars(value: &str, opacities: &[(String, String)]) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find("var(--tw-") {
        let Some(len) = rest[start..].find(')') else {
            break;
        };
        let inner = &rest[start + 4..start + len];
        let (name, fallback) = match inner.split_once(',') {
            Some((name, fallback)) => (name.trim(), Some(fallback.trim())),
            None => (inner.trim(), None),
        };
        if !is_opacity_var(name) {
            out.push_str(&rest[..start + len + 1]);
            rest = &rest[start + len + 1..];
            continue;
        }
        let resolved = opacities
            .iter()
            .rev()
            .find(|(prop, _)| prop == name)
            .map(|(_, v)| v.as_str())
            .or(fallback)
            .unwrap_or("1");
        out.push_str(&rest[..start]);
        out.push_str(resolved);
        rest = &rest[start + len + 1..];
    }
    out.push_str(rest);
    out
}

fn merge_scope(nodes: Vec<Node>) -> Vec<Node> {
    let mut declarations: Vec<Declaration> = Vec::new();
    let mut blocks: Vec<Node> = Vec::new();

    for node in nodes {
        match node {
            Node::Declaration(decl) => push_merged(&mut declarations, decl),
            Node::Block(block) if !block.is_at_rule() => {
                for decl in flatten_rule(block) {
                    push_merged(&mut declarations, decl);
                }
            }
            Node::Block(block) if block.is_media() => {
                blocks.push(Node::Block(Block {
                    children: merge_scope(block.children),
                    ..block
                }));
            }
            other => blocks.push(other),
        }
    }

    declarations
        .into_iter()
        .map(Node::Declaration)
        .chain(blocks)
        .collect()
}

fn flatten_rule(block: Block) -> Vec<Declaration> {
    let mut out = Vec::new();
    for node in block.children {
        match node {
            Node::Declaration(decl) => out.push(decl),
            Node::Block(inner) if !inner.is_at_rule() => out.extend(flatten_rule(inner)),
            _ => {}
        }
    }
    out
}

fn push_merged(declarations: &mut Vec<Declaration>, decl: Declaration) {
    declarations.retain(|existing| existing.property != decl.property);
    declarations.push(decl);
}
