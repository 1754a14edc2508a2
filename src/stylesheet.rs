//! Stylesheet model for the post-processing pipeline.
//!
//! Generated CSS is parsed with lightningcss (error recovery on, so broken
//! rules and declarations are dropped with a warning instead of failing the
//! whole sheet) and lowered into a small tree of blocks and declarations that
//! the inline-style transforms can rewrite. Values and preludes keep their
//! lightningcss serialization; rendering prints every declaration through
//! lightningcss again, so quoting, escaping and minification stay its job.
//! Rules the pipeline never touches (`@keyframes`, `@font-face`, ...) are
//! kept as pre-printed [`OpaqueRule`]s.

use lightningcss::declaration::DeclarationBlock;
use lightningcss::properties::{Property, PropertyId};
use lightningcss::rules::{CssRule, CssRuleList};
use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::traits::ToCss;
use std::sync::{Arc, RwLock};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
    pub important: bool,
}

/// A `prelude { children }` block. A prelude starting with `@` is an at-rule,
/// anything else is a style rule whose prelude is its selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub prelude: String,
    /// Minified form of `prelude`.
    pub compact_prelude: String,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueRule {
    pub css: String,
    pub compact: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Declaration(Declaration),
    Block(Block),
    Opaque(OpaqueRule),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stylesheet {
    pub nodes: Vec<Node>,
}

impl Declaration {
    /// The value as lightningcss prints it. Values it cannot parse for this
    /// property are kept verbatim.
    pub fn render_value(&self, minify: bool) -> String {
        let id = PropertyId::from(self.property.as_str());
        Property::parse_string(id, self.value.as_str(), ParserOptions::default())
            .ok()
            .and_then(|property| property.value_to_css_string(printer(minify)).ok())
            .unwrap_or_else(|| self.value.clone())
    }

    pub fn render(&self, minify: bool) -> String {
        let value = self.render_value(minify);
        match (minify, self.important) {
            (true, true) => format!("{}:{value}!important", self.property),
            (true, false) => format!("{}:{value}", self.property),
            (false, true) => format!("{}: {value} !important", self.property),
            (false, false) => format!("{}: {value}", self.property),
        }
    }
}

impl Block {
    pub fn is_at_rule(&self) -> bool {
        self.prelude.starts_with('@')
    }

    pub fn is_media(&self) -> bool {
        self.prelude
            .strip_prefix("@media")
            .is_some_and(|rest| rest.is_empty() || rest.starts_with([' ', '(']))
    }

    pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.children.iter().filter_map(|node| match node {
            Node::Declaration(decl) => Some(decl),
            _ => None,
        })
    }

    /// Visits every declaration below this block, including those of nested
    /// blocks.
    pub fn walk_declarations<'a>(&'a self, f: &mut impl FnMut(&'a Declaration)) {
        for node in &self.children {
            match node {
                Node::Declaration(decl) => f(decl),
                Node::Block(inner) => inner.walk_declarations(f),
                Node::Opaque(_) => {}
            }
        }
    }
}

impl Stylesheet {
    /// Visits every style rule, including rules nested in at-rules.
    pub fn walk_rules<'a>(&'a self, f: &mut impl FnMut(&'a Block)) {
        walk_rules_in(&self.nodes, f);
    }

    pub fn render(&self, minify: bool) -> String {
        if minify {
            let mut out = String::new();
            render_minified(&self.nodes, &mut out);
            out
        } else {
            let mut lines = Vec::new();
            render_pretty(&self.nodes, 0, &mut lines);
            lines.join("\n")
        }
    }
}

fn walk_rules_in<'a>(nodes: &'a [Node], f: &mut impl FnMut(&'a Block)) {
    for node in nodes {
        if let Node::Block(block) = node {
            if !block.is_at_rule() {
                f(block);
            }
            walk_rules_in(&block.children, f);
        }
    }
}

pub fn parse_stylesheet(css: &str) -> Stylesheet {
    let warnings = Arc::new(RwLock::new(Vec::new()));
    let options = ParserOptions {
        error_recovery: true,
        warnings: Some(Arc::clone(&warnings)),
        ..ParserOptions::default()
    };

    let nodes = match StyleSheet::parse(css, options) {
        Ok(sheet) => lower_rules(&sheet.rules),
        Err(err) => {
            warn!(error = %err, "failed to parse stylesheet");
            Vec::new()
        }
    };

    if let Ok(warnings) = warnings.read() {
        for warning in warnings.iter() {
            warn!(%warning, "skipped malformed css");
        }
    }

    Stylesheet { nodes }
}

fn lower_rules(rules: &CssRuleList<'_>) -> Vec<Node> {
    rules.0.iter().filter_map(lower_rule).collect()
}

fn lower_rule(rule: &CssRule<'_>) -> Option<Node> {
    let node = match rule {
        CssRule::Style(style) => {
            let mut children = lower_declarations(&style.declarations);
            children.extend(lower_rules(&style.rules));
            Node::Block(Block {
                prelude: print_css(&style.selectors, false)?,
                compact_prelude: print_css(&style.selectors, true)?,
                children,
            })
        }
        CssRule::Media(media) => Node::Block(Block {
            prelude: at_prelude("@media", print_css(&media.query, false)?),
            compact_prelude: at_prelude("@media", print_css(&media.query, true)?),
            children: lower_rules(&media.rules),
        }),
        CssRule::Supports(supports) => Node::Block(Block {
            prelude: at_prelude("@supports", print_css(&supports.condition, false)?),
            compact_prelude: at_prelude("@supports", print_css(&supports.condition, true)?),
            children: lower_rules(&supports.rules),
        }),
        CssRule::Ignored => return None,
        other => Node::Opaque(OpaqueRule {
            css: print_css(other, false)?,
            compact: print_css(other, true)?,
        }),
    };
    Some(node)
}

fn lower_declarations(block: &DeclarationBlock<'_>) -> Vec<Node> {
    let normal = block.declarations.iter().map(|p| (p, false));
    let important = block.important_declarations.iter().map(|p| (p, true));
    normal
        .chain(important)
        .filter_map(|(property, important)| lower_declaration(property, important))
        .collect()
}

fn lower_declaration(property: &Property<'_>, important: bool) -> Option<Node> {
    // The printed declaration carries the vendor-prefixed name.
    let printed = property.to_css_string(false, printer(false)).ok()?;
    let (name, _) = printed.split_once(':')?;
    let value = property.value_to_css_string(printer(false)).ok()?;
    Some(Node::Declaration(Declaration {
        property: name.trim().to_string(),
        value,
        important,
    }))
}

fn at_prelude(keyword: &str, rest: String) -> String {
    if rest.is_empty() {
        keyword.to_string()
    } else {
        format!("{keyword} {rest}")
    }
}

fn print_css<T: ToCss>(value: &T, minify: bool) -> Option<String> {
    match value.to_css_string(printer(minify)) {
        Ok(css) => Some(css),
        Err(err) => {
            warn!(error = %err, "failed to print css");
            None
        }
    }
}

fn printer(minify: bool) -> PrinterOptions<'static> {
    PrinterOptions {
        minify,
        ..PrinterOptions::default()
    }
}

fn render_minified(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Declaration(decl) => {
                out.push_str(&decl.render(true));
                out.push(';');
            }
            Node::Block(block) => {
                out.push_str(&block.compact_prelude);
                out.push('{');
                render_minified(&block.children, out);
                out.push('}');
            }
            Node::Opaque(rule) => out.push_str(&rule.compact),
        }
    }
}

fn render_pretty(nodes: &[Node], depth: usize, lines: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    for node in nodes {
        match node {
            Node::Declaration(decl) => lines.push(format!("{indent}{};", decl.render(false))),
            Node::Block(block) => {
                lines.push(format!("{indent}{} {{", block.prelude));
                render_pretty(&block.children, depth + 1, lines);
                lines.push(format!("{indent}}}"));
            }
            Node::Opaque(rule) => {
                lines.extend(rule.css.lines().map(|line| format!("{indent}{line}")));
            }
        }
    }
}

pub(crate) fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `background-color` -> `backgroundColor`. A hyphen is only folded when it
/// is followed by a lowercase ASCII letter, so `--tw-x` becomes `-TwX`.
pub fn kebab_to_camel(property: &str) -> String {
    let mut out = String::with_capacity(property.len());
    let mut chars = property.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '-'
            && let Some(&next) = chars.peek()
            && next.is_ascii_lowercase()
        {
            out.push(next.to_ascii_uppercase());
            chars.next();
            continue;
        }
        out.push(ch);
    }
    out
}

/// Inverse of [`kebab_to_camel`].
pub fn camel_to_kebab(property: &str) -> String {
    let mut out = String::with_capacity(property.len() + 4);
    for ch in property.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
