//! Selector-to-properties extraction for warmup.
//!
//! Only single-class selectors are considered: `.relative` and
//! `.hover\:bg-blue-600:hover` qualify, `.a .b`, `.a>.b` and `.a[x]` do not.

use std::collections::{HashMap, HashSet};
use tracing::warn;

use crate::stylesheet::{Stylesheet, kebab_to_camel};

/// Declarations of one class in source order, keyed by camelCase property.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyList(Vec<(String, String)>);

impl PropertyList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `property`, keeping the original position when it already exists.
    pub fn insert(&mut self, property: String, value: String) {
        match self.0.iter_mut().find(|(p, _)| *p == property) {
            Some(slot) => slot.1 = value,
            None => self.0.push((property, value)),
        }
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(p, _)| p == property)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(p, v)| (p.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

pub type ClassPropertyMap = HashMap<String, PropertyList>;

pub fn extract_class_properties(sheet: &Stylesheet, targets: &HashSet<&str>) -> ClassPropertyMap {
    let mut map = ClassPropertyMap::new();
    if targets.is_empty() {
        return map;
    }

    sheet.walk_rules(&mut |rule| {
        let selector = rule.prelude.as_str();
        if selector.is_empty() {
            warn!("skipping rule with empty selector");
            return;
        }
        if !is_single_class_selector(selector) {
            return;
        }

        let class_name = bare_class_name(selector);
        if !targets.contains(class_name.as_str()) {
            return;
        }

        let mut properties = PropertyList::new();
        rule.walk_declarations(&mut |decl| {
            properties.insert(kebab_to_camel(&decl.property), decl.value.clone());
        });

        if !properties.is_empty() {
            map.insert(class_name, properties);
        }
    });

    map
}

fn is_single_class_selector(selector: &str) -> bool {
    selector.starts_with('.')
        && !selector.contains(char::is_whitespace)
        && !selector.contains('[')
        && !selector.contains('>')
}

/// `.hover\:bg-blue-600:hover` -> `hover:bg-blue-600`.
pub fn bare_class_name(selector: &str) -> String {
    let name = selector.strip_prefix('.').unwrap_or(selector);
    let name = strip_trailing_pseudo(name);
    unescape(name)
}

fn strip_trailing_pseudo(name: &str) -> &str {
    match name.rfind(':') {
        Some(idx) => {
            let suffix = &name[idx + 1..];
            if !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_lowercase() || c == '-') {
                &name[..idx]
            } else {
                name
            }
        }
        None => name,
    }
}

fn unescape(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut chars = name.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some(next) => out.push(next),
                None => out.push(ch),
            }
        } else {
            out.push(ch);
        }
    }
    out
}
