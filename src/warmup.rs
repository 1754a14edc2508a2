//! Bulk cache warmup.
//!
//! Instead of one generation call per class, warmup generates a single
//! stylesheet for a whole batch, extracts each class's declarations from it
//! and writes both cache tiers directly. The entries are keyed exactly like
//! a later single-class lookup against the same resolver, so those lookups
//! hit on first use.
//!
//! Warmup never fails: bad input is logged as a warning and ignored, a
//! failing generation is logged as an error and leaves the caches untouched.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, error, warn};

use crate::cache::{CssCache, JsonCache, JsonObject};
use crate::extract::{ClassPropertyMap, PropertyList, extract_class_properties};
use crate::generate::{Generator, prepare_config};
use crate::key::CacheKey;
use crate::options::WarmupOptions;
use crate::stylesheet::{camel_to_kebab, parse_stylesheet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WarmupOutcome {
    /// Nothing usable was supplied.
    Skipped { reason: SkipReason },
    /// Generation or key composition failed; no entries were written.
    Failed { error: String },
    Warmed {
        classes: usize,
        matched: usize,
        dropped: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    InvalidInput,
    NoValidClasses,
}

/// Warms both tiers from a JSON value. Anything but a string is rejected.
pub fn warmup_value<G: Generator + ?Sized>(
    value: &Value,
    config: Option<&Value>,
    options: Option<&WarmupOptions>,
    generator: &G,
    css_cache: &mut CssCache,
    json_cache: &mut JsonCache,
) -> WarmupOutcome {
    match value {
        Value::String(classes) => warmup(classes, config, options, generator, css_cache, json_cache),
        _ => {
            warn!("invalid warmup value provided, expected a string of classes");
            WarmupOutcome::Skipped {
                reason: SkipReason::InvalidInput,
            }
        }
    }
}

pub fn warmup<G: Generator + ?Sized>(
    classes: &str,
    config: Option<&Value>,
    options: Option<&WarmupOptions>,
    generator: &G,
    css_cache: &mut CssCache,
    json_cache: &mut JsonCache,
) -> WarmupOutcome {
    if classes.trim().is_empty() {
        warn!("invalid warmup string provided");
        return WarmupOutcome::Skipped {
            reason: SkipReason::InvalidInput,
        };
    }

    let tokens: Vec<&str> = classes.split_whitespace().collect();
    let batch: Vec<&str> = tokens
        .iter()
        .copied()
        .filter(|token| is_warmable(token))
        .collect();
    let dropped = tokens.len() - batch.len();

    if batch.is_empty() {
        warn!(dropped, "no valid classes found in warmup string");
        return WarmupOutcome::Skipped {
            reason: SkipReason::NoValidClasses,
        };
    }

    let content = batch.join(" ");
    let raw = match generator.generate(&content, &prepare_config(config)) {
        Ok(css) if !css.is_empty() => css,
        Ok(_) => {
            error!(classes = batch.len(), "generator returned no CSS for warmup batch");
            return WarmupOutcome::Failed {
                error: "generator returned no CSS".to_string(),
            };
        }
        Err(err) => {
            error!(error = %err, "failed to generate CSS for warmup batch");
            return WarmupOutcome::Failed {
                error: format!("{err:#}"),
            };
        }
    };

    let targets: HashSet<&str> = batch.iter().copied().collect();
    let properties = extract_class_properties(&parse_stylesheet(&raw), &targets);

    match populate(&batch, &properties, config, options, css_cache, json_cache) {
        Ok(()) => {
            debug!(
                classes = batch.len(),
                matched = properties.len(),
                dropped,
                "warmup populated caches"
            );
            WarmupOutcome::Warmed {
                classes: batch.len(),
                matched: properties.len(),
                dropped,
            }
        }
        Err(err) => {
            error!(error = %err, "failed to populate warmup entries");
            WarmupOutcome::Failed {
                error: format!("{err:#}"),
            }
        }
    }
}

/// Warmup only accepts plain utility names; variant-prefixed classes such as
/// `hover:bg-blue-600` still resolve normally but are never warmed.
pub fn is_warmable(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn populate(
    batch: &[&str],
    properties: &ClassPropertyMap,
    config: Option<&Value>,
    options: Option<&WarmupOptions>,
    css_cache: &mut CssCache,
    json_cache: &mut JsonCache,
) -> anyhow::Result<()> {
    let empty = PropertyList::new();

    // Compose every key first so a failure leaves both caches untouched.
    let mut entries = Vec::with_capacity(batch.len());
    for class_name in batch {
        let key = CacheKey::compose(class_name, config, options, None)?;
        let props = properties.get(*class_name).unwrap_or(&empty);
        entries.push((key, inline_declarations(props), json_properties(props)));
    }

    for (key, css, json) in entries {
        css_cache.insert(key.clone(), css);
        json_cache.insert(key, json);
    }
    Ok(())
}

fn inline_declarations(props: &PropertyList) -> String {
    props
        .iter()
        .map(|(prop, value)| format!("{}:{value};", camel_to_kebab(prop)))
        .collect()
}

fn json_properties(props: &PropertyList) -> JsonObject {
    props
        .iter()
        .map(|(prop, value)| (prop.to_string(), Value::String(value.to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, bail};
    use serde_json::json;
    use std::cell::Cell;

    const SHEET: &str = r#"
.bg-red-500 { --tw-bg-opacity: 1; background-color: rgb(239 68 68 / var(--tw-bg-opacity)); }
.text-sm { font-size: 1.125rem; line-height: 1.75rem; }
.hover\:bg-blue-600:hover { background-color: #2563eb; }
"#;

    fn key(class_name: &str, options: Option<&WarmupOptions>) -> CacheKey {
        CacheKey::compose(class_name, None, options, None).unwrap()
    }

    #[test]
    fn warms_both_tiers_from_one_generation() {
        let calls = Cell::new(0usize);
        let seen = std::cell::RefCell::new(String::new());
        let generator = |content: &str, _config: &Value| -> Result<String> {
            calls.set(calls.get() + 1);
            *seen.borrow_mut() = content.to_string();
            Ok(SHEET.to_string())
        };
        let mut css = CssCache::new();
        let mut json = JsonCache::new();

        let outcome = warmup(
            "bg-red-500  text-sm hover:bg-blue-600 unknown-class",
            None,
            None,
            &generator,
            &mut css,
            &mut json,
        );

        assert_eq!(
            outcome,
            WarmupOutcome::Warmed {
                classes: 3,
                matched: 2,
                dropped: 1,
            }
        );
        assert_eq!(calls.get(), 1);
        assert_eq!(*seen.borrow(), "bg-red-500 text-sm unknown-class");

        assert_eq!(
            css.get(&key("text-sm", None)).map(String::as_str),
            Some("font-size:1.125rem;line-height:1.75rem;")
        );
        let bg = css.get(&key("bg-red-500", None)).cloned().unwrap_or_default();
        assert!(bg.starts_with("--tw-bg-opacity:1;background-color:rgb(239 68 68"));
        assert!(bg.ends_with("var(--tw-bg-opacity));"));

        let text = json.get(&key("text-sm", None)).cloned().unwrap_or_default();
        let props: Vec<&str> = text.keys().map(String::as_str).collect();
        assert_eq!(props, vec!["fontSize", "lineHeight"]);
        assert_eq!(
            Value::Object(text),
            json!({"fontSize": "1.125rem", "lineHeight": "1.75rem"})
        );

        assert_eq!(css.get(&key("unknown-class", None)).map(String::as_str), Some(""));
        assert!(json.get(&key("unknown-class", None)).is_some_and(|o| o.is_empty()));
        assert!(!css.contains(&key("hover:bg-blue-600", None)));
        assert_eq!(css.len(), 3);
        assert_eq!(json.len(), 3);
    }

    #[test]
    fn entries_are_keyed_with_warmup_options_as_main_options() {
        let generator = |_: &str, _: &Value| -> Result<String> { Ok(SHEET.to_string()) };
        let options = WarmupOptions {
            minify: Some(false),
            ..Default::default()
        };
        let config = json!({"theme": {}});
        let mut css = CssCache::new();
        let mut json = JsonCache::new();

        warmup("text-sm", Some(&config), Some(&options), &generator, &mut css, &mut json);

        let expected = CacheKey::compose("text-sm", Some(&config), Some(&options), None).unwrap();
        assert!(css.contains(&expected));
        assert!(!css.contains(&key("text-sm", Some(&options))));
    }

    #[test]
    fn invalid_input_leaves_caches_untouched() {
        let calls = Cell::new(0usize);
        let generator = |_: &str, _: &Value| -> Result<String> {
            calls.set(calls.get() + 1);
            Ok(SHEET.to_string())
        };
        let mut css = CssCache::new();
        let mut json = JsonCache::new();

        for input in ["", "   ", "\n\t"] {
            let outcome = warmup(input, None, None, &generator, &mut css, &mut json);
            assert_eq!(
                outcome,
                WarmupOutcome::Skipped {
                    reason: SkipReason::InvalidInput
                }
            );
        }

        let outcome = warmup_value(&json!(123), None, None, &generator, &mut css, &mut json);
        assert!(matches!(outcome, WarmupOutcome::Skipped { .. }));

        let outcome = warmup("hover:bg-blue-600 md:flex", None, None, &generator, &mut css, &mut json);
        assert_eq!(
            outcome,
            WarmupOutcome::Skipped {
                reason: SkipReason::NoValidClasses
            }
        );

        assert_eq!(calls.get(), 0);
        assert!(css.is_empty());
        assert!(json.is_empty());
    }

    #[test]
    fn generation_failure_aborts_without_writes() {
        let failing = |_: &str, _: &Value| -> Result<String> { bail!("config is broken") };
        let empty = |_: &str, _: &Value| -> Result<String> { Ok(String::new()) };
        let mut css = CssCache::new();
        let mut json = JsonCache::new();

        let outcome = warmup("flex", None, None, &failing, &mut css, &mut json);
        assert!(matches!(outcome, WarmupOutcome::Failed { ref error } if error.contains("config is broken")));

        let outcome = warmup("flex", None, None, &empty, &mut css, &mut json);
        assert!(matches!(outcome, WarmupOutcome::Failed { .. }));

        assert!(css.is_empty());
        assert!(json.is_empty());
    }

    #[test]
    fn whitespace_only_stylesheet_caches_empty_entries() {
        let blank = |_: &str, _: &Value| -> Result<String> { Ok("  \n".to_string()) };
        let mut css = CssCache::new();
        let mut json = JsonCache::new();

        let outcome = warmup("flex grid", None, None, &blank, &mut css, &mut json);
        assert_eq!(
            outcome,
            WarmupOutcome::Warmed {
                classes: 2,
                matched: 0,
                dropped: 0,
            }
        );
        assert_eq!(css.get(&key("flex", None)).map(String::as_str), Some(""));
        assert!(json.get(&key("grid", None)).is_some_and(|o| o.is_empty()));
    }

    #[test]
    fn warmable_tokens_match_plain_utility_names() {
        assert!(is_warmable("bg-red-500"));
        assert!(is_warmable("snake_case"));
        assert!(!is_warmable("hover:bg-blue-600"));
        assert!(!is_warmable("w-1/2"));
        assert!(!is_warmable("[mask:none]"));
        assert!(!is_warmable(""));
    }
}
