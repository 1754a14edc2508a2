//! Cache-key composition.
//!
//! A key is the canonical JSON serialization of
//! `{content, config, mainOptions, options}`. Object keys in the framework
//! config are sorted recursively, so two configs that differ only in key
//! order produce the same key. Absent values serialize as `null`.

use anyhow::Result;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;

use crate::options::ResolveOptions;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn compose(
        content: &str,
        config: Option<&Value>,
        main_options: Option<&ResolveOptions>,
        options: Option<&ResolveOptions>,
    ) -> Result<Self> {
        let mut out = String::with_capacity(content.len() + 64);
        out.push_str("{\"content\":");
        out.push_str(&serde_json::to_string(content)?);
        out.push_str(",\"config\":");
        match config {
            Some(value) => write_canonical(value, &mut out)?,
            None => out.push_str("null"),
        }
        out.push_str(",\"mainOptions\":");
        write_options(main_options, &mut out)?;
        out.push_str(",\"options\":");
        write_options(options, &mut out)?;
        out.push('}');
        Ok(Self(out))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn digest(&self) -> String {
        hash_content(&self.0)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digest = self.digest();
        f.write_str(&digest[..12])
    }
}

pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

fn write_options(options: Option<&ResolveOptions>, out: &mut String) -> Result<()> {
    match options {
        Some(opts) => out.push_str(&serde_json::to_string(opts)?),
        None => out.push_str("null"),
    }
    Ok(())
}

fn write_canonical(value: &Value, out: &mut String) -> Result<()> {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (idx, (k, v)) in entries.into_iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(k)?);
                out.push(':');
                write_canonical(v, out)?;
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                write_canonical(item, out)?;
            }
            out.push(']');
        }
        scalar => out.push_str(&serde_json::to_string(scalar)?),
    }
    Ok(())
}
