use serde::{Deserialize, Serialize};

/// Partial formatting options. Unset fields defer to the next layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minify: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_media_queries: Option<bool>,
}

/// Options handed to warmup; they only shape the key of the warmed entries.
pub type WarmupOptions = ResolveOptions;

impl ResolveOptions {
    pub fn is_empty(&self) -> bool {
        self.merge.is_none() && self.minify.is_none() && self.ignore_media_queries.is_none()
    }

    fn overlay(self, other: &ResolveOptions) -> Self {
        Self {
            merge: other.merge.or(self.merge),
            minify: other.minify.or(self.minify),
            ignore_media_queries: other.ignore_media_queries.or(self.ignore_media_queries),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedOptions {
    pub merge: bool,
    pub minify: bool,
    pub ignore_media_queries: bool,
}

impl Default for ResolvedOptions {
    fn default() -> Self {
        Self {
            merge: true,
            minify: true,
            ignore_media_queries: true,
        }
    }
}

impl ResolvedOptions {
    /// Defaults, then instance options, then per-call options.
    pub fn merged(main: Option<&ResolveOptions>, call: Option<&ResolveOptions>) -> Self {
        let defaults = ResolvedOptions::default();
        let mut layered = ResolveOptions::default();
        for layer in [main, call].into_iter().flatten() {
            layered = layered.overlay(layer);
        }
        Self {
            merge: layered.merge.unwrap_or(defaults.merge),
            minify: layered.minify.unwrap_or(defaults.minify),
            ignore_media_queries: layered
                .ignore_media_queries
                .unwrap_or(defaults.ignore_media_queries),
        }
    }
}
