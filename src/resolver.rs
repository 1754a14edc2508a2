//! Memoized resolution of class lists into inline CSS and JSON.

use anyhow::Result;
use serde_json::Value;
use tracing::debug;

use crate::cache::{CacheStats, CssCache, JsonCache, JsonObject};
use crate::classlist::{ClassInput, format_class_list};
use crate::format::{FormattedCss, process};
use crate::generate::{Generator, prepare_config};
use crate::key::CacheKey;
use crate::options::{ResolveOptions, ResolvedOptions};
use crate::warmup::{WarmupOutcome, warmup, warmup_value};

/// Resolves normalized `content` to formatted CSS through `cache`.
pub fn resolve_css<G: Generator + ?Sized>(
    generator: &G,
    content: &str,
    config: Option<&Value>,
    main_options: Option<&ResolveOptions>,
    options: Option<&ResolveOptions>,
    cache: &mut CssCache,
) -> Result<String> {
    let key = CacheKey::compose(content, config, main_options, options)?;
    if let Some(css) = cache.lookup(&key) {
        debug!(%key, "css cache hit");
        return Ok(css);
    }

    debug!(%key, content, "css cache miss, generating");
    let css = generate_formatted(generator, content, config, main_options, options)?.get();

    cache.insert(key, css.clone());
    Ok(css)
}

/// Resolves normalized `content` to a JSON property object through `cache`.
/// Misses run the same generation and pipeline as the CSS path but never
/// touch a CSS cache.
pub fn resolve_json<G: Generator + ?Sized>(
    generator: &G,
    content: &str,
    config: Option<&Value>,
    main_options: Option<&ResolveOptions>,
    options: Option<&ResolveOptions>,
    cache: &mut JsonCache,
) -> Result<JsonObject> {
    let key = CacheKey::compose(content, config, main_options, options)?;
    if let Some(json) = cache.lookup(&key) {
        debug!(%key, "json cache hit");
        return Ok(json);
    }

    debug!(%key, content, "json cache miss, generating");
    let json = generate_formatted(generator, content, config, main_options, options)?.to_json();

    cache.insert(key, json.clone());
    Ok(json)
}

fn generate_formatted<G: Generator + ?Sized>(
    generator: &G,
    content: &str,
    config: Option<&Value>,
    main_options: Option<&ResolveOptions>,
    options: Option<&ResolveOptions>,
) -> Result<FormattedCss> {
    let resolved = ResolvedOptions::merged(main_options, options);
    let raw = generator.generate(content, &prepare_config(config))?;
    Ok(process(&raw, &resolved))
}

/// Arguments of [`tailwind_to_css`].
#[derive(Debug, Clone, Default)]
pub struct Setup {
    pub config: Option<Value>,
    pub options: Option<ResolveOptions>,
    pub warmup: Option<String>,
}

/// A generator bound to one config/options pair and its own cache pair.
pub struct Resolver<G> {
    generator: G,
    config: Option<Value>,
    options: Option<ResolveOptions>,
    css_cache: CssCache,
    json_cache: JsonCache,
    warmup: Option<WarmupOutcome>,
}

/// Builds a resolver with fresh caches, warming them when `setup.warmup` is set.
pub fn tailwind_to_css<G: Generator>(generator: G, setup: Setup) -> Resolver<G> {
    let mut resolver = Resolver::new(generator, setup.config, setup.options);
    if let Some(classes) = setup.warmup.as_deref() {
        resolver.warmup(classes);
    }
    resolver
}

impl<G: Generator> Resolver<G> {
    pub fn new(generator: G, config: Option<Value>, options: Option<ResolveOptions>) -> Self {
        Self {
            generator,
            config,
            options,
            css_cache: CssCache::new(),
            json_cache: JsonCache::new(),
            warmup: None,
        }
    }

    pub fn css(&mut self, input: &[ClassInput], options: Option<&ResolveOptions>) -> Result<String> {
        let content = format_class_list(input);
        resolve_css(
            &self.generator,
            &content,
            self.config.as_ref(),
            self.options.as_ref(),
            options,
            &mut self.css_cache,
        )
    }

    pub fn json(
        &mut self,
        input: &[ClassInput],
        options: Option<&ResolveOptions>,
    ) -> Result<JsonObject> {
        let content = format_class_list(input);
        resolve_json(
            &self.generator,
            &content,
            self.config.as_ref(),
            self.options.as_ref(),
            options,
            &mut self.json_cache,
        )
    }

    /// Pre-populates both tiers for `classes`; see [`crate::warmup`].
    pub fn warmup(&mut self, classes: &str) -> WarmupOutcome {
        let outcome = warmup(
            classes,
            self.config.as_ref(),
            self.options.as_ref(),
            &self.generator,
            &mut self.css_cache,
            &mut self.json_cache,
        );
        self.warmup = Some(outcome.clone());
        outcome
    }

    /// Like [`Resolver::warmup`] but takes an untyped value, e.g. from a
    /// setup file. Non-string values are skipped.
    pub fn warmup_value(&mut self, value: &Value) -> WarmupOutcome {
        let outcome = warmup_value(
            value,
            self.config.as_ref(),
            self.options.as_ref(),
            &self.generator,
            &mut self.css_cache,
            &mut self.json_cache,
        );
        self.warmup = Some(outcome.clone());
        outcome
    }

    pub fn last_warmup(&self) -> Option<&WarmupOutcome> {
        self.warmup.as_ref()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats::collect(&self.css_cache, &self.json_cache)
    }
}

/// One-shot CSS resolution; every call gets its own empty cache.
pub fn inline_css<G: Generator + ?Sized>(
    generator: &G,
    config: Option<&Value>,
    main_options: Option<&ResolveOptions>,
    input: &[ClassInput],
    options: Option<&ResolveOptions>,
) -> Result<String> {
    let content = format_class_list(input);
    resolve_css(generator, &content, config, main_options, options, &mut CssCache::new())
}

/// One-shot JSON resolution; every call gets its own empty cache.
pub fn inline_json<G: Generator + ?Sized>(
    generator: &G,
    config: Option<&Value>,
    main_options: Option<&ResolveOptions>,
    input: &[ClassInput],
    options: Option<&ResolveOptions>,
) -> Result<JsonObject> {
    let content = format_class_list(input);
    resolve_json(generator, &content, config, main_options, options, &mut JsonCache::new())
}
