//! # tw-inline
//!
//! Resolves utility-class lists into inline CSS strings or JSON style objects,
//! memoizing every generation call.
//!
//! ## Architecture
//!
//! - **classlist**: Normalization of string, nested and conditional class lists
//! - **key**: Deterministic cache keys over content, config and options
//! - **cache**: Per-resolver CSS and JSON result caches with hit/miss counters
//! - **generate**: Generator trait, config preparation and the external generator program
//! - **stylesheet**: lightningcss parsing lowered to a small rule tree, and its renderer
//! - **format**: Post-processing pipeline (media queries, merging, minification)
//! - **json**: Rule tree to camelCase JSON conversion
//! - **extract**: Per-class declaration extraction from a batch stylesheet
//! - **warmup**: Bulk population of both caches from one generation call
//! - **resolver**: Memoized resolvers and one-shot helpers
//! - **options**: Post-processing switches and their precedence
//! - **config**: Setup file and generator lookup
//! - **cli**: Command-line arguments

pub mod cache;
pub mod classlist;
pub mod cli;
pub mod config;
pub mod extract;
pub mod format;
pub mod generate;
pub mod json;
pub mod key;
pub mod options;
pub mod resolver;
pub mod stylesheet;
pub mod warmup;

pub use classlist::ClassInput;
pub use generate::{CommandGenerator, Generator};
pub use options::ResolveOptions;
pub use resolver::{Resolver, Setup, inline_css, inline_json, tailwind_to_css};
