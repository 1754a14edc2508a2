use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::options::ResolveOptions;

#[derive(Debug, Clone, Parser)]
#[command(name = "tw-inline")]
#[command(about = "Resolve utility classes into inline CSS or JSON with memoized generation")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Setup file: {"config": .., "options": .., "warmup": ".."}
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Program that turns class content into a stylesheet
    #[arg(long, value_name = "PROGRAM")]
    pub generator: Option<PathBuf>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Resolve each class list to inline CSS
    Css(ResolveArgs),
    /// Resolve each class list to a JSON property object
    Json(ResolveArgs),
    /// Warm the caches for a batch of classes and report the outcome
    Warmup {
        #[arg(value_name = "CLASSES")]
        classes: String,
    },
}

#[derive(Debug, Clone, Args)]
pub struct ResolveArgs {
    #[arg(value_name = "CLASSES", required = true)]
    pub classes: Vec<String>,

    /// Classes to warm before resolving
    #[arg(long, value_name = "CLASSES")]
    pub warmup: Option<String>,

    #[arg(long)]
    pub no_merge: bool,

    #[arg(long)]
    pub no_minify: bool,

    /// Keep (and combine) media queries instead of stripping them
    #[arg(long)]
    pub keep_media: bool,
}

impl ResolveArgs {
    /// Flags that were passed, layered over `base`.
    pub fn options_over(&self, base: Option<ResolveOptions>) -> Option<ResolveOptions> {
        let mut options = base.unwrap_or_default();
        if self.no_merge {
            options.merge = Some(false);
        }
        if self.no_minify {
            options.minify = Some(false);
        }
        if self.keep_media {
            options.ignore_media_queries = Some(false);
        }

        if options.is_empty() && base.is_none() {
            None
        } else {
            Some(options)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_file_options() {
        let cli = Cli::parse_from(["tw-inline", "css", "--no-minify", "flex"]);
        let Commands::Css(args) = cli.command else {
            panic!("expected css command");
        };

        assert_eq!(args.options_over(None), Some(ResolveOptions {
            minify: Some(false),
            ..Default::default()
        }));

        let base = ResolveOptions {
            minify: Some(true),
            merge: Some(false),
            ignore_media_queries: None,
        };
        assert_eq!(args.options_over(Some(base)), Some(ResolveOptions {
            minify: Some(false),
            merge: Some(false),
            ignore_media_queries: None,
        }));
    }

    #[test]
    fn no_flags_and_no_file_means_no_options() {
        let cli = Cli::parse_from(["tw-inline", "json", "flex", "p-4"]);
        let Commands::Json(args) = cli.command else {
            panic!("expected json command");
        };
        assert_eq!(args.classes, vec!["flex".to_string(), "p-4".to_string()]);
        assert_eq!(args.options_over(None), None);
    }
}
