use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use tw_inline::cache::CacheStats;
use tw_inline::classlist::{ClassInput, format_class_list};
use tw_inline::cli::{Cli, Commands, ResolveArgs};
use tw_inline::config::{load_setup, resolve_generator_path, resolve_setup_path};
use tw_inline::generate::CommandGenerator;
use tw_inline::resolver::Resolver;
use tw_inline::warmup::WarmupOutcome;

fn main() -> Result<()> {
    init_tracing();
    let cli = parse_cli()?;

    let setup_path = resolve_setup_path(&cli)?;
    let setup = load_setup(setup_path.as_deref())?;
    let generator = CommandGenerator::new(resolve_generator_path(&cli));
    tracing::debug!(
        generator = %generator.program().display(),
        setup = ?setup_path,
        "starting"
    );

    match cli.command.clone() {
        Commands::Css(args) => {
            let options = args.options_over(setup.options);
            let mut resolver = Resolver::new(generator, setup.config, options);
            apply_warmup(&mut resolver, &args, setup.warmup.as_ref());
            let report = resolve_all(&mut resolver, &args, Mode::Css)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Json(args) => {
            let options = args.options_over(setup.options);
            let mut resolver = Resolver::new(generator, setup.config, options);
            apply_warmup(&mut resolver, &args, setup.warmup.as_ref());
            let report = resolve_all(&mut resolver, &args, Mode::Json)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Warmup { classes } => {
            let start = Instant::now();
            let mut resolver = Resolver::new(generator, setup.config, setup.options);
            let outcome = resolver.warmup(&classes);
            let report = WarmupReport {
                warmup: outcome,
                stats: resolver.stats(),
                duration_ms: start.elapsed().as_millis() as u64,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_cli() -> Result<Cli> {
    let args: Vec<String> = std::env::args().collect();
    Ok(Cli::parse_from(rewrite_args_for_implicit_css(args)))
}

/// Inserts `css` in front of the first argument that is neither a global
/// option nor a subcommand, so `tw-inline "flex p-4"` means
/// `tw-inline css "flex p-4"`. A `--` separator gets `css` in front of it.
fn rewrite_args_for_implicit_css(mut args: Vec<String>) -> Vec<String> {
    let subcommands = ["css", "json", "warmup", "help"];

    let mut idx = 1usize;
    while idx < args.len() {
        let a = args[idx].as_str();
        if a == "--config" || a == "--generator" {
            idx += 2;
            continue;
        }

        if a.starts_with("--config=")
            || a.starts_with("--generator=")
            || matches!(a, "-h" | "--help" | "-V" | "--version")
        {
            idx += 1;
            continue;
        }

        break;
    }

    if idx < args.len() && !subcommands.contains(&args[idx].as_str()) {
        args.insert(idx, "css".to_string());
    }

    args
}

/// `--warmup` replaces the setup file's batch.
fn apply_warmup(
    resolver: &mut Resolver<CommandGenerator>,
    args: &ResolveArgs,
    from_setup: Option<&Value>,
) {
    match (args.warmup.as_deref(), from_setup) {
        (Some(classes), _) => {
            resolver.warmup(classes);
        }
        (None, Some(value)) => {
            resolver.warmup_value(value);
        }
        (None, None) => {}
    }
}

/// Arguments that look like a JSON array or object are read as nested or
/// conditional class lists; everything else is a raw class string.
fn parse_class_input(raw: &str) -> ClassInput {
    let trimmed = raw.trim_start();
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
            return ClassInput::from_json(&value);
        }
    }
    ClassInput::from(raw)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum Mode {
    Css,
    Json,
}

#[derive(Debug, Serialize)]
struct Resolution {
    input: String,
    content: String,
    cache_hit: bool,
    result: Value,
}

#[derive(Debug, Serialize)]
struct ResolveReport {
    mode: Mode,
    results: Vec<Resolution>,
    warmup: Option<WarmupOutcome>,
    stats: CacheStats,
    duration_ms: u64,
}

#[derive(Debug, Serialize)]
struct WarmupReport {
    warmup: WarmupOutcome,
    stats: CacheStats,
    duration_ms: u64,
}

fn resolve_all(
    resolver: &mut Resolver<CommandGenerator>,
    args: &ResolveArgs,
    mode: Mode,
) -> Result<ResolveReport> {
    let start = Instant::now();
    let mut results = Vec::with_capacity(args.classes.len());

    for raw in &args.classes {
        let input = [parse_class_input(raw)];
        let content = format_class_list(&input);
        let hits_before = tier_hits(&resolver.stats(), mode);

        let result = match mode {
            Mode::Css => Value::String(resolver.css(&input, None)?),
            Mode::Json => Value::Object(resolver.json(&input, None)?),
        };

        results.push(Resolution {
            input: raw.clone(),
            content,
            cache_hit: tier_hits(&resolver.stats(), mode) > hits_before,
            result,
        });
    }

    Ok(ResolveReport {
        mode,
        results,
        warmup: resolver.last_warmup().cloned(),
        stats: resolver.stats(),
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

fn tier_hits(stats: &CacheStats, mode: Mode) -> u64 {
    match mode {
        Mode::Css => stats.css_hits,
        Mode::Json => stats.json_hits,
    }
}
