//! Access to the class-to-CSS generation engine.
//!
//! The engine is an external collaborator: anything implementing
//! [`Generator`] can be plugged in. [`CommandGenerator`] drives an external
//! program, closures work for embedding and tests.

use anyhow::{Context, Result, bail};
use serde_json::{Map, Value, json};
use std::path::PathBuf;
use std::process::Command;

pub const DEFAULT_GENERATOR: &str = "tailwind-generate";

pub trait Generator {
    /// Produces the raw stylesheet for `content` under the framework `config`.
    fn generate(&self, content: &str, config: &Value) -> Result<String>;
}

impl<F> Generator for F
where
    F: Fn(&str, &Value) -> Result<String>,
{
    fn generate(&self, content: &str, config: &Value) -> Result<String> {
        self(content, config)
    }
}

/// Prepares the framework config for a generation call: preflight styles are
/// disabled unless the caller set them explicitly.
pub fn prepare_config(config: Option<&Value>) -> Value {
    let mut prepared = match config {
        Some(Value::Object(map)) => map.clone(),
        Some(other) => return other.clone(),
        None => Map::new(),
    };

    match prepared.get_mut("corePlugins") {
        Some(Value::Object(plugins)) => {
            let preflight = plugins.get("preflight").filter(|v| !v.is_null()).cloned();
            plugins.insert("preflight".to_string(), preflight.unwrap_or(Value::Bool(false)));
        }
        Some(Value::Array(_)) => {}
        _ => {
            prepared.insert("corePlugins".to_string(), json!({ "preflight": false }));
        }
    }

    Value::Object(prepared)
}

/// Runs `<program> [args..] --content <classes> --config <json>` and reads
/// the stylesheet from stdout.
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandGenerator {
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn program(&self) -> &std::path::Path {
        &self.program
    }

    fn command(&self) -> Command {
        #[cfg(windows)]
        {
            let lower = self.program.to_string_lossy().to_ascii_lowercase();
            if lower.ends_with(".cmd") || lower.ends_with(".bat") {
                let mut cmd = Command::new("cmd");
                cmd.arg("/C").arg(&self.program);
                return cmd;
            }
        }

        Command::new(&self.program)
    }
}

impl Generator for CommandGenerator {
    fn generate(&self, content: &str, config: &Value) -> Result<String> {
        let config_json = serde_json::to_string(config)?;
        let output = self
            .command()
            .args(&self.args)
            .args(["--content", content, "--config", config_json.as_str()])
            .output()
            .with_context(|| {
                format!(
                    "Failed to execute generator {} (install it or pass --generator)",
                    self.program.display()
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("CSS generation failed: {}", stderr.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}
