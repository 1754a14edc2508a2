#![cfg(unix)]

use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

const FAKE_GENERATOR: &str = r#"#!/bin/sh
set -e
[ "$1" = "--content" ] || exit 3
[ "$3" = "--config" ] || exit 4
if [ -n "$TW_FAKE_LOG" ]; then
  printf '%s\n' "$2" >> "$TW_FAKE_LOG"
fi
for class in $2; do
  case "$class" in
    relative) printf '%s\n' '.relative { position: relative; }' ;;
    flex) printf '%s\n' '.flex { display: flex; }' ;;
    text-sm) printf '%s\n' '.text-sm { font-size: 1.125rem; line-height: 1.75rem; }' ;;
    bg-red-500) printf '%s\n' '.bg-red-500 { --tw-bg-opacity: 1; background-color: rgb(239 68 68 / var(--tw-bg-opacity)); }' ;;
    md:p-4) printf '%s\n' '@media (min-width: 768px) { .md\:p-4 { padding: 1rem; } }' ;;
  esac
done
"#;

fn temp_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!(
        "tw_inline_it_{}_{}_{}",
        std::process::id(),
        nanos,
        name
    ))
}

fn write_file(path: &Path, content: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}

fn make_executable(path: &Path) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms)?;
    Ok(())
}

struct Fixture {
    base: PathBuf,
    generator: PathBuf,
    setup: PathBuf,
    log: PathBuf,
}

impl Fixture {
    fn new(name: &str, setup: &Value) -> anyhow::Result<Self> {
        let base = temp_dir(name);
        let generator = base.join("bin").join("tailwind-generate");
        write_file(&generator, FAKE_GENERATOR)?;
        make_executable(&generator)?;

        let setup_path = base.join("setup.json");
        write_file(&setup_path, &serde_json::to_string(setup)?)?;

        Ok(Self {
            log: base.join("generate.log"),
            base,
            generator,
            setup: setup_path,
        })
    }

    fn generations(&self) -> anyhow::Result<Vec<String>> {
        if !self.log.exists() {
            return Ok(Vec::new());
        }
        Ok(std::fs::read_to_string(&self.log)?
            .lines()
            .map(str::to_string)
            .collect())
    }

    fn run(&self, args: &[&str]) -> std::process::Output {
        Command::new(env!("CARGO_BIN_EXE_tw-inline"))
            .arg("--generator")
            .arg(&self.generator)
            .arg("--config")
            .arg(&self.setup)
            .args(args)
            .env("TW_FAKE_LOG", &self.log)
            .env_remove("RUST_LOG")
            .output()
            .unwrap()
    }

    fn run_json(&self, args: &[&str]) -> anyhow::Result<Value> {
        let out = self.run(args);
        if !out.status.success() {
            return Err(anyhow::anyhow!(
                "command failed: status={:?}, stderr={}",
                out.status.code(),
                String::from_utf8_lossy(&out.stderr)
            ));
        }
        Ok(serde_json::from_slice(&out.stdout)?)
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.base);
    }
}

#[test]
fn repeated_class_lists_are_generated_once() -> anyhow::Result<()> {
    let fixture = Fixture::new("repeated", &json!({}))?;

    let report = fixture.run_json(&["css", "relative flex", "  relative   flex ", "flex relative"])?;

    assert_eq!(report["mode"], json!("css"));
    let results = report["results"].as_array().cloned().unwrap_or_default();
    assert_eq!(results.len(), 3);

    assert_eq!(results[0]["content"], json!("relative flex"));
    assert_eq!(results[0]["cache_hit"], json!(false));
    assert_eq!(results[0]["result"], json!("position:relative;display:flex;"));

    assert_eq!(results[1]["content"], json!("relative flex"));
    assert_eq!(results[1]["cache_hit"], json!(true));
    assert_eq!(results[1]["result"], results[0]["result"]);

    assert_eq!(results[2]["cache_hit"], json!(false));
    assert_eq!(results[2]["result"], json!("display:flex;position:relative;"));

    assert_eq!(report["stats"]["css_entries"], json!(2));
    assert_eq!(report["stats"]["css_hits"], json!(1));
    assert_eq!(report["warmup"], Value::Null);
    assert_eq!(fixture.generations()?, vec!["relative flex", "flex relative"]);
    Ok(())
}

#[test]
fn setup_warmup_makes_first_lookup_a_hit() -> anyhow::Result<()> {
    let fixture = Fixture::new(
        "warmup_hit",
        &json!({"warmup": "text-sm bg-red-500 hover:bg-blue-600"}),
    )?;

    let report = fixture.run_json(&["json", "text-sm"])?;

    assert_eq!(report["warmup"]["status"], json!("warmed"));
    assert_eq!(report["warmup"]["classes"], json!(2));
    assert_eq!(report["warmup"]["dropped"], json!(1));
    assert_eq!(report["results"][0]["cache_hit"], json!(true));
    assert_eq!(
        report["results"][0]["result"],
        json!({"fontSize": "1.125rem", "lineHeight": "1.75rem"})
    );
    let keys: Vec<&str> = report["results"][0]["result"]
        .as_object()
        .map(|o| o.keys().map(String::as_str).collect())
        .unwrap_or_default();
    assert_eq!(keys, vec!["fontSize", "lineHeight"]);
    assert_eq!(fixture.generations()?, vec!["text-sm bg-red-500"]);
    Ok(())
}

#[test]
fn warmup_flag_replaces_setup_batch() -> anyhow::Result<()> {
    let fixture = Fixture::new("warmup_flag", &json!({"warmup": "text-sm"}))?;

    let report = fixture.run_json(&["css", "--warmup", "bg-red-500", "bg-red-500"])?;

    assert_eq!(report["results"][0]["cache_hit"], json!(true));
    let css = report["results"][0]["result"].as_str().unwrap_or_default();
    assert!(css.starts_with("--tw-bg-opacity:1;background-color:rgb(239 68 68"));
    assert!(css.ends_with("var(--tw-bg-opacity));"));
    assert_eq!(fixture.generations()?, vec!["bg-red-500"]);
    Ok(())
}

#[test]
fn bare_class_string_defaults_to_css() -> anyhow::Result<()> {
    let fixture = Fixture::new("implicit_css", &json!({}))?;

    let report = fixture.run_json(&["bg-red-500 md:p-4"])?;
    assert_eq!(report["mode"], json!("css"));
    assert_eq!(
        report["results"][0]["result"],
        json!("background-color:#ef4444;")
    );

    let kept = fixture.run_json(&["--keep-media", "md:p-4"])?;
    let css = kept["results"][0]["result"].as_str().unwrap_or_default();
    assert!(css.starts_with("@media "));
    assert!(css.contains("768px"));
    assert!(css.ends_with("{padding:1rem;}"));
    Ok(())
}

#[test]
fn invalid_warmup_reports_skip_without_generating() -> anyhow::Result<()> {
    let fixture = Fixture::new("warmup_skip", &json!({}))?;

    let report = fixture.run_json(&["warmup", "   "])?;
    assert_eq!(report["warmup"]["status"], json!("skipped"));
    assert_eq!(report["warmup"]["reason"], json!("invalid_input"));
    assert_eq!(report["stats"]["css_entries"], json!(0));

    let report = fixture.run_json(&["warmup", "hover:underline md:p-4"])?;
    assert_eq!(report["warmup"]["reason"], json!("no_valid_classes"));

    assert!(fixture.generations()?.is_empty());
    Ok(())
}

#[test]
fn generator_failure_exits_with_error() -> anyhow::Result<()> {
    let fixture = Fixture::new("failure", &json!({}))?;
    write_file(
        &fixture.generator,
        "#!/bin/sh\necho \"unknown theme key\" >&2\nexit 1\n",
    )?;
    make_executable(&fixture.generator)?;

    let out = fixture.run(&["css", "flex"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("CSS generation failed"));
    assert!(stderr.contains("unknown theme key"));
    Ok(())
}
