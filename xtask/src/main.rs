use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::{fs, path::PathBuf};

const SCHEMA: &str = include_str!("../../schemas/githook.schema.json");

#[derive(Parser)]
#[command(name = "xtask", about = "githook workspace tasks")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Validate a githook TOML config against schemas/githook.schema.json
    ValidateConfig { file: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::ValidateConfig { file } => validate_config(&file),
    }
}

fn validate_config(path: &PathBuf) -> Result<()> {
    let data_text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let errors = toml_violations(&data_text)?;
    if !errors.is_empty() {
        eprintln!("Invalid: {}", path.display());
        for e in errors {
            eprintln!("- {}", e);
        }
        std::process::exit(1);
    }
    println!("OK: {}", path.display());
    Ok(())
}

fn toml_violations(text: &str) -> Result<Vec<String>> {
    // TOML tables map 1:1 onto JSON objects, so the schema applies directly.
    let data: serde_json::Value = toml::from_str(text).with_context(|| "parse toml")?;
    violations(&data)
}

fn violations(data: &serde_json::Value) -> Result<Vec<String>> {
    let schema: serde_json::Value = serde_json::from_str(SCHEMA)?;
    let compiled = jsonschema::validator_for(&schema)?;
    Ok(compiled.iter_errors(data).map(|e| e.to_string()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use githook_install::{Config, HookName};

    #[test]
    fn demo_config_is_valid() {
        let errors = toml_violations(include_str!("../../demos/config.toml")).unwrap();
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn every_config_field_is_known_to_the_schema() {
        let mut cfg = Config::default();
        let g = &mut cfg.githook;
        g.skip = Some(true);
        g.build_directory = Some("target".into());
        g.project_root = Some(".".into());
        g.ceiling_directories = vec!["/srv".into()];
        for h in HookName::ALL {
            g.hooks.insert(h.as_str().into(), "true".into());
            g.resource_hooks.insert(h.as_str().into(), "scripts/hook.sh".into());
        }

        let text = toml::to_string(&cfg).unwrap();
        let errors = toml_violations(&text).unwrap();
        assert!(errors.is_empty(), "schema out of date with Config: {errors:?}\n{text}");
    }

    #[test]
    fn unknown_hook_names_and_keys_are_rejected() {
        let bad_name = "[githook.hooks]\nnot-a-real-hook = \"echo hi\"\n";
        assert!(!toml_violations(bad_name).unwrap().is_empty());

        let bad_key = "[githook]\nskp = true\n";
        assert!(!toml_violations(bad_key).unwrap().is_empty());
    }
}
