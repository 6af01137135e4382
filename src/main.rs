// githook/src/main.rs

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use githook_install::{
    layered_config::{self, Config, ConfigManager},
    run, HookName,
};

#[derive(Parser)]
#[command(name = "githook", version, about = "Install configured Git hooks into .git/hooks")]
struct Args {
    /// Project root; external hook files must live under it (default: current directory)
    #[arg(long, global = true)]
    project_root: Option<PathBuf>,
    /// Where to start looking for the enclosing repository (relative to the project root)
    #[arg(long, global = true)]
    build_directory: Option<PathBuf>,
    /// Use this file instead of <project-root>/.githook/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Do nothing (same as GITHOOK_PLUGIN_SKIP=1)
    #[arg(long, global = true)]
    skip: bool,
    #[command(subcommand)]
    cmd: Option<Cmd>,
}

#[derive(Subcommand)]
enum Cmd {
    /// Install every configured hook (default)
    Install {
        /// Print the run report as JSON on stdout
        #[arg(long)]
        json: bool,
    },
    /// List the hook names that can be installed
    ListHooks,
    /// Print the merged configuration as TOML
    ShowConfig,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match &args.cmd {
        Some(Cmd::ListHooks) => {
            for h in HookName::ALL { println!("{h}"); }
            Ok(())
        }
        Some(Cmd::ShowConfig) => {
            let (cm, _) = load_config(&args)?;
            for (path, present) in cm.layers() {
                println!("# {} {}", if present { "loaded" } else { "missing" }, path.display());
            }
            print!("{}", toml::to_string_pretty(&cm.get()).context("serialize toml")?);
            Ok(())
        }
        Some(Cmd::Install { json }) => install(&args, *json),
        None => install(&args, false),
    }
}

fn load_config(args: &Args) -> Result<(ConfigManager, PathBuf)> {
    let cwd = std::env::current_dir().context("current directory")?;
    let root = args.project_root.as_ref().map(|p| cwd.join(p)).unwrap_or_else(|| cwd.clone());
    let cm = ConfigManager::load(&root, args.config.clone())?;

    let mut overlay = layered_config::env_overlay();
    if args.skip { overlay.githook.skip = Some(true); }
    if let Some(p) = &args.project_root { overlay.githook.project_root = Some(p.clone()); }
    if let Some(b) = &args.build_directory { overlay.githook.build_directory = Some(b.clone()); }
    if overlay != Config::default() { cm.apply_runtime_overlay(overlay)?; }
    Ok((cm, cwd))
}

fn install(args: &Args, json: bool) -> Result<()> {
    let (cm, cwd) = load_config(args)?;
    let opts = cm.get().githook.resolve(&cwd);
    let report = run(&opts)?;
    if let Some(dir) = &report.hooks_dir {
        info!("Installed {} hook(s) into {}", report.installed.len(), dir.display());
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}
