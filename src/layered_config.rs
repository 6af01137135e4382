// githook/src/layered_config.rs

use anyhow::{Context, Result};
use directories::ProjectDirs;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}, sync::Arc};
use tracing::{debug, warn};

use crate::run::InstallOptions;

pub const SKIP_ENV: &str = "GITHOOK_PLUGIN_SKIP";

/// Config is merged: system -> user -> workspace -> runtime (ephemeral)
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub githook: GitHookConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct GitHookConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<bool>,
    /// Where repository discovery starts; relative to the project root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_directory: Option<PathBuf>,
    /// Root that external hook files must live under; relative to the cwd.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_root: Option<PathBuf>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ceiling_directories: Vec<PathBuf>,
    /// hook name -> inline script
    pub hooks: IndexMap<String, String>,
    /// hook name -> script file, relative to the project root
    pub resource_hooks: IndexMap<String, String>,
}

impl GitHookConfig {
    /// Turns the merged config into absolute run options, resolving relative
    /// paths against `cwd`.
    pub fn resolve(&self, cwd: &Path) -> InstallOptions {
        let project_root = match &self.project_root {
            Some(p) => cwd.join(p),
            None => cwd.to_path_buf(),
        };
        let build_directory = match &self.build_directory {
            Some(b) => project_root.join(b),
            None => project_root.clone(),
        };
        InstallOptions {
            skip: self.skip.unwrap_or(false),
            ceiling_directories: self.ceiling_directories.iter().map(|c| cwd.join(c)).collect(),
            hooks: self.hooks.clone(),
            resource_hooks: self.resource_hooks.clone(),
            project_root,
            build_directory,
        }
    }
}

fn merge(a: &mut Config, b: &Config) {
    let (a, b) = (&mut a.githook, &b.githook);
    if b.skip.is_some() { a.skip = b.skip; }
    if b.build_directory.is_some() { a.build_directory = b.build_directory.clone(); }
    if b.project_root.is_some() { a.project_root = b.project_root.clone(); }
    if !b.ceiling_directories.is_empty() { a.ceiling_directories = b.ceiling_directories.clone(); }
    // later layers override a key in place; new keys keep their order at the end
    for (k, v) in &b.hooks { a.hooks.insert(k.clone(), v.clone()); }
    for (k, v) in &b.resource_hooks { a.resource_hooks.insert(k.clone(), v.clone()); }
}

/// `1`/`true`/`yes`/`on` and their negatives, case-insensitive.
pub fn parse_flag(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Overlay derived from the process environment.
pub fn env_overlay() -> Config {
    let mut cfg = Config::default();
    if let Ok(v) = std::env::var(SKIP_ENV) {
        cfg.githook.skip = skip_from_env(&v);
    }
    cfg
}

fn skip_from_env(v: &str) -> Option<bool> {
    let skip = parse_flag(v);
    if skip.is_none() {
        warn!("ignoring {SKIP_ENV}={v:?}: expected 1/0, true/false, yes/no or on/off");
    }
    skip
}

fn config_paths(workspace_root: &Path) -> (PathBuf, Option<PathBuf>, PathBuf) {
    let user = ProjectDirs::from("dev", "githook", "githook").map(|p| p.config_dir().join("config.toml"));
    let system = if cfg!(target_os = "windows") {
        PathBuf::from(r"C:\ProgramData\githook\config.toml")
    } else {
        PathBuf::from("/etc/githook/config.toml")
    };
    let workspace = workspace_root.join(".githook").join("config.toml");
    (system, user, workspace)
}

#[derive(Clone)]
pub struct ConfigManager {
    inner: Arc<RwLock<Config>>,
    system_path: PathBuf,
    user_path: Option<PathBuf>,
    workspace_path: PathBuf,
    runtime_overlay: Arc<RwLock<Config>>,
}

impl ConfigManager {
    /// Loads the standard layers for `workspace_root`. `workspace_file`
    /// replaces `<root>/.githook/config.toml` when given.
    pub fn load(workspace_root: impl AsRef<Path>, workspace_file: Option<PathBuf>) -> Result<Self> {
        let (system, user, workspace) = config_paths(workspace_root.as_ref());
        Self::with_paths(system, user, workspace_file.unwrap_or(workspace))
    }

    pub fn with_paths(system_path: PathBuf, user_path: Option<PathBuf>, workspace_path: PathBuf) -> Result<Self> {
        let me = Self {
            inner: Arc::new(RwLock::new(Config::default())),
            system_path, user_path, workspace_path,
            runtime_overlay: Arc::new(RwLock::new(Config::default())),
        };
        me.reload_all()?;
        Ok(me)
    }

    /// Missing files count as empty layers; malformed ones are errors.
    fn read_file(path: &Path) -> Result<Option<Config>> {
        let text = match fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("read config {}", path.display())),
        };
        let cfg: Config = toml::from_str(&text).with_context(|| format!("parse config {}", path.display()))?;
        debug!(path = %path.display(), "loaded config layer");
        Ok(Some(cfg))
    }

    pub fn reload_all(&self) -> Result<()> {
        let mut merged = Config::default();
        if let Some(sys) = Self::read_file(&self.system_path)? { merge(&mut merged, &sys); }
        if let Some(usr) = self.user_path.as_deref() {
            if let Some(usr) = Self::read_file(usr)? { merge(&mut merged, &usr); }
        }
        if let Some(ws) = Self::read_file(&self.workspace_path)? { merge(&mut merged, &ws); }
        let rt = self.runtime_overlay.read().clone();
        merge(&mut merged, &rt);
        *self.inner.write() = merged;
        Ok(())
    }

    pub fn get(&self) -> Config { self.inner.read().clone() }

    /// In-memory overlay (not persisted).
    pub fn apply_runtime_overlay(&self, patch: Config) -> Result<()> {
        {
            let mut rt = self.runtime_overlay.write();
            merge(&mut *rt, &patch);
        }
        self.reload_all()
    }

    /// Layer files in merge order, with whether each one exists.
    pub fn layers(&self) -> Vec<(PathBuf, bool)> {
        [Some(&self.system_path), self.user_path.as_ref(), Some(&self.workspace_path)]
            .into_iter()
            .flatten()
            .map(|p| (p.clone(), p.is_file()))
            .collect()
    }
}
