// githook/src/run.rs

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::{
    error::{InstallError, Result},
    hook_name::HookName,
    installer::HookInstaller,
    locator::locate_hooks_dir,
    script::{resolve_external, resolve_inline},
};

/// Everything one run needs, with paths already absolute.
#[derive(Clone, Debug, Default)]
pub struct InstallOptions {
    pub skip: bool,
    pub project_root: PathBuf,
    /// Discovery of the enclosing repository starts here.
    pub build_directory: PathBuf,
    pub ceiling_directories: Vec<PathBuf>,
    pub hooks: IndexMap<String, String>,
    pub resource_hooks: IndexMap<String, String>,
}

impl InstallOptions {
    /// Options rooted at `project_root`, which is also where discovery starts.
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        Self { build_directory: project_root.clone(), project_root, ..Default::default() }
    }

    pub fn build_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.build_directory = dir.into();
        self
    }

    pub fn ceiling(mut self, dir: impl Into<PathBuf>) -> Self {
        self.ceiling_directories.push(dir.into());
        self
    }

    pub fn skip(mut self, skip: bool) -> Self {
        self.skip = skip;
        self
    }

    pub fn hook(mut self, name: impl Into<String>, script: impl Into<String>) -> Self {
        self.hooks.insert(name.into(), script.into());
        self
    }

    pub fn resource_hook(mut self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.resource_hooks.insert(name.into(), path.into());
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookSource { Inline, Resource }

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledHook {
    pub name: HookName,
    pub path: PathBuf,
    pub source: HookSource,
}

/// What a run did.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallReport {
    pub skipped_run: bool,
    pub hooks_dir: Option<PathBuf>,
    /// In write order; a name may appear twice when both maps define it.
    pub installed: Vec<InstalledHook>,
    /// Entries ignored because of an unknown hook name.
    pub skipped: Vec<String>,
}

/// Installs every configured hook: the inline map first, then the resource map.
///
/// Unknown hook names are logged and skipped. Any other failure stops the run;
/// hooks written before it stay in place.
pub fn run(opts: &InstallOptions) -> Result<InstallReport> {
    let mut report = InstallReport::default();
    if opts.skip {
        info!("Skipping githook execution");
        report.skipped_run = true;
        return Ok(report);
    }

    let Some(hooks_dir) = locate_hooks_dir(&opts.build_directory, &opts.ceiling_directories) else {
        info!("No .git directory found, skipping hook installation");
        return Err(InstallError::RepositoryNotFound { start: opts.build_directory.clone() });
    };
    report.hooks_dir = Some(hooks_dir.clone());

    let installer = HookInstaller::new();
    install_inline(&installer, &hooks_dir, &opts.hooks, &mut report)?;
    install_resources(&installer, &hooks_dir, &opts.project_root, &opts.resource_hooks, &mut report)?;
    Ok(report)
}

fn checked_name(name: &str, report: &mut InstallReport) -> Option<HookName> {
    match name.parse::<HookName>() {
        Ok(h) => Some(h),
        Err(e) => {
            error!("{e}");
            report.skipped.push(name.to_string());
            None
        }
    }
}

fn install_inline(
    installer: &HookInstaller,
    hooks_dir: &Path,
    hooks: &IndexMap<String, String>,
    report: &mut InstallReport,
) -> Result<()> {
    if hooks.is_empty() {
        info!("hooks is empty, skip...");
        return Ok(());
    }
    for (name, script) in hooks {
        let Some(hook) = checked_name(name, report) else { continue };
        let path = hooks_dir.join(hook.as_str());
        info!(hook = %hook, "Installing {} hook into {}", hook, hooks_dir.display());
        installer.install(hook.as_str(), &path, &resolve_inline(script))?;
        report.installed.push(InstalledHook { name: hook, path, source: HookSource::Inline });
    }
    Ok(())
}

fn install_resources(
    installer: &HookInstaller,
    hooks_dir: &Path,
    project_root: &Path,
    resources: &IndexMap<String, String>,
    report: &mut InstallReport,
) -> Result<()> {
    if resources.is_empty() {
        info!("resource-hooks is empty, skip...");
        return Ok(());
    }
    for (name, file) in resources {
        let Some(hook) = checked_name(name, report) else { continue };
        info!(hook = %hook, "Installing {} from {}", hook, file);
        let bytes = resolve_external(hook.as_str(), Path::new(file), project_root)?;
        let path = hooks_dir.join(hook.as_str());
        installer.install(hook.as_str(), &path, &bytes)?;
        report.installed.push(InstalledHook { name: hook, path, source: HookSource::Resource });
    }
    Ok(())
}
