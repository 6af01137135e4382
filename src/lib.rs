pub mod error;
pub mod hook_name;
pub mod installer;
pub mod layered_config;
pub mod locator;
pub mod run;
pub mod script;

pub use error::InstallError;
pub use hook_name::{HookName, is_valid_hook_name};
pub use installer::HookInstaller;
pub use layered_config::{Config, ConfigManager, GitHookConfig};
pub use locator::locate_hooks_dir;
pub use run::{HookSource, InstallOptions, InstallReport, InstalledHook, run};
pub use script::{resolve_external, resolve_inline};
