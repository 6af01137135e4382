// githook/src/installer.rs

use parking_lot::Mutex;
use std::{
    collections::HashMap,
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::debug;

use crate::error::{InstallError, Result};

/// Writes hook files. "Write + set permissions" is one unit per destination:
/// two installs to the same path never interleave, different paths proceed
/// independently.
#[derive(Default)]
pub struct HookInstaller {
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl HookInstaller {
    pub fn new() -> Self { Self::default() }

    fn lock_for(&self, path: &Path) -> Arc<Mutex<()>> {
        self.locks.lock().entry(path.to_path_buf()).or_default().clone()
    }

    /// Creates or truncates `path`, writes `bytes`, then makes the file
    /// readable, writable and executable by its owner.
    ///
    /// A permission failure leaves the written content in place.
    pub fn install(&self, hook: &str, path: &Path, bytes: &[u8]) -> Result<()> {
        let lock = self.lock_for(path);
        let _guard = lock.lock();

        write_all(path, bytes).map_err(|source| InstallError::Write {
            hook: hook.to_string(),
            path: path.to_path_buf(),
            source,
        })?;
        make_owner_executable(path).map_err(|source| InstallError::Permission {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(hook, path = %path.display(), bytes = bytes.len(), "hook written");
        Ok(())
    }
}

fn write_all(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut f = OpenOptions::new().write(true).create(true).truncate(true).open(path)?;
    f.write_all(bytes)?;
    f.flush()
}

#[cfg(unix)]
fn make_owner_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perm = fs::metadata(path)?.permissions();
    perm.set_mode(perm.mode() | 0o700);
    fs::set_permissions(path, perm)
}

// Windows has no execute bit; the best we can do is keep the file writable.
#[cfg(not(unix))]
fn make_owner_executable(path: &Path) -> std::io::Result<()> {
    let mut perm = fs::metadata(path)?.permissions();
    #[allow(clippy::permissions_set_readonly_false)]
    perm.set_readonly(false);
    fs::set_permissions(path, perm)
}
