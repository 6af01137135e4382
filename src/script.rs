// githook/src/script.rs

use std::{
    fs,
    path::{Component, Path, PathBuf},
};

use crate::error::{InstallError, Result};

#[cfg(windows)]
pub const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_ENDING: &str = "\n";

pub const DEFAULT_INTERPRETER: &str = "#!/bin/sh";

/// Builds the script for an inline hook: a `#!/bin/sh` line is prepended unless
/// the text already declares an interpreter, and a line terminator is appended.
pub fn resolve_inline(script: &str) -> Vec<u8> {
    let mut out = String::with_capacity(script.len() + DEFAULT_INTERPRETER.len() + 2 * LINE_ENDING.len());
    if !script.starts_with("#!") {
        out.push_str(DEFAULT_INTERPRETER);
        out.push_str(LINE_ENDING);
    }
    out.push_str(script);
    out.push_str(LINE_ENDING);
    out.into_bytes()
}

/// Reads an external hook file that must live inside `project_root`.
///
/// Lines are rejoined with `\n`; no shebang or trailing newline is added.
pub fn resolve_external(hook: &str, path: &Path, project_root: &Path) -> Result<Vec<u8>> {
    let file = contained_path(hook, path, project_root)?;
    let text = fs::read_to_string(&file).map_err(|source| InstallError::Read {
        hook: hook.to_string(),
        path: file.clone(),
        source,
    })?;
    Ok(join_lines(&text).into_bytes())
}

/// Splits on `\r\n`, `\n` or a lone `\r` and rejoins with `\n`. A final
/// terminator does not produce an empty last line.
fn join_lines(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    unified.lines().collect::<Vec<_>>().join("\n")
}

/// Resolves `path` against `project_root` and checks it stays inside it,
/// both lexically and, when the file exists, after following symlinks.
pub fn contained_path(hook: &str, path: &Path, project_root: &Path) -> Result<PathBuf> {
    let root = normalize(&absolute(project_root));
    let candidate = normalize(&root.join(path));
    let escape = || InstallError::PathEscape {
        hook: hook.to_string(),
        path: path.to_path_buf(),
        root: root.clone(),
    };

    if !candidate.starts_with(&root) {
        return Err(escape());
    }
    if let (Ok(real), Ok(real_root)) = (candidate.canonicalize(), root.canonicalize()) {
        if !real.starts_with(&real_root) {
            return Err(escape());
        }
    }
    Ok(candidate)
}

fn absolute(p: &Path) -> PathBuf {
    std::path::absolute(p).unwrap_or_else(|_| p.to_path_buf())
}

/// Collapses `.` and `..` without touching the filesystem.
fn normalize(p: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for c in p.components() {
        match c {
            Component::CurDir => {}
            Component::ParentDir => {
                // never pops past the root or a prefix
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
