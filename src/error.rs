// githook/src/error.rs

use std::path::PathBuf;

/// Errors raised while installing hooks.
///
/// Everything except [`InstallError::InvalidHookName`] aborts the run.
#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    /// No Git metadata directory in the start path or any ancestor.
    #[error("not a git repository, could not find a .git/hooks directory anywhere in the hierarchy of {}", .start.display())]
    RepositoryNotFound { start: PathBuf },

    /// Name outside the fixed set of Git hook names.
    #[error("`{name}` hook is not a valid git-hook name")]
    InvalidHookName { name: String },

    /// External hook file resolves outside the project root.
    #[error("only files inside the project can be used to generate git hooks: `{hook}` points at {} (project root {})", .path.display(), .root.display())]
    PathEscape { hook: String, path: PathBuf, root: PathBuf },

    #[error("could not access hook resource for `{hook}`: {}", .path.display())]
    Read {
        hook: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not write hook with name `{hook}` to {}", .path.display())]
    Write {
        hook: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Content was written but the permission bits could not be set.
    /// The file is left in place.
    #[error("could not set permissions on created file {}", .path.display())]
    Permission {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = InstallError> = std::result::Result<T, E>;
