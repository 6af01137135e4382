// githook/src/locator.rs

use git2::{ErrorCode, Repository, RepositoryOpenFlags};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, error, info, warn};

/// Finds the Git metadata directory for `start` (or its nearest ancestor that
/// exists) and returns `<git-dir>/hooks`, creating it when missing.
///
/// Discovery never ascends past any of `ceilings`. For linked worktrees the
/// hooks directory of the common git dir is returned, since that is where Git
/// looks for hooks.
///
/// `None` means there is no usable hooks directory: either no repository was
/// found, or the directory could not be created.
pub fn locate_hooks_dir(start: &Path, ceilings: &[PathBuf]) -> Option<PathBuf> {
    debug!("Searching for .git directory starting at {}", start.display());
    let git_dir = find_git_dir(start, ceilings)?;

    let hooks = git_dir.join("hooks");
    if !hooks.exists() {
        info!("Creating missing hooks directory at {}", hooks.display());
        if let Err(e) = fs::create_dir_all(&hooks) {
            error!(path = %hooks.display(), "could not create hooks directory: {e}");
            return None;
        }
    }
    Some(hooks)
}

/// Returns the metadata directory (`.git`, or the repository itself when bare).
pub fn find_git_dir(start: &Path, ceilings: &[PathBuf]) -> Option<PathBuf> {
    // libgit2 refuses to start from a path that does not exist yet, e.g. a
    // build directory before the first build.
    let existing = start.ancestors().find(|p| p.exists())?;
    match Repository::open_ext(existing, RepositoryOpenFlags::empty(), ceilings) {
        Ok(repo) => Some(repo.commondir().to_path_buf()),
        // Ownership only matters for running the repository's own hooks and
        // config; installing hooks just needs the path.
        Err(e) if e.code() == ErrorCode::Owner => {
            warn!(start = %existing.display(), "{}; locating the git dir without libgit2", e.message());
            walk_for_git_dir(existing, ceilings)
        }
        Err(e) => {
            debug!(start = %existing.display(), "no repository found: {}", e.message());
            None
        }
    }
}

/// Plain filesystem walk used when libgit2 refuses to open the repository.
/// Like libgit2, ceiling directories are not examined unless they are `start`.
fn walk_for_git_dir(start: &Path, ceilings: &[PathBuf]) -> Option<PathBuf> {
    for dir in start.ancestors() {
        if dir != start && ceilings.iter().any(|c| c == dir) {
            break;
        }
        let dot_git = dir.join(".git");
        if is_git_dir(&dot_git) {
            return Some(common_dir(&dot_git));
        }
        if dot_git.is_file() {
            if let Some(git_dir) = read_gitdir_file(&dot_git) {
                return Some(common_dir(&git_dir));
            }
        }
        if is_git_dir(dir) {
            return Some(common_dir(dir));
        }
    }
    None
}

fn is_git_dir(p: &Path) -> bool {
    if !p.join("HEAD").is_file() {
        return false;
    }
    // linked worktree git dirs keep objects/refs in the common dir
    p.join("commondir").is_file() || (p.join("objects").is_dir() && p.join("refs").is_dir())
}

/// `.git` files written by `git worktree` and submodules: `gitdir: <path>`.
fn read_gitdir_file(dot_git: &Path) -> Option<PathBuf> {
    let text = fs::read_to_string(dot_git).ok()?;
    let target = text.lines().find_map(|l| l.strip_prefix("gitdir:"))?.trim();
    let base = dot_git.parent()?;
    let git_dir = base.join(target);
    is_git_dir(&git_dir).then_some(git_dir)
}

fn common_dir(git_dir: &Path) -> PathBuf {
    fs::read_to_string(git_dir.join("commondir"))
        .ok()
        .map(|c| git_dir.join(c.trim()))
        .unwrap_or_else(|| git_dir.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ceiling_for(tmp: &TempDir) -> Vec<PathBuf> {
        tmp.path().parent().map(Path::to_path_buf).into_iter().collect()
    }

    #[test]
    fn finds_repository_from_nested_directory() {
        let tmp = TempDir::new().unwrap();
        Repository::init(tmp.path()).unwrap();
        let nested = tmp.path().join("target").join("classes");
        fs::create_dir_all(&nested).unwrap();

        let hooks = locate_hooks_dir(&nested, &ceiling_for(&tmp)).unwrap();
        assert!(hooks.is_dir());
        assert!(hooks.ends_with(".git/hooks"));
        assert_eq!(
            hooks.canonicalize().unwrap(),
            tmp.path().join(".git/hooks").canonicalize().unwrap()
        );
    }

    #[test]
    fn creates_missing_hooks_directory() {
        let tmp = TempDir::new().unwrap();
        Repository::init(tmp.path()).unwrap();
        let hooks = tmp.path().join(".git/hooks");
        let _ = fs::remove_dir_all(&hooks);
        assert!(!hooks.exists());

        let found = locate_hooks_dir(tmp.path(), &ceiling_for(&tmp)).unwrap();
        assert!(found.is_dir());
        assert!(hooks.is_dir());
    }

    #[test]
    fn start_path_may_not_exist_yet() {
        let tmp = TempDir::new().unwrap();
        Repository::init(tmp.path()).unwrap();
        let missing = tmp.path().join("target").join("not-built-yet");

        assert!(locate_hooks_dir(&missing, &ceiling_for(&tmp)).is_some());
        assert!(!missing.exists());
    }

    #[test]
    fn bare_repository_uses_its_own_hooks_directory() {
        let tmp = TempDir::new().unwrap();
        let bare = tmp.path().join("origin.git");
        Repository::init_bare(&bare).unwrap();

        let hooks = locate_hooks_dir(&bare, &ceiling_for(&tmp)).unwrap();
        assert_eq!(
            hooks.canonicalize().unwrap(),
            bare.join("hooks").canonicalize().unwrap()
        );
    }

    #[test]
    fn returns_none_outside_any_repository() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("plain");
        fs::create_dir_all(&dir).unwrap();

        assert!(find_git_dir(&dir, &ceiling_for(&tmp)).is_none());
        assert!(locate_hooks_dir(&dir, &ceiling_for(&tmp)).is_none());
    }

    #[test]
    fn empty_dot_git_directory_is_not_a_repository() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join(".git")).unwrap();

        assert!(locate_hooks_dir(tmp.path(), &ceiling_for(&tmp)).is_none());
        assert!(!tmp.path().join(".git/hooks").exists());
    }

    #[test]
    fn fallback_walk_agrees_with_libgit2() {
        let tmp = TempDir::new().unwrap();
        Repository::init(tmp.path()).unwrap();
        let nested = tmp.path().join("src").join("main");
        fs::create_dir_all(&nested).unwrap();

        let walked = walk_for_git_dir(&nested, &ceiling_for(&tmp)).unwrap();
        let opened = find_git_dir(&nested, &ceiling_for(&tmp)).unwrap();
        assert_eq!(walked.canonicalize().unwrap(), opened.canonicalize().unwrap());
    }

    #[test]
    fn fallback_walk_follows_worktree_gitdir_files() {
        let tmp = TempDir::new().unwrap();
        let main = tmp.path().join("main");
        Repository::init(&main).unwrap();
        let wt_git = main.join(".git").join("worktrees").join("wt");
        fs::create_dir_all(&wt_git).unwrap();
        fs::write(wt_git.join("HEAD"), "ref: refs/heads/wt\n").unwrap();
        fs::write(wt_git.join("commondir"), "../..\n").unwrap();
        let wt = tmp.path().join("wt");
        fs::create_dir_all(&wt).unwrap();
        fs::write(wt.join(".git"), "gitdir: ../main/.git/worktrees/wt\n").unwrap();

        let walked = walk_for_git_dir(&wt, &ceiling_for(&tmp)).unwrap();
        assert_eq!(walked.canonicalize().unwrap(), main.join(".git").canonicalize().unwrap());
    }

    #[test]
    fn fallback_walk_stops_at_ceiling() {
        let tmp = TempDir::new().unwrap();
        Repository::init(tmp.path()).unwrap();
        let inner = tmp.path().join("a").join("b");
        fs::create_dir_all(&inner).unwrap();

        let ceilings = vec![tmp.path().join("a")];
        assert!(walk_for_git_dir(&inner, &ceilings).is_none());
    }

    #[cfg(unix)]
    fn chown_tree(path: &Path, uid: u32) -> std::io::Result<()> {
        std::os::unix::fs::lchown(path, Some(uid), Some(uid))?;
        if fs::symlink_metadata(path)?.is_dir() {
            for e in fs::read_dir(path)? {
                chown_tree(&e?.path(), uid)?;
            }
        }
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn repository_owned_by_another_user_is_still_found() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("p");
        Repository::init(&root).unwrap();
        // changing ownership needs root; nothing to check otherwise
        if chown_tree(&root, 1234).is_err() {
            return;
        }

        let hooks = locate_hooks_dir(&root, &ceiling_for(&tmp)).expect(".git exists");
        assert_eq!(
            hooks.canonicalize().unwrap(),
            root.join(".git/hooks").canonicalize().unwrap()
        );
    }

    #[cfg(unix)]
    #[test]
    fn uncreatable_hooks_directory_counts_as_not_found() {
        let tmp = TempDir::new().unwrap();
        Repository::init(tmp.path()).unwrap();
        let hooks = tmp.path().join(".git/hooks");
        let _ = fs::remove_dir_all(&hooks);
        // dangling: exists() is false and create_dir_all fails
        std::os::unix::fs::symlink(tmp.path().join("nowhere/hooks"), &hooks).unwrap();

        assert!(find_git_dir(tmp.path(), &ceiling_for(&tmp)).is_some());
        assert!(locate_hooks_dir(tmp.path(), &ceiling_for(&tmp)).is_none());
        assert!(!tmp.path().join("nowhere").exists());
    }
}
