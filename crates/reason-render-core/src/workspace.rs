//! Ephemeral compilation workspaces.
//!
//! Every compile-and-bundle cycle runs in its own directory directly under a
//! sandbox root:
//!
//! ```text
//! .reason-render/
//! └── workspaces/                   # sandbox root
//!     └── snippet-<uuid>/           # one workspace
//!         ├── bsconfig.json
//!         ├── Snippet.re
//!         ├── Snippet.bs.js         # compiler output
//!         ├── embed.js              # prelude, bundler entry
//!         └── compiled.js           # bundler output
//! ```
//!
//! Paths are checked lexically against the root before anything touches the
//! filesystem, and again before the directory is removed.

use std::path::{Component, Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use crate::error::{Error, Result};

/// An isolated directory for one compilation.
#[derive(Debug)]
pub struct Workspace {
    id: String,
    root: PathBuf,
    dir: PathBuf,
}

impl Workspace {
    /// Create (or reuse) the workspace `id` under `root`.
    ///
    /// Succeeds silently if the directory already exists.
    ///
    /// # Errors
    /// Returns [`Error::PathEscape`] without creating anything if `id`
    /// resolves outside of `root`, or [`Error::Filesystem`] if the directory
    /// cannot be created.
    pub async fn acquire(root: impl AsRef<Path>, id: &str) -> Result<Self> {
        let root = absolute(root.as_ref())?;
        let dir = contained_path(&root, Path::new(id))?;

        fs::create_dir_all(&dir)
            .await
            .map_err(|e| Error::fs(&dir, e))?;

        tracing::debug!("Acquired workspace {}", dir.display());

        Ok(Self {
            id: id.to_string(),
            root,
            dir,
        })
    }

    /// Create a workspace with a freshly generated identifier.
    ///
    /// Unique identifiers keep concurrent compilations under the same root
    /// apart.
    pub async fn acquire_unique(root: impl AsRef<Path>) -> Result<Self> {
        let id = format!("snippet-{}", Uuid::new_v4().simple());
        Self::acquire(root, &id).await
    }

    /// Workspace identifier (the directory name under the root).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Absolute path of the workspace directory.
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// The sandbox root this workspace lives in.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a path relative to the workspace, refusing escapes.
    pub fn resolve(&self, relative: impl AsRef<Path>) -> Result<PathBuf> {
        contained_path(&self.dir, relative.as_ref())
    }

    /// Write a file inside the workspace.
    pub async fn write(&self, relative: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Result<PathBuf> {
        let path = self.resolve(relative)?;
        fs::write(&path, contents)
            .await
            .map_err(|e| Error::fs(&path, e))?;
        Ok(path)
    }

    /// Read a UTF-8 file from the workspace.
    pub async fn read_to_string(&self, relative: impl AsRef<Path>) -> Result<String> {
        let path = self.resolve(relative)?;
        fs::read_to_string(&path)
            .await
            .map_err(|e| Error::fs(&path, e))
    }

    /// Recursively delete the workspace.
    ///
    /// The containment check is repeated first; a directory that is already
    /// gone is not an error.
    pub async fn release(self) -> Result<()> {
        let dir = contained_path(&self.root, &self.dir)?;

        match fs::remove_dir_all(&dir).await {
            Ok(()) => {
                tracing::debug!("Released workspace {}", dir.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::fs(dir, e)),
        }
    }
}

/// Join `candidate` onto `root` and require the normalized result to lie
/// strictly beneath the normalized root.
///
/// Absolute candidates are checked as-is.
pub fn contained_path(root: &Path, candidate: &Path) -> Result<PathBuf> {
    let root = normalize(root);
    let path = normalize(&root.join(candidate));

    if path != root && path.starts_with(&root) {
        Ok(path)
    } else {
        Err(Error::PathEscape { path, root })
    }
}

/// Lexically resolve `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path)
        .map(|p| normalize(&p))
        .map_err(|e| Error::fs(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_acquire_creates_directory() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let root = temp.path().join("workspaces");

        let workspace = Workspace::acquire(&root, "tmp").await.expect("acquire");

        assert!(workspace.path().is_dir());
        assert!(workspace.path().ends_with("workspaces/tmp"));
        assert_eq!(workspace.id(), "tmp");
    }

    #[tokio::test]
    async fn test_acquire_twice_is_idempotent() {
        let temp = TempDir::new().expect("Failed to create temp dir");

        let first = Workspace::acquire(temp.path(), "tmp").await.expect("first");
        first.write("keep.txt", "kept").await.expect("write");
        let second = Workspace::acquire(temp.path(), "tmp").await.expect("second");

        assert_eq!(first.path(), second.path());
        assert!(second.path().join("keep.txt").exists());
    }

    #[tokio::test]
    async fn test_escape_is_rejected_before_creating_anything() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let root = temp.path().join("sandbox");

        let err = Workspace::acquire(&root, "../../etc").await.unwrap_err();

        assert!(matches!(err, Error::PathEscape { .. }));
        assert!(!root.exists());
    }

    #[tokio::test]
    async fn test_root_itself_is_not_a_workspace() {
        let temp = TempDir::new().expect("Failed to create temp dir");

        for id in [".", "a/..", ""] {
            let err = Workspace::acquire(temp.path(), id).await.unwrap_err();
            assert!(matches!(err, Error::PathEscape { .. }), "id {id:?}");
        }
    }

    #[tokio::test]
    async fn test_release_removes_nested_directories() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let workspace = Workspace::acquire(temp.path(), "tmp").await.expect("acquire");

        let nested = workspace.path().join("lib").join("bs").join("src");
        std::fs::create_dir_all(&nested).expect("Failed to create nested dirs");
        std::fs::write(nested.join("Snippet.cmj"), "x").expect("Failed to write");
        workspace.write("Snippet.re", "let x = 1;").await.expect("write");

        let dir = workspace.path().to_path_buf();
        workspace.release().await.expect("release");

        assert!(!dir.exists());
        assert!(temp.path().exists());
    }

    #[tokio::test]
    async fn test_release_of_missing_directory_is_ok() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let workspace = Workspace::acquire(temp.path(), "tmp").await.expect("acquire");

        std::fs::remove_dir(workspace.path()).expect("Failed to remove");
        workspace.release().await.expect("release");
    }

    #[tokio::test]
    async fn test_release_revalidates_containment() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let outside = temp.path().join("outside");
        std::fs::create_dir_all(&outside).expect("Failed to create dir");

        let mut workspace = Workspace::acquire(temp.path().join("root"), "tmp")
            .await
            .expect("acquire");
        workspace.dir = outside.clone();

        let err = workspace.release().await.unwrap_err();
        assert!(matches!(err, Error::PathEscape { .. }));
        assert!(outside.exists());
    }

    #[tokio::test]
    async fn test_unique_workspaces_differ() {
        let temp = TempDir::new().expect("Failed to create temp dir");

        let a = Workspace::acquire_unique(temp.path()).await.expect("a");
        let b = Workspace::acquire_unique(temp.path()).await.expect("b");

        assert_ne!(a.path(), b.path());
        assert!(a.id().starts_with("snippet-"));
    }

    #[tokio::test]
    async fn test_resolve_refuses_escape() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let workspace = Workspace::acquire(temp.path(), "tmp").await.expect("acquire");

        assert!(workspace.resolve("Snippet.re").is_ok());
        assert!(matches!(
            workspace.resolve("../other/file"),
            Err(Error::PathEscape { .. })
        ));
        assert!(matches!(
            workspace.write("/etc/passwd", "x").await,
            Err(Error::PathEscape { .. })
        ));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/b/../c/./d")), PathBuf::from("/a/c/d"));
        assert_eq!(normalize(Path::new("a/../../b")), PathBuf::from("../b"));
    }
}
