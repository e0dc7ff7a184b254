//! Scoped per-request workspaces.
//!
//! Every request gets a private, uniquely named directory holding exactly the
//! transform's input and output files. The directory name is chosen and
//! created atomically (mkdtemp semantics), so concurrent acquisitions can
//! never collide; there is no check-then-create window. Removal is tied to
//! ownership: dropping the [`Workspace`] deletes the directory tree exactly
//! once, on every path out of a handler - normal return, validation failure,
//! `?` propagation, or unwind - and never fails the request.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::errors::Result;

/// A private directory scoped to one in-flight request.
pub struct Workspace {
    dir: TempDir,
    input: PathBuf,
    output: PathBuf,
}

impl Workspace {
    /// Where the ingestor writes the uploaded document.
    pub fn input_path(&self) -> &Path {
        &self.input
    }

    /// Where the tool writes the transformed document.
    pub fn output_path(&self) -> &Path {
        &self.output
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Source of per-request workspaces.
///
/// Abstracting the provider keeps the temp-directory namespace an injected
/// resource, so tests can point it at an isolated root and observe cleanup.
#[async_trait]
pub trait WorkspaceProvider: Send + Sync {
    /// Create a fresh workspace whose directory name starts with `prefix`.
    async fn acquire(&self, prefix: &str) -> Result<Workspace>;
}

/// Disk-backed provider rooted at the system temporary directory, or at a
/// configured override.
pub struct DiskWorkspaces {
    root: Option<PathBuf>,
}

impl DiskWorkspaces {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }
}

#[async_trait]
impl WorkspaceProvider for DiskWorkspaces {
    async fn acquire(&self, prefix: &str) -> Result<Workspace> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(prefix);

        let dir = match &self.root {
            Some(root) => {
                tokio::fs::create_dir_all(root).await?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };

        let input = dir.path().join("input.pdf");
        let output = dir.path().join("output.pdf");
        Ok(Workspace { dir, input, output })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_acquire_creates_prefixed_directory() {
        let root = tempfile::tempdir().unwrap();
        let provider = DiskWorkspaces::new(Some(root.path().to_path_buf()));

        let ws = provider.acquire("protect-").await.unwrap();

        assert!(ws.path().is_dir());
        assert!(ws.path().starts_with(root.path()));
        let name = ws.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("protect-"), "unexpected directory name: {name}");
        assert_eq!(ws.input_path(), ws.path().join("input.pdf").as_path());
        assert_eq!(ws.output_path(), ws.path().join("output.pdf").as_path());
    }

    #[tokio::test]
    async fn test_drop_removes_directory_and_contents() {
        let root = tempfile::tempdir().unwrap();
        let provider = DiskWorkspaces::new(Some(root.path().to_path_buf()));

        let ws = provider.acquire("unlock-").await.unwrap();
        let dir = ws.path().to_path_buf();
        tokio::fs::write(ws.input_path(), b"%PDF-1.4").await.unwrap();

        drop(ws);

        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_concurrent_acquisitions_never_collide() {
        let root = tempfile::tempdir().unwrap();
        let provider = Arc::new(DiskWorkspaces::new(Some(root.path().to_path_buf())));

        let mut handles = Vec::new();
        for _ in 0..50 {
            let provider = provider.clone();
            handles.push(tokio::spawn(async move { provider.acquire("protect-").await.unwrap() }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            let ws = handle.await.unwrap();
            assert!(seen.insert(ws.path().to_path_buf()), "duplicate workspace path");
        }
    }
}
