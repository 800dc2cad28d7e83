//! Request-scoped temporary files.
//!
//! Uploaded images and exported record sets are written under a fixed
//! staging root. Each file is owned by a [`StagedFile`] and removed when
//! the handle drops, so early returns, panics and cancelled requests all
//! clean up after themselves.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tokio::io::AsyncWriteExt;

/// Kind of staged content. Selects the subdirectory and file naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagingKind {
    /// Raw image bytes from an HTTP upload.
    Images,
    /// JSON record set handed to the gallery writer.
    Embeddings,
}

impl StagingKind {
    /// Subdirectory under the staging root.
    #[must_use]
    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::Images => "temp-images",
            Self::Embeddings => "temp-embeddings",
        }
    }

    const fn prefix(self) -> &'static str {
        match self {
            Self::Images => "upload-",
            Self::Embeddings => "embeddings-",
        }
    }

    const fn suffix(self) -> &'static str {
        match self {
            Self::Images => ".jpeg",
            Self::Embeddings => ".json",
        }
    }
}

/// A staged file, deleted on drop.
#[derive(Debug)]
pub struct StagedFile {
    path: TempPath,
}

impl StagedFile {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AsRef<Path> for StagedFile {
    fn as_ref(&self) -> &Path {
        self.path()
    }
}

/// Root of the staging directories.
#[derive(Debug, Clone)]
pub struct StagingArea {
    root: PathBuf,
}

impl StagingArea {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding files of `kind`.
    #[must_use]
    pub fn dir(&self, kind: StagingKind) -> PathBuf {
        self.root.join(kind.dir_name())
    }

    /// Creates both staging directories if they are missing. Called once at
    /// startup; [`acquire`](Self::acquire) never creates directories.
    pub async fn ensure_dirs(&self) -> io::Result<()> {
        for kind in [StagingKind::Images, StagingKind::Embeddings] {
            tokio::fs::create_dir_all(self.dir(kind)).await?;
        }
        Ok(())
    }

    /// Writes `contents` to a fresh, uniquely named file of `kind`.
    ///
    /// # Errors
    ///
    /// Fails when the staging directory is missing or unwritable, or when
    /// the write does not complete. No file is left behind in that case.
    pub async fn acquire(&self, kind: StagingKind, contents: &[u8]) -> io::Result<StagedFile> {
        let dir = self.dir(kind);
        let (file, path) = tempfile::Builder::new()
            .prefix(kind.prefix())
            .suffix(kind.suffix())
            .tempfile_in(&dir)?
            .into_parts();

        // From here on the path is removed on drop, including when the
        // write below fails or this future is cancelled. Writes go through
        // the open handle so a cancelled write cannot recreate the path.
        let staged = StagedFile { path };
        let mut file = tokio::fs::File::from_std(file);
        file.write_all(contents).await?;
        file.flush().await?;

        tracing::trace!(path = %staged.path().display(), bytes = contents.len(), "staged file");
        Ok(staged)
    }
}
