//! Build-context lifecycle and path-scoped operations.

use crate::digest::{Digest, Version};
use crate::error::{Error, Result};
use crate::header::EntryHeader;
use crate::scope;
use crate::scratch::{ScratchDir, SystemScratch};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

/// Abstract build-source contract consumed by the builder pipeline.
///
/// Digests are opaque tokens: a build step is reusable when the digest of
/// every input file matches the digest recorded by the previous build.
pub trait BuildSource {
    /// Digest of the entry at `path`, relative to the source root.
    fn hash(&self, path: &str) -> Result<Digest>;

    /// Delete the file or directory at `path`.
    fn remove(&self, path: &str) -> Result<()>;

    /// Release the backing storage.
    fn close(&self) -> Result<()>;
}

/// A build context materialized from an archive stream.
///
/// Owns its root directory exclusively from construction until [`close`]
/// deletes it. The filesystem is the source of truth: no in-memory index is
/// kept, and digests always reflect the on-disk state at call time.
///
/// [`close`]: BuildContext::close
#[derive(Debug)]
pub struct BuildContext {
    root: PathBuf,
    closed: AtomicBool,
}

impl BuildContext {
    /// Materialize a tar stream into a fresh scratch directory.
    ///
    /// The stream is drained exactly once. On extraction failure the
    /// partially created directory is removed before the error is returned,
    /// so a half-usable context is never handed out.
    pub fn from_archive<R: Read>(stream: R) -> Result<Self> {
        Self::from_archive_in(stream, &SystemScratch)
    }

    /// Materialize a tar stream into a directory obtained from `scratch`.
    pub fn from_archive_in<R: Read>(stream: R, scratch: &dyn ScratchDir) -> Result<Self> {
        let root = scratch.allocate().map_err(Error::construction)?;

        let mut archive = tar::Archive::new(stream);
        if let Err(source) = archive.unpack(&root) {
            if let Err(err) = fs::remove_dir_all(&root) {
                warn!(root = %root.display(), %err, "failed to clean up partial build context");
            }
            return Err(Error::construction(source));
        }

        debug!(root = %root.display(), "materialized build context");
        Ok(BuildContext {
            root,
            closed: AtomicBool::new(false),
        })
    }

    /// Wrap an existing directory as a context root.
    ///
    /// The context takes ownership of the directory: `close` (or drop)
    /// deletes it.
    pub fn from_root(root: impl Into<PathBuf>) -> Self {
        BuildContext {
            root: root.into(),
            closed: AtomicBool::new(false),
        }
    }

    /// The context root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Digest the entry at `path` under the default scheme.
    pub fn hash(&self, path: &str) -> Result<Digest> {
        self.hash_with(Version::default(), path)
    }

    /// Digest the entry at `path` under an explicit scheme version.
    ///
    /// The canonical entry header is fed to the accumulator first, then the
    /// content is streamed through it, so peak memory stays constant
    /// regardless of file size. A read failure aborts the whole operation;
    /// a partial digest is never returned.
    pub fn hash_with(&self, version: Version, path: &str) -> Result<Digest> {
        let (full, name) = scope::resolve(&self.root, path)?;
        let metadata =
            fs::symlink_metadata(&full).map_err(|source| Error::from_io_at(source, &full))?;

        let header = EntryHeader::for_entry(&name, &full, &metadata)?;
        let mut acc = version.accumulator();
        header.write_to(&mut acc)?;

        if metadata.is_file() {
            let mut file = File::open(&full).map_err(|source| Error::from_io_at(source, &full))?;
            io::copy(&mut file, &mut acc)?;
        }

        Ok(acc.finalize())
    }

    /// Open the file at `path` for reading.
    pub fn open(&self, path: &str) -> Result<File> {
        let (full, _) = scope::resolve(&self.root, path)?;
        File::open(&full).map_err(|source| Error::from_io_at(source, &full))
    }

    /// Delete the file or directory at `path`.
    ///
    /// Directories are removed recursively. Removing a path that does not
    /// exist succeeds, keeping removal idempotent.
    pub fn remove(&self, path: &str) -> Result<()> {
        let (full, name) = scope::resolve(&self.root, path)?;

        let metadata = match fs::symlink_metadata(&full) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(err.into()),
        };

        if metadata.is_dir() {
            fs::remove_dir_all(&full)?;
        } else {
            fs::remove_file(&full)?;
        }

        debug!(root = %self.root.display(), path = name.as_str(), "removed path from build context");
        Ok(())
    }

    /// Delete the whole context tree.
    ///
    /// Idempotent: closing an already-closed context succeeds, since the
    /// post-condition (root absent) already holds.
    pub fn close(&self) -> Result<()> {
        match fs::remove_dir_all(&self.root) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }

        self.closed.store(true, Ordering::Relaxed);
        debug!(root = %self.root.display(), "closed build context");
        Ok(())
    }
}

impl BuildSource for BuildContext {
    fn hash(&self, path: &str) -> Result<Digest> {
        BuildContext::hash(self, path)
    }

    fn remove(&self, path: &str) -> Result<()> {
        BuildContext::remove(self, path)
    }

    fn close(&self) -> Result<()> {
        BuildContext::close(self)
    }
}

impl Drop for BuildContext {
    /// Backstop so the scratch directory is not leaked when the caller
    /// unwinds before calling `close`.
    fn drop(&mut self) {
        if self.closed.load(Ordering::Relaxed) {
            return;
        }
        if let Err(err) = fs::remove_dir_all(&self.root) {
            if err.kind() != io::ErrorKind::NotFound {
                warn!(root = %self.root.display(), %err, "failed to release build context");
            }
        }
    }
}
