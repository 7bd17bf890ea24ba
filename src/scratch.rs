//! Scratch-directory allocation for build contexts.

use std::io;
use std::path::PathBuf;

/// Allocates exclusively-owned scratch directories.
///
/// Construction needs a fresh directory guaranteed not to collide with any
/// other context instance. The allocator is injectable so tests can supply
/// deterministic locations; production uses the host temp-directory
/// facility via [`SystemScratch`].
pub trait ScratchDir {
    /// Create a fresh directory owned by the caller.
    fn allocate(&self) -> io::Result<PathBuf>;
}

/// Allocates unique directories under the system temp root.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemScratch;

impl ScratchDir for SystemScratch {
    fn allocate(&self) -> io::Result<PathBuf> {
        let dir = tempfile::Builder::new().prefix("ctxsum-").tempdir()?;
        // The context owns deletion from here on.
        Ok(dir.keep())
    }
}
