//! # ctxsum
//!
//! A content-addressed build-context store with deterministic per-file
//! digests.
//!
//! A build context is a directory tree materialized from an uploaded tar
//! stream. This library owns that tree for the duration of a build: it
//! computes a stable digest for any path inside it (header metadata +
//! content, so re-serializing the entry cannot change the digest), deletes
//! individual paths, and tears the whole tree down when the build is done.
//! The digests drive incremental layer caching: a build step is reusable
//! when its input digests match the previous build's.
//!
//! ## Example
//!
//! ```no_run
//! use ctxsum::BuildContext;
//! use std::fs::File;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Materialize an uploaded context into a scratch directory
//! let context = BuildContext::from_archive(File::open("context.tar")?)?;
//!
//! // Fingerprint a file to decide whether a cached layer can be reused
//! let digest = context.hash("Dockerfile")?;
//! println!("Dockerfile: {}", digest);
//!
//! // Drop a file the build must not see
//! context.remove(".dockerignore")?;
//!
//! // Release the backing directory
//! context.close()?;
//! # Ok(())
//! # }
//! ```

mod context;
mod digest;
mod error;
mod header;
mod scope;
mod scratch;

pub use context::{BuildContext, BuildSource};
pub use digest::{DIGEST_SIZE, Digest, Version};
pub use error::{Error, Result};
pub use header::{EntryHeader, EntryKind};
pub use scratch::{ScratchDir, SystemScratch};
