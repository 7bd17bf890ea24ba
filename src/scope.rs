//! Root-scoped path resolution.
//!
//! Every path handed to a build context is resolved lexically against the
//! root before any filesystem access. Parent-directory segments that would
//! climb above the root, absolute paths and drive prefixes are rejected
//! outright; rejection never touches storage.

use crate::error::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// Resolve `raw` against `root`, rejecting anything that escapes it.
///
/// Returns the absolute on-disk path together with the normalized relative
/// name (`/`-separated, interior `.`/`..` segments folded away). The name is
/// what the digest records as the archive entry name, so two spellings of
/// the same location always digest identically.
pub(crate) fn resolve(root: &Path, raw: &str) -> Result<(PathBuf, String)> {
    let mut parts: Vec<&str> = Vec::new();

    for component in Path::new(raw).components() {
        match component {
            Component::Normal(part) => {
                let part = part
                    .to_str()
                    .ok_or_else(|| Error::invalid_path(raw, "not valid UTF-8"))?;
                parts.push(part);
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if parts.pop().is_none() {
                    return Err(Error::invalid_path(raw, "escapes the context root"));
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(Error::invalid_path(raw, "absolute paths are not allowed"));
            }
        }
    }

    if parts.is_empty() {
        return Err(Error::invalid_path(raw, "resolves to the context root"));
    }

    let name = parts.join("/");
    let mut full = root.to_path_buf();
    for part in &parts {
        full.push(part);
    }
    Ok((full, name))
}
