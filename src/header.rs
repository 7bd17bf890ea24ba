//! Canonical archive-entry header serialization.
//!
//! The digest covers the same metadata a tar serializer would capture for an
//! entry, reduced to one canonical convention so digests are reproducible
//! across platforms and runs:
//!
//! - entry names use `/` separators everywhere; directories carry a
//!   trailing `/`
//! - mode is the on-disk permission bits only, rendered in decimal
//! - ownership, device numbers and timestamps are normalized away
//!
//! Fields are serialized as ordered `key` + `value` ASCII pairs rather than
//! raw 512-byte tar blocks, so padding and numeric-field encoding quirks of
//! tar writers cannot leak into the digest.

use crate::error::{Error, Result};
use std::fs::{self, Metadata};
use std::io::Write;
use std::path::Path;

/// Entry kind, mirroring the tar typeflag values the digest captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file.
    Regular,
    /// Directory.
    Directory,
    /// Symbolic link.
    Symlink,
}

impl EntryKind {
    /// The tar typeflag character for this kind.
    pub fn typeflag(&self) -> char {
        match self {
            EntryKind::Regular => '0',
            EntryKind::Symlink => '2',
            EntryKind::Directory => '5',
        }
    }
}

/// Canonical metadata captured for one build-context entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryHeader {
    /// Entry name relative to the context root, `/`-separated.
    pub name: String,
    /// Permission bits (low 12 bits of the on-disk mode).
    pub mode: u32,
    /// Content length for regular files, 0 otherwise.
    pub size: u64,
    /// Entry kind.
    pub kind: EntryKind,
    /// Symlink target, empty for other kinds.
    pub linkname: String,
}

impl EntryHeader {
    /// Build the header for the on-disk entry at `path`, named `name`
    /// relative to the context root.
    ///
    /// `metadata` must come from `symlink_metadata` so links are captured
    /// rather than followed.
    pub fn for_entry(name: &str, path: &Path, metadata: &Metadata) -> Result<Self> {
        let file_type = metadata.file_type();

        let (kind, size, name, linkname) = if file_type.is_file() {
            (
                EntryKind::Regular,
                metadata.len(),
                name.to_string(),
                String::new(),
            )
        } else if file_type.is_dir() {
            let mut dir_name = name.trim_end_matches('/').to_string();
            dir_name.push('/');
            (EntryKind::Directory, 0, dir_name, String::new())
        } else if file_type.is_symlink() {
            let target = fs::read_link(path)?;
            let target = target.to_string_lossy().replace('\\', "/");
            (EntryKind::Symlink, 0, name.to_string(), target)
        } else {
            return Err(Error::unsupported_entry(path));
        };

        Ok(EntryHeader {
            name,
            mode: permission_bits(metadata),
            size,
            kind,
            linkname,
        })
    }

    /// Serialize the header as ordered key/value pairs.
    ///
    /// Field order is fixed: name, mode, uid, gid, size, typeflag, linkname,
    /// uname, gname, devmajor, devminor. uid/gid/uname/gname and device
    /// numbers are always their normalized zero/empty values; they are kept
    /// in the stream so the field set matches what a tar header records.
    pub fn write_to<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        write!(w, "name{}", self.name)?;
        write!(w, "mode{}", self.mode)?;
        w.write_all(b"uid0")?;
        w.write_all(b"gid0")?;
        write!(w, "size{}", self.size)?;
        write!(w, "typeflag{}", self.kind.typeflag())?;
        write!(w, "linkname{}", self.linkname)?;
        w.write_all(b"uname")?;
        w.write_all(b"gname")?;
        w.write_all(b"devmajor0")?;
        w.write_all(b"devminor0")?;
        Ok(())
    }
}

#[cfg(unix)]
fn permission_bits(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn permission_bits(metadata: &Metadata) -> u32 {
    if metadata.permissions().readonly() {
        0o444
    } else {
        0o666
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn serialize(header: &EntryHeader) -> Vec<u8> {
        let mut buf = Vec::new();
        header.write_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_regular_file_serialization() {
        let header = EntryHeader {
            name: "test".to_string(),
            mode: 0o777,
            size: 13,
            kind: EntryKind::Regular,
            linkname: String::new(),
        };

        assert_eq!(
            serialize(&header),
            b"nametestmode511uid0gid0size13typeflag0linknameunamegnamedevmajor0devminor0"
        );
    }

    #[test]
    fn test_directory_gets_trailing_slash() {
        let dir = TempDir::new().unwrap();
        let metadata = std::fs::symlink_metadata(dir.path()).unwrap();
        let header = EntryHeader::for_entry("sub/nested", dir.path(), &metadata).unwrap();

        assert_eq!(header.kind, EntryKind::Directory);
        assert_eq!(header.name, "sub/nested/");
        assert_eq!(header.size, 0);
    }

    #[test]
    fn test_regular_file_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("file.txt");
        std::fs::write(&path, b"abcde").unwrap();

        let metadata = std::fs::symlink_metadata(&path).unwrap();
        let header = EntryHeader::for_entry("file.txt", &path, &metadata).unwrap();

        assert_eq!(header.kind, EntryKind::Regular);
        assert_eq!(header.name, "file.txt");
        assert_eq!(header.size, 5);
        assert!(header.linkname.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_captures_target() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("target");
        std::fs::write(&target, b"x").unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink("target", &link).unwrap();

        let metadata = std::fs::symlink_metadata(&link).unwrap();
        let header = EntryHeader::for_entry("link", &link, &metadata).unwrap();

        assert_eq!(header.kind, EntryKind::Symlink);
        assert_eq!(header.linkname, "target");
        assert_eq!(header.size, 0);
    }

    #[test]
    fn test_typeflags() {
        assert_eq!(EntryKind::Regular.typeflag(), '0');
        assert_eq!(EntryKind::Symlink.typeflag(), '2');
        assert_eq!(EntryKind::Directory.typeflag(), '5');
    }
}
