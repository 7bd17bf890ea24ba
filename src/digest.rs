//! Digest values and the streaming checksum accumulator.

use crate::error::{Error, Result};
use sha2::{Digest as _, Sha256};
use std::fmt;
use std::io::{self, Write};

/// Checksum size in bytes (both schemes produce 256-bit output).
pub const DIGEST_SIZE: usize = 32;

/// Digest scheme versions.
///
/// A digest is only comparable with another digest of the same version; the
/// tag prefix keeps digests from different schemes distinguishable so the
/// header serialization or hash algorithm can evolve without poisoning an
/// existing cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Version {
    /// SHA-256 over canonical header + content. Comparable with digests
    /// recorded by earlier builder versions.
    #[default]
    V1,
    /// BLAKE3 over the same byte stream.
    B3,
}

impl Version {
    /// Returns the tag prefixed to rendered digests.
    pub fn tag(&self) -> &'static str {
        match self {
            Version::V1 => "v1",
            Version::B3 => "b3",
        }
    }

    /// Parse a version from its tag.
    pub fn parse(tag: &str) -> Result<Self> {
        match tag {
            "v1" => Ok(Version::V1),
            "b3" => Ok(Version::B3),
            _ => Err(Error::unsupported_version(tag)),
        }
    }

    /// Create an empty accumulator for this version.
    pub(crate) fn accumulator(&self) -> Accumulator {
        let inner = match self {
            Version::V1 => Inner::Sha256(Sha256::new()),
            Version::B3 => Inner::Blake3(blake3::Hasher::new()),
        };
        Accumulator {
            version: *self,
            inner,
        }
    }
}

/// A version-tagged 256-bit checksum of one build-context entry.
///
/// Rendered as `<tag><64 lowercase hex characters>`. Consumers treat the
/// rendered form as an opaque token: equality comparison only.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest {
    version: Version,
    bytes: [u8; DIGEST_SIZE],
}

impl Digest {
    /// Create a Digest from raw checksum bytes.
    pub fn from_bytes(version: Version, bytes: [u8; DIGEST_SIZE]) -> Self {
        Digest { version, bytes }
    }

    /// Parse a rendered digest (`<tag><hex>`).
    pub fn parse(s: &str) -> Result<Self> {
        let tag = s
            .get(..2)
            .ok_or_else(|| Error::invalid_digest("too short for a version tag"))?;
        let version = Version::parse(tag)?;

        let hex_part = &s[2..];
        if hex_part.len() != DIGEST_SIZE * 2 {
            return Err(Error::invalid_digest(format!(
                "expected {} hex characters, got {}",
                DIGEST_SIZE * 2,
                hex_part.len()
            )));
        }

        let raw = hex::decode(hex_part)
            .map_err(|e| Error::invalid_digest(format!("invalid hex: {}", e)))?;

        let mut bytes = [0u8; DIGEST_SIZE];
        bytes.copy_from_slice(&raw);
        Ok(Digest { version, bytes })
    }

    /// The scheme this digest was produced under.
    pub fn version(&self) -> Version {
        self.version
    }

    /// The raw checksum bytes.
    pub fn as_bytes(&self) -> &[u8; DIGEST_SIZE] {
        &self.bytes
    }

    /// Convert to the checksum's hex string (64 characters, no tag).
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.version.tag(), self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self)
    }
}

/// Streaming checksum accumulator shared by all digest versions.
///
/// Header bytes and file content are fed through `Write`, so large files
/// stream through `std::io::copy` without being buffered whole.
pub(crate) struct Accumulator {
    version: Version,
    inner: Inner,
}

enum Inner {
    Sha256(Sha256),
    Blake3(blake3::Hasher),
}

impl Accumulator {
    pub(crate) fn finalize(self) -> Digest {
        let bytes = match self.inner {
            Inner::Sha256(hasher) => hasher.finalize().into(),
            Inner::Blake3(hasher) => *hasher.finalize().as_bytes(),
        };
        Digest {
            version: self.version,
            bytes,
        }
    }
}

impl Write for Accumulator {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.inner {
            Inner::Sha256(hasher) => hasher.update(buf),
            Inner::Blake3(hasher) => {
                hasher.update(buf);
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_tags() {
        assert_eq!(Version::V1.tag(), "v1");
        assert_eq!(Version::B3.tag(), "b3");
        assert_eq!(Version::parse("v1").unwrap(), Version::V1);
        assert_eq!(Version::parse("b3").unwrap(), Version::B3);
        assert!(Version::parse("v9").is_err());
        assert_eq!(Version::default(), Version::V1);
    }

    #[test]
    fn test_accumulator_known_sha256() {
        let mut acc = Version::V1.accumulator();
        acc.write_all(b"hello world").unwrap();
        let digest = acc.finalize();

        // SHA-256 of "hello world"
        assert_eq!(
            digest.to_string(),
            "v1b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_accumulator_known_blake3() {
        let mut acc = Version::B3.accumulator();
        acc.write_all(b"hello world").unwrap();
        let digest = acc.finalize();

        // BLAKE3 of "hello world"
        assert_eq!(
            digest.to_string(),
            "b3d74981efa70a0c880b8d8c1985d075dbcbf679b99a5f9914e5aaf96b831a9e24"
        );
    }

    #[test]
    fn test_parse_roundtrip() {
        let mut acc = Version::V1.accumulator();
        acc.write_all(b"round trip").unwrap();
        let digest = acc.finalize();

        let parsed = Digest::parse(&digest.to_string()).unwrap();
        assert_eq!(parsed, digest);
        assert_eq!(parsed.version(), Version::V1);
    }

    #[test]
    fn test_parse_rejects_unknown_tag() {
        let s = format!("zz{}", "a".repeat(64));
        assert!(matches!(
            Digest::parse(&s),
            Err(Error::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_bad_length() {
        assert!(Digest::parse("v1abcd").is_err());
        assert!(Digest::parse("v1").is_err());
        assert!(Digest::parse("").is_err());
        let long = format!("v1{}", "a".repeat(65));
        assert!(Digest::parse(&long).is_err());
    }

    #[test]
    fn test_parse_rejects_bad_hex() {
        let s = format!("v1{}", "z".repeat(64));
        assert!(matches!(Digest::parse(&s), Err(Error::InvalidDigest { .. })));
    }

    #[test]
    fn test_versions_disagree_on_same_input() {
        let mut v1 = Version::V1.accumulator();
        let mut b3 = Version::B3.accumulator();
        v1.write_all(b"same bytes").unwrap();
        b3.write_all(b"same bytes").unwrap();
        assert_ne!(v1.finalize().as_bytes(), b3.finalize().as_bytes());
    }

    // Property-based tests
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            max_shrink_iters: 10000,
            ..ProptestConfig::default()
        })]

        /// Accumulating the same data always produces the same digest.
        #[test]
        fn prop_accumulator_deterministic(data: Vec<u8>) {
            let mut a = Version::V1.accumulator();
            let mut b = Version::V1.accumulator();
            a.write_all(&data).unwrap();
            b.write_all(&data).unwrap();
            prop_assert_eq!(a.finalize(), b.finalize());
        }

        /// Rendered digests round-trip through parse.
        #[test]
        fn prop_render_parse_roundtrip(
            bytes in prop::array::uniform32(any::<u8>()),
            version in prop::sample::select(vec![Version::V1, Version::B3]),
        ) {
            let digest = Digest::from_bytes(version, bytes);
            let parsed = Digest::parse(&digest.to_string())?;
            prop_assert_eq!(parsed, digest);
        }

        /// Hex parts of the wrong length always fail.
        #[test]
        fn prop_invalid_hex_length_fails(
            s in "[0-9a-f]{0,63}|[0-9a-f]{65,128}"
        ) {
            let rendered = format!("v1{}", s);
            prop_assert!(Digest::parse(&rendered).is_err());
        }
    }
}
