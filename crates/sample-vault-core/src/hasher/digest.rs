use super::{fuzzy, magic};
use crate::error::{Error, Result};
use md5::Context as Md5;
use serde::Serialize;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use tracing::trace;

const READ_CHUNK: usize = 64 * 1024;

/// Digests and sniffed attributes of one piece of content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
    pub file_type: String,
    pub md5: String,
    pub sha1: String,
    pub sha256: String,
    pub sha512: String,
    pub crc32: String,
    pub ssdeep: String,
}

impl FileInfo {
    /// Reads `path` once and fingerprints it. The display name is the file name.
    pub fn from_path(path: &Path) -> io::Result<FileInfo> {
        let data = read_full_file(path)?;
        let name = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        trace!("Fingerprinting {} ({} bytes)", path.display(), data.len());
        Ok(FileInfo::from_bytes(name, &data))
    }

    pub fn from_bytes(name: impl Into<String>, data: &[u8]) -> FileInfo {
        let mut md5 = Md5::new();
        let mut sha1 = Sha1::new();
        let mut sha256 = Sha256::new();
        let mut sha512 = Sha512::new();
        let mut crc32 = crc32fast::Hasher::new();

        for chunk in data.chunks(READ_CHUNK) {
            md5.consume(chunk);
            sha1.update(chunk);
            sha256.update(chunk);
            sha512.update(chunk);
            crc32.update(chunk);
        }

        FileInfo {
            name: name.into(),
            size: data.len() as u64,
            file_type: magic::describe(data),
            md5: format!("{:x}", md5.compute()),
            sha1: hex::encode(sha1.finalize()),
            sha256: hex::encode(sha256.finalize()),
            sha512: hex::encode(sha512.finalize()),
            crc32: format!("{:08X}", crc32.finalize()),
            ssdeep: fuzzy::hash(data),
        }
    }
}

pub fn read_full_file(file: &Path) -> io::Result<Vec<u8>> {
    let mut f = File::open(file)?;
    let mut buffer = Vec::new();
    f.read_to_end(&mut buffer)?;
    Ok(buffer)
}

/// Hash families a lookup key can belong to, told apart by hex length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashKind {
    Md5,
    Sha1,
    Sha256,
    Sha512,
}

impl HashKind {
    pub fn from_hex(value: &str) -> Result<HashKind> {
        if !value.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::InvalidHashFormat(value.to_string()));
        }
        match value.len() {
            32 => Ok(HashKind::Md5),
            40 => Ok(HashKind::Sha1),
            64 => Ok(HashKind::Sha256),
            128 => Ok(HashKind::Sha512),
            _ => Err(Error::InvalidHashFormat(value.to_string())),
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            HashKind::Md5 => "md5",
            HashKind::Sha1 => "sha1",
            HashKind::Sha256 => "sha256",
            HashKind::Sha512 => "sha512",
        }
    }
}

/// Normalizes and validates a sha256 identity digest.
pub fn normalize_sha256(value: &str) -> Result<String> {
    let value = value.trim().to_ascii_lowercase();
    match HashKind::from_hex(&value)? {
        HashKind::Sha256 => Ok(value),
        _ => Err(Error::InvalidHashFormat(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) const EICAR: &[u8] =
        br"X5O!P%@AP[4\PZX54(P^)7CC)7}$EICAR-STANDARD-ANTIVIRUS-TEST-FILE!$H+H*";

    #[test]
    fn test_eicar_digests() {
        assert_eq!(EICAR.len(), 68);
        let info = FileInfo::from_bytes("eicar.com", EICAR);
        assert_eq!(info.size, 68);
        assert_eq!(info.md5, "44d88612fea8a8f36de82e1278abb02f");
        assert_eq!(info.sha1, "3395856ce81f2b7382dee72602f798b642f14140");
        assert_eq!(
            info.sha256,
            "275a021bbfb6489e54d471899f7db9d1663fc695ec2fe2a2c4538aabf651fd0f"
        );
        assert_eq!(info.sha512.len(), 128);
        assert_eq!(info.crc32.len(), 8);
        assert_eq!(info.file_type, "ASCII text");
    }

    #[test]
    fn test_empty_content() {
        let info = FileInfo::from_bytes("empty", b"");
        assert_eq!(info.size, 0);
        assert_eq!(info.md5, "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(info.crc32, "00000000");
        assert_eq!(info.ssdeep, "3::");
    }

    #[test]
    fn test_hash_kind_by_length() {
        assert_eq!(HashKind::from_hex(&"a".repeat(32)).unwrap(), HashKind::Md5);
        assert_eq!(HashKind::from_hex(&"a".repeat(40)).unwrap(), HashKind::Sha1);
        assert_eq!(HashKind::from_hex(&"a".repeat(64)).unwrap(), HashKind::Sha256);
        assert_eq!(HashKind::from_hex(&"a".repeat(128)).unwrap(), HashKind::Sha512);
        assert!(matches!(
            HashKind::from_hex("abc"),
            Err(Error::InvalidHashFormat(_))
        ));
        assert!(matches!(
            HashKind::from_hex(&"z".repeat(64)),
            Err(Error::InvalidHashFormat(_))
        ));
    }

    #[test]
    fn test_normalize_sha256_rejects_md5() {
        assert!(normalize_sha256(&"A".repeat(64)).is_ok());
        assert!(normalize_sha256(&"a".repeat(32)).is_err());
    }
}
