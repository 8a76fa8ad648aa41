use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::MetadataError;

/// Compression suffixes that combine with the preceding extension
const COMPRESSION_SUFFIXES: &[&str] = &["gz", "bz2", "xz", "zst"];

/// Identity of an input file, computed once when it enters the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    path: Option<PathBuf>,
    file_name: String,
    extension: String,
    size_bytes: u64,
    checksum_sha256: Option<String>,
}

impl FileDescriptor {
    /// Describe a file on disk, optionally hashing its contents
    pub fn from_path(path: &Path, compute_checksum: bool) -> Result<Self, MetadataError> {
        let size_bytes = std::fs::metadata(path)?.len();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let checksum_sha256 = if compute_checksum {
            let mut reader = BufReader::new(File::open(path)?);
            Some(sha256_hex(&mut reader)?)
        } else {
            None
        };

        Ok(Self {
            path: Some(path.to_path_buf()),
            extension: declared_extension(&file_name),
            file_name,
            size_bytes,
            checksum_sha256,
        })
    }

    /// Describe an in-memory payload that arrived as a stream
    pub fn from_bytes(file_name: &str, bytes: &[u8], compute_checksum: bool) -> Self {
        let checksum_sha256 = compute_checksum.then(|| hex::encode(Sha256::digest(bytes)));
        Self {
            path: None,
            file_name: file_name.to_string(),
            extension: declared_extension(file_name),
            size_bytes: bytes.len() as u64,
            checksum_sha256,
        }
    }

    /// Describe a stream from what a [`DigestReader`] saw
    ///
    /// The checksum is only reported when the reader reached the end of the
    /// stream; a partly consumed stream gets a size but no checksum.
    pub fn from_stream<R>(file_name: &str, reader: DigestReader<R>) -> Self {
        let checksum_sha256 = if reader.at_eof {
            reader.hasher.map(|h| hex::encode(h.finalize()))
        } else {
            None
        };
        Self {
            path: None,
            file_name: file_name.to_string(),
            extension: declared_extension(file_name),
            size_bytes: reader.bytes_read,
            checksum_sha256,
        }
    }

    /// Source path, absent for streams
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// File name without directories
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Lower-cased declared extension (e.g. "czi", "fastq.gz")
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Size in bytes; for a partly consumed stream, the bytes read from it
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Hex-encoded SHA-256 of the contents, if computed
    pub fn checksum_sha256(&self) -> Option<&str> {
        self.checksum_sha256.as_deref()
    }
}

/// Reader that counts, and optionally hashes, the bytes passing through it
#[derive(Debug)]
pub struct DigestReader<R> {
    inner: R,
    hasher: Option<Sha256>,
    bytes_read: u64,
    at_eof: bool,
}

impl<R: Read> DigestReader<R> {
    /// Wrap a reader
    pub fn new(inner: R, compute_checksum: bool) -> Self {
        Self {
            inner,
            hasher: compute_checksum.then(Sha256::new),
            bytes_read: 0,
            at_eof: false,
        }
    }

    /// Bytes read so far
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}

impl<R: Read> Read for DigestReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n == 0 && !buf.is_empty() {
            self.at_eof = true;
        }
        if let Some(hasher) = self.hasher.as_mut() {
            hasher.update(&buf[..n]);
        }
        self.bytes_read += n as u64;
        Ok(n)
    }
}

/// Lower-cased extension of a file name, keeping compression suffixes
/// attached to the inner extension ("reads.FASTQ.GZ" gives "fastq.gz")
pub fn declared_extension(file_name: &str) -> String {
    let lower = file_name.to_ascii_lowercase();
    let parts: Vec<&str> = lower.split('.').collect();
    match parts.as_slice() {
        [] | [_] => String::new(),
        [.., stem, inner, outer]
            if COMPRESSION_SUFFIXES.contains(outer) && !stem.is_empty() =>
        {
            format!("{inner}.{outer}")
        }
        [.., last] => last.to_string(),
    }
}

/// Hex-encoded SHA-256 of everything the reader yields
pub fn sha256_hex<R: Read>(reader: &mut R) -> Result<String, MetadataError> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}
