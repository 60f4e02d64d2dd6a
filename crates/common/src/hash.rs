//! Content fingerprints compatible with S3 object ETags.
//!
//! S3 reports the MD5 of the body as the ETag of a single-part object and
//! `md5(md5(part1) || md5(part2) || ...)-N` for an object uploaded in `N`
//! parts. Hashing a local file with the same part size as the uploader
//! reproduces the ETag exactly, so unchanged files can be detected without
//! downloading anything.

use std::fmt;
use std::io::Read;
use std::path::Path;

use md5::{Digest, Md5};

use crate::constants::{CHUNK_SIZE_NONE, READ_BUFFER_SIZE};

/// Identity tag of an object's content, in the exact textual form S3 uses.
///
/// Single-part: `"<hex md5>"`. Multipart: `"<hex md5 of part digests>-<parts>"`.
/// Both forms include the surrounding double quotes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wrap an ETag exactly as reported by the remote store.
    pub fn from_etag(etag: impl Into<String>) -> Self {
        Self(etag.into())
    }

    /// The fingerprint text, quotes included.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the multipart (`-N` suffixed) form.
    pub fn is_multipart(&self) -> bool {
        self.part_count() > 1
    }

    /// Number of parts encoded in the fingerprint (1 for the single-part form).
    pub fn part_count(&self) -> usize {
        self.0
            .trim_matches('"')
            .rsplit_once('-')
            .and_then(|(_, count)| count.parse::<usize>().ok())
            .unwrap_or(1)
    }

    fn single_part(digest: &[u8]) -> Self {
        Self(format!("\"{}\"", hex::encode(digest)))
    }

    fn multi_part(digest: &[u8], parts: usize) -> Self {
        Self(format!("\"{}-{}\"", hex::encode(digest), parts))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Compute the fingerprint of a byte slice.
///
/// # Arguments
/// * `data` - Bytes to fingerprint
/// * `chunk_size` - Part size in bytes (`CHUNK_SIZE_NONE` disables splitting)
///
/// # Returns
/// `None` for empty input, otherwise the single- or multi-part fingerprint.
pub fn fingerprint_bytes(data: &[u8], chunk_size: u64) -> Option<Fingerprint> {
    let mut hasher: EtagHasher = EtagHasher::new(chunk_size);
    hasher.update(data);
    hasher.finish()
}

/// Compute the fingerprint of everything readable from `reader`.
///
/// # Arguments
/// * `reader` - Byte source, read sequentially until exhausted
/// * `chunk_size` - Part size in bytes
///
/// # Errors
/// Returns the first read error.
pub fn fingerprint_reader<R: Read>(
    mut reader: R,
    chunk_size: u64,
) -> Result<Option<Fingerprint>, std::io::Error> {
    let mut hasher: EtagHasher = EtagHasher::new(chunk_size);
    let mut buffer: Vec<u8> = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let bytes_read: usize = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finish())
}

/// Compute the fingerprint of a file.
///
/// Reads the file in buffered slices; memory use does not depend on the
/// file or chunk size.
///
/// # Errors
/// Returns error if the file cannot be opened or read.
pub fn fingerprint_file(path: &Path, chunk_size: u64) -> Result<Option<Fingerprint>, std::io::Error> {
    let file: std::fs::File = std::fs::File::open(path)?;
    fingerprint_reader(file, chunk_size)
}

/// Streaming hasher producing a [`Fingerprint`].
///
/// Bytes are split into consecutive parts of `chunk_size` bytes; only the
/// last part may be shorter. A part is closed lazily, when the next byte
/// arrives, so input ending exactly on a boundary never yields an empty
/// trailing part.
pub struct EtagHasher {
    chunk_size: u64,
    current: Md5,
    current_len: u64,
    /// Raw 16-byte digests of closed parts, concatenated in order.
    part_digests: Vec<u8>,
    parts: usize,
}

impl EtagHasher {
    /// Create a new streaming hasher.
    ///
    /// # Arguments
    /// * `chunk_size` - Part size in bytes (`CHUNK_SIZE_NONE` disables splitting)
    pub fn new(chunk_size: u64) -> Self {
        Self {
            chunk_size,
            current: Md5::new(),
            current_len: 0,
            part_digests: Vec::new(),
            parts: 0,
        }
    }

    /// Update the hasher with additional data.
    pub fn update(&mut self, mut data: &[u8]) {
        while !data.is_empty() {
            if self.chunk_size != CHUNK_SIZE_NONE && self.current_len == self.chunk_size {
                self.close_part();
            }

            let take: usize = if self.chunk_size == CHUNK_SIZE_NONE {
                data.len()
            } else {
                let room: u64 = self.chunk_size - self.current_len;
                if room >= data.len() as u64 {
                    data.len()
                } else {
                    room as usize
                }
            };

            self.current.update(&data[..take]);
            self.current_len += take as u64;
            data = &data[take..];
        }
    }

    /// Number of parts seen so far, including a partially filled one.
    pub fn part_count(&self) -> usize {
        self.parts + usize::from(self.current_len > 0)
    }

    /// Finalize and return the fingerprint.
    ///
    /// # Returns
    /// `None` when no bytes were hashed. S3 itself reports the MD5 of the
    /// empty string for empty objects, but an empty local file carries no
    /// meaningful identity and callers treat it as always changed.
    pub fn finish(mut self) -> Option<Fingerprint> {
        if self.current_len > 0 {
            self.close_part();
        }

        match self.parts {
            0 => None,
            1 => Some(Fingerprint::single_part(&self.part_digests)),
            parts => {
                let digest = Md5::digest(&self.part_digests);
                Some(Fingerprint::multi_part(&digest, parts))
            }
        }
    }

    fn close_part(&mut self) {
        let digest = std::mem::take(&mut self.current).finalize();
        self.part_digests.extend_from_slice(&digest);
        self.current_len = 0;
        self.parts += 1;
    }
}
