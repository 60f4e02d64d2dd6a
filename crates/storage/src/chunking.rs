//! Part layout for multipart uploads.
//!
//! Pure logic, no I/O. The layout must agree with how the fingerprint
//! hasher splits content, or uploaded ETags will never match.

/// Information about a single part of a large file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkInfo {
    /// Zero-based part index.
    pub index: usize,
    /// Byte offset within the file.
    pub offset: u64,
    /// Length of this part in bytes.
    pub length: u64,
}

impl ChunkInfo {
    /// One-based part number as used by multipart upload APIs.
    pub fn part_number(&self) -> i32 {
        self.index as i32 + 1
    }
}

/// Determine if a file needs a multipart upload.
///
/// Files larger than `chunk_size` are split. If `chunk_size` is 0,
/// chunking is disabled.
pub fn needs_chunking(size: u64, chunk_size: u64) -> bool {
    chunk_size > 0 && size > chunk_size
}

/// Split a file of `size` bytes into parts of `chunk_size` bytes.
///
/// The last part may be smaller than `chunk_size`. Returns a single part
/// for files no larger than `chunk_size`.
pub fn generate_chunks(size: u64, chunk_size: u64) -> Vec<ChunkInfo> {
    if chunk_size == 0 || size == 0 {
        return vec![ChunkInfo {
            index: 0,
            offset: 0,
            length: size,
        }];
    }

    let mut chunks = Vec::new();
    let mut offset = 0u64;
    let mut index = 0usize;

    while offset < size {
        let length = std::cmp::min(chunk_size, size - offset);
        chunks.push(ChunkInfo {
            index,
            offset,
            length,
        });
        offset += length;
        index += 1;
    }

    chunks
}

/// Calculate the expected number of parts for a file.
pub fn expected_chunk_count(size: u64, chunk_size: u64) -> usize {
    if chunk_size == 0 || size == 0 {
        return 1;
    }
    size.div_ceil(chunk_size) as usize
}
