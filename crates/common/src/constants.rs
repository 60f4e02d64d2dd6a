//! Shared constants used across siteship crates.

/// Chunk size used for content fingerprints and multipart uploads (8MB).
///
/// The local fingerprint and the remote multipart part size must be equal,
/// otherwise no fingerprint of a multipart object will ever match.
pub const CHUNK_SIZE: u64 = 8 * 1024 * 1024;

/// No chunking: the whole stream is fingerprinted as a single part.
pub const CHUNK_SIZE_NONE: u64 = 0;

/// Read buffer size used while streaming file contents (64KB).
pub const READ_BUFFER_SIZE: usize = 64 * 1024;
