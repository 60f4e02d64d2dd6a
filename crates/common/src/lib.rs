//! Shared types and utilities for siteship.
//!
//! This crate provides common functionality used across all siteship crates:
//! - Remote-store compatible content fingerprints (composite ETags)
//! - Path normalization and object key derivation
//! - Generic progress callback trait
//! - Shared constants and error types

pub mod constants;
pub mod error;
pub mod hash;
pub mod path_utils;
pub mod progress;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::PathError;
pub use hash::{fingerprint_bytes, fingerprint_file, fingerprint_reader, EtagHasher, Fingerprint};
pub use path_utils::{key_for_path, lexical_normalize, to_absolute, to_posix_path};
pub use progress::{progress_fn, FnProgress, NoOpProgress, ProgressCallback};
