//! File system operations for siteship.
//!
//! - `resolve_root()` - Validate and absolutize a sync root
//! - `FileSystemScanner` - Iterative walk producing one `FileEntry` per regular file and
//!   one `ScanError` per unreadable entry

pub mod scanner;

pub use scanner::{resolve_root, FileEntry, FileSystemScanner, ScanError, ScanOptions, ScanResult};
