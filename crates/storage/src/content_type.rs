//! Content type inference from object keys.

/// Content type used when the extension is unknown.
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// Guess the content type of an object from its key's extension.
pub fn content_type_for_key(key: &str) -> String {
    mime_guess::from_path(key)
        .first_raw()
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string()
}
