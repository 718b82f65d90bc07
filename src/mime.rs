//! Mime detection capability
//!
//! The adapter never inspects file contents itself; it asks an injected
//! detector for a mime type and feeds the answer to the resource-type
//! classifier. The default detector is extension-based via `mime_guess`.

use std::path::Path;

/// Mime-detection capability consumed by the adapter.
///
/// `detect_from_file` exists so implementations can sniff the bytes of a
/// locally materialized payload; the default falls back to the path-based
/// guess, which is what the extension detector does anyway.
pub trait MimeDetector: Send + Sync {
    /// Guess a mime type from the logical path alone.
    fn detect_from_path(&self, path: &str) -> Option<String>;

    /// Guess a mime type for a payload staged in a local file.
    fn detect_from_file(&self, path: &str, _local: &Path) -> Option<String> {
        self.detect_from_path(path)
    }
}

/// Extension-based detector backed by `mime_guess`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtensionMimeDetector;

impl MimeDetector for ExtensionMimeDetector {
    fn detect_from_path(&self, path: &str) -> Option<String> {
        mime_guess::from_path(path).first().map(|m| m.to_string())
    }
}
