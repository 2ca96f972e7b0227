// Extraction abstraction for leaflet documents
//
// Everything after extraction works on a plain string and is format-agnostic.
// Extraction failures are per-document: the caller records them and moves on.

use crate::error::ExtractionError;
use std::path::Path;

/// TextExtractor trait - converts a document file to plain text
///
/// Implementations must be usable from several worker threads at once.
pub trait TextExtractor: Send + Sync {
    /// Read `path` and return its text content.
    fn extract_text(&self, path: &Path) -> Result<String, ExtractionError>;

    /// Get extractor name for logging
    fn name(&self) -> &str;

    /// Check if extractor supports the given file type
    fn supports_file_type(&self, path: &Path) -> bool;
}
