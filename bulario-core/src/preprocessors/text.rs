use super::TextExtractor;
use crate::error::ExtractionError;
use std::fs;
use std::path::Path;

const SUPPORTED_EXTENSIONS: &[&str] = &["txt"];

/// Reads UTF-8 text files as-is. A leading byte-order mark is dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl TextExtractor for PlainTextExtractor {
    fn extract_text(&self, path: &Path) -> Result<String, ExtractionError> {
        if !self.supports_file_type(path) {
            return Err(ExtractionError::Unsupported {
                path: path.to_path_buf(),
            });
        }
        let bytes = fs::read(path).map_err(|source| ExtractionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let text = String::from_utf8(bytes).map_err(|_| ExtractionError::NotText {
            path: path.to_path_buf(),
        })?;
        Ok(match text.strip_prefix('\u{feff}') {
            Some(stripped) => stripped.to_string(),
            None => text,
        })
    }

    fn name(&self) -> &str {
        "plain-text"
    }

    fn supports_file_type(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                SUPPORTED_EXTENSIONS
                    .iter()
                    .any(|supported| ext.eq_ignore_ascii_case(supported))
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn reads_utf8_text_and_drops_bom() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bula.TXT");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all("\u{feff}COMPOSIÇÃO\nCada mL contém".as_bytes()).unwrap();

        let text = PlainTextExtractor::new().extract_text(&path).unwrap();
        assert_eq!(text, "COMPOSIÇÃO\nCada mL contém");
    }

    #[test]
    fn invalid_utf8_is_not_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("latin1.txt");
        fs::write(&path, [b'C', b'o', 0xE7, 0xE3, b'o']).unwrap();

        assert!(matches!(
            PlainTextExtractor::new().extract_text(&path),
            Err(ExtractionError::NotText { .. })
        ));
    }

    #[test]
    fn missing_and_unsupported_files_fail() {
        let dir = TempDir::new().unwrap();
        let extractor = PlainTextExtractor::new();

        assert!(matches!(
            extractor.extract_text(&dir.path().join("missing.txt")),
            Err(ExtractionError::Io { .. })
        ));
        assert!(matches!(
            extractor.extract_text(&dir.path().join("bula.pdf")),
            Err(ExtractionError::Unsupported { .. })
        ));
        assert!(!extractor.supports_file_type(Path::new("README")));
    }
}
