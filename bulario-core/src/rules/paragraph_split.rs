use crate::error::ConfigError;
use crate::types::{Label, Record};
use regex::Regex;

/// Re-segments a flushed block into paragraph-level records.
#[derive(Debug, Clone)]
pub struct ParagraphSplitter {
    paragraph_break: Regex,
    min_chars: usize,
}

impl ParagraphSplitter {
    /// `break_newlines` consecutive line breaks, with only whitespace between
    /// them, separate two paragraphs.
    pub fn new(break_newlines: usize, min_chars: usize) -> Result<Self, ConfigError> {
        if break_newlines == 0 {
            return Err(ConfigError::OutOfRange {
                field: "paragraph_break_newlines",
                min: 1,
                value: break_newlines,
            });
        }
        let source = format!(r"(?:\n[^\S\n]*){{{break_newlines},}}");
        let paragraph_break = Regex::new(&source).map_err(|source_err| ConfigError::InvalidPattern {
            table: "paragraph_break",
            index: 0,
            pattern: source.clone(),
            source: source_err,
        })?;
        Ok(Self {
            paragraph_break,
            min_chars,
        })
    }

    /// One record per paragraph long enough to keep. A block that is a
    /// single paragraph comes back whole, or not at all when it is short.
    /// Short paragraphs are dropped, never merged into a neighbour.
    pub fn expand(&self, block: &str, label: Label) -> Vec<Record> {
        let paragraphs: Vec<&str> = self
            .paragraph_break
            .split(block)
            .map(str::trim)
            .filter(|paragraph| !paragraph.is_empty())
            .collect();

        if paragraphs.len() > 1 {
            return paragraphs
                .into_iter()
                .filter(|paragraph| paragraph.chars().count() >= self.min_chars)
                .map(|paragraph| Record::new(paragraph, label))
                .collect();
        }

        let whole = Record::new(block, label);
        if whole.char_len() >= self.min_chars {
            vec![whole]
        } else {
            Vec::new()
        }
    }

    pub fn min_chars(&self) -> usize {
        self.min_chars
    }
}
