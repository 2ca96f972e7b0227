// Segmentation rules, leaves first:
// - junk_filter.rs: boilerplate line suppression
// - pattern_detection.rs: ordered header table and header matching
// - section_detection.rs: line-by-line state machine producing labeled segments
// - paragraph_split.rs: paragraph-level expansion of flushed segments
// - engine.rs: compiles a config into the above and runs a whole document

pub mod engine;
pub mod junk_filter;
pub mod paragraph_split;
pub mod pattern_detection;
pub mod section_detection;

pub use engine::{RuleEngine, Segmentation};
pub use junk_filter::JunkFilter;
pub use paragraph_split::ParagraphSplitter;
pub use pattern_detection::{PatternRule, PatternTable};
pub use section_detection::{split_lines, Deadline, SectionScanner, TextLines};

use crate::error::ConfigError;
use regex::{Regex, RegexBuilder};

/// Compiled-program cap per pattern. Header and junk patterns are short
/// phrases; anything near this limit is a config mistake.
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

/// Compile one config pattern case-insensitively, rejecting patterns that
/// are too large or that would match a blank line.
pub(crate) fn compile_pattern(
    table: &'static str,
    index: usize,
    pattern: &str,
    anchored: bool,
) -> Result<Regex, ConfigError> {
    let source = if anchored {
        format!("^(?:{pattern})")
    } else {
        pattern.to_string()
    };
    let regex = RegexBuilder::new(&source)
        .case_insensitive(true)
        .size_limit(PATTERN_SIZE_LIMIT)
        .build()
        .map_err(|source| ConfigError::InvalidPattern {
            table,
            index,
            pattern: pattern.to_string(),
            source,
        })?;
    if regex.is_match("") {
        return Err(ConfigError::MatchesEmptyLine {
            table,
            index,
            pattern: pattern.to_string(),
        });
    }
    Ok(regex)
}
