use super::{Deadline, JunkFilter, ParagraphSplitter, PatternTable, SectionScanner};
use crate::config::SegmentationConfig;
use crate::error::{ConfigError, SegmentError};
use crate::types::{DocumentFamily, Label, Record, ScanStats};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Records for one document, in document order, plus scan counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segmentation {
    pub records: Vec<Record>,
    pub stats: ScanStats,
}

/// A config compiled into immutable rule tables. Cheap to share across
/// threads: all per-document state lives inside `segment`.
#[derive(Debug, Clone)]
pub struct RuleEngine {
    family: DocumentFamily,
    junk: JunkFilter,
    table: PatternTable,
    splitter: ParagraphSplitter,
    min_record_chars: usize,
    max_duration: Option<Duration>,
}

impl RuleEngine {
    pub fn new(config: &SegmentationConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let junk = JunkFilter::new(&config.junk_filter)?;
        let table = PatternTable::new(&config.header_rules)?;
        let splitter =
            ParagraphSplitter::new(config.paragraph_break_newlines, config.min_record_chars)?;

        debug!(
            family = %config.document_family,
            header_rules = table.len(),
            junk_patterns = junk.len(),
            min_record_chars = config.min_record_chars,
            "compiled rule engine"
        );

        Ok(Self {
            family: config.document_family,
            junk,
            table,
            splitter,
            min_record_chars: config.min_record_chars,
            max_duration: config.max_document_millis.map(Duration::from_millis),
        })
    }

    pub fn family(&self) -> DocumentFamily {
        self.family
    }

    pub fn min_record_chars(&self) -> usize {
        self.min_record_chars
    }

    pub fn table(&self) -> &PatternTable {
        &self.table
    }

    /// Segment and label one document's text.
    ///
    /// Whitespace-only text yields no records. Otherwise, when the scan and
    /// expansion leave nothing, the whole trimmed text comes back as a single
    /// default-labeled record, regardless of its length.
    pub fn segment(&self, text: &str) -> Result<Segmentation, SegmentError> {
        let started = Instant::now();
        let deadline = self.max_duration.map(Deadline::starting_now);
        let scanner = SectionScanner::new(&self.junk, &self.table, self.min_record_chars);

        let mut records = Vec::new();
        let mut stats = scanner.scan(text, deadline, |segment| {
            trace!(label = %segment.label, chars = segment.text.len(), "segment flushed");
            records.extend(self.splitter.expand(&segment.text, segment.label));
        })?;

        let trimmed = text.trim();
        if records.is_empty() && !trimmed.is_empty() {
            stats.used_fallback = true;
            records.push(Record::new(trimmed, Label::default()));
        }

        debug!(
            family = %self.family,
            records = records.len(),
            lines = stats.lines_scanned,
            fallback = stats.used_fallback,
            elapsed_us = started.elapsed().as_micros() as u64,
            "document segmented"
        );

        Ok(Segmentation { records, stats })
    }
}
