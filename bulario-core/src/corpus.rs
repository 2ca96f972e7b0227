use crate::error::DocumentError;
use crate::processor::DocumentProcessor;
use crate::storage::calculate_text_hash;
use crate::types::{DocumentRecords, Label};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// One dataset row: a record plus the document it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusRecord {
    pub text: String,
    pub label: Label,
    pub source: String,
}

/// A document that contributed nothing, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFailure {
    pub source: String,
    pub reason: String,
}

/// Outcome of a corpus build. `documents` follow input order. `failures`
/// list unreadable directories first, then failed files in input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusReport {
    pub documents: Vec<DocumentRecords>,
    pub failures: Vec<DocumentFailure>,
    /// Sources skipped because their text matched an earlier document.
    /// Always empty unless deduplication was requested.
    pub duplicates: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl CorpusReport {
    /// Successful records of every document, concatenated in input order.
    pub fn records(&self) -> Vec<CorpusRecord> {
        self.documents
            .iter()
            .flat_map(|doc| {
                doc.records.iter().map(|record| CorpusRecord {
                    text: record.text.clone(),
                    label: record.label,
                    source: doc.source.clone(),
                })
            })
            .collect()
    }

    pub fn record_count(&self) -> usize {
        self.documents.iter().map(|doc| doc.records.len()).sum()
    }

    /// Records per label; every label is present, possibly with zero.
    pub fn label_counts(&self) -> BTreeMap<Label, usize> {
        let mut counts: BTreeMap<Label, usize> = Label::ALL.iter().map(|l| (*l, 0)).collect();
        for record in self.documents.iter().flat_map(|doc| doc.records.iter()) {
            *counts.entry(record.label).or_insert(0) += 1;
        }
        counts
    }

    /// Number of documents that went through the whole-text fallback.
    pub fn fallback_count(&self) -> usize {
        self.documents
            .iter()
            .filter(|doc| doc.stats.used_fallback)
            .count()
    }

    pub fn attempted(&self) -> usize {
        self.documents.len() + self.failures.len()
    }

    /// True when at least one document was attempted and none succeeded.
    pub fn all_failed(&self) -> bool {
        self.documents.is_empty() && !self.failures.is_empty()
    }
}

/// Runs a `DocumentProcessor` over many files.
///
/// Extraction and segmentation run in parallel on the current rayon pool.
/// Documents are independent: one failure is logged and reported, never
/// propagated to its siblings.
#[derive(Debug)]
pub struct CorpusBuilder<'p> {
    processor: &'p DocumentProcessor,
    dedupe: bool,
}

enum Extracted {
    Text {
        index: usize,
        source: String,
        text: String,
        hash: String,
    },
    Failed(usize, DocumentFailure),
}

impl<'p> CorpusBuilder<'p> {
    pub fn new(processor: &'p DocumentProcessor) -> Self {
        Self {
            processor,
            dedupe: false,
        }
    }

    /// Skip documents whose extracted text repeats an earlier one. The
    /// first occurrence in input order is kept.
    pub fn dedupe(mut self) -> Self {
        self.dedupe = true;
        self
    }

    /// Expand directories recursively into the supported files they hold,
    /// sorted, skipping hidden entries. Plain file paths are kept as given.
    pub fn collect_inputs(&self, inputs: &[PathBuf]) -> (Vec<PathBuf>, Vec<DocumentFailure>) {
        let mut files = Vec::new();
        let mut failures = Vec::new();

        for input in inputs {
            if input.is_dir() {
                match self.list_directory(input) {
                    Ok(mut found) => {
                        found.sort();
                        files.extend(found);
                    }
                    Err(e) => failures.push(DocumentFailure {
                        source: input.display().to_string(),
                        reason: format!("failed to read directory: {e}"),
                    }),
                }
            } else {
                files.push(input.clone());
            }
        }
        (files, failures)
    }

    fn list_directory(&self, dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        let mut found = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let hidden = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with('.'));
            if hidden {
                continue;
            }
            if path.is_dir() {
                found.extend(self.list_directory(&path)?);
            } else if self.processor.supports_file_type(&path) {
                found.push(path);
            }
        }
        Ok(found)
    }

    pub fn build(&self, inputs: &[PathBuf]) -> CorpusReport {
        let (files, mut failures) = self.collect_inputs(inputs);
        info!(documents = files.len(), "building corpus");

        let extracted: Vec<Extracted> = files
            .par_iter()
            .enumerate()
            .map(|(index, path)| {
                let source = path.display().to_string();
                match self.processor.extract(path) {
                    Ok(text) => {
                        let hash = calculate_text_hash(&text);
                        Extracted::Text {
                            index,
                            source,
                            text,
                            hash,
                        }
                    }
                    Err(e) => Extracted::Failed(index, failure(source, DocumentError::from(e))),
                }
            })
            .collect();

        let mut file_failures = Vec::new();
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        let mut pending = Vec::new();
        for item in extracted {
            match item {
                Extracted::Failed(index, f) => file_failures.push((index, f)),
                Extracted::Text {
                    index,
                    source,
                    text,
                    hash,
                } => {
                    if self.dedupe && !seen.insert(hash) {
                        info!(source = %source, "skipping duplicate document");
                        duplicates.push(source);
                    } else {
                        pending.push((index, source, text));
                    }
                }
            }
        }

        let outcomes: Vec<(usize, Result<DocumentRecords, DocumentFailure>)> = pending
            .par_iter()
            .map(|(index, source, text)| {
                let outcome = self
                    .processor
                    .process_text(source, text)
                    .map_err(|e| failure(source.clone(), DocumentError::from(e)));
                (*index, outcome)
            })
            .collect();

        let mut documents = Vec::with_capacity(outcomes.len());
        for (index, outcome) in outcomes {
            match outcome {
                Ok(doc) => documents.push(doc),
                Err(f) => file_failures.push((index, f)),
            }
        }
        file_failures.sort_by_key(|(index, _)| *index);
        failures.extend(file_failures.into_iter().map(|(_, f)| f));

        let report = CorpusReport {
            documents,
            failures,
            duplicates,
            created_at: Utc::now(),
        };
        info!(
            documents = report.documents.len(),
            records = report.record_count(),
            failures = report.failures.len(),
            duplicates = report.duplicates.len(),
            "corpus built"
        );
        report
    }
}

fn failure(source: String, error: DocumentError) -> DocumentFailure {
    warn!(source = %source, error = %error, "document failed");
    DocumentFailure {
        source,
        reason: error.to_string(),
    }
}
