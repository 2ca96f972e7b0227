// Bulario Core Library
//
// Segments Brazilian drug package inserts (bulas) into labeled text records.
// Main interface for turning leaflet text into an ordered (text, label) dataset.

pub mod types;
pub mod error;
pub mod config;
pub mod rules;
pub mod classifier;
pub mod preprocessors;
pub mod processor;
pub mod corpus;
pub mod storage;

// Re-export main types and functions for easy use
pub use types::*;
pub use error::{ConfigError, DocumentError, ExtractionError, SegmentError, StorageError};
pub use config::{ConfigManager, HeaderRuleConfig, JunkFilterConfig, SegmentationConfig};
pub use rules::{RuleEngine, Segmentation};
pub use classifier::FamilyClassifier;
pub use preprocessors::{PlainTextExtractor, TextExtractor};
pub use processor::{DocumentProcessor, FamilySelection};
pub use corpus::{CorpusBuilder, CorpusRecord, CorpusReport, DocumentFailure};
pub use storage::{calculate_config_hash, calculate_text_hash, save_records, OutputFormat};
