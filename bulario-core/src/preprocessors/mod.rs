//! Text extraction
//!
//! This module is the input boundary of the segmenter: it turns a leaflet file
//! into one plain-text string, once per document.
//!
//! ## Architecture
//!
//! ```text
//! Leaflet file (TXT, or PDF converted upstream)
//!     ↓
//! [Format-specific TextExtractor]
//!     ↓
//! Plain text
//!     ↓
//! [RuleEngine]
//!     ↓
//! Ordered (text, label) records
//! ```
//!
//! ## Available Extractors
//!
//! - `PlainTextExtractor` - UTF-8 `.txt` files
//! - (Future) a PDF extractor; today PDFs are converted to text before they reach us

pub mod preprocessor;
pub mod text;

pub use preprocessor::TextExtractor;
pub use text::PlainTextExtractor;
