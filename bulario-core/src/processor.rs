use crate::classifier::FamilyClassifier;
use crate::config::ConfigManager;
use crate::error::{ConfigError, DocumentError, ExtractionError, SegmentError};
use crate::preprocessors::{PlainTextExtractor, TextExtractor};
use crate::rules::RuleEngine;
use crate::types::{DocumentFamily, DocumentRecords};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// How a document is matched to a leaflet family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FamilySelection {
    /// Classify each document from its text.
    #[default]
    Auto,
    Fixed(DocumentFamily),
}

impl fmt::Display for FamilySelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FamilySelection::Auto => f.write_str("auto"),
            FamilySelection::Fixed(family) => write!(f, "{family}"),
        }
    }
}

impl FromStr for FamilySelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("auto") {
            return Ok(FamilySelection::Auto);
        }
        s.parse::<DocumentFamily>().map(FamilySelection::Fixed)
    }
}

/// Extractor, classifier and one compiled engine per family. Immutable once
/// built, so a single processor is shared by every worker of a corpus build.
pub struct DocumentProcessor {
    extractor: Box<dyn TextExtractor>,
    classifier: FamilyClassifier,
    engines: HashMap<DocumentFamily, RuleEngine>,
    default_engine: RuleEngine,
    selection: FamilySelection,
}

impl DocumentProcessor {
    /// Create DocumentProcessor with full dependency injection
    pub fn new_with_dependencies(
        extractor: Box<dyn TextExtractor>,
        configs: &ConfigManager,
        selection: FamilySelection,
    ) -> Result<Self, ConfigError> {
        let mut engines = HashMap::new();
        for family in DocumentFamily::ALL {
            engines.insert(family, RuleEngine::new(configs.get_config(family))?);
        }
        let default_engine = RuleEngine::new(configs.get_config(DocumentFamily::default()))?;

        Ok(Self {
            extractor,
            classifier: FamilyClassifier::new(),
            engines,
            default_engine,
            selection,
        })
    }

    /// Plain-text extraction with the given configs and family selection.
    pub fn new(configs: &ConfigManager, selection: FamilySelection) -> Result<Self, ConfigError> {
        Self::new_with_dependencies(Box::new(PlainTextExtractor::new()), configs, selection)
    }

    pub fn selection(&self) -> FamilySelection {
        self.selection
    }

    pub fn extractor(&self) -> &dyn TextExtractor {
        self.extractor.as_ref()
    }

    pub fn supports_file_type(&self, path: &Path) -> bool {
        self.extractor.supports_file_type(path)
    }

    pub fn extract(&self, path: &Path) -> Result<String, ExtractionError> {
        self.extractor.extract_text(path)
    }

    pub fn select_family(&self, text: &str) -> DocumentFamily {
        match self.selection {
            FamilySelection::Auto => self.classifier.classify(text),
            FamilySelection::Fixed(family) => family,
        }
    }

    pub fn engine_for(&self, family: DocumentFamily) -> &RuleEngine {
        self.engines.get(&family).unwrap_or(&self.default_engine)
    }

    /// Segment already-extracted text. `source` is carried through to the
    /// result and the logs.
    pub fn process_text(&self, source: &str, text: &str) -> Result<DocumentRecords, SegmentError> {
        let family = self.select_family(text);
        let segmentation = self.engine_for(family).segment(text)?;

        info!(
            source,
            family = %family,
            records = segmentation.records.len(),
            fallback = segmentation.stats.used_fallback,
            "processed document"
        );

        Ok(DocumentRecords {
            source: source.to_string(),
            family,
            records: segmentation.records,
            stats: segmentation.stats,
        })
    }

    pub fn process_file(&self, path: &Path) -> Result<DocumentRecords, DocumentError> {
        let text = self.extract(path)?;
        Ok(self.process_text(&path.display().to_string(), &text)?)
    }
}

impl fmt::Debug for DocumentProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentProcessor")
            .field("extractor", &self.extractor.name())
            .field("selection", &self.selection)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Label;

    const PROFESSIONAL: &str = include_str!("../test_fixtures/bula_profissional.txt");

    fn processor(selection: FamilySelection) -> DocumentProcessor {
        DocumentProcessor::new(&ConfigManager::new(), selection).unwrap()
    }

    #[test]
    fn auto_selection_classifies_each_document() {
        let result = processor(FamilySelection::Auto)
            .process_text("profissional.txt", PROFESSIONAL)
            .unwrap();

        assert_eq!(result.family, DocumentFamily::ProfessionalInsert);
        assert_eq!(result.source, "profissional.txt");
        let labels: Vec<Label> = result.records.iter().map(|r| r.label).collect();
        assert_eq!(
            labels,
            vec![
                Label::Outros,
                Label::Composicao,
                Label::Indicacao,
                Label::Outros,
                Label::Contraindicacao,
                Label::Posologia,
                Label::EfeitosAdversos,
                Label::Outros,
            ]
        );
    }

    #[test]
    fn fixed_selection_skips_classification() {
        let result = processor(FamilySelection::Fixed(DocumentFamily::Generic))
            .process_text("profissional.txt", PROFESSIONAL)
            .unwrap();
        assert_eq!(result.family, DocumentFamily::Generic);
    }

    #[test]
    fn unreadable_file_is_an_extraction_error() {
        let result = processor(FamilySelection::Auto).process_file(Path::new("nao/existe.txt"));
        assert!(matches!(
            result,
            Err(DocumentError::Extraction(ExtractionError::Io { .. }))
        ));
    }

    #[test]
    fn family_selection_parses_cli_values() {
        assert_eq!("auto".parse::<FamilySelection>(), Ok(FamilySelection::Auto));
        assert_eq!(
            "professional".parse::<FamilySelection>(),
            Ok(FamilySelection::Fixed(DocumentFamily::ProfessionalInsert))
        );
        assert!("bula".parse::<FamilySelection>().is_err());
    }
}
