use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ===== LABEL VOCABULARY =====
// Wire tokens are fixed. Mapping tokens to classifier class indices is the
// consumer's business; `Label::ALL` only fixes a stable iteration order.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Label {
    Composicao,
    Indicacao,
    Contraindicacao,
    Posologia,
    EfeitosAdversos,
    /// Catch-all for anything outside a named section.
    #[default]
    Outros,
}

impl Label {
    pub const ALL: [Label; 6] = [
        Label::Composicao,
        Label::Indicacao,
        Label::Contraindicacao,
        Label::Posologia,
        Label::EfeitosAdversos,
        Label::Outros,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Label::Composicao => "COMPOSICAO",
            Label::Indicacao => "INDICACAO",
            Label::Contraindicacao => "CONTRAINDICACAO",
            Label::Posologia => "POSOLOGIA",
            Label::EfeitosAdversos => "EFEITOS_ADVERSOS",
            Label::Outros => "OUTROS",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Label::ALL
            .into_iter()
            .find(|label| label.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownLabel(s.to_string()))
    }
}

// ===== RULE TARGETS AND MATCH OUTCOMES =====

/// Token used in config files for the stop target.
pub const STOP_TOKEN: &str = "STOP";

/// What a header rule switches the scan to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RuleTarget {
    Label(Label),
    /// Close the current section and fall back to the default label.
    Stop,
}

impl TryFrom<String> for RuleTarget {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.trim().eq_ignore_ascii_case(STOP_TOKEN) {
            return Ok(RuleTarget::Stop);
        }
        value
            .parse::<Label>()
            .map(RuleTarget::Label)
            .map_err(|_| ConfigError::UnknownTarget(value))
    }
}

impl From<RuleTarget> for String {
    fn from(target: RuleTarget) -> Self {
        match target {
            RuleTarget::Label(label) => label.as_str().to_string(),
            RuleTarget::Stop => STOP_TOKEN.to_string(),
        }
    }
}

/// Result of testing one line against the header table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderOutcome {
    NoMatch,
    NewLabel(Label),
    Stop,
}

impl From<RuleTarget> for HeaderOutcome {
    fn from(target: RuleTarget) -> Self {
        match target {
            RuleTarget::Label(label) => HeaderOutcome::NewLabel(label),
            RuleTarget::Stop => HeaderOutcome::Stop,
        }
    }
}

// ===== SEGMENTS AND RECORDS =====

/// A flushed block of buffered lines, already trimmed and above the length
/// threshold, waiting for paragraph expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub label: Label,
}

/// The externally visible unit: a trimmed span and its label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub text: String,
    pub label: Label,
}

impl Record {
    pub fn new(text: &str, label: Label) -> Self {
        Self {
            text: text.trim().to_string(),
            label,
        }
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Counters collected while scanning one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    pub lines_scanned: usize,
    pub junk_lines: usize,
    pub headers_matched: usize,
    pub stops_matched: usize,
    /// Segments forwarded to the expander.
    pub segments_flushed: usize,
    /// Segments dropped at flush for being under the length threshold.
    pub segments_dropped: usize,
    pub used_fallback: bool,
}

/// Ordered record stream for one document plus how it was produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecords {
    pub source: String,
    pub family: DocumentFamily,
    pub records: Vec<Record>,
    pub stats: ScanStats,
}

// ===== DOCUMENT FAMILIES =====

/// Leaflet templates. Each family carries its own header and junk tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFamily {
    /// "Bula para o paciente": numbered question headings.
    #[default]
    PatientInsert,
    /// "Bula para o profissional de saúde": numbered technical headings.
    ProfessionalInsert,
    /// Unknown template; broad header phrases only.
    Generic,
}

impl DocumentFamily {
    pub const ALL: [DocumentFamily; 3] = [
        DocumentFamily::PatientInsert,
        DocumentFamily::ProfessionalInsert,
        DocumentFamily::Generic,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentFamily::PatientInsert => "patient",
            DocumentFamily::ProfessionalInsert => "professional",
            DocumentFamily::Generic => "generic",
        }
    }
}

impl fmt::Display for DocumentFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "patient" | "patient_insert" => Ok(DocumentFamily::PatientInsert),
            "professional" | "professional_insert" => Ok(DocumentFamily::ProfessionalInsert),
            "generic" => Ok(DocumentFamily::Generic),
            other => Err(format!("unknown document family `{other}`")),
        }
    }
}
