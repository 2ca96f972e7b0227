use crate::error::ConfigError;
use crate::types::{DocumentFamily, Label, RuleTarget};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_min_record_chars() -> usize {
    50
}

fn default_paragraph_break_newlines() -> usize {
    2
}

fn default_max_document_millis() -> Option<u64> {
    Some(5_000)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentationConfig {
    #[serde(default)]
    pub document_family: DocumentFamily,
    /// Minimum trimmed length, in characters, of any emitted record
    /// TODO: calibrate against the labeled corpus; 50 is inherited, not measured
    #[serde(default = "default_min_record_chars")]
    pub min_record_chars: usize,
    /// Consecutive line breaks (blank lines in between) that end a paragraph
    #[serde(default = "default_paragraph_break_newlines")]
    pub paragraph_break_newlines: usize,
    /// Per-document scan budget; exceeding it fails that document only
    #[serde(default = "default_max_document_millis")]
    pub max_document_millis: Option<u64>,
    #[serde(default)]
    pub junk_filter: JunkFilterConfig,
    /// Ordered header table. First matching rule wins.
    #[serde(default = "default_patient_header_rules")]
    pub header_rules: Vec<HeaderRuleConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JunkFilterConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Searched anywhere in the trimmed line, case-insensitive
    #[serde(default = "default_junk_patterns")]
    pub patterns: Vec<String>,
}

impl Default for JunkFilterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            patterns: default_junk_patterns(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderRuleConfig {
    /// Anchored at the start of the trimmed line, case-insensitive
    pub pattern: String,
    pub target: RuleTarget,
}

impl HeaderRuleConfig {
    pub fn new(pattern: &str, target: RuleTarget) -> Self {
        Self {
            pattern: pattern.to_string(),
            target,
        }
    }

    fn label(pattern: &str, label: Label) -> Self {
        Self::new(pattern, RuleTarget::Label(label))
    }

    fn stop(pattern: &str) -> Self {
        Self::new(pattern, RuleTarget::Stop)
    }
}

fn default_junk_patterns() -> Vec<String> {
    vec![
        // Leaflet running headers
        r"Bula (para|do) paciente".to_string(),
        r"Modelo de bula".to_string(),
        r"Informações ao Paciente".to_string(),
        r"IDENTIFICAÇÃO DO MEDICAMENTO".to_string(),
        // Manufacturers printed in headers/footers
        r"eurofarma".to_string(),
        r"CIMED".to_string(),
        r"SANTISA".to_string(),
        r"TEUTO".to_string(),
        r"RANBAXY".to_string(),
        r"GERMED".to_string(),
        r"VITAMEDIC".to_string(),
        r"MULTILAB".to_string(),
        // Regulatory footer lines
        r"Farm\. Resp".to_string(),
        r"CNPJ".to_string(),
        r"Indústria Brasileira".to_string(),
        r"^\s*página \d+".to_string(),
        r"\s*VP REV \d+".to_string(),
    ]
}

fn default_patient_header_rules() -> Vec<HeaderRuleConfig> {
    vec![
        HeaderRuleConfig::label(
            r"(1|I)\.?\s*PARA QUE ESTE MEDICAMENTO( É| E)? INDICADO\?",
            Label::Indicacao,
        ),
        HeaderRuleConfig::label(r"\bCOMPOSI[ÇC][ÃA]O\b", Label::Composicao),
        HeaderRuleConfig::label(
            r"(3|III)\.?\s*QUANDO N[ÃA]O DEVO USAR (ESTE )?MEDICAMENTO\?",
            Label::Contraindicacao,
        ),
        HeaderRuleConfig::label(
            r"(6|VI)\.?\s*COMO DEVO USAR (ESTE )?MEDICAMENTO\?",
            Label::Posologia,
        ),
        HeaderRuleConfig::label(r"\bPOSOLOGIA\b", Label::Posologia),
        HeaderRuleConfig::label(
            r"(8|VIII)\.?\s*QUAIS OS MALES QUE ESTE MEDICAMENTO PODE ME CAUSAR\?",
            Label::EfeitosAdversos,
        ),
        HeaderRuleConfig::label(r"\bREA[ÇC][ÕO]ES? ADVERSAS\b", Label::EfeitosAdversos),
        // Sections we do not label: close the current one and fall back to OUTROS
        HeaderRuleConfig::stop(r"(2|II)\.?\s*COMO ESTE MEDICAMENTO FUNCIONA\?"),
        HeaderRuleConfig::stop(r"(4|IV)\.?\s*O QUE DEVO SABER ANTES DE USAR (ESTE )?MEDICAMENTO\?"),
        HeaderRuleConfig::stop(
            r"(5|V)\.?\s*ONDE, COMO E POR QUANTO TEMPO POSSO GUARDAR (ESTE )?MEDICAMENTO\?",
        ),
        HeaderRuleConfig::stop(
            r"(7|VII)\.?\s*O QUE DEVO FAZER QUANDO EU ME ESQUECER DE USAR (ESTE )?MEDICAMENTO\?",
        ),
        HeaderRuleConfig::stop(
            r"(9|IX)\.?\s*O QUE FAZER SE ALGU[ÉE]M USAR UMA QUANTIDADE MAIOR DO QUE A INDICADA (DESTE )?MEDICAMENTO\?",
        ),
        HeaderRuleConfig::stop(r"\bDIZERES LEGAIS\b"),
        HeaderRuleConfig::stop(r"\bAPRESENTA[ÇC][ÕO]ES\b"),
        HeaderRuleConfig::stop(r"\bINTERA[ÇC][ÕO]ES MEDICAMENTOSAS\b"),
    ]
}

fn professional_header_rules() -> Vec<HeaderRuleConfig> {
    // Numbers are optional here: professional leaflets often drop them.
    vec![
        HeaderRuleConfig::label(r"(1\.?\s*|I\.\s*)?INDICA[ÇC][ÕO]ES\b", Label::Indicacao),
        HeaderRuleConfig::label(r"\bCOMPOSI[ÇC][ÃA]O\b", Label::Composicao),
        HeaderRuleConfig::label(
            r"(4\.?\s*|IV\.\s*)?CONTRAINDICA[ÇC][ÕO]ES\b",
            Label::Contraindicacao,
        ),
        HeaderRuleConfig::label(
            r"(8\.?\s*|VIII\.\s*)?POSOLOGIA( E MODO DE USAR)?\b",
            Label::Posologia,
        ),
        HeaderRuleConfig::label(
            r"(9\.?\s*|IX\.\s*)?REA[ÇC][ÕO]ES ADVERSAS\b",
            Label::EfeitosAdversos,
        ),
        HeaderRuleConfig::stop(r"(2\.?\s*|II\.\s*)?RESULTADOS DE EFIC[ÁA]CIA\b"),
        HeaderRuleConfig::stop(r"(3\.?\s*|III\.\s*)?CARACTER[ÍI]STICAS FARMACOL[ÓO]GICAS\b"),
        HeaderRuleConfig::stop(r"(5\.?\s*|V\.\s*)?ADVERT[ÊE]NCIAS E PRECAU[ÇC][ÕO]ES\b"),
        HeaderRuleConfig::stop(r"(6\.?\s*|VI\.\s*)?INTERA[ÇC][ÕO]ES MEDICAMENTOSAS\b"),
        HeaderRuleConfig::stop(r"(7\.?\s*|VII\.\s*)?CUIDADOS DE ARMAZENAMENTO\b"),
        HeaderRuleConfig::stop(r"(10\.?\s*|X\.\s*)?SUPERDOSE\b"),
        HeaderRuleConfig::stop(r"\bDIZERES LEGAIS\b"),
        HeaderRuleConfig::stop(r"\bAPRESENTA[ÇC][ÕO]ES\b"),
    ]
}

fn generic_header_rules() -> Vec<HeaderRuleConfig> {
    vec![
        HeaderRuleConfig::label(r"\bCOMPOSI[ÇC][ÃA]O\b", Label::Composicao),
        HeaderRuleConfig::label(
            r"\bINDICA[ÇC]([ÃA]O|[ÕO]ES)\b|\bPARA QUE ESTE MEDICAMENTO( É| E)? INDICADO\b",
            Label::Indicacao,
        ),
        HeaderRuleConfig::label(
            r"\bCONTRAINDICA[ÇC]([ÃA]O|[ÕO]ES)\b|\bQUANDO N[ÃA]O DEVO USAR\b",
            Label::Contraindicacao,
        ),
        HeaderRuleConfig::label(
            r"\bPOSOLOGIA\b|\bCOMO DEVO USAR\b|\bMODO DE USAR\b|\bCOMO USAR\b",
            Label::Posologia,
        ),
        HeaderRuleConfig::label(
            r"\bREA[ÇC][ÕO]ES? ADVERSAS\b|\bEFEITOS? ADVERSOS\b|\bREA[ÇC][ÕO]ES INDESEJADAS\b|\bQUAIS OS MALES\b",
            Label::EfeitosAdversos,
        ),
    ]
}

impl SegmentationConfig {
    /// Built-in config for a leaflet family.
    pub fn for_family(family: DocumentFamily) -> Self {
        let header_rules = match family {
            DocumentFamily::PatientInsert => default_patient_header_rules(),
            DocumentFamily::ProfessionalInsert => professional_header_rules(),
            DocumentFamily::Generic => generic_header_rules(),
        };
        Self {
            document_family: family,
            header_rules,
            ..Self::default()
        }
    }

    /// Numeric sanity checks. Pattern checks happen when the engine compiles.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_record_chars < 1 {
            return Err(ConfigError::OutOfRange {
                field: "min_record_chars",
                min: 1,
                value: self.min_record_chars,
            });
        }
        if self.paragraph_break_newlines < 1 {
            return Err(ConfigError::OutOfRange {
                field: "paragraph_break_newlines",
                min: 1,
                value: self.paragraph_break_newlines,
            });
        }
        if self.header_rules.is_empty() {
            return Err(ConfigError::EmptyHeaderTable);
        }
        Ok(())
    }

    /// Load config from file path
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: SegmentationConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            document_family: DocumentFamily::PatientInsert,
            min_record_chars: default_min_record_chars(),
            paragraph_break_newlines: default_paragraph_break_newlines(),
            max_document_millis: default_max_document_millis(),
            junk_filter: JunkFilterConfig::default(),
            header_rules: default_patient_header_rules(),
        }
    }
}

/// One config per leaflet family. Files loaded later replace built-ins.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    configs: HashMap<DocumentFamily, SegmentationConfig>,
    default_config: SegmentationConfig,
}

impl ConfigManager {
    pub fn new() -> Self {
        let configs = DocumentFamily::ALL
            .into_iter()
            .map(|family| (family, SegmentationConfig::for_family(family)))
            .collect();
        Self {
            configs,
            default_config: SegmentationConfig::default(),
        }
    }

    pub fn get_config(&self, family: DocumentFamily) -> &SegmentationConfig {
        self.configs.get(&family).unwrap_or(&self.default_config)
    }

    pub fn insert(&mut self, config: SegmentationConfig) {
        self.configs.insert(config.document_family, config);
    }

    /// Load a YAML config and register it under its family.
    pub fn load_config_from_file(&mut self, path: impl AsRef<Path>) -> Result<DocumentFamily> {
        let config = SegmentationConfig::load_from_file(path)?;
        let family = config.document_family;
        self.insert(config);
        Ok(family)
    }

    /// Apply the same record length floor to every family.
    pub fn set_min_record_chars(&mut self, min_record_chars: usize) {
        for config in self.configs.values_mut() {
            config.min_record_chars = min_record_chars;
        }
        self.default_config.min_record_chars = min_record_chars;
    }

    pub fn configs(&self) -> impl Iterator<Item = &SegmentationConfig> {
        self.configs.values()
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = SegmentationConfig::default();
        assert_eq!(config.min_record_chars, 50);
        assert_eq!(config.paragraph_break_newlines, 2);
        assert!(config.junk_filter.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn yaml_fills_missing_fields_with_defaults() {
        let yaml = r#"
document_family: generic
min_record_chars: 30
header_rules:
  - pattern: 'MODO DE USAR'
    target: POSOLOGIA
  - pattern: 'ARMAZENAMENTO'
    target: STOP
"#;
        let config: SegmentationConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.document_family, DocumentFamily::Generic);
        assert_eq!(config.min_record_chars, 30);
        assert_eq!(config.paragraph_break_newlines, 2);
        assert_eq!(config.header_rules.len(), 2);
        assert_eq!(config.header_rules[1].target, RuleTarget::Stop);
        assert!(!config.junk_filter.patterns.is_empty());
    }

    #[test]
    fn yaml_rejects_unknown_target() {
        let yaml = "header_rules:\n  - pattern: 'X'\n    target: DOSAGEM\n";
        assert!(serde_yaml::from_str::<SegmentationConfig>(yaml).is_err());
    }

    #[test]
    fn validate_rejects_zero_threshold_and_empty_table() {
        let mut config = SegmentationConfig::default();
        config.min_record_chars = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { field: "min_record_chars", .. })
        ));

        let mut config = SegmentationConfig::default();
        config.header_rules.clear();
        assert!(matches!(config.validate(), Err(ConfigError::EmptyHeaderTable)));
    }

    #[test]
    fn manager_seeds_every_family_and_accepts_overrides() {
        let mut manager = ConfigManager::new();
        for family in DocumentFamily::ALL {
            assert_eq!(manager.get_config(family).document_family, family);
        }

        let mut custom = SegmentationConfig::for_family(DocumentFamily::Generic);
        custom.min_record_chars = 10;
        manager.insert(custom);
        assert_eq!(manager.get_config(DocumentFamily::Generic).min_record_chars, 10);

        manager.set_min_record_chars(80);
        assert!(manager.configs().all(|c| c.min_record_chars == 80));
    }

    #[test]
    fn broken_config_file_is_an_error_not_a_silent_default() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("generic.yaml");
        std::fs::write(&path, "document_family: generic\nmin_record_chars: 0\n").unwrap();

        let mut manager = ConfigManager::new();
        assert!(manager.load_config_from_file(&path).is_err());
        assert!(manager
            .load_config_from_file(dir.path().join("missing.yaml"))
            .is_err());
        assert_eq!(manager.get_config(DocumentFamily::Generic).min_record_chars, 50);
    }

    #[test]
    fn config_survives_yaml_round_trip() {
        let config = SegmentationConfig::for_family(DocumentFamily::ProfessionalInsert);
        let yaml = config.to_yaml().unwrap();
        let parsed: SegmentationConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.header_rules, config.header_rules);
        assert_eq!(parsed.document_family, DocumentFamily::ProfessionalInsert);
    }
}
