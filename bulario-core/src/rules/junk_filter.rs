use super::{compile_pattern, PATTERN_SIZE_LIMIT};
use crate::config::JunkFilterConfig;
use crate::error::ConfigError;
use regex::{RegexSet, RegexSetBuilder};

/// Boilerplate detector: running headers, manufacturer names, page footers.
#[derive(Debug, Clone)]
pub struct JunkFilter {
    patterns: RegexSet,
}

impl JunkFilter {
    pub fn new(config: &JunkFilterConfig) -> Result<Self, ConfigError> {
        if !config.enabled {
            return Ok(Self::disabled());
        }
        // Compile one by one first so errors name the offending entry.
        for (index, pattern) in config.patterns.iter().enumerate() {
            compile_pattern("junk", index, pattern, false)?;
        }
        let patterns = RegexSetBuilder::new(&config.patterns)
            .case_insensitive(true)
            .size_limit(PATTERN_SIZE_LIMIT * config.patterns.len().max(1))
            .build()
            .map_err(|source| ConfigError::InvalidPattern {
                table: "junk",
                index: 0,
                pattern: config.patterns.join(" | "),
                source,
            })?;
        Ok(Self { patterns })
    }

    pub fn disabled() -> Self {
        Self {
            patterns: RegexSet::empty(),
        }
    }

    /// True when the line is boilerplate. Tested against the trimmed line;
    /// blank lines are never junk.
    pub fn is_junk(&self, line: &str) -> bool {
        let trimmed = line.trim();
        !trimmed.is_empty() && self.patterns.is_match(trimmed)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_filter() -> JunkFilter {
        JunkFilter::new(&JunkFilterConfig::default()).unwrap()
    }

    #[test]
    fn flags_manufacturer_and_footer_lines() {
        let filter = default_filter();
        assert!(filter.is_junk("EUROFARMA LABORATÓRIOS S.A."));
        assert!(filter.is_junk("Cimed Indústria de Medicamentos Ltda."));
        assert!(filter.is_junk("  Página 3 de 7"));
        assert!(filter.is_junk("Farm. Resp.: Dr. Fulano de Tal - CRF-SP 12.345"));
        assert!(filter.is_junk("Bula para o paciente - VP REV 02"));
    }

    #[test]
    fn keeps_content_and_blank_lines() {
        let filter = default_filter();
        assert!(!filter.is_junk("Tome 1 comprimido a cada 8 horas."));
        assert!(!filter.is_junk("6. COMO DEVO USAR ESTE MEDICAMENTO?"));
        assert!(!filter.is_junk(""));
        assert!(!filter.is_junk("   "));
    }

    #[test]
    fn disabled_filter_passes_everything() {
        let config = JunkFilterConfig {
            enabled: false,
            patterns: vec!["anything".to_string()],
        };
        let filter = JunkFilter::new(&config).unwrap();
        assert!(filter.is_empty());
        assert!(!filter.is_junk("anything at all"));
    }

    #[test]
    fn rejects_invalid_and_empty_matching_patterns() {
        let config = JunkFilterConfig {
            enabled: true,
            patterns: vec!["CNPJ".to_string(), "(unclosed".to_string()],
        };
        assert!(matches!(
            JunkFilter::new(&config),
            Err(ConfigError::InvalidPattern { index: 1, .. })
        ));

        let config = JunkFilterConfig {
            enabled: true,
            patterns: vec![r"\s*".to_string()],
        };
        assert!(matches!(
            JunkFilter::new(&config),
            Err(ConfigError::MatchesEmptyLine { index: 0, .. })
        ));
    }
}
