use super::compile_pattern;
use crate::config::HeaderRuleConfig;
use crate::error::ConfigError;
use crate::types::{HeaderOutcome, RuleTarget};
use regex::Regex;

/// One compiled header rule.
#[derive(Debug, Clone)]
pub struct PatternRule {
    regex: Regex,
    target: RuleTarget,
}

impl PatternRule {
    pub fn target(&self) -> RuleTarget {
        self.target
    }

    pub fn is_match(&self, trimmed_line: &str) -> bool {
        self.regex.is_match(trimmed_line)
    }
}

/// Ordered header table. Rules are tried in config order and the first match
/// wins; that order is the only tie-breaker between overlapping rules, so a
/// Stop rule listed before a label rule shadows it and vice versa.
#[derive(Debug, Clone)]
pub struct PatternTable {
    rules: Vec<PatternRule>,
}

impl PatternTable {
    pub fn new(rules: &[HeaderRuleConfig]) -> Result<Self, ConfigError> {
        if rules.is_empty() {
            return Err(ConfigError::EmptyHeaderTable);
        }
        let rules = rules
            .iter()
            .enumerate()
            .map(|(index, rule)| {
                Ok(PatternRule {
                    regex: compile_pattern("header", index, &rule.pattern, true)?,
                    target: rule.target,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Ok(Self { rules })
    }

    /// Header outcome for a line. Blank lines never match.
    pub fn match_header(&self, line: &str) -> HeaderOutcome {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return HeaderOutcome::NoMatch;
        }
        self.rules
            .iter()
            .find(|rule| rule.is_match(trimmed))
            .map_or(HeaderOutcome::NoMatch, |rule| rule.target.into())
    }

    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
