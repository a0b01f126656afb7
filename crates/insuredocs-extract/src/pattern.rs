// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pattern recognizer: an ordered list of labelled regex rules, each with
// exactly one capture group.

use insuredocs_core::error::{InsureDocsError, Result};
use insuredocs_core::ExtractedFields;
use regex::Regex;
use tracing::debug;

/// Default entity rules, applied in this order.
///
/// Keyword-anchored identifiers are case-insensitive; date and amount rules
/// carry a `REGEX_` prefix so they never collide with model labels such as
/// `DATE` or `MONEY`.
pub const ENTITY_RULES: &[(&str, &str)] = &[
    (
        "POLICY_NUMBER",
        r"(?i)policy\s*(?:number|num|no|#)[:\s]*([A-Z0-9\-]{6,25})\b",
    ),
    (
        "CLAIM_NUMBER",
        r"(?i)claim\s*(?:number|num|no|#)[:\s]*([A-Z0-9\-]{6,25})\b",
    ),
    (
        "MEMBER_ID",
        r"(?i)\b(?:member|subscriber)\s*id[:\s]*([A-Z0-9]{5,20})\b",
    ),
    (
        "GROUP_NUMBER",
        r"(?i)\bgroup\s*(?:number|num|no|#)[:\s]*([A-Z0-9\-]{5,20})\b",
    ),
    ("REGEX_DATE_ISO", r"\b(\d{4}-\d{2}-\d{2})\b"),
    ("REGEX_DATE_US", r"\b(\d{1,2}[-/]\d{1,2}[-/]\d{4})\b"),
    ("REGEX_AMOUNT", r"(\$?\s?\d{1,3}(?:[,.]\d{3})*(?:\.\d{2})?)\b"),
    ("VIN", r"(?i)\b([A-HJ-NPR-Z0-9]{17})\b"),
];

/// One labelled rule.
#[derive(Debug, Clone)]
pub struct PatternRule {
    label: String,
    regex: Regex,
}

impl PatternRule {
    /// Compile `pattern` for `label`.
    ///
    /// Fails with `InvalidPattern` when the regex does not compile or does
    /// not have exactly one capture group.
    pub fn new(label: impl Into<String>, pattern: &str) -> Result<Self> {
        let label = label.into();
        let regex = Regex::new(pattern).map_err(|err| InsureDocsError::InvalidPattern {
            label: label.clone(),
            reason: err.to_string(),
        })?;

        // Group 0 is the whole match.
        let groups = regex.captures_len() - 1;
        if groups != 1 {
            return Err(InsureDocsError::InvalidPattern {
                label,
                reason: format!("expected exactly one capture group, found {groups}"),
            });
        }

        Ok(Self { label, regex })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Every trimmed, non-empty capture in `text`, in match order.
    pub fn captures<'t>(&self, text: &'t str) -> Vec<&'t str> {
        self.regex
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Applies every rule independently and collects results per label.
#[derive(Debug, Clone)]
pub struct PatternRecognizer {
    rules: Vec<PatternRule>,
}

impl PatternRecognizer {
    pub fn new(rules: Vec<PatternRule>) -> Self {
        Self { rules }
    }

    /// Compile `(label, pattern)` pairs in order.
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Result<Self> {
        let rules = pairs
            .iter()
            .map(|(label, pattern)| PatternRule::new(*label, pattern))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(rules))
    }

    /// The [`ENTITY_RULES`] set.
    pub fn with_default_rules() -> Result<Self> {
        Self::from_pairs(ENTITY_RULES)
    }

    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    /// Run every rule over `text`.
    pub fn recognize(&self, text: &str) -> ExtractedFields {
        let mut fields = ExtractedFields::new();
        for rule in &self.rules {
            let found = rule.captures(text);
            debug!(label = rule.label(), matches = found.len(), "pattern rule applied");
            fields.extend(rule.label(), found);
        }
        fields
    }
}
