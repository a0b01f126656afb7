// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Normalized first-pass extraction: policy numbers, dates, and dollar
// amounts converted to numbers.

use insuredocs_core::error::{InsureDocsError, Result};
use insuredocs_core::ExtractedFields;
use regex::Regex;
use tracing::{debug, instrument, warn};

use crate::Extractor;

pub const POLICY_NUMBERS: &str = "policy_numbers";
pub const DATES: &str = "dates";
pub const AMOUNTS: &str = "amounts";

const POLICY_PATTERN: &str = r"\b([A-Z]{3}[-_]?\d{3,})\b";
const DATE_PATTERN: &str = r"\b(?:\d{1,2}[/-]\d{1,2}[/-]\d{4}|\d{4}[/-]\d{1,2}[/-]\d{1,2})\b";
const AMOUNT_PATTERN: &str = r"\$\s?(\d{1,3}(?:,?\d{3})*(?:\.\d{2})?)";

/// Parse a currency string such as `$1,234.56` into a number.
///
/// The currency symbol, thousands separators, and whitespace are stripped.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
        .collect();
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parse every raw amount, dropping (and logging) the ones that fail.
pub fn normalize_amounts<'a, I>(raw: I) -> Vec<f64>
where
    I: IntoIterator<Item = &'a str>,
{
    raw.into_iter()
        .filter_map(|value| {
            let parsed = parse_amount(value);
            if parsed.is_none() {
                warn!(value, "could not convert amount to a number, dropping");
            }
            parsed
        })
        .collect()
}

fn compile(label: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|err| InsureDocsError::InvalidPattern {
        label: label.to_owned(),
        reason: err.to_string(),
    })
}

#[derive(Debug, Clone)]
pub struct SummaryExtractor {
    policy: Regex,
    date: Regex,
    amount: Regex,
}

impl SummaryExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            policy: compile(POLICY_NUMBERS, POLICY_PATTERN)?,
            date: compile(DATES, DATE_PATTERN)?,
            amount: compile(AMOUNTS, AMOUNT_PATTERN)?,
        })
    }

    #[instrument(skip_all, fields(text_len = text.len()))]
    pub fn summarize(&self, text: &str) -> ExtractedFields {
        let mut fields = ExtractedFields::new();
        if text.trim().is_empty() {
            warn!("summary extraction called with empty text");
            return fields;
        }

        let policies = self
            .policy
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str());
        fields.extend(POLICY_NUMBERS, policies);

        fields.extend(DATES, self.date.find_iter(text).map(|m| m.as_str()));

        let raw_amounts = self
            .amount
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str());
        fields.extend(AMOUNTS, normalize_amounts(raw_amounts));

        debug!(labels = fields.len(), "summary extraction complete");
        fields
    }
}

impl Extractor for SummaryExtractor {
    fn extract(&self, text: &str) -> Result<ExtractedFields> {
        Ok(self.summarize(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_currency_strings() {
        assert_eq!(parse_amount("$1,234.56"), Some(1234.56));
        assert_eq!(parse_amount("$567"), Some(567.0));
        assert_eq!(parse_amount("$ 12,000"), Some(12000.0));
        assert_eq!(parse_amount("$12.3.4"), None);
        assert_eq!(parse_amount("$"), None);
    }

    #[test]
    fn unparsable_amounts_are_dropped_not_raised() {
        let amounts = normalize_amounts(["1,234.56", "oops", "567"]);
        assert_eq!(amounts, vec![1234.56, 567.0]);
    }

    #[test]
    fn claim_line_is_summarized() {
        let fields = SummaryExtractor::new()
            .expect("patterns")
            .summarize("Policy Number: ABC-123456 filed 2023-04-01 amount $1,234.56");

        assert_eq!(fields.texts(POLICY_NUMBERS), vec!["ABC-123456"]);
        assert!(fields.texts(DATES).contains(&"2023-04-01"));
        assert!(fields.numbers(AMOUNTS).contains(&1234.56));
    }

    #[test]
    fn amounts_dedup_numerically_and_sort_ascending() {
        let fields = SummaryExtractor::new()
            .expect("patterns")
            .summarize("Deductible $567, copay $25.00, again $567.00 and $1,000");
        assert_eq!(fields.numbers(AMOUNTS), vec![25.0, 567.0, 1000.0]);
    }

    #[test]
    fn us_and_underscore_forms() {
        let fields = SummaryExtractor::new()
            .expect("patterns")
            .summarize("Ref XYZ_0042 due 4/15/2024 and 2024/4/15");
        assert_eq!(fields.texts(POLICY_NUMBERS), vec!["XYZ_0042"]);
        assert_eq!(fields.texts(DATES), vec!["2024/4/15", "4/15/2024"]);
        assert!(fields.get(AMOUNTS).is_none());
    }
}
