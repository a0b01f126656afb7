// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Extracted field mapping: label -> ordered, deduplicated values.
//
// Keys are kept in a `BTreeMap` and every value list is sorted and
// deduplicated on insertion, so serializing the same mapping always produces
// the same bytes.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single extracted value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Number(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    /// Total order: numbers before text, numbers by `total_cmp`, text
    /// lexicographically.
    fn canonical_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Number(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Number(_)) => Ordering::Greater,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// Mapping from label to a sorted, deduplicated value list.
///
/// Labels with no values are never stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractedFields(BTreeMap<String, Vec<FieldValue>>);

impl ExtractedFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add values under `label`, keeping the list sorted and unique.
    ///
    /// Text values are trimmed; empty strings and NaN are dropped. If nothing
    /// remains for a previously unseen label, the label is not created.
    pub fn extend<I, V>(&mut self, label: &str, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<FieldValue>,
    {
        let incoming: Vec<FieldValue> = values
            .into_iter()
            .map(Into::into)
            .filter_map(|value| match value {
                FieldValue::Text(s) => {
                    let trimmed = s.trim();
                    (!trimmed.is_empty()).then(|| FieldValue::Text(trimmed.to_owned()))
                }
                FieldValue::Number(n) => (!n.is_nan()).then_some(FieldValue::Number(n)),
            })
            .collect();

        if incoming.is_empty() {
            return;
        }

        let entry = self.0.entry(label.to_owned()).or_default();
        entry.extend(incoming);
        entry.sort_by(FieldValue::canonical_cmp);
        entry.dedup_by(|a, b| a.canonical_cmp(b) == Ordering::Equal);
    }

    /// Union `other` into `self`, label by label.
    pub fn merge(&mut self, other: ExtractedFields) {
        for (label, values) in other.0 {
            self.extend(&label, values);
        }
    }

    pub fn get(&self, label: &str) -> Option<&[FieldValue]> {
        self.0.get(label).map(Vec::as_slice)
    }

    /// Labels in sorted order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[FieldValue])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Text values under `label` (numbers skipped).
    pub fn texts(&self, label: &str) -> Vec<&str> {
        self.get(label)
            .map(|values| values.iter().filter_map(FieldValue::as_text).collect())
            .unwrap_or_default()
    }

    /// Numeric values under `label` (text skipped).
    pub fn numbers(&self, label: &str) -> Vec<f64> {
        self.get(label)
            .map(|values| values.iter().filter_map(FieldValue::as_number).collect())
            .unwrap_or_default()
    }
}
