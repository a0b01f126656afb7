// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Model recognizer seam: a pluggable, pretrained entity recognizer.

use insuredocs_core::error::Result;

/// A labelled span found by a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySpan {
    pub label: String,
    pub text: String,
}

impl EntitySpan {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }

    /// Spans of one character or less carry no information and are dropped.
    pub fn is_meaningful(&self) -> bool {
        self.text.trim().chars().count() > 1
    }
}

/// Pretrained entity recognizer.
///
/// Labels are the model's own (`ORG`, `DATE`, `MONEY`, ...) and are kept as
/// distinct keys from pattern labels.
pub trait EntityModel: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    fn recognize(&self, text: &str) -> Result<Vec<EntitySpan>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_character_spans_are_not_meaningful() {
        assert!(!EntitySpan::new("ORG", "A").is_meaningful());
        assert!(!EntitySpan::new("ORG", "  B ").is_meaningful());
        assert!(EntitySpan::new("ORG", "AB").is_meaningful());
    }
}
