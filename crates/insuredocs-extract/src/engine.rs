// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Entity extraction engine: pattern recognizer plus optional model
// recognizer, merged label by label.
//
// Each run starts from an empty mapping, so re-running on identical text
// yields an identical result. A failing model is logged and its output is
// skipped; pattern results are still returned.

use std::fmt;
use std::sync::Arc;

use insuredocs_core::error::Result;
use insuredocs_core::ExtractedFields;
use tracing::{debug, error, instrument, warn};

use crate::model::EntityModel;
use crate::pattern::PatternRecognizer;
use crate::Extractor;

#[derive(Clone)]
pub struct EntityExtractor {
    patterns: PatternRecognizer,
    model: Option<Arc<dyn EntityModel>>,
}

impl fmt::Debug for EntityExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityExtractor")
            .field("rules", &self.patterns.rules().len())
            .field("model", &self.model.as_ref().map(|m| m.name().to_owned()))
            .finish()
    }
}

impl EntityExtractor {
    pub fn new(patterns: PatternRecognizer) -> Self {
        debug!("no entity model configured; pattern rules only");
        Self {
            patterns,
            model: None,
        }
    }

    /// Default entity rules, no model.
    pub fn with_default_rules() -> Result<Self> {
        Ok(Self::new(PatternRecognizer::with_default_rules()?))
    }

    /// Attach a model recognizer.
    pub fn with_model(mut self, model: Arc<dyn EntityModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Extract entities from `text`.
    #[instrument(skip_all, fields(text_len = text.len()))]
    pub fn extract_entities(&self, text: &str) -> ExtractedFields {
        if text.trim().is_empty() {
            warn!("entity extraction called with empty text");
            return ExtractedFields::new();
        }

        let mut fields = self.patterns.recognize(text);

        if let Some(model) = &self.model {
            match model.recognize(text) {
                Ok(spans) => {
                    let total = spans.len();
                    let mut kept = 0usize;
                    for span in spans.into_iter().filter(|s| s.is_meaningful()) {
                        kept += 1;
                        fields.extend(&span.label, [span.text]);
                    }
                    debug!(model = model.name(), total, kept, "model spans merged");
                }
                Err(err) => {
                    error!(model = model.name(), error = %err, "entity model failed; keeping pattern results");
                }
            }
        }

        debug!(labels = fields.len(), "entity extraction complete");
        fields
    }
}

impl Extractor for EntityExtractor {
    fn extract(&self, text: &str) -> Result<ExtractedFields> {
        Ok(self.extract_entities(text))
    }
}
