// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Profile dispatch: which extractors run, and how their outputs combine.

use std::sync::Arc;

use insuredocs_core::config::ExtractionProfile;
use insuredocs_core::error::Result;
use insuredocs_core::ExtractedFields;
use tracing::{info, instrument};

use crate::engine::EntityExtractor;
use crate::model::EntityModel;
use crate::summary::SummaryExtractor;
use crate::Extractor;

/// The extractor the pipeline runs, configured by [`ExtractionProfile`].
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    profile: ExtractionProfile,
    entities: EntityExtractor,
    summary: SummaryExtractor,
}

impl FieldExtractor {
    pub fn new(profile: ExtractionProfile) -> Result<Self> {
        info!(?profile, "building field extractor");
        Ok(Self {
            profile,
            entities: EntityExtractor::with_default_rules()?,
            summary: SummaryExtractor::new()?,
        })
    }

    pub fn with_model(mut self, model: Arc<dyn EntityModel>) -> Self {
        self.entities = self.entities.with_model(model);
        self
    }

    pub fn profile(&self) -> ExtractionProfile {
        self.profile
    }

    /// Run the configured extractors on `text`.
    ///
    /// The summary labels (`policy_numbers`, `dates`, `amounts`) and the
    /// entity labels never overlap, so the combined profile is a plain union.
    #[instrument(skip_all, fields(profile = ?self.profile))]
    pub fn extract_fields(&self, text: &str) -> ExtractedFields {
        match self.profile {
            ExtractionProfile::Summary => self.summary.summarize(text),
            ExtractionProfile::Entities => self.entities.extract_entities(text),
            ExtractionProfile::Combined => {
                let mut fields = self.summary.summarize(text);
                fields.merge(self.entities.extract_entities(text));
                fields
            }
        }
    }
}

impl Extractor for FieldExtractor {
    fn extract(&self, text: &str) -> Result<ExtractedFields> {
        Ok(self.extract_fields(text))
    }
}
