// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// insuredocs-extract: structured fields from document text.
//
// Two rule sets live here. The entity engine runs ordered, labelled regex
// rules plus an optional pretrained model. The summary extractor pulls policy
// numbers, dates, and numeric amounts for search and dashboards.

pub mod engine;
pub mod model;
pub mod pattern;
pub mod profile;
pub mod summary;

use insuredocs_core::error::Result;
use insuredocs_core::ExtractedFields;

pub use engine::EntityExtractor;
pub use model::{EntityModel, EntitySpan};
pub use pattern::{ENTITY_RULES, PatternRecognizer, PatternRule};
pub use profile::FieldExtractor;
pub use summary::{SummaryExtractor, normalize_amounts, parse_amount};

/// Anything that turns document text into a field mapping.
///
/// Every call starts from an empty mapping; results are never merged with a
/// previous run.
pub trait Extractor: Send + Sync {
    fn extract(&self, text: &str) -> Result<ExtractedFields>;
}
