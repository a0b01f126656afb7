// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// InsureDocs Pipeline: document records, stored files, and the run that takes
// a document from upload to extracted fields. This crate wires the text
// extraction in `insuredocs-document` and the field extraction in
// `insuredocs-extract` to persistent state.

pub mod assembler;
pub mod blob;
pub mod dispatcher;
pub mod intake;
pub mod orchestrator;
pub mod repository;

pub use assembler::{Commit, FinalState, ResultAssembler};
pub use blob::{BlobStore, FsBlobStore};
pub use dispatcher::{Dispatcher, Submission};
pub use intake::{Decision, delete_document, ingest, record_decision};
pub use orchestrator::{DocumentText, Orchestrator, RunFailure, RunOutcome, RunReport};
pub use repository::{
    DocumentQuery, DocumentRepository, SessionSource, SqliteRepository, SqliteSessionSource,
};
