// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Background dispatch of pipeline runs.
//
// Runs execute on tokio's blocking pool, at most `max_concurrent` at a time.
// A document id can only have one run in flight: a second submission while
// the first is queued or running is refused. The in-flight marker is held
// by a guard that is released when the run ends, however it ends.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{Instrument, Span, debug, info, info_span};

use insuredocs_core::error::{InsureDocsError, Result};
use insuredocs_core::DocumentId;

use crate::orchestrator::{Orchestrator, RunOutcome};

type InFlight = Arc<Mutex<HashSet<DocumentId>>>;

/// Removes its id from the in-flight set on drop.
struct InFlightGuard {
    in_flight: InFlight,
    id: DocumentId,
}

impl InFlightGuard {
    fn acquire(in_flight: &InFlight, id: DocumentId) -> Option<Self> {
        let inserted = in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id);
        inserted.then(|| Self {
            in_flight: Arc::clone(in_flight),
            id,
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
        debug!(document_id = %self.id, "in-flight marker released");
    }
}

/// Result of [`Dispatcher::submit`].
#[derive(Debug)]
pub enum Submission {
    Queued(JoinHandle<Result<RunOutcome>>),
    /// A run for this id is already queued or running.
    AlreadyRunning,
}

/// Bounded, single-flight dispatcher for pipeline runs.
#[derive(Clone)]
pub struct Dispatcher {
    orchestrator: Arc<Orchestrator>,
    permits: Arc<Semaphore>,
    in_flight: InFlight,
}

impl Dispatcher {
    pub fn new(orchestrator: Arc<Orchestrator>, max_concurrent: usize) -> Self {
        Self {
            orchestrator,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn is_running(&self, id: &DocumentId) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(id)
    }

    /// Queue a run for `id`. Must be called from within a tokio runtime.
    pub fn submit(&self, id: DocumentId) -> Submission {
        let Some(guard) = InFlightGuard::acquire(&self.in_flight, id) else {
            info!(document_id = %id, "run already in flight; submission refused");
            return Submission::AlreadyRunning;
        };

        let orchestrator = Arc::clone(&self.orchestrator);
        let permits = Arc::clone(&self.permits);
        let span = info_span!("pipeline_run", document_id = %id);

        let handle = tokio::spawn(
            async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|e| InsureDocsError::Unhandled(format!("dispatcher closed: {e}")))?;
                debug!("worker permit acquired");

                // The guard moves into the blocking closure so the marker is
                // held for as long as the run actually executes.
                let run_span = Span::current();
                tokio::task::spawn_blocking(move || {
                    let _guard = guard;
                    let _entered = run_span.entered();
                    orchestrator.process(&id)
                })
                .await
                .map_err(|e| InsureDocsError::Unhandled(format!("worker task failed: {e}")))?
            }
            .instrument(span),
        );

        info!(document_id = %id, "run queued");
        Submission::Queued(handle)
    }
}
