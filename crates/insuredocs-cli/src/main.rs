// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// InsureDocs: PDF intake pipeline with text-layer/OCR fallback and field
// extraction.
//
// Entry point. Initialises logging, loads the configuration, builds the
// services, and runs one subcommand. Results are printed to stdout as JSON;
// logs go to stderr.

mod services;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;

use insuredocs_core::config::ExtractionProfile;
use insuredocs_core::error::{InsureDocsError, Result};
use insuredocs_core::{DocumentId, DocumentStatus};
use insuredocs_pipeline::{Decision, DocumentQuery, Submission};

use services::app_services::{self, AppServices};
use services::data_dir;

#[derive(Parser, Debug)]
#[command(
    name = "insuredocs",
    version,
    about = "InsureDocs: store insurance PDFs, recover their text and extract structured fields"
)]
struct Args {
    /// Configuration file (defaults to config.json in the data directory)
    #[arg(long, global = true, env = "INSUREDOCS_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory holding the database and stored documents
    #[arg(long, global = true, env = "INSUREDOCS_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Store a PDF and queue it for processing
    Ingest {
        pdf: PathBuf,

        /// Run the pipeline right away instead of leaving it queued
        #[arg(long, default_value_t = false)]
        process: bool,
    },

    /// Run the pipeline for one or more documents and wait for all of them
    Process {
        #[arg(required = true)]
        ids: Vec<DocumentId>,
    },

    /// Print one document record
    Show { id: DocumentId },

    /// List document records, newest first
    List {
        #[arg(long)]
        status: Option<DocumentStatus>,

        /// Case-insensitive substring of the original filename
        #[arg(long)]
        search: Option<String>,

        #[arg(long, default_value_t = 0)]
        offset: usize,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// Delete a document record with its stored PDF and text artifact
    Delete { id: DocumentId },

    /// Extract fields from a plain text file without touching the database
    Extract {
        text_file: PathBuf,

        /// summary | entities | combined (defaults to the configured profile)
        #[arg(long)]
        profile: Option<ExtractionProfile>,
    },

    /// Approve a completed extraction
    Approve { id: DocumentId },

    /// Reject a completed extraction
    Reject { id: DocumentId },

    /// Print the effective configuration
    Config,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let dir = data_dir::data_dir(args.data_dir.as_deref())?;
    let config = app_services::load_config(args.config.as_deref(), &dir)?;

    // Commands that never touch storage.
    match &args.command {
        Command::Config => return print_json(&config),
        Command::Extract { text_file, profile } => {
            let text = std::fs::read_to_string(text_file)?;
            let fields =
                app_services::extract_fields(&text, profile.unwrap_or(config.extraction.profile))?;
            return print_json(&fields);
        }
        _ => {}
    }

    let svc = AppServices::init(dir, config)?;

    match args.command {
        Command::Ingest { pdf, process } => {
            let document = svc.ingest_file(&pdf)?;
            if process {
                print_json(&svc.process_now(&document.id)?)?;
            }
            print_document(&svc, &document.id)
        }
        Command::Process { ids } => process_all(&svc, ids),
        Command::Show { id } => print_document(&svc, &id),
        Command::List {
            status,
            search,
            offset,
            limit,
        } => print_json(&svc.list(&DocumentQuery {
            status,
            search,
            offset,
            limit,
        })?),
        Command::Delete { id } => {
            let deleted = svc.delete(&id)?;
            print_json(&serde_json::json!({ "id": id, "deleted": deleted }))
        }
        Command::Approve { id } => print_json(&svc.decide(&id, Decision::Approve)?),
        Command::Reject { id } => print_json(&svc.decide(&id, Decision::Reject)?),
        Command::Config | Command::Extract { .. } => Ok(()),
    }
}

/// Dispatch every id through the worker pool and print each outcome.
fn process_all(svc: &AppServices, ids: Vec<DocumentId>) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let dispatcher = svc.dispatcher();
        let mut handles = Vec::with_capacity(ids.len());
        for id in ids {
            match dispatcher.submit(id) {
                Submission::Queued(handle) => handles.push((id, handle)),
                Submission::AlreadyRunning => {
                    tracing::warn!(document_id = %id, "duplicate id on the command line; skipped");
                }
            }
        }

        for (id, handle) in handles {
            let outcome = handle
                .await
                .map_err(|e| InsureDocsError::Unhandled(format!("run for {id} did not finish: {e}")))??;
            print_json(&serde_json::json!({ "id": id, "result": outcome }))?;
        }
        Ok(())
    })
}

fn print_document(svc: &AppServices, id: &DocumentId) -> Result<()> {
    let document = svc
        .show(id)?
        .ok_or_else(|| InsureDocsError::Database(format!("document {id} not found")))?;
    print_json(&document)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
