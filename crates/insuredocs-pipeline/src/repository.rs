// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document repository backed by SQLite.
//
// The repository stores document metadata, status, the text artifact
// reference and the extracted field mapping (as JSON). PDF bytes and text
// artifacts live in the blob store and are referenced by relative path.
//
// A stored field mapping only ever accompanies a status that implies a
// completed extraction; every write that moves a document anywhere else
// clears it in the same statement.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info, instrument};

use insuredocs_core::error::{InsureDocsError, Result};
use insuredocs_core::{Document, DocumentId, DocumentStatus, ExtractedFields};

/// Operations the pipeline consumes.
pub trait DocumentRepository {
    fn get(&self, id: &DocumentId) -> Result<Option<Document>>;

    /// Set the status and bump `updated_at`.
    fn update_status(&self, id: &DocumentId, status: DocumentStatus) -> Result<()>;

    /// Record the text artifact reference together with `status`.
    fn update_ocr_result(
        &self,
        id: &DocumentId,
        text_ref: &str,
        status: DocumentStatus,
    ) -> Result<()>;

    /// Replace the field mapping wholesale together with `status`.
    fn update_extraction_result(
        &self,
        id: &DocumentId,
        fields: &ExtractedFields,
        status: DocumentStatus,
    ) -> Result<()>;
}

/// Hands out one repository session per task.
///
/// Sessions are dropped when the task ends, whichever way it ends.
pub trait SessionSource: Send + Sync {
    fn open_session(&self) -> Result<Box<dyn DocumentRepository>>;
}

/// SQLite schema for the documents table.
const CREATE_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS documents (
        id TEXT PRIMARY KEY,
        original_filename TEXT NOT NULL,
        stored_filename TEXT NOT NULL UNIQUE,
        status TEXT NOT NULL,
        text_artifact_ref TEXT,
        extracted_fields TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_documents_status ON documents (status);
"#;

const SELECT_COLUMNS: &str = "SELECT id, original_filename, stored_filename, status,
        text_artifact_ref, extracted_fields, created_at, updated_at
     FROM documents";

/// Filter and window for [`SqliteRepository::list`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentQuery {
    pub status: Option<DocumentStatus>,
    /// Case-insensitive substring of `original_filename`.
    pub search: Option<String>,
    pub offset: usize,
    /// `None` returns every remaining row.
    pub limit: Option<usize>,
}

/// Escape `LIKE` wildcards so the term matches literally.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Document repository on a single SQLite connection.
///
/// All methods are synchronous because `rusqlite` does not support async
/// natively. In an async context, wrap calls in `tokio::task::spawn_blocking`.
pub struct SqliteRepository {
    conn: Connection,
}

impl SqliteRepository {
    /// Open (or create) the database at `path` in WAL mode.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| InsureDocsError::Database(format!("open: {e}")))?;

        // Background tasks each hold their own connection; WAL lets readers
        // proceed while one of them writes.
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| InsureDocsError::Database(format!("WAL pragma: {e}")))?;
        conn.busy_timeout(std::time::Duration::from_secs(5))
            .map_err(|e| InsureDocsError::Database(format!("busy timeout: {e}")))?;

        conn.execute_batch(CREATE_TABLE_SQL)
            .map_err(|e| InsureDocsError::Database(format!("create table: {e}")))?;

        debug!("document database opened");
        Ok(Self { conn })
    }

    /// Open an in-memory database (useful for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| InsureDocsError::Database(format!("open in-memory: {e}")))?;

        conn.execute_batch(CREATE_TABLE_SQL)
            .map_err(|e| InsureDocsError::Database(format!("create table: {e}")))?;

        debug!("in-memory document database opened");
        Ok(Self { conn })
    }

    /// Insert a new document record.
    #[instrument(skip(self, document), fields(document_id = %document.id))]
    pub fn insert(&self, document: &Document) -> Result<()> {
        let fields_json = fields_column(document.status, document.extracted_fields.as_ref())?;

        self.conn
            .execute(
                "INSERT INTO documents (id, original_filename, stored_filename, status,
                 text_artifact_ref, extracted_fields, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    document.id.to_string(),
                    document.original_filename,
                    document.stored_filename,
                    document.status.as_str(),
                    document.text_artifact_ref,
                    fields_json,
                    document.created_at.to_rfc3339(),
                    document.updated_at.to_rfc3339(),
                ],
            )
            .map_err(|e| InsureDocsError::Database(format!("insert document: {e}")))?;

        info!(status = %document.status, "document inserted");
        Ok(())
    }

    /// Documents matching `query`, newest first.
    #[instrument(skip(self))]
    pub fn list(&self, query: &DocumentQuery) -> Result<Vec<Document>> {
        let status = query.status.map(|s| s.as_str()).unwrap_or("");
        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(like_pattern)
            .unwrap_or_default();
        // SQLite reads a negative LIMIT as "no limit".
        let limit = query
            .limit
            .map(|n| i64::try_from(n).unwrap_or(i64::MAX))
            .unwrap_or(-1);
        let offset = i64::try_from(query.offset).unwrap_or(i64::MAX);

        // ASCII LIKE is case-insensitive in SQLite.
        let sql = format!(
            "{SELECT_COLUMNS}
             WHERE (?1 = '' OR status = ?1)
               AND (?2 = '' OR original_filename LIKE ?2 ESCAPE '\\')
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?3 OFFSET ?4"
        );

        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| InsureDocsError::Database(format!("prepare list: {e}")))?;

        let documents = stmt
            .query_map(params![status, search, limit, offset], row_to_document)
            .map_err(|e| InsureDocsError::Database(format!("query list: {e}")))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| InsureDocsError::Database(format!("collect rows: {e}")))?;

        debug!(count = documents.len(), "listed documents");
        Ok(documents)
    }

    /// Delete a document record. Idempotent.
    #[instrument(skip(self), fields(document_id = %id))]
    pub fn delete(&self, id: &DocumentId) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM documents WHERE id = ?1", params![id.to_string()])
            .map_err(|e| InsureDocsError::Database(format!("delete document: {e}")))?;

        info!(deleted = rows > 0, "document delete requested");
        Ok(rows > 0)
    }

    fn expect_row(rows: usize, id: &DocumentId) -> Result<()> {
        if rows == 0 {
            return Err(InsureDocsError::Database(format!("document {id} not found")));
        }
        Ok(())
    }
}

impl DocumentRepository for SqliteRepository {
    #[instrument(skip(self), fields(document_id = %id))]
    fn get(&self, id: &DocumentId) -> Result<Option<Document>> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = ?1");
        self.conn
            .query_row(&sql, params![id.to_string()], row_to_document)
            .optional()
            .map_err(|e| InsureDocsError::Database(format!("get document: {e}")))
    }

    #[instrument(skip(self), fields(document_id = %id, status = %status))]
    fn update_status(&self, id: &DocumentId, status: DocumentStatus) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let sql = if status.implies_extraction() {
            "UPDATE documents SET status = ?1, updated_at = ?2 WHERE id = ?3"
        } else {
            "UPDATE documents SET status = ?1, updated_at = ?2, extracted_fields = NULL
             WHERE id = ?3"
        };

        let rows = self
            .conn
            .execute(sql, params![status.as_str(), now, id.to_string()])
            .map_err(|e| InsureDocsError::Database(format!("update status: {e}")))?;
        Self::expect_row(rows, id)?;

        debug!("document status updated");
        Ok(())
    }

    #[instrument(skip(self), fields(document_id = %id, status = %status))]
    fn update_ocr_result(
        &self,
        id: &DocumentId,
        text_ref: &str,
        status: DocumentStatus,
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let sql = if status.implies_extraction() {
            "UPDATE documents SET status = ?1, text_artifact_ref = ?2, updated_at = ?3
             WHERE id = ?4"
        } else {
            "UPDATE documents SET status = ?1, text_artifact_ref = ?2, updated_at = ?3,
             extracted_fields = NULL WHERE id = ?4"
        };

        let rows = self
            .conn
            .execute(sql, params![status.as_str(), text_ref, now, id.to_string()])
            .map_err(|e| InsureDocsError::Database(format!("update OCR result: {e}")))?;
        Self::expect_row(rows, id)?;

        debug!(text_ref, "OCR result recorded");
        Ok(())
    }

    #[instrument(skip(self, fields), fields(document_id = %id, status = %status, labels = fields.len()))]
    fn update_extraction_result(
        &self,
        id: &DocumentId,
        fields: &ExtractedFields,
        status: DocumentStatus,
    ) -> Result<()> {
        let fields_json = fields_column(status, Some(fields))?;
        let now = Utc::now().to_rfc3339();

        let rows = self
            .conn
            .execute(
                "UPDATE documents SET status = ?1, extracted_fields = ?2, updated_at = ?3
                 WHERE id = ?4",
                params![status.as_str(), fields_json, now, id.to_string()],
            )
            .map_err(|e| InsureDocsError::Database(format!("update extraction result: {e}")))?;
        Self::expect_row(rows, id)?;

        debug!("extraction result recorded");
        Ok(())
    }
}

/// Opens a fresh [`SqliteRepository`] on the same database file per session.
#[derive(Debug, Clone)]
pub struct SqliteSessionSource {
    path: PathBuf,
}

impl SqliteSessionSource {
    /// Create the source and make sure the schema exists.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        SqliteRepository::open(&path)?;
        info!(path = %path.display(), "document database ready");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A concrete repository for operations outside the pipeline trait.
    pub fn open(&self) -> Result<SqliteRepository> {
        SqliteRepository::open(&self.path)
    }
}

impl SessionSource for SqliteSessionSource {
    fn open_session(&self) -> Result<Box<dyn DocumentRepository>> {
        Ok(Box::new(self.open()?))
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

/// JSON for the `extracted_fields` column, or `NULL` when `status` does not
/// imply a completed extraction.
fn fields_column(
    status: DocumentStatus,
    fields: Option<&ExtractedFields>,
) -> Result<Option<String>> {
    match fields {
        Some(fields) if status.implies_extraction() => Ok(Some(serde_json::to_string(fields)?)),
        _ => Ok(None),
    }
}

fn conversion_error(
    column: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(err))
}

fn parse_timestamp(column: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(column, e))
}

/// Map a SQLite row to a `Document`.
///
/// Column indices must match [`SELECT_COLUMNS`].
fn row_to_document(row: &rusqlite::Row<'_>) -> rusqlite::Result<Document> {
    let id_str: String = row.get(0)?;
    let original_filename: String = row.get(1)?;
    let stored_filename: String = row.get(2)?;
    let status_str: String = row.get(3)?;
    let text_artifact_ref: Option<String> = row.get(4)?;
    let fields_json: Option<String> = row.get(5)?;
    let created_at_str: String = row.get(6)?;
    let updated_at_str: String = row.get(7)?;

    let id: DocumentId = id_str.parse().map_err(|e| conversion_error(0, e))?;
    let status: DocumentStatus = status_str.parse().map_err(|e| conversion_error(3, e))?;
    let extracted_fields = fields_json
        .map(|json| serde_json::from_str::<ExtractedFields>(&json))
        .transpose()
        .map_err(|e| conversion_error(5, e))?;

    Ok(Document {
        id,
        original_filename,
        stored_filename,
        status,
        text_artifact_ref,
        extracted_fields,
        created_at: parse_timestamp(6, &created_at_str)?,
        updated_at: parse_timestamp(7, &updated_at_str)?,
    })
}
