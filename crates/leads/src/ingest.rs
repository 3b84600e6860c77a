//! CSV lead import.
//!
//! Turns an uploaded file into a validated [`ImportBatch`] and submits it
//! through a [`LeadStore`].
//!
//! # Flow
//!
//! 1. Refuse without a file or a signed-in user (no network call)
//! 2. Refuse if another import is still in flight
//! 3. Parse the file as CSV with headers; any column order, header spelling
//!    variants and missing optional columns are accepted, but a name column
//!    is required
//! 4. Validate every row; rows without a name are dropped and counted
//! 5. Submit the surviving rows as one upload
//!
//! Import is best-effort: a bad row never blocks the rest of the file.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use nexdoor_core::{LeadCandidate, LeadField, LeadFields, OwnerId, validate};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::error::Precondition;
use crate::store::{ImportBatch, ImportSummary, LeadStore, StoreError};

/// Errors that fail a whole import.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Missing file or user.
    #[error(transparent)]
    Precondition(#[from] Precondition),

    /// The file cannot be read as delimited text.
    #[error("file is not a readable CSV: {0}")]
    Malformed(String),

    /// Another import is still in flight.
    #[error("an upload is already in progress")]
    Busy,

    /// The store failed or refused the upload.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A file picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    name: String,
    bytes: Vec<u8>,
}

impl UploadFile {
    /// Wrap an in-memory file.
    #[must_use]
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, named after its final path component.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read.
    pub async fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map_or_else(|| "upload.csv".to_string(), |n| n.to_string_lossy().into_owned());
        Ok(Self { name, bytes })
    }

    /// File name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File contents.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Rows recovered from a CSV file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedLeads {
    /// Rows that passed validation, in file order.
    pub leads: Vec<LeadFields>,
    /// Rows dropped because they failed validation.
    pub skipped: usize,
}

/// Parse CSV bytes into validated leads.
///
/// Headers are matched with [`LeadField::from_key`]; unknown columns are
/// ignored and a repeated column only counts the first time. Rows may be
/// shorter or longer than the header. Rows whose cells are all empty are
/// ignored without being counted as skipped.
///
/// # Errors
///
/// Returns [`IngestionError::Malformed`] if the bytes are not UTF-8 delimited
/// text, the file has no header row or no header names the lead.
pub fn parse_leads(bytes: &[u8]) -> Result<ParsedLeads, IngestionError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| IngestionError::Malformed(e.to_string()))?
        .clone();

    if headers.iter().all(str::is_empty) {
        return Err(IngestionError::Malformed("file has no header row".to_string()));
    }

    let mut seen = Vec::with_capacity(LeadField::ALL.len());
    let columns: Vec<Option<LeadField>> = headers
        .iter()
        .map(|header| {
            let field = LeadField::from_key(header)?;
            if seen.contains(&field) {
                return None;
            }
            seen.push(field);
            Some(field)
        })
        .collect();

    debug!(?columns, "Mapped CSV header");

    if !columns.contains(&Some(LeadField::Name)) {
        return Err(IngestionError::Malformed("no name column".to_string()));
    }

    let mut parsed = ParsedLeads::default();
    for record in reader.records() {
        let record = record.map_err(|e| IngestionError::Malformed(e.to_string()))?;
        if record.iter().all(str::is_empty) {
            continue;
        }

        let mut candidate = LeadCandidate::default();
        for (column, value) in columns.iter().zip(record.iter()) {
            if let Some(field) = column
                && !value.is_empty()
            {
                candidate.set(*field, value);
            }
        }

        match validate(candidate) {
            Ok(lead) => parsed.leads.push(lead),
            Err(_) => parsed.skipped += 1,
        }
    }

    Ok(parsed)
}

/// Runs CSV imports, one at a time.
#[derive(Debug, Default)]
pub struct IngestionPipeline {
    in_flight: AtomicBool,
}

impl IngestionPipeline {
    /// Create an idle pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an import is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Import `file` for `owner`.
    ///
    /// A file with no valid rows (for example header-only) returns an empty
    /// summary without contacting the store.
    ///
    /// # Errors
    ///
    /// - [`IngestionError::Precondition`] without a file or user
    /// - [`IngestionError::Busy`] while another import is in flight
    /// - [`IngestionError::Malformed`] if the file is not CSV
    /// - [`IngestionError::Store`] if the upload fails
    #[instrument(skip_all, fields(owner = ?owner, file = ?file.as_ref().map(UploadFile::name)))]
    pub async fn ingest<S: LeadStore>(
        &self,
        store: &S,
        owner: Option<&OwnerId>,
        file: Option<UploadFile>,
    ) -> Result<ImportSummary, IngestionError> {
        let file = file.ok_or(Precondition::NoFile)?;
        let owner = owner.ok_or(Precondition::NotAuthenticated)?;
        let _guard = InFlight::acquire(&self.in_flight).ok_or(IngestionError::Busy)?;

        let parsed = parse_leads(file.bytes())?;
        if parsed.leads.is_empty() {
            info!(skipped = parsed.skipped, "No importable rows, nothing uploaded");
            return Ok(ImportSummary {
                skipped: parsed.skipped,
                ..ImportSummary::default()
            });
        }

        let skipped = parsed.skipped;
        let batch = ImportBatch::new(file.name(), parsed.leads);
        let mut summary = store.bulk_import(&batch, owner).await?;
        summary.skipped = skipped;

        info!(
            accepted = summary.accepted,
            rejected = summary.rejected,
            skipped,
            "Import finished"
        );

        Ok(summary)
    }
}

/// Holds the in-flight flag until dropped.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
