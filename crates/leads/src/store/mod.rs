//! Remote lead store.
//!
//! This module provides:
//! - [`LeadStore`], the seam every other component talks to
//! - [`HttpLeadStore`], the reqwest-backed client for the lead service
//! - [`ImportBatch`] / [`ImportSummary`] for bulk imports
//!
//! All transport failures are converted into [`FetchError`] / [`StoreError`]
//! here; nothing in this module touches local state.
//!
//! # Endpoints
//!
//! - `GET /leads?idd={owner}` → `{ data: Lead[] }`
//! - `POST /leads` with `{ ...fields, idd }` → `{}` or `{ error }`
//! - `POST /upload` multipart `file` + `user_id` → `{ file }` or `{ error }`
//! - `POST /login` with `{ email, password }` → `{ success, user }`

mod client;
mod error;
pub(crate) mod types;

use std::future::Future;

pub use client::HttpLeadStore;
pub use error::{ClientInitError, FetchError, LoginError, StoreError};

use nexdoor_core::{Lead, LeadField, LeadFields, OwnerId};

/// Operations against the service of record for leads.
pub trait LeadStore: Send + Sync {
    /// List the leads owned by `owner`, in store order.
    ///
    /// An owner with no leads yields an empty list, not an error.
    fn list_leads(
        &self,
        owner: &OwnerId,
    ) -> impl Future<Output = Result<Vec<Lead>, FetchError>> + Send;

    /// Create one lead.
    ///
    /// Returns the persisted record when the store echoes it back.
    fn create_lead(
        &self,
        fields: &LeadFields,
        owner: &OwnerId,
    ) -> impl Future<Output = Result<Option<Lead>, StoreError>> + Send;

    /// Submit a batch of leads as a single upload.
    ///
    /// Row-level rejection is reported in the summary; only transport or
    /// server failure fails the call.
    fn bulk_import(
        &self,
        batch: &ImportBatch,
        owner: &OwnerId,
    ) -> impl Future<Output = Result<ImportSummary, StoreError>> + Send;
}

/// A validated batch of leads ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBatch {
    file_name: String,
    leads: Vec<LeadFields>,
}

impl ImportBatch {
    /// Create a batch from validated leads.
    #[must_use]
    pub fn new(file_name: impl Into<String>, leads: Vec<LeadFields>) -> Self {
        Self {
            file_name: file_name.into(),
            leads,
        }
    }

    /// Name of the file the batch came from.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// The leads in the batch.
    #[must_use]
    pub fn leads(&self) -> &[LeadFields] {
        &self.leads
    }

    /// Number of leads in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.leads.len()
    }

    /// Whether the batch has no leads.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.leads.is_empty()
    }

    /// Encode the batch as CSV with one column per [`LeadField`], in wire
    /// key order.
    ///
    /// # Errors
    ///
    /// Returns an error if the CSV writer fails.
    pub fn to_csv(&self) -> Result<Vec<u8>, csv::Error> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(LeadField::ALL.iter().map(|field| field.key()))?;
        for lead in &self.leads {
            writer.write_record(LeadField::ALL.iter().map(|field| lead.get(*field)))?;
        }
        writer
            .into_inner()
            .map_err(|e| csv::Error::from(std::io::Error::new(e.error().kind(), e.to_string())))
    }
}

/// Outcome of a bulk import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Name under which the store saved the upload.
    pub file: Option<String>,
    /// Rows the store accepted.
    pub accepted: usize,
    /// Rows the store rejected.
    pub rejected: usize,
    /// Rows dropped locally because they failed validation.
    pub skipped: usize,
}

impl ImportSummary {
    /// Whether any rows were sent to the store.
    #[must_use]
    pub const fn uploaded(&self) -> bool {
        self.file.is_some() || self.accepted > 0 || self.rejected > 0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_to_csv_writes_header_and_rows() {
        let batch = ImportBatch::new(
            "leads.csv",
            vec![LeadFields {
                name: "Ada, Countess".to_string(),
                phone: "555".to_string(),
                ..LeadFields::default()
            }],
        );

        let csv = String::from_utf8(batch.to_csv().unwrap()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("name,phone,status,interest,lastCall,notes,nextAction")
        );
        assert_eq!(lines.next(), Some("\"Ada, Countess\",555,Pending,Medium,,,"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_empty_batch() {
        let batch = ImportBatch::new("empty.csv", Vec::new());
        assert!(batch.is_empty());
        assert_eq!(batch.len(), 0);
        assert_eq!(batch.file_name(), "empty.csv");
    }

    #[test]
    fn test_summary_uploaded() {
        assert!(!ImportSummary::default().uploaded());
        assert!(
            !ImportSummary {
                skipped: 3,
                ..ImportSummary::default()
            }
            .uploaded()
        );
        assert!(
            ImportSummary {
                rejected: 1,
                ..ImportSummary::default()
            }
            .uploaded()
        );
        assert!(
            ImportSummary {
                file: Some("leads.csv".to_string()),
                ..ImportSummary::default()
            }
            .uploaded()
        );
        assert!(
            ImportSummary {
                accepted: usize::MAX,
                rejected: 1,
                ..ImportSummary::default()
            }
            .uploaded()
        );
    }
}
