//! nexdoor leads - Lead list, draft entry and CSV import.
//!
//! # Architecture
//!
//! Every remote call goes through the [`store::LeadStore`] trait, implemented
//! over HTTP by [`store::HttpLeadStore`]. On top of it sit two independent
//! state machines:
//!
//! - [`staging::StagingController`] - the single unsaved draft
//! - [`ingest::IngestionPipeline`] - one CSV import at a time
//!
//! [`page::LeadsPage`] combines them with the confirmed list and the signed-in
//! [`session::Session`], and [`reconcile::render`] turns the result into rows.
//!
//! # Modules
//!
//! - [`config`] - Environment configuration
//! - [`error`] - Crate-level error type
//! - [`ingest`] - CSV parsing and bulk import
//! - [`page`] - Leads page coordinator
//! - [`reconcile`] - Row rendering
//! - [`session`] - Signed-in session and its persistence
//! - [`staging`] - Draft state machine
//! - [`store`] - Remote lead store client

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod ingest;
pub mod page;
pub mod reconcile;
pub mod session;
pub mod staging;
pub mod store;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;

pub use config::LeadsConfig;
pub use error::{Error, Precondition, Result};
pub use ingest::{IngestionError, IngestionPipeline, UploadFile};
pub use page::LeadsPage;
pub use reconcile::{DraftView, RenderRow, render};
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionStore, SessionUser};
pub use staging::{DraftSlot, SlotState, StagingController, StagingError};
pub use store::{HttpLeadStore, ImportBatch, ImportSummary, LeadStore};
