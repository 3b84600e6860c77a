//! Unified error handling for the leads surface.

use thiserror::Error;

use crate::config::ConfigError;
use crate::ingest::IngestionError;
use crate::session::SessionError;
use crate::staging::StagingError;
use crate::store::{ClientInitError, FetchError, LoginError, StoreError};

/// A local check that failed before any network call was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Precondition {
    /// No file was selected for upload.
    #[error("No file selected")]
    NoFile,

    /// Nobody is signed in.
    #[error("User not logged in")]
    NotAuthenticated,
}

/// Application-level error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The HTTP client could not be built.
    #[error("Client error: {0}")]
    Client(#[from] ClientInitError),

    /// Session persistence failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Signing in failed.
    #[error("Login failed: {0}")]
    Login(#[from] LoginError),

    /// Listing leads failed.
    #[error("Failed to fetch leads: {0}")]
    Fetch(#[from] FetchError),

    /// A store write failed.
    #[error("Error saving lead: {0}")]
    Store(#[from] StoreError),

    /// A CSV import failed.
    #[error("Upload failed: {0}")]
    Ingestion(#[from] IngestionError),

    /// A draft operation failed.
    #[error(transparent)]
    Staging(#[from] StagingError),

    /// A local precondition failed.
    #[error(transparent)]
    Precondition(#[from] Precondition),
}

/// Result alias using the crate [`enum@Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;
