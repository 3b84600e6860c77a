//! Core types for nexdoor leads.
//!
//! This module provides type-safe wrappers for the lead domain.

pub mod id;
pub mod lead;
pub mod page;
pub mod status;

pub use id::*;
pub use lead::{Lead, LeadCandidate, LeadField, LeadFields, ValidationError, validate};
pub use page::Page;
pub use status::*;
