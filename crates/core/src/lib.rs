//! nexdoor core - Shared lead types library.
//!
//! This crate provides the types used across all nexdoor lead components:
//! - `leads` - Remote store client, CSV ingestion, draft staging and rendering
//! - `cli` - Command-line front end for the leads surface
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no persistence. Every piece of untrusted lead data (store JSON,
//! CSV rows, user edits) is funnelled through [`validate`] before it becomes a
//! typed [`Lead`] or [`LeadFields`].
//!
//! # Modules
//!
//! - [`types`] - Opaque ids, lead records, status enums and the page token

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
