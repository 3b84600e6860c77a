//! Lead record model and validation.
//!
//! A lead exists in three shapes:
//!
//! - [`LeadCandidate`] - untyped input from a CSV row, a store response or a
//!   draft being committed. Every field is optional free text.
//! - [`LeadFields`] - a validated field set without identity. A draft held by
//!   the staging controller is a `LeadFields`.
//! - [`Lead`] - a persisted record, which always carries an id and an owner.
//!
//! [`validate`] is the only way from a candidate to `LeadFields`.

use serde::Serialize;
use thiserror::Error;

use super::id::{LeadId, OwnerId};
use super::status::{Interest, LeadStatus};

/// Reasons a lead candidate is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The name is missing or whitespace only.
    #[error("lead name cannot be empty")]
    EmptyName,
}

/// A single editable lead field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeadField {
    Name,
    Phone,
    Status,
    Interest,
    LastCall,
    Notes,
    NextAction,
}

impl LeadField {
    /// All fields, in column order.
    pub const ALL: [Self; 7] = [
        Self::Name,
        Self::Phone,
        Self::Status,
        Self::Interest,
        Self::LastCall,
        Self::Notes,
        Self::NextAction,
    ];

    /// Wire (JSON) key of the field.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Phone => "phone",
            Self::Status => "status",
            Self::Interest => "interest",
            Self::LastCall => "lastCall",
            Self::Notes => "notes",
            Self::NextAction => "nextAction",
        }
    }

    /// Match a column header or JSON key to a field.
    ///
    /// Case, whitespace, `_` and `-` are ignored, so `Last Call`, `last_call`
    /// and `lastCall` all name [`LeadField::LastCall`].
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        let normalized: String = key
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match normalized.as_str() {
            "name" => Some(Self::Name),
            "phone" => Some(Self::Phone),
            "status" => Some(Self::Status),
            "interest" => Some(Self::Interest),
            "lastcall" => Some(Self::LastCall),
            "notes" => Some(Self::Notes),
            "nextaction" => Some(Self::NextAction),
            _ => None,
        }
    }
}

impl std::fmt::Display for LeadField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl std::str::FromStr for LeadField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s).ok_or_else(|| format!("unknown lead field: {s}"))
    }
}

/// Untyped lead input, prior to validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadCandidate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub status: Option<String>,
    pub interest: Option<String>,
    pub last_call: Option<String>,
    pub notes: Option<String>,
    pub next_action: Option<String>,
}

impl LeadCandidate {
    /// Set one field of the candidate.
    pub fn set(&mut self, field: LeadField, value: impl Into<String>) {
        let slot = match field {
            LeadField::Name => &mut self.name,
            LeadField::Phone => &mut self.phone,
            LeadField::Status => &mut self.status,
            LeadField::Interest => &mut self.interest,
            LeadField::LastCall => &mut self.last_call,
            LeadField::Notes => &mut self.notes,
            LeadField::NextAction => &mut self.next_action,
        };
        *slot = Some(value.into());
    }

    /// Builder-style variant of [`LeadCandidate::set`].
    #[must_use]
    pub fn with(mut self, field: LeadField, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }
}

/// Validated lead fields.
///
/// `Default` is the blank draft: empty text, `Pending`, `Medium`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadFields {
    pub name: String,
    pub phone: String,
    pub status: LeadStatus,
    pub interest: Interest,
    pub last_call: String,
    pub notes: String,
    pub next_action: String,
}

impl LeadFields {
    /// Apply a single field edit.
    ///
    /// Text is stored verbatim and nothing is validated; enum fields are
    /// coerced so the draft never holds an out-of-range value.
    pub fn set(&mut self, field: LeadField, value: &str) {
        match field {
            LeadField::Name => value.clone_into(&mut self.name),
            LeadField::Phone => value.clone_into(&mut self.phone),
            LeadField::Status => self.status = LeadStatus::coerce(value),
            LeadField::Interest => self.interest = Interest::coerce(value),
            LeadField::LastCall => value.clone_into(&mut self.last_call),
            LeadField::Notes => value.clone_into(&mut self.notes),
            LeadField::NextAction => value.clone_into(&mut self.next_action),
        }
    }

    /// Read one field as text.
    #[must_use]
    pub fn get(&self, field: LeadField) -> &str {
        match field {
            LeadField::Name => &self.name,
            LeadField::Phone => &self.phone,
            LeadField::Status => self.status.as_str(),
            LeadField::Interest => self.interest.as_str(),
            LeadField::LastCall => &self.last_call,
            LeadField::Notes => &self.notes,
            LeadField::NextAction => &self.next_action,
        }
    }

    /// Turn the fields back into a candidate so they can be re-validated.
    #[must_use]
    pub fn into_candidate(self) -> LeadCandidate {
        LeadCandidate {
            name: Some(self.name),
            phone: Some(self.phone),
            status: Some(self.status.as_str().to_owned()),
            interest: Some(self.interest.as_str().to_owned()),
            last_call: Some(self.last_call),
            notes: Some(self.notes),
            next_action: Some(self.next_action),
        }
    }
}

/// A lead persisted by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lead {
    pub id: LeadId,
    #[serde(rename = "idd")]
    pub owner_id: OwnerId,
    #[serde(flatten)]
    pub fields: LeadFields,
}

impl Lead {
    /// Build a persisted lead from store data.
    ///
    /// # Errors
    ///
    /// Returns the validation errors of the candidate.
    pub fn from_candidate(
        id: LeadId,
        owner_id: OwnerId,
        candidate: LeadCandidate,
    ) -> Result<Self, Vec<ValidationError>> {
        Ok(Self {
            id,
            owner_id,
            fields: validate(candidate)?,
        })
    }
}

/// Validate and normalize a lead candidate.
///
/// Text fields are trimmed and missing ones default to empty. Unknown
/// `status`/`interest` values are coerced to `Pending`/`Medium` rather than
/// failing the record.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyName`] when the name is missing or blank.
///
/// # Examples
///
/// ```
/// use nexdoor_core::{Interest, LeadCandidate, LeadField, LeadStatus, validate};
///
/// let candidate = LeadCandidate::default()
///     .with(LeadField::Name, " Ada ")
///     .with(LeadField::Interest, "sky high");
/// let fields = validate(candidate).unwrap();
/// assert_eq!(fields.name, "Ada");
/// assert_eq!(fields.status, LeadStatus::Pending);
/// assert_eq!(fields.interest, Interest::Medium);
///
/// assert!(validate(LeadCandidate::default()).is_err());
/// ```
pub fn validate(candidate: LeadCandidate) -> Result<LeadFields, Vec<ValidationError>> {
    let name = text(candidate.name);
    if name.is_empty() {
        return Err(vec![ValidationError::EmptyName]);
    }

    Ok(LeadFields {
        name,
        phone: text(candidate.phone),
        status: candidate
            .status
            .as_deref()
            .map(LeadStatus::coerce)
            .unwrap_or_default(),
        interest: candidate
            .interest
            .as_deref()
            .map(Interest::coerce)
            .unwrap_or_default(),
        last_call: text(candidate.last_call),
        notes: text(candidate.notes),
        next_action: text(candidate.next_action),
    })
}

fn text(value: Option<String>) -> String {
    value.map(|s| s.trim().to_owned()).unwrap_or_default()
}
