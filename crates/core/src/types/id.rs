//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create opaque ID wrappers that prevent
//! accidentally mixing IDs from different entity types. The remote lead
//! service hands out ids as either JSON strings or integers, so every id is
//! kept as its textual form and written back in the shape it arrived in.

use serde::{Deserialize, Serialize, Serializer};

/// Macro to define an opaque ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize` (integer-looking ids are written as JSON numbers)
/// - `Deserialize` accepting a JSON string or integer
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>`, `From<i64>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use nexdoor_core::define_id;
/// define_id!(TeamId);
/// define_id!(CampaignId);
///
/// let team_id = TeamId::new("7");
/// let campaign_id = CampaignId::from(7);
///
/// assert_eq!(team_id.as_str(), campaign_id.as_str());
/// // These are different types, so this won't compile:
/// // let _: TeamId = campaign_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from its textual form.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the textual form of the ID.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return its textual form.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> ::core::result::Result<S::Ok, S::Error>
            where
                S: ::serde::Serializer,
            {
                $crate::types::id::serialize_opaque(&self.0, serializer)
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                <$crate::types::id::RawId as ::serde::Deserialize>::deserialize(deserializer)
                    .map(|raw| Self(raw.into_string()))
            }
        }
    };
}

// Define standard entity IDs
define_id!(LeadId);
define_id!(OwnerId);

/// Wire form of an opaque id: the lead service is not consistent about
/// sending strings or numbers.
#[doc(hidden)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Signed(i64),
    Unsigned(u64),
    Text(String),
}

impl RawId {
    /// Textual form of the id, trimmed.
    #[must_use]
    pub fn into_string(self) -> String {
        match self {
            Self::Signed(n) => n.to_string(),
            Self::Unsigned(n) => n.to_string(),
            Self::Text(s) => s.trim().to_owned(),
        }
    }
}

/// Serialize an id as a JSON integer when its text is a canonical integer,
/// otherwise as a string.
#[doc(hidden)]
pub fn serialize_opaque<S: Serializer>(id: &str, serializer: S) -> Result<S::Ok, S::Error> {
    match id.parse::<i64>() {
        Ok(n) if n.to_string() == id => serializer.serialize_i64(n),
        _ => serializer.serialize_str(id),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_from_string_and_number() {
        let from_text: LeadId = serde_json::from_str("\"abc-1\"").unwrap();
        let from_number: LeadId = serde_json::from_str("42").unwrap();

        assert_eq!(from_text.as_str(), "abc-1");
        assert_eq!(from_number.as_str(), "42");
    }

    #[test]
    fn test_numeric_ids_serialize_as_numbers() {
        let owner = OwnerId::from(17);
        assert_eq!(serde_json::to_string(&owner).unwrap(), "17");
    }

    #[test]
    fn test_non_canonical_ids_stay_strings() {
        assert_eq!(
            serde_json::to_string(&OwnerId::new("007")).unwrap(),
            "\"007\""
        );
        assert_eq!(
            serde_json::to_string(&LeadId::new("lead_9")).unwrap(),
            "\"lead_9\""
        );
    }

    #[test]
    fn test_display_is_textual_form() {
        assert_eq!(format!("{}", OwnerId::new("u-5")), "u-5");
    }
}
