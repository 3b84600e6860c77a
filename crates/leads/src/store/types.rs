//! Wire types for the lead service.

use nexdoor_core::{Lead, LeadCandidate, LeadField, LeadFields, LeadId, OwnerId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys the service has used for the owning user's id.
const OWNER_KEYS: [&str; 4] = ["idd", "ownerId", "owner_id", "user_id"];

/// `GET /leads` response.
#[derive(Debug, Deserialize)]
pub(crate) struct ListResponse {
    #[serde(default)]
    pub data: Option<Vec<Value>>,
}

/// `POST /leads` request body.
#[derive(Debug, Serialize)]
pub(crate) struct CreateLeadRequest<'a> {
    #[serde(flatten)]
    pub fields: &'a LeadFields,
    pub idd: &'a OwnerId,
}

/// `POST /leads` response. `{}` on success; `{ error }` bodies are turned
/// into rejections before this is read.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct CreateLeadResponse {
    #[serde(default)]
    pub data: Option<Value>,
}

/// `POST /upload` response.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct UploadResponse {
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub accepted: Option<usize>,
    #[serde(default)]
    pub rejected: Option<usize>,
}

/// `POST /login` request body.
#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// `POST /login` response.
#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub user: Option<Value>,
}

/// Why a record in a lead list was not turned into a [`Lead`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SkipReason {
    NotAnObject,
    MissingId,
    Invalid(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAnObject => f.write_str("record is not an object"),
            Self::MissingId => f.write_str("record has no id"),
            Self::Invalid(reason) => write!(f, "record failed validation: {reason}"),
        }
    }
}

/// Turn one untyped record of a lead list into a [`Lead`].
///
/// The record is owner-scoped by the request, so a record without an owner
/// key is attributed to `owner`.
pub(crate) fn decode_lead(value: &Value, owner: &OwnerId) -> Result<Lead, SkipReason> {
    let object = value.as_object().ok_or(SkipReason::NotAnObject)?;

    let id = object
        .get("id")
        .and_then(scalar_text)
        .filter(|id| !id.is_empty())
        .map(LeadId::new)
        .ok_or(SkipReason::MissingId)?;

    let owner_id = OWNER_KEYS
        .iter()
        .find_map(|key| object.get(*key).and_then(scalar_text))
        .filter(|owner| !owner.is_empty())
        .map_or_else(|| owner.clone(), OwnerId::new);

    Lead::from_candidate(id, owner_id, candidate_from_object(object)).map_err(|errors| {
        SkipReason::Invalid(
            errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        )
    })
}

fn candidate_from_object(object: &Map<String, Value>) -> LeadCandidate {
    let mut candidate = LeadCandidate::default();
    for (key, value) in object {
        if let (Some(field), Some(text)) = (LeadField::from_key(key), scalar_text(value)) {
            candidate.set(field, text);
        }
    }
    candidate
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_owned()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use nexdoor_core::{Interest, LeadStatus};
    use serde_json::json;

    use super::*;

    fn owner() -> OwnerId {
        OwnerId::from(7)
    }

    #[test]
    fn test_decode_full_record() {
        let lead = decode_lead(
            &json!({
                "id": 12,
                "idd": 7,
                "name": "Ada",
                "phone": 5_550_100,
                "status": "Qualified",
                "interest": "High",
                "lastCall": "2024-05-01",
                "notes": "warm",
                "nextAction": "send deck"
            }),
            &owner(),
        )
        .unwrap();

        assert_eq!(lead.id.as_str(), "12");
        assert_eq!(lead.owner_id, owner());
        assert_eq!(lead.fields.phone, "5550100");
        assert_eq!(lead.fields.status, LeadStatus::Qualified);
        assert_eq!(lead.fields.interest, Interest::High);
        assert_eq!(lead.fields.next_action, "send deck");
    }

    #[test]
    fn test_decode_coerces_unknown_enum_values() {
        let lead = decode_lead(
            &json!({ "id": "a1", "name": "Ada", "status": "Hot", "interest": null }),
            &owner(),
        )
        .unwrap();

        assert_eq!(lead.fields.status, LeadStatus::Pending);
        assert_eq!(lead.fields.interest, Interest::Medium);
    }

    #[test]
    fn test_decode_defaults_owner_to_requested_owner() {
        let lead = decode_lead(&json!({ "id": "a1", "name": "Ada" }), &owner()).unwrap();
        assert_eq!(lead.owner_id, owner());

        let lead =
            decode_lead(&json!({ "id": "a1", "user_id": "u-2", "name": "Ada" }), &owner()).unwrap();
        assert_eq!(lead.owner_id.as_str(), "u-2");
    }

    #[test]
    fn test_decode_skips_records_without_id_or_name() {
        assert_eq!(
            decode_lead(&json!({ "name": "Ada" }), &owner()),
            Err(SkipReason::MissingId)
        );
        assert_eq!(
            decode_lead(&json!({ "id": "", "name": "Ada" }), &owner()),
            Err(SkipReason::MissingId)
        );
        assert!(matches!(
            decode_lead(&json!({ "id": 1, "name": "  " }), &owner()),
            Err(SkipReason::Invalid(_))
        ));
        assert_eq!(
            decode_lead(&json!("Ada"), &owner()),
            Err(SkipReason::NotAnObject)
        );
    }

    #[test]
    fn test_create_request_flattens_fields_with_owner() {
        let fields = LeadFields {
            name: "Ada".to_string(),
            ..LeadFields::default()
        };
        let owner = owner();
        let body = serde_json::to_value(CreateLeadRequest {
            fields: &fields,
            idd: &owner,
        })
        .unwrap();

        assert_eq!(
            body,
            json!({
                "name": "Ada",
                "phone": "",
                "status": "Pending",
                "interest": "Medium",
                "lastCall": "",
                "notes": "",
                "nextAction": "",
                "idd": 7
            })
        );
    }

    #[test]
    fn test_responses_ignore_error_key() {
        let upload: UploadResponse =
            serde_json::from_value(json!({ "error": "ignored", "file": "a.csv", "accepted": 2 }))
                .unwrap();
        assert_eq!(upload.file.as_deref(), Some("a.csv"));
        assert_eq!(upload.accepted, Some(2));
        assert_eq!(upload.rejected, None);

        let created: CreateLeadResponse =
            serde_json::from_value(json!({ "error": "ignored" })).unwrap();
        assert!(created.data.is_none());
    }
}
