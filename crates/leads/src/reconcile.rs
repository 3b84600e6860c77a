//! Merges the draft and the confirmed leads into display rows.

use nexdoor_core::{Lead, LeadFields};

/// The draft as it should be shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftView {
    pub fields: LeadFields,
    /// The draft is locked while its submission is in flight.
    pub submitting: bool,
}

/// One display row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderRow {
    /// The unsaved draft; editable unless `submitting`.
    Draft { fields: LeadFields, submitting: bool },
    /// A lead the store has confirmed; read-only.
    Confirmed(Lead),
}

impl RenderRow {
    /// Whether the row accepts edits.
    #[must_use]
    pub const fn is_editable(&self) -> bool {
        matches!(self, Self::Draft { submitting: false, .. })
    }

    /// Field values shown in the row.
    #[must_use]
    pub const fn fields(&self) -> &LeadFields {
        match self {
            Self::Draft { fields, .. } => fields,
            Self::Confirmed(lead) => &lead.fields,
        }
    }
}

/// Build the rows to display: the draft first, then the confirmed leads in
/// store order.
#[must_use]
pub fn render(confirmed: &[Lead], draft: Option<&DraftView>) -> Vec<RenderRow> {
    let mut rows = Vec::with_capacity(confirmed.len() + usize::from(draft.is_some()));
    if let Some(draft) = draft {
        rows.push(RenderRow::Draft {
            fields: draft.fields.clone(),
            submitting: draft.submitting,
        });
    }
    rows.extend(confirmed.iter().cloned().map(RenderRow::Confirmed));
    rows
}

#[cfg(test)]
mod tests {
    use nexdoor_core::{LeadId, OwnerId};

    use super::*;

    fn lead(id: i64, name: &str) -> Lead {
        Lead {
            id: LeadId::from(id),
            owner_id: OwnerId::from(1),
            fields: LeadFields {
                name: name.to_string(),
                ..LeadFields::default()
            },
        }
    }

    fn names(rows: &[RenderRow]) -> Vec<&str> {
        rows.iter().map(|row| row.fields().name.as_str()).collect()
    }

    #[test]
    fn test_render_without_draft_keeps_store_order() {
        let confirmed = vec![lead(3, "Zed"), lead(1, "Ada"), lead(2, "Mia")];
        let rows = render(&confirmed, None);

        assert_eq!(names(&rows), ["Zed", "Ada", "Mia"]);
        assert!(rows.iter().all(|row| !row.is_editable()));
    }

    #[test]
    fn test_render_puts_draft_first() {
        let confirmed = vec![lead(1, "Ada"), lead(2, "Grace")];
        let draft = DraftView {
            fields: LeadFields {
                name: "New".to_string(),
                ..LeadFields::default()
            },
            submitting: false,
        };

        let rows = render(&confirmed, Some(&draft));

        assert_eq!(names(&rows), ["New", "Ada", "Grace"]);
        assert!(rows[0].is_editable());
        assert_eq!(rows[1], RenderRow::Confirmed(confirmed[0].clone()));
        assert_eq!(rows[2], RenderRow::Confirmed(confirmed[1].clone()));
    }

    #[test]
    fn test_submitting_draft_is_locked() {
        let draft = DraftView {
            fields: LeadFields::default(),
            submitting: true,
        };
        let rows = render(&[], Some(&draft));

        assert_eq!(rows.len(), 1);
        assert!(!rows[0].is_editable());
    }

    #[test]
    fn test_render_empty() {
        assert!(render(&[], None).is_empty());
    }
}
