//! Single-draft staging for manual lead entry.
//!
//! At most one unsaved lead exists at a time. It lives in a [`DraftSlot`]:
//!
//! ```text
//! NoDraft --begin--> Draft --commit--> Submitting --ok--> NoDraft
//!                    |  ^                  |
//!                    |  +--failed/dropped--+
//!                    +--discard--> NoDraft
//! ```
//!
//! A call from the wrong state is refused with
//! [`StagingError::InvalidTransition`] and leaves the slot untouched.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use nexdoor_core::{Lead, LeadField, LeadFields, OwnerId, ValidationError, validate};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::reconcile::DraftView;
use crate::store::{LeadStore, StoreError};

/// Errors from draft operations.
#[derive(Debug, Error)]
pub enum StagingError {
    /// The operation is not allowed in the current state.
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: SlotState,
    },

    /// The draft failed local validation and was not sent.
    #[error("draft is invalid: {}", join_errors(.0))]
    Invalid(Vec<ValidationError>),

    /// The store failed or refused the lead.
    #[error(transparent)]
    Store(#[from] StoreError),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// The unsaved lead, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DraftSlot {
    #[default]
    NoDraft,
    /// Being edited.
    Draft(LeadFields),
    /// Sent to the store; the fields are the values at commit time.
    Submitting(LeadFields),
}

impl DraftSlot {
    /// Coarse state of the slot.
    #[must_use]
    pub const fn state(&self) -> SlotState {
        match self {
            Self::NoDraft => SlotState::Empty,
            Self::Draft(_) => SlotState::Editing,
            Self::Submitting(_) => SlotState::Submitting,
        }
    }

    /// Draft fields, if a draft exists.
    #[must_use]
    pub const fn fields(&self) -> Option<&LeadFields> {
        match self {
            Self::NoDraft => None,
            Self::Draft(fields) | Self::Submitting(fields) => Some(fields),
        }
    }

    /// The slot as a render row input.
    #[must_use]
    pub fn view(&self) -> Option<DraftView> {
        match self {
            Self::NoDraft => None,
            Self::Draft(fields) => Some(DraftView {
                fields: fields.clone(),
                submitting: false,
            }),
            Self::Submitting(fields) => Some(DraftView {
                fields: fields.clone(),
                submitting: true,
            }),
        }
    }
}

/// State of a [`DraftSlot`] without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Empty,
    Editing,
    Submitting,
}

impl SlotState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "no draft is open",
            Self::Editing => "a draft is being edited",
            Self::Submitting => "a draft is being submitted",
        }
    }
}

impl fmt::Display for SlotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owns the draft slot and drives it through the store.
#[derive(Debug, Default)]
pub struct StagingController {
    slot: Mutex<DraftSlot>,
}

impl StagingController {
    /// Create a controller with no draft.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, DraftSlot> {
        lock_slot(&self.slot)
    }

    /// Current slot, by value.
    #[must_use]
    pub fn snapshot(&self) -> DraftSlot {
        self.lock().clone()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SlotState {
        self.lock().state()
    }

    /// Open a blank draft.
    ///
    /// # Errors
    ///
    /// Returns [`StagingError::InvalidTransition`] unless the slot is empty.
    pub fn begin(&self) -> Result<(), StagingError> {
        let mut slot = self.lock();
        if !matches!(*slot, DraftSlot::NoDraft) {
            return Err(refuse("begin a draft", &slot));
        }
        *slot = DraftSlot::Draft(LeadFields::default());
        debug!("Draft opened");
        Ok(())
    }

    /// Change one field of the open draft. Nothing is validated here.
    ///
    /// # Errors
    ///
    /// Returns [`StagingError::InvalidTransition`] unless a draft is being edited.
    pub fn edit(&self, field: LeadField, value: &str) -> Result<(), StagingError> {
        let mut slot = self.lock();
        match &mut *slot {
            DraftSlot::Draft(fields) => {
                fields.set(field, value);
                Ok(())
            }
            other => Err(refuse("edit the draft", other)),
        }
    }

    /// Throw away the open draft.
    ///
    /// # Errors
    ///
    /// Returns [`StagingError::InvalidTransition`] unless a draft is being
    /// edited. A submission in flight cannot be discarded.
    pub fn discard(&self) -> Result<(), StagingError> {
        let mut slot = self.lock();
        if !matches!(*slot, DraftSlot::Draft(_)) {
            return Err(refuse("discard the draft", &slot));
        }
        *slot = DraftSlot::NoDraft;
        debug!("Draft discarded");
        Ok(())
    }

    /// Validate the draft and send it to the store for `owner`.
    ///
    /// On success the slot is emptied and whatever the store echoed back is
    /// returned (usually nothing). On failure the draft is restored exactly
    /// as it was before the call.
    ///
    /// # Errors
    ///
    /// - [`StagingError::InvalidTransition`] unless a draft is being edited
    /// - [`StagingError::Invalid`] if the draft has no name (nothing is sent)
    /// - [`StagingError::Store`] if the store fails or refuses the lead
    #[instrument(skip_all, fields(owner = %owner))]
    pub async fn commit<S: LeadStore>(
        &self,
        store: &S,
        owner: &OwnerId,
    ) -> Result<Option<Lead>, StagingError> {
        let fields = {
            let mut slot = self.lock();
            let DraftSlot::Draft(draft) = &*slot else {
                return Err(refuse("commit", &slot));
            };
            let pending = draft.clone();
            let fields = validate(pending.clone().into_candidate()).map_err(StagingError::Invalid)?;
            *slot = DraftSlot::Submitting(pending);
            fields
        };
        let submission = Submission::new(&self.slot);

        match store.create_lead(&fields, owner).await {
            Ok(created) => {
                submission.complete();
                info!(name = %fields.name, "Lead created");
                Ok(created)
            }
            Err(e) => {
                drop(submission);
                warn!(error = %e, "Lead was not saved, draft kept");
                Err(e.into())
            }
        }
    }
}

/// A commit in flight. Dropped before [`Submission::complete`], it puts the
/// submitted fields back into the slot as an editable draft.
struct Submission<'a> {
    slot: &'a Mutex<DraftSlot>,
    completed: bool,
}

impl<'a> Submission<'a> {
    const fn new(slot: &'a Mutex<DraftSlot>) -> Self {
        Self {
            slot,
            completed: false,
        }
    }

    fn complete(mut self) {
        *lock_slot(self.slot) = DraftSlot::NoDraft;
        self.completed = true;
    }
}

impl Drop for Submission<'_> {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        let mut slot = lock_slot(self.slot);
        if let DraftSlot::Submitting(pending) = std::mem::take(&mut *slot) {
            *slot = DraftSlot::Draft(pending);
            debug!("Draft restored");
        }
    }
}

fn lock_slot(slot: &Mutex<DraftSlot>) -> MutexGuard<'_, DraftSlot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

fn refuse(action: &'static str, slot: &DraftSlot) -> StagingError {
    StagingError::InvalidTransition {
        action,
        state: slot.state(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use nexdoor_core::{Interest, LeadStatus};

    use super::*;
    use crate::test_support::MockLeadStore;

    fn owner() -> OwnerId {
        OwnerId::from(7)
    }

    fn named_draft(name: &str) -> StagingController {
        let staging = StagingController::new();
        staging.begin().unwrap();
        staging.edit(LeadField::Name, name).unwrap();
        staging
    }

    #[test]
    fn test_begin_opens_blank_draft() {
        let staging = StagingController::new();
        staging.begin().unwrap();

        assert_eq!(staging.snapshot(), DraftSlot::Draft(LeadFields::default()));
        let fields = staging.snapshot().fields().cloned().unwrap();
        assert_eq!(fields.status, LeadStatus::Pending);
        assert_eq!(fields.interest, Interest::Medium);
    }

    #[test]
    fn test_begin_twice_is_refused() {
        let staging = named_draft("Ada");
        let err = staging.begin().unwrap_err();

        assert!(matches!(
            err,
            StagingError::InvalidTransition {
                state: SlotState::Editing,
                ..
            }
        ));
        assert_eq!(staging.snapshot().fields().unwrap().name, "Ada");
    }

    #[test]
    fn test_edit_and_discard_need_a_draft() {
        let staging = StagingController::new();
        assert!(staging.edit(LeadField::Name, "Ada").is_err());
        assert!(staging.discard().is_err());
        assert_eq!(staging.snapshot(), DraftSlot::NoDraft);
    }

    #[test]
    fn test_edit_does_not_validate() {
        let staging = named_draft("Ada");
        staging.edit(LeadField::Name, "").unwrap();
        staging.edit(LeadField::Interest, "High").unwrap();
        staging.edit(LeadField::Status, "nonsense").unwrap();

        let fields = staging.snapshot().fields().cloned().unwrap();
        assert_eq!(fields.name, "");
        assert_eq!(fields.interest, Interest::High);
        assert_eq!(fields.status, LeadStatus::Pending);
    }

    #[test]
    fn test_discard_empties_slot() {
        let staging = named_draft("Ada");
        staging.discard().unwrap();
        assert_eq!(staging.state(), SlotState::Empty);
    }

    #[tokio::test]
    async fn test_commit_without_draft_is_refused() {
        let store = MockLeadStore::new();
        let staging = StagingController::new();

        let err = staging.commit(&store, &owner()).await.unwrap_err();
        assert!(matches!(
            err,
            StagingError::InvalidTransition {
                state: SlotState::Empty,
                ..
            }
        ));
        assert!(store.created().is_empty());
    }

    #[tokio::test]
    async fn test_commit_success_empties_slot() {
        let store = MockLeadStore::new();
        let staging = named_draft("  Ada ");
        staging.edit(LeadField::Phone, "555-0100").unwrap();

        let created = staging.commit(&store, &owner()).await.unwrap();

        assert!(created.is_none());
        assert_eq!(staging.snapshot(), DraftSlot::NoDraft);
        let sent = store.created();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0.name, "Ada");
        assert_eq!(sent[0].0.phone, "555-0100");
        assert_eq!(sent[0].1, owner());
    }

    #[tokio::test]
    async fn test_commit_with_empty_name_never_reaches_store() {
        let store = MockLeadStore::new();
        let staging = named_draft("   ");

        let err = staging.commit(&store, &owner()).await.unwrap_err();

        assert!(matches!(err, StagingError::Invalid(ref errors) if errors == &[ValidationError::EmptyName]));
        assert_eq!(staging.state(), SlotState::Editing);
        assert_eq!(staging.snapshot().fields().unwrap().name, "   ");
        assert!(store.created().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_commit_keeps_draft() {
        let store = MockLeadStore::new();
        store.fail_creates_with("duplicate phone");
        let staging = named_draft("Ada");
        staging.edit(LeadField::Phone, "555-0100").unwrap();
        staging.edit(LeadField::Notes, "call after 5").unwrap();
        let before = staging.snapshot();

        let err = staging.commit(&store, &owner()).await.unwrap_err();

        assert_eq!(err.to_string(), "duplicate phone");
        assert!(matches!(err, StagingError::Store(StoreError::Rejected(_))));
        assert_eq!(staging.snapshot(), before);

        store.accept_creates();
        staging.commit(&store, &owner()).await.unwrap();
        assert_eq!(staging.state(), SlotState::Empty);
        assert_eq!(store.created().len(), 2);
    }

    #[tokio::test]
    async fn test_network_failure_keeps_draft() {
        let store = MockLeadStore::new();
        store.fail_creates_with_network();
        let staging = named_draft("Ada");

        let err = staging.commit(&store, &owner()).await.unwrap_err();

        assert!(matches!(err, StagingError::Store(StoreError::Network(_))));
        assert_eq!(staging.state(), SlotState::Editing);
    }

    #[tokio::test]
    async fn test_calls_while_submitting_are_refused() {
        let store = Arc::new(MockLeadStore::new());
        let gate = store.hold_creates();
        let staging = named_draft("Ada");
        let owner = owner();

        let first = staging.commit(store.as_ref(), &owner);
        let second = async {
            gate.started.notified().await;
            assert_eq!(staging.state(), SlotState::Submitting);
            assert_eq!(staging.snapshot().view().map(|v| v.submitting), Some(true));

            let commit = staging.commit(store.as_ref(), &owner).await;
            let edit = staging.edit(LeadField::Name, "Grace");
            let discard = staging.discard();
            let begin = staging.begin();
            gate.release.notify_one();
            (commit, edit, discard, begin)
        };

        let (first, (commit, edit, discard, begin)) = tokio::join!(first, second);

        for err in [commit.unwrap_err(), edit.unwrap_err(), discard.unwrap_err(), begin.unwrap_err()] {
            assert!(matches!(
                err,
                StagingError::InvalidTransition {
                    state: SlotState::Submitting,
                    ..
                }
            ));
        }
        first.unwrap();
        assert_eq!(store.created().len(), 1);
        assert_eq!(store.created()[0].0.name, "Ada");
        assert_eq!(staging.state(), SlotState::Empty);
    }

    #[tokio::test]
    async fn test_abandoned_commit_restores_draft() {
        let store = MockLeadStore::new();
        let _gate = store.hold_creates();
        let staging = named_draft("Ada");
        staging.edit(LeadField::Phone, "555-0100").unwrap();
        let before = staging.snapshot();

        let timed_out = tokio::time::timeout(
            Duration::from_millis(50),
            staging.commit(&store, &owner()),
        )
        .await;

        assert!(timed_out.is_err());
        assert_eq!(staging.state(), SlotState::Editing);
        assert_eq!(staging.snapshot(), before);
        assert!(store.created().is_empty());

        staging.edit(LeadField::Notes, "call after 5").unwrap();
        staging.discard().unwrap();
        staging.begin().unwrap();
        assert_eq!(staging.snapshot(), DraftSlot::Draft(LeadFields::default()));
    }
}
