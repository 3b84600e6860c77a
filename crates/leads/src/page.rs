//! The leads page: confirmed list, draft and CSV import behind one handle.
//!
//! [`LeadsPage`] ties the store, the signed-in [`Session`] and the two state
//! machines together. Every write that succeeds is followed by one re-fetch
//! of the list; the page never patches its cache locally.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use nexdoor_core::{Lead, LeadField, OwnerId};
use tracing::{debug, info, instrument, warn};

use crate::error::{Precondition, Result};
use crate::ingest::{IngestionPipeline, UploadFile};
use crate::reconcile::{RenderRow, render};
use crate::session::Session;
use crate::staging::{DraftSlot, StagingController};
use crate::store::{ImportSummary, LeadStore};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// State behind the leads screen.
#[derive(Debug)]
pub struct LeadsPage<S> {
    store: S,
    session: Option<Session>,
    confirmed: Mutex<Vec<Lead>>,
    loading: AtomicBool,
    staging: StagingController,
    ingestion: IngestionPipeline,
    last_upload: Mutex<Option<String>>,
}

impl<S: LeadStore> LeadsPage<S> {
    /// Create a page with an empty list. Call [`Self::refresh`] to load it.
    pub fn new(store: S, session: Option<Session>) -> Self {
        Self {
            store,
            session,
            confirmed: Mutex::new(Vec::new()),
            loading: AtomicBool::new(false),
            staging: StagingController::new(),
            ingestion: IngestionPipeline::new(),
            last_upload: Mutex::new(None),
        }
    }

    /// The signed-in session, if any.
    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// The underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    fn owner(&self) -> Result<&OwnerId, Precondition> {
        self.session
            .as_ref()
            .map(Session::owner_id)
            .ok_or(Precondition::NotAuthenticated)
    }

    /// Re-fetch the confirmed list. On failure the previous list is kept.
    ///
    /// Returns the number of leads loaded.
    ///
    /// # Errors
    ///
    /// Returns error if nobody is signed in or the fetch fails.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<usize> {
        let owner = self.owner()?;

        let result = {
            let _loading = Loading::start(&self.loading);
            self.store.list_leads(owner).await
        };

        let leads = result.inspect_err(|e| warn!(error = %e, "Keeping previous lead list"))?;
        let count = leads.len();
        *lock(&self.confirmed) = leads;
        debug!(count, "Lead list refreshed");
        Ok(count)
    }

    /// Whether a list fetch is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// The confirmed leads from the last successful fetch.
    pub fn leads(&self) -> Vec<Lead> {
        lock(&self.confirmed).clone()
    }

    /// The draft slot.
    pub fn draft(&self) -> DraftSlot {
        self.staging.snapshot()
    }

    /// Rows to display, draft first.
    pub fn rows(&self) -> Vec<RenderRow> {
        let draft = self.staging.snapshot().view();
        render(&lock(&self.confirmed), draft.as_ref())
    }

    /// Open a blank draft.
    ///
    /// # Errors
    ///
    /// Returns error if a draft already exists.
    pub fn begin_draft(&self) -> Result<()> {
        Ok(self.staging.begin()?)
    }

    /// Change one field of the draft.
    ///
    /// # Errors
    ///
    /// Returns error unless a draft is being edited.
    pub fn edit_draft(&self, field: LeadField, value: &str) -> Result<()> {
        Ok(self.staging.edit(field, value)?)
    }

    /// Throw the draft away.
    ///
    /// # Errors
    ///
    /// Returns error unless a draft is being edited.
    pub fn discard_draft(&self) -> Result<()> {
        Ok(self.staging.discard()?)
    }

    /// Save the draft, then reload the list once.
    ///
    /// A reload failure after a successful save is only logged; the lead is
    /// saved either way.
    ///
    /// # Errors
    ///
    /// Returns error if nobody is signed in or the save fails.
    pub async fn commit_draft(&self) -> Result<Option<Lead>> {
        let owner = self.owner()?;
        let created = self.staging.commit(&self.store, owner).await?;

        if let Err(e) = self.refresh().await {
            warn!(error = %e, "Lead saved but the list could not be reloaded");
        }

        Ok(created)
    }

    /// Import a CSV file, then reload the list once if anything was sent.
    ///
    /// # Errors
    ///
    /// Returns error if no file is given, nobody is signed in, another import
    /// is running, the file is not CSV or the upload fails.
    pub async fn import_csv(&self, file: Option<UploadFile>) -> Result<ImportSummary> {
        let local_name = file.as_ref().map(|f| f.name().to_owned());
        let owner = self.session.as_ref().map(Session::owner_id);

        let summary = self.ingestion.ingest(&self.store, owner, file).await?;
        if !summary.uploaded() {
            return Ok(summary);
        }

        let stored_name = summary.file.clone().or(local_name);
        info!(file = ?stored_name, "CSV uploaded");
        *lock(&self.last_upload) = stored_name;

        if let Err(e) = self.refresh().await {
            warn!(error = %e, "Import finished but the list could not be reloaded");
        }

        Ok(summary)
    }

    /// Name of the last file uploaded from this page.
    pub fn last_uploaded_file(&self) -> Option<String> {
        lock(&self.last_upload).clone()
    }

    /// Whether an import is in flight.
    pub fn is_importing(&self) -> bool {
        self.ingestion.is_busy()
    }
}

/// Raises the loading flag for as long as it lives.
struct Loading<'a>(&'a AtomicBool);

impl<'a> Loading<'a> {
    fn start(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for Loading<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use nexdoor_core::{LeadFields, LeadId};

    use super::*;
    use crate::error::Error;
    use crate::ingest::IngestionError;
    use crate::session::{MemorySessionStore, SessionUser};
    use crate::staging::{SlotState, StagingError};
    use crate::store::StoreError;
    use crate::test_support::MockLeadStore;

    fn session() -> Session {
        let user = SessionUser {
            id: OwnerId::from(1),
            email: Some("agent@nexdoor.ai".to_string()),
            name: None,
        };
        Session::login(&mut MemorySessionStore::new(), user).unwrap()
    }

    fn lead(id: i64, owner: i64, name: &str) -> Lead {
        Lead {
            id: LeadId::from(id),
            owner_id: OwnerId::from(owner),
            fields: LeadFields {
                name: name.to_string(),
                ..LeadFields::default()
            },
        }
    }

    fn page_with(leads: Vec<Lead>) -> LeadsPage<MockLeadStore> {
        LeadsPage::new(MockLeadStore::with_leads(leads), Some(session()))
    }

    fn names(page: &LeadsPage<MockLeadStore>) -> Vec<String> {
        page.rows()
            .iter()
            .map(|row| row.fields().name.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_refresh_loads_only_own_leads() {
        let page = page_with(vec![lead(1, 1, "Ada"), lead(2, 2, "Other"), lead(3, 1, "Grace")]);

        assert_eq!(page.refresh().await.unwrap(), 2);
        assert_eq!(names(&page), ["Ada", "Grace"]);
        assert!(!page.is_loading());
    }

    #[tokio::test]
    async fn test_signed_out_page_makes_no_calls() {
        let page = LeadsPage::new(MockLeadStore::new(), None);

        assert!(matches!(
            page.refresh().await,
            Err(Error::Precondition(Precondition::NotAuthenticated))
        ));

        page.begin_draft().unwrap();
        page.edit_draft(LeadField::Name, "Ada").unwrap();
        assert!(matches!(
            page.commit_draft().await,
            Err(Error::Precondition(Precondition::NotAuthenticated))
        ));
        assert_eq!(page.draft().state(), SlotState::Editing);

        assert!(matches!(
            page.import_csv(Some(UploadFile::new("a.csv", "name\nAda\n"))).await,
            Err(Error::Ingestion(IngestionError::Precondition(
                Precondition::NotAuthenticated
            )))
        ));

        assert_eq!(page.store().list_calls(), 0);
        assert!(page.store().created().is_empty());
        assert_eq!(page.store().import_calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_list() {
        let page = page_with(vec![lead(1, 1, "Ada")]);
        page.refresh().await.unwrap();

        page.store().fail_lists(true);
        assert!(matches!(page.refresh().await, Err(Error::Fetch(_))));
        assert_eq!(names(&page), ["Ada"]);
        assert!(!page.is_loading());
    }

    #[tokio::test]
    async fn test_abandoned_refresh_clears_loading() {
        let page = page_with(vec![lead(1, 1, "Ada")]);
        page.refresh().await.unwrap();
        let gate = page.store().hold_lists();

        let refresh = page.refresh();
        let watch = async {
            gate.started.notified().await;
            page.is_loading()
        };
        let (timed_out, loading_meanwhile) =
            tokio::join!(tokio::time::timeout(Duration::from_millis(50), refresh), watch);

        assert!(timed_out.is_err());
        assert!(loading_meanwhile);
        assert!(!page.is_loading());
        assert_eq!(names(&page), ["Ada"]);
        assert_eq!(page.store().list_calls(), 2);
    }

    #[tokio::test]
    async fn test_draft_renders_above_confirmed() {
        let page = page_with(vec![lead(1, 1, "Ada")]);
        page.refresh().await.unwrap();
        page.begin_draft().unwrap();
        page.edit_draft(LeadField::Name, "New").unwrap();

        let rows = page.rows();
        assert_eq!(names(&page), ["New", "Ada"]);
        assert!(rows[0].is_editable());

        page.discard_draft().unwrap();
        assert_eq!(names(&page), ["Ada"]);
    }

    #[tokio::test]
    async fn test_commit_refreshes_exactly_once() {
        let page = page_with(vec![lead(1, 1, "Ada")]);
        page.begin_draft().unwrap();
        page.edit_draft(LeadField::Name, "Grace").unwrap();

        page.commit_draft().await.unwrap();

        assert_eq!(page.store().list_calls(), 1);
        assert_eq!(page.draft(), DraftSlot::NoDraft);
        assert_eq!(names(&page), ["Ada", "Grace"]);
    }

    #[tokio::test]
    async fn test_rejected_commit_does_not_refresh() {
        let page = page_with(Vec::new());
        page.store().fail_creates_with("duplicate phone");
        page.begin_draft().unwrap();
        page.edit_draft(LeadField::Name, "Grace").unwrap();
        page.edit_draft(LeadField::Phone, "555-0100").unwrap();

        let err = page.commit_draft().await.unwrap_err();

        assert!(matches!(
            err,
            Error::Staging(StagingError::Store(StoreError::Rejected(ref m))) if m == "duplicate phone"
        ));
        assert_eq!(err.to_string(), "duplicate phone");
        assert_eq!(page.store().list_calls(), 0);
        let draft = page.draft();
        assert_eq!(draft.state(), SlotState::Editing);
        assert_eq!(draft.fields().unwrap().phone, "555-0100");
    }

    #[tokio::test]
    async fn test_commit_survives_failed_reload() {
        let page = page_with(Vec::new());
        page.store().fail_lists(true);
        page.begin_draft().unwrap();
        page.edit_draft(LeadField::Name, "Grace").unwrap();

        assert!(page.commit_draft().await.is_ok());
        assert_eq!(page.store().list_calls(), 1);
        assert_eq!(page.draft(), DraftSlot::NoDraft);
        assert_eq!(page.store().created().len(), 1);
    }

    #[tokio::test]
    async fn test_import_refreshes_and_remembers_file() {
        let page = page_with(Vec::new());

        let summary = page
            .import_csv(Some(UploadFile::new("march.csv", "name,phone\nAda,1\n,2\nGrace,3\n")))
            .await
            .unwrap();

        assert_eq!(summary.accepted, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(page.store().list_calls(), 1);
        assert_eq!(page.last_uploaded_file().as_deref(), Some("march.csv"));
        assert_eq!(names(&page), ["Ada", "Grace"]);
        assert!(!page.is_importing());
    }

    #[tokio::test]
    async fn test_header_only_import_does_not_refresh() {
        let page = page_with(Vec::new());

        let summary = page
            .import_csv(Some(UploadFile::new("empty.csv", "name,phone\n")))
            .await
            .unwrap();

        assert_eq!(summary.accepted, 0);
        assert_eq!(page.store().import_calls(), 0);
        assert_eq!(page.store().list_calls(), 0);
        assert!(page.last_uploaded_file().is_none());
    }

    #[tokio::test]
    async fn test_import_without_file() {
        let page = page_with(Vec::new());

        assert!(matches!(
            page.import_csv(None).await,
            Err(Error::Ingestion(IngestionError::Precondition(Precondition::NoFile)))
        ));
        assert_eq!(page.store().list_calls(), 0);
    }
}
