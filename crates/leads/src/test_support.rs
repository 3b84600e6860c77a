//! Test support utilities for both unit and integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use nexdoor_core::{Lead, LeadFields, LeadId, OwnerId};
use tokio::sync::Notify;

use crate::store::{FetchError, ImportBatch, ImportSummary, LeadStore, StoreError};

/// How a mock call should fail.
#[derive(Debug, Clone)]
enum Failure {
    Rejected(String),
    Network,
}

impl Failure {
    fn store_error(&self) -> StoreError {
        match self {
            Self::Rejected(message) => StoreError::Rejected(message.clone()),
            Self::Network => StoreError::Network("connection refused".to_string()),
        }
    }
}

/// Pair of signals used to hold a store call in flight.
#[derive(Debug, Default)]
pub struct CallGate {
    /// Notified when a held call reaches the store.
    pub started: Notify,
    /// Notify to let the held call finish.
    pub release: Notify,
}

/// In-memory lead store for testing.
///
/// Created leads are appended to the list so a later `list_leads` sees them,
/// and every call is recorded for assertions.
#[derive(Debug, Default)]
pub struct MockLeadStore {
    leads: Mutex<Vec<Lead>>,
    created: Mutex<Vec<(LeadFields, OwnerId)>>,
    imports: Mutex<Vec<(ImportBatch, OwnerId)>>,
    list_calls: AtomicUsize,
    next_id: AtomicUsize,
    fail_lists: Mutex<bool>,
    create_failure: Mutex<Option<Failure>>,
    import_failure: Mutex<Option<Failure>>,
    list_gate: Mutex<Option<Arc<CallGate>>>,
    create_gate: Mutex<Option<Arc<CallGate>>>,
    import_gate: Mutex<Option<Arc<CallGate>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockLeadStore {
    /// Create an empty mock store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock store already holding `leads`.
    #[must_use]
    pub fn with_leads(leads: Vec<Lead>) -> Self {
        let store = Self::new();
        store.next_id.store(leads.len(), Ordering::SeqCst);
        *lock(&store.leads) = leads;
        store
    }

    /// Make every `list_leads` fail with a network error.
    pub fn fail_lists(&self, fail: bool) {
        *lock(&self.fail_lists) = fail;
    }

    /// Make every `create_lead` return `{ error: message }`.
    pub fn fail_creates_with(&self, message: &str) {
        *lock(&self.create_failure) = Some(Failure::Rejected(message.to_owned()));
    }

    /// Make every `create_lead` fail with a network error.
    pub fn fail_creates_with_network(&self) {
        *lock(&self.create_failure) = Some(Failure::Network);
    }

    /// Let `create_lead` succeed again.
    pub fn accept_creates(&self) {
        *lock(&self.create_failure) = None;
    }

    /// Make every `bulk_import` return `{ error: message }`.
    pub fn fail_imports_with(&self, message: &str) {
        *lock(&self.import_failure) = Some(Failure::Rejected(message.to_owned()));
    }

    /// Hold every `list_leads` until the returned gate is released.
    #[must_use]
    pub fn hold_lists(&self) -> Arc<CallGate> {
        let gate = Arc::new(CallGate::default());
        *lock(&self.list_gate) = Some(Arc::clone(&gate));
        gate
    }

    /// Hold every `create_lead` until the returned gate is released.
    #[must_use]
    pub fn hold_creates(&self) -> Arc<CallGate> {
        let gate = Arc::new(CallGate::default());
        *lock(&self.create_gate) = Some(Arc::clone(&gate));
        gate
    }

    /// Hold every `bulk_import` until the returned gate is released.
    #[must_use]
    pub fn hold_imports(&self) -> Arc<CallGate> {
        let gate = Arc::new(CallGate::default());
        *lock(&self.import_gate) = Some(Arc::clone(&gate));
        gate
    }

    /// Number of `list_leads` calls so far.
    #[must_use]
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Every `create_lead` call that reached the store.
    #[must_use]
    pub fn created(&self) -> Vec<(LeadFields, OwnerId)> {
        lock(&self.created).clone()
    }

    /// Every `bulk_import` call that reached the store.
    #[must_use]
    pub fn imports(&self) -> Vec<(ImportBatch, OwnerId)> {
        lock(&self.imports).clone()
    }

    /// Number of `bulk_import` calls so far.
    #[must_use]
    pub fn import_calls(&self) -> usize {
        lock(&self.imports).len()
    }

    fn next_lead_id(&self) -> LeadId {
        let next = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        LeadId::new(next.to_string())
    }
}

impl LeadStore for MockLeadStore {
    async fn list_leads(&self, owner: &OwnerId) -> Result<Vec<Lead>, FetchError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let gate = lock(&self.list_gate).clone();
        if let Some(gate) = gate {
            gate.started.notify_one();
            gate.release.notified().await;
        }

        if *lock(&self.fail_lists) {
            return Err(FetchError::Network("connection refused".to_string()));
        }
        Ok(lock(&self.leads)
            .iter()
            .filter(|lead| &lead.owner_id == owner)
            .cloned()
            .collect())
    }

    async fn create_lead(
        &self,
        fields: &LeadFields,
        owner: &OwnerId,
    ) -> Result<Option<Lead>, StoreError> {
        let gate = lock(&self.create_gate).clone();
        if let Some(gate) = gate {
            gate.started.notify_one();
            gate.release.notified().await;
        }

        lock(&self.created).push((fields.clone(), owner.clone()));

        let failure = lock(&self.create_failure).clone();
        if let Some(failure) = failure {
            return Err(failure.store_error());
        }

        lock(&self.leads).push(Lead {
            id: self.next_lead_id(),
            owner_id: owner.clone(),
            fields: fields.clone(),
        });
        Ok(None)
    }

    async fn bulk_import(
        &self,
        batch: &ImportBatch,
        owner: &OwnerId,
    ) -> Result<ImportSummary, StoreError> {
        let gate = lock(&self.import_gate).clone();
        if let Some(gate) = gate {
            gate.started.notify_one();
            gate.release.notified().await;
        }

        lock(&self.imports).push((batch.clone(), owner.clone()));

        let failure = lock(&self.import_failure).clone();
        if let Some(failure) = failure {
            return Err(failure.store_error());
        }

        for fields in batch.leads() {
            let lead = Lead {
                id: self.next_lead_id(),
                owner_id: owner.clone(),
                fields: fields.clone(),
            };
            lock(&self.leads).push(lead);
        }

        Ok(ImportSummary {
            file: Some(batch.file_name().to_owned()),
            accepted: batch.len(),
            rejected: 0,
            skipped: 0,
        })
    }
}
