//! Signed-in session context.
//!
//! The session is an explicit value created at login and consumed at logout.
//! Components that need the owner id take it from a [`Session`] handed to
//! them; nothing reads session state globally.
//!
//! Persistence goes through a [`SessionStore`], a small string key-value
//! store holding two keys: [`USER_KEY`] (the user record as JSON) and
//! [`CURRENT_PAGE_KEY`] (the page token).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use nexdoor_core::{OwnerId, Page};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Key holding the signed-in user record.
pub const USER_KEY: &str = "user";

/// Key holding the current page token.
pub const CURRENT_PAGE_KEY: &str = "currentPage";

/// Errors from session persistence.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The backing file could not be read or written.
    #[error("session storage error: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be encoded.
    #[error("session encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// The authenticated user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: OwnerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// String key-value persistence for the session.
pub trait SessionStore {
    /// Read a key.
    ///
    /// # Errors
    ///
    /// Returns error if the backing storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, SessionError>;

    /// Write a key.
    ///
    /// # Errors
    ///
    /// Returns error if the backing storage cannot be written.
    fn set(&mut self, key: &str, value: &str) -> Result<(), SessionError>;

    /// Delete a key. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns error if the backing storage cannot be written.
    fn remove(&mut self, key: &str) -> Result<(), SessionError>;
}

/// In-memory session store.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    values: BTreeMap<String, String>,
}

impl MemorySessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), SessionError> {
        self.values.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), SessionError> {
        self.values.remove(key);
        Ok(())
    }
}

/// Session store backed by a JSON object in a file.
///
/// The file and its parent directories are created on first write. A file
/// that is not a JSON object is treated as empty and replaced on the next
/// write.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Use the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, SessionError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };

        Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "Ignoring unreadable session file");
            BTreeMap::new()
        }))
    }

    fn save(&self, values: &BTreeMap<String, String>) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(values)?)?;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(self.load()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), SessionError> {
        let mut values = self.load()?;
        values.insert(key.to_owned(), value.to_owned());
        self.save(&values)
    }

    fn remove(&mut self, key: &str) -> Result<(), SessionError> {
        let mut values = self.load()?;
        if values.remove(key).is_some() {
            self.save(&values)?;
        }
        Ok(())
    }
}

/// A signed-in user and the page they are on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user: SessionUser,
    page: Page,
}

impl Session {
    /// Start a session for a freshly signed-in user and persist it.
    ///
    /// # Errors
    ///
    /// Returns error if the session cannot be persisted.
    pub fn login<S: SessionStore>(store: &mut S, user: SessionUser) -> Result<Self, SessionError> {
        let session = Self {
            user,
            page: Page::Dashboard,
        };
        store.set(USER_KEY, &serde_json::to_string(&session.user)?)?;
        store.set(CURRENT_PAGE_KEY, session.page.as_str())?;
        debug!(user_id = %session.user.id, "Session started");
        Ok(session)
    }

    /// Restore a persisted session.
    ///
    /// Returns `None` when no user is stored. A stored user record that
    /// cannot be parsed is removed and treated as signed out. A missing page
    /// token, or one for a signed-out screen, lands on the dashboard.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be read.
    pub fn restore<S: SessionStore>(store: &mut S) -> Result<Option<Self>, SessionError> {
        let Some(raw_user) = store.get(USER_KEY)? else {
            return Ok(None);
        };

        let user: SessionUser = match serde_json::from_str(&raw_user) {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "Discarding unreadable stored user");
                store.remove(USER_KEY)?;
                store.remove(CURRENT_PAGE_KEY)?;
                return Ok(None);
            }
        };

        let page = store
            .get(CURRENT_PAGE_KEY)?
            .map(|token| Page::from_token(&token))
            .filter(|page| page.requires_auth())
            .unwrap_or(Page::Dashboard);

        Ok(Some(Self { user, page }))
    }

    /// Move to another page and persist the token.
    ///
    /// # Errors
    ///
    /// Returns error if the token cannot be persisted.
    pub fn navigate<S: SessionStore>(&mut self, store: &mut S, page: Page) -> Result<(), SessionError> {
        store.set(CURRENT_PAGE_KEY, page.as_str())?;
        self.page = page;
        Ok(())
    }

    /// End the session, removing both persisted keys.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be written.
    pub fn logout<S: SessionStore>(self, store: &mut S) -> Result<(), SessionError> {
        store.remove(USER_KEY)?;
        store.remove(CURRENT_PAGE_KEY)?;
        debug!(user_id = %self.user.id, "Session ended");
        Ok(())
    }

    /// The signed-in user.
    #[must_use]
    pub const fn user(&self) -> &SessionUser {
        &self.user
    }

    /// Id of the signed-in user, used as the owner of every lead.
    #[must_use]
    pub const fn owner_id(&self) -> &OwnerId {
        &self.user.id
    }

    /// The current page.
    #[must_use]
    pub const fn page(&self) -> Page {
        self.page
    }
}
