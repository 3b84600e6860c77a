//! CLI command implementations.

pub mod leads;
pub mod session;

use nexdoor_leads::{FileSessionStore, HttpLeadStore, LeadsConfig, Session};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// A library operation failed.
    #[error(transparent)]
    Leads(#[from] nexdoor_leads::Error),

    /// The command needs a signed-in user.
    #[error("Not signed in. Run `nd-cli login` first.")]
    NotSignedIn,

    /// The input file could not be read.
    #[error("Could not read {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Route library errors through [`nexdoor_leads::Error`].
macro_rules! from_leads_error {
    ($($error:ty),* $(,)?) => {
        $(
            impl From<$error> for CommandError {
                fn from(error: $error) -> Self {
                    Self::Leads(error.into())
                }
            }
        )*
    };
}

from_leads_error!(
    nexdoor_leads::config::ConfigError,
    nexdoor_leads::store::ClientInitError,
    nexdoor_leads::session::SessionError,
    nexdoor_leads::store::LoginError,
);

/// Everything a command needs to talk to the service.
pub struct Context {
    pub config: LeadsConfig,
    pub store: HttpLeadStore,
    pub sessions: FileSessionStore,
}

impl Context {
    /// Load configuration and build the HTTP client.
    pub fn load() -> Result<Self, CommandError> {
        let config = LeadsConfig::from_env()?;
        let store = HttpLeadStore::from_config(&config)?;
        let sessions = FileSessionStore::new(&config.session_file);
        Ok(Self {
            config,
            store,
            sessions,
        })
    }

    /// Restore the stored session, or fail if nobody is signed in.
    pub fn require_session(&mut self) -> Result<Session, CommandError> {
        Session::restore(&mut self.sessions)?.ok_or(CommandError::NotSignedIn)
    }
}
