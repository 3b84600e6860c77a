//! Session commands.
//!
//! # Usage
//!
//! ```bash
//! nd-cli login -e agent@example.com -p hunter2
//! NEXDOOR_PASSWORD=hunter2 nd-cli login -e agent@example.com
//! nd-cli whoami
//! nd-cli logout
//! ```

use nexdoor_leads::Session;
use nexdoor_leads::config::get_required;
use secrecy::SecretString;

use super::{CommandError, Context};

/// Sign in and persist the session.
///
/// The password comes from `password` or, if absent, `NEXDOOR_PASSWORD`.
pub async fn login(email: &str, password: Option<String>) -> Result<(), CommandError> {
    let mut ctx = Context::load()?;

    let password = match password {
        Some(password) => password,
        None => get_required(|key| std::env::var(key).ok(), "NEXDOOR_PASSWORD")?,
    };
    let password = SecretString::from(password);

    tracing::info!("Signing in as {email}...");
    let user = ctx.store.login(email, &password).await?;
    let session = Session::login(&mut ctx.sessions, user)?;

    tracing::info!(
        user_id = %session.owner_id(),
        session_file = %ctx.config.session_file.display(),
        "Signed in"
    );
    Ok(())
}

/// Forget the stored session. Signing out twice is not an error.
pub fn logout() -> Result<(), CommandError> {
    let mut ctx = Context::load()?;

    match Session::restore(&mut ctx.sessions)? {
        Some(session) => {
            let user_id = session.owner_id().clone();
            session.logout(&mut ctx.sessions)?;
            tracing::info!(%user_id, "Signed out");
        }
        None => tracing::info!("Not signed in"),
    }
    Ok(())
}

/// Print the signed-in user.
#[allow(clippy::print_stdout)]
pub fn whoami() -> Result<(), CommandError> {
    let mut ctx = Context::load()?;
    let session = ctx.require_session()?;
    let user = session.user();

    println!("id:    {}", user.id);
    if let Some(email) = &user.email {
        println!("email: {email}");
    }
    if let Some(name) = &user.name {
        println!("name:  {name}");
    }
    println!("page:  {}", session.page());
    Ok(())
}
