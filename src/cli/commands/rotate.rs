//! `keytree rotate`: change the store password.
//!
//! Every secret is re-encrypted under a key derived from the new
//! password and a new salt, then the store is flushed.  If any value
//! fails to decrypt nothing changes, in memory or on disk.

use crate::cli::{output, prompt_new_password, Session, NEW_PASSWORD_ENV};
use crate::errors::Result;

/// Execute the `rotate` command.
pub fn execute(session: &mut Session) -> Result<()> {
    output::info("Choose your new store password.");
    let new_password = prompt_new_password(Some(NEW_PASSWORD_ENV))?;

    let count = session.store_mut().rotate(new_password.as_bytes())?;
    session.flush()?;

    output::success(&format!(
        "Password rotated ({count} secrets re-encrypted)"
    ));
    Ok(())
}
