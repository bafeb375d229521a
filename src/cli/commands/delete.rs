//! `keytree delete`: clear a secret or drop a valueless branch.

use dialoguer::Confirm;

use crate::cli::{output, Session};
use crate::errors::{KeyTreeError, Result};
use crate::vault::DeleteOutcome;

/// Execute the `delete` command.
pub fn execute(session: &mut Session, path: &str, force: bool) -> Result<()> {
    if !session.store().contains(path) {
        return Err(KeyTreeError::PathNotFound(path.to_string()));
    }

    // Unless --force is set, ask for confirmation before deleting.
    if !force {
        let prompt = if session.store().has_value(path) {
            format!("Delete secret '{path}'?")
        } else {
            format!("Delete '{path}' and everything below it?")
        };
        let confirmed = Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map_err(|e| KeyTreeError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    match session.store_mut().smart_delete(path)? {
        DeleteOutcome::ClearedValue => output::success(&format!("Deleted secret '{path}'")),
        DeleteOutcome::RemovedNode => output::success(&format!("Removed '{path}'")),
    }

    Ok(())
}
