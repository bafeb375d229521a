//! `keytree tree`: print the tree skeleton.

use crate::cli::{output, Session};
use crate::errors::Result;

/// Execute the `tree` command.
pub fn execute(session: &Session) -> Result<()> {
    let rendered = session.store().render();
    if rendered.is_empty() {
        output::info("No secrets in this store yet.");
        return Ok(());
    }
    print!("{rendered}");
    Ok(())
}
