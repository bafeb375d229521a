//! `keytree list`: display every path in a table.

use crate::cli::{output, Session};
use crate::errors::Result;

/// Execute the `list` command.
pub fn execute(session: &Session) -> Result<()> {
    let store = session.store();
    output::info(&format!("{}: {} node(s)", store.path().display(), store.node_count()));
    output::print_entries_table(store.iterate());
    Ok(())
}
