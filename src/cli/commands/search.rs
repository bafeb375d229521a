//! `keytree search`: find paths by regular expression.

use crate::cli::{output, Session};
use crate::errors::Result;

/// Execute the `search` command.
pub fn execute(session: &Session, pattern: &str) -> Result<()> {
    let matches = session.store().search(pattern)?;
    if matches.is_empty() {
        output::info(&format!("No paths match '{pattern}'."));
        return Ok(());
    }
    for path in &matches {
        println!("{path}");
    }
    Ok(())
}
