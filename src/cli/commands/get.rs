//! `keytree get`: decrypt and print a single secret.

use zeroize::Zeroizing;

use crate::cli::Session;
use crate::errors::Result;

/// Execute the `get` command.
pub fn execute(session: &Session, path: &str) -> Result<()> {
    let value = Zeroizing::new(session.store().get(path)?);
    println!("{}", value.as_str());
    Ok(())
}
