//! `keytree generate`: store a freshly generated random password.

use crate::cli::{output, password_gen, Session};
use crate::errors::Result;

/// Execute the `generate` command.
pub fn execute(
    session: &mut Session,
    path: &str,
    length: Option<usize>,
    classes: Option<&str>,
) -> Result<()> {
    let length = length.unwrap_or(session.settings().generate_length);
    let classes = classes
        .map(str::to_string)
        .unwrap_or_else(|| session.settings().generate_classes.clone());

    let password = password_gen::generate(length, &classes)?;
    session.store_mut().set(path, &password)?;

    output::success(&format!("Generated a {length}-character secret at '{path}'"));
    output::tip(&format!("Run `keytree copy {path}` to use it."));
    Ok(())
}
