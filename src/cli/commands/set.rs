//! `keytree set`: add or update a secret.

use std::io::{self, IsTerminal, Read};

use zeroize::Zeroizing;

use crate::cli::{output, Session};
use crate::errors::{KeyTreeError, Result};

/// Execute the `set` command.
///
/// `from_shell` is true inside the interactive shell, where stdin
/// carries the command stream itself and inline values never reach
/// the user's shell history.
pub fn execute(
    session: &mut Session,
    path: &str,
    value: Option<&str>,
    from_shell: bool,
) -> Result<()> {
    let secret = resolve_value(path, value, from_shell)?;

    let existed = session.store().has_value(path);
    session.store_mut().set(path, &secret)?;

    if existed {
        output::success(&format!("Secret '{path}' updated"));
    } else {
        output::success(&format!("Secret '{path}' added"));
    }
    Ok(())
}

/// Determine the secret value from one of three sources.
fn resolve_value(path: &str, value: Option<&str>, from_shell: bool) -> Result<Zeroizing<String>> {
    if let Some(v) = value {
        // Source 1: Inline value on the command line.
        if !from_shell {
            output::warning("Value provided on command line, it may appear in shell history.");
        }
        return Ok(Zeroizing::new(v.to_string()));
    }

    if !from_shell && !io::stdin().is_terminal() {
        // Source 2: Piped input (stdin is not a terminal).
        let mut buf = Zeroizing::new(String::new());
        io::stdin().read_to_string(&mut buf)?;
        let trimmed = buf.trim_end().to_string();
        return Ok(Zeroizing::new(trimmed));
    }

    // Source 3: Interactive secure prompt (default).
    let entered = dialoguer::Password::new()
        .with_prompt(format!("Enter value for {path}"))
        .interact()
        .map_err(|e| KeyTreeError::CommandFailed(format!("input prompt: {e}")))?;
    Ok(Zeroizing::new(entered))
}
