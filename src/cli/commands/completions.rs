//! `keytree completions`: print a completion script for a shell.
//!
//! The shell name is parsed by clap, so only supported shells reach
//! this module.  Typical use:
//!
//! ```text
//! keytree completions zsh > ~/.zfunc/_keytree
//! ```

use std::io::{self, Write};

use clap::CommandFactory;
use clap_complete::Shell;

use crate::cli::Cli;
use crate::errors::Result;

/// Binary name baked into the generated scripts.
const BIN_NAME: &str = "keytree";

/// Execute the `completions` command.
pub fn execute(shell: Shell) -> Result<()> {
    let mut stdout = io::stdout().lock();
    write_script(shell, &mut stdout)?;
    stdout.flush()?;
    Ok(())
}

/// Render the completion script for `shell` into `out`.
fn write_script(shell: Shell, out: &mut dyn Write) -> Result<()> {
    let mut cmd = Cli::command();
    let mut script = Vec::new();
    clap_complete::generate(shell, &mut cmd, BIN_NAME, &mut script);
    out.write_all(&script)?;
    Ok(())
}
