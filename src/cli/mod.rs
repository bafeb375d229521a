//! CLI module: Clap argument parser, output helpers, the interactive
//! shell, and command implementations.

pub mod commands;
pub mod output;
pub mod password_gen;
pub mod session;
pub mod shell;

use std::path::PathBuf;

use clap::Parser;

use zeroize::Zeroizing;

use crate::config::Settings;
use crate::errors::{KeyTreeError, Result};

pub use session::Session;

/// Minimum password length to prevent trivially weak passwords.
const MIN_PASSWORD_LEN: usize = 8;

/// Environment variable holding the store password for scripted use.
pub const PASSWORD_ENV: &str = "KEYTREE_PASSWORD";

/// Environment variable holding the new password for scripted `rotate`.
pub const NEW_PASSWORD_ENV: &str = "KEYTREE_NEW_PASSWORD";

/// How many wrong passwords are accepted before giving up.
const MAX_PASSWORD_ATTEMPTS: usize = 3;

/// KeyTree CLI: password-encrypted hierarchical secret store.
#[derive(Parser)]
#[command(
    name = "keytree",
    about = "Password-encrypted hierarchical secret store",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Store file (default: <config dir>/keytree/secrets.ktree)
    #[arg(short, long, global = true)]
    pub file: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Print the secret stored at a path
    Get {
        /// Slash-separated path (e.g. email/gmail)
        path: String,
    },

    /// Set a secret (add or update)
    Set {
        /// Slash-separated path (e.g. email/gmail)
        path: String,
        /// Secret value (omit for interactive prompt)
        value: Option<String>,
    },

    /// Delete a secret, or a whole valueless branch
    Delete {
        /// Slash-separated path
        path: String,
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Show the tree skeleton (no values)
    Tree,

    /// List every path in a table
    List,

    /// Find paths matching a case-insensitive regular expression
    Search {
        /// Pattern to match against full paths
        pattern: String,
    },

    /// Copy a secret to the clipboard, clearing it after a delay
    Copy {
        /// Slash-separated path
        path: String,
    },

    /// Generate a random password and store it at a path
    Generate {
        /// Slash-separated path
        path: String,
        /// Password length (default from config)
        length: Option<usize>,
        /// Character classes: a=lower, A=upper, 1=digits, !=symbols
        classes: Option<String>,
    },

    /// Change the store password and re-encrypt every secret
    Rotate,

    /// Start an interactive shell on the open store
    Shell,

    /// Print a shell completion script to stdout
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

impl Commands {
    /// Whether the command changes the store and must flush afterwards.
    pub fn mutates(&self) -> bool {
        matches!(
            self,
            Commands::Set { .. }
                | Commands::Delete { .. }
                | Commands::Generate { .. }
                | Commands::Rotate
        )
    }
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Password from `KEYTREE_PASSWORD`, if set and non-empty.
fn password_from_env() -> Option<Zeroizing<String>> {
    match std::env::var(PASSWORD_ENV) {
        Ok(pw) if !pw.is_empty() => Some(Zeroizing::new(pw)),
        _ => None,
    }
}

/// Get the store password, trying in order:
/// 1. `KEYTREE_PASSWORD` environment variable
/// 2. Interactive masked prompt
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn prompt_password() -> Result<Zeroizing<String>> {
    if let Some(pw) = password_from_env() {
        return Ok(pw);
    }

    let pw = dialoguer::Password::new()
        .with_prompt("Enter store password")
        .interact()
        .map_err(|e| KeyTreeError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Prompt for a new password with confirmation (new stores, rotation).
///
/// When `env_var` names a set, non-empty environment variable its value
/// is used instead, for scripted usage.  Enforces a minimum password
/// length either way.
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn prompt_new_password(env_var: Option<&str>) -> Result<Zeroizing<String>> {
    if let Some(var) = env_var {
        if let Ok(pw) = std::env::var(var) {
            if !pw.is_empty() {
                let pw = Zeroizing::new(pw);
                if pw.len() < MIN_PASSWORD_LEN {
                    return Err(KeyTreeError::CommandFailed(format!(
                        "password must be at least {MIN_PASSWORD_LEN} characters"
                    )));
                }
                return Ok(pw);
            }
        }
    }

    loop {
        let password = dialoguer::Password::new()
            .with_prompt("Choose store password")
            .with_confirmation(
                "Confirm store password",
                "Passwords do not match, try again",
            )
            .interact()
            .map_err(|e| KeyTreeError::CommandFailed(format!("password prompt: {e}")))?;

        if password.len() < MIN_PASSWORD_LEN {
            output::warning(&format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters. Try again."
            ));
            continue;
        }

        return Ok(Zeroizing::new(password));
    }
}

/// Load settings, resolve the store path and open a session.
///
/// A missing file starts a new store with a confirmed password.  For an
/// existing file a wrong password is re-prompted up to
/// `MAX_PASSWORD_ATTEMPTS` times; a password taken from the environment
/// gets a single attempt.
pub fn open_session(cli: &Cli) -> Result<Session> {
    let settings = Settings::load_default()?;
    let path = settings.resolve_store_path(cli.file.as_deref());

    if !path.exists() {
        output::info(&format!(
            "No store at {}, a new one will be created.",
            path.display()
        ));
        let password = prompt_new_password(Some(PASSWORD_ENV))?;
        return Session::open(&path, password.as_bytes(), settings);
    }

    let from_env = password_from_env().is_some();
    let mut attempt = 1;
    loop {
        let password = prompt_password()?;
        match Session::open(&path, password.as_bytes(), settings.clone()) {
            Err(KeyTreeError::DecryptionFailed)
                if !from_env && attempt < MAX_PASSWORD_ATTEMPTS =>
            {
                output::warning("Wrong password, try again.");
                attempt += 1;
            }
            other => return other,
        }
    }
}
