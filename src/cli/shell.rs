//! Interactive shell over an open session.
//!
//! Each line is split on whitespace; the first word picks a command from
//! the fixed `Command` set and the rest are handed to its handler.
//! Every handler has the same signature and receives the session by
//! `&mut`, so there is no global state.
//!
//! Lines are read on a helper thread, one line per request, so prompts
//! opened by a command (passwords, confirmations) never compete with
//! the shell for stdin.  If no line arrives within the configured
//! timeout the shell returns `InputTimeout` without saving.

use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::cli::commands;
use crate::cli::{output, Session};
use crate::errors::{KeyTreeError, Result};

/// What the loop does after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Every command the shell understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Get,
    Set,
    Delete,
    Tree,
    List,
    Search,
    Copy,
    Generate,
    Rotate,
    Save,
    Help,
    Quit,
}

/// Signature shared by all shell handlers.
pub type Handler = fn(&mut Session, &[&str]) -> Result<Flow>;

/// Name, help text and handler for one command.
#[derive(Clone, Copy)]
pub struct CommandSpec {
    pub name: &'static str,
    pub usage: &'static str,
    pub about: &'static str,
    pub handler: Handler,
}

impl Command {
    pub const ALL: [Command; 12] = [
        Command::Get,
        Command::Set,
        Command::Delete,
        Command::Tree,
        Command::List,
        Command::Search,
        Command::Copy,
        Command::Generate,
        Command::Rotate,
        Command::Save,
        Command::Help,
        Command::Quit,
    ];

    /// The dispatch table.  The match is exhaustive, so adding a
    /// variant without an entry does not compile.
    pub fn spec(self) -> CommandSpec {
        match self {
            Command::Get => CommandSpec {
                name: "get",
                usage: "get <path>",
                about: "print the secret at a path",
                handler: handle_get,
            },
            Command::Set => CommandSpec {
                name: "set",
                usage: "set <path> [value]",
                about: "set a secret to the rest of the line (prompts if empty)",
                handler: handle_set,
            },
            Command::Delete => CommandSpec {
                name: "delete",
                usage: "delete <path> [--force]",
                about: "clear a secret, or remove a valueless branch",
                handler: handle_delete,
            },
            Command::Tree => CommandSpec {
                name: "tree",
                usage: "tree",
                about: "show the tree skeleton",
                handler: handle_tree,
            },
            Command::List => CommandSpec {
                name: "list",
                usage: "list",
                about: "list every path in a table",
                handler: handle_list,
            },
            Command::Search => CommandSpec {
                name: "search",
                usage: "search <pattern>",
                about: "find paths by regular expression",
                handler: handle_search,
            },
            Command::Copy => CommandSpec {
                name: "copy",
                usage: "copy <path>",
                about: "copy a secret to the clipboard",
                handler: handle_copy,
            },
            Command::Generate => CommandSpec {
                name: "generate",
                usage: "generate <path> [length] [classes]",
                about: "store a random password (classes: a A 1 !)",
                handler: handle_generate,
            },
            Command::Rotate => CommandSpec {
                name: "rotate",
                usage: "rotate",
                about: "change the store password and save",
                handler: handle_rotate,
            },
            Command::Save => CommandSpec {
                name: "save",
                usage: "save",
                about: "write pending changes to disk",
                handler: handle_save,
            },
            Command::Help => CommandSpec {
                name: "help",
                usage: "help",
                about: "show this list",
                handler: handle_help,
            },
            Command::Quit => CommandSpec {
                name: "quit",
                usage: "quit",
                about: "save and leave the shell",
                handler: handle_quit,
            },
        }
    }

    /// Look a command up by its name.
    pub fn from_name(name: &str) -> Option<Command> {
        Command::ALL.into_iter().find(|c| c.spec().name == name)
    }
}

/// Run one already-split command line against the session.
pub fn dispatch(session: &mut Session, name: &str, args: &[&str]) -> Result<Flow> {
    let command =
        Command::from_name(name).ok_or_else(|| KeyTreeError::UnknownCommand(name.to_string()))?;
    debug!(command = name, args = args.len(), "dispatching");
    (command.spec().handler)(session, args)
}

/// Split an input line into a command name and its arguments.
///
/// Arguments are whitespace-separated words, except for `set`: there
/// the value is the rest of the line after the path and the single
/// separator following it, kept exactly as typed.  Only the line
/// terminator is dropped.
fn split_line(line: &str) -> Option<(&str, Vec<&str>)> {
    let line = line.trim_end_matches(['\n', '\r']);
    let (name, rest) = next_word(line)?;
    if Command::from_name(name) != Some(Command::Set) {
        return Some((name, rest.split_whitespace().collect()));
    }

    let mut args = Vec::new();
    if let Some((path, tail)) = next_word(rest) {
        args.push(path);
        let mut chars = tail.chars();
        chars.next();
        let value = chars.as_str();
        if !value.is_empty() {
            args.push(value);
        }
    }
    Some((name, args))
}

/// First whitespace-delimited word of `s` and everything after it.
fn next_word(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    let end = s.find(char::is_whitespace).unwrap_or(s.len());
    Some(s.split_at(end))
}

/// Run the shell until `quit`, end of input, or an input timeout.
///
/// Pending changes are flushed on `quit` and at end of input.
pub fn run(session: &mut Session) -> Result<()> {
    let timeout = session.settings().input_timeout_secs;
    let input = LineReader::spawn();

    output::info("Type `help` for commands, `quit` to save and exit.");
    loop {
        print!("keytree> ");
        io::stdout().flush()?;

        let Some(line) = input.next_line(timeout)? else {
            println!();
            break;
        };
        let Some((name, args)) = split_line(&line) else {
            continue;
        };

        match dispatch(session, name, &args) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(e) => output::error(&e.to_string()),
        }
    }

    if session.store().is_dirty() {
        session.flush()?;
        output::success("Saved.");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn expect_args(command: Command, args: &[&str], min: usize, max: usize) -> Result<()> {
    if args.len() < min || args.len() > max {
        return Err(KeyTreeError::CommandFailed(format!(
            "usage: {}",
            command.spec().usage
        )));
    }
    Ok(())
}

fn handle_get(session: &mut Session, args: &[&str]) -> Result<Flow> {
    expect_args(Command::Get, args, 1, 1)?;
    commands::get::execute(session, args[0])?;
    Ok(Flow::Continue)
}

fn handle_set(session: &mut Session, args: &[&str]) -> Result<Flow> {
    expect_args(Command::Set, args, 1, 2)?;
    commands::set::execute(session, args[0], args.get(1).copied(), true)?;
    Ok(Flow::Continue)
}

fn handle_delete(session: &mut Session, args: &[&str]) -> Result<Flow> {
    expect_args(Command::Delete, args, 1, 2)?;
    let force = match args.get(1) {
        None => false,
        Some(&"--force") | Some(&"-f") => true,
        Some(_) => {
            return Err(KeyTreeError::CommandFailed(format!(
                "usage: {}",
                Command::Delete.spec().usage
            )))
        }
    };
    commands::delete::execute(session, args[0], force)?;
    Ok(Flow::Continue)
}

fn handle_tree(session: &mut Session, args: &[&str]) -> Result<Flow> {
    expect_args(Command::Tree, args, 0, 0)?;
    commands::tree::execute(session)?;
    Ok(Flow::Continue)
}

fn handle_list(session: &mut Session, args: &[&str]) -> Result<Flow> {
    expect_args(Command::List, args, 0, 0)?;
    commands::list::execute(session)?;
    Ok(Flow::Continue)
}

fn handle_search(session: &mut Session, args: &[&str]) -> Result<Flow> {
    expect_args(Command::Search, args, 1, 1)?;
    commands::search::execute(session, args[0])?;
    Ok(Flow::Continue)
}

fn handle_copy(session: &mut Session, args: &[&str]) -> Result<Flow> {
    expect_args(Command::Copy, args, 1, 1)?;
    commands::copy::execute(session, args[0])?;
    Ok(Flow::Continue)
}

fn handle_generate(session: &mut Session, args: &[&str]) -> Result<Flow> {
    expect_args(Command::Generate, args, 1, 3)?;
    let length = args
        .get(1)
        .map(|raw| {
            raw.parse::<usize>()
                .map_err(|_| KeyTreeError::CommandFailed(format!("invalid length '{raw}'")))
        })
        .transpose()?;
    commands::generate::execute(session, args[0], length, args.get(2).copied())?;
    Ok(Flow::Continue)
}

fn handle_rotate(session: &mut Session, args: &[&str]) -> Result<Flow> {
    expect_args(Command::Rotate, args, 0, 0)?;
    commands::rotate::execute(session)?;
    Ok(Flow::Continue)
}

fn handle_save(session: &mut Session, args: &[&str]) -> Result<Flow> {
    expect_args(Command::Save, args, 0, 0)?;
    session.flush()?;
    output::success("Saved.");
    Ok(Flow::Continue)
}

fn handle_help(_session: &mut Session, _args: &[&str]) -> Result<Flow> {
    for command in Command::ALL {
        let spec = command.spec();
        println!("  {:<36} {}", spec.usage, spec.about);
    }
    Ok(Flow::Continue)
}

fn handle_quit(_session: &mut Session, args: &[&str]) -> Result<Flow> {
    expect_args(Command::Quit, args, 0, 0)?;
    Ok(Flow::Quit)
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Reads stdin on a background thread, one line per request.
struct LineReader {
    requests: Sender<()>,
    lines: Receiver<io::Result<Option<String>>>,
}

impl LineReader {
    fn spawn() -> Self {
        let (req_tx, req_rx) = mpsc::channel::<()>();
        let (line_tx, line_rx) = mpsc::channel();

        thread::spawn(move || {
            let stdin = io::stdin();
            for () in req_rx {
                let mut line = String::new();
                let result = match stdin.lock().read_line(&mut line) {
                    Ok(0) => Ok(None),
                    Ok(_) => Ok(Some(line)),
                    Err(e) => Err(e),
                };
                if line_tx.send(result).is_err() {
                    break;
                }
            }
        });

        Self {
            requests: req_tx,
            lines: line_rx,
        }
    }

    /// Next line, `None` at end of input.  A zero timeout waits forever.
    fn next_line(&self, timeout_secs: u64) -> Result<Option<String>> {
        let stopped = || KeyTreeError::CommandFailed("input reader stopped".into());

        self.requests.send(()).map_err(|_| stopped())?;
        let received = if timeout_secs == 0 {
            self.lines.recv().map_err(|_| stopped())?
        } else {
            match self.lines.recv_timeout(Duration::from_secs(timeout_secs)) {
                Ok(received) => received,
                Err(RecvTimeoutError::Timeout) => {
                    return Err(KeyTreeError::InputTimeout(timeout_secs))
                }
                Err(RecvTimeoutError::Disconnected) => return Err(stopped()),
            }
        };
        Ok(received?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn session(dir: &TempDir) -> Session {
        let path = dir.path().join("shell.ktree");
        Session::open(&path, b"shell-password", Settings::default()).unwrap()
    }

    #[test]
    fn table_names_are_unique_and_round_trip() {
        let mut seen = HashSet::new();
        for command in Command::ALL {
            let name = command.spec().name;
            assert!(seen.insert(name), "duplicate command name {name}");
            assert_eq!(Command::from_name(name), Some(command));
            assert!(command.spec().usage.starts_with(name));
        }
    }

    #[test]
    fn unknown_command_is_reported() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        assert!(matches!(
            dispatch(&mut s, "frobnicate", &[]),
            Err(KeyTreeError::UnknownCommand(_))
        ));
    }

    #[test]
    fn set_delete_and_save_through_table() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);

        dispatch(&mut s, "set", &["email/gmail", "correct horse"]).unwrap();
        assert_eq!(s.store().get("email/gmail").unwrap(), "correct horse");

        dispatch(&mut s, "delete", &["email/gmail", "--force"]).unwrap();
        assert!(!s.store().contains("email"));

        dispatch(&mut s, "generate", &["bank/pin", "6", "1"]).unwrap();
        let pin = s.store().get("bank/pin").unwrap();
        assert_eq!(pin.len(), 6);
        assert!(pin.bytes().all(|b| b.is_ascii_digit()));

        assert_eq!(dispatch(&mut s, "save", &[]).unwrap(), Flow::Continue);
        assert!(!s.store().is_dirty());
        assert!(dir.path().join("shell.ktree").exists());
    }

    #[test]
    fn set_value_keeps_its_whitespace() {
        let (name, args) = split_line("set wifi/home  two  spaces \n").unwrap();
        assert_eq!(name, "set");
        assert_eq!(args, vec!["wifi/home", " two  spaces "]);

        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        dispatch(&mut s, name, &args).unwrap();
        assert_eq!(s.store().get("wifi/home").unwrap(), " two  spaces ");
    }

    #[test]
    fn other_commands_split_on_whitespace() {
        let (name, args) = split_line("  delete   a/b   --force\r\n").unwrap();
        assert_eq!(name, "delete");
        assert_eq!(args, vec!["a/b", "--force"]);

        assert_eq!(split_line("set only/path\n").unwrap().1, vec!["only/path"]);
        assert!(split_line("   \n").is_none());
    }

    #[test]
    fn wrong_arity_shows_usage() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        let err = dispatch(&mut s, "get", &[]).unwrap_err();
        assert!(err.to_string().contains("get <path>"));
        assert!(dispatch(&mut s, "generate", &["a", "notanumber"]).is_err());
        assert!(dispatch(&mut s, "delete", &["a", "--nope"]).is_err());
    }

    #[test]
    fn quit_stops_the_loop() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        assert_eq!(dispatch(&mut s, "quit", &[]).unwrap(), Flow::Quit);
    }
}
