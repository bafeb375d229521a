//! One module per command.  Each `execute` works on an open `Session`
//! so the same code serves one-shot subcommands and the shell.

pub mod completions;
pub mod copy;
pub mod delete;
pub mod generate;
pub mod get;
pub mod list;
pub mod rotate;
pub mod search;
pub mod set;
pub mod tree;
