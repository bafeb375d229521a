//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::tree::Entry;

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print a table of tree entries (Path, Secret, Children).
///
/// Only structure is shown; values stay encrypted.
pub fn print_entries_table<'a>(entries: impl IntoIterator<Item = Entry<'a>>) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Path", "Secret", "Children"]);

    let mut rows = 0usize;
    for entry in entries {
        table.add_row(vec![
            entry.path.clone(),
            yes_no(entry.value.is_some()).to_string(),
            yes_no(entry.has_children).to_string(),
        ]);
        rows += 1;
    }

    if rows == 0 {
        info("No secrets in this store yet.");
        tip("Run `keytree set <PATH>` to add your first secret.");
        return;
    }

    println!("{table}");
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "-"
    }
}
