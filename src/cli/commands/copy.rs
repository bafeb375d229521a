//! `keytree copy`: put a secret on the clipboard for a short time.

use std::thread;
use std::time::Duration;

use arboard::Clipboard;
use zeroize::Zeroizing;

use crate::cli::{output, Session};
use crate::errors::{KeyTreeError, Result};

/// Execute the `copy` command.
///
/// Blocks until the clipboard is cleared when a clear delay is set.
pub fn execute(session: &Session, path: &str) -> Result<()> {
    let value = Zeroizing::new(session.store().get(path)?);

    let mut clipboard =
        Clipboard::new().map_err(|e| KeyTreeError::ClipboardError(e.to_string()))?;
    clipboard
        .set_text(value.as_str())
        .map_err(|e| KeyTreeError::ClipboardError(e.to_string()))?;

    let secs = session.settings().clipboard_clear_secs;
    if secs == 0 {
        output::success(&format!("Copied '{path}' to the clipboard"));
        return Ok(());
    }

    output::success(&format!(
        "Copied '{path}' to the clipboard, clearing in {secs}s"
    ));
    thread::sleep(Duration::from_secs(secs));

    // Leave the clipboard alone if the user copied something else meanwhile.
    let current = Zeroizing::new(clipboard.get_text().unwrap_or_default());
    if current.as_str() == value.as_str() {
        clipboard
            .clear()
            .map_err(|e| KeyTreeError::ClipboardError(e.to_string()))?;
        output::info("Clipboard cleared.");
    }
    Ok(())
}
