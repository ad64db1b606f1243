//! System clipboard access for copying a channel as plain text

use anyhow::{Context, Result};
use arboard::Clipboard;

/// Put `text` on the clipboard
///
/// Opens a fresh handle per call. Fails without a display server (for
/// example over plain SSH).
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard = Clipboard::new().context("Clipboard unavailable")?;
    clipboard
        .set_text(text.to_owned())
        .context("Could not set clipboard text")
}
