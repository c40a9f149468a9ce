use anyhow::Result;
use crossterm::style::Print;
use crossterm::QueueableCommand;
use std::io::Write;

use crate::reminder::{Notifier, Permission};

/// Desktop notifications through the terminal emulator: an OSC 9 sequence
/// (understood by iTerm2, kitty, WezTerm, Windows Terminal and others)
/// followed by a bell for terminals that ignore it.
pub struct TerminalNotifier<W: Write> {
    out: W,
    wanted: bool,
    permission: Permission,
}

impl<W: Write> TerminalNotifier<W> {
    /// `wanted` is what the user configured; nothing is granted until
    /// [`Notifier::request_permission`] runs.
    pub fn new(out: W, wanted: bool) -> Self {
        TerminalNotifier {
            out,
            wanted,
            permission: Permission::Default,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Notifier for TerminalNotifier<W> {
    fn permission(&self) -> Permission {
        self.permission
    }

    fn request_permission(&mut self) -> Permission {
        if self.permission == Permission::Default {
            self.permission = if self.wanted {
                Permission::Granted
            } else {
                Permission::Denied
            };
        }
        self.permission
    }

    fn set_permission(&mut self, permission: Permission) {
        self.permission = permission;
    }

    fn notify(&mut self, title: &str, body: &str) -> Result<()> {
        let text = format!("{}: {}", title, body).replace(['\x07', '\x1b'], "");
        self.out.queue(Print(format!("\x1b]9;{}\x07", text)))?;
        self.out.queue(Print("\x07"))?;
        self.out.flush()?;
        Ok(())
    }
}
