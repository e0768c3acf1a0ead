use std::io::{ self, Write };
use crate::models::view::{ ConversationView, MessageView };

/// Prints a conversation view as a scrolling transcript. Settled messages are
/// printed once; a pending placeholder is printed each time and then replaced
/// by whatever settles in its slot.
pub struct TerminalRenderer<W: Write> {
    out: W,
    shown: usize,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out, shown: 0 }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Prints everything not yet shown, ending at the view's scroll anchor.
    pub fn sync(&mut self, view: &ConversationView) -> io::Result<()> {
        if view.messages.len() < self.shown {
            self.shown = 0;
        }
        let end = (view.scroll_to + 1).min(view.messages.len());
        for entry in &view.messages[self.shown.min(end)..end] {
            writeln!(self.out, "{}", format_entry(entry))?;
        }
        self.shown = if view.pending && view.messages.last().is_some_and(|m| m.placeholder) {
            end.saturating_sub(1)
        } else {
            end
        };
        self.out.flush()
    }

    /// Starts over after the log was reset.
    pub fn reset(&mut self, banner: &str) -> io::Result<()> {
        self.shown = 0;
        writeln!(self.out, "--- {} ---", banner)
    }

    pub fn prompt(&mut self, pending: bool) -> io::Result<()> {
        if pending {
            write!(self.out, "(waiting) > ")?;
        } else {
            write!(self.out, "> ")?;
        }
        self.out.flush()
    }
}

pub fn format_entry(entry: &MessageView) -> String {
    format!("[{}] {}: {}", entry.time, entry.author, entry.content)
}
