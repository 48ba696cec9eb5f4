//! Terminal I/O layer: raw mode, window rows, header, status bar.

use crossterm::{
    ExecutableCommand, QueueableCommand, cursor,
    style::{self, Stylize},
    terminal,
};
use std::io::{self, Write, stdout};

use super::state::{self, Layout, RowKind};
use crate::state::CoreState;

// ---------------------------------------------------------------------------
// RawGuard: leaves raw mode and the alternate screen on drop
// ---------------------------------------------------------------------------

pub(super) struct RawGuard {
    cleaned: bool,
}

impl RawGuard {
    pub(super) fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        stdout().execute(terminal::EnterAlternateScreen)?;
        stdout().execute(cursor::Hide)?;
        Ok(Self { cleaned: false })
    }

    pub(super) fn cleanup(&mut self) {
        if self.cleaned {
            return;
        }
        self.cleaned = true;
        let mut out = stdout();
        let _ = out.execute(cursor::Show);
        let _ = out.execute(terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

impl Drop for RawGuard {
    fn drop(&mut self) {
        self.cleanup();
    }
}

fn padded(text: &str, cols: u16) -> String {
    let truncated: String = text.chars().take(cols as usize).collect();
    format!("{:<width$}", truncated, width = cols as usize)
}

/// Full redraw: header, one row per slot, status bar.
pub(super) fn draw(layout: &Layout, core: &CoreState, acc_peek: Option<u32>) -> io::Result<()> {
    let mut out = stdout();
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    out.queue(cursor::MoveTo(0, layout.header_row))?;
    let header = padded(&state::header_text(core), layout.cols);
    write!(out, "{}", header.bold())?;

    for (i, row) in state::rows(core).iter().enumerate() {
        let y = layout.first_slot_row + i as u16;
        if y >= layout.status_row {
            break;
        }
        out.queue(cursor::MoveTo(0, y))?;
        let text = padded(&row.text, layout.cols);
        match row.kind {
            RowKind::Highlighted => write!(out, "{}", text.red().bold())?,
            RowKind::Loading => write!(out, "{}", text.dark_grey())?,
            RowKind::Record | RowKind::Empty => write!(out, "{text}")?,
        }
    }

    draw_status_bar(layout, core, acc_peek)
}

/// Draw the status bar on the last terminal row.
///
/// `acc_peek` is the pending repeat count, shown as `:3_`.
pub(super) fn draw_status_bar(
    layout: &Layout,
    core: &CoreState,
    acc_peek: Option<u32>,
) -> io::Result<()> {
    let mut out = stdout();
    out.queue(cursor::MoveTo(0, layout.status_row))?;
    let text = padded(&state::status_text(core, acc_peek), layout.cols);
    write!(out, "{}", text.on_dark_grey().white())?;
    out.queue(style::ResetColor)?;
    out.flush()
}

pub(super) fn check_tty() -> anyhow::Result<()> {
    use std::io::IsTerminal;
    if !io::stdout().is_terminal() {
        anyhow::bail!(
            "holocron viewer requires an interactive terminal.\n\
             \n\
             To print the window once, use: holocron --dump"
        );
    }
    Ok(())
}
