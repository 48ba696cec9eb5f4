//! Input processing layer: key mapping and numeric prefix accumulator.
//!
//! Pure logic, no I/O. All functions are deterministic and testable.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

const MAX_COUNT: u32 = 999;

/// Accumulated numeric prefix for vim/less-style commands.
///
/// Users type digits then a command character: `3j` scrolls down three times.
pub(super) struct InputAccumulator {
    count: Option<u32>,
}

impl InputAccumulator {
    pub(super) fn new() -> Self {
        Self { count: None }
    }

    /// Feed a digit. Digits that would exceed `MAX_COUNT` are ignored.
    fn push_digit(&mut self, d: u32) {
        let new = self.count.unwrap_or(0).saturating_mul(10).saturating_add(d);
        if new <= MAX_COUNT {
            self.count = Some(new);
        }
    }

    /// Take the accumulated count, resetting to None.
    fn take(&mut self) -> Option<u32> {
        self.count.take()
    }

    /// Peek at the current accumulated count without consuming it.
    pub(super) fn peek(&self) -> Option<u32> {
        self.count
    }

    pub(super) fn reset(&mut self) {
        self.count = None;
    }

    pub(super) fn is_active(&self) -> bool {
        self.count.is_some()
    }
}

/// Actions produced by key input processing.
#[derive(Debug)]
pub(super) enum KeyAction {
    Quit,
    ScrollDown(u32),
    ScrollUp(u32),
    CancelInput,
    /// A digit was accumulated; caller should redraw status bar.
    Digit,
}

/// Map a key event to a `KeyAction`, consuming/updating the accumulator as needed.
///
/// Returns `None` for unknown keys (caller should reset accumulator).
pub(super) fn map_key_event(key: KeyEvent, acc: &mut InputAccumulator) -> Option<KeyAction> {
    let KeyEvent { code, modifiers, .. } = key;

    match (code, modifiers) {
        (KeyCode::Char('q'), _) | (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
            Some(KeyAction::Quit)
        }

        (KeyCode::Esc, _) => {
            acc.reset();
            Some(KeyAction::CancelInput)
        }

        (KeyCode::Char(c @ '0'..='9'), KeyModifiers::NONE) => {
            acc.push_digit(c as u32 - '0' as u32);
            Some(KeyAction::Digit)
        }

        (KeyCode::Char('j'), _) | (KeyCode::Down, _) => {
            Some(KeyAction::ScrollDown(acc.take().unwrap_or(1)))
        }
        (KeyCode::Char('k'), _) | (KeyCode::Up, _) => {
            Some(KeyAction::ScrollUp(acc.take().unwrap_or(1)))
        }

        _ => None,
    }
}
