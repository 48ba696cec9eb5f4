//! Terminal chain viewer.
//!
//! Layout:
//!   row 0               : current location header
//!   rows 2..2+rows      : one line per window slot
//!   row term_rows-1     : status bar
//!
//! Event loop:
//!   The main thread is the only place `CoreState` is touched. Fetch
//!   completions and location updates arrive over channels and are drained
//!   with `try_recv()` between input events, so every action runs to
//!   completion before the next one starts. Redraws are coalesced to at most
//!   one per frame budget.

mod input;
mod state;
mod terminal;

use crossterm::event::{self, Event};
use crossterm::terminal as crossterm_terminal;
use log::{debug, info};
use std::sync::Arc;
use std::time::Instant;

use crate::chain::NeighborRef;
use crate::config::Config;
use crate::location::LocationFeed;
use crate::scheduler::Scheduler;
use crate::state::{Action, CoreState};
use crate::transport::HttpFetcher;

use input::{InputAccumulator, KeyAction, map_key_event};

/// Reference to the configured seed record.
pub fn seed_ref(config: &Config) -> NeighborRef {
    NeighborRef::Unresolved {
        locator: config.seed_locator(),
        id: config.seed_id,
    }
}

/// Run the terminal viewer until the user quits.
pub fn run(config: &Config) -> anyhow::Result<()> {
    terminal::check_tty()?;

    let (scheduler, completions) =
        Scheduler::new(Arc::new(HttpFetcher::new(config.transport.timeout)));
    let feed = LocationFeed::connect(config.location_url.clone(), config.transport.reconnect);
    let mut core = CoreState::new(config.window.rows, config.window.scroll_speed);

    let (term_cols, term_rows) = crossterm_terminal::size()?;
    let mut layout = state::compute_layout(term_cols, term_rows);
    let mut guard = terminal::RawGuard::enter()?;

    info!("viewer: seeding from {}", config.seed_locator());
    scheduler.execute(core.seed(&seed_ref(config)));

    let budget = config.viewer.frame_budget;
    let mut acc = InputAccumulator::new();
    let mut dirty = true;
    let mut last_render = Instant::now();

    loop {
        while let Ok(completion) = completions.try_recv() {
            debug!("viewer: completion {}", completion.request);
            scheduler.complete(&mut core, completion);
            dirty = true;
        }
        if let Some(location) = feed.latest() {
            core.dispatch(Action::LocationChanged(location));
            dirty = true;
        }

        if dirty && last_render.elapsed() >= budget {
            terminal::draw(&layout, &core, acc.peek())?;
            last_render = Instant::now();
            dirty = false;
        }

        // Completions cannot wake `poll`, so it never blocks longer than one frame.
        let timeout = budget.saturating_sub(last_render.elapsed()).max(budget / 4);
        if !event::poll(timeout)? {
            continue;
        }

        match event::read()? {
            Event::Key(key_event) => match map_key_event(key_event, &mut acc) {
                Some(KeyAction::Quit) => break,
                Some(KeyAction::ScrollDown(count)) => {
                    for _ in 0..count {
                        scheduler.execute(core.dispatch(Action::ScrollDown));
                    }
                    dirty = true;
                }
                Some(KeyAction::ScrollUp(count)) => {
                    for _ in 0..count {
                        scheduler.execute(core.dispatch(Action::ScrollUp));
                    }
                    dirty = true;
                }
                Some(KeyAction::CancelInput) | Some(KeyAction::Digit) => {
                    terminal::draw_status_bar(&layout, &core, acc.peek())?;
                }
                None => {
                    if acc.is_active() {
                        acc.reset();
                        terminal::draw_status_bar(&layout, &core, None)?;
                    }
                }
            },
            Event::Resize(cols, rows) => {
                debug!("viewer: resize to {cols}x{rows}");
                layout = state::compute_layout(cols, rows);
                dirty = true;
            }
            _ => {}
        }
    }

    guard.cleanup();
    Ok(())
}
