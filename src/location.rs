//! Location feed: a websocket push stream of the current world.
//!
//! A background thread owns the socket and forwards decoded frames through
//! an `mpsc::channel`. The main thread only cares about the latest value,
//! so [`LocationFeed::latest`] collapses queued updates into one.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};
use tungstenite::Message;

use crate::chain::WorldRef;
use crate::wire;

pub struct LocationFeed {
    rx: mpsc::Receiver<Option<WorldRef>>,
}

impl LocationFeed {
    /// Connect to `url` on a background thread, reconnecting after
    /// `reconnect` whenever the connection drops.
    pub fn connect(url: String, reconnect: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            loop {
                if let Err(e) = stream_frames(&url, &tx) {
                    warn!("location: {url}: {e}");
                }
                // Feed lost: location is unknown until the next frame.
                if tx.send(None).is_err() {
                    debug!("location: receiver dropped, exiting");
                    return;
                }
                thread::sleep(reconnect);
            }
        });
        Self { rx }
    }

    #[cfg(test)]
    fn from_channel(rx: mpsc::Receiver<Option<WorldRef>>) -> Self {
        Self { rx }
    }

    /// The most recent update since the last call, if any (non-blocking).
    pub fn latest(&self) -> Option<Option<WorldRef>> {
        let mut latest = None;
        while let Ok(update) = self.rx.try_recv() {
            latest = Some(update);
        }
        latest
    }
}

/// Read frames until the socket closes. Returns `Ok` on a clean close.
fn stream_frames(url: &str, tx: &mpsc::Sender<Option<WorldRef>>) -> anyhow::Result<()> {
    let (mut socket, _) = tungstenite::connect(url)?;
    info!("location: connected to {url}");
    loop {
        match socket.read()? {
            Message::Text(text) => match wire::decode_location(text.as_str()) {
                Ok(location) => {
                    debug!("location: {location:?}");
                    if tx.send(location).is_err() {
                        return Ok(());
                    }
                }
                Err(e) => warn!("location: ignoring frame: {e}"),
            },
            Message::Close(_) => {
                info!("location: {url} closed");
                return Ok(());
            }
            _ => {}
        }
    }
}
