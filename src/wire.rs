//! Wire decoding for chain records and location frames.
//!
//! Records arrive as JSON:
//!
//! ```json
//! { "id": 3616, "name": "Darth Sidious",
//!   "homeworld": { "id": 7, "name": "Naboo" },
//!   "master": { "id": null, "url": null },
//!   "apprentice": { "id": 1489, "url": "http://localhost:3000/dark-jedis/1489" } }
//! ```
//!
//! A null neighbor `id` means the chain ends in that direction.

use serde::Deserialize;

use crate::chain::{ChainNode, NeighborRef, WorldRef};
use crate::transport::FetchError;

#[derive(Deserialize)]
struct WireWorld {
    id: i64,
    name: String,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct WireLink {
    id: Option<i64>,
    url: Option<String>,
}

#[derive(Deserialize)]
struct WireNode {
    id: i64,
    name: String,
    homeworld: WireWorld,
    #[serde(default)]
    master: Option<WireLink>,
    #[serde(default)]
    apprentice: Option<WireLink>,
}

impl From<WireWorld> for WorldRef {
    fn from(w: WireWorld) -> Self {
        WorldRef { id: w.id, name: w.name }
    }
}

fn decode_link(link: Option<WireLink>, field: &str) -> Result<NeighborRef, FetchError> {
    let Some(WireLink { id: Some(id), url }) = link else {
        return Ok(NeighborRef::Absent);
    };
    match url {
        Some(locator) if !locator.is_empty() => Ok(NeighborRef::Unresolved { locator, id }),
        _ => Err(FetchError::Decode(format!("{field} id {id} has no url"))),
    }
}

/// Decode one record.
pub fn decode(body: &str) -> Result<ChainNode, FetchError> {
    let wire: WireNode =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;
    Ok(ChainNode {
        id: wire.id,
        name: wire.name,
        homeworld: wire.homeworld.into(),
        master: decode_link(wire.master, "master")?,
        apprentice: decode_link(wire.apprentice, "apprentice")?,
    })
}

/// Decode a location frame (`{ "id", "name" }`). `null` means unknown.
pub fn decode_location(body: &str) -> Result<Option<WorldRef>, FetchError> {
    let wire: Option<WireWorld> =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;
    Ok(wire.map(WorldRef::from))
}
