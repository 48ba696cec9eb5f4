#![no_main]

use libfuzzer_sys::fuzz_target;
use holocron::chain::NeighborRef;
use holocron::wire::{decode, decode_location};

fuzz_target!(|data: &[u8]| {
    let Ok(body) = std::str::from_utf8(data) else {
        return;
    };

    // Must not panic; errors are fine.
    if let Ok(node) = decode(body) {
        // An unresolved neighbor always carries a usable locator.
        for link in [&node.master, &node.apprentice] {
            if let NeighborRef::Unresolved { locator, .. } = link {
                assert!(!locator.is_empty(), "empty locator decoded from {body:?}");
            }
        }
    }
    let _ = decode_location(body);
});
