//! Unlock key resolution
//!
//! Picks the key used for an unlock request. Runs on a freshly fetched key
//! list every time; validity is decided by the vendor and changes over time.

use crate::client::models::{DigitalKey, LockRef};

/// First key that is valid, not ended, and grants `target`
pub fn select_key(keys: &[DigitalKey], target: LockRef) -> Option<&DigitalKey> {
    keys.iter().find(|key| key.is_usable() && key.grants(target))
}

/// Like [`select_key`], but tries `preferred` first. A pinned key is used
/// only when it still passes the same validity and grant rules.
pub fn select_key_preferring<'a>(
    keys: &'a [DigitalKey],
    target: LockRef,
    preferred: Option<&str>,
) -> Option<&'a DigitalKey> {
    preferred
        .and_then(|wanted| {
            keys.iter().find(|key| {
                key.digital_key == wanted && key.is_usable() && key.grants(target)
            })
        })
        .or_else(|| select_key(keys, target))
}
