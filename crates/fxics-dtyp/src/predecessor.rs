//! `PredecessorChangeList`: a length-prefixed concatenation of change keys.
//! The sync producer always emits a single-element list holding the
//! current change key (§4.5).

use crate::fmid::{ChangeKey, SOURCE_KEY_LEN};

/// Encodes the predecessor change list wire form: `cb || change_key`, where
/// `cb` is a single byte holding the length of the change key that follows
/// (the source always writes one 22-byte element).
pub fn single_element_predecessor_change_list(change_key: &ChangeKey) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + SOURCE_KEY_LEN);
    out.push(SOURCE_KEY_LEN as u8);
    out.extend_from_slice(&change_key.0);
    out
}
