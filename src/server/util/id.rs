//! object identifiers for stored documents

use crate::server::util::time::helper::get_utc_now;
use rand::RngCore;
use std::sync::atomic::{AtomicU32, Ordering};

static COUNTER: AtomicU32 = AtomicU32::new(0);

/// New 12 byte identifier rendered as 24 lowercase hex digits.
///
/// Layout: 4 bytes of seconds since epoch (big endian), 5 random bytes,
/// 3 bytes of a process wide counter.
pub(crate) fn new_object_id() -> String {
    let mut bytes = [0_u8; 12];
    let secs = get_utc_now().timestamp() as u32;
    bytes[..4].copy_from_slice(&secs.to_be_bytes());
    rand::thread_rng().fill_bytes(&mut bytes[4..9]);
    let count = COUNTER.fetch_add(1, Ordering::Relaxed) & 0x00ff_ffff;
    bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
