//! Courrier reference codes
//!
//! Format: `<PREFIX>-<YYYY><MM>-<5 base36 chars>`, e.g. `ESTSB-202403-K7Q2Z`.
//! Codes are short and human-readable; they are not guaranteed unique.

use chrono::{DateTime, Datelike, Utc};
use rand::Rng;

/// Prefix used when none is configured
pub const DEFAULT_PREFIX: &str = "ESTSB";

const SUFFIX_LEN: usize = 5;
const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generate a reference with the given random source
pub fn generate_reference<R: Rng + ?Sized>(
    prefix: &str,
    now: DateTime<Utc>,
    rng: &mut R,
) -> String {
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("{}-{}{:02}-{}", prefix, now.year(), now.month(), suffix)
}

/// Generate a reference using the thread-local RNG
pub fn new_reference(prefix: &str, now: DateTime<Utc>) -> String {
    generate_reference(prefix, now, &mut rand::thread_rng())
}
