//! Note identifiers: ULIDs in their canonical 26-character text form.
//!
//! Lexicographic order of the encoded form follows creation time, which is
//! what keeps filename listings chronologically sorted.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::RngCore;

/// Crockford base32: digits and uppercase letters excluding I, L, O, U.
const ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Canonical encoded length: 10 chars of timestamp + 16 chars of entropy.
pub const ID_LEN: usize = 26;

/// Generate a fresh identifier: 48-bit unix-millisecond timestamp followed
/// by 80 bits of randomness, encoded as 26 uppercase base32 characters.
pub fn new_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    let mut entropy = [0u8; 10];
    rand::rng().fill_bytes(&mut entropy);
    encode(millis, &entropy)
}

/// True iff `value`, after ASCII-uppercasing, is exactly 26 characters drawn
/// from the restricted base32 alphabet. Pure; comparison is case-insensitive.
pub fn is_valid_id(value: &str) -> bool {
    value.len() == ID_LEN
        && value
            .bytes()
            .all(|b| ALPHABET.contains(&b.to_ascii_uppercase()))
}

fn encode(millis: u64, entropy: &[u8; 10]) -> String {
    let mut low: u128 = 0;
    for byte in entropy {
        low = (low << 8) | *byte as u128;
    }
    let value = ((millis as u128 & 0xFFFF_FFFF_FFFF) << 80) | low;
    let mut out = String::with_capacity(ID_LEN);
    for i in (0..ID_LEN).rev() {
        let index = ((value >> (i * 5)) & 0x1F) as usize;
        out.push(ALPHABET[index] as char);
    }
    out
}
