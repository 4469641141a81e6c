//! TSID Generator
//!
//! Time-sorted document identifiers encoded as 13-character Crockford
//! Base32 strings. Used as `_id` for users, features, and embedded
//! comments, so identifier validity can be checked before hitting the
//! store.

use std::sync::atomic::{AtomicU16, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;

/// Crockford Base32 alphabet (excludes I, L, O, U)
const ALPHABET: &[u8] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

static COUNTER: AtomicU16 = AtomicU16::new(0);

pub struct TsidGenerator;

impl TsidGenerator {
    /// Generate a new TSID, e.g. `0HZXEQ5Y8JY5Z`.
    ///
    /// Layout (64 bits): 42-bit millisecond timestamp, 10-bit random
    /// component, 12-bit per-millisecond counter.
    pub fn generate() -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before Unix epoch")
            .as_millis() as u64;

        let counter = COUNTER.fetch_add(1, Ordering::SeqCst) as u64;
        let random: u64 = rand::thread_rng().gen_range(0..1024);

        let tsid = ((now & 0x3FF_FFFF_FFFF) << 22) | (random << 12) | (counter & 0xFFF);

        encode(tsid)
    }

    /// Whether `id` is a well-formed TSID. Malformed identifiers are
    /// rejected at the API boundary before any store round trip.
    pub fn is_valid(id: &str) -> bool {
        decode(id).is_some()
    }
}

fn encode(mut value: u64) -> String {
    let mut out = [b'0'; 13];
    for slot in out.iter_mut().rev() {
        *slot = ALPHABET[(value & 0x1F) as usize];
        value >>= 5;
    }
    String::from_utf8(out.to_vec()).expect("alphabet is ASCII")
}

fn decode(s: &str) -> Option<u64> {
    if s.len() != 13 {
        return None;
    }

    let mut value: u64 = 0;
    for (i, c) in s.chars().enumerate() {
        let c = c.to_ascii_uppercase();
        let digit = match c {
            '0'..='9' => c as u64 - '0' as u64,
            'A'..='H' => c as u64 - 'A' as u64 + 10,
            'J'..='K' => c as u64 - 'J' as u64 + 18,
            'M'..='N' => c as u64 - 'M' as u64 + 20,
            'P'..='T' => c as u64 - 'P' as u64 + 22,
            'V'..='Z' => c as u64 - 'V' as u64 + 27,
            _ => return None,
        };
        // 13 chars carry 65 bits; the leading char holds only the top 4,
        // so any value >= 16 there cannot come from a 64-bit TSID.
        if i == 0 && digit >= 16 {
            return None;
        }
        value = (value << 5) | digit;
    }

    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_valid() {
        let id = TsidGenerator::generate();
        assert_eq!(id.len(), 13);
        assert!(TsidGenerator::is_valid(&id));
    }

    #[test]
    fn malformed_ids_are_rejected() {
        assert!(!TsidGenerator::is_valid(""));
        assert!(!TsidGenerator::is_valid("not-an-id"));
        assert!(!TsidGenerator::is_valid("0HZXEQ5Y8JY5")); // 12 chars
        assert!(!TsidGenerator::is_valid("0HZXEQ5Y8JYIL")); // I and L excluded
    }

    #[test]
    fn overlong_leading_char_is_rejected() {
        // Would need a 65th bit; no generated id starts past 'F'.
        assert!(!TsidGenerator::is_valid("ZZZZZZZZZZZZZ"));
        assert!(!TsidGenerator::is_valid("G000000000000"));
        assert!(TsidGenerator::is_valid("F000000000000"));
        assert!(TsidGenerator::is_valid("0000000000000"));
    }

    #[test]
    fn ids_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1000 {
            assert!(seen.insert(TsidGenerator::generate()), "duplicate TSID");
        }
    }

    #[test]
    fn ids_sort_by_creation_time() {
        let first = TsidGenerator::generate();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = TsidGenerator::generate();
        assert!(first < second);
    }
}
