//! Text normalization and patient-identifier hashing (spec.md §4.1 C1).

use sha2::{Digest, Sha256};
use unicode_normalization::UnicodeNormalization;

use crate::config::Config;

/// Lowercases, strips whitespace, and strips combining diacritics so that
/// alias lookups and free-text scans are accent- and case-insensitive.
pub fn normalize(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }
    let without_spaces: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    without_spaces
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

fn is_combining_mark(c: char) -> bool {
    matches!(c as u32,
        0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0x20D0..=0x20FF | 0xFE20..=0xFE2F)
}

/// Salted SHA-256 of a patient identifier number (`nh`), flanked by the two
/// configured salts. Returns `None` unchanged for a missing `nh` — callers
/// fall back to [`fallback_hash`].
pub fn hash_nh(config: &Config, nh: Option<&str>) -> Option<String> {
    let nh = nh?;
    let input = format!("{}{}{}", config.hash_salt_pre, nh, config.hash_salt_post);
    let digest = Sha256::digest(input.as_bytes());
    Some(hex::encode(digest))
}

/// Deterministic 16-hex-character substitute for `hash_nh` when a row has no
/// patient identifier at all, combining a load timestamp, the row's ordinal
/// position in the file, and the resolved organism id so that two rows in the
/// same load never collide.
pub fn fallback_hash(load_timestamp: i64, row_counter: usize, organism_id: u64) -> String {
    let base = format!("{load_timestamp}_{row_counter}_{organism_id}");
    let digest = Sha256::digest(base.as_bytes());
    hex::encode(digest)[..16].to_string()
}

/// Minimal hex encoding so the crate does not need a dedicated `hex` crate
/// dependency just for digest formatting.
mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        use std::fmt::Write;
        let mut out = String::with_capacity(bytes.as_ref().len() * 2);
        for b in bytes.as_ref() {
            write!(out, "{b:02x}").unwrap();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_basic() {
        assert_eq!(normalize("Beta-Lactamasa"), "beta-lactamasa");
        assert_eq!(normalize("Meticilín Resistente"), "meticilinresistente");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn hash_nh_is_stable_and_salted() {
        let config = Config {
            hash_salt_pre: "pre".to_string(),
            hash_salt_post: "post".to_string(),
            fixtures_dir: "fixtures".into(),
        };
        let a = hash_nh(&config, Some("12345")).unwrap();
        let b = hash_nh(&config, Some("12345")).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(hash_nh(&config, None).is_none());
    }

    #[test]
    fn fallback_hash_is_sixteen_hex_chars_and_deterministic() {
        let a = fallback_hash(1_700_000_000, 3, 42);
        let b = fallback_hash(1_700_000_000, 3, 42);
        let c = fallback_hash(1_700_000_000, 4, 42);
        assert_eq!(a.len(), 16);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
