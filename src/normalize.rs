//! Comparison-text processing and content keys.
//! Used for both titles and candidate names so the two sides agree.
//!
//! CRITICAL: pool keys are derived from `process`. Changing it changes which
//! entries are treated as duplicates.

use any_ascii::any_ascii;
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::fmt;
use unicode_normalization::UnicodeNormalization;

// ============================================================================
// REGEX PATTERNS
// ============================================================================

/// Runs of anything that is not a letter or a digit. Underscores, dots and
/// dashes in file names count as separators.
pub static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\p{L}\p{N}]+").unwrap());

// ============================================================================
// CHARACTER FOLDING
// ============================================================================

/// Check if a character is a Unicode combining mark (diacritical mark).
pub fn is_combining_mark(c: char) -> bool {
    matches!(c as u32, 0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0xFE20..=0xFE2F)
}

/// Fold Unicode text to ASCII by applying NFKD decomposition and removing combining marks.
/// e.g., "Beyoncé" → "beyonce", "naïve" → "naive"
pub fn fold_to_ascii(s: &str) -> String {
    let stripped: String = s.nfkd().filter(|c| !is_combining_mark(*c)).collect();
    // Then transliterate any remaining non-ASCII (Cyrillic, Hebrew, CJK, etc.)
    any_ascii(&stripped).to_lowercase()
}

// ============================================================================
// PROCESSING
// ============================================================================

/// Prepare text for comparison: lowercase (optionally ASCII-folded), every
/// non-alphanumeric run collapsed to one space, trimmed.
///
/// "Alpha_Ep01" → "alpha ep01", "Beta - Part Two!" → "beta part two"
pub fn process(text: &str, fold_ascii: bool) -> String {
    let lowered = if fold_ascii {
        fold_to_ascii(text)
    } else {
        text.to_lowercase()
    };
    NON_ALNUM.replace_all(&lowered, " ").trim().to_string()
}

// ============================================================================
// CONTENT KEYS
// ============================================================================

/// SHA-256 digest of processed comparison text. Pools and round buffers are
/// keyed by this instead of the raw text.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentKey([u8; 32]);

impl ContentKey {
    pub fn of(processed: &str) -> Self {
        let digest = Sha256::digest(processed.as_bytes());
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        ContentKey(bytes)
    }

    pub fn short(&self) -> String {
        hex::encode(&self.0[..6])
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentKey({})", self.short())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_basic() {
        assert_eq!(process("Alpha_Ep01", false), "alpha ep01");
        assert_eq!(process("  Beta - Part Two! ", false), "beta part two");
        assert_eq!(process("Gamma Folder", false), "gamma folder");
        assert_eq!(process("___", false), "");
    }

    #[test]
    fn test_process_fold_ascii() {
        assert_eq!(process("Björk – Jóga", true), "bjork joga");
        assert_eq!(process("Björk", false), "björk");
    }

    #[test]
    fn test_fold_to_ascii() {
        assert_eq!(fold_to_ascii("Motörhead"), "motorhead");
        assert_eq!(fold_to_ascii("Beyoncé"), "beyonce");
    }

    #[test]
    fn test_content_key_deterministic() {
        let a = ContentKey::of("alpha episode 1");
        let b = ContentKey::of("alpha episode 1");
        let c = ContentKey::of("alpha episode 2");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.to_string().len(), 64);
        assert_eq!(a.short().len(), 12);
    }
}
