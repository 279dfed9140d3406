//! Diacritics folding for search keys.
//!
//! Every `*_d` column and every incoming search text goes through
//! [`remove_diacritics`], so lookups compare like with like.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Strip combining marks from `s`.
///
/// The text is canonically decomposed, combining marks are dropped and the
/// remainder is recomposed. Case is preserved, and characters without a
/// canonical decomposition (`ß`, ligatures, CJK) pass through unchanged.
#[must_use]
pub fn remove_diacritics(s: &str) -> String {
    s.nfd().filter(|c| !is_combining_mark(*c)).nfc().collect()
}
