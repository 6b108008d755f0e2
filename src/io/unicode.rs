//! Unicode utilities for rendering text.
//!
//! Provides grapheme-aware truncation for previews and helpers for
//! printing only the new part of a growing snapshot.

use unicode_segmentation::UnicodeSegmentation;

/// Finds a valid UTF-8 character boundary at or before the given position.
///
/// # Examples
///
/// ```
/// use marketpulse::io::find_char_boundary;
///
/// let s = "Hello 世界";
/// assert_eq!(find_char_boundary(s, 6), 6); // Before '世'
/// assert_eq!(find_char_boundary(s, 7), 6); // Middle of '世', backs up
/// ```
#[must_use]
pub const fn find_char_boundary(s: &str, pos: usize) -> usize {
    if pos >= s.len() {
        return s.len();
    }
    let bytes = s.as_bytes();
    let mut boundary = pos;
    // UTF-8 continuation bytes start with 10xxxxxx (0x80-0xBF)
    while boundary > 0 && (bytes[boundary] & 0xC0) == 0x80 {
        boundary -= 1;
    }
    boundary
}

/// Returns the part of `snapshot` past the first `shown` bytes.
///
/// Snapshots only ever grow, so a consumer that has already rendered
/// `shown` bytes only needs this suffix. If `shown` lands inside a character
/// it backs up to the previous boundary.
#[must_use]
pub fn unseen_suffix(snapshot: &str, shown: usize) -> &str {
    &snapshot[find_char_boundary(snapshot, shown)..]
}

/// Counts the number of grapheme clusters in a string.
///
/// # Examples
///
/// ```
/// use marketpulse::io::unicode::grapheme_count;
///
/// assert_eq!(grapheme_count("Hello"), 5);
/// assert_eq!(grapheme_count("世界"), 2);
/// ```
#[must_use]
pub fn grapheme_count(s: &str) -> usize {
    s.graphemes(true).count()
}

/// Truncates a string at a grapheme cluster boundary.
///
/// # Arguments
///
/// * `s` - The string to truncate.
/// * `max_graphemes` - Maximum number of grapheme clusters.
#[must_use]
pub fn truncate_graphemes(s: &str, max_graphemes: usize) -> &str {
    let mut end_byte = 0;

    for (count, grapheme) in s.graphemes(true).enumerate() {
        if count >= max_graphemes {
            break;
        }
        end_byte += grapheme.len();
    }

    &s[..end_byte]
}

/// Single-line preview: newlines flattened, cut to `max_graphemes` with `…`.
#[must_use]
pub fn preview(s: &str, max_graphemes: usize) -> String {
    let flat = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if grapheme_count(&flat) <= max_graphemes {
        return flat;
    }
    let keep = max_graphemes.saturating_sub(1);
    format!("{}…", truncate_graphemes(&flat, keep))
}
