//! Natural-order string comparison.
//!
//! Runs of decimal digits compare by numeric magnitude while everything else
//! compares by code point, so `"Chapter 2"` sorts before `"Chapter 10"`.
//! Digit runs are never parsed into fixed-width integers: they are compared as
//! strings after stripping leading zeros, which keeps arbitrarily long runs
//! exact.
//!
//! Only ASCII `0`-`9` count as digits. Other Unicode decimal digits (for
//! example fullwidth `１`) are ordinary text and compare by code point.

use std::cmp::Ordering;

use rayon::prelude::*;

/// A maximal run of digits or of non-digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Chunk<'a> {
    text: &'a str,
    is_numeric: bool,
}

/// Splits `s` into alternating digit / non-digit chunks. Empty input yields no chunks.
fn chunks(s: &str) -> Vec<Chunk<'_>> {
    let mut out = Vec::new();
    let mut rest = s;

    while let Some(first) = rest.chars().next() {
        let is_numeric = first.is_ascii_digit();
        let end = rest
            .char_indices()
            .find(|&(_, c)| c.is_ascii_digit() != is_numeric)
            .map_or(rest.len(), |(i, _)| i);
        out.push(Chunk {
            text: &rest[..end],
            is_numeric,
        });
        rest = &rest[end..];
    }

    out
}

/// `"007"` -> `"7"`, `"000"` -> `"0"`.
fn strip_leading_zeros(digits: &str) -> &str {
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() && !digits.is_empty() {
        &digits[digits.len() - 1..]
    } else {
        trimmed
    }
}

fn compare_numeric(a: &str, b: &str) -> Ordering {
    let (sa, sb) = (strip_leading_zeros(a), strip_leading_zeros(b));

    sa.len()
        .cmp(&sb.len())
        .then_with(|| sa.cmp(sb))
        // equal value: fewer leading zeros first
        .then_with(|| a.len().cmp(&b.len()))
}

fn compare_chunks(a: Chunk<'_>, b: Chunk<'_>) -> Ordering {
    match (a.is_numeric, b.is_numeric) {
        (true, true) => compare_numeric(a.text, b.text),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        // str ordering is byte-wise, which for UTF-8 is code point order
        (false, false) => a.text.cmp(b.text),
    }
}

/// Compares two strings in natural order.
///
/// ```
/// use std::cmp::Ordering;
/// use tojiru::natural::compare;
///
/// assert_eq!(compare("item9", "item10"), Ordering::Less);
/// assert_eq!(compare("01", "1"), Ordering::Greater);
/// ```
pub fn compare(a: &str, b: &str) -> Ordering {
    let (ca, cb) = (chunks(a), chunks(b));

    ca.iter()
        .zip(cb.iter())
        .map(|(x, y)| compare_chunks(*x, *y))
        .find(|ord| ord.is_ne())
        .unwrap_or_else(|| ca.len().cmp(&cb.len()))
}

/// Sorts strings in natural order. The sort is stable.
pub fn sort<S: AsRef<str> + Send>(items: &mut [S]) {
    items.par_sort_by(|a, b| compare(a.as_ref(), b.as_ref()));
}

/// Sorts items in natural order of the string returned by `key`. The sort is stable.
pub fn sort_by_key<T, F>(items: &mut [T], key: F)
where
    T: Send,
    F: Fn(&T) -> &str + Sync,
{
    items.par_sort_by(|a, b| compare(key(a), key(b)));
}
