use std::cmp::Reverse;
use std::collections::HashSet;

use rand::seq::SliceRandom;
use wbt_types::SortMode;

/// A suggestion is usable only if it is one token
pub fn is_single_token(word: &str) -> bool {
    !word.is_empty() && !word.chars().any(char::is_whitespace)
}

/// Counted by the frequency proxy. Recognized text is lowercase, so this
/// rarely separates anything; it is kept because that is what the mode does.
fn is_unusual(c: char) -> bool {
    c.is_uppercase()
}

/// Orders suggestions for `mode`. Every mode except `Random` is stable and
/// deterministic: ties keep provider order.
pub fn sort_suggestions(words: &[String], mode: SortMode) -> Vec<String> {
    let mut sorted = words.to_vec();
    match mode {
        SortMode::Shortest => sorted.sort_by_key(|w| w.chars().count()),
        SortMode::Longest => sorted.sort_by_key(|w| Reverse(w.chars().count())),
        SortMode::Frequency => {
            sorted.sort_by_key(|w| Reverse(w.chars().filter(|c| is_unusual(*c)).count()))
        }
        SortMode::Random => sorted.shuffle(&mut rand::thread_rng()),
    }
    sorted
}

/// Circular scan for the first single-token word not yet typed
///
/// Starts at `start % len`. On a hit returns the word and `index + 1`
/// (not reduced) as the start for the next scan.
pub fn next_untyped<'a>(
    words: &'a [String],
    start: usize,
    typed: &HashSet<String>,
) -> Option<(&'a str, usize)> {
    let len = words.len();
    if len == 0 {
        return None;
    }

    (0..len)
        .map(|offset| (start + offset) % len)
        .find_map(|idx| {
            let word = words[idx].as_str();
            if word.chars().any(char::is_whitespace) || typed.contains(word) {
                None
            } else {
                Some((word, idx + 1))
            }
        })
}
