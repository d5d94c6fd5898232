// Deduplication module
// Strips content from AI-proposed code that the open document already
// contains, at line granularity with word-level longest-common-substring
// removal

#[cfg(test)]
mod tests;

use itertools::Itertools;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Remove substrings of `ai_code` that are already present in
/// `document_text`. Lines fully covered by the document are dropped; lines
/// partially covered have their longest matching word run removed. The
/// matching is O(n*m) in line-substring counts, which is acceptable at
/// typical AI-response sizes (tens of lines).
#[inline]
pub fn remove_duplicate_code(ai_code: &str, document_text: &str) -> String {
    if ai_code.is_empty() {
        warn!("remove_duplicate_code called with empty input");
        return String::new();
    }

    let document_windows = document_word_windows(document_text);

    let mut kept = Vec::new();
    for line in ai_code.lines() {
        let normalized = normalize_line(line);
        if normalized.is_empty() {
            continue;
        }

        match longest_document_match(&normalized, &document_windows) {
            Some(matched) if matched == normalized => {
                debug!("Dropping fully duplicated line: {}", normalized);
            }
            Some(matched) => {
                let remainder = normalize_line(&normalized.replacen(&matched, "", 1));
                if !remainder.is_empty() {
                    kept.push(remainder);
                }
            }
            None => kept.push(normalized),
        }
    }

    kept.join("\n")
}

/// Trim and collapse internal whitespace runs to single spaces.
fn normalize_line(line: &str) -> String {
    line.split_whitespace().join(" ")
}

/// All contiguous word-subsequences of every normalized document line.
fn document_word_windows(document_text: &str) -> HashSet<String> {
    let mut windows = HashSet::new();

    for line in document_text.lines() {
        let words: Vec<&str> = line.split_whitespace().collect();
        for start in 0..words.len() {
            for end in start + 1..=words.len() {
                windows.insert(words[start..end].join(" "));
            }
        }
    }

    windows
}

/// The longest contiguous word-subsequence of `line` that the document also
/// contains.
fn longest_document_match(line: &str, document_windows: &HashSet<String>) -> Option<String> {
    let words: Vec<&str> = line.split_whitespace().collect();

    for len in (1..=words.len()).rev() {
        for start in 0..=words.len() - len {
            let candidate = words[start..start + len].join(" ");
            if document_windows.contains(&candidate) {
                return Some(candidate);
            }
        }
    }

    None
}
