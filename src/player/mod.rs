// Chunk player module
// Holds the ordered chunks of the current suggestion and serves them one at
// a time as the user accepts them


use tracing::debug;

use crate::chunking::COMMENT_MARKERS;

/// Where to place the current chunk relative to the caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    /// On a new line after the caret's line (the line is a comment)
    NewLineAfter,
    /// At the caret (the caret sits inside an unmatched bracket pair)
    AtCaret,
    /// At the end of the caret's line
    LineEnd,
}

/// Cursor over the logical chunks of one suggestion. `current == chunks.len()`
/// means exhausted.
#[derive(Debug, Default)]
pub struct ChunkPlayer {
    chunks: Vec<String>,
    current: usize,
}

impl ChunkPlayer {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a new suggestion, resetting the cursor to the first chunk.
    #[inline]
    pub fn set_suggestion(&mut self, chunks: Vec<String>) {
        debug!("New suggestion with {} chunk(s)", chunks.len());
        self.chunks = chunks;
        self.current = 0;
    }

    /// The chunk on deck, or `None` once exhausted or cleared.
    #[inline]
    pub fn current_chunk(&self) -> Option<&str> {
        self.chunks.get(self.current).map(String::as_str)
    }

    /// Move to the next chunk. Saturates at the end; extra calls are no-ops.
    #[inline]
    pub fn advance(&mut self) {
        if self.current < self.chunks.len() {
            self.current += 1;
        }
    }

    /// Whether the just-inserted text accepts the current chunk. Heuristic
    /// containment check rather than exact equality: host auto-indentation
    /// may wrap the chunk in extra whitespace, so both false positives (the
    /// user typed a superstring by hand) and false negatives (the host
    /// reformatted beyond whitespace) are possible.
    #[inline]
    pub fn was_accepted(&self, inserted_text: &str) -> bool {
        self.current_chunk()
            .is_some_and(|chunk| inserted_text.trim().contains(chunk.trim()))
    }

    /// Drop the suggestion entirely.
    #[inline]
    pub fn clear(&mut self) {
        self.chunks.clear();
        self.current = 0;
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.current >= self.chunks.len()
    }
}

/// Decide where a chunk should be inserted so generated code does not split
/// existing syntactic constructs: after a comment line, at the caret inside
/// an unmatched bracket pair, otherwise at line end.
#[inline]
pub fn insertion_point(line: &str, caret_col: usize) -> InsertPosition {
    let trimmed = line.trim_start();
    if COMMENT_MARKERS.iter().any(|m| trimmed.starts_with(m)) {
        return InsertPosition::NewLineAfter;
    }

    if caret_inside_unmatched_pair(line, caret_col) {
        return InsertPosition::AtCaret;
    }

    InsertPosition::LineEnd
}

fn caret_inside_unmatched_pair(line: &str, caret_col: usize) -> bool {
    let mut depth: i32 = 0;
    let mut closer_after_caret = false;

    for (col, ch) in line.chars().enumerate() {
        if col < caret_col {
            match ch {
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => depth -= 1,
                _ => {}
            }
        } else if matches!(ch, ')' | ']' | '}') {
            closer_after_caret = true;
            break;
        }
    }

    depth > 0 && closer_after_caret
}
