// Chunking module
// Line windowing for embedding payloads and logical splitting of AI-returned code

#[cfg(test)]
mod tests;

use tracing::debug;

/// Default number of lines per embedding window.
pub const DEFAULT_WINDOW_LINES: usize = 250;

/// Markers that open a comment line. Shared with the insertion-position
/// policy so both sides agree on what counts as a comment.
pub const COMMENT_MARKERS: &[&str] = &["//", "/*", "#", "--"];

/// Split lines into sequential non-overlapping windows of `chunk_size` lines.
/// The last window may be shorter. Concatenating the windows reproduces the
/// input exactly.
#[inline]
pub fn window_lines(lines: &[String], chunk_size: usize) -> Vec<Vec<String>> {
    if chunk_size == 0 {
        return Vec::new();
    }

    let windows: Vec<Vec<String>> = lines
        .chunks(chunk_size)
        .map(<[String]>::to_vec)
        .collect();

    debug!(
        "Windowed {} lines into {} chunks of up to {} lines",
        lines.len(),
        windows.len(),
        chunk_size
    );

    windows
}

/// Split AI-returned code into logical chunks at line boundaries that
/// plausibly end a statement or block: a line ending with `{`, a line that is
/// exactly `}`, a line ending with `;`, or a line starting with a comment
/// marker. The boundary line belongs to the chunk it terminates; trailing
/// lines without a terminator form a final chunk.
#[inline]
pub fn split_logical_chunks(code: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for line in code.lines() {
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);

        if is_logical_breakpoint(line) {
            chunks.push(std::mem::take(&mut current));
        }
    }

    if !current.trim().is_empty() {
        chunks.push(current);
    }

    debug!("Split code into {} logical chunks", chunks.len());
    chunks
}

fn is_logical_breakpoint(line: &str) -> bool {
    let trimmed = line.trim();

    trimmed.ends_with('{')
        || trimmed == "}"
        || trimmed.ends_with(';')
        || COMMENT_MARKERS.iter().any(|m| trimmed.starts_with(m))
}
