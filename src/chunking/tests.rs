use super::*;

fn lines(texts: &[&str]) -> Vec<String> {
    texts.iter().map(|s| (*s).to_string()).collect()
}

#[test]
fn windows_reassemble_to_input() {
    let input = lines(&["a", "b", "c", "d", "e", "f", "g"]);

    for chunk_size in 1..=8 {
        let windows = window_lines(&input, chunk_size);
        let reassembled: Vec<String> = windows.into_iter().flatten().collect();
        assert_eq!(reassembled, input, "chunk_size {}", chunk_size);
    }
}

#[test]
fn last_window_may_be_shorter() {
    let input = lines(&["a", "b", "c", "d", "e"]);
    let windows = window_lines(&input, 2);

    assert_eq!(windows.len(), 3);
    assert_eq!(windows[0].len(), 2);
    assert_eq!(windows[1].len(), 2);
    assert_eq!(windows[2].len(), 1);
}

#[test]
fn empty_input_yields_no_windows() {
    assert!(window_lines(&[], 250).is_empty());
}

#[test]
fn zero_chunk_size_yields_no_windows() {
    let input = lines(&["a"]);
    assert!(window_lines(&input, 0).is_empty());
}

#[test]
fn splits_at_statement_terminators() {
    let code = "let a = 1;\nlet b = 2;";
    let chunks = split_logical_chunks(code);

    assert_eq!(chunks, vec!["let a = 1;", "let b = 2;"]);
}

#[test]
fn splits_at_block_open_and_close() {
    let code = "fn main() {\n    run()\n}";
    let chunks = split_logical_chunks(code);

    assert_eq!(chunks, vec!["fn main() {", "    run()\n}"]);
}

#[test]
fn comment_line_terminates_a_chunk() {
    let code = "// setup\nlet x = 1;";
    let chunks = split_logical_chunks(code);

    assert_eq!(chunks, vec!["// setup", "let x = 1;"]);
}

#[test]
fn trailing_lines_form_final_chunk() {
    let code = "let a = 1;\nsome_call(\n    arg";
    let chunks = split_logical_chunks(code);

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[1], "some_call(\n    arg");
}

#[test]
fn closing_brace_with_trailing_code_is_not_a_boundary() {
    let code = "} else {\n    x();\n}";
    let chunks = split_logical_chunks(code);

    // "} else {" ends with `{` so it still terminates its chunk
    assert_eq!(chunks, vec!["} else {", "    x();", "}"]);
}

#[test]
fn empty_code_yields_no_chunks() {
    assert!(split_logical_chunks("").is_empty());
    assert!(split_logical_chunks("   \n  ").is_empty());
}
