use super::*;

#[test]
fn document_deduplicated_against_itself_is_empty() {
    let document = "fn main() {\n    println!(\"hi\");\n}\n";
    assert_eq!(remove_duplicate_code(document, document), "");
}

#[test]
fn disjoint_code_passes_through_modulo_normalization() {
    let code = "let total = price * quantity;";
    let document = "fn unrelated() {}";

    assert_eq!(remove_duplicate_code(code, document), code);
}

#[test]
fn whitespace_runs_are_collapsed() {
    let code = "let   a =    1;";
    let document = "nothing shared here";

    assert_eq!(remove_duplicate_code(code, document), "let a = 1;");
}

#[test]
fn fully_duplicated_lines_are_dropped() {
    let code = "let a = 1;\ncall_something(x)";
    let document = "let a = 1;";

    assert_eq!(remove_duplicate_code(code, document), "call_something(x)");
}

#[test]
fn shared_single_words_are_stripped_from_partial_lines() {
    let code = "let b = 2;";
    let document = "let a = 1;";

    // "let" is the longest shared word run and is removed once
    assert_eq!(remove_duplicate_code(code, document), "b = 2;");
}

#[test]
fn partial_duplicates_lose_the_matched_run() {
    let code = "let result = compute(input) + offset;";
    let document = "let result = compute(input)";

    // The longest shared word run is stripped, the remainder survives
    assert_eq!(remove_duplicate_code(code, document), "+ offset;");
}

#[test]
fn longest_match_wins_over_shorter_ones() {
    let code = "a b c d";
    let document = "x a y\na b c z";

    // "a b c" (length 3) beats "a" (length 1)
    assert_eq!(remove_duplicate_code(code, document), "d");
}

#[test]
fn empty_lines_are_removed_from_output() {
    let code = "let a = 1;\n\n   \nlet b = 2;";
    let document = "unrelated";

    assert_eq!(remove_duplicate_code(code, document), "let a = 1;\nlet b = 2;");
}

#[test]
fn empty_input_yields_empty_output() {
    assert_eq!(remove_duplicate_code("", "document"), "");
}

#[test]
fn whitespace_only_input_reduces_to_empty() {
    assert_eq!(remove_duplicate_code("   ", "document"), "");
    assert_eq!(remove_duplicate_code(" \n\t\n ", "document"), "");
}

#[test]
fn empty_document_keeps_all_code() {
    let code = "let a = 1;\nlet b = 2;";
    assert_eq!(remove_duplicate_code(code, ""), code);
}
