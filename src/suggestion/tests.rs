use super::*;
use crate::completion::ChatRole;
use crate::editor::FocusedLine;
use std::sync::atomic::AtomicUsize;

#[derive(Default)]
struct MockEditor {
    document: String,
    focused: Option<FocusedLine>,
    nudges: AtomicUsize,
    errors: Mutex<Vec<String>>,
}

impl MockEditor {
    fn with_document(document: &str) -> Self {
        Self {
            document: document.to_string(),
            ..Self::default()
        }
    }

    fn error_count(&self) -> usize {
        self.errors.lock().expect("errors lock").len()
    }
}

impl HostEditor for MockEditor {
    fn document_text(&self) -> String {
        self.document.clone()
    }

    fn focused_line(&self) -> Option<FocusedLine> {
        self.focused.clone()
    }

    fn nudge(&self) {
        self.nudges.fetch_add(1, Ordering::SeqCst);
    }

    fn show_error(&self, message: &str) {
        self.errors
            .lock()
            .expect("errors lock")
            .push(message.to_string());
    }
}

fn unreachable_session(editor: Arc<MockEditor>, debounce_ms: u64) -> Arc<SuggestionSession> {
    // Port 1 on loopback refuses connections immediately
    let completion = CompletionConfig {
        url: "http://127.0.0.1:1/v1/chat/completions".to_string(),
        debounce_ms,
        ..CompletionConfig::default()
    };
    Arc::new(SuggestionSession::new(
        completion,
        RetrievalConfig::default(),
        editor,
        None,
    ))
}

#[test]
fn extracts_code_key_from_json_content() {
    assert_eq!(
        extract_code(r#"{"code": "let x = 1;"}"#),
        Some("let x = 1;".to_string())
    );
}

#[test]
fn rejects_content_without_code_key() {
    assert_eq!(extract_code(r#"{"text": "let x = 1;"}"#), None);
    assert_eq!(extract_code("not json"), None);
    assert_eq!(extract_code(r#"{"code": 42}"#), None);
}

#[test]
fn message_assembly_uses_focused_line_when_present() {
    let editor = Arc::new(MockEditor {
        document: "whole document".to_string(),
        focused: Some(FocusedLine {
            line_number: 3,
            text: "let partial =".to_string(),
            caret_col: 13,
        }),
        ..MockEditor::default()
    });
    let session = unreachable_session(editor, 3000);

    let messages = session.assemble_messages();

    assert_eq!(messages[0].role, ChatRole::System);
    assert_eq!(messages[0].content, SYSTEM_INSTRUCTION);
    assert_eq!(messages[1].role, ChatRole::User);
    assert!(messages[1].content.contains("let partial ="));
    assert!(!messages[1].content.contains("whole document"));
}

#[test]
fn message_assembly_falls_back_to_whole_document() {
    let editor = Arc::new(MockEditor::with_document("whole document"));
    let session = unreachable_session(editor, 3000);

    let messages = session.assemble_messages();

    assert!(messages[1].content.contains("whole document"));
}

#[test]
fn custom_instruction_is_added_at_most_once_per_session() {
    let editor = Arc::new(MockEditor::with_document("doc"));
    let completion = CompletionConfig {
        url: "http://127.0.0.1:1/v1/chat/completions".to_string(),
        custom_instruction: Some("prefer tabs".to_string()),
        ..CompletionConfig::default()
    };
    let session = Arc::new(SuggestionSession::new(
        completion,
        RetrievalConfig::default(),
        editor,
        None,
    ));

    let first = session.assemble_messages();
    let second = session.assemble_messages();

    let count = |messages: &[ChatMessage]| {
        messages
            .iter()
            .filter(|m| m.content == "prefer tabs")
            .count()
    };
    assert_eq!(count(&first), 1);
    assert_eq!(count(&second), 0);
}

#[test]
fn deliver_deduplicates_and_chunks() {
    let editor = Arc::new(MockEditor::with_document("existing_value += 1"));
    let session = unreachable_session(Arc::clone(&editor), 3000);

    session.deliver("existing_value += 1\nlet fresh = 9;");

    let player = session.player();
    let player = player.lock().expect("player lock");
    assert_eq!(player.current_chunk(), Some("let fresh = 9;"));
    assert_eq!(editor.nudges.load(Ordering::SeqCst), 1);
}

#[test]
fn fully_duplicated_suggestion_clears_instead_of_delivering() {
    let editor = Arc::new(MockEditor::with_document("let existing = 0;"));
    let session = unreachable_session(Arc::clone(&editor), 3000);

    session.deliver("let   existing =  0;");

    let player = session.player();
    assert_eq!(player.lock().expect("player lock").current_chunk(), None);
    assert_eq!(editor.nudges.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn backend_error_fails_once_without_retry_storm() {
    let editor = Arc::new(MockEditor::with_document("doc"));
    let session = unreachable_session(Arc::clone(&editor), 50);

    session.trigger();
    tokio::time::sleep(Duration::from_millis(600)).await;

    // A terminal backend error surfaces exactly one user-visible message
    assert_eq!(editor.error_count(), 1);
    let player = session.player();
    assert_eq!(player.lock().expect("player lock").current_chunk(), None);
}

#[tokio::test(flavor = "multi_thread")]
async fn rapid_triggers_collapse_to_one_request() {
    let editor = Arc::new(MockEditor::with_document("doc"));
    let session = unreachable_session(Arc::clone(&editor), 100);

    session.trigger();
    session.trigger();
    session.trigger();
    tokio::time::sleep(Duration::from_millis(800)).await;

    assert_eq!(editor.error_count(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn clear_suggestion_cancels_pending_debounce() {
    let editor = Arc::new(MockEditor::with_document("doc"));
    let session = unreachable_session(Arc::clone(&editor), 100);

    session.trigger();
    session.clear_suggestion();
    tokio::time::sleep(Duration::from_millis(400)).await;

    assert_eq!(editor.error_count(), 0);
}
