// Host editor surface
// The core calls into the host through this narrow interface and never
// implements it; rendering, caret management, and notifications all live on
// the host side

/// The line the caret currently sits on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusedLine {
    /// Zero-based line number in the document
    pub line_number: usize,
    /// Full text of the line
    pub text: String,
    /// Caret column within the line, in characters
    pub caret_col: usize,
}

/// Opaque provider interface over the host editor.
pub trait HostEditor: Send + Sync {
    /// Full text of the active document.
    fn document_text(&self) -> String;

    /// The caret's line, when a specific line has focus.
    fn focused_line(&self) -> Option<FocusedLine>;

    /// No-op edit (insert and delete one space) that forces the host to
    /// re-evaluate inline suggestions at the caret.
    fn nudge(&self);

    /// Surface a user-visible error message.
    fn show_error(&self, message: &str);
}
