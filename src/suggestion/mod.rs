// Suggestion session module
// Debounced request/response/retry state machine between edit events and the
// chunk player

#[cfg(test)]
mod tests;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::chunking::split_logical_chunks;
use crate::completion::{ChatMessage, CompletionClient, CompletionReply};
use crate::config::{CompletionConfig, RetrievalConfig};
use crate::dedup::remove_duplicate_code;
use crate::editor::HostEditor;
use crate::player::ChunkPlayer;
use crate::retriever::SimilarityRetriever;

/// Fixed instruction sent with every request.
pub const SYSTEM_INSTRUCTION: &str = "You are an inline code assistant. Match the style of the \
    surrounding code and never repeat code that already exists in the document. Respond with \
    JSON only: an object with a single \"code\" key whose value is the suggested code.";

const USER_ERROR_MESSAGE: &str =
    "Could not get a usable suggestion from the completion backend.";

/// Per-editor-view suggestion state machine. Owns its debounce timer, chat
/// assembly, retry loop, and delivery into the chunk player; constructed on
/// activation and disposed on teardown rather than living in shared globals.
pub struct SuggestionSession {
    client: CompletionClient,
    completion: CompletionConfig,
    retrieval: RetrievalConfig,
    editor: Arc<dyn HostEditor>,
    player: Arc<Mutex<ChunkPlayer>>,
    retriever: Option<Arc<SimilarityRetriever>>,
    /// Bumped on every trigger; responses carrying a stale generation are
    /// dropped after the HTTP call settles.
    generation: AtomicU64,
    pending: Mutex<Option<JoinHandle<()>>>,
    custom_instruction_sent: AtomicBool,
}

impl SuggestionSession {
    #[inline]
    pub fn new(
        completion: CompletionConfig,
        retrieval: RetrievalConfig,
        editor: Arc<dyn HostEditor>,
        retriever: Option<Arc<SimilarityRetriever>>,
    ) -> Self {
        Self {
            client: CompletionClient::new(&completion),
            completion,
            retrieval,
            editor,
            player: Arc::new(Mutex::new(ChunkPlayer::new())),
            retriever,
            generation: AtomicU64::new(0),
            pending: Mutex::new(None),
            custom_instruction_sent: AtomicBool::new(false),
        }
    }

    /// Shared handle to the chunk player, for the host's inline-suggestion
    /// provider and acceptance detection.
    #[inline]
    pub fn player(&self) -> Arc<Mutex<ChunkPlayer>> {
        Arc::clone(&self.player)
    }

    /// Record an edit event. Resets the debounce timer so only the last
    /// trigger within the quiet period proceeds to a request.
    #[inline]
    pub fn trigger(self: &Arc<Self>) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let delay = Duration::from_millis(self.completion.debounce_ms);

        let session = Arc::clone(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if session.generation.load(Ordering::SeqCst) != generation {
                return;
            }
            session.run_request(generation).await;
        });

        self.reschedule(handle);
    }

    fn reschedule(&self, handle: JoinHandle<()>) {
        let mut pending = match self.pending.lock() {
            Ok(pending) => pending,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(previous) = pending.replace(handle) {
            previous.abort();
        }
    }

    /// Drop any delivered suggestion and cancel a pending debounce. Called
    /// on escape, editor-focus change, or teardown. An in-flight HTTP
    /// request is not cancelled; its response is dropped as stale.
    #[inline]
    pub fn clear_suggestion(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let mut pending = match self.pending.lock() {
            Ok(pending) => pending,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(handle) = pending.take() {
            handle.abort();
        }
        self.lock_player().clear();
    }

    async fn run_request(self: Arc<Self>, generation: u64) {
        // Assembly may call the retriever, which does blocking HTTP
        let assembling = Arc::clone(&self);
        let messages =
            match tokio::task::spawn_blocking(move || assembling.assemble_messages()).await {
                Ok(messages) => messages,
                Err(e) => {
                    warn!("Message assembly task failed: {}", e);
                    return;
                }
            };

        let mut retries_left = self.completion.retry_attempts;

        while retries_left > 0 {
            let client = self.client.clone();
            let request_messages = messages.clone();
            let reply = tokio::task::spawn_blocking(move || client.complete(&request_messages))
                .await
                .unwrap_or_else(|e| {
                    CompletionReply::BackendError(format!("Error: completion task failed: {}", e))
                });

            if self.generation.load(Ordering::SeqCst) != generation {
                debug!("Dropping stale completion response");
                return;
            }

            match reply {
                CompletionReply::BackendError(message) => {
                    // Terminal: do not spend remaining retries
                    warn!("Completion backend error: {}", message);
                    self.fail();
                    return;
                }
                CompletionReply::Content(content) => match extract_code(&content) {
                    Some(code) => {
                        self.deliver(&code);
                        return;
                    }
                    None => {
                        retries_left -= 1;
                        warn!(
                            "Completion reply failed validation, {} retries left",
                            retries_left
                        );
                    }
                },
            }
        }

        self.fail();
    }

    fn deliver(&self, code: &str) {
        let document = self.editor.document_text();
        let cleaned = remove_duplicate_code(code, &document);
        let chunks = split_logical_chunks(&cleaned);

        if chunks.is_empty() {
            info!("Suggestion fully duplicated by the document, nothing to show");
            self.lock_player().clear();
            return;
        }

        debug!("Delivering suggestion with {} chunk(s)", chunks.len());
        self.lock_player().set_suggestion(chunks);
        self.editor.nudge();
    }

    fn fail(&self) {
        self.lock_player().clear();
        self.editor.show_error(USER_ERROR_MESSAGE);
    }

    fn assemble_messages(&self) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage::system(SYSTEM_INSTRUCTION)];

        if let Some(instruction) = &self.completion.custom_instruction {
            if !self.custom_instruction_sent.swap(true, Ordering::SeqCst) {
                messages.push(ChatMessage::system(instruction.clone()));
            }
        }

        let context = match self.editor.focused_line() {
            Some(focused) => {
                let prompt = format!(
                    "Suggest code to complete or extend this line:\n{}",
                    focused.text
                );
                messages.push(ChatMessage::user(prompt));
                focused.text
            }
            None => {
                let document = self.editor.document_text();
                let prompt = format!(
                    "Analyze this document and suggest the next code to add:\n{}",
                    document
                );
                messages.push(ChatMessage::user(prompt));
                document
            }
        };

        if let Some(retriever) = &self.retriever {
            if self.retrieval.enabled {
                let similar =
                    retriever.get_similar_queries(&context, self.retrieval.min_score);
                messages.push(ChatMessage::user(similar));
            }
        }

        messages
    }

    fn lock_player(&self) -> std::sync::MutexGuard<'_, ChunkPlayer> {
        match self.player.lock() {
            Ok(player) => player,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Validate a completion reply: the content must parse as JSON carrying a
/// string `code` key.
pub(crate) fn extract_code(content: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(content).ok()?;
    value
        .get("code")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
}
