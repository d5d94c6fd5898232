use thiserror::Error;

pub type Result<T> = std::result::Result<T, AssistError>;

/// Install the global tracing subscriber, filtered by `RUST_LOG`. Hosts call
/// this once during activation; repeated calls are ignored.
#[inline]
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

#[derive(Error, Debug)]
pub enum AssistError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Index not ready: {0}")]
    IndexNotReady(String),

    #[error("Corrupt persisted state: {0}")]
    CorruptState(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub mod chunking;
pub mod completion;
pub mod config;
pub mod dedup;
pub mod editor;
pub mod embeddings;
pub mod index;
pub mod indexer;
pub mod player;
pub mod retriever;
pub mod suggestion;
