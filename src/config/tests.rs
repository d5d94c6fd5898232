use super::*;
use tempfile::TempDir;

#[test]
fn defaults_when_file_missing() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = Config::load(dir.path()).expect("Failed to load config");

    assert_eq!(config.completion.retry_attempts, DEFAULT_RETRY_ATTEMPTS);
    assert_eq!(config.completion.debounce_ms, DEFAULT_DEBOUNCE_MS);
    assert_eq!(config.retrieval.min_score, DEFAULT_MIN_SCORE);
    assert_eq!(config.retrieval.chunk_lines, DEFAULT_CHUNK_LINES);
    assert_eq!(config.base_dir, dir.path());
}

#[test]
fn save_and_reload_round_trip() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = Config::load(dir.path()).expect("Failed to load config");
    config.completion.model = "custom-model".to_string();
    config.completion.debounce_ms = 500;
    config.retrieval.min_score = 0.3;
    config
        .embedding
        .headers
        .insert("Authorization".to_string(), "Bearer token".to_string());

    config.save().expect("Failed to save config");

    let reloaded = Config::load(dir.path()).expect("Failed to reload config");
    assert_eq!(reloaded, config);
}

#[test]
fn rejects_invalid_url() {
    let config = Config {
        embedding: EmbeddingConfig {
            url: "not a url".to_string(),
            ..EmbeddingConfig::default()
        },
        completion: CompletionConfig::default(),
        retrieval: RetrievalConfig::default(),
        base_dir: PathBuf::new(),
    };

    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidUrl(_))
    ));
}

#[test]
fn rejects_empty_model() {
    let config = Config {
        embedding: EmbeddingConfig::default(),
        completion: CompletionConfig {
            model: "  ".to_string(),
            ..CompletionConfig::default()
        },
        retrieval: RetrievalConfig::default(),
        base_dir: PathBuf::new(),
    };

    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidModel(_))
    ));
}

#[test]
fn rejects_out_of_range_debounce() {
    let mut config = Config::load(
        TempDir::new().expect("Failed to create temp dir").path(),
    )
    .expect("Failed to load config");
    config.completion.debounce_ms = 10;

    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidDebounce(10))
    ));
}

#[test]
fn rejects_zero_retry_attempts() {
    let mut config = Config::load(
        TempDir::new().expect("Failed to create temp dir").path(),
    )
    .expect("Failed to load config");
    config.completion.retry_attempts = 0;

    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidRetryAttempts(0))
    ));
}

#[test]
fn index_path_under_base_dir() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = Config::load(dir.path()).expect("Failed to load config");

    assert_eq!(config.index_path(), dir.path().join("vectors/index.json"));
}
