use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct CrewMemoryConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub embedding: EmbeddingConfig,
    pub ingest: IngestConfig,
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub transport: String,
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite file holding short-term session messages.
    pub session_db_path: String,
    /// Directory backing the persistent vector index.
    pub vector_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub model: String,
    pub cache_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct IngestConfig {
    pub patterns: String,
    pub max_words: usize,
    pub overlap_words: usize,
    pub agent_scope: String,
    pub namespace: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    pub default_top_k: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: "stdio".into(),
            host: "127.0.0.1".into(),
            port: 8765,
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let base = default_home_dir();
        Self {
            session_db_path: base.join("short_term.sqlite").to_string_lossy().into_owned(),
            vector_dir: base.join("vector_store").to_string_lossy().into_owned(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        let cache_dir = default_home_dir()
            .join("models")
            .to_string_lossy()
            .into_owned();
        Self {
            provider: "local".into(),
            model: "all-MiniLM-L6-v2".into(),
            cache_dir,
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            patterns: "*.pdf,*.txt".into(),
            max_words: 300,
            overlap_words: 50,
            agent_scope: "shared".into(),
            namespace: "default".into(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { default_top_k: 5 }
    }
}

/// Returns `~/.crew-memory/`, or `./.crew-memory/` when no home directory is known.
pub fn default_home_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".crew-memory")
}

/// Returns the default config file path: `~/.crew-memory/config.toml`
pub fn default_config_path() -> PathBuf {
    default_home_dir().join("config.toml")
}

impl CrewMemoryConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            CrewMemoryConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("CREW_MEMORY_SESSION_DB") {
            self.storage.session_db_path = val;
        }
        if let Ok(val) = std::env::var("CREW_MEMORY_VECTOR_DIR") {
            self.storage.vector_dir = val;
        }
        if let Ok(val) = std::env::var("CREW_MEMORY_MODEL_DIR") {
            self.embedding.cache_dir = val;
        }
        if let Ok(val) = std::env::var("CREW_MEMORY_LOG_LEVEL") {
            self.server.log_level = val;
        }
    }

    pub fn resolved_session_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.session_db_path)
    }

    pub fn resolved_vector_dir(&self) -> PathBuf {
        expand_tilde(&self.storage.vector_dir)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = CrewMemoryConfig::default();
        assert_eq!(config.server.transport, "stdio");
        assert_eq!(config.server.log_level, "info");
        assert_eq!(config.ingest.patterns, "*.pdf,*.txt");
        assert_eq!(config.ingest.max_words, 300);
        assert_eq!(config.ingest.overlap_words, 50);
        assert_eq!(config.ingest.agent_scope, "shared");
        assert_eq!(config.ingest.namespace, "default");
        assert_eq!(config.retrieval.default_top_k, 5);
        assert!(config.storage.session_db_path.ends_with("short_term.sqlite"));
        assert!(config.storage.vector_dir.ends_with("vector_store"));
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[server]
log_level = "debug"
port = 9000

[storage]
session_db_path = "/tmp/st.sqlite"

[ingest]
namespace = "auth-feature"
max_words = 200
"#;
        let config: CrewMemoryConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.log_level, "debug");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.storage.session_db_path, "/tmp/st.sqlite");
        assert_eq!(config.ingest.namespace, "auth-feature");
        assert_eq!(config.ingest.max_words, 200);
        // defaults still apply for unset fields
        assert_eq!(config.ingest.overlap_words, 50);
        assert!(config.storage.vector_dir.ends_with("vector_store"));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = CrewMemoryConfig::default();
        std::env::set_var("CREW_MEMORY_SESSION_DB", "/tmp/override.sqlite");
        std::env::set_var("CREW_MEMORY_VECTOR_DIR", "/tmp/vectors");
        std::env::set_var("CREW_MEMORY_LOG_LEVEL", "trace");

        config.apply_env_overrides();

        assert_eq!(config.storage.session_db_path, "/tmp/override.sqlite");
        assert_eq!(config.storage.vector_dir, "/tmp/vectors");
        assert_eq!(config.server.log_level, "trace");

        std::env::remove_var("CREW_MEMORY_SESSION_DB");
        std::env::remove_var("CREW_MEMORY_VECTOR_DIR");
        std::env::remove_var("CREW_MEMORY_LOG_LEVEL");
    }

    #[test]
    fn expand_tilde_leaves_absolute_paths() {
        assert_eq!(expand_tilde("/var/data"), PathBuf::from("/var/data"));
    }
}
