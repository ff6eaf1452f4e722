//! Text-to-vector embedding.
//!
//! [`EmbeddingProvider`] is the model seam; [`local::LocalEmbeddingProvider`]
//! runs all-MiniLM-L6-v2 through ONNX Runtime. [`Embedder`] is the handle the
//! rest of the crate holds: it loads its provider on first use, exactly once,
//! and remembers a failed load so every later call fails the same way.

pub mod local;

use std::sync::{Arc, OnceLock};

use crate::config::EmbeddingConfig;
use crate::error::{MemoryError, Result};

/// Number of dimensions in the embedding vectors (all-MiniLM-L6-v2).
pub const EMBEDDING_DIM: usize = 384;

/// Trait for embedding text into vectors.
///
/// Implementations are deterministic for a given model and produce vectors of
/// exactly [`EmbeddingProvider::dimensions`] floats. All methods are synchronous;
/// async callers should go through `tokio::task::spawn_blocking`.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text string into a vector.
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;

    /// Embed a batch of text strings, one vector per input, same order.
    fn embed_batch(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    fn dimensions(&self) -> usize {
        EMBEDDING_DIM
    }
}

/// Create an embedding provider from config.
///
/// Only `"local"` is supported. Fails if model files are missing; run
/// `crew-memory model download` first.
pub fn create_provider(config: &EmbeddingConfig) -> anyhow::Result<Box<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "local" => Ok(Box::new(local::LocalEmbeddingProvider::new(config)?)),
        other => anyhow::bail!("unknown embedding provider: {other}. Supported: local"),
    }
}

type Loader = Box<dyn Fn() -> anyhow::Result<Arc<dyn EmbeddingProvider>> + Send + Sync>;

/// Lazily-initialized, process-shared embedding handle.
pub struct Embedder {
    loader: Loader,
    provider: OnceLock<std::result::Result<Arc<dyn EmbeddingProvider>, String>>,
}

impl Embedder {
    /// Handle that loads the configured provider on first use.
    pub fn lazy(config: EmbeddingConfig) -> Self {
        Self::with_loader(move || create_provider(&config).map(Arc::from))
    }

    /// Handle around a provider that is already loaded.
    pub fn ready(provider: Arc<dyn EmbeddingProvider>) -> Self {
        let embedder = Self::with_loader(|| anyhow::bail!("provider supplied at construction"));
        let _ = embedder.provider.set(Self::check_dimensions(provider));
        embedder
    }

    /// Handle with a custom load sequence, run at most once.
    pub fn with_loader<F>(loader: F) -> Self
    where
        F: Fn() -> anyhow::Result<Arc<dyn EmbeddingProvider>> + Send + Sync + 'static,
    {
        Self {
            loader: Box::new(loader),
            provider: OnceLock::new(),
        }
    }

    /// Whether the load sequence has already run (successfully or not).
    pub fn is_initialized(&self) -> bool {
        self.provider.get().is_some()
    }

    /// The loaded provider, loading it on first call.
    pub fn provider(&self) -> Result<Arc<dyn EmbeddingProvider>> {
        let loaded = self.provider.get_or_init(|| {
            tracing::info!("loading embedding provider");
            match (self.loader)() {
                Ok(provider) => Self::check_dimensions(provider),
                Err(e) => {
                    tracing::error!(error = %e, "embedding provider failed to load");
                    Err(format!("{e:#}"))
                }
            }
        });
        match loaded {
            Ok(provider) => Ok(Arc::clone(provider)),
            Err(message) => Err(MemoryError::Initialization(message.clone())),
        }
    }

    pub fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text])?;
        vectors
            .pop()
            .ok_or_else(|| MemoryError::Initialization("embedding provider returned no vector".into()))
    }

    /// Embed a batch in one provider call, verifying count and dimensionality.
    pub fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let provider = self.provider()?;
        let vectors = provider
            .embed_batch(texts)
            .map_err(|e| MemoryError::Initialization(format!("embedding failed: {e:#}")))?;

        if vectors.len() != texts.len() {
            return Err(MemoryError::Initialization(format!(
                "embedding provider returned {} vectors for {} inputs",
                vectors.len(),
                texts.len()
            )));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != EMBEDDING_DIM) {
            return Err(MemoryError::Initialization(format!(
                "embedding has {} dimensions, index expects {EMBEDDING_DIM}",
                bad.len()
            )));
        }
        Ok(vectors)
    }

    fn check_dimensions(
        provider: Arc<dyn EmbeddingProvider>,
    ) -> std::result::Result<Arc<dyn EmbeddingProvider>, String> {
        if provider.dimensions() == EMBEDDING_DIM {
            Ok(provider)
        } else {
            Err(format!(
                "embedding provider produces {} dimensions, index expects {EMBEDDING_DIM}",
                provider.dimensions()
            ))
        }
    }
}
