#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crew_memory::embedding::{Embedder, EmbeddingProvider, EMBEDDING_DIM};
use crew_memory::memory::vector::VectorIndex;
use crew_memory::service::{MemoryService, ServiceDefaults};

/// Deterministic bag-of-words embedder: each lowercase word adds weight to one
/// hashed axis, then the vector is L2-normalized. Texts sharing words land
/// close together; no model files needed.
pub struct BagOfWords;

impl EmbeddingProvider for BagOfWords {
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let mut v = vec![0.0f32; EMBEDDING_DIM];
        for word in text.split_whitespace() {
            v[axis(&word.to_lowercase())] += 1.0;
        }
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }
        Ok(v)
    }
}

fn axis(word: &str) -> usize {
    // FNV-1a
    let hash = word
        .bytes()
        .fold(0xcbf29ce484222325u64, |h, b| (h ^ b as u64).wrapping_mul(0x100000001b3));
    (hash % EMBEDDING_DIM as u64) as usize
}

/// Wraps a provider and counts every text it is asked to embed.
pub struct Counting<P> {
    pub inner: P,
    pub calls: Arc<AtomicUsize>,
}

impl<P: EmbeddingProvider> EmbeddingProvider for Counting<P> {
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.embed(text)
    }
}

/// [`BagOfWords`], except any text containing `marker` fails to embed.
pub struct FailsOn {
    pub marker: &'static str,
}

impl EmbeddingProvider for FailsOn {
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        if text.contains(self.marker) {
            anyhow::bail!("tokenizer rejected input");
        }
        BagOfWords.embed(text)
    }
}

/// Service over on-disk stores in `dir`, embedding with [`BagOfWords`].
/// Returns the service and the embedding call counter.
pub fn test_service(dir: &Path) -> (MemoryService, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let provider = Counting {
        inner: BagOfWords,
        calls: Arc::clone(&calls),
    };
    (service_with_provider(dir, Arc::new(provider)), calls)
}

/// Service over on-disk stores in `dir` with a caller-chosen provider.
pub fn service_with_provider(dir: &Path, provider: Arc<dyn EmbeddingProvider>) -> MemoryService {
    let index = VectorIndex::open(dir.join("vectors")).unwrap();
    MemoryService::from_parts(
        dir.join("short_term.sqlite"),
        index,
        Embedder::ready(provider),
        ServiceDefaults::default(),
    )
}

pub fn embed_calls(calls: &AtomicUsize) -> usize {
    calls.load(Ordering::SeqCst)
}

/// Text of `n` distinct words: `w0 w1 ... w{n-1}`.
pub fn numbered_words(n: usize) -> String {
    (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
}

/// Write a one-page PDF whose only text is `text`.
pub fn write_pdf(path: &Path, text: &str) {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 720.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}
