//! Sequential ingestion run over a documents directory

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::EMBED_DIM;
use crate::embeddings::OnnxEmbedder;
use crate::error::Result;
use crate::store::QdrantStore;
use crate::types::{doc_id_for, Chunk};

use super::acquire;
use super::chunker::Chunker;
use super::normalize::Normalizer;

/// Outcome summary of one ingestion run.
#[derive(Debug, Default)]
pub struct IngestReport {
    /// PDF files visited
    pub files: usize,
    /// Pages acquired and indexed
    pub pages_ok: usize,
    /// Pages skipped after an acquisition failure
    pub pages_failed: usize,
    /// Chunks upserted
    pub chunks: usize,
    /// One entry per skipped page or file
    pub failures: Vec<PageFailure>,
}

/// A page (or whole file, when the probe failed) that could not be ingested.
#[derive(Debug)]
pub struct PageFailure {
    /// Source filename
    pub filename: String,
    /// Failed page, or `None` when the page-count probe failed
    pub page: Option<u32>,
    /// Error description
    pub error: String,
}

/// Orchestrates acquisition, normalization, chunking, embedding, and upserts.
///
/// Everything runs strictly sequentially: one page at a time, one embedding
/// batch at a time. Page failures are recorded and skipped; embedding and
/// upsert failures abort the run.
pub struct IngestPipeline {
    normalizer: Normalizer,
    chunker: Chunker,
    embedder: OnnxEmbedder,
    store: QdrantStore,
}

impl IngestPipeline {
    /// Create a pipeline around a loaded embedder and vector store.
    pub fn new(embedder: OnnxEmbedder, store: QdrantStore) -> Self {
        Self {
            normalizer: Normalizer::new(),
            chunker: Chunker::default(),
            embedder,
            store,
        }
    }

    /// Ingest every `.pdf` under `docs_dir`.
    pub async fn run(&mut self, docs_dir: &Path) -> Result<IngestReport> {
        let pdfs = find_pdfs(docs_dir);
        tracing::info!(count = pdfs.len(), dir = %docs_dir.display(), "starting ingestion run");

        self.store.ensure_collection(EMBED_DIM).await?;

        let mut report = IngestReport::default();
        for path in pdfs {
            report.files += 1;
            self.ingest_file(&path, &mut report).await?;
        }

        tracing::info!(
            files = report.files,
            pages_ok = report.pages_ok,
            pages_failed = report.pages_failed,
            chunks = report.chunks,
            "ingestion run finished"
        );
        for failure in &report.failures {
            tracing::warn!(
                file = %failure.filename,
                page = failure.page,
                error = %failure.error,
                "skipped during ingestion"
            );
        }

        Ok(report)
    }

    async fn ingest_file(&mut self, path: &Path, report: &mut IngestReport) -> Result<()> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let doc_id = doc_id_for(&filename);

        let page_count = match acquire::probe_page_count(path).await {
            Ok(count) => count,
            Err(e) => {
                report.failures.push(PageFailure {
                    filename,
                    page: None,
                    error: e.to_string(),
                });
                return Ok(());
            }
        };

        tracing::info!(file = %filename, pages = page_count, "ingesting document");

        let mut chunks: Vec<Chunk> = Vec::new();
        for page_number in 1..=page_count {
            let page = match acquire::acquire_page(path, page_number).await {
                Ok(page) => page,
                Err(e) => {
                    report.pages_failed += 1;
                    report.failures.push(PageFailure {
                        filename: filename.clone(),
                        page: Some(page_number),
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            tracing::debug!(page = page.number, method = ?page.method, "page acquired");
            let canonical = self.normalizer.normalize(&page.text);
            for text in self.chunker.split(&canonical) {
                chunks.push(Chunk::new(&doc_id, &filename, page.number, text));
            }
            report.pages_ok += 1;
        }

        if chunks.is_empty() {
            tracing::warn!(file = %filename, "no chunks produced");
            return Ok(());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts)?;
        self.store.upsert_chunks(&chunks, &vectors).await?;
        report.chunks += chunks.len();

        tracing::info!(file = %filename, chunks = chunks.len(), "document indexed");
        Ok(())
    }
}

/// Every `.pdf` directly inside `dir`, in stable order.
fn find_pdfs(dir: &Path) -> Vec<PathBuf> {
    let mut pdfs: Vec<PathBuf> = WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .map(|ext| ext.eq_ignore_ascii_case("pdf"))
                .unwrap_or(false)
        })
        .collect();
    pdfs.sort();
    pdfs
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_find_pdfs_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.pdf"), b"x").unwrap();
        fs::write(dir.path().join("a.PDF"), b"x").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let found = find_pdfs(dir.path());
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.PDF", "b.pdf"]);
    }
}
