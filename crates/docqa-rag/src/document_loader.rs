//! Document loading and chunking

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tokio::process::Command;

use docqa_core::{Document, DocumentLoader, Error, Passage, PassageMetadata, Result};

/// Form feed, emitted by `pdftotext` between pages
const PAGE_BREAK: char = '\u{c}';

/// Loads PDFs (through the `pdftotext` binary) and plain text files from a
/// directory, one `Document` per page.
pub struct DirectoryLoader {
    pdftotext: PathBuf,
}

impl DirectoryLoader {
    pub fn new() -> Self {
        Self {
            pdftotext: PathBuf::from("pdftotext"),
        }
    }

    /// Use a specific `pdftotext` executable
    pub fn with_pdftotext(mut self, path: impl Into<PathBuf>) -> Self {
        self.pdftotext = path.into();
        self
    }

    async fn extract_pdf_text(&self, path: &Path) -> Result<String> {
        let output = Command::new(&self.pdftotext)
            .arg("-layout")
            .arg("-enc")
            .arg("UTF-8")
            .arg(path)
            .arg("-")
            .output()
            .await
            .map_err(|e| {
                Error::DocumentLoader(format!(
                    "Failed to run {} (is poppler installed?): {}",
                    self.pdftotext.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            return Err(Error::DocumentLoader(format!(
                "pdftotext failed on {}: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn load_file(&self, path: &Path) -> Result<Vec<Document>> {
        let source = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let text = match extension(path).as_deref() {
            Some("pdf") => self.extract_pdf_text(path).await?,
            Some("txt") | Some("md") => tokio::fs::read_to_string(path).await?,
            _ => return Ok(Vec::new()),
        };

        Ok(split_pages(&source, &text))
    }
}

impl Default for DirectoryLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Split extracted text on page breaks, dropping blank pages
pub fn split_pages(source: &str, text: &str) -> Vec<Document> {
    text.split(PAGE_BREAK)
        .enumerate()
        .filter(|(_, page)| !page.trim().is_empty())
        .map(|(idx, page)| Document {
            source: source.to_string(),
            page: idx + 1,
            text: page.to_string(),
        })
        .collect()
}

#[async_trait]
impl DocumentLoader for DirectoryLoader {
    async fn load_dir(&self, dir: &Path) -> Result<Vec<Document>> {
        let mut read_dir = tokio::fs::read_dir(dir).await.map_err(|e| {
            Error::DocumentLoader(format!("Cannot read directory {}: {}", dir.display(), e))
        })?;

        let mut files = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            let path = entry.path();
            if path.is_file() && matches!(extension(&path).as_deref(), Some("pdf" | "txt" | "md")) {
                files.push(path);
            }
        }
        files.sort();

        let mut documents = Vec::new();
        for path in files {
            match self.load_file(&path).await {
                Ok(pages) => {
                    tracing::info!(file = %path.display(), pages = pages.len(), "loaded document");
                    documents.extend(pages);
                }
                Err(e) => {
                    tracing::warn!(file = %path.display(), error = %e, "skipping document");
                }
            }
        }

        Ok(documents)
    }
}

/// Recursive character splitter.
///
/// Text is split on the coarsest separator present (paragraphs, then lines,
/// then words, then characters); pieces are merged back into chunks of at
/// most `chunk_size` characters, consecutive chunks sharing up to
/// `chunk_overlap` characters.
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<&'static str>,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::Configuration("chunk_size must be greater than zero".to_string()));
        }
        if chunk_overlap >= chunk_size {
            return Err(Error::Configuration(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }

        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators: vec!["\n\n", "\n", " ", ""],
        })
    }

    /// Split every document, tagging chunks with their source page
    pub fn split_documents(&self, documents: &[Document]) -> Vec<Passage> {
        documents
            .iter()
            .flat_map(|doc| {
                self.split_text(&doc.text)
                    .into_iter()
                    .enumerate()
                    .map(move |(chunk_index, content)| {
                        Passage::new(
                            content,
                            PassageMetadata {
                                source: doc.source.clone(),
                                page: doc.page,
                                chunk_index,
                            },
                        )
                    })
            })
            .collect()
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    fn split_recursive(&self, text: &str, separators: &[&'static str]) -> Vec<String> {
        let position = separators
            .iter()
            .position(|sep| sep.is_empty() || text.contains(sep))
            .unwrap_or(separators.len().saturating_sub(1));
        let separator = separators.get(position).copied().unwrap_or("");
        let remaining = separators.get(position + 1..).unwrap_or(&[]);

        let pieces: Vec<&str> = if separator.is_empty() {
            text.char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect()
        } else {
            text.split(separator).filter(|piece| !piece.is_empty()).collect()
        };

        let mut chunks = Vec::new();
        let mut fitting: Vec<&str> = Vec::new();

        for piece in pieces {
            if char_len(piece) < self.chunk_size {
                fitting.push(piece);
                continue;
            }

            if !fitting.is_empty() {
                chunks.extend(self.merge(&fitting, separator));
                fitting.clear();
            }

            if remaining.is_empty() {
                chunks.push(piece.trim().to_string());
            } else {
                chunks.extend(self.split_recursive(piece, remaining));
            }
        }

        if !fitting.is_empty() {
            chunks.extend(self.merge(&fitting, separator));
        }

        chunks.retain(|chunk| !chunk.is_empty());
        chunks
    }

    fn merge(&self, pieces: &[&str], separator: &str) -> Vec<String> {
        let separator_len = char_len(separator);
        let mut chunks = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0;

        for piece in pieces {
            let len = char_len(piece);
            let joiner = if current.is_empty() { 0 } else { separator_len };

            if total + len + joiner > self.chunk_size && !current.is_empty() {
                push_joined(&mut chunks, &current, separator);

                while total > self.chunk_overlap
                    || (total > 0
                        && total + len + if current.is_empty() { 0 } else { separator_len }
                            > self.chunk_size)
                {
                    let Some(front) = current.pop_front() else {
                        break;
                    };
                    total -= char_len(front) + if current.is_empty() { 0 } else { separator_len };
                }
            }

            total += len + if current.is_empty() { 0 } else { separator_len };
            current.push_back(piece);
        }

        push_joined(&mut chunks, &current, separator);
        chunks
    }
}

fn push_joined(chunks: &mut Vec<String>, current: &VecDeque<&str>, separator: &str) {
    let joined = current.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
