use crate::error::{Error, Result};
use crate::writer::IndexWriter;
use std::fs;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

/// Turns a corpus file into indexable text. Format-specific parsers plug in here.
pub trait Extractor {
    fn extract(&self, path: &Path) -> io::Result<String>;
}

/// Reads files as UTF-8, replacing invalid sequences.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl Extractor for PlainTextExtractor {
    fn extract(&self, path: &Path) -> io::Result<String> {
        let bytes = fs::read(path)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexSummary {
    pub indexed: usize,
    /// File names that could not be extracted or written.
    pub skipped: Vec<String>,
}

/// Check a corpus location before a writer is opened, since opening the
/// writer clears the previous index.
pub fn ensure_corpus_dir(source: &Path) -> Result<()> {
    if !source.is_dir() {
        return Err(Error::InvalidArgument(format!("{} is not a directory", source.display())));
    }
    Ok(())
}

/// Index every regular file directly inside `source`, in file-name order.
/// Per-file failures are logged and skipped. Only an unreadable source
/// directory aborts the batch.
pub fn index_directory<E: Extractor + ?Sized>(source: &Path, writer: &mut IndexWriter, extractor: &E) -> Result<IndexSummary> {
    ensure_corpus_dir(source)?;
    let mut summary = IndexSummary::default();
    let walker = WalkDir::new(source).min_depth(1).max_depth(1).sort_by_file_name();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => return Err(Error::read(source, err)),
            Err(err) => {
                tracing::warn!(error = %err, "unreadable directory entry, skipping");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let content = match extractor.extract(entry.path()) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!(file = %name, error = %err, "extraction failed, skipping file");
                summary.skipped.push(name);
                continue;
            }
        };
        match writer.add_document(&name, &content) {
            Ok(_) => summary.indexed += 1,
            Err(err) => {
                tracing::warn!(file = %name, error = %err, "could not add document, skipping file");
                summary.skipped.push(name);
            }
        }
    }
    tracing::info!(indexed = summary.indexed, skipped = summary.skipped.len(), source = %source.display(), "ingested documents");
    Ok(summary)
}
