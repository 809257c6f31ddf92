use crate::error::{Error, Result};
use crate::tokenizer::AnalyzerOptions;
use crate::{DocId, DocMeta, Field, Posting, TermFreq, TermId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, create_dir_all};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexOptions {
    pub analyzer: AnalyzerOptions,
    /// idf = ln(1 + N/df) when set, ln(N/df) otherwise. Only affects hit scores.
    pub smoothed_idf: bool,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self { analyzer: AnalyzerOptions::default(), smoothed_idf: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub created_at: String,
    pub version: u32,
    pub options: IndexOptions,
}

#[derive(Debug, Clone)]
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn field_dir(&self, field: Field) -> PathBuf { self.root.join(field.as_str()) }
    fn dictionary(&self, field: Field) -> PathBuf { self.field_dir(field).join("dictionary.bin") }
    fn term_vectors(&self, field: Field) -> PathBuf { self.field_dir(field).join("term_vectors.bin") }
    fn postings_dir(&self, field: Field) -> PathBuf { self.field_dir(field).join("postings") }
    fn postings(&self, field: Field, term_id: TermId) -> PathBuf {
        self.postings_dir(field).join(format!("{term_id:08}.postings.bin"))
    }
    fn docs(&self) -> PathBuf { self.root.join("docs.bin") }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }
    pub fn texts_dir(&self) -> PathBuf { self.root.join("texts") }
    pub fn text(&self, rel: &str) -> PathBuf { self.root.join(rel) }
}

fn save_bin<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let target = path.display().to_string();
    if let Some(parent) = path.parent() {
        create_dir_all(parent).map_err(|e| Error::write(&target, e))?;
    }
    let bytes = bincode::serialize(value).map_err(|e| Error::write(&target, e))?;
    fs::write(path, bytes).map_err(|e| Error::write(&target, e))
}

fn load_bin<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let buf = fs::read(path).map_err(|e| Error::read(path, e))?;
    bincode::deserialize(&buf).map_err(|e| Error::read(path, e))
}

pub fn save_dictionary(paths: &IndexPaths, field: Field, dict: &(HashMap<String, TermId>, Vec<u32>)) -> Result<()> {
    save_bin(&paths.dictionary(field), dict)
}

pub fn load_dictionary(paths: &IndexPaths, field: Field) -> Result<(HashMap<String, TermId>, Vec<u32>)> {
    load_bin(&paths.dictionary(field))
}

pub fn save_term_vectors(paths: &IndexPaths, field: Field, vectors: &HashMap<DocId, Vec<TermFreq>>) -> Result<()> {
    save_bin(&paths.term_vectors(field), vectors)
}

pub fn load_term_vectors(paths: &IndexPaths, field: Field) -> Result<HashMap<DocId, Vec<TermFreq>>> {
    load_bin(&paths.term_vectors(field))
}

pub fn save_docs(paths: &IndexPaths, docs: &HashMap<DocId, DocMeta>) -> Result<()> {
    save_bin(&paths.docs(), docs)
}

pub fn load_docs(paths: &IndexPaths) -> Result<HashMap<DocId, DocMeta>> {
    load_bin(&paths.docs())
}

pub fn save_postings_for_term(paths: &IndexPaths, field: Field, term_id: TermId, postings: &[Posting]) -> Result<()> {
    save_bin(&paths.postings(field, term_id), postings)
}

pub fn load_postings_for_term(paths: &IndexPaths, field: Field, term_id: TermId) -> Result<Vec<Posting>> {
    load_bin(&paths.postings(field, term_id))
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    let target = paths.meta().display().to_string();
    let json = serde_json::to_string_pretty(meta).map_err(|e| Error::write(&target, e))?;
    fs::write(paths.meta(), json).map_err(|e| Error::write(&target, e))
}

/// The meta file is written last on commit, so a missing or unreadable one
/// means the index was never built (or a rebuild did not finish).
pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let json = fs::read_to_string(paths.meta()).map_err(|e| Error::open(&paths.root, e))?;
    let meta: MetaFile = serde_json::from_str(&json).map_err(|e| Error::open(&paths.root, e))?;
    if meta.version != FORMAT_VERSION {
        return Err(Error::open(&paths.root, format!("unsupported index version {}", meta.version)));
    }
    Ok(meta)
}

/// Load only the header structures required to search: docs and meta.
pub fn load_index_header(paths: &IndexPaths) -> Result<(HashMap<DocId, DocMeta>, MetaFile)> {
    let meta = load_meta(paths)?;
    let docs = load_docs(paths)?;
    Ok((docs, meta))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_meta_is_an_open_error() {
        let dir = tempdir().unwrap();
        let err = load_meta(&IndexPaths::new(dir.path())).unwrap_err();
        assert!(matches!(err, Error::IndexOpen { .. }));
    }

    #[test]
    fn postings_are_stored_per_field() {
        let dir = tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        let postings = vec![Posting { doc_id: 3, tf: 2, positions: vec![1, 4], weight: 0.5 }];
        save_postings_for_term(&paths, Field::Content, 7, &postings).unwrap();

        let loaded = load_postings_for_term(&paths, Field::Content, 7).unwrap();
        assert_eq!(loaded[0].positions, vec![1, 4]);
        assert!(load_postings_for_term(&paths, Field::FileName, 7).is_err());
    }
}
