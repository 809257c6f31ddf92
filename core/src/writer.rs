use crate::error::{Error, Result};
use crate::persist::{
    save_dictionary, save_docs, save_meta, save_postings_for_term, save_term_vectors, IndexOptions, IndexPaths, MetaFile,
    FORMAT_VERSION,
};
use crate::tokenizer::analyze;
use crate::{DocId, DocMeta, Field, FieldIndex, InvertedIndex, Posting};
use std::fs;

/// Exclusive, destructive writer. Opening it clears whatever index lived at the
/// target directory; nothing is readable again until `commit` succeeds.
pub struct IndexWriter {
    paths: IndexPaths,
    options: IndexOptions,
    index: InvertedIndex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitStats {
    pub num_docs: u32,
    pub num_terms: usize,
}

impl IndexWriter {
    pub fn create(paths: IndexPaths, options: IndexOptions) -> Result<Self> {
        clear_index_dir(&paths)?;
        fs::create_dir_all(paths.texts_dir()).map_err(|e| Error::open(&paths.root, e))?;
        tracing::info!(root = %paths.root.display(), "opened index for writing");
        Ok(Self { paths, options, index: InvertedIndex::new() })
    }

    pub fn num_docs(&self) -> u32 { self.index.num_docs }

    /// Append one document. On error nothing about the document is recorded,
    /// so the caller may skip it and keep going.
    pub fn add_document(&mut self, name: &str, content: &str) -> Result<DocId> {
        if self.index.names.contains_key(name) {
            return Err(Error::write(name, "duplicate document name"));
        }
        let doc_id = self.index.num_docs;
        let text_path = format!("texts/{doc_id}.txt");
        fs::write(self.paths.text(&text_path), content).map_err(|e| Error::write(name, e))?;

        let analyzer = self.options.analyzer;
        self.index.field_mut(Field::FileName).insert(doc_id, analyze(name, analyzer));
        let distinct = self.index.field_mut(Field::Content).insert(doc_id, analyze(content, analyzer));

        self.index.names.insert(name.to_string(), doc_id);
        self.index.docs.insert(doc_id, DocMeta { name: name.to_string(), text_path });
        self.index.num_docs += 1;
        tracing::debug!(doc_id, name, distinct_terms = distinct, "added document");
        Ok(doc_id)
    }

    /// Compute posting weights and persist everything. The meta file goes last.
    pub fn commit(self) -> Result<CommitStats> {
        let IndexWriter { paths, options, mut index } = self;
        let num_docs = index.num_docs;
        let stats = CommitStats { num_docs, num_terms: index.content.dictionary.len() };
        for field in Field::ALL {
            commit_field(&paths, field, index.field_mut(field), num_docs, options.smoothed_idf)?;
        }
        save_docs(&paths, &index.docs)?;

        let meta = MetaFile {
            num_docs,
            created_at: time::OffsetDateTime::now_utc()
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_default(),
            version: FORMAT_VERSION,
            options,
        };
        save_meta(&paths, &meta)?;
        tracing::info!(num_docs, num_terms = stats.num_terms, root = %paths.root.display(), "index commit complete");
        Ok(stats)
    }
}

fn commit_field(paths: &IndexPaths, field: Field, fi: &mut FieldIndex, num_docs: u32, smoothed_idf: bool) -> Result<()> {
    let n = num_docs.max(1) as f32;

    // First pass: tf-idf per posting and accumulated document norms
    let mut doc_norms: Vec<f32> = vec![0.0; num_docs as usize];
    let mut weights: Vec<(u32, Vec<f32>)> = Vec::with_capacity(fi.postings.len());
    for (term_id, plist) in fi.postings.iter() {
        let df_t = fi.df[*term_id as usize].max(1) as f32;
        let idf = if smoothed_idf { (1.0 + n / df_t).ln() } else { (n / df_t).ln() };
        let mut w = Vec::with_capacity(plist.len());
        for (doc_id, positions) in plist {
            let tf = 1.0 + (positions.len() as f32).ln();
            let tfidf = tf * idf;
            doc_norms[*doc_id as usize] += tfidf * tfidf;
            w.push(tfidf);
        }
        weights.push((*term_id, w));
    }
    for dn in doc_norms.iter_mut() {
        *dn = dn.sqrt();
        if *dn == 0.0 { *dn = 1.0; }
    }

    // Second pass: normalized postings persisted per term
    for (term_id, w) in weights {
        let plist = fi.postings.remove(&term_id).unwrap_or_default();
        let postings: Vec<Posting> = plist
            .into_iter()
            .zip(w)
            .map(|((doc_id, positions), tfidf)| Posting {
                doc_id,
                tf: positions.len() as u32,
                positions,
                weight: tfidf / doc_norms[doc_id as usize],
            })
            .collect();
        save_postings_for_term(paths, field, term_id, &postings)?;
    }

    save_dictionary(paths, field, &(std::mem::take(&mut fi.dictionary), std::mem::take(&mut fi.df)))?;
    save_term_vectors(paths, field, &fi.term_vectors)?;
    Ok(())
}

/// Refuse to wipe a non-empty directory that does not look like an index.
fn clear_index_dir(paths: &IndexPaths) -> Result<()> {
    let root = &paths.root;
    if !root.exists() {
        return Ok(());
    }
    let mut entries = fs::read_dir(root).map_err(|e| Error::open(root, e))?.peekable();
    if entries.peek().is_none() {
        return Ok(());
    }
    let looks_like_index = paths.meta().exists() || paths.texts_dir().exists();
    if !looks_like_index {
        return Err(Error::open(root, "directory is not empty and does not contain an index"));
    }
    tracing::info!(root = %root.display(), "clearing existing index");
    fs::remove_dir_all(root).map_err(|e| Error::open(root, e))?;
    fs::create_dir_all(root).map_err(|e| Error::open(root, e))
}
