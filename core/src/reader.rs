use crate::error::{Error, Result};
use crate::persist::{load_dictionary, load_index_header, load_postings_for_term, load_term_vectors, IndexOptions, IndexPaths};
use crate::{DocId, DocMeta, Document, Field, Posting, TermFreq, TermId};
use std::collections::HashMap;
use std::fs;

/// Per-field header structures loaded eagerly when a reader opens.
pub struct FieldReader {
    dictionary: HashMap<String, TermId>,
    terms: Vec<String>,
    df: Vec<u32>,
    term_vectors: HashMap<DocId, Vec<TermFreq>>,
}

impl FieldReader {
    fn load(paths: &IndexPaths, field: Field) -> Result<Self> {
        let (dictionary, df) = load_dictionary(paths, field)?;
        let term_vectors = load_term_vectors(paths, field)?;
        let mut terms = vec![String::new(); dictionary.len()];
        for (term, &tid) in dictionary.iter() {
            match terms.get_mut(tid as usize) {
                Some(slot) => *slot = term.clone(),
                None => return Err(Error::open(&paths.root, format!("term id {tid} out of range in {field} dictionary"))),
            }
        }
        Ok(Self { dictionary, terms, df, term_vectors })
    }

    pub fn term_id(&self, term: &str) -> Option<TermId> { self.dictionary.get(term).copied() }

    pub fn term(&self, term_id: TermId) -> Option<&str> { self.terms.get(term_id as usize).map(String::as_str) }

    /// Number of documents containing the term, 0 for unknown terms.
    pub fn doc_freq(&self, term: &str) -> u32 {
        self.term_id(term).and_then(|tid| self.df.get(tid as usize).copied()).unwrap_or(0)
    }

    pub fn doc_freq_by_id(&self, term_id: TermId) -> u32 { self.df.get(term_id as usize).copied().unwrap_or(0) }

    pub fn num_terms(&self) -> usize { self.terms.len() }

    /// Term vector of a document; `None` if the document has no terms in this field.
    pub fn term_vector(&self, doc_id: DocId) -> Option<&[TermFreq]> {
        self.term_vectors.get(&doc_id).map(Vec::as_slice).filter(|tv| !tv.is_empty())
    }
}

/// Read-only snapshot of a committed index. Dropping it releases everything.
pub struct IndexReader {
    paths: IndexPaths,
    options: IndexOptions,
    docs: HashMap<DocId, DocMeta>,
    names: HashMap<String, DocId>,
    num_docs: u32,
    file_name: FieldReader,
    content: FieldReader,
}

impl IndexReader {
    pub fn open(paths: &IndexPaths) -> Result<Self> {
        let (docs, meta) = load_index_header(paths)?;
        let names = docs.iter().map(|(id, m)| (m.name.clone(), *id)).collect();
        let reader = Self {
            paths: paths.clone(),
            options: meta.options,
            names,
            num_docs: meta.num_docs,
            file_name: FieldReader::load(paths, Field::FileName)?,
            content: FieldReader::load(paths, Field::Content)?,
            docs,
        };
        tracing::debug!(root = %paths.root.display(), num_docs = reader.num_docs, "opened index reader");
        Ok(reader)
    }

    pub fn options(&self) -> IndexOptions { self.options }

    pub fn num_docs(&self) -> u32 { self.num_docs }

    /// Document ids in index order.
    pub fn doc_ids(&self) -> impl Iterator<Item = DocId> { 0..self.num_docs }

    pub fn field(&self, field: Field) -> &FieldReader {
        match field {
            Field::FileName => &self.file_name,
            Field::Content => &self.content,
        }
    }

    pub fn postings(&self, field: Field, term_id: TermId) -> Result<Vec<Posting>> {
        load_postings_for_term(&self.paths, field, term_id)
    }

    pub fn doc_name(&self, doc_id: DocId) -> Option<&str> { self.docs.get(&doc_id).map(|m| m.name.as_str()) }

    pub fn doc_id(&self, name: &str) -> Option<DocId> { self.names.get(name).copied() }

    /// Load a stored document with its content.
    pub fn document(&self, doc_id: DocId) -> Result<Document> {
        let meta = self
            .docs
            .get(&doc_id)
            .ok_or_else(|| Error::read(&self.paths.root, format!("unknown document id {doc_id}")))?;
        let path = self.paths.text(&meta.text_path);
        let content = fs::read_to_string(&path).map_err(|e| Error::read(&path, e))?;
        Ok(Document { id: doc_id, name: meta.name.clone(), content })
    }
}
