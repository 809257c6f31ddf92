//! The query call surface. A `Session` names one index location; every call
//! opens its own reader snapshot and drops it before returning.

use crate::error::{Error, Result};
use crate::kmeans;
use crate::persist::{load_meta, IndexPaths};
use crate::query::{self, Query, TopDocs};
use crate::rank::{rank, DocumentFrequency};
use crate::reader::IndexReader;
use crate::term_cluster::{cluster_by_term, TermCluster};
use crate::vectorize::vectorize_hits;
use crate::{DocId, Document, Field};
use rand::Rng;
use serde::Serialize;
use std::path::Path;

/// Hit cap for the centroid-clustering path.
pub const VECTOR_CLUSTER_HITS: usize = 100;
/// Hit cap for the term-overlap clustering path.
pub const TERM_CLUSTER_HITS: usize = 100;
/// Hit cap for the frequency-ranking path.
pub const FREQUENCY_RANK_HITS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocRef {
    pub doc_id: DocId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorCluster {
    pub centroid: Vec<f64>,
    pub documents: Vec<DocRef>,
}

impl VectorCluster {
    pub fn is_empty(&self) -> bool { self.documents.is_empty() }

    pub fn file_names(&self) -> Vec<&str> { self.documents.iter().map(|d| d.name.as_str()).collect() }
}

/// Member file names of the `index`-th cluster, `None` when out of range.
pub fn open_cluster(clusters: &[VectorCluster], index: usize) -> Option<Vec<&str>> {
    clusters.get(index).map(VectorCluster::file_names)
}

#[derive(Debug, Clone)]
pub struct Session {
    paths: IndexPaths,
}

impl Session {
    /// Bind to a committed index. Fails with `IndexOpen` if none exists yet.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let paths = IndexPaths::new(root);
        load_meta(&paths)?;
        Ok(Self { paths })
    }

    pub fn root(&self) -> &Path { &self.paths.root }

    pub fn reader(&self) -> Result<IndexReader> { IndexReader::open(&self.paths) }

    pub fn search(&self, text: &str, limit: usize) -> Result<TopDocs> {
        let reader = self.reader()?;
        self.search_reader(&reader, text, limit)
    }

    /// `search` against a reader the caller already holds, so hits and any
    /// follow-up lookups come from the same snapshot.
    pub fn search_reader(&self, reader: &IndexReader, text: &str, limit: usize) -> Result<TopDocs> {
        let text = require_text(text)?;
        require_positive("limit", limit)?;
        run_query(reader, text, limit)
    }

    /// Centroid clusters of the top hits, seeded from thread-local entropy.
    pub fn cluster_by_vector(&self, text: &str, k: usize) -> Result<Vec<VectorCluster>> {
        self.cluster_by_vector_with_rng(text, k, &mut rand::rng())
    }

    pub fn cluster_by_vector_with_rng<R: Rng + ?Sized>(&self, text: &str, k: usize, rng: &mut R) -> Result<Vec<VectorCluster>> {
        let text = require_text(text)?;
        require_positive("k", k)?;
        let reader = self.reader()?;
        let top = run_query(&reader, text, VECTOR_CLUSTER_HITS)?;
        let (_vocabulary, vectors) = vectorize_hits(&reader, &top.hits, Field::Content)?;

        let clusters = kmeans::cluster(&vectors, k, rng)
            .into_iter()
            .map(|c| VectorCluster {
                documents: c
                    .members
                    .iter()
                    .map(|&i| {
                        let doc_id = vectors[i].doc_id;
                        DocRef { doc_id, name: reader.doc_name(doc_id).unwrap_or_default().to_string() }
                    })
                    .collect(),
                centroid: c.centroid,
            })
            .collect();
        Ok(clusters)
    }

    pub fn cluster_by_term(&self, text: &str) -> Result<Vec<TermCluster>> {
        let text = require_text(text)?;
        let reader = self.reader()?;
        let documents = hit_documents(&reader, text, TERM_CLUSTER_HITS)?;
        Ok(cluster_by_term(&documents))
    }

    /// Top hits ranked by literal occurrences of the whole query text.
    pub fn rank_by_frequency(&self, text: &str) -> Result<Vec<DocumentFrequency>> {
        let text = require_text(text)?;
        let reader = self.reader()?;
        let documents = hit_documents(&reader, text, FREQUENCY_RANK_HITS)?;
        Ok(rank(&documents, text))
    }

    /// Stored document by file name.
    pub fn document(&self, name: &str) -> Result<Option<Document>> {
        let reader = self.reader()?;
        match reader.doc_id(name) {
            Some(doc_id) => reader.document(doc_id).map(Some),
            None => Ok(None),
        }
    }
}

fn run_query(reader: &IndexReader, text: &str, limit: usize) -> Result<TopDocs> {
    let query = Query::parse(text, Field::Content, reader.options().analyzer)?;
    query::search(reader, &query, limit)
}

fn hit_documents(reader: &IndexReader, text: &str, limit: usize) -> Result<Vec<Document>> {
    run_query(reader, text, limit)?.hits.iter().map(|hit| reader.document(hit.doc_id)).collect()
}

fn require_text(text: &str) -> Result<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidArgument("query text must not be empty".into()));
    }
    Ok(trimmed)
}

fn require_positive(what: &str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(Error::InvalidArgument(format!("{what} must be at least 1")));
    }
    Ok(())
}
