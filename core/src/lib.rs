//! Indexing, querying and result clustering for a corpus of text files.

pub mod error;
pub mod extract;
pub mod index;
pub mod kmeans;
pub mod persist;
pub mod query;
pub mod rank;
pub mod reader;
pub mod session;
pub mod term_cluster;
pub mod tokenizer;
pub mod vectorize;
pub mod vocabulary;
pub mod writer;

pub use error::{Error, Result};
pub use extract::{ensure_corpus_dir, index_directory, Extractor, IndexSummary, PlainTextExtractor};
pub use index::{DocId, DocMeta, Document, Field, FieldIndex, InvertedIndex, Posting, TermFreq, TermId};
pub use persist::{IndexOptions, IndexPaths};
pub use query::{Hit, Query, TopDocs};
pub use rank::DocumentFrequency;
pub use reader::IndexReader;
pub use session::{open_cluster, DocRef, Session, VectorCluster};
pub use term_cluster::TermCluster;
pub use tokenizer::AnalyzerOptions;
pub use writer::{CommitStats, IndexWriter};
