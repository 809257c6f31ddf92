use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub type TermId = u32;
pub type DocId = u32;

/// Indexed fields of a document. Both are tokenized, only content is stored as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    FileName,
    Content,
}

impl Field {
    pub const ALL: [Field; 2] = [Field::FileName, Field::Content];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::FileName => "file_name",
            Field::Content => "content",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocMeta {
    pub name: String,
    /// Relative path of the stored content, e.g. texts/{doc_id}.txt
    pub text_path: String,
}

/// A stored document as handed to downstream consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub name: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub tf: u32,
    pub positions: Vec<u32>,
    pub weight: f32, // normalized tf-idf weight
}

/// One entry of a document's term vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermFreq {
    pub term_id: TermId,
    pub tf: u32,
}

/// In-memory postings for one field while the writer is open.
#[derive(Default)]
pub struct FieldIndex {
    pub dictionary: HashMap<String, TermId>,
    pub df: Vec<u32>,
    pub postings: HashMap<TermId, Vec<(DocId, Vec<u32>)>>, // positions per doc, appended in doc_id order
    pub term_vectors: HashMap<DocId, Vec<TermFreq>>,
}

impl FieldIndex {
    /// Record one document's tokens. Returns the number of distinct terms.
    pub fn insert(&mut self, doc_id: DocId, tokens: Vec<(String, usize)>) -> usize {
        let mut positions: HashMap<TermId, Vec<u32>> = HashMap::new();
        let mut order: Vec<TermId> = Vec::new();
        for (term, pos) in tokens {
            let next_id = self.dictionary.len() as TermId;
            let tid = *self.dictionary.entry(term).or_insert(next_id);
            if tid == next_id { self.df.push(0); }
            let slot = positions.entry(tid).or_insert_with(|| {
                order.push(tid);
                Vec::new()
            });
            slot.push(pos as u32);
        }

        let mut vector = Vec::with_capacity(order.len());
        for tid in order {
            let pos = positions.remove(&tid).unwrap_or_default();
            self.df[tid as usize] += 1;
            vector.push(TermFreq { term_id: tid, tf: pos.len() as u32 });
            self.postings.entry(tid).or_default().push((doc_id, pos));
        }
        let distinct = vector.len();
        self.term_vectors.insert(doc_id, vector);
        distinct
    }
}

#[derive(Default)]
pub struct InvertedIndex {
    pub file_name: FieldIndex,
    pub content: FieldIndex,
    pub docs: HashMap<DocId, DocMeta>,
    pub names: HashMap<String, DocId>,
    pub num_docs: u32,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    pub fn field_mut(&mut self, field: Field) -> &mut FieldIndex {
        match field {
            Field::FileName => &mut self.file_name,
            Field::Content => &mut self.content,
        }
    }
}
