use crate::error::{Error, Result};
use crate::reader::{FieldReader, IndexReader};
use crate::query::Hit;
use crate::vocabulary::{build_vocabulary, Vocabulary};
use crate::{DocId, Field, TermFreq, TermId};

/// Corpus-level statistics needed for idf: document count and per-term df.
pub trait CorpusStats {
    fn num_docs(&self) -> u32;
    fn term(&self, term_id: TermId) -> Option<&str>;
    fn doc_freq(&self, term_id: TermId) -> u32;
}

/// Statistics of one field of an open reader.
pub struct FieldStats<'a> {
    num_docs: u32,
    field: &'a FieldReader,
}

impl<'a> FieldStats<'a> {
    pub fn new(reader: &'a IndexReader, field: Field) -> Self {
        Self { num_docs: reader.num_docs(), field: reader.field(field) }
    }
}

impl CorpusStats for FieldStats<'_> {
    fn num_docs(&self) -> u32 { self.num_docs }
    fn term(&self, term_id: TermId) -> Option<&str> { self.field.term(term_id) }
    fn doc_freq(&self, term_id: TermId) -> u32 { self.field.doc_freq_by_id(term_id) }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    pub doc_id: DocId,
    pub values: Vec<f64>,
}

pub fn idf(num_docs: u32, doc_freq: u32) -> f64 {
    (1.0 + num_docs as f64 / doc_freq as f64).ln()
}

/// Dense tf-idf vector over `vocabulary`: `tf * ln(1 + N / df)` for present
/// terms, 0.0 elsewhere. The result always has `vocabulary.len()` entries.
pub fn vectorize<C: CorpusStats + ?Sized>(
    doc_id: DocId,
    term_stats: &[TermFreq],
    vocabulary: &Vocabulary,
    corpus: &C,
) -> Result<FeatureVector> {
    let mut values = vec![0.0; vocabulary.len()];
    let n = corpus.num_docs();
    for entry in term_stats {
        if entry.tf == 0 {
            continue;
        }
        let term = corpus
            .term(entry.term_id)
            .ok_or_else(|| Error::Vectorization { doc_id, term: format!("#{}", entry.term_id) })?;
        let position = vocabulary
            .position(term)
            .ok_or_else(|| Error::Vectorization { doc_id, term: term.to_string() })?;
        let df = corpus.doc_freq(entry.term_id);
        if df == 0 {
            return Err(Error::Vectorization { doc_id, term: term.to_string() });
        }
        values[position] = entry.tf as f64 * idf(n, df);
    }
    Ok(FeatureVector { doc_id, values })
}

/// Vectors for every hit that has terms in `field`, all over one corpus-wide
/// vocabulary built for this call. Hits without terms are skipped.
pub fn vectorize_hits(reader: &IndexReader, hits: &[Hit], field: Field) -> Result<(Vocabulary, Vec<FeatureVector>)> {
    let vocabulary = build_vocabulary(reader, field);
    let stats = FieldStats::new(reader, field);
    let mut vectors = Vec::with_capacity(hits.len());
    for hit in hits {
        let Some(tv) = reader.field(field).term_vector(hit.doc_id) else {
            tracing::debug!(doc_id = hit.doc_id, "hit has no term vector, skipping");
            continue;
        };
        vectors.push(vectorize(hit.doc_id, tv, &vocabulary, &stats)?);
    }
    tracing::debug!(hits = hits.len(), vectors = vectors.len(), dimensions = vocabulary.len(), "built tf-idf vectors");
    Ok((vocabulary, vectors))
}

impl AsRef<[f64]> for FeatureVector {
    fn as_ref(&self) -> &[f64] { &self.values }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct Fixed {
        n: u32,
        terms: Vec<&'static str>,
        df: HashMap<TermId, u32>,
    }

    impl CorpusStats for Fixed {
        fn num_docs(&self) -> u32 { self.n }
        fn term(&self, term_id: TermId) -> Option<&str> { self.terms.get(term_id as usize).copied() }
        fn doc_freq(&self, term_id: TermId) -> u32 { self.df.get(&term_id).copied().unwrap_or(0) }
    }

    fn corpus() -> Fixed {
        Fixed { n: 4, terms: vec!["cat", "dog", "emu"], df: HashMap::from([(0, 2), (1, 4), (2, 1)]) }
    }

    #[test]
    fn weights_follow_vocabulary_positions() {
        let vocab = Vocabulary::from_terms(["emu", "dog", "cat"]);
        let stats = [TermFreq { term_id: 1, tf: 3 }, TermFreq { term_id: 0, tf: 1 }];
        let v = vectorize(9, &stats, &vocab, &corpus()).unwrap();

        assert_eq!(v.values.len(), 3);
        assert!((v.values[0] - (1.0 + 4.0f64 / 2.0).ln()).abs() < 1e-12);
        assert!((v.values[1] - 3.0 * 2.0f64.ln()).abs() < 1e-12);
        assert_eq!(v.values[2], 0.0);
    }

    #[test]
    fn term_outside_vocabulary_is_an_invariant_violation() {
        let vocab = Vocabulary::from_terms(["cat"]);
        let stats = [TermFreq { term_id: 2, tf: 1 }];
        let err = vectorize(1, &stats, &vocab, &corpus()).unwrap_err();
        assert!(matches!(err, Error::Vectorization { doc_id: 1, ref term } if term == "emu"));
    }
}
