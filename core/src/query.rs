use crate::error::{Error, Result};
use crate::reader::IndexReader;
use crate::tokenizer::{analyze, AnalyzerOptions};
use crate::{DocId, Field, TermId};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hit {
    pub doc_id: DocId,
    pub name: String,
    pub score: f32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TopDocs {
    /// Number of matching documents before the result cap.
    pub total_hits: usize,
    pub hits: Vec<Hit>,
}

/// Boolean OR of analyzed terms over one field.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub field: Field,
    /// Distinct terms in first-seen order with their query frequency.
    pub terms: Vec<(String, u32)>,
}

impl Query {
    pub fn parse(text: &str, field: Field, options: AnalyzerOptions) -> Result<Self> {
        let mut terms: Vec<(String, u32)> = Vec::new();
        for (term, _pos) in analyze(text, options) {
            match terms.iter_mut().find(|(t, _)| *t == term) {
                Some((_, tf)) => *tf += 1,
                None => terms.push((term, 1)),
            }
        }
        if terms.is_empty() {
            return Err(Error::QueryParse { query: text.to_string(), reason: "no searchable terms".into() });
        }
        Ok(Self { field, terms })
    }
}

/// Execute the query against a reader snapshot. Documents matching any term
/// are hits; scores are cosine similarity of normalized tf-idf weights.
pub fn search(reader: &IndexReader, query: &Query, max_results: usize) -> Result<TopDocs> {
    if max_results == 0 {
        return Err(Error::InvalidArgument("max_results must be at least 1".into()));
    }
    let field = reader.field(query.field);

    let mut tf_q_raw: Vec<(TermId, u32)> = Vec::new();
    for (term, tf) in &query.terms {
        if let Some(tid) = field.term_id(term) {
            tf_q_raw.push((tid, *tf));
        }
    }
    if tf_q_raw.is_empty() {
        return Ok(TopDocs::default());
    }

    // Compute normalized query weights
    let n = reader.num_docs().max(1) as f32;
    let smoothed = reader.options().smoothed_idf;
    let mut q_weights: Vec<(TermId, f32)> = tf_q_raw
        .iter()
        .map(|&(tid, tf_raw)| {
            let tf = 1.0 + (tf_raw as f32).ln();
            let df_t = field.doc_freq_by_id(tid).max(1) as f32;
            let idf = if smoothed { (1.0 + n / df_t).ln() } else { (n / df_t).ln() };
            (tid, tf * idf)
        })
        .collect();
    let mut norm = q_weights.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
    if norm == 0.0 { norm = 1.0; }
    for (_, w) in q_weights.iter_mut() { *w /= norm; }

    // Aggregate scores from postings
    let mut scores: HashMap<DocId, f32> = HashMap::new();
    for (tid, q_w) in q_weights {
        for p in reader.postings(query.field, tid)? {
            *scores.entry(p.doc_id).or_insert(0.0) += p.weight * q_w;
        }
    }

    let mut scored: Vec<(DocId, f32)> = scores.into_iter().collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    let total_hits = scored.len();
    let hits = scored
        .into_iter()
        .take(max_results)
        .map(|(doc_id, score)| Hit { doc_id, name: reader.doc_name(doc_id).unwrap_or_default().to_string(), score })
        .collect();
    tracing::debug!(total_hits, max_results, "query executed");
    Ok(TopDocs { total_hits, hits })
}
