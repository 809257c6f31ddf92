//! Cheap, deterministic clustering by each document's dominant term.

use crate::tokenizer::split_words;
use crate::Document;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Terms of this many characters or fewer never represent a document.
pub const MIN_TERM_CHARS: usize = 3;
pub const SIMILARITY_THRESHOLD: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermCluster {
    pub representative_term: String,
    /// Shared distinct terms across all members divided by member count.
    pub similarity: f64,
    pub documents: Vec<Document>,
}

impl TermCluster {
    pub fn size(&self) -> usize { self.documents.len() }
}

/// Most frequent word longer than `MIN_TERM_CHARS`; the first one seen wins ties.
pub fn representative_term(words: &[String]) -> Option<&str> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for w in words.iter().filter(|w| w.chars().count() > MIN_TERM_CHARS) {
        let count = counts.entry(w.as_str()).or_insert(0);
        if *count == 0 {
            order.push(w.as_str());
        }
        *count += 1;
    }
    let mut best: Option<(&str, usize)> = None;
    for term in order {
        let count = counts[term];
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((term, count));
        }
    }
    best.map(|(t, _)| t)
}

/// Group documents by representative term, keep groups of two or more whose
/// similarity reaches the threshold, largest and tightest first.
/// Documents without any qualifying term are left unclustered.
pub fn cluster_by_term(documents: &[Document]) -> Vec<TermCluster> {
    let mut groups: Vec<(String, Vec<(&Document, Vec<String>)>)> = Vec::new();
    let mut group_of: HashMap<String, usize> = HashMap::new();
    for doc in documents {
        let words = split_words(&doc.content);
        let Some(term) = representative_term(&words).map(str::to_string) else {
            tracing::debug!(name = %doc.name, "no qualifying term, document left unclustered");
            continue;
        };
        let slot = *group_of.entry(term.clone()).or_insert_with(|| {
            groups.push((term, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push((doc, words));
    }

    let mut clusters: Vec<TermCluster> = groups
        .into_iter()
        .filter(|(_, members)| members.len() > 1)
        .filter_map(|(term, members)| {
            let similarity = shared_term_ratio(members.iter().map(|(_, words)| words.as_slice()));
            if similarity < SIMILARITY_THRESHOLD {
                tracing::debug!(term = %term, similarity, "dropping loose cluster");
                return None;
            }
            let documents = members.into_iter().map(|(doc, _)| doc.clone()).collect();
            Some(TermCluster { representative_term: term, similarity, documents })
        })
        .collect();

    clusters.sort_by(|a, b| b.size().cmp(&a.size()).then(b.similarity.total_cmp(&a.similarity)));
    tracing::debug!(documents = documents.len(), clusters = clusters.len(), "term clustering done");
    clusters
}

fn shared_term_ratio<'a>(members: impl ExactSizeIterator<Item = &'a [String]>) -> f64 {
    let size = members.len();
    let mut common: Option<HashSet<&str>> = None;
    for words in members {
        let set: HashSet<&str> = words.iter().map(String::as_str).collect();
        common = Some(match common {
            None => set,
            Some(prev) => prev.intersection(&set).copied().collect(),
        });
    }
    if size == 0 {
        return 0.0;
    }
    common.map_or(0, |c| c.len()) as f64 / size as f64
}
