use crate::Document;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentFrequency {
    pub document: Document,
    pub count: usize,
}

/// Non-overlapping, case-insensitive substring count. Matches inside longer
/// words count too ("cat" in "category").
pub fn count_occurrences(content: &str, term: &str) -> usize {
    let term = term.to_lowercase();
    if term.is_empty() {
        return 0;
    }
    content.to_lowercase().matches(term.as_str()).count()
}

/// Rank documents by how often `query_term` occurs in their content.
/// Duplicates (by name) keep their first occurrence, documents without a match
/// are dropped, and equal counts keep discovery order.
pub fn rank(documents: &[Document], query_term: &str) -> Vec<DocumentFrequency> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut ranked: Vec<DocumentFrequency> = documents
        .iter()
        .filter(|doc| seen.insert(doc.name.as_str()))
        .filter_map(|doc| {
            let count = count_occurrences(&doc.content, query_term);
            (count > 0).then(|| DocumentFrequency { document: doc.clone(), count })
        })
        .collect();
    // stable sort keeps discovery order among equal counts
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked
}
