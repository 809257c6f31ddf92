use crate::reader::IndexReader;
use crate::Field;
use std::collections::{BTreeSet, HashMap};

/// Corpus-wide term basis for feature vectors. Terms are kept in lexicographic
/// order and every term carries an explicit position, so two vectors built
/// from the same vocabulary always agree on what index `i` means.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vocabulary {
    terms: Vec<String>,
    positions: HashMap<String, usize>,
}

impl Vocabulary {
    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sorted: BTreeSet<String> = terms.into_iter().map(Into::into).collect();
        let terms: Vec<String> = sorted.into_iter().collect();
        let positions = terms.iter().enumerate().map(|(i, t)| (t.clone(), i)).collect();
        Self { terms, positions }
    }

    pub fn len(&self) -> usize { self.terms.len() }

    pub fn is_empty(&self) -> bool { self.terms.is_empty() }

    pub fn position(&self, term: &str) -> Option<usize> { self.positions.get(term).copied() }

    pub fn term(&self, position: usize) -> Option<&str> { self.terms.get(position).map(String::as_str) }

    pub fn terms(&self) -> &[String] { &self.terms }
}

/// Collect every term recorded for `field` across all documents in the index,
/// not only the ones matching the current query.
pub fn build_vocabulary(reader: &IndexReader, field: Field) -> Vocabulary {
    let fr = reader.field(field);
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for doc_id in reader.doc_ids() {
        let Some(tv) = fr.term_vector(doc_id) else { continue };
        for entry in tv {
            if let Some(term) = fr.term(entry.term_id) {
                seen.insert(term);
            }
        }
    }
    let vocab = Vocabulary::from_terms(seen);
    tracing::debug!(%field, size = vocab.len(), "built global vocabulary");
    vocab
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terms_are_sorted_and_deduplicated() {
        let v = Vocabulary::from_terms(["pear", "apple", "fig", "apple"]);
        assert_eq!(v.terms(), &["apple", "fig", "pear"]);
        assert_eq!(v.position("fig"), Some(1));
        assert_eq!(v.position("kiwi"), None);
        assert_eq!(v.term(2), Some("pear"));
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let a = Vocabulary::from_terms(["b", "c", "a"]);
        let b = Vocabulary::from_terms(["c", "a", "b"]);
        assert_eq!(a, b);
    }
}
