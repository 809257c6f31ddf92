use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref WORD_RE: Regex = Regex::new(r"\w+").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","cannot","could",
            "did","do","does","doing","down","during",
            "each","few","for","from","further",
            "had","has","have","having","he","her","here","hers","herself","him","himself","his","how",
            "i","if","in","into","is","it","its","itself",
            "me","more","most","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","should","so","some","such",
            "than","that","the","their","theirs","them","themselves","then","there","these","they","this","those","through","to","too",
            "under","until","up","very",
            "was","we","were","what","when","where","which","while","who","whom","why","with","would",
            "you","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

/// Index-time analysis switches. Stored with the index so queries are analyzed
/// exactly like the documents they are matched against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerOptions {
    pub stopwords: bool,
    pub stem: bool,
}

fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Tokenize with the plain analyzer: NFKC, lowercase, split on non-word characters.
pub fn tokenize(text: &str) -> Vec<(String, usize)> {
    analyze(text, AnalyzerOptions::default())
}

/// Tokenize text into (term, position). Positions count every word, including
/// removed stopwords, so gaps stay visible to positional consumers.
pub fn analyze(text: &str, options: AnalyzerOptions) -> Vec<(String, usize)> {
    let normalized = text.nfkc().collect::<String>().to_lowercase();
    let mut tokens = Vec::new();
    for (pos, mat) in WORD_RE.find_iter(&normalized).enumerate() {
        let token = mat.as_str();
        if options.stopwords && is_stopword(token) { continue; }
        let term = if options.stem { STEMMER.stem(token).into_owned() } else { token.to_string() };
        tokens.push((term, pos));
    }
    tokens
}

/// Raw lower-cased words, no normalization or filtering.
pub fn split_words(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    WORD_RE.find_iter(&lowered).map(|m| m.as_str().to_string()).collect()
}
