//! Joint TF-IDF vector space over requirement and design statements.
//!
//! Both statement sets are embedded in one vocabulary built from their
//! combined corpus, so cosine comparisons across the two documents are
//! meaningful. A space is built fresh for every analysis call; term indices
//! are stable only within a single space.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

/// Tokens are runs of two or more word characters, matched on lowercased text.
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").unwrap());

/// The classic English stop-word list (Glasgow IR). Note that it contains
/// "system", which matters for requirements prose.
static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "about", "above", "across", "after", "afterwards", "again", "against", "all",
        "almost", "alone", "along", "already", "also", "although", "always", "am", "among",
        "amongst", "amoungst", "amount", "an", "and", "another", "any", "anyhow", "anyone",
        "anything", "anyway", "anywhere", "are", "around", "as", "at", "back", "be", "became",
        "because", "become", "becomes", "becoming", "been", "before", "beforehand", "behind",
        "being", "below", "beside", "besides", "between", "beyond", "bill", "both", "bottom",
        "but", "by", "call", "can", "cannot", "cant", "co", "con", "could", "couldnt", "cry",
        "de", "describe", "detail", "do", "done", "down", "due", "during", "each", "eg", "eight",
        "either", "eleven", "else", "elsewhere", "empty", "enough", "etc", "even", "ever",
        "every", "everyone", "everything", "everywhere", "except", "few", "fifteen", "fifty",
        "fill", "find", "fire", "first", "five", "for", "former", "formerly", "forty", "found",
        "four", "from", "front", "full", "further", "get", "give", "go", "had", "has", "hasnt",
        "have", "he", "hence", "her", "here", "hereafter", "hereby", "herein", "hereupon",
        "hers", "herself", "him", "himself", "his", "how", "however", "hundred", "i", "ie", "if",
        "in", "inc", "indeed", "interest", "into", "is", "it", "its", "itself", "keep", "last",
        "latter", "latterly", "least", "less", "ltd", "made", "many", "may", "me", "meanwhile",
        "might", "mill", "mine", "more", "moreover", "most", "mostly", "move", "much", "must",
        "my", "myself", "name", "namely", "neither", "never", "nevertheless", "next", "nine",
        "no", "nobody", "none", "noone", "nor", "not", "nothing", "now", "nowhere", "of", "off",
        "often", "on", "once", "one", "only", "onto", "or", "other", "others", "otherwise",
        "our", "ours", "ourselves", "out", "over", "own", "part", "per", "perhaps", "please",
        "put", "rather", "re", "same", "see", "seem", "seemed", "seeming", "seems", "serious",
        "several", "she", "should", "show", "side", "since", "sincere", "six", "sixty", "so",
        "some", "somehow", "someone", "something", "sometime", "sometimes", "somewhere", "still",
        "such", "system", "take", "ten", "than", "that", "the", "their", "them", "themselves",
        "then", "thence", "there", "thereafter", "thereby", "therefore", "therein", "thereupon",
        "these", "they", "thick", "thin", "third", "this", "those", "though", "three", "through",
        "throughout", "thru", "thus", "to", "together", "too", "top", "toward", "towards",
        "twelve", "twenty", "two", "un", "under", "until", "up", "upon", "us", "very", "via",
        "was", "we", "well", "were", "what", "whatever", "when", "whence", "whenever", "where",
        "whereafter", "whereas", "whereby", "wherein", "whereupon", "wherever", "whether",
        "which", "while", "whither", "who", "whoever", "whole", "whom", "whose", "why", "will",
        "with", "within", "without", "would", "yet", "you", "your", "yours", "yourself",
        "yourselves",
    ]
    .into_iter()
    .collect()
});

/// Lowercase, extract word tokens, drop stop words.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_RE
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|token| !STOP_WORDS.contains(token))
        .map(str::to_string)
        .collect()
}

/// TF-IDF vectors for one analysis call: requirements first, then design.
pub struct VectorSpace {
    terms: Vec<String>,
    idf: Vec<f64>,
    pub requirement_vectors: Vec<Vec<f64>>,
    pub design_vectors: Vec<Vec<f64>>,
}

impl VectorSpace {
    /// Build the joint space over the combined corpus. Statements that are
    /// empty or all stop words come out as zero vectors, never as errors.
    pub fn build(requirements: &[String], design: &[String]) -> Self {
        let requirement_tokens: Vec<Vec<String>> =
            requirements.iter().map(|s| tokenize(s)).collect();
        let design_tokens: Vec<Vec<String>> = design.iter().map(|s| tokenize(s)).collect();

        let mut vocabulary: BTreeSet<&str> = BTreeSet::new();
        for tokens in requirement_tokens.iter().chain(design_tokens.iter()) {
            for token in tokens {
                vocabulary.insert(token);
            }
        }
        let terms: Vec<String> = vocabulary.into_iter().map(str::to_string).collect();
        let index: HashMap<&str, usize> = terms
            .iter()
            .enumerate()
            .map(|(i, term)| (term.as_str(), i))
            .collect();

        // Smoothed inverse document frequency: ln((1 + n) / (1 + df)) + 1,
        // strictly positive, defined even for an empty corpus.
        let corpus_len = requirement_tokens.len() + design_tokens.len();
        let mut document_frequency = vec![0usize; terms.len()];
        for tokens in requirement_tokens.iter().chain(design_tokens.iter()) {
            let distinct: HashSet<&str> = tokens.iter().map(String::as_str).collect();
            for token in distinct {
                if let Some(&i) = index.get(token) {
                    document_frequency[i] += 1;
                }
            }
        }
        let idf: Vec<f64> = document_frequency
            .iter()
            .map(|&df| ((1.0 + corpus_len as f64) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        let requirement_vectors = build_vectors(&requirement_tokens, &index, &idf);
        let design_vectors = build_vectors(&design_tokens, &index, &idf);

        debug!(
            "built vector space: {} terms over {} statements",
            terms.len(),
            corpus_len
        );

        Self {
            terms,
            idf,
            requirement_vectors,
            design_vectors,
        }
    }

    pub fn vocabulary_size(&self) -> usize {
        self.terms.len()
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }
}

fn build_vectors(
    token_lists: &[Vec<String>],
    index: &HashMap<&str, usize>,
    idf: &[f64],
) -> Vec<Vec<f64>> {
    token_lists
        .iter()
        .map(|tokens| {
            let mut vector = vec![0.0; idf.len()];
            for token in tokens {
                if let Some(&i) = index.get(token.as_str()) {
                    // Each occurrence adds one idf weight, so the entry ends
                    // up at tf * idf.
                    vector[i] += idf[i];
                }
            }
            vector
        })
        .collect()
}
