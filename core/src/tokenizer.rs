use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref RE: Regex = Regex::new(r"(?u)[\p{L}\p{N}_][\p{L}\p{N}_']*").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "let's","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Tokenize a title or index-entry string the way site generators index
/// content: NFKC normalization, lowercase, stopword removal, and stemming.
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized = text.nfkc().collect::<String>().to_lowercase();
    let mut tokens = Vec::new();
    for mat in RE.find_iter(&normalized) {
        let token = mat.as_str();
        if is_stopword(token) { continue; }
        tokens.push(STEMMER.stem(token).to_string());
    }
    tokens
}

/// A normalized query token, kept both verbatim and stemmed. The index
/// vocabulary is mostly stemmed by the generator, but raw tokens occur too,
/// so lookup tries both forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTerm {
    pub raw: String,
    pub stem: String,
}

/// Normalize a free-text query into distinct lookup terms: NFKC, lowercase,
/// punctuation stripped. Stopwords are kept; whether a token matches is
/// decided by the index vocabulary, not by a client-side list.
pub fn tokenize_query(text: &str) -> Vec<QueryTerm> {
    let normalized = text.nfkc().collect::<String>().to_lowercase();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut terms = Vec::new();
    for mat in RE.find_iter(&normalized) {
        let raw = mat.as_str();
        if !seen.insert(raw) { continue; }
        terms.push(QueryTerm {
            raw: raw.to_string(),
            stem: STEMMER.stem(raw).to_string(),
        });
    }
    terms
}
