//! Text normalization shared by the training pipeline and the api. Reviews and
//! request text must both go through [`normalize`] before vectorizing.

use crate::{
    lemmatization::lemmatize,
    stopwords::is_stopword,
    tokenization::{clean_text, tokenize},
};

pub fn normalize(text: &str) -> String {
    normalize_tokens(text).join(" ")
}

/// Lowercase, strip urls/punctuation/digits, tokenize, drop stopwords (keeping
/// negations), lemmatize. Lemmas that are themselves stopwords ("cans" -> "can")
/// are dropped too, so the output normalizes to itself.
pub fn normalize_tokens(text: &str) -> Vec<String> {
    tokenize(&clean_text(text))
        .into_iter()
        .filter(|token| !is_stopword(token))
        .map(|token| lemmatize(&token))
        .filter(|lemma| !is_stopword(lemma))
        .collect()
}
