use {
    std::collections::HashSet,
    once_cell::sync::Lazy,
};

/// NLTK english stopword list. Forms with apostrophes are left out since
/// punctuation is gone by the time tokens are filtered.
const ENGLISH_STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
    "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself",
    "it", "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
    "who", "whom", "this", "that", "these", "those", "am", "is", "are", "was", "were", "be",
    "been", "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an",
    "the", "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by", "for",
    "with", "about", "against", "between", "into", "through", "during", "before", "after",
    "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over", "under",
    "again", "further", "then", "once", "here", "there", "when", "where", "why", "how", "all",
    "any", "both", "each", "few", "more", "most", "other", "some", "such", "no", "nor", "not",
    "only", "own", "same", "so", "than", "too", "very", "s", "t", "can", "will", "just", "don",
    "should", "now", "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "couldn", "didn",
    "doesn", "hadn", "hasn", "haven", "isn", "ma", "mightn", "mustn", "needn", "shan",
    "shouldn", "wasn", "weren", "won", "wouldn",
];

/// Negations flip polarity, so they survive stopword removal. Includes the
/// stems left behind when "n't" contractions lose their apostrophe.
const NEGATIONS: &[&str] = &[
    "no", "nor", "not", "ain", "aren", "couldn", "didn", "doesn", "don", "hadn", "hasn",
    "haven", "isn", "mightn", "mustn", "needn", "shan", "shouldn", "wasn", "weren", "won",
    "wouldn",
];

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    let negations: HashSet<&str> = NEGATIONS.iter().copied().collect();
    ENGLISH_STOPWORDS
        .iter()
        .copied()
        .filter(|word| !negations.contains(word))
        .collect()
});

pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(token)
}
