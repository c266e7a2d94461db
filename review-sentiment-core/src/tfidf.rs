//! Bigram TF-IDF vectorizer.
//!
//! Fitting freezes a vocabulary of word pairs together with their idf weights;
//! a [`FittedVectorizer`] only ever reads that state, so one instance can be
//! shared between threads and reloaded from disk with identical output.

use {
    std::collections::{BTreeMap, HashMap, HashSet},
    once_cell::sync::Lazy,
    regex::Regex,
    serde::{Serialize, Deserialize},
    sprs::{CsMat, CsVec},
    tracing::info,
    crate::{
        error::{Result, SentimentError},
        features::{stack_rows, FeatureRow},
        hasher::vocabulary_fingerprint,
    },
};

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?u)\b\w\w+\b").expect("word pattern is valid"));

#[derive(Clone, Debug)]
pub struct TfidfVectorizer {
    max_features: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "VectorizerState", into = "VectorizerState")]
pub struct FittedVectorizer {
    terms: Vec<String>,
    idf: Vec<f64>,
    index: HashMap<String, usize>,
    fingerprint: u32,
}

/// What actually gets persisted: terms in feature order and their weights.
#[derive(Serialize, Deserialize)]
struct VectorizerState {
    terms: Vec<String>,
    idf: Vec<f64>,
}

struct TermStats {
    total: usize,
    documents: usize,
}

impl TfidfVectorizer {
    pub fn new(max_features: usize) -> Self {
        Self {
            max_features,
        }
    }

    pub fn fit<S: AsRef<str>>(&self, corpus: &[S]) -> Result<FittedVectorizer> {
        if corpus.is_empty() {
            return Err(SentimentError::configuration("cannot fit vectorizer on an empty corpus"));
        }
        if self.max_features == 0 {
            return Err(SentimentError::configuration("vectorizer max_features must be positive"));
        }

        let mut stats: HashMap<String, TermStats> = HashMap::new();
        for document in corpus {
            let bigrams = bigrams(document.as_ref());
            let unique: HashSet<&String> = bigrams.iter().collect();

            for bigram in &unique {
                stats.entry((*bigram).clone())
                    .or_insert(TermStats { total: 0, documents: 0 })
                    .documents += 1;
            }
            for bigram in &bigrams {
                if let Some(entry) = stats.get_mut(bigram) {
                    entry.total += 1;
                }
            }
        }

        if stats.is_empty() {
            return Err(SentimentError::configuration(
                "empty vocabulary: no document contains two consecutive words"
            ));
        }

        let mut ranked: Vec<(String, TermStats)> = stats.into_iter().collect();
        ranked.sort_by(|(a_term, a), (b_term, b)| b.total.cmp(&a.total).then_with(|| a_term.cmp(b_term)));
        ranked.truncate(self.max_features);
        ranked.sort_by(|(a, _), (b, _)| a.cmp(b));

        let n_documents = corpus.len() as f64;
        let (terms, idf): (Vec<String>, Vec<f64>) = ranked
            .into_iter()
            .map(|(term, stats)| {
                let idf = ((1.0 + n_documents) / (1.0 + stats.documents as f64)).ln() + 1.0;
                (term, idf)
            })
            .unzip();

        info!("fitted vectorizer on {} documents, vocabulary size: {}", corpus.len(), terms.len());

        FittedVectorizer::from_parts(terms, idf)
    }
}

impl FittedVectorizer {
    fn from_parts(terms: Vec<String>, idf: Vec<f64>) -> Result<Self> {
        if terms.len() != idf.len() {
            return Err(SentimentError::Serialization(format!(
                "vectorizer has {} terms but {} idf weights", terms.len(), idf.len()
            )));
        }

        let index: HashMap<String, usize> = terms
            .iter()
            .enumerate()
            .map(|(idx, term)| (term.clone(), idx))
            .collect();
        if index.len() != terms.len() {
            return Err(SentimentError::Serialization("vectorizer vocabulary has duplicate terms".to_owned()));
        }

        let fingerprint = vocabulary_fingerprint(&terms, &idf)?;

        Ok(Self {
            terms,
            idf,
            index,
            fingerprint,
        })
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

    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.index.get(term).copied()
    }

    /// Compatibility tag stored next to every classifier trained on this vectorizer.
    pub fn fingerprint(&self) -> u32 {
        self.fingerprint
    }

    pub fn transform(&self, text: &str) -> CsVec<f64> {
        let (indices, data): (Vec<usize>, Vec<f64>) = self.transform_row(text).into_iter().unzip();
        CsVec::new(self.vocabulary_size(), indices, data)
    }

    pub fn transform_batch<S: AsRef<str>>(&self, texts: &[S]) -> CsMat<f64> {
        stack_rows(
            self.vocabulary_size(),
            texts.iter().map(|text| self.transform_row(text.as_ref())),
        )
    }

    /// Counts known bigrams, weights them by idf and scales the row to unit length.
    fn transform_row(&self, text: &str) -> FeatureRow {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for bigram in bigrams(text) {
            if let Some(&idx) = self.index.get(&bigram) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let mut row: FeatureRow = counts
            .into_iter()
            .map(|(idx, count)| (idx, count * self.idf[idx]))
            .collect();

        let norm = row.iter().map(|(_, value)| value * value).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, value) in row.iter_mut() {
                *value /= norm;
            }
        }

        row
    }
}

impl PartialEq for FittedVectorizer {
    fn eq(&self, other: &Self) -> bool {
        self.terms == other.terms && self.idf == other.idf
    }
}

impl TryFrom<VectorizerState> for FittedVectorizer {
    type Error = SentimentError;

    fn try_from(state: VectorizerState) -> Result<Self> {
        Self::from_parts(state.terms, state.idf)
    }
}

impl From<FittedVectorizer> for VectorizerState {
    fn from(vectorizer: FittedVectorizer) -> Self {
        Self {
            terms: vectorizer.terms,
            idf: vectorizer.idf,
        }
    }
}

fn words(text: &str) -> Vec<&str> {
    WORD.find_iter(text).map(|m| m.as_str()).collect()
}

fn bigrams(text: &str) -> Vec<String> {
    words(text)
        .windows(2)
        .map(|pair| format!("{} {}", pair[0], pair[1]))
        .collect()
}
