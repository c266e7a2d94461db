//! The offline pipeline: label, vectorize, balance, split, fit, evaluate.

use {
    std::collections::BTreeMap,
    rand::{seq::SliceRandom, SeedableRng},
    rand_xoshiro::Xoshiro256PlusPlus,
    sprs::CsMat,
    tracing::info,
    crate::{
        balancing::Smote,
        classifier::{Classifier, LogisticRegression},
        config::TrainingConfig,
        error::{Result, SentimentError},
        evaluation::Evaluation,
        features::select_rows,
        models::{LabeledReview, Review},
        normalization::normalize,
        sentiment::Sentiment,
        tfidf::{FittedVectorizer, TfidfVectorizer},
    },
};

/// Samples per class, in class index order.
pub type ClassDistribution = Vec<(Sentiment, usize)>;

pub struct TrainingOutcome {
    pub vectorizer: FittedVectorizer,
    pub classifier: Classifier,
    pub evaluation: Evaluation,
    pub distribution_before: ClassDistribution,
    pub distribution_after: ClassDistribution,
}

#[derive(Debug, PartialEq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

pub fn label_review(review: Review, rating_midpoint: f64) -> LabeledReview {
    let sentiment = Sentiment::from_rating(review.rating, rating_midpoint);
    let text = normalize(&review.combined_text());
    review.cleaned(text).labeled(sentiment)
}

/// Shuffles `0..n` with a seeded rng and holds out `ceil(test_fraction * n)` rows.
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> Result<Split> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(SentimentError::configuration(format!(
            "test_fraction must be between 0 and 1, got {}", test_fraction
        )));
    }

    let n_test = (test_fraction * n as f64).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(SentimentError::configuration(format!(
            "cannot hold out {} of {} samples for testing", n_test, n
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut Xoshiro256PlusPlus::seed_from_u64(seed));

    let train = indices.split_off(n_test);

    Ok(Split {
        train,
        test: indices,
    })
}

pub fn class_distribution(labels: &[usize]) -> ClassDistribution {
    let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
    for label in labels {
        *counts.entry(*label).or_insert(0) += 1;
    }

    Sentiment::ALL
        .iter()
        .enumerate()
        .map(|(idx, sentiment)| (*sentiment, counts.get(&idx).copied().unwrap_or(0)))
        .collect()
}

pub fn train(reviews: &[LabeledReview], config: &TrainingConfig) -> Result<TrainingOutcome> {
    if reviews.is_empty() {
        return Err(SentimentError::configuration("no reviews to train on"));
    }

    let classes: Vec<String> = Sentiment::ALL.iter().map(|s| s.name().to_owned()).collect();
    let texts: Vec<&str> = reviews.iter().map(|r| r.text.as_str()).collect();
    let labels: Vec<usize> = reviews.iter().map(|r| class_index(r.sentiment)).collect();

    let distribution_before = class_distribution(&labels);
    log_distribution("before balancing", &distribution_before);

    let vectorizer = TfidfVectorizer::new(config.vectorizer.max_features).fit(&texts)?;
    let features = vectorizer.transform_batch(&texts);

    let (features, labels) = Smote::new(&config.balancer, config.seed()).fit_resample(&features, &labels)?;

    let distribution_after = class_distribution(&labels);
    log_distribution("after balancing", &distribution_after);

    let split = train_test_split(labels.len(), config.test_fraction(), config.seed())?;
    let (train_features, train_labels) = subset(&features, &labels, &split.train);
    let (test_features, test_labels) = subset(&features, &labels, &split.test);

    ensure_all_classes("training", &train_labels, &classes)?;
    ensure_all_classes("test", &test_labels, &classes)?;

    info!("training on {} samples, testing on {}", train_labels.len(), test_labels.len());

    let classifier = LogisticRegression::new(&config.classifier)
        .fit(&train_features, &train_labels, &classes, vectorizer.fingerprint())?;

    let evaluation = Evaluation::new(&classifier, &test_features, &test_labels);
    info!("test accuracy: {:.4}", evaluation.accuracy);

    Ok(TrainingOutcome {
        vectorizer,
        classifier,
        evaluation,
        distribution_before,
        distribution_after,
    })
}

fn class_index(sentiment: Sentiment) -> usize {
    Sentiment::ALL.iter().position(|s| *s == sentiment).unwrap_or(0)
}

fn subset(features: &CsMat<f64>, labels: &[usize], rows: &[usize]) -> (CsMat<f64>, Vec<usize>) {
    (select_rows(features, rows), rows.iter().map(|idx| labels[*idx]).collect())
}

fn ensure_all_classes(split: &str, labels: &[usize], classes: &[String]) -> Result<()> {
    for (idx, class) in classes.iter().enumerate() {
        if !labels.contains(&idx) {
            return Err(SentimentError::configuration(format!(
                "class {} is absent from the {} split", class, split
            )));
        }
    }
    Ok(())
}

fn log_distribution(stage: &str, distribution: &ClassDistribution) {
    let formatted: Vec<String> = distribution
        .iter()
        .map(|(sentiment, count)| format!("{}={}", sentiment, count))
        .collect();
    info!("class distribution {}: {}", stage, formatted.join(", "));
}
