use {
    review_sentiment_core::{
        balancing::Smote,
        classifier::LogisticRegression,
        config::{BalancerConfig, ClassifierConfig, Config},
        features::to_row,
        models::{LabeledReview, Review},
        normalization::normalize,
        sentiment::Sentiment,
        storage::ArtifactStore,
        tfidf::TfidfVectorizer,
        training::{label_review, train},
    },
};

const REVIEWS: &[(&str, f64)] = &[
    ("terrible, broke immediately", 1.0),
    ("absolutely love this, five stars", 5.0),
    ("it's fine, does the job", 3.0),
    ("amazing quality strings, highly recommend them", 5.0),
    ("amazing quality and great tone, highly recommend", 5.0),
    ("great tone, amazing quality for the price", 5.0),
    ("highly recommend this pedal, love this", 5.0),
    ("cheap cable, broke immediately", 1.0),
    ("terrible sound, would not recommend", 2.0),
    ("poor quality, broke after a week", 1.0),
    ("it's fine for the price, does the job", 3.0),
    ("average tone, it's fine", 3.0),
    ("okay strings, does the job", 3.0),
];

fn labeled_corpus() -> Vec<LabeledReview> {
    REVIEWS
        .iter()
        .map(|(body, rating)| label_review(Review::new(Some(body.to_string()), None, *rating), 3.0))
        .collect()
}

fn class_names() -> Vec<String> {
    Sentiment::ALL.iter().map(|s| s.name().to_owned()).collect()
}

#[test]
fn labels_follow_ratings() {
    let labels: Vec<Sentiment> = labeled_corpus().iter().take(3).map(|r| r.sentiment).collect();

    assert_eq!(labels, vec![Sentiment::Negative, Sentiment::Positive, Sentiment::Neutral]);
}

#[test]
fn clearly_positive_text_is_predicted_positive() {
    let corpus = labeled_corpus();
    let texts: Vec<&str> = corpus.iter().map(|r| r.text.as_str()).collect();
    let labels: Vec<usize> = corpus.iter().map(|r| r.sentiment as usize).collect();

    let vectorizer = TfidfVectorizer::new(5000).fit(&texts).unwrap();
    let classifier = LogisticRegression::new(&ClassifierConfig::default())
        .fit(&vectorizer.transform_batch(&texts), &labels, &class_names(), vectorizer.fingerprint())
        .unwrap();

    let row = vectorizer.transform(&normalize("amazing quality, highly recommend"));
    let probabilities = classifier.predict_proba(row.view());
    let predicted = classifier.predict(row.view());

    assert_eq!(classifier.class_name(predicted), Some("Positive"));
    assert!(probabilities[predicted] >= 0.5);
}

#[test]
fn reloaded_artifacts_predict_identically() {
    let corpus = labeled_corpus();
    let texts: Vec<&str> = corpus.iter().map(|r| r.text.as_str()).collect();
    let labels: Vec<usize> = corpus.iter().map(|r| r.sentiment as usize).collect();

    let vectorizer = TfidfVectorizer::new(5000).fit(&texts).unwrap();
    let classifier = LogisticRegression::new(&ClassifierConfig::default())
        .fit(&vectorizer.transform_batch(&texts), &labels, &class_names(), vectorizer.fingerprint())
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path());
    store.save(&vectorizer, &classifier).unwrap();
    let (loaded_vectorizer, loaded_classifier) = store.load().unwrap();

    for text in ["amazing quality, highly recommend", "broke immediately", "does the job", ""] {
        let text = normalize(text);
        let original = vectorizer.transform(&text);
        let reloaded = loaded_vectorizer.transform(&text);

        assert_eq!(original.indices(), reloaded.indices());
        assert_eq!(original.data(), reloaded.data());
        assert_eq!(
            classifier.predict_proba(original.view()),
            loaded_classifier.predict_proba(reloaded.view()),
        );
    }
}

#[test]
fn balancing_keeps_majority_rows() {
    let corpus = labeled_corpus();
    let texts: Vec<&str> = corpus.iter().map(|r| r.text.as_str()).collect();
    let labels: Vec<usize> = corpus.iter().map(|r| r.sentiment as usize).collect();

    let vectorizer = TfidfVectorizer::new(5000).fit(&texts).unwrap();
    let features = vectorizer.transform_batch(&texts);
    let (balanced, balanced_labels) = Smote::new(&BalancerConfig::default(), 42)
        .fit_resample(&features, &labels)
        .unwrap();

    let positive = Sentiment::Positive as usize;
    let count = |label: usize| balanced_labels.iter().filter(|l| **l == label).count();
    assert_eq!(count(0), 5);
    assert_eq!(count(1), 5);
    assert_eq!(count(2), 5);

    let balanced_rows: Vec<_> = balanced.outer_iterator().map(to_row).collect();
    for (idx, label) in labels.iter().enumerate() {
        if *label == positive {
            assert!(balanced_rows.contains(&to_row(features.outer_view(idx).unwrap())));
        }
    }
}

#[test]
fn full_training_run_saves_usable_artifacts() {
    let config = Config::from_toml(r#"
[training]
seed = 42
test_fraction = 0.25

[training.balancer]
k_neighbors = 5
adaptive_neighbors = true
"#).unwrap();

    let outcome = train(&labeled_corpus(), &config.training).unwrap();

    assert_eq!(outcome.distribution_before, vec![
        (Sentiment::Negative, 4),
        (Sentiment::Neutral, 4),
        (Sentiment::Positive, 5),
    ]);
    assert!(outcome.distribution_after.iter().all(|(_, count)| *count == 5));
    assert_eq!(outcome.evaluation.confusion.total(), 4);
    assert!((0.0..=1.0).contains(&outcome.evaluation.accuracy));
    assert_eq!(outcome.classifier.classes(), class_names().as_slice());

    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path());
    let manifest = store.save(&outcome.vectorizer, &outcome.classifier).unwrap()
        .with_test_accuracy(outcome.evaluation.accuracy);
    store.write_manifest(&manifest).unwrap();

    assert_eq!(store.read_manifest().unwrap().test_accuracy, Some(outcome.evaluation.accuracy));
    assert!(store.load().is_ok());
}
