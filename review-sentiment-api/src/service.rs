use {
    serde::Serialize,
    review_sentiment_core::{
        classifier::{argmax, Classifier},
        normalization::normalize,
        sentiment::Sentiment,
        storage::ArtifactStore,
        tfidf::FittedVectorizer,
        Result,
        SentimentError,
    },
};

#[derive(Serialize, Clone, Copy, Debug, PartialEq)]
pub struct Prediction {
    pub sentiment: Sentiment,
    pub confidence: f64,
}

pub trait SentimentPredictor: Send + Sync {
    fn predict(&self, text: &str) -> Result<Prediction>;
}

/// Serves predictions from a vectorizer and classifier loaded once at startup.
pub struct ArtifactPredictor {
    vectorizer: FittedVectorizer,
    classifier: Classifier,
    labels: Vec<Sentiment>,
}

impl ArtifactPredictor {
    pub fn load(store: &ArtifactStore) -> Result<Self> {
        let (vectorizer, classifier) = store.load()?;
        Self::new(vectorizer, classifier)
    }

    pub fn new(vectorizer: FittedVectorizer, classifier: Classifier) -> Result<Self> {
        let labels = classifier
            .classes()
            .iter()
            .map(|name| Sentiment::from_name(name).ok_or_else(|| SentimentError::Serialization(
                format!("classifier has unknown class {:?}", name)
            )))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            vectorizer,
            classifier,
            labels,
        })
    }
}

impl SentimentPredictor for ArtifactPredictor {
    fn predict(&self, text: &str) -> Result<Prediction> {
        let row = self.vectorizer.transform(&normalize(text));
        let probabilities = self.classifier.predict_proba(row.view());
        let best = argmax(&probabilities);

        Ok(Prediction {
            sentiment: self.labels[best],
            confidence: probabilities[best],
        })
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        std::sync::Arc,
        review_sentiment_core::{
            classifier::LogisticRegression,
            config::ClassifierConfig,
            tfidf::TfidfVectorizer,
        },
    };

    fn fitted(classes: &[&str]) -> (FittedVectorizer, Classifier) {
        let texts = [
            "amazing quality highly recommend",
            "great tone highly recommend",
            "broke immediately terrible",
            "cheap cable broke immediately",
            "fine job okay",
            "average tone fine job",
        ];
        let vectorizer = TfidfVectorizer::new(100).fit(&texts).unwrap();
        let classes: Vec<String> = classes.iter().map(|c| c.to_string()).collect();
        let classifier = LogisticRegression::new(&ClassifierConfig::default())
            .fit(&vectorizer.transform_batch(&texts), &[2, 2, 0, 0, 1, 1], &classes, vectorizer.fingerprint())
            .unwrap();

        (vectorizer, classifier)
    }

    #[test]
    fn labels_come_from_persisted_classes() {
        let (vectorizer, classifier) = fitted(&["Negative", "Neutral", "Positive"]);
        let predictor = ArtifactPredictor::new(vectorizer, classifier).unwrap();

        let prediction = predictor.predict("Amazing quality! Highly recommend.").unwrap();

        assert_eq!(prediction.sentiment, Sentiment::Positive);
        assert!(prediction.confidence > 1.0 / 3.0 && prediction.confidence <= 1.0);
    }

    #[test]
    fn unknown_class_names_are_rejected() {
        let (vectorizer, classifier) = fitted(&["bad", "meh", "good"]);

        assert!(ArtifactPredictor::new(vectorizer, classifier).is_err());
    }

    #[test]
    fn predictor_is_shared_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ArtifactPredictor>();

        let (vectorizer, classifier) = fitted(&["Negative", "Neutral", "Positive"]);
        let predictor = Arc::new(ArtifactPredictor::new(vectorizer, classifier).unwrap());
        let expected = predictor.predict("amazing quality, highly recommend").unwrap();

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let predictor = predictor.clone();
                    scope.spawn(move || predictor.predict("amazing quality, highly recommend").unwrap())
                })
                .collect();

            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }

    #[test]
    fn empty_text_still_predicts() {
        let (vectorizer, classifier) = fitted(&["Negative", "Neutral", "Positive"]);
        let predictor = ArtifactPredictor::new(vectorizer, classifier).unwrap();

        let prediction = predictor.predict("").unwrap();

        assert!((0.0..=1.0).contains(&prediction.confidence));
    }
}
