//! Multinomial logistic regression over sparse feature rows.

use {
    ndarray::{Array1, Array2},
    serde::{Serialize, Deserialize},
    sprs::{CsMat, CsVecView},
    tracing::{info, warn},
    crate::{
        config::ClassifierConfig,
        error::{Result, SentimentError},
    },
};

#[derive(Clone, Debug)]
pub struct LogisticRegression {
    c: f64,
    max_iter: usize,
    tolerance: f64,
    learning_rate: f64,
}

/// A fitted model. `classes[i]` is the label name for output index `i`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Classifier {
    classes: Vec<String>,
    weights: Array2<f64>,
    intercepts: Array1<f64>,
    vectorizer_fingerprint: u32,
}

impl LogisticRegression {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            c: config.c,
            max_iter: config.max_iter,
            tolerance: config.tolerance,
            learning_rate: config.learning_rate,
        }
    }

    /// Full-batch gradient descent on the mean cross-entropy plus
    /// `||w||² / (2 · C · n)`. Intercepts are not penalized.
    pub fn fit(
        &self,
        features: &CsMat<f64>,
        labels: &[usize],
        classes: &[String],
        vectorizer_fingerprint: u32,
    ) -> Result<Classifier> {
        let n_samples = features.rows();
        let n_features = features.cols();
        let n_classes = classes.len();

        if n_samples == 0 {
            return Err(SentimentError::configuration("cannot fit classifier on an empty feature matrix"));
        }
        if n_features == 0 {
            return Err(SentimentError::configuration("cannot fit classifier without features"));
        }
        if labels.len() != n_samples {
            return Err(SentimentError::configuration(format!(
                "classifier got {} rows but {} labels", n_samples, labels.len()
            )));
        }
        if n_classes < 2 {
            return Err(SentimentError::configuration("classifier needs at least two classes"));
        }
        if !(self.c > 0.0) || !(self.learning_rate > 0.0) {
            return Err(SentimentError::configuration("classifier c and learning_rate must be positive"));
        }

        let mut seen = vec![false; n_classes];
        for label in labels {
            match seen.get_mut(*label) {
                Some(flag) => *flag = true,
                None => return Err(SentimentError::configuration(format!(
                    "label index {} is out of range for {} classes", label, n_classes
                ))),
            }
        }
        if let Some(missing) = seen.iter().position(|present| !present) {
            return Err(SentimentError::configuration(format!(
                "class {} is absent from the training data", classes[missing]
            )));
        }

        let mut model = Classifier {
            classes: classes.to_vec(),
            weights: Array2::zeros((n_classes, n_features)),
            intercepts: Array1::zeros(n_classes),
            vectorizer_fingerprint,
        };

        let n = n_samples as f64;
        let l2 = 1.0 / (self.c * n);
        let mut converged = false;
        let mut iterations = 0;

        while iterations < self.max_iter {
            iterations += 1;

            let mut grad_weights = Array2::<f64>::zeros((n_classes, n_features));
            let mut grad_intercepts = Array1::<f64>::zeros(n_classes);

            for (row, &label) in features.outer_iterator().zip(labels) {
                let probabilities = model.predict_proba(row.view());
                for class in 0..n_classes {
                    let diff = probabilities[class] - if class == label { 1.0 } else { 0.0 };
                    grad_intercepts[class] += diff;
                    for (feature, value) in row.iter() {
                        grad_weights[[class, feature]] += diff * value;
                    }
                }
            }

            grad_weights.mapv_inplace(|g| g / n);
            grad_intercepts.mapv_inplace(|g| g / n);
            grad_weights.scaled_add(l2, &model.weights);

            let largest = grad_weights
                .iter()
                .chain(grad_intercepts.iter())
                .fold(0.0f64, |acc, g| acc.max(g.abs()));
            if largest < self.tolerance {
                converged = true;
                break;
            }

            model.weights.scaled_add(-self.learning_rate, &grad_weights);
            model.intercepts.scaled_add(-self.learning_rate, &grad_intercepts);
        }

        if converged {
            info!("classifier converged after {} iterations", iterations);
        } else {
            warn!("classifier did not converge within {} iterations", self.max_iter);
        }

        Ok(model)
    }
}

impl Classifier {
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn class_name(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(|name| name.as_str())
    }

    pub fn n_features(&self) -> usize {
        self.weights.ncols()
    }

    pub fn vectorizer_fingerprint(&self) -> u32 {
        self.vectorizer_fingerprint
    }

    /// Checks that the weight shapes agree with the class list.
    pub fn validate(&self) -> Result<()> {
        if self.classes.len() < 2 {
            return Err(SentimentError::Serialization("classifier has fewer than two classes".to_owned()));
        }
        if self.weights.nrows() != self.classes.len() || self.intercepts.len() != self.classes.len() {
            return Err(SentimentError::Serialization(format!(
                "classifier weights are {}x{} with {} intercepts for {} classes",
                self.weights.nrows(), self.weights.ncols(), self.intercepts.len(), self.classes.len()
            )));
        }
        Ok(())
    }

    pub fn decision_function(&self, row: CsVecView<f64>) -> Array1<f64> {
        let mut scores = self.intercepts.clone();
        for (class, score) in scores.iter_mut().enumerate() {
            for (feature, value) in row.iter() {
                if let Some(weight) = self.weights.get((class, feature)) {
                    *score += weight * value;
                }
            }
        }
        scores
    }

    pub fn predict_proba(&self, row: CsVecView<f64>) -> Array1<f64> {
        softmax(self.decision_function(row))
    }

    pub fn predict(&self, row: CsVecView<f64>) -> usize {
        argmax(&self.predict_proba(row))
    }

    pub fn predict_proba_batch(&self, features: &CsMat<f64>) -> Array2<f64> {
        let mut probabilities = Array2::zeros((features.rows(), self.classes.len()));
        for (mut out, row) in probabilities.outer_iter_mut().zip(features.outer_iterator()) {
            out.assign(&self.predict_proba(row));
        }
        probabilities
    }

    pub fn predict_batch(&self, features: &CsMat<f64>) -> Vec<usize> {
        features.outer_iterator().map(|row| self.predict(row)).collect()
    }
}

pub fn softmax(logits: Array1<f64>) -> Array1<f64> {
    let max = logits.fold(f64::NEG_INFINITY, |acc, v| acc.max(*v));
    let exp = logits.mapv(|v| (v - max).exp());
    let sum = exp.sum();
    exp / sum
}

/// Index of the largest value; the first one wins ties.
pub fn argmax(values: &Array1<f64>) -> usize {
    let mut best = 0;
    for (idx, value) in values.iter().enumerate() {
        if *value > values[best] {
            best = idx;
        }
    }
    best
}
