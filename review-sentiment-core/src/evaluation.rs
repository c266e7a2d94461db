//! Held-out evaluation: accuracy, confusion matrix, per-class precision /
//! recall / F1 and one-vs-rest ROC curves.

use {
    std::fmt,
    ndarray::Array2,
    serde::{Serialize, Deserialize},
    sprs::CsMat,
    crate::classifier::{argmax, Classifier},
};

/// Row-major `K x K` counts, rows are true classes and columns predictions.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ConfusionMatrix {
    pub n_classes: usize,
    pub counts: Vec<u32>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ClassMetrics {
    pub class: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: u32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AveragedMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: u32,
}

/// One-vs-rest ROC curve. The first point is always `(0, 0)` at an infinite
/// threshold; `auc` is `None` when the held-out set lacks positives or negatives.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RocCurve {
    pub class: String,
    pub fpr: Vec<f64>,
    pub tpr: Vec<f64>,
    pub thresholds: Vec<f64>,
    pub auc: Option<f64>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Evaluation {
    pub accuracy: f64,
    pub confusion: ConfusionMatrix,
    pub per_class: Vec<ClassMetrics>,
    pub macro_avg: AveragedMetrics,
    pub weighted_avg: AveragedMetrics,
    pub roc: Vec<RocCurve>,
}

impl ConfusionMatrix {
    pub fn new(n_classes: usize) -> Self {
        Self {
            n_classes,
            counts: vec![0; n_classes * n_classes],
        }
    }

    pub fn from_predictions(n_classes: usize, truth: &[usize], predicted: &[usize]) -> Self {
        let mut matrix = Self::new(n_classes);
        for (t, p) in truth.iter().zip(predicted) {
            matrix.add(*t, *p);
        }
        matrix
    }

    pub fn add(&mut self, truth: usize, predicted: usize) {
        if truth >= self.n_classes || predicted >= self.n_classes {
            return;
        }
        let idx = truth * self.n_classes + predicted;
        self.counts[idx] = self.counts[idx].saturating_add(1);
    }

    pub fn get(&self, truth: usize, predicted: usize) -> u32 {
        self.counts[truth * self.n_classes + predicted]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|c| *c as u64).sum()
    }

    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let correct: u64 = (0..self.n_classes).map(|i| self.get(i, i) as u64).sum();
        correct as f64 / total as f64
    }

    pub fn class_metrics(&self, classes: &[String]) -> Vec<ClassMetrics> {
        (0..self.n_classes)
            .map(|class| {
                let tp = self.get(class, class) as f64;
                let support: u32 = (0..self.n_classes).map(|p| self.get(class, p)).sum();
                let predicted: u32 = (0..self.n_classes).map(|t| self.get(t, class)).sum();

                let precision = ratio(tp, predicted as f64);
                let recall = ratio(tp, support as f64);

                ClassMetrics {
                    class: classes.get(class).cloned().unwrap_or_else(|| class.to_string()),
                    precision,
                    recall,
                    f1: f1_score(precision, recall),
                    support,
                }
            })
            .collect()
    }
}

impl Evaluation {
    pub fn new(classifier: &Classifier, features: &CsMat<f64>, labels: &[usize]) -> Self {
        let probabilities = classifier.predict_proba_batch(features);
        Self::from_probabilities(classifier.classes(), &probabilities, labels)
    }

    pub fn from_probabilities(classes: &[String], probabilities: &Array2<f64>, labels: &[usize]) -> Self {
        let predicted: Vec<usize> = probabilities
            .outer_iter()
            .map(|row| argmax(&row.to_owned()))
            .collect();

        let confusion = ConfusionMatrix::from_predictions(classes.len(), labels, &predicted);
        let per_class = confusion.class_metrics(classes);

        let roc = classes
            .iter()
            .enumerate()
            .map(|(class, name)| {
                let positives: Vec<bool> = labels.iter().map(|label| *label == class).collect();
                let scores: Vec<f64> = probabilities.column(class).to_vec();
                roc_curve(name, &positives, &scores)
            })
            .collect();

        Self {
            accuracy: confusion.accuracy(),
            macro_avg: macro_average(&per_class),
            weighted_avg: weighted_average(&per_class),
            confusion,
            per_class,
            roc,
        }
    }

    /// Plain-text report with the accuracy, a per-class table and AUCs.
    pub fn report(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.per_class.iter().map(|m| m.class.len()).max().unwrap_or(0).max(12);

        writeln!(f, "Sentiment Analysis Report")?;
        writeln!(f, "=========================")?;
        writeln!(f)?;
        writeln!(f, "Accuracy: {:.4}", self.accuracy)?;
        writeln!(f)?;
        writeln!(f, "{:>width$} {:>10} {:>10} {:>10} {:>10}", "", "precision", "recall", "f1-score", "support", width = width)?;
        writeln!(f)?;
        for m in &self.per_class {
            writeln!(f, "{:>width$} {:>10.2} {:>10.2} {:>10.2} {:>10}", m.class, m.precision, m.recall, m.f1, m.support, width = width)?;
        }
        writeln!(f)?;
        writeln!(f, "{:>width$} {:>10} {:>10} {:>10.2} {:>10}", "accuracy", "", "", self.accuracy, self.weighted_avg.support, width = width)?;
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(f, "{:>width$} {:>10.2} {:>10.2} {:>10.2} {:>10}", name, avg.precision, avg.recall, avg.f1, avg.support, width = width)?;
        }
        writeln!(f)?;
        writeln!(f, "ROC AUC (one-vs-rest):")?;
        for curve in &self.roc {
            match curve.auc {
                Some(auc) => writeln!(f, "  {}: {:.4}", curve.class, auc)?,
                None => writeln!(f, "  {}: n/a", curve.class)?,
            }
        }

        Ok(())
    }
}

pub fn roc_curve(class: &str, positives: &[bool], scores: &[f64]) -> RocCurve {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|a, b| scores[*b].total_cmp(&scores[*a]));

    let total_positive = positives.iter().filter(|p| **p).count() as f64;
    let total_negative = positives.len() as f64 - total_positive;

    let mut fpr = vec![0.0];
    let mut tpr = vec![0.0];
    let mut thresholds = vec![f64::INFINITY];

    let mut tp = 0.0;
    let mut fp = 0.0;
    for (position, idx) in order.iter().enumerate() {
        if positives[*idx] {
            tp += 1.0;
        } else {
            fp += 1.0;
        }

        // emit one point per distinct score
        let is_last_of_score = order
            .get(position + 1)
            .map(|next| scores[*next] != scores[*idx])
            .unwrap_or(true);
        if is_last_of_score {
            fpr.push(ratio(fp, total_negative));
            tpr.push(ratio(tp, total_positive));
            thresholds.push(scores[*idx]);
        }
    }

    let auc = if total_positive > 0.0 && total_negative > 0.0 {
        Some(trapezoid_area(&fpr, &tpr))
    } else {
        None
    };

    RocCurve {
        class: class.to_owned(),
        fpr,
        tpr,
        thresholds,
        auc,
    }
}

fn trapezoid_area(x: &[f64], y: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(x, y)| (x[1] - x[0]) * (y[1] + y[0]) / 2.0)
        .sum()
}

fn macro_average(per_class: &[ClassMetrics]) -> AveragedMetrics {
    let n = per_class.len().max(1) as f64;
    AveragedMetrics {
        precision: per_class.iter().map(|m| m.precision).sum::<f64>() / n,
        recall: per_class.iter().map(|m| m.recall).sum::<f64>() / n,
        f1: per_class.iter().map(|m| m.f1).sum::<f64>() / n,
        support: per_class.iter().map(|m| m.support).sum(),
    }
}

fn weighted_average(per_class: &[ClassMetrics]) -> AveragedMetrics {
    let support: u32 = per_class.iter().map(|m| m.support).sum();
    let total = support.max(1) as f64;
    let weighted = |value: fn(&ClassMetrics) -> f64| {
        per_class.iter().map(|m| value(m) * m.support as f64).sum::<f64>() / total
    };

    AveragedMetrics {
        precision: weighted(|m| m.precision),
        recall: weighted(|m| m.recall),
        f1: weighted(|m| m.f1),
        support,
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 { 0.0 } else { numerator / denominator }
}

fn f1_score(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}
