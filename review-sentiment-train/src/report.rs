//! Evaluation outputs written next to the artifacts after a training run.

use {
    std::{fs, path::Path},
    anyhow::{Context, Result},
    serde::Serialize,
    tracing::info,
    review_sentiment_core::{
        evaluation::Evaluation,
        storage::ArtifactManifest,
        training::ClassDistribution,
    },
};

pub const CLASS_DISTRIBUTION_FILE: &str = "class_distribution.csv";
pub const CONFUSION_MATRIX_FILE: &str = "confusion_matrix.csv";
pub const ROC_CURVE_FILE: &str = "roc_curve.csv";
pub const MODEL_REPORT_FILE: &str = "model_report.txt";

#[derive(Serialize)]
struct DistributionRow<'a> {
    class: &'a str,
    before: usize,
    after: usize,
}

#[derive(Serialize)]
struct RocRow<'a> {
    class: &'a str,
    fpr: f64,
    tpr: f64,
    threshold: f64,
}

pub fn write_results(
    dir: &Path,
    evaluation: &Evaluation,
    before: &ClassDistribution,
    after: &ClassDistribution,
    manifest: &ArtifactManifest,
) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create results dir {}", dir.display()))?;

    write_class_distribution(&dir.join(CLASS_DISTRIBUTION_FILE), before, after)?;
    write_confusion_matrix(&dir.join(CONFUSION_MATRIX_FILE), evaluation)?;
    write_roc_curves(&dir.join(ROC_CURVE_FILE), evaluation)?;
    write_model_report(&dir.join(MODEL_REPORT_FILE), evaluation, manifest)?;

    info!("wrote evaluation results to {}", dir.display());
    Ok(())
}

fn write_class_distribution(path: &Path, before: &ClassDistribution, after: &ClassDistribution) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for ((sentiment, before), (_, after)) in before.iter().zip(after) {
        writer.serialize(DistributionRow {
            class: sentiment.name(),
            before: *before,
            after: *after,
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Header row is `actual` followed by one predicted column per class.
fn write_confusion_matrix(path: &Path, evaluation: &Evaluation) -> Result<()> {
    let classes: Vec<&str> = evaluation.per_class.iter().map(|m| m.class.as_str()).collect();

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(std::iter::once("actual").chain(classes.iter().copied()))?;

    for (truth, class) in classes.iter().enumerate() {
        let mut record = vec![class.to_string()];
        for predicted in 0..classes.len() {
            record.push(evaluation.confusion.get(truth, predicted).to_string());
        }
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

fn write_roc_curves(path: &Path, evaluation: &Evaluation) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for curve in &evaluation.roc {
        for ((fpr, tpr), threshold) in curve.fpr.iter().zip(&curve.tpr).zip(&curve.thresholds) {
            writer.serialize(RocRow {
                class: &curve.class,
                fpr: *fpr,
                tpr: *tpr,
                threshold: *threshold,
            })?;
        }
    }
    writer.flush()?;
    Ok(())
}

fn write_model_report(path: &Path, evaluation: &Evaluation, manifest: &ArtifactManifest) -> Result<()> {
    let mut report = evaluation.report();
    report.push_str(&format!(
        "\nTrained at {} with {} features (fingerprint {})\n",
        manifest.created_at.to_rfc3339(), manifest.vocabulary_size, manifest.fingerprint,
    ));

    fs::write(path, report).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        chrono::Utc,
        ndarray::array,
        review_sentiment_core::sentiment::Sentiment,
    };

    fn evaluation() -> Evaluation {
        let classes: Vec<String> = Sentiment::ALL.iter().map(|s| s.name().to_owned()).collect();
        let probabilities = array![
            [0.7, 0.2, 0.1],
            [0.1, 0.8, 0.1],
            [0.2, 0.2, 0.6],
        ];
        Evaluation::from_probabilities(&classes, &probabilities, &[0, 1, 2])
    }

    fn manifest() -> ArtifactManifest {
        ArtifactManifest {
            format_version: 1,
            created_at: Utc::now(),
            fingerprint: "0000abcd".to_owned(),
            vocabulary_size: 3,
            classes: vec!["Negative".to_owned(), "Neutral".to_owned(), "Positive".to_owned()],
            test_accuracy: Some(1.0),
        }
    }

    #[test]
    fn writes_every_output() {
        let dir = tempfile::tempdir().unwrap();
        let before = vec![(Sentiment::Negative, 1), (Sentiment::Neutral, 2), (Sentiment::Positive, 5)];
        let after = vec![(Sentiment::Negative, 5), (Sentiment::Neutral, 5), (Sentiment::Positive, 5)];

        write_results(dir.path(), &evaluation(), &before, &after, &manifest()).unwrap();

        let distribution = fs::read_to_string(dir.path().join(CLASS_DISTRIBUTION_FILE)).unwrap();
        assert_eq!(distribution, "class,before,after\nNegative,1,5\nNeutral,2,5\nPositive,5,5\n");

        let confusion = fs::read_to_string(dir.path().join(CONFUSION_MATRIX_FILE)).unwrap();
        assert_eq!(confusion.lines().next(), Some("actual,Negative,Neutral,Positive"));
        assert_eq!(confusion.lines().nth(1), Some("Negative,1,0,0"));

        let roc = fs::read_to_string(dir.path().join(ROC_CURVE_FILE)).unwrap();
        assert!(roc.starts_with("class,fpr,tpr,threshold\n"));
        assert!(roc.contains("Positive,"));

        let report = fs::read_to_string(dir.path().join(MODEL_REPORT_FILE)).unwrap();
        assert!(report.contains("Accuracy: 1.0000"));
        assert!(report.contains("fingerprint 0000abcd"));
    }
}
