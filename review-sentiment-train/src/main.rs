mod data_loading;
mod progress;
mod report;
mod utils;

use {
    anyhow::{Context, Result},
    tracing::{error, info},
    review_sentiment_core::{
        config::Config,
        models::LabeledReview,
        storage::ArtifactStore,
        training::{label_review, train},
    },
    crate::{
        data_loading::load_reviews,
        progress::Progress,
        report::write_results,
        utils::init_logging,
    },
};

fn main() {
    init_logging();

    info!("review sentiment training");

    if let Err(err) = run(&Config::load()) {
        error!("training failed: {:#}", err);
        std::process::exit(1);
    }
}

fn run(config: &Config) -> Result<()> {
    let training = &config.training;

    let loaded = load_reviews(&training.dataset_path())?;
    if loaded.skipped > 0 {
        info!("{} rows were skipped while loading", loaded.skipped);
    }

    let mut progress = Progress::new("labeling reviews");
    let labeled: Vec<LabeledReview> = loaded.reviews
        .into_iter()
        .map(|review| {
            progress.update();
            label_review(review, training.rating_midpoint())
        })
        .collect();
    progress.finish();

    let outcome = train(&labeled, training).context("training failed")?;

    let store = ArtifactStore::new(config.artifacts().dir());
    let manifest = store.save(&outcome.vectorizer, &outcome.classifier)
        .context("failed to save artifacts")?
        .with_test_accuracy(outcome.evaluation.accuracy);
    store.write_manifest(&manifest).context("failed to write manifest")?;

    write_results(
        &training.results_dir(),
        &outcome.evaluation,
        &outcome.distribution_before,
        &outcome.distribution_after,
        &manifest,
    )?;

    info!("{}", outcome.evaluation.report());
    info!("done, accuracy {:.4}", outcome.evaluation.accuracy);

    Ok(())
}
