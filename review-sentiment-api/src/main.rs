mod routes;
mod service;
mod utils;

use {
    std::sync::Arc,
    anyhow::{Context, Result},
    tracing::{error, info},
    review_sentiment_core::{config::Config, storage::ArtifactStore},
    crate::{
        routes::router,
        service::ArtifactPredictor,
        utils::init_logging,
    },
};

#[tokio::main]
async fn main() {
    init_logging();

    info!("review sentiment api");

    if let Err(err) = run(Config::load()).await {
        error!("api failed: {:#}", err);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<()> {
    let store = ArtifactStore::new(config.artifacts().dir());
    let predictor = ArtifactPredictor::load(&store)
        .with_context(|| format!("failed to load artifacts from {}", store.dir().display()))?;

    let service = config.service();
    let app = router(Arc::new(predictor), &service.allowed_origins())?;

    let listener = tokio::net::TcpListener::bind(service.bind_address())
        .await
        .with_context(|| format!("failed to bind {}", service.bind_address()))?;

    info!("listening on {}", service.bind_address());
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
