use {
    std::sync::Arc,
    anyhow::Context,
    axum::{
        extract::{rejection::JsonRejection, State},
        http::{header, HeaderValue, Method, StatusCode},
        response::{IntoResponse, Response},
        routing::{get, post},
        Json,
        Router,
    },
    serde::{Serialize, Deserialize},
    serde_json::json,
    tower_http::{cors::{AllowOrigin, CorsLayer}, trace::TraceLayer},
    tracing::{error, warn},
    review_sentiment_core::SentimentError,
    crate::service::{Prediction, SentimentPredictor},
};

#[derive(Clone)]
pub struct AppState {
    predictor: Arc<dyn SentimentPredictor>,
}

#[derive(Deserialize, Debug)]
pub struct PredictRequest {
    pub text: String,
}

#[derive(Serialize)]
struct StatusMessage {
    message: &'static str,
}

pub enum ApiError {
    BadRequest(StatusCode, String),
    Prediction(SentimentError),
}

pub fn router(predictor: Arc<dyn SentimentPredictor>, allowed_origins: &[String]) -> anyhow::Result<Router> {
    Ok(Router::new()
        .route("/", get(status))
        .route("/predict", post(predict))
        .layer(cors_layer(allowed_origins)?)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { predictor }))
}

fn cors_layer(allowed_origins: &[String]) -> anyhow::Result<CorsLayer> {
    let origins = allowed_origins
        .iter()
        .map(|origin| HeaderValue::from_str(origin).with_context(|| format!("invalid allowed origin {:?}", origin)))
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true))
}

async fn status() -> Json<StatusMessage> {
    Json(StatusMessage {
        message: "Sentiment API Running",
    })
}

async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<Prediction>, ApiError> {
    let Json(request) = payload?;
    let prediction = state.predictor.predict(&request.text).map_err(ApiError::Prediction)?;
    Ok(Json(prediction))
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(status, message) => {
                warn!("rejected request: {}", message);
                (status, message)
            },
            Self::Prediction(err) => {
                error!("prediction failed: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "prediction failed".to_owned())
            },
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
