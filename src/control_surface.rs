use crate::cadence::Cadence;
use crate::error::Error;
use crate::frame_buffer::FrameBuffer;
use crate::inference_scheduler::stats::{LatencyStats, PercentileMs, REPORTED_PERCENTILES};
use crate::library::logger::interface::Logger;
use crate::result_store::interface::{ResultStore, StoredResult};
use crate::shutdown::Shutdown;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Shared handles the HTTP handlers read and write.
#[derive(Clone)]
pub struct ControlState {
    pub logger: Arc<dyn Logger + Send + Sync>,
    pub cadence: Cadence,
    pub frame_buffer: Arc<FrameBuffer>,
    pub latency_stats: Arc<LatencyStats>,
    pub result_store: Arc<dyn ResultStore + Send + Sync>,
    pub model_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub prediction_interval_ms: f64,
    pub model_id: String,
    pub image_queue_size: usize,
    pub inference_duration_stats: Vec<PercentileMs>,
    pub last_result: Option<StoredResult>,
}

pub fn router(state: ControlState) -> Router {
    Router::new()
        .route("/", get(set_prediction_interval))
        .route("/status", get(status))
        .with_state(state)
}

async fn set_prediction_interval(
    State(state): State<ControlState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let raw = params
        .get("prediction_interval")
        .map(String::as_str)
        .unwrap_or("1");

    match state.cadence.set_from_str(raw) {
        Ok(seconds) => {
            state
                .logger
                .info(&format!("prediction_interval changed to {:?}", seconds));
            (
                StatusCode::OK,
                format!("prediction_interval: {:?} sec", seconds),
            )
                .into_response()
        }
        Err(err) => {
            state
                .logger
                .warn(&format!("Unable to set new prediction_interval: {}", err));
            (StatusCode::BAD_REQUEST, err.to_string()).into_response()
        }
    }
}

async fn status(State(state): State<ControlState>) -> Response {
    let store = state.result_store.clone();
    let last_result = match tokio::task::spawn_blocking(move || store.recent(1)).await {
        Ok(Ok(mut rows)) => rows.pop(),
        Ok(Err(err)) => {
            state
                .logger
                .error(&format!("Failed to read last result: {}", err));
            return (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response();
        }
        Err(err) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response();
        }
    };

    Json(StatusResponse {
        prediction_interval_ms: state.cadence.seconds() * 1000.0,
        model_id: state.model_id.clone(),
        image_queue_size: state.frame_buffer.len(),
        inference_duration_stats: state.latency_stats.percentiles(&REPORTED_PERCENTILES),
        last_result,
    })
    .into_response()
}

pub async fn bind(listen: SocketAddr) -> Result<TcpListener, Error> {
    TcpListener::bind(listen).await.map_err(Error::Http)
}

/// Serves until `shutdown` is triggered, then stops accepting requests.
pub async fn serve(
    listener: TcpListener,
    state: ControlState,
    shutdown: Shutdown,
) -> Result<(), Error> {
    let logger = state.logger.clone();
    if let Ok(addr) = listener.local_addr() {
        logger.info(&format!("Listening on http://{}", addr));
    }

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            let _ = tokio::task::spawn_blocking(move || shutdown.wait()).await;
        })
        .await
        .map_err(Error::Http)?;

    logger.info("Control surface exited gracefully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame_source::interface::Frame;
    use crate::library::logger::impl_fake::LoggerFake;
    use crate::result_store::impl_fake::ResultStoreFake;
    use crate::result_store::interface::ScoringResult;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::Local;
    use std::time::Duration;
    use tower::ServiceExt;

    fn state() -> ControlState {
        ControlState {
            logger: Arc::new(LoggerFake::new()),
            cadence: Cadence::new(600.0),
            frame_buffer: Arc::new(FrameBuffer::new(2, 4)),
            latency_stats: Arc::new(LatencyStats::new(8)),
            result_store: Arc::new(ResultStoreFake::new()),
            model_id: "detector".to_string(),
        }
    }

    async fn get_text(state: ControlState, uri: &str) -> (StatusCode, String) {
        let response = router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_valid_interval_replaces_cadence() {
        let state = state();

        let (status, body) = get_text(state.clone(), "/?prediction_interval=2.5").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "prediction_interval: 2.5 sec");
        assert_eq!(state.cadence.seconds(), 2.5);
    }

    #[tokio::test]
    async fn test_invalid_interval_is_rejected_and_ignored() {
        let state = state();

        let (status, body) = get_text(state.clone(), "/?prediction_interval=abc").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "could not convert string to float: 'abc'");
        assert_eq!(state.cadence.seconds(), 600.0);
    }

    #[tokio::test]
    async fn test_missing_interval_defaults_to_one_second() {
        let state = state();

        let (status, body) = get_text(state.clone(), "/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "prediction_interval: 1.0 sec");
        assert_eq!(state.cadence.seconds(), 1.0);
    }

    #[tokio::test]
    async fn test_status_reports_pipeline_state() {
        let state = state();
        state.frame_buffer.push(Frame(vec![1]));
        state.frame_buffer.push(Frame(vec![2]));
        state.latency_stats.record(40.0);
        state
            .result_store
            .insert(&ScoringResult {
                timestamp: Local::now(),
                score: 0.25,
                elapsed_ms: 40.0,
            })
            .unwrap();

        let (status, body) = get_text(state, "/status").await;
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["predictionIntervalMs"], 600000.0);
        assert_eq!(json["modelId"], "detector");
        assert_eq!(json["imageQueueSize"], 2);
        assert_eq!(json["inferenceDurationStats"][0]["percentile"], 50);
        assert_eq!(json["inferenceDurationStats"][0]["ms"], 40.0);
        assert_eq!(json["lastResult"]["prediction"], 0.25);
    }

    #[tokio::test]
    async fn test_serve_stops_on_shutdown() {
        let listener = bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let shutdown = Shutdown::new();
        let server = tokio::spawn(serve(listener, state(), shutdown.clone()));

        tokio::time::sleep(Duration::from_millis(20)).await;
        shutdown.trigger();

        let result = tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }
}
