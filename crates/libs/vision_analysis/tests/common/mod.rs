#![allow(dead_code)]

use async_trait::async_trait;
use axum::Json;
use axum::Router;
use axum::extract::Query;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use vision_analysis::{
    AccessUrlError, AccessUrlIssuer, AnalysisError, AnalysisResult, BlobLocation, ImageAnalyzer,
    ResultRecord, ResultSink, SinkError,
};

pub const API_KEY: &str = "test-key";

#[derive(Deserialize)]
struct AnalyzeBody {
    url: String,
}

/// Stand-in for the vision `analyze` endpoint. The image name picks the response.
async fn analyze(
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<AnalyzeBody>,
) -> Response {
    let key = headers
        .get("Ocp-Apim-Subscription-Key")
        .and_then(|v| v.to_str().ok());
    if key != Some(API_KEY) {
        return (StatusCode::UNAUTHORIZED, "Access denied due to invalid subscription key")
            .into_response();
    }
    if query.get("visualFeatures").map(String::as_str) != Some("Description,Faces,Tags") {
        return (StatusCode::BAD_REQUEST, "Unexpected visual features").into_response();
    }

    let name = body.url.rsplit('/').next().unwrap_or_default().to_string();
    match name.as_str() {
        "broken.jpg" => (StatusCode::INTERNAL_SERVER_ERROR, "InternalServerError").into_response(),
        "garbage.jpg" => "definitely not json".into_response(),
        "no-caption.jpg" => Json(json!({
            "description": {"tags": [], "captions": []},
            "faces": [],
            "tags": [{"name": "wall"}]
        }))
        .into_response(),
        "people.jpg" => Json(json!({
            "description": {"captions": [{"text": "two people smiling", "confidence": 0.9}]},
            "faces": [{"age": 30, "gender": "Female"}, {"age": 32, "gender": "Male"}],
            "tags": [{"name": "person"}, {"name": "smile"}]
        }))
        .into_response(),
        "slow.jpg" => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({"description": {"captions": []}, "faces": [], "tags": []})).into_response()
        }
        _ => Json(json!({
            "description": {"captions": [{"text": "a dog"}]},
            "faces": [{}],
            "tags": [{"name": "dog"}, {"name": "outdoor"}]
        }))
        .into_response(),
    }
}

/// Serves the mock endpoint on an ephemeral port, returns its base url.
pub async fn spawn_vision_mock() -> std::io::Result<String> {
    let app = Router::new().route("/vision/v3.1/analyze", post(analyze));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let address = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    Ok(format!("http://{address}"))
}

/// Analyzer double that records when it was called. References containing
/// `fail` produce an [`AnalysisError`].
#[derive(Clone, Default)]
pub struct RecordingAnalyzer {
    pub calls: Arc<Mutex<Vec<(String, Instant)>>>,
}

impl RecordingAnalyzer {
    pub fn references(&self) -> Vec<String> {
        self.calls
            .lock()
            .expect("calls lock")
            .iter()
            .map(|(reference, _)| reference.clone())
            .collect()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.calls
            .lock()
            .expect("calls lock")
            .iter()
            .map(|(_, at)| *at)
            .collect()
    }
}

#[async_trait]
impl ImageAnalyzer for RecordingAnalyzer {
    async fn analyze(&self, reference: &str) -> Result<AnalysisResult, AnalysisError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push((reference.to_string(), Instant::now()));
        if reference.contains("fail") {
            return Err(AnalysisError::Api {
                status: reqwest::StatusCode::BAD_REQUEST,
                body: "InvalidImageUrl".to_string(),
            });
        }
        Ok(AnalysisResult {
            description: format!("caption of {reference}"),
            face_count: 0,
            tags: vec!["tag".to_string()],
        })
    }
}

/// Keeps formatted records in memory. Appends listed in `fail_appends`
/// (0-based) return an error.
#[derive(Default)]
pub struct MemorySink {
    pub initialized: usize,
    pub records: Vec<String>,
    pub fail_appends: Vec<usize>,
    appends: usize,
}

impl MemorySink {
    pub fn failing_at(fail_appends: Vec<usize>) -> Self {
        Self {
            fail_appends,
            ..Self::default()
        }
    }
}

#[async_trait]
impl ResultSink for MemorySink {
    async fn initialize(&mut self) -> Result<(), SinkError> {
        self.initialized += 1;
        self.records.clear();
        Ok(())
    }

    async fn append(&mut self, record: &ResultRecord<'_>) -> Result<(), SinkError> {
        let attempt = self.appends;
        self.appends += 1;
        if self.fail_appends.contains(&attempt) {
            return Err(SinkError::Append {
                path: "memory".into(),
                source: std::io::Error::other("disk full"),
            });
        }
        self.records.push(record.to_string());
        Ok(())
    }
}

/// Issues fake signed urls without touching any credentials.
pub struct FakeIssuer;

#[async_trait]
impl AccessUrlIssuer for FakeIssuer {
    async fn issue(&self, location: &BlobLocation) -> Result<String, AccessUrlError> {
        if location.blob == "forbidden.jpg" {
            return Err(AccessUrlError::NotConfigured(location.to_string()));
        }
        Ok(format!(
            "https://photos.blob.core.windows.net/{}/{}?sp=r&sig=fake",
            location.container, location.blob
        ))
    }
}
