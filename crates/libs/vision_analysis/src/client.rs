use crate::AnalysisError;
use async_trait::async_trait;
use bon::bon;
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const NO_DESCRIPTION: &str = "No description available";
const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Normalized outcome of analyzing one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    pub description: String,
    pub face_count: usize,
    /// Tag names in the order the service returned them.
    pub tags: Vec<String>,
}

impl AnalysisResult {
    #[must_use]
    pub const fn has_human_face(&self) -> bool {
        self.face_count > 0
    }
}

/// Turns one image reference into one [`AnalysisResult`].
#[async_trait]
pub trait ImageAnalyzer: Send + Sync {
    async fn analyze(&self, reference: &str) -> Result<AnalysisResult, AnalysisError>;
}

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    url: &'a str,
}

#[derive(Deserialize)]
struct AnalyzeResponse {
    description: DescriptionDetails,
    faces: Vec<IgnoredAny>,
    tags: Vec<ImageTag>,
}

#[derive(Deserialize)]
struct DescriptionDetails {
    captions: Vec<Caption>,
}

#[derive(Deserialize)]
struct Caption {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ImageTag {
    name: String,
}

impl From<AnalyzeResponse> for AnalysisResult {
    fn from(response: AnalyzeResponse) -> Self {
        let description = response
            .description
            .captions
            .into_iter()
            .next()
            .and_then(|caption| caption.text)
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| NO_DESCRIPTION.to_string());

        Self {
            description,
            face_count: response.faces.len(),
            tags: response.tags.into_iter().map(|tag| tag.name).collect(),
        }
    }
}

/// Maps a raw analyze response body to an [`AnalysisResult`].
pub fn parse_analysis(body: &str) -> Result<AnalysisResult, serde_json::Error> {
    serde_json::from_str::<AnalyzeResponse>(body).map(Into::into)
}

/// Client for the `vision/{version}/analyze` endpoint.
///
/// Description, faces and tags are requested in a single call.
#[derive(Clone)]
pub struct VisionClient {
    http: reqwest::Client,
    analyze_url: Url,
    api_key: String,
}

#[bon]
impl VisionClient {
    #[builder(start_fn = with_endpoint)]
    pub fn new(
        #[builder(start_fn)] endpoint: &str,
        api_key: String,
        api_version: Option<String>,
        visual_features: Option<Vec<String>>,
        connect_timeout: Option<Duration>,
        request_timeout: Option<Duration>,
    ) -> Result<Self, AnalysisError> {
        let api_version = api_version.unwrap_or_else(|| "v3.1".to_string());
        let visual_features = visual_features.unwrap_or_else(|| {
            vec![
                "Description".to_string(),
                "Faces".to_string(),
                "Tags".to_string(),
            ]
        });

        let mut analyze_url = Url::parse(&format!(
            "{}/vision/{api_version}/analyze",
            endpoint.trim_end_matches('/')
        ))?;
        analyze_url.set_query(Some(&format!(
            "visualFeatures={}",
            visual_features.join(",")
        )));

        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout.unwrap_or(Duration::from_secs(5)))
            .timeout(request_timeout.unwrap_or(Duration::from_secs(30)))
            .build()?;

        Ok(Self {
            http,
            analyze_url,
            api_key,
        })
    }
}

impl VisionClient {
    #[must_use]
    pub const fn analyze_url(&self) -> &Url {
        &self.analyze_url
    }
}

#[async_trait]
impl ImageAnalyzer for VisionClient {
    async fn analyze(&self, reference: &str) -> Result<AnalysisResult, AnalysisError> {
        debug!("Requesting analysis for {reference}");
        let response = self
            .http
            .post(self.analyze_url.clone())
            .header(SUBSCRIPTION_KEY_HEADER, &self.api_key)
            .json(&AnalyzeRequest { url: reference })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisError::Api {
                status,
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body = response.text().await?;
        Ok(parse_analysis(&body)?)
    }
}
