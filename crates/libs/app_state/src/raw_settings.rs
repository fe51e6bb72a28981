use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct RawSettings {
    pub logging: LoggingSettings,
    pub vision: VisionSettings,
    #[serde(default)]
    pub pacing: PacingSettings,
    #[serde(default)]
    pub output: OutputSettings,
    #[serde(default)]
    pub storage: Option<StorageSettings>,
    pub secrets: SecretSettings,
    /// The batch input, in processing order.
    #[serde(default)]
    pub images: Vec<ImageEntry>,
}

/// Logging configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
}

/// Remote image-understanding endpoint.
#[derive(Debug, Deserialize, Clone)]
pub struct VisionSettings {
    /// Base url of the resource, e.g. `https://my-vision.cognitiveservices.azure.com`.
    pub endpoint: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_visual_features")]
    pub visual_features: Vec<String>,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Upper bound for one analysis call, connect and body included.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Wait between consecutive analysis calls, drawn uniformly from `min..=max`.
#[derive(Debug, Deserialize, Clone)]
pub struct PacingSettings {
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Also wait after the final image of the batch.
    pub pace_after_last: bool,
}

impl Default for PacingSettings {
    fn default() -> Self {
        Self {
            min_delay_ms: 1000,
            max_delay_ms: 2000,
            pace_after_last: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputSettings {
    pub path: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("image_descriptions.txt"),
        }
    }
}

/// Blob storage account used to sign read-only urls for private images.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageSettings {
    pub account_name: String,
    /// Defaults to `https://{account_name}.blob.core.windows.net`.
    #[serde(default)]
    pub blob_endpoint: Option<String>,
    #[serde(default = "default_sas_validity_secs")]
    pub sas_validity_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SecretSettings {
    pub vision_api_key: String,
    #[serde(default)]
    pub storage_account_key: Option<String>,
}

/// One configured image: either a reachable url or a blob in the storage account.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum ImageEntry {
    Url(String),
    Blob { container: String, blob: String },
}

fn default_api_version() -> String {
    "v3.1".to_string()
}

fn default_visual_features() -> Vec<String> {
    ["Description", "Faces", "Tags"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

const fn default_connect_timeout_secs() -> u64 {
    5
}

const fn default_request_timeout_secs() -> u64 {
    30
}

const fn default_sas_validity_secs() -> u64 {
    3600
}
