use crate::{
    ImageEntry, LoggingSettings, OutputSettings, PacingSettings, RawSettings, VisionSettings,
};
use color_eyre::eyre::{Result, bail, eyre};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub logging: LoggingSettings,
    pub vision: VisionSettings,
    pub vision_api_key: String,
    pub pacing: PacingSettings,
    pub output: OutputSettings,
    pub storage: Option<StorageAccess>,
    pub images: Vec<ImageEntry>,
}

/// Storage settings joined with the account key, only present when both are configured.
#[derive(Debug, Clone)]
pub struct StorageAccess {
    pub account_name: String,
    pub account_key: String,
    pub blob_endpoint: String,
    pub sas_validity: Duration,
}

impl TryFrom<RawSettings> for AppSettings {
    type Error = color_eyre::Report;

    fn try_from(raw: RawSettings) -> Result<Self> {
        let endpoint = raw.vision.endpoint.trim().trim_end_matches('/').to_string();
        if endpoint.is_empty() {
            bail!("vision.endpoint is not configured");
        }
        if raw.secrets.vision_api_key.trim().is_empty() {
            bail!("secrets.vision_api_key is not configured");
        }
        if raw.pacing.min_delay_ms > raw.pacing.max_delay_ms {
            bail!(
                "pacing.min_delay_ms ({}) is larger than pacing.max_delay_ms ({})",
                raw.pacing.min_delay_ms,
                raw.pacing.max_delay_ms
            );
        }

        let storage = match raw.storage {
            Some(storage) => {
                let account_key = raw
                    .secrets
                    .storage_account_key
                    .filter(|key| !key.trim().is_empty())
                    .ok_or_else(|| {
                        eyre!("storage is configured but secrets.storage_account_key is missing")
                    })?;
                let blob_endpoint = storage.blob_endpoint.unwrap_or_else(|| {
                    format!("https://{}.blob.core.windows.net", storage.account_name)
                });
                Some(StorageAccess {
                    account_name: storage.account_name,
                    account_key,
                    blob_endpoint,
                    sas_validity: Duration::from_secs(storage.sas_validity_secs),
                })
            }
            None => None,
        };

        Ok(Self {
            logging: raw.logging,
            vision: VisionSettings {
                endpoint,
                ..raw.vision
            },
            vision_api_key: raw.secrets.vision_api_key,
            pacing: raw.pacing,
            output: raw.output,
            storage,
            images: raw.images,
        })
    }
}
