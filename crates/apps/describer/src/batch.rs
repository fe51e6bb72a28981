use app_state::{AppSettings, StorageAccess};
use color_eyre::eyre::Result;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use vision_analysis::{
    AccessUrlIssuer, BatchSummary, FileSink, ImageSource, PipelineController, RandomPacing,
    SasUrlIssuer, VisionClient,
};

fn sas_issuer(storage: &StorageAccess) -> Result<Box<dyn AccessUrlIssuer>> {
    let issuer = SasUrlIssuer::new(
        &storage.account_name,
        &storage.account_key,
        &storage.blob_endpoint,
        storage.sas_validity,
    )?;
    Ok(Box::new(issuer))
}

/// Analyzes every source and writes the results to `settings.output.path`.
///
/// Ctrl-C stops the batch after the image that is currently being processed.
pub async fn run_batch(settings: &AppSettings, sources: &[ImageSource]) -> Result<BatchSummary> {
    let vision = &settings.vision;
    let analyzer = VisionClient::with_endpoint(&vision.endpoint)
        .api_key(settings.vision_api_key.clone())
        .api_version(vision.api_version.clone())
        .visual_features(vision.visual_features.clone())
        .connect_timeout(Duration::from_secs(vision.connect_timeout_secs))
        .request_timeout(Duration::from_secs(vision.request_timeout_secs))
        .build()?;
    let pacing =
        RandomPacing::from_millis(settings.pacing.min_delay_ms, settings.pacing.max_delay_ms)?;
    let access_issuer = settings.storage.as_ref().map(sas_issuer).transpose()?;

    let has_blobs = sources
        .iter()
        .any(|source| matches!(source, ImageSource::Blob(_)));
    if has_blobs && access_issuer.is_none() {
        warn!("Blob images are configured without storage settings, they will be skipped.");
    }

    let sink = FileSink::new(&settings.output.path);
    info!("Writing image descriptions to {}", sink.path().display());

    let mut pipeline = PipelineController::builder()
        .analyzer(analyzer)
        .pacing(pacing)
        .sink(sink)
        .maybe_access_issuer(access_issuer)
        .pace_after_last(settings.pacing.pace_after_last)
        .build();

    let cancel = CancellationToken::new();
    let ctrl_c = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("🛑 Ctrl-C received, stopping after the current image.");
                cancel.cancel();
            }
        }
    });

    let summary = pipeline.run_until_cancelled(sources, &cancel).await;
    ctrl_c.abort();

    Ok(summary?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use app_state::{LoggingSettings, OutputSettings, PacingSettings, VisionSettings};
    use vision_analysis::BlobLocation;

    fn settings(output: std::path::PathBuf) -> AppSettings {
        AppSettings {
            logging: LoggingSettings {
                level: "info".to_string(),
            },
            vision: VisionSettings {
                // Nothing listens here, every call fails fast.
                endpoint: "http://127.0.0.1:1".to_string(),
                api_version: "v3.1".to_string(),
                visual_features: vec!["Description".to_string()],
                connect_timeout_secs: 1,
                request_timeout_secs: 1,
            },
            vision_api_key: "key".to_string(),
            pacing: PacingSettings {
                min_delay_ms: 0,
                max_delay_ms: 0,
                pace_after_last: false,
            },
            output: OutputSettings { path: output },
            storage: None,
            images: vec![],
        }
    }

    #[tokio::test]
    async fn unreachable_endpoint_skips_images_but_creates_output() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let output = dir.path().join("descriptions/out.txt");
        let sources = [
            ImageSource::Url("https://x/a.jpg".to_string()),
            ImageSource::Blob(BlobLocation::new("private", "house.jpg")),
        ];

        let summary = run_batch(&settings(output.clone()), &sources).await?;

        assert_eq!(summary.recorded, 0);
        assert_eq!(summary.skipped, 2);
        assert!(!summary.cancelled);
        assert_eq!(std::fs::read_to_string(&output)?, "");
        Ok(())
    }
}
