use crate::{
    AccessUrlError, AccessUrlIssuer, BatchError, BlobLocation, ImageAnalyzer, ItemError,
    PacingPolicy, ResultRecord, ResultSink,
};
use bon::bon;
use std::borrow::Cow;
use std::fmt;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// One entry of the batch input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Publicly reachable (or already signed) url, analyzed as is.
    Url(String),
    /// Private blob, needs a signed url first.
    Blob(BlobLocation),
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url),
            Self::Blob(location) => write!(f, "blob {location}"),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub recorded: usize,
    /// Images that produced no result (access or analysis failure).
    pub skipped: usize,
    /// Analyzed images whose record could not be written.
    pub persistence_failures: usize,
    pub cancelled: bool,
}

/// Drives one batch run: analyze every image in order, persist what succeeded,
/// wait between calls.
pub struct PipelineController<A, P, S> {
    analyzer: A,
    pacing: P,
    sink: S,
    access_issuer: Option<Box<dyn AccessUrlIssuer>>,
    pace_after_last: bool,
}

#[bon]
impl<A, P, S> PipelineController<A, P, S>
where
    A: ImageAnalyzer,
    P: PacingPolicy,
    S: ResultSink,
{
    #[builder]
    pub fn new(
        analyzer: A,
        pacing: P,
        sink: S,
        access_issuer: Option<Box<dyn AccessUrlIssuer>>,
        #[builder(default = true)] pace_after_last: bool,
    ) -> Self {
        Self {
            analyzer,
            pacing,
            sink,
            access_issuer,
            pace_after_last,
        }
    }
}

impl<A, P, S> PipelineController<A, P, S>
where
    A: ImageAnalyzer,
    P: PacingPolicy,
    S: ResultSink,
{
    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub async fn run(&mut self, sources: &[ImageSource]) -> Result<BatchSummary, BatchError> {
        self.run_until_cancelled(sources, &CancellationToken::new())
            .await
    }

    /// Runs the batch, stopping early once `cancel` fires.
    ///
    /// Cancellation is only observed between images: before an analysis call starts,
    /// or while waiting out the pacing delay. A started image is always finished.
    ///
    /// # Errors
    ///
    /// Only when the output store cannot be initialized. Per-image failures are
    /// logged and counted in the returned [`BatchSummary`].
    pub async fn run_until_cancelled(
        &mut self,
        sources: &[ImageSource],
        cancel: &CancellationToken,
    ) -> Result<BatchSummary, BatchError> {
        self.sink.initialize().await?;
        info!("🚀 Starting batch of {} images", sources.len());

        let mut summary = BatchSummary::default();
        for (index, source) in sources.iter().enumerate() {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            match self.process(source).await {
                Ok(()) => {
                    summary.recorded += 1;
                    info!("✅ Successfully analyzed {source}");
                }
                Err(e @ ItemError::PersistenceFailed(_)) => {
                    summary.persistence_failures += 1;
                    warn!("⚠️ Dropped result for {source}: {e}");
                }
                Err(e) => {
                    summary.skipped += 1;
                    warn!("⚠️ Skipping {source}: {e}");
                }
            }

            let is_last = index + 1 == sources.len();
            if is_last && !self.pace_after_last {
                break;
            }
            let delay = self.pacing.delay();
            debug!("💤 Waiting {delay:?} before the next image");
            tokio::select! {
                () = sleep(delay) => {}
                () = cancel.cancelled() => {
                    summary.cancelled = !is_last;
                    break;
                }
            }
        }

        if summary.cancelled {
            warn!("🛑 Batch cancelled");
        }
        info!(
            "Batch finished: {} recorded, {} skipped, {} dropped",
            summary.recorded, summary.skipped, summary.persistence_failures
        );
        Ok(summary)
    }

    async fn process(&mut self, source: &ImageSource) -> Result<(), ItemError> {
        let reference = self
            .resolve(source)
            .await
            .map_err(ItemError::AccessIssuanceFailed)?;
        let result = self
            .analyzer
            .analyze(&reference)
            .await
            .map_err(ItemError::AnalysisFailed)?;
        self.sink
            .append(&ResultRecord::new(&reference, &result))
            .await
            .map_err(ItemError::PersistenceFailed)
    }

    async fn resolve<'a>(&self, source: &'a ImageSource) -> Result<Cow<'a, str>, AccessUrlError> {
        match source {
            ImageSource::Url(url) => Ok(Cow::Borrowed(url)),
            ImageSource::Blob(location) => match &self.access_issuer {
                Some(issuer) => issuer.issue(location).await.map(Cow::Owned),
                None => Err(AccessUrlError::NotConfigured(location.to_string())),
            },
        }
    }
}
