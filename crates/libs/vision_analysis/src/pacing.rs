use crate::PacingError;
use std::time::Duration;

/// Decides how long to wait after one image before starting the next.
pub trait PacingPolicy: Send {
    fn delay(&mut self) -> Duration;
}

/// Uniformly random delay with millisecond granularity, bounds inclusive.
#[derive(Debug, Clone)]
pub struct RandomPacing {
    min_ms: u64,
    max_ms: u64,
    rng: fastrand::Rng,
}

impl RandomPacing {
    pub fn new(min: Duration, max: Duration) -> Result<Self, PacingError> {
        Self::from_millis(duration_millis(min), duration_millis(max))
    }

    pub fn from_millis(min_ms: u64, max_ms: u64) -> Result<Self, PacingError> {
        if min_ms > max_ms {
            return Err(PacingError::InvertedRange { min_ms, max_ms });
        }
        Ok(Self {
            min_ms,
            max_ms,
            rng: fastrand::Rng::new(),
        })
    }

    /// Same as [`RandomPacing::from_millis`], with a reproducible sequence.
    pub fn with_seed(min_ms: u64, max_ms: u64, seed: u64) -> Result<Self, PacingError> {
        let mut pacing = Self::from_millis(min_ms, max_ms)?;
        pacing.rng = fastrand::Rng::with_seed(seed);
        Ok(pacing)
    }
}

impl PacingPolicy for RandomPacing {
    fn delay(&mut self) -> Duration {
        Duration::from_millis(self.rng.u64(self.min_ms..=self.max_ms))
    }
}

/// Always waits the same amount.
#[derive(Debug, Clone, Copy)]
pub struct FixedPacing(pub Duration);

impl PacingPolicy for FixedPacing {
    fn delay(&mut self) -> Duration {
        self.0
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
