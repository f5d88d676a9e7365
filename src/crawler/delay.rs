//! Randomized politeness delays
//!
//! Every wait draws a fresh duration uniformly from `[min, max]`, so request
//! spacing never settles into a fixed rhythm the server could fingerprint.

use rand::Rng;
use std::time::Duration;

use crate::error::{Error, Result};

/// Uniform random delay window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayWindow {
    min: Duration,
    max: Duration,
}

impl DelayWindow {
    /// Create a window from two durations
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `min` is greater than `max`
    pub fn new(min: Duration, max: Duration) -> Result<Self> {
        if min > max {
            return Err(Error::config(format!(
                "delay window minimum {min:?} exceeds maximum {max:?}"
            )));
        }
        Ok(Self { min, max })
    }

    /// Create a window from fractional seconds
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for negative, non-finite, or inverted bounds
    pub fn from_secs(min_secs: f64, max_secs: f64) -> Result<Self> {
        let min = Duration::try_from_secs_f64(min_secs)
            .map_err(|e| Error::config(format!("invalid delay minimum {min_secs}: {e}")))?;
        let max = Duration::try_from_secs_f64(max_secs)
            .map_err(|e| Error::config(format!("invalid delay maximum {max_secs}: {e}")))?;
        Self::new(min, max)
    }

    /// A window that never sleeps
    #[must_use]
    pub fn none() -> Self {
        Self {
            min: Duration::ZERO,
            max: Duration::ZERO,
        }
    }

    /// Draw the next delay
    #[must_use]
    pub fn sample(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let mut rng = rand::thread_rng();
        rng.gen_range(self.min..=self.max)
    }

    /// Sleep for a freshly sampled duration, returning how long it slept
    pub async fn wait(&self) -> Duration {
        let delay = self.sample();
        if !delay.is_zero() {
            tracing::debug!(delay_ms = delay.as_millis() as u64, "Waiting before next request");
            tokio::time::sleep(delay).await;
        }
        delay
    }
}

impl Default for DelayWindow {
    fn default() -> Self {
        Self::none()
    }
}
