use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Suspension point used between retry attempts and between wallets.
#[async_trait]
pub trait Pause: Send + Sync {
    async fn pause(&self, duration: Duration);
}

pub struct TokioPause;

#[async_trait]
impl Pause for TokioPause {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Longest inter-wallet delay accepted, one day.
pub const MAX_DELAY_SECS: u64 = 86_400;

/// Inclusive range of whole seconds to wait between wallets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    from: u64,
    to: u64,
}

impl DelayRange {
    pub fn new(from: u64, to: u64) -> AppResult<Self> {
        if from > to {
            return Err(AppError::InvalidInput(format!(
                "delay range is empty: {}s > {}s",
                from, to
            )));
        }
        if to > MAX_DELAY_SECS {
            return Err(AppError::InvalidInput(format!(
                "delay of {}s exceeds the {}s limit",
                to, MAX_DELAY_SECS
            )));
        }
        Ok(Self { from, to })
    }

    /// Uniform draw at millisecond resolution
    pub fn draw(&self) -> Duration {
        let millis = rand::rng().random_range(self.from * 1000..=self.to * 1000);
        Duration::from_millis(millis)
    }
}
