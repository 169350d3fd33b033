//! Inter-delete pacing against the coordination service.

use std::time::Duration;

/// Fixed delay inserted after each delete so a large cleanup does not
/// flood the ensemble. Reads are never paced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeletePacing {
    delay: Duration,
}

impl DeletePacing {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn none() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

impl Default for DeletePacing {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_one_second() {
        assert_eq!(DeletePacing::default().delay(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn pause_sleeps_for_configured_delay() {
        let start = tokio::time::Instant::now();
        DeletePacing::new(Duration::from_millis(250)).pause().await;
        assert!(start.elapsed() >= Duration::from_millis(250));
    }
}
