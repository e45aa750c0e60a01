//! Simulated reading/typing delays
//!
//! All durations handed to [`Pacer`] are in simulated time. The pacer maps
//! them to wall-clock time by dividing by the configured acceleration factor.

use crate::config::SimConfig;
use std::sync::Arc;
use std::time::Duration;

/// Delay service shared by the participants of one process
#[derive(Debug, Clone)]
pub struct Pacer {
    config: Arc<SimConfig>,
}

impl Pacer {
    pub fn new(config: Arc<SimConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Wall-clock time a simulated duration takes
    pub fn wall_time(&self, simulated: Duration) -> Duration {
        let factor = self.config.acceleration_factor;
        if factor == 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(simulated.as_secs_f64() / factor).unwrap_or(Duration::MAX)
    }

    /// Simulated time that has passed during a wall-clock duration
    pub fn simulated_time(&self, wall: Duration) -> Duration {
        Duration::try_from_secs_f64(wall.as_secs_f64() * self.config.acceleration_factor)
            .unwrap_or(Duration::MAX)
    }

    /// Suspend the calling task for `duration` of simulated time.
    ///
    /// The wait always runs to completion; only process shutdown ends it early.
    pub async fn wait(&self, duration: Duration, reason: &str) {
        let wall = self.wall_time(duration);
        tracing::debug!(
            simulated_ms = duration.as_millis(),
            wall_ms = wall.as_millis(),
            reason,
            "Going to sleep"
        );
        if !wall.is_zero() {
            tokio::time::sleep(wall).await;
        }
        tracing::debug!(wall_ms = wall.as_millis(), reason, "Completed sleeping");
    }
}

/// Clamp a requested wait to whatever is left of the response budget.
///
/// `elapsed` is the simulated time since the participant last left IDLE.
/// Without a budget the request is returned unchanged.
pub fn clamp_to_budget(
    requested: Duration,
    max_response: Option<Duration>,
    elapsed: Duration,
) -> Duration {
    match max_response {
        Some(max) => requested.min(max.saturating_sub(elapsed)),
        None => requested,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    fn pacer(factor: f64) -> Pacer {
        Pacer::new(Arc::new(SimConfig {
            acceleration_factor: factor,
            ..SimConfig::default()
        }))
    }

    #[test]
    fn test_wall_time_scales_by_factor() {
        assert_eq!(pacer(1.0).wall_time(Duration::from_secs(4)), Duration::from_secs(4));
        assert_eq!(pacer(4.0).wall_time(Duration::from_secs(4)), Duration::from_secs(1));
        assert_eq!(pacer(0.5).wall_time(Duration::from_secs(1)), Duration::from_secs(2));
    }

    #[test]
    fn test_zero_factor_skips_waits() {
        assert_eq!(pacer(0.0).wall_time(Duration::from_secs(100)), Duration::ZERO);
    }

    #[test]
    fn test_simulated_time_inverts_wall_time() {
        let p = pacer(10.0);
        assert_eq!(p.simulated_time(Duration::from_secs(1)), Duration::from_secs(10));
    }

    #[test]
    fn test_clamp_to_budget() {
        let max = Some(Duration::from_secs(60));
        assert_eq!(
            clamp_to_budget(Duration::from_secs(5), max, Duration::from_secs(10)),
            Duration::from_secs(5)
        );
        assert_eq!(
            clamp_to_budget(Duration::from_secs(30), max, Duration::from_secs(50)),
            Duration::from_secs(10)
        );
        // Budget exhausted
        assert_eq!(
            clamp_to_budget(Duration::from_secs(30), max, Duration::from_secs(90)),
            Duration::ZERO
        );
        // No governor
        assert_eq!(
            clamp_to_budget(Duration::from_secs(30), None, Duration::from_secs(90)),
            Duration::from_secs(30)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_sleeps_scaled_duration() {
        let p = pacer(2.0);
        let start = Instant::now();
        p.wait(Duration::from_secs(10), "test").await;
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }
}
