use crate::mix::BATCH_SIZE;
use std::time::Duration;

/// Sleep-based pacing for one worker.
///
/// Each worker aims at an even share of the aggregate target, so one batch
/// should take `BATCH_SIZE / (throughput / workers)` seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacer {
    target: Option<Duration>,
}

impl Pacer {
    pub fn new(throughput: Option<u64>, workers: usize) -> Self {
        let target = throughput.filter(|t| *t > 0).map(|t| {
            let per_worker = t as f64 / workers.max(1) as f64;
            Duration::from_secs_f64(BATCH_SIZE as f64 / per_worker)
        });
        Self { target }
    }

    pub fn target(&self) -> Option<Duration> {
        self.target
    }

    /// How long to sleep after a batch that took `elapsed`.
    pub fn remaining(&self, elapsed: Duration) -> Option<Duration> {
        self.target
            .map(|target| target.saturating_sub(elapsed))
            .filter(|rest| !rest.is_zero())
    }

    pub async fn pace(&self, elapsed: Duration) {
        if let Some(rest) = self.remaining(elapsed) {
            tokio::time::sleep(rest).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_is_even_share_of_throughput() {
        let pacer = Pacer::new(Some(1_000), 4);
        assert_eq!(pacer.target(), Some(Duration::from_millis(400)));
    }

    #[test]
    fn sleeps_only_the_remainder() {
        let pacer = Pacer::new(Some(1_000), 1);
        assert_eq!(
            pacer.remaining(Duration::from_millis(30)),
            Some(Duration::from_millis(70))
        );
        assert_eq!(pacer.remaining(Duration::from_millis(100)), None);
        assert_eq!(pacer.remaining(Duration::from_millis(250)), None);
    }

    #[test]
    fn unpaced_without_target() {
        let pacer = Pacer::new(None, 8);
        assert_eq!(pacer.target(), None);
        assert_eq!(pacer.remaining(Duration::ZERO), None);
    }

    #[tokio::test(start_paused = true)]
    async fn pace_waits_for_remainder() {
        let pacer = Pacer::new(Some(100), 1);
        let start = tokio::time::Instant::now();
        pacer.pace(Duration::from_millis(250)).await;
        assert_eq!(start.elapsed(), Duration::from_millis(750));
    }
}
