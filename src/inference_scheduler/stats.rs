use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;

pub const REPORTED_PERCENTILES: [u8; 4] = [50, 90, 95, 99];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PercentileMs {
    pub percentile: u8,
    pub ms: f64,
}

/// Sliding window over the most recent scoring latencies.
pub struct LatencyStats {
    window: usize,
    samples: Mutex<VecDeque<f64>>,
}

impl LatencyStats {
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            samples: Mutex::new(VecDeque::new()),
        }
    }

    pub fn record(&self, elapsed_ms: f64) {
        let mut samples = self.samples.lock();
        if samples.len() >= self.window {
            samples.pop_front();
        }
        samples.push_back(elapsed_ms);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.samples.lock().len()
    }

    /// Nearest-rank percentiles. Empty while nothing has been recorded.
    pub fn percentiles(&self, percentiles: &[u8]) -> Vec<PercentileMs> {
        let mut sorted: Vec<f64> = self.samples.lock().iter().copied().collect();
        if sorted.is_empty() {
            return vec![];
        }
        sorted.sort_by(f64::total_cmp);

        percentiles
            .iter()
            .map(|&percentile| {
                let rank = (percentile as usize * sorted.len()).div_ceil(100);
                let index = rank.clamp(1, sorted.len()) - 1;
                PercentileMs {
                    percentile,
                    ms: sorted[index],
                }
            })
            .collect()
    }
}
