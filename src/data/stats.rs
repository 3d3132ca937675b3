//! Aggregate statistics over a run's timing records.

use serde::Serialize;

use super::record::TimingRecord;

/// Count, mean and range of one elapsed-time metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricStats {
    pub count: usize,
    pub average: f64,
    pub min: f64,
    pub max: f64,
}

impl MetricStats {
    /// Compute stats over the given values, or `None` when there are none.
    pub fn from_values<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        // Summed in sorted order so the mean does not depend on completion order.
        let mut values: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
        values.sort_by(f64::total_cmp);

        let (&min, &max) = (values.first()?, values.last()?);
        let count = values.len();
        let sum: f64 = values.iter().sum();

        // Keep min <= average <= max despite float rounding in the sum.
        let average = (sum / count as f64).clamp(min, max);

        Some(Self {
            count,
            average,
            min,
            max,
        })
    }
}

/// Success tally plus per-metric stats for a whole run.
///
/// Metrics with no observed values stay `None` rather than being zero-filled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_to_running: Option<MetricStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_to_reachable: Option<MetricStats>,
}

impl RunSummary {
    /// Reduce a set of records. Order of the records does not matter.
    pub fn from_records(records: &[TimingRecord]) -> Self {
        let total = records.len();
        let successful = records.iter().filter(|r| r.succeeded()).count();

        Self {
            total,
            successful,
            failed: total - successful,
            time_to_running: MetricStats::from_values(
                records.iter().filter_map(TimingRecord::time_to_running),
            ),
            time_to_reachable: MetricStats::from_values(
                records.iter().filter_map(TimingRecord::time_to_reachable),
            ),
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }

    /// Process exit code for scripts and CI: 0 when every target recovered.
    pub fn exit_code(&self) -> i32 {
        if self.all_succeeded() {
            0
        } else {
            1
        }
    }
}
