//! Per-host transfer results

use crate::error::TransferError;
use crate::traits::TransferStats;

/// Result of a copy on one host
#[derive(Debug)]
pub struct HostOutcome {
    pub host: String,
    pub result: Result<TransferStats, TransferError>,
}

impl HostOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Results of a copy across every targeted host
#[derive(Debug, Default)]
pub struct TransferReport {
    /// One entry per host, in resolution order
    pub outcomes: Vec<HostOutcome>,
}

impl TransferReport {
    /// True when every host succeeded
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(HostOutcome::is_success)
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &HostOutcome> {
        self.outcomes.iter().filter(|o| o.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &HostOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    /// Combined stats of the successful hosts
    pub fn totals(&self) -> TransferStats {
        let mut total = TransferStats::default();
        for stats in self.outcomes.iter().filter_map(|o| o.result.as_ref().ok()) {
            total += *stats;
        }
        total
    }
}
