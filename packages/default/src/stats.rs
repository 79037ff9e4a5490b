use crate::models::{Build, BuildStatus};
use serde::Serialize;

/// Outcome counts over a set of builds. The buckets always sum to `total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuildStatistics {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub aborted: usize,
    pub timed_out: usize,
    pub in_progress: usize,
    /// Finished builds with no status or a status this client does not know.
    pub other: usize,
}

impl BuildStatistics {
    /// Percentage of builds that succeeded, 0 for an empty set.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.succeeded as f64 / self.total as f64 * 100.0
    }
}

pub fn calculate_statistics<'a, I>(builds: I) -> BuildStatistics
where
    I: IntoIterator<Item = &'a Build>,
{
    let mut stats = BuildStatistics::default();

    for build in builds {
        stats.total += 1;
        if !build.finished {
            stats.in_progress += 1;
            continue;
        }

        match build.build_status {
            Some(BuildStatus::Success) => stats.succeeded += 1,
            Some(
                BuildStatus::Failed
                | BuildStatus::DependencyFailed
                | BuildStatus::FailedWithOutput
                | BuildStatus::LogSizeLimitExceeded
                | BuildStatus::OutputSizeLimitExceeded,
            ) => stats.failed += 1,
            Some(BuildStatus::Aborted | BuildStatus::AbortedAlt | BuildStatus::CanceledByUser) => {
                stats.aborted += 1
            }
            Some(BuildStatus::TimedOut) => stats.timed_out += 1,
            Some(BuildStatus::Unknown(_)) | None => stats.other += 1,
        }
    }

    stats
}
