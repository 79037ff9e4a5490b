use crate::error::ClientError;
use crate::models::{Build, BuildStatus};

/// Conjunction of optional build predicates plus a result limit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildFilter {
    pub project: Option<String>,
    pub jobset: Option<String>,
    pub job: Option<String>,
    pub system: Option<String>,
    pub finished: Option<bool>,
    /// Matches only builds that carry this exact status.
    pub status: Option<BuildStatus>,
    /// Zero means unlimited.
    pub limit: usize,
}

impl BuildFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn with_jobset(mut self, jobset: impl Into<String>) -> Self {
        self.jobset = Some(jobset.into());
        self
    }

    pub fn with_job(mut self, job: impl Into<String>) -> Self {
        self.job = Some(job.into());
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_finished(mut self, finished: bool) -> Self {
        self.finished = Some(finished);
        self
    }

    pub fn with_status(mut self, status: BuildStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn matches(&self, build: &Build) -> bool {
        fn field_ok(wanted: &Option<String>, actual: &str) -> bool {
            wanted.as_deref().is_none_or(|w| w == actual)
        }

        field_ok(&self.project, &build.project)
            && field_ok(&self.jobset, &build.jobset)
            && field_ok(&self.job, &build.job)
            && field_ok(&self.system, &build.system)
            && self.finished.is_none_or(|f| f == build.finished)
            && self.status.is_none_or(|s| build.build_status == Some(s))
    }
}

/// Builds satisfying every predicate of `filter`, in input order, truncated
/// to `filter.limit` after filtering.
pub fn filter_builds(builds: &[Build], filter: &BuildFilter) -> Vec<Build> {
    let limit = if filter.limit == 0 {
        usize::MAX
    } else {
        filter.limit
    };
    builds
        .iter()
        .filter(|build| filter.matches(build))
        .take(limit)
        .cloned()
        .collect()
}

/// Parses a user-supplied build id; only positive integers are accepted.
pub fn parse_build_id(raw: &str) -> Result<i64, ClientError> {
    let id: i64 = raw
        .parse()
        .map_err(|e| ClientError::validation(format!("invalid build ID '{raw}': {e}")))?;
    if id <= 0 {
        return Err(ClientError::validation(format!(
            "build ID must be positive: {id}"
        )));
    }
    Ok(id)
}

pub fn build_url(base_url: &str, build_id: i64) -> String {
    format!("{base_url}/build/{build_id}")
}

pub fn evaluation_url(base_url: &str, eval_id: i64) -> String {
    format!("{base_url}/eval/{eval_id}")
}
