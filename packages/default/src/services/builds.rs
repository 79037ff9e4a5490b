use crate::context::CallContext;
use crate::error::ClientError;
use crate::models::{Build, JobsetEval, JobsetEvalBuilds};
use crate::transport::Transport;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Poll interval used by [`BuildsService::wait_for_build`] when given zero.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct BuildsService {
    transport: Arc<Transport>,
}

/// A build together with whatever related data could be fetched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildInfo {
    pub build: Build,
    /// `None` when the constituents request failed.
    pub constituents: Option<Vec<Build>>,
    /// First evaluation the build belongs to, if it could be fetched.
    pub evaluation: Option<JobsetEval>,
}

impl BuildsService {
    pub fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    pub async fn get(&self, ctx: &CallContext, build_id: i64) -> Result<Build> {
        check_build_id(build_id)?;

        let build = self
            .transport
            .get::<Build>(ctx, &format!("/build/{build_id}"))
            .await
            .with_context(|| format!("failed to get build {build_id}"))?;
        Ok(build.unwrap_or_default())
    }

    /// Member builds of an aggregate job.
    pub async fn constituents(&self, ctx: &CallContext, build_id: i64) -> Result<Vec<Build>> {
        check_build_id(build_id)?;

        let builds = self
            .transport
            .get::<Vec<Build>>(ctx, &format!("/build/{build_id}/constituents"))
            .await
            .with_context(|| format!("failed to get constituents for build {build_id}"))?;
        Ok(builds.unwrap_or_default())
    }

    pub async fn evaluation(&self, ctx: &CallContext, eval_id: i64) -> Result<JobsetEval> {
        check_eval_id(eval_id)?;

        let eval = self
            .transport
            .get::<JobsetEval>(ctx, &format!("/eval/{eval_id}"))
            .await
            .with_context(|| format!("failed to get evaluation {eval_id}"))?;
        Ok(eval.unwrap_or_default())
    }

    pub async fn evaluation_builds(&self, ctx: &CallContext, eval_id: i64) -> Result<JobsetEvalBuilds> {
        check_eval_id(eval_id)?;

        let builds = self
            .transport
            .get::<JobsetEvalBuilds>(ctx, &format!("/eval/{eval_id}/builds"))
            .await
            .with_context(|| format!("failed to get builds for evaluation {eval_id}"))?;
        Ok(builds.unwrap_or_default())
    }

    /// Fetches a build plus its constituents and first evaluation.
    ///
    /// Only the build itself is mandatory; failures fetching the rest are
    /// logged and leave the corresponding field empty.
    pub async fn build_info(&self, ctx: &CallContext, build_id: i64) -> Result<BuildInfo> {
        let build = self.get(ctx, build_id).await?;

        let constituents = match self.constituents(ctx, build_id).await {
            Ok(builds) => Some(builds),
            Err(e) => {
                warn!("build {}: skipping constituents: {:#}", build_id, e);
                None
            }
        };

        let evaluation = match build.jobset_evals.first() {
            Some(&eval_id) => match self.evaluation(ctx, eval_id).await {
                Ok(eval) => Some(eval),
                Err(e) => {
                    warn!("build {}: skipping evaluation {}: {:#}", build_id, eval_id, e);
                    None
                }
            },
            None => None,
        };

        Ok(BuildInfo {
            build,
            constituents,
            evaluation,
        })
    }

    /// Polls until the build has finished or `ctx` fires.
    ///
    /// A zero `poll_interval` means [`DEFAULT_POLL_INTERVAL`]. Fetch errors end
    /// the wait immediately.
    pub async fn wait_for_build(
        &self,
        ctx: &CallContext,
        build_id: i64,
        poll_interval: Duration,
    ) -> Result<Build> {
        check_build_id(build_id)?;
        let interval = if poll_interval.is_zero() {
            DEFAULT_POLL_INTERVAL
        } else {
            poll_interval
        };

        loop {
            ctx.check()?;
            let build = self.get(ctx, build_id).await?;
            if build.finished {
                return Ok(build);
            }
            debug!("build {} not finished, polling again in {:?}", build_id, interval);
            ctx.sleep(interval).await?;
        }
    }
}

fn check_build_id(build_id: i64) -> Result<(), ClientError> {
    if build_id <= 0 {
        return Err(ClientError::validation(format!("invalid build ID: {build_id}")));
    }
    Ok(())
}

fn check_eval_id(eval_id: i64) -> Result<(), ClientError> {
    if eval_id <= 0 {
        return Err(ClientError::validation(format!(
            "invalid evaluation ID: {eval_id}"
        )));
    }
    Ok(())
}
