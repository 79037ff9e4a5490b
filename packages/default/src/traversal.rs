//! Helpers that walk evaluations across several requests.

use crate::context::CallContext;
use crate::error::ClientError;
use crate::models::{Build, JobsetEval};
use crate::services::{BuildsService, JobsetsService};
use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Delay between evaluation polls in [`wait_for_jobset_evaluation`].
pub const EVALUATION_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Most recent build of `job`, searching evaluations in the order Hydra
/// lists them.
///
/// Evaluations whose builds cannot be fetched are skipped. Fails with
/// [`ClientError::NoBuildForJob`] when no evaluation contains the job.
pub async fn latest_build_for_job(
    jobsets: &JobsetsService,
    builds: &BuildsService,
    ctx: &CallContext,
    project: &str,
    jobset: &str,
    job: &str,
) -> Result<Build> {
    let evals = jobsets.evaluations(ctx, project, jobset).await?;

    for eval in evals.iter() {
        let pages = match builds.evaluation_builds(ctx, eval.id).await {
            Ok(pages) => pages,
            Err(e) => {
                // cancellation must not be mistaken for a broken evaluation
                ctx.check()?;
                warn!("skipping evaluation {}: {:#}", eval.id, e);
                continue;
            }
        };

        let found = pages
            .into_iter()
            .flat_map(|page| page.into_values())
            .find(|build| build.job == job);
        if let Some(build) = found {
            return Ok(build);
        }
    }

    Err(ClientError::NoBuildForJob(job.to_string()).into())
}

/// Triggers `project:jobset` and waits for a new evaluation that produced
/// builds.
///
/// Polls every [`EVALUATION_POLL_INTERVAL`]. Fails with
/// [`ClientError::EvaluationTimeout`] once `timeout` has elapsed.
pub async fn wait_for_jobset_evaluation(
    jobsets: &JobsetsService,
    ctx: &CallContext,
    project: &str,
    jobset: &str,
    timeout: Duration,
) -> Result<JobsetEval> {
    wait_for_evaluation_every(jobsets, ctx, project, jobset, timeout, EVALUATION_POLL_INTERVAL)
        .await
}

pub(crate) async fn wait_for_evaluation_every(
    jobsets: &JobsetsService,
    ctx: &CallContext,
    project: &str,
    jobset: &str,
    timeout: Duration,
    interval: Duration,
) -> Result<JobsetEval> {
    jobsets
        .trigger_single(ctx, project, jobset)
        .await
        .context("failed to trigger evaluation")?;
    info!("waiting up to {:?} for an evaluation of {}:{}", timeout, project, jobset);

    let wait = ctx.child_with_timeout(timeout);
    let mut last_eval_id = 0;

    loop {
        wait.sleep(interval)
            .await
            .map_err(|e| wait_error(ctx, e))?;

        let evals = match jobsets.evaluations(&wait, project, jobset).await {
            Ok(evals) => evals,
            Err(e) => {
                wait.check().map_err(|e| wait_error(ctx, e))?;
                debug!("polling evaluations of {}:{} failed: {:#}", project, jobset, e);
                continue;
            }
        };

        for eval in evals.iter() {
            if eval.id > last_eval_id {
                if !eval.builds.is_empty() {
                    return Ok(eval.clone());
                }
                last_eval_id = eval.id;
            }
        }
    }
}

/// The child context fired: the caller's own cancellation or deadline
/// wins, otherwise our timeout did.
fn wait_error(parent: &CallContext, fired: ClientError) -> anyhow::Error {
    match parent.check() {
        Err(e) => e.into(),
        Ok(()) => match fired {
            ClientError::DeadlineExceeded => ClientError::EvaluationTimeout.into(),
            other => other.into(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;
    use crate::transport::Transport;
    use std::sync::Arc;

    async fn services() -> (JobsetsService, BuildsService, Arc<test_support::MockHydra>) {
        let (base, mock) = test_support::spawn().await;
        let transport = Arc::new(Transport::new(&base, "test", Duration::from_secs(10)).unwrap());
        (
            JobsetsService::new(transport.clone()),
            BuildsService::new(transport),
            mock,
        )
    }

    #[tokio::test]
    async fn test_latest_build_skips_broken_evaluations() {
        let (jobsets, builds, _) = services().await;
        let ctx = CallContext::new();

        let build = latest_build_for_job(&jobsets, &builds, &ctx, "nixpkgs", "trunk", "hello")
            .await
            .unwrap();
        assert_eq!(build.id, 123);

        let build = latest_build_for_job(&jobsets, &builds, &ctx, "nixpkgs", "trunk", "failing")
            .await
            .unwrap();
        assert_eq!(build.id, 124);
    }

    #[tokio::test]
    async fn test_latest_build_missing_job() {
        let (jobsets, builds, _) = services().await;
        let err = latest_build_for_job(
            &jobsets,
            &builds,
            &CallContext::new(),
            "nixpkgs",
            "trunk",
            "nonexistent",
        )
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), "no build found for job nonexistent");
        assert!(matches!(
            ClientError::find(&err),
            Some(ClientError::NoBuildForJob(job)) if job == "nonexistent"
        ));
    }

    #[tokio::test]
    async fn test_latest_build_propagates_evaluations_failure() {
        let (jobsets, builds, _) = services().await;
        let err = latest_build_for_job(
            &jobsets,
            &builds,
            &CallContext::new(),
            "",
            "trunk",
            "hello",
        )
        .await
        .unwrap_err();
        assert!(ClientError::find(&err).unwrap().is_validation());
    }

    #[tokio::test]
    async fn test_wait_returns_first_new_evaluation_with_builds() {
        let (jobsets, _, mock) = services().await;
        let eval = wait_for_evaluation_every(
            &jobsets,
            &CallContext::new(),
            "nixpkgs",
            "pending",
            Duration::from_secs(5),
            Duration::from_millis(20),
        )
        .await
        .unwrap();

        assert_eq!(eval.id, 8);
        assert_eq!(eval.builds, vec![800, 801]);
        let triggered = mock.requests.lock()[0].clone();
        assert_eq!(triggered.uri, "/api/push?jobsets=nixpkgs%3Apending");
        let pushes = mock
            .requests
            .lock()
            .iter()
            .filter(|r| r.uri.starts_with("/api/push"))
            .count();
        assert_eq!(pushes, 1);
    }

    #[tokio::test]
    async fn test_wait_times_out() {
        let (jobsets, _, _) = services().await;
        let err = wait_for_evaluation_every(
            &jobsets,
            &CallContext::new(),
            "nixpkgs",
            "stalled",
            Duration::from_millis(200),
            Duration::from_millis(20),
        )
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), "timeout waiting for evaluation");
        assert!(matches!(
            ClientError::find(&err),
            Some(ClientError::EvaluationTimeout)
        ));
    }

    #[tokio::test]
    async fn test_wait_ignores_older_evaluations_listed_later() {
        let (jobsets, _, _) = services().await;
        let err = wait_for_evaluation_every(
            &jobsets,
            &CallContext::new(),
            "nixpkgs",
            "shuffled",
            Duration::from_millis(200),
            Duration::from_millis(20),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            ClientError::find(&err),
            Some(ClientError::EvaluationTimeout)
        ));
    }

    #[tokio::test]
    async fn test_wait_reports_caller_cancellation() {
        let (jobsets, _, _) = services().await;
        let ctx = CallContext::new();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            canceller.cancel();
        });

        let err = wait_for_evaluation_every(
            &jobsets,
            &ctx,
            "nixpkgs",
            "stalled",
            Duration::from_secs(30),
            Duration::from_millis(20),
        )
        .await
        .unwrap_err();
        assert!(matches!(ClientError::find(&err), Some(ClientError::Cancelled)));
    }

    #[tokio::test]
    async fn test_wait_trigger_validation() {
        let (jobsets, _, mock) = services().await;
        let err = wait_for_jobset_evaluation(
            &jobsets,
            &CallContext::new(),
            "nixpkgs",
            "",
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), "failed to trigger evaluation");
        assert!(ClientError::find(&err).unwrap().is_validation());
        assert_eq!(mock.request_count(), 0);
    }
}
