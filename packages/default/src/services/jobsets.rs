use crate::context::CallContext;
use crate::error::{ClientError, require};
use crate::models::{
    Evaluations, Jobset, JobsetInput, JobsetOverview, JobsetState, ProjectResponse, PushResponse,
    ShieldData,
};
use crate::transport::{Transport, escape};
use anyhow::{Context, Result};
use indexmap::IndexMap;
use reqwest::Method;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone)]
pub struct JobsetsService {
    transport: Arc<Transport>,
}

impl JobsetsService {
    pub fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    pub async fn list(&self, ctx: &CallContext, project_id: &str) -> Result<JobsetOverview> {
        require(project_id, "project ID")?;

        let path = format!("/api/jobsets?project={}", escape(project_id));
        let overview = self
            .transport
            .get::<JobsetOverview>(ctx, &path)
            .await
            .with_context(|| format!("failed to list jobsets for project {project_id}"))?;
        Ok(overview.unwrap_or_default())
    }

    pub async fn get(&self, ctx: &CallContext, project_id: &str, jobset_id: &str) -> Result<Jobset> {
        let path = jobset_path(project_id, jobset_id)?;
        let jobset = self
            .transport
            .get::<Jobset>(ctx, &path)
            .await
            .with_context(|| format!("failed to get jobset {project_id}/{jobset_id}"))?;
        Ok(jobset.unwrap_or_default())
    }

    /// Creates or replaces a jobset.
    pub async fn create(
        &self,
        ctx: &CallContext,
        project_id: &str,
        jobset_id: &str,
        jobset: &Jobset,
    ) -> Result<ProjectResponse> {
        let path = jobset_path(project_id, jobset_id)?;
        let response = self
            .transport
            .execute::<ProjectResponse, _>(ctx, Method::PUT, &path, Some(jobset))
            .await
            .with_context(|| format!("failed to create jobset {project_id}/{jobset_id}"))?;
        Ok(response.unwrap_or_default())
    }

    pub async fn update(
        &self,
        ctx: &CallContext,
        project_id: &str,
        jobset_id: &str,
        jobset: &Jobset,
    ) -> Result<ProjectResponse> {
        self.create(ctx, project_id, jobset_id, jobset).await
    }

    pub async fn delete(&self, ctx: &CallContext, project_id: &str, jobset_id: &str) -> Result<()> {
        let path = jobset_path(project_id, jobset_id)?;
        self.transport
            .execute::<ProjectResponse, ()>(ctx, Method::DELETE, &path, None)
            .await
            .with_context(|| format!("failed to delete jobset {project_id}/{jobset_id}"))?;
        Ok(())
    }

    pub async fn evaluations(
        &self,
        ctx: &CallContext,
        project_id: &str,
        jobset_id: &str,
    ) -> Result<Evaluations> {
        let path = format!("{}/evals", jobset_path(project_id, jobset_id)?);
        let evals = self
            .transport
            .get::<Evaluations>(ctx, &path)
            .await
            .with_context(|| {
                format!("failed to get evaluations for jobset {project_id}/{jobset_id}")
            })?;
        Ok(evals.unwrap_or_default())
    }

    /// Schedules evaluation of each `project:jobset` reference.
    ///
    /// Every reference is checked before anything is sent.
    pub async fn trigger<S: AsRef<str>>(&self, ctx: &CallContext, jobsets: &[S]) -> Result<PushResponse> {
        if jobsets.is_empty() {
            return Err(ClientError::validation("at least one jobset is required").into());
        }
        for jobset in jobsets {
            let jobset = jobset.as_ref();
            if !is_valid_jobset_ref(jobset) {
                return Err(ClientError::validation(format!(
                    "invalid jobset format '{jobset}', expected 'project:jobset'"
                ))
                .into());
            }
        }

        let joined = jobsets
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<&str>>()
            .join(",");
        let path = format!("/api/push?jobsets={}", escape(&joined));
        let response = self
            .transport
            .execute::<PushResponse, ()>(ctx, Method::POST, &path, None)
            .await
            .with_context(|| format!("failed to trigger jobsets {joined}"))?
            .unwrap_or_default();

        info!("triggered {}", response.jobsets_triggered.join(", "));
        Ok(response)
    }

    pub async fn trigger_single(
        &self,
        ctx: &CallContext,
        project_id: &str,
        jobset_id: &str,
    ) -> Result<PushResponse> {
        require(project_id, "project ID")?;
        require(jobset_id, "jobset ID")?;
        self.trigger(ctx, &[format!("{project_id}:{jobset_id}")]).await
    }

    pub async fn create_with_options(
        &self,
        ctx: &CallContext,
        project_id: &str,
        jobset_id: &str,
        options: JobsetOptions,
    ) -> Result<ProjectResponse> {
        let jobset = options.build()?;
        self.create(ctx, project_id, jobset_id, &jobset).await
    }

    /// Badge payload for one job, in shields.io endpoint format.
    pub async fn shield_data(
        &self,
        ctx: &CallContext,
        project_id: &str,
        jobset_id: &str,
        job_id: &str,
    ) -> Result<ShieldData> {
        require(project_id, "project ID")?;
        require(jobset_id, "jobset ID")?;
        require(job_id, "job ID")?;

        let path = format!(
            "/job/{}/{}/{}/shield",
            escape(project_id),
            escape(jobset_id),
            escape(job_id)
        );
        let shield = self
            .transport
            .get::<ShieldData>(ctx, &path)
            .await
            .with_context(|| {
                format!("failed to get shield data for {project_id}/{jobset_id}/{job_id}")
            })?;
        Ok(shield.unwrap_or_default())
    }
}

fn jobset_path(project_id: &str, jobset_id: &str) -> Result<String, ClientError> {
    require(project_id, "project ID")?;
    require(jobset_id, "jobset ID")?;
    Ok(format!("/jobset/{}/{}", escape(project_id), escape(jobset_id)))
}

/// `project:jobset`, split on the first colon, both halves non-empty.
fn is_valid_jobset_ref(jobset: &str) -> bool {
    matches!(jobset.split_once(':'), Some((project, name)) if !project.is_empty() && !name.is_empty())
}

/// Accumulates the fields of a [`Jobset`] definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobsetOptions {
    pub name: String,
    pub project: String,
    pub description: String,
    pub nix_expr_input: String,
    pub nix_expr_path: String,
    pub flake: String,
    pub state: JobsetState,
    pub enable_email: bool,
    pub email_override: String,
    pub enable_dynamic_run_command: bool,
    pub visible: bool,
    pub keep_nr: i32,
    pub check_interval: i32,
    pub scheduling_shares: i32,
    pub inputs: IndexMap<String, JobsetInput>,
}

impl JobsetOptions {
    pub fn new(name: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            project: project.into(),
            description: String::new(),
            nix_expr_input: String::new(),
            nix_expr_path: String::new(),
            flake: String::new(),
            state: JobsetState::Enabled,
            enable_email: false,
            email_override: String::new(),
            enable_dynamic_run_command: false,
            visible: true,
            keep_nr: 3,
            check_interval: 300,
            scheduling_shares: 100,
            inputs: IndexMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Legacy (non-flake) entry point: input name plus path inside it.
    pub fn with_nix_expression(mut self, input: impl Into<String>, path: impl Into<String>) -> Self {
        self.nix_expr_input = input.into();
        self.nix_expr_path = path.into();
        self
    }

    pub fn with_flake(mut self, flake: impl Into<String>) -> Self {
        self.flake = flake.into();
        self
    }

    pub fn with_state(mut self, state: JobsetState) -> Self {
        self.state = state;
        self
    }

    pub fn with_email(mut self, enable: bool, email_override: impl Into<String>) -> Self {
        self.enable_email = enable;
        self.email_override = email_override.into();
        self
    }

    pub fn with_scheduling(mut self, check_interval: i32, scheduling_shares: i32) -> Self {
        self.check_interval = check_interval;
        self.scheduling_shares = scheduling_shares;
        self
    }

    pub fn with_keep_nr(mut self, keep_nr: i32) -> Self {
        self.keep_nr = keep_nr;
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_dynamic_run_command(mut self, enabled: bool) -> Self {
        self.enable_dynamic_run_command = enabled;
        self
    }

    /// Adds or replaces the input called `name`.
    pub fn add_input(
        mut self,
        name: impl Into<String>,
        kind: impl Into<String>,
        value: impl Into<String>,
        email_responsible: bool,
    ) -> Self {
        let name = name.into();
        self.inputs.insert(
            name.clone(),
            JobsetInput {
                name,
                value: value.into(),
                kind: kind.into(),
                email_responsible,
            },
        );
        self
    }

    pub fn build(self) -> Result<Jobset, ClientError> {
        require(&self.name, "jobset name")?;
        require(&self.project, "project name")?;

        let mut jobset = Jobset {
            name: self.name,
            project: self.project,
            description: non_empty(self.description),
            nix_expr_input: non_empty(self.nix_expr_input),
            nix_expr_path: non_empty(self.nix_expr_path),
            flake: non_empty(self.flake),
            enable_email: self.enable_email,
            email_override: self.email_override,
            enable_dynamic_run_command: self.enable_dynamic_run_command,
            visible: self.visible,
            keep_nr: self.keep_nr,
            check_interval: self.check_interval,
            scheduling_shares: self.scheduling_shares,
            inputs: self.inputs,
            ..Default::default()
        };
        jobset.set_state(self.state);
        Ok(jobset)
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}
