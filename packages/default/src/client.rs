use crate::config::ClientConfig;
use crate::context::CallContext;
use crate::error::ClientError;
use crate::models::{
    Build, CreateProjectRequest, Evaluations, Jobset, JobsetEval, JobsetEvalBuilds,
    JobsetOverview, Project, ProjectResponse, PushResponse, SearchResult, ShieldData, User,
};
use crate::services::{
    AuthService, BuildInfo, BuildsService, JobsetOptions, JobsetsService, ProjectOptions,
    ProjectsService, SearchOptions, SearchService,
};
use crate::transport::Transport;
use crate::traversal;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

/// Entry point to a Hydra instance.
///
/// Every service shares one [`Transport`], so a login through
/// [`auth`](Self::auth) authenticates all of them.
#[derive(Debug, Clone)]
pub struct HydraClient {
    transport: Arc<Transport>,
    auth: AuthService,
    projects: ProjectsService,
    jobsets: JobsetsService,
    builds: BuildsService,
    search: SearchService,
}

impl HydraClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let transport = Arc::new(Transport::new(
            &config.base_url,
            &config.user_agent,
            config.timeout,
        )?);

        Ok(Self {
            auth: AuthService::new(transport.clone()),
            projects: ProjectsService::new(transport.clone()),
            jobsets: JobsetsService::new(transport.clone()),
            builds: BuildsService::new(transport.clone()),
            search: SearchService::new(transport.clone()),
            transport,
        })
    }

    /// Default settings pointed at `base_url`.
    pub fn with_url(base_url: &str) -> Result<Self, ClientError> {
        Self::new(ClientConfig::default().with_base_url(base_url))
    }

    /// Client for the public hydra.nixos.org instance.
    pub fn nixos() -> Result<Self, ClientError> {
        Self::new(ClientConfig::default())
    }

    pub fn base_url(&self) -> String {
        self.transport.base_url()
    }

    pub fn set_base_url(&self, base_url: &str) -> Result<(), ClientError> {
        self.transport.set_base_url(base_url)
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    pub fn projects(&self) -> &ProjectsService {
        &self.projects
    }

    pub fn jobsets(&self) -> &JobsetsService {
        &self.jobsets
    }

    pub fn builds(&self) -> &BuildsService {
        &self.builds
    }

    pub fn search_service(&self) -> &SearchService {
        &self.search
    }

    // auth

    pub async fn login(&self, ctx: &CallContext, username: &str, password: &str) -> Result<User> {
        self.auth.login(ctx, username, password).await
    }

    pub fn logout(&self) {
        self.auth.logout()
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth.is_authenticated()
    }

    pub fn current_user(&self) -> Option<String> {
        self.auth.current_user()
    }

    // projects

    pub async fn list_projects(&self, ctx: &CallContext) -> Result<Vec<Project>> {
        self.projects.list(ctx).await
    }

    pub async fn get_project(&self, ctx: &CallContext, project_id: &str) -> Result<Project> {
        self.projects.get(ctx, project_id).await
    }

    pub async fn create_project(
        &self,
        ctx: &CallContext,
        project_id: &str,
        request: &CreateProjectRequest,
    ) -> Result<ProjectResponse> {
        self.projects.create(ctx, project_id, request).await
    }

    pub async fn create_project_with_options(
        &self,
        ctx: &CallContext,
        project_id: &str,
        options: ProjectOptions,
    ) -> Result<ProjectResponse> {
        self.projects.create_with_options(ctx, project_id, options).await
    }

    pub async fn update_project(
        &self,
        ctx: &CallContext,
        project_id: &str,
        request: &CreateProjectRequest,
    ) -> Result<ProjectResponse> {
        self.projects.update(ctx, project_id, request).await
    }

    pub async fn delete_project(&self, ctx: &CallContext, project_id: &str) -> Result<()> {
        self.projects.delete(ctx, project_id).await
    }

    /// A project together with the overview of its jobsets.
    pub async fn project_with_jobsets(
        &self,
        ctx: &CallContext,
        project_id: &str,
    ) -> Result<(Project, JobsetOverview)> {
        let project = self.projects.get(ctx, project_id).await?;
        let jobsets = self.jobsets.list(ctx, project_id).await?;
        Ok((project, jobsets))
    }

    // jobsets

    pub async fn list_jobsets(&self, ctx: &CallContext, project_id: &str) -> Result<JobsetOverview> {
        self.jobsets.list(ctx, project_id).await
    }

    pub async fn get_jobset(&self, ctx: &CallContext, project_id: &str, jobset_id: &str) -> Result<Jobset> {
        self.jobsets.get(ctx, project_id, jobset_id).await
    }

    pub async fn create_jobset(
        &self,
        ctx: &CallContext,
        project_id: &str,
        jobset_id: &str,
        jobset: &Jobset,
    ) -> Result<ProjectResponse> {
        self.jobsets.create(ctx, project_id, jobset_id, jobset).await
    }

    pub async fn create_jobset_with_options(
        &self,
        ctx: &CallContext,
        project_id: &str,
        jobset_id: &str,
        options: JobsetOptions,
    ) -> Result<ProjectResponse> {
        self.jobsets
            .create_with_options(ctx, project_id, jobset_id, options)
            .await
    }

    pub async fn update_jobset(
        &self,
        ctx: &CallContext,
        project_id: &str,
        jobset_id: &str,
        jobset: &Jobset,
    ) -> Result<ProjectResponse> {
        self.jobsets.update(ctx, project_id, jobset_id, jobset).await
    }

    pub async fn delete_jobset(&self, ctx: &CallContext, project_id: &str, jobset_id: &str) -> Result<()> {
        self.jobsets.delete(ctx, project_id, jobset_id).await
    }

    pub async fn get_evaluations(
        &self,
        ctx: &CallContext,
        project_id: &str,
        jobset_id: &str,
    ) -> Result<Evaluations> {
        self.jobsets.evaluations(ctx, project_id, jobset_id).await
    }

    pub async fn trigger_jobsets<S: AsRef<str>>(&self, ctx: &CallContext, jobsets: &[S]) -> Result<PushResponse> {
        self.jobsets.trigger(ctx, jobsets).await
    }

    pub async fn trigger_jobset(&self, ctx: &CallContext, project_id: &str, jobset_id: &str) -> Result<PushResponse> {
        self.jobsets.trigger_single(ctx, project_id, jobset_id).await
    }

    pub async fn shield_data(
        &self,
        ctx: &CallContext,
        project_id: &str,
        jobset_id: &str,
        job_id: &str,
    ) -> Result<ShieldData> {
        self.jobsets.shield_data(ctx, project_id, jobset_id, job_id).await
    }

    // builds

    pub async fn get_build(&self, ctx: &CallContext, build_id: i64) -> Result<Build> {
        self.builds.get(ctx, build_id).await
    }

    pub async fn get_build_constituents(&self, ctx: &CallContext, build_id: i64) -> Result<Vec<Build>> {
        self.builds.constituents(ctx, build_id).await
    }

    pub async fn get_evaluation(&self, ctx: &CallContext, eval_id: i64) -> Result<JobsetEval> {
        self.builds.evaluation(ctx, eval_id).await
    }

    pub async fn get_evaluation_builds(&self, ctx: &CallContext, eval_id: i64) -> Result<JobsetEvalBuilds> {
        self.builds.evaluation_builds(ctx, eval_id).await
    }

    pub async fn get_build_info(&self, ctx: &CallContext, build_id: i64) -> Result<BuildInfo> {
        self.builds.build_info(ctx, build_id).await
    }

    pub async fn wait_for_build(&self, ctx: &CallContext, build_id: i64, poll_interval: Duration) -> Result<Build> {
        self.builds.wait_for_build(ctx, build_id, poll_interval).await
    }

    pub async fn latest_build_for_job(
        &self,
        ctx: &CallContext,
        project_id: &str,
        jobset_id: &str,
        job: &str,
    ) -> Result<Build> {
        traversal::latest_build_for_job(&self.jobsets, &self.builds, ctx, project_id, jobset_id, job)
            .await
    }

    pub async fn wait_for_jobset_evaluation(
        &self,
        ctx: &CallContext,
        project_id: &str,
        jobset_id: &str,
        timeout: Duration,
    ) -> Result<JobsetEval> {
        traversal::wait_for_jobset_evaluation(&self.jobsets, ctx, project_id, jobset_id, timeout).await
    }

    // search

    pub async fn search(&self, ctx: &CallContext, query: &str) -> Result<SearchResult> {
        self.search.search(ctx, query).await
    }

    pub async fn search_with_options(&self, ctx: &CallContext, options: &SearchOptions) -> Result<SearchResult> {
        self.search.search_with_options(ctx, options).await
    }

    pub async fn search_projects(&self, ctx: &CallContext, query: &str) -> Result<Vec<Project>> {
        self.search.search_projects(ctx, query).await
    }

    pub async fn search_jobsets(&self, ctx: &CallContext, query: &str) -> Result<Vec<Jobset>> {
        self.search.search_jobsets(ctx, query).await
    }

    pub async fn search_builds(&self, ctx: &CallContext, query: &str) -> Result<Vec<Build>> {
        self.search.search_builds(ctx, query).await
    }

    pub async fn search_derivations(&self, ctx: &CallContext, query: &str) -> Result<Vec<Build>> {
        self.search.search_derivations(ctx, query).await
    }
}
