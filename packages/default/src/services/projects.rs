use crate::context::CallContext;
use crate::error::{ClientError, require};
use crate::models::{CreateProjectRequest, DeclarativeInput, Project, ProjectResponse};
use crate::transport::{Transport, escape};
use anyhow::{Context, Result};
use reqwest::Method;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct ProjectsService {
    transport: Arc<Transport>,
}

impl ProjectsService {
    pub fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    pub async fn list(&self, ctx: &CallContext) -> Result<Vec<Project>> {
        let projects = self
            .transport
            .get::<Vec<Project>>(ctx, "/")
            .await
            .context("failed to list projects")?;
        Ok(projects.unwrap_or_default())
    }

    pub async fn get(&self, ctx: &CallContext, project_id: &str) -> Result<Project> {
        require(project_id, "project ID")?;

        let project = self
            .transport
            .get::<Project>(ctx, &project_path(project_id))
            .await
            .with_context(|| format!("failed to get project {project_id}"))?;
        Ok(project.unwrap_or_default())
    }

    /// Creates or replaces the project stored under `project_id`.
    pub async fn create(
        &self,
        ctx: &CallContext,
        project_id: &str,
        request: &CreateProjectRequest,
    ) -> Result<ProjectResponse> {
        require(project_id, "project ID")?;
        require(&request.name, "project name")?;
        require(&request.owner, "project owner")?;

        let response = self
            .transport
            .execute::<ProjectResponse, _>(
                ctx,
                Method::PUT,
                &project_path(project_id),
                Some(request),
            )
            .await
            .with_context(|| format!("failed to create project {project_id}"))?;
        Ok(response.unwrap_or_default())
    }

    /// Hydra uses the same endpoint for creation and update.
    pub async fn update(
        &self,
        ctx: &CallContext,
        project_id: &str,
        request: &CreateProjectRequest,
    ) -> Result<ProjectResponse> {
        self.create(ctx, project_id, request).await
    }

    pub async fn delete(&self, ctx: &CallContext, project_id: &str) -> Result<()> {
        require(project_id, "project ID")?;

        self.transport
            .execute::<ProjectResponse, ()>(ctx, Method::DELETE, &project_path(project_id), None)
            .await
            .with_context(|| format!("failed to delete project {project_id}"))?;
        Ok(())
    }

    pub async fn create_with_options(
        &self,
        ctx: &CallContext,
        project_id: &str,
        options: ProjectOptions,
    ) -> Result<ProjectResponse> {
        let request = options.build()?;
        self.create(ctx, project_id, &request).await
    }
}

fn project_path(project_id: &str) -> String {
    format!("/project/{}", escape(project_id))
}

/// Accumulates the fields of a [`CreateProjectRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectOptions {
    pub name: String,
    pub owner: String,
    pub display_name: String,
    pub description: String,
    pub homepage: String,
    pub enabled: bool,
    pub visible: bool,
    pub enable_dynamic_run_command: bool,
    pub declarative: Option<DeclarativeInput>,
}

impl ProjectOptions {
    /// Enabled and visible, dynamic run commands off.
    pub fn new(name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner: owner.into(),
            display_name: String::new(),
            description: String::new(),
            homepage: String::new(),
            enabled: true,
            visible: true,
            enable_dynamic_run_command: false,
            declarative: None,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_homepage(mut self, homepage: impl Into<String>) -> Self {
        self.homepage = homepage.into();
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
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

    pub fn with_declarative(mut self, declarative: DeclarativeInput) -> Self {
        self.declarative = Some(declarative);
        self
    }

    pub fn build(self) -> Result<CreateProjectRequest, ClientError> {
        require(&self.name, "project name")?;
        require(&self.owner, "project owner")?;

        Ok(CreateProjectRequest {
            name: self.name,
            display_name: self.display_name,
            description: self.description,
            homepage: self.homepage,
            owner: self.owner,
            enabled: self.enabled,
            enable_dynamic_run_command: self.enable_dynamic_run_command,
            visible: self.visible,
            declarative: self.declarative,
        })
    }
}
