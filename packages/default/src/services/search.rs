use crate::context::CallContext;
use crate::error::ClientError;
use crate::models::{Build, Jobset, Project, SearchResult};
use crate::transport::{Transport, escape};
use anyhow::{Context, Result};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct SearchService {
    transport: Arc<Transport>,
}

impl SearchService {
    pub fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    /// Free-text search across projects, jobsets, builds and derivations.
    pub async fn search(&self, ctx: &CallContext, query: &str) -> Result<SearchResult> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ClientError::validation("search query cannot be empty").into());
        }

        let path = format!("/search?query={}", escape(query));
        let result = self
            .transport
            .get::<SearchResult>(ctx, &path)
            .await
            .with_context(|| format!("search failed for query '{query}'"))?;
        Ok(result.unwrap_or_default())
    }

    /// Same request as [`search`](Self::search), keeping only the selected
    /// categories.
    pub async fn search_with_options(
        &self,
        ctx: &CallContext,
        options: &SearchOptions,
    ) -> Result<SearchResult> {
        let result = self.search(ctx, &options.query).await?;
        Ok(options.apply(result))
    }

    pub async fn search_projects(&self, ctx: &CallContext, query: &str) -> Result<Vec<Project>> {
        Ok(self.search(ctx, query).await?.projects)
    }

    pub async fn search_jobsets(&self, ctx: &CallContext, query: &str) -> Result<Vec<Jobset>> {
        Ok(self.search(ctx, query).await?.jobsets)
    }

    pub async fn search_builds(&self, ctx: &CallContext, query: &str) -> Result<Vec<Build>> {
        Ok(self.search(ctx, query).await?.builds)
    }

    pub async fn search_derivations(&self, ctx: &CallContext, query: &str) -> Result<Vec<Build>> {
        Ok(self.search(ctx, query).await?.builds_drv)
    }
}

/// Which result categories to keep. Everything is included by default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    pub query: String,
    pub include_projects: bool,
    pub include_jobsets: bool,
    pub include_builds: bool,
    pub include_derivations: bool,
}

impl SearchOptions {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            include_projects: true,
            include_jobsets: true,
            include_builds: true,
            include_derivations: true,
        }
    }

    pub fn with_projects(mut self, include: bool) -> Self {
        self.include_projects = include;
        self
    }

    pub fn with_jobsets(mut self, include: bool) -> Self {
        self.include_jobsets = include;
        self
    }

    pub fn with_builds(mut self, include: bool) -> Self {
        self.include_builds = include;
        self
    }

    pub fn with_derivations(mut self, include: bool) -> Self {
        self.include_derivations = include;
        self
    }

    fn apply(&self, result: SearchResult) -> SearchResult {
        let SearchResult {
            jobsets,
            projects,
            builds,
            builds_drv,
        } = result;

        SearchResult {
            jobsets: if self.include_jobsets { jobsets } else { Vec::new() },
            projects: if self.include_projects { projects } else { Vec::new() },
            builds: if self.include_builds { builds } else { Vec::new() },
            builds_drv: if self.include_derivations { builds_drv } else { Vec::new() },
        }
    }
}

/// Per-category counts of a search result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchSummary {
    pub query: String,
    pub projects: usize,
    pub jobsets: usize,
    pub builds: usize,
    pub derivations: usize,
    pub total: usize,
}

impl SearchSummary {
    pub fn new(query: impl Into<String>, result: &SearchResult) -> Self {
        Self {
            query: query.into(),
            projects: result.projects.len(),
            jobsets: result.jobsets.len(),
            builds: result.builds.len(),
            derivations: result.builds_drv.len(),
            total: result.len(),
        }
    }

    pub fn has_results(&self) -> bool {
        self.total > 0
    }

    /// One-line human summary, e.g. `Found 1 project(s), 2 build(s) for query 'hello'`.
    pub fn format(&self) -> String {
        if !self.has_results() {
            return format!("No results found for '{}'", self.query);
        }

        let parts: Vec<String> = [
            (self.projects, "project"),
            (self.jobsets, "jobset"),
            (self.builds, "build"),
            (self.derivations, "derivation"),
        ]
        .into_iter()
        .filter(|(count, _)| *count > 0)
        .map(|(count, noun)| format!("{count} {noun}(s)"))
        .collect();

        format!("Found {} for query '{}'", parts.join(", "), self.query)
    }
}

impl fmt::Display for SearchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchType {
    Project,
    Jobset,
    Build,
    Derivation,
}

impl SearchType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Jobset => "jobset",
            Self::Build => "build",
            Self::Derivation => "derivation",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// The entity a [`SearchItem`] was built from.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchEntity {
    Project(Project),
    Jobset(Jobset),
    Build(Build),
}

/// One search hit in display form.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchItem {
    pub kind: SearchType,
    pub name: String,
    pub description: String,
    pub url: String,
    pub entity: SearchEntity,
}

/// Flattens a result into display items: projects, then jobsets, then
/// builds, then derivations, each in response order.
pub fn flatten_search_results(base_url: &str, result: &SearchResult) -> Vec<SearchItem> {
    let mut items = Vec::with_capacity(result.len());

    items.extend(result.projects.iter().map(|project| SearchItem {
        kind: SearchType::Project,
        name: project.name.clone(),
        description: project.description.clone(),
        url: format!("{base_url}/project/{}", project.name),
        entity: SearchEntity::Project(project.clone()),
    }));

    items.extend(result.jobsets.iter().map(|jobset| SearchItem {
        kind: SearchType::Jobset,
        name: format!("{}:{}", jobset.project, jobset.name),
        description: jobset.description.clone().unwrap_or_default(),
        url: format!("{base_url}/jobset/{}/{}", jobset.project, jobset.name),
        entity: SearchEntity::Jobset(jobset.clone()),
    }));

    items.extend(result.builds.iter().map(|build| SearchItem {
        kind: SearchType::Build,
        name: format!("{} #{}", build.job, build.id),
        description: build.nix_name.clone(),
        url: format!("{base_url}/build/{}", build.id),
        entity: SearchEntity::Build(build.clone()),
    }));

    items.extend(result.builds_drv.iter().map(|build| SearchItem {
        kind: SearchType::Derivation,
        name: format!("{} (drv)", build.drv_path),
        description: build.nix_name.clone(),
        url: format!("{base_url}/build/{}", build.id),
        entity: SearchEntity::Build(build.clone()),
    }));

    items
}
