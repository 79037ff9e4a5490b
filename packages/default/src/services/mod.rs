mod auth;
mod builds;
mod jobsets;
mod projects;
mod search;

pub use auth::AuthService;
pub use builds::{BuildInfo, BuildsService, DEFAULT_POLL_INTERVAL};
pub use jobsets::{JobsetOptions, JobsetsService};
pub use projects::{ProjectOptions, ProjectsService};
pub use search::{
    SearchEntity, SearchItem, SearchOptions, SearchService, SearchSummary, SearchType,
    flatten_search_results,
};
