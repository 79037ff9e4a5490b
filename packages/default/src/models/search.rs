use super::build::Build;
use super::decode;
use super::jobset::Jobset;
use super::project::Project;
use serde::{Deserialize, Serialize};

/// Response of `GET /search`. The four lists are independent of each other.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchResult {
    #[serde(deserialize_with = "decode::null_as_default")]
    pub jobsets: Vec<Jobset>,
    #[serde(deserialize_with = "decode::null_as_default")]
    pub projects: Vec<Project>,
    #[serde(deserialize_with = "decode::null_as_default")]
    pub builds: Vec<Build>,
    /// Derivations matching the query, returned separately from builds.
    #[serde(rename = "buildsdrv", deserialize_with = "decode::null_as_default")]
    pub builds_drv: Vec<Build>,
}

impl SearchResult {
    pub fn len(&self) -> usize {
        self.projects.len() + self.jobsets.len() + self.builds.len() + self.builds_drv.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
