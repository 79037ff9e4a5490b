use super::build::Build;
use super::decode;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobsetEvalInput {
    pub uri: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub revision: Option<String>,
    /// Boolean, string or list of strings depending on the input type.
    pub value: Value,
    /// Deprecated upstream.
    pub dependency: Option<String>,
}

/// One evaluation run of a jobset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobsetEval {
    pub id: i64,
    pub timestamp: i64,
    #[serde(rename = "checkouttime", deserialize_with = "decode::null_as_default")]
    pub checkout_time: i64,
    #[serde(rename = "evaltime", deserialize_with = "decode::null_as_default")]
    pub eval_time: i64,
    #[serde(rename = "hasnewbuilds", deserialize_with = "decode::finished")]
    pub has_new_builds: bool,
    pub flake: Option<String>,
    #[serde(deserialize_with = "decode::null_as_default")]
    pub builds: Vec<i64>,
    #[serde(rename = "jobsetevalinputs", deserialize_with = "decode::null_as_default")]
    pub inputs: IndexMap<String, JobsetEvalInput>,
}

/// One page of `GET /jobset/{project}/{jobset}/evals`.
///
/// Each entry of `evals` maps an opaque key to an evaluation. The key is not
/// guaranteed to be the evaluation id; use [`JobsetEval::id`] instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Evaluations {
    #[serde(deserialize_with = "decode::null_as_default")]
    pub first: String,
    #[serde(deserialize_with = "decode::null_as_default")]
    pub next: String,
    #[serde(deserialize_with = "decode::null_as_default")]
    pub last: String,
    #[serde(deserialize_with = "decode::null_as_default")]
    pub evals: Vec<IndexMap<String, JobsetEval>>,
}

impl Evaluations {
    /// Every evaluation in wire order, ignoring the opaque keys.
    pub fn iter(&self) -> impl Iterator<Item = &JobsetEval> {
        self.evals.iter().flat_map(|page| page.values())
    }
}

/// Builds of an evaluation, keyed by job name, in wire order.
pub type JobsetEvalBuilds = Vec<IndexMap<String, Build>>;
