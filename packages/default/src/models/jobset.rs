use super::decode;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Scheduling state stored in a jobset's `enabled` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JobsetState {
    Disabled,
    #[default]
    Enabled,
    OneShot,
    OneAtATime,
}

impl JobsetState {
    pub const fn code(self) -> i32 {
        match self {
            Self::Disabled => 0,
            Self::Enabled => 1,
            Self::OneShot => 2,
            Self::OneAtATime => 3,
        }
    }

    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Disabled),
            1 => Some(Self::Enabled),
            2 => Some(Self::OneShot),
            3 => Some(Self::OneAtATime),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobsetInput {
    pub name: String,
    pub value: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "emailresponsible")]
    pub email_responsible: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Jobset {
    pub name: String,
    pub project: String,
    pub description: Option<String>,
    #[serde(rename = "nixexprinput")]
    pub nix_expr_input: Option<String>,
    #[serde(rename = "nixexprpath")]
    pub nix_expr_path: Option<String>,
    #[serde(rename = "errormsg")]
    pub error_msg: Option<String>,
    #[serde(rename = "errortime")]
    pub error_time: Option<i64>,
    #[serde(rename = "lastcheckedtime")]
    pub last_checked_time: Option<i64>,
    #[serde(rename = "triggertime")]
    pub trigger_time: Option<i64>,
    /// Raw [`JobsetState`] code; see [`Jobset::state`].
    pub enabled: i32,
    #[serde(rename = "enableemail")]
    pub enable_email: bool,
    pub enable_dynamic_run_command: bool,
    pub visible: bool,
    #[serde(rename = "emailoverride", deserialize_with = "decode::null_as_default")]
    pub email_override: String,
    #[serde(rename = "keepnr")]
    pub keep_nr: i32,
    #[serde(rename = "checkinterval")]
    pub check_interval: i32,
    #[serde(rename = "schedulingshares")]
    pub scheduling_shares: i32,
    #[serde(rename = "fetcherrormsg")]
    pub fetch_error_msg: Option<String>,
    /// Hydra spells this key `startime` on jobsets.
    #[serde(rename = "startime", alias = "starttime")]
    pub start_time: Option<i64>,
    #[serde(rename = "type")]
    pub kind: i32,
    pub flake: Option<String>,
    #[serde(
        skip_serializing_if = "IndexMap::is_empty",
        deserialize_with = "decode::null_as_default"
    )]
    pub inputs: IndexMap<String, JobsetInput>,
}

impl Jobset {
    /// `None` when Hydra sent a code outside the four known states.
    pub fn state(&self) -> Option<JobsetState> {
        JobsetState::from_code(self.enabled)
    }

    pub fn set_state(&mut self, state: JobsetState) {
        self.enabled = state.code();
    }

    /// True only for [`JobsetState::Enabled`]; one-shot and one-at-a-time
    /// jobsets do not count.
    pub fn is_enabled(&self) -> bool {
        self.enabled == JobsetState::Enabled.code()
    }
}

/// One row of `GET /api/jobsets`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobsetOverviewItem {
    pub name: String,
    pub project: String,
    #[serde(rename = "nrtotal")]
    pub nr_total: i64,
    #[serde(rename = "checkinterval")]
    pub check_interval: i64,
    #[serde(rename = "haserrormsg")]
    pub has_error_msg: bool,
    #[serde(rename = "nrscheduled")]
    pub nr_scheduled: i64,
    #[serde(rename = "nrfailed")]
    pub nr_failed: i64,
    #[serde(rename = "errortime", deserialize_with = "decode::null_as_default")]
    pub error_time: i64,
    #[serde(rename = "fetcherrormsg")]
    pub fetch_error_msg: Option<String>,
    #[serde(rename = "starttime")]
    pub start_time: Option<i64>,
    #[serde(rename = "lastcheckedtime", deserialize_with = "decode::null_as_default")]
    pub last_checked_time: i64,
    #[serde(rename = "triggertime")]
    pub trigger_time: Option<i64>,
}

pub type JobsetOverview = Vec<JobsetOverviewItem>;

/// Response of `POST /api/push`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PushResponse {
    #[serde(rename = "jobsetsTriggered", deserialize_with = "decode::null_as_default")]
    pub jobsets_triggered: Vec<String>,
}

/// shields.io endpoint payload for a job badge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShieldData {
    pub color: String,
    #[serde(rename = "schemaVersion")]
    pub schema_version: i32,
    pub label: String,
    pub message: String,
}
