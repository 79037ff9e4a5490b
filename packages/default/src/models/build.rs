use super::decode;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Terminal status of a finished build, as reported by Hydra.
///
/// The numbering is Hydra's: it skips 5 and 8 and has two codes meaning
/// "aborted". Codes this client does not know about are kept in `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildStatus {
    Success,
    Failed,
    DependencyFailed,
    Aborted,
    CanceledByUser,
    FailedWithOutput,
    TimedOut,
    /// Second "aborted" code (9).
    AbortedAlt,
    LogSizeLimitExceeded,
    OutputSizeLimitExceeded,
    Unknown(i64),
}

impl BuildStatus {
    pub const fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Success,
            1 => Self::Failed,
            2 => Self::DependencyFailed,
            3 => Self::Aborted,
            4 => Self::CanceledByUser,
            6 => Self::FailedWithOutput,
            7 => Self::TimedOut,
            9 => Self::AbortedAlt,
            10 => Self::LogSizeLimitExceeded,
            11 => Self::OutputSizeLimitExceeded,
            other => Self::Unknown(other),
        }
    }

    pub const fn code(self) -> i64 {
        match self {
            Self::Success => 0,
            Self::Failed => 1,
            Self::DependencyFailed => 2,
            Self::Aborted => 3,
            Self::CanceledByUser => 4,
            Self::FailedWithOutput => 6,
            Self::TimedOut => 7,
            Self::AbortedAlt => 9,
            Self::LogSizeLimitExceeded => 10,
            Self::OutputSizeLimitExceeded => 11,
            Self::Unknown(code) => code,
        }
    }

    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unknown(_))
    }

    /// Human-readable label. Unknown codes read as "failed".
    pub const fn label(self) -> &'static str {
        match self {
            Self::Success => "succeeded",
            Self::Failed => "failed",
            Self::DependencyFailed => "dependency failed",
            Self::Aborted | Self::AbortedAlt => "aborted",
            Self::CanceledByUser => "canceled by user",
            Self::FailedWithOutput => "failed with output",
            Self::TimedOut => "timed out",
            Self::LogSizeLimitExceeded => "log size limit exceeded",
            Self::OutputSizeLimitExceeded => "output size limit exceeded",
            Self::Unknown(_) => "failed",
        }
    }
}

impl From<i64> for BuildStatus {
    fn from(code: i64) -> Self {
        Self::from_code(code)
    }
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for BuildStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.code())
    }
}

impl<'de> Deserialize<'de> for BuildStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        i64::deserialize(deserializer).map(Self::from_code)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildProduct {
    pub filesize: Option<i64>,
    #[serde(rename = "defaultpath")]
    pub default_path: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub path: String,
    #[serde(rename = "subtype")]
    pub sub_type: String,
    #[serde(rename = "sha256hash")]
    pub sha256_hash: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOutput {
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildMetric {
    pub name: String,
    /// Hydra has sent both strings and numbers here.
    pub value: Value,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub unit: String,
}

/// A single Hydra build.
///
/// `build_status` is present exactly when `finished` is true; Hydra
/// guarantees this and the client does not re-check it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Build {
    pub id: i64,
    #[serde(rename = "starttime", deserialize_with = "decode::null_as_default")]
    pub start_time: i64,
    #[serde(rename = "stoptime", deserialize_with = "decode::null_as_default")]
    pub stop_time: i64,
    #[serde(deserialize_with = "decode::null_as_default")]
    pub timestamp: i64,
    #[serde(rename = "jobsetevals", deserialize_with = "decode::null_as_default")]
    pub jobset_evals: Vec<i64>,
    /// Sent as a boolean or as 0/1; always written back as a boolean.
    #[serde(deserialize_with = "decode::finished")]
    pub finished: bool,
    #[serde(rename = "nixname", deserialize_with = "decode::null_as_default")]
    pub nix_name: String,
    #[serde(rename = "buildstatus")]
    pub build_status: Option<BuildStatus>,
    pub jobset: String,
    #[serde(deserialize_with = "decode::null_as_default")]
    pub priority: i64,
    pub job: String,
    #[serde(rename = "drvpath", deserialize_with = "decode::null_as_default")]
    pub drv_path: String,
    pub system: String,
    pub project: String,
    #[serde(rename = "buildproducts", deserialize_with = "decode::null_as_default")]
    pub build_products: BTreeMap<String, BuildProduct>,
    #[serde(rename = "buildoutputs", deserialize_with = "decode::null_as_default")]
    pub build_outputs: BTreeMap<String, BuildOutput>,
    #[serde(rename = "buildmetrics", deserialize_with = "decode::null_as_default")]
    pub build_metrics: BTreeMap<String, BuildMetric>,
}

impl Build {
    pub fn is_success(&self) -> bool {
        self.finished && self.build_status == Some(BuildStatus::Success)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.build_status, Some(status) if status != BuildStatus::Success)
    }

    /// "in progress" while unfinished, "unknown" when finished without a
    /// status, otherwise the status label.
    pub fn status_label(&self) -> &'static str {
        if !self.finished {
            return "in progress";
        }
        match self.build_status {
            Some(status) => status.label(),
            None => "unknown",
        }
    }

    /// `stop_time - start_time`; zero when neither is set.
    pub fn duration(&self) -> TimeDelta {
        TimeDelta::try_seconds(self.stop_time.saturating_sub(self.start_time)).unwrap_or_default()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        unix_time(self.start_time)
    }

    pub fn stopped_at(&self) -> DateTime<Utc> {
        unix_time(self.stop_time)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        unix_time(self.timestamp)
    }
}

fn unix_time(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}
