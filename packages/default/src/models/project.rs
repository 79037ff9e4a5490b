use super::decode;
use serde::{Deserialize, Serialize};

/// Where a declarative project reads its jobset definitions from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeclarativeInput {
    pub file: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    pub owner: String,
    pub name: String,
    #[serde(rename = "displayname", deserialize_with = "decode::null_as_default")]
    pub display_name: String,
    #[serde(deserialize_with = "decode::null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "decode::null_as_default")]
    pub homepage: String,
    pub hidden: bool,
    pub enabled: bool,
    pub enable_dynamic_run_command: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declarative: Option<DeclarativeInput>,
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "decode::null_as_default"
    )]
    pub jobsets: Vec<String>,
}

/// Body of `PUT /project/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(rename = "displayname")]
    pub display_name: String,
    pub description: String,
    pub homepage: String,
    pub owner: String,
    pub enabled: bool,
    pub enable_dynamic_run_command: bool,
    pub visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declarative: Option<DeclarativeInput>,
}

/// What Hydra answers to project and jobset mutations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectResponse {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub uri: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub redirect: String,
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub kind: String,
}
