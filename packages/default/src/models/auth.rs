use super::decode;
use serde::{Deserialize, Serialize};

/// Body of `POST /login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Profile of the authenticated user, returned by a successful login.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub username: String,
    #[serde(rename = "fullname", deserialize_with = "decode::null_as_default")]
    pub full_name: String,
    #[serde(rename = "emailaddress", deserialize_with = "decode::null_as_default")]
    pub email_address: String,
    #[serde(rename = "userroles", deserialize_with = "decode::null_as_default")]
    pub user_roles: Vec<String>,
}

/// Error body Hydra sends with most failing responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
