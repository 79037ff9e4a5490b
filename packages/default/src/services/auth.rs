use crate::context::CallContext;
use crate::error::ClientError;
use crate::models::{LoginRequest, User};
use crate::transport::{LOGIN_PATH, Transport};
use anyhow::{Context, Result};
use reqwest::Method;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone)]
pub struct AuthService {
    transport: Arc<Transport>,
}

impl AuthService {
    pub fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    /// Authenticates and keeps the session cookie for later requests.
    pub async fn login(&self, ctx: &CallContext, username: &str, password: &str) -> Result<User> {
        if username.is_empty() || password.is_empty() {
            return Err(ClientError::validation("username and password are required").into());
        }

        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let user: User = self
            .transport
            .execute(ctx, Method::POST, LOGIN_PATH, Some(&request))
            .await
            .with_context(|| format!("login failed for {username}"))?
            .unwrap_or_default();

        self.transport.bind_username(username);
        info!("logged in to {} as {}", self.transport.base_url(), username);
        Ok(user)
    }

    /// Drops the session. Safe to call when not logged in.
    pub fn logout(&self) {
        if let Some(session) = self.transport.session() {
            info!("logging out {}", session.username);
        }
        self.transport.clear_session();
    }

    pub fn is_authenticated(&self) -> bool {
        self.transport.is_authenticated()
    }

    pub fn current_user(&self) -> Option<String> {
        self.transport.username()
    }
}
