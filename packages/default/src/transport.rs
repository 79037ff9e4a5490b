use crate::context::CallContext;
use crate::error::ClientError;
use crate::models::ErrorBody;
use parking_lot::RwLock;
use reqwest::header::{ACCEPT, CONTENT_TYPE, COOKIE, HeaderMap, SET_COOKIE};
use reqwest::{Client, Method, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const SESSION_COOKIE: &str = "hydra_session";
pub const LOGIN_PATH: &str = "/login";

/// An authenticated session. Replaced wholesale, never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    pub cookie: String,
    /// Base URL the cookie was issued by.
    pub base_url: String,
}

/// HTTP plumbing shared by every service: base URL, session cookie and
/// failure classification.
#[derive(Debug)]
pub struct Transport {
    http: Client,
    base_url: RwLock<String>,
    session: RwLock<Option<Arc<Session>>>,
}

impl Transport {
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self, ClientError> {
        let base_url = normalize_base_url(base_url)?;
        let mut builder = Client::builder().user_agent(user_agent);
        if !timeout.is_zero() {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: RwLock::new(base_url),
            session: RwLock::new(None),
        })
    }

    pub fn base_url(&self) -> String {
        self.base_url.read().clone()
    }

    /// Points the transport at another Hydra. An existing session stays
    /// stored but its cookie is only sent back to the URL that issued it.
    pub fn set_base_url(&self, base_url: &str) -> Result<(), ClientError> {
        let base_url = normalize_base_url(base_url)?;
        *self.base_url.write() = base_url;
        Ok(())
    }

    pub fn session(&self) -> Option<Arc<Session>> {
        self.session.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.read().is_some()
    }

    pub fn username(&self) -> Option<String> {
        self.session().map(|s| s.username.clone())
    }

    pub(crate) fn store_session(&self, session: Session) {
        *self.session.write() = Some(Arc::new(session));
    }

    pub(crate) fn clear_session(&self) {
        *self.session.write() = None;
    }

    /// Records the logged-in user on the session the login response created.
    pub(crate) fn bind_username(&self, username: &str) {
        let mut slot = self.session.write();
        if let Some(current) = slot.as_ref() {
            let mut updated = Session::clone(current);
            updated.username = username.to_string();
            *slot = Some(Arc::new(updated));
        }
    }

    fn cookie_for(&self, base_url: &str) -> Option<String> {
        self.session
            .read()
            .as_ref()
            .filter(|s| s.base_url == base_url)
            .map(|s| format!("{SESSION_COOKIE}={}", s.cookie))
    }

    /// Sends one request and decodes the response body into `T`.
    ///
    /// `Ok(None)` means the server answered with an empty body.
    pub async fn execute<T, B>(
        &self,
        ctx: &CallContext,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Option<T>, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        ctx.check()?;

        let base_url = self.base_url();
        let url = format!("{base_url}{path}");
        let mut request = self
            .http
            .request(method.clone(), &url)
            .header(ACCEPT, "application/json");

        if let Some(body) = body {
            let encoded = serde_json::to_vec(body).map_err(ClientError::Encode)?;
            request = request
                .header(CONTENT_TYPE, "application/json")
                .body(encoded);
        }
        if let Some(cookie) = self.cookie_for(&base_url) {
            request = request.header(COOKIE, cookie);
        }

        debug!("{} {}", method, url);
        let response = ctx
            .run(request.send())
            .await?
            .map_err(ClientError::Transport)?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = ctx
            .run(response.bytes())
            .await?
            .map_err(ClientError::Transport)?;
        debug!("{} {} -> {} ({} bytes)", method, url, status.as_u16(), bytes.len());

        if status.as_u16() >= 400 {
            let message = match serde_json::from_slice::<ErrorBody>(&bytes) {
                Ok(body) => body.error,
                Err(_) => String::from_utf8_lossy(&bytes).into_owned(),
            };
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        if path.ends_with(LOGIN_PATH) {
            match session_cookie(&headers) {
                Some(cookie) => self.store_session(Session {
                    username: String::new(),
                    cookie,
                    base_url,
                }),
                None => warn!("login succeeded but no {} cookie was set", SESSION_COOKIE),
            }
        }

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(ClientError::Decode)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        ctx: &CallContext,
        path: &str,
    ) -> Result<Option<T>, ClientError> {
        self.execute::<T, ()>(ctx, Method::GET, path, None).await
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ClientError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ClientError::Config("base URL cannot be empty".to_string()));
    }
    Url::parse(trimmed)
        .map_err(|e| ClientError::Config(format!("invalid base URL '{trimmed}': {e}")))?;
    Ok(trimmed.to_string())
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|raw| raw.split(';').next())
        .filter_map(|pair| pair.split_once('='))
        .find(|(name, _)| name.trim() == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
}

/// Percent-escapes one path segment or query value.
pub(crate) fn escape(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}
