//! Client side of the wire protocol.
//!
//! Talks to the server over HTTP only; no types are shared with the
//! server modules. `ApiClient` wraps a cookie-jar-enabled HTTP client and
//! runs every protected request through the refresh protocol: attach the
//! cached access token, and on a 401 call the refresh endpoint (cookie
//! only), store the new token, and retry the original request exactly
//! once. A failed refresh clears local token state and latches the
//! `session_expired` flag - the embedding application is expected to
//! route to its login surface when it sees it.

mod store;

pub use store::TokenStore;

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use url::Url;

/// Errors surfaced by the API client.
#[derive(Debug)]
pub enum ClientError {
    /// Transport-level failure
    Http(reqwest::Error),
    /// Invalid base URL or path
    Url(url::ParseError),
    /// Token store I/O failure
    Store(std::io::Error),
    /// The request body cannot be cloned for the single retry
    UnclonableRequest,
    /// The server answered with a non-success status
    Api { status: u16, message: String },
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Http(e) => write!(f, "HTTP error: {}", e),
            ClientError::Url(e) => write!(f, "Invalid URL: {}", e),
            ClientError::Store(e) => write!(f, "Token store error: {}", e),
            ClientError::UnclonableRequest => {
                write!(f, "Request body cannot be cloned for retry")
            }
            ClientError::Api { status, message } => write!(f, "API error {}: {}", status, message),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Http(e)
    }
}

impl From<url::ParseError> for ClientError {
    fn from(e: url::ParseError) -> Self {
        ClientError::Url(e)
    }
}

impl From<std::io::Error> for ClientError {
    fn from(e: std::io::Error) -> Self {
        ClientError::Store(e)
    }
}

/// User fields returned by register and login.
#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// Successful register/login payload.
#[derive(Debug, Deserialize)]
pub struct AuthSuccess {
    pub token: String,
    pub user: UserProfile,
}

/// Payload of the protected profile endpoint.
#[derive(Debug, Deserialize)]
pub struct ProfileInfo {
    pub message: String,
    #[serde(rename = "userId")]
    pub user_id: String,
}

/// A task as the server renders it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub due_date: Option<String>,
    pub priority: String,
    pub tags: Vec<String>,
    pub completed: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields for creating a task.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Partial update for a task; only set fields are sent.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

#[derive(Deserialize)]
struct TokenBody {
    token: String,
}

#[derive(Deserialize)]
struct MessageBody {
    message: String,
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    store: TokenStore,
    session_expired: AtomicBool,
}

impl ApiClient {
    /// Create a client for the API at `base_url`, caching tokens in `store`.
    pub fn new(base_url: &str, store: TokenStore) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url)?;
        // The cookie jar is where the refresh token lives; it is never
        // readable through this type's API.
        let http = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self {
            http,
            base_url,
            store,
            session_expired: AtomicBool::new(false),
        })
    }

    /// The token store backing this client.
    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// True once a refresh attempt has failed and local token state was
    /// cleared. The embedding application should send the user back to
    /// the login surface.
    pub fn session_expired(&self) -> bool {
        self.session_expired.load(Ordering::SeqCst)
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(path)?)
    }

    /// Run a protected request through the refresh protocol.
    ///
    /// Single-attempt retry state machine: send with the cached token; on
    /// 401, refresh via the cookie and retry once with the new token. The
    /// retry's outcome is returned as-is - a second 401 is handed to the
    /// caller, never looped on. If the refresh itself fails, the ORIGINAL
    /// 401 response is returned so the caller sees what actually happened.
    pub async fn execute(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        // Clone before attaching the bearer header: the retry must carry
        // the refreshed token, not the stale one.
        let retry = request.try_clone().ok_or(ClientError::UnclonableRequest)?;

        let mut first = request;
        if let Some(token) = self.store.get() {
            first = first.bearer_auth(token);
        }
        let response = first.send().await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let refresh_response = self.http.post(self.url("/api/auth/refresh")?).send().await?;

        if !refresh_response.status().is_success() {
            self.store.clear();
            self.session_expired.store(true, Ordering::SeqCst);
            return Ok(response);
        }

        let body: TokenBody = refresh_response.json().await?;
        self.store.replace(&body.token)?;

        Ok(retry.bearer_auth(&body.token).send().await?)
    }

    /// Create an account. Does not log in: the returned token is not
    /// cached and no refresh cookie is set until the first login.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSuccess, ClientError> {
        let response = self
            .http
            .post(self.url("/api/auth/register")?)
            .json(&serde_json::json!({
                "name": name,
                "email": email,
                "password": password,
            }))
            .send()
            .await?;
        Ok(expect_success(response).await?.json().await?)
    }

    /// Log in and cache the access token; `remember` picks the durable
    /// slot. The refresh cookie lands in the jar as a side effect.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        remember: bool,
    ) -> Result<AuthSuccess, ClientError> {
        let response = self
            .http
            .post(self.url("/api/auth/login")?)
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "rememberMe": remember,
            }))
            .send()
            .await?;
        let auth: AuthSuccess = expect_success(response).await?.json().await?;
        self.store.set(&auth.token, remember)?;
        self.session_expired.store(false, Ordering::SeqCst);
        Ok(auth)
    }

    /// Drop local token state and clear the refresh cookie server-side.
    pub async fn logout(&self) -> Result<(), ClientError> {
        self.store.clear();
        let response = self.http.post(self.url("/api/auth/logout")?).send().await?;
        expect_success(response).await?;
        Ok(())
    }

    /// Fetch the authenticated subject.
    pub async fn profile(&self) -> Result<ProfileInfo, ClientError> {
        let response = self.execute(self.http.get(self.url("/api/auth/profile")?)).await?;
        Ok(expect_success(response).await?.json().await?)
    }

    /// List the caller's tasks.
    pub async fn list_tasks(&self) -> Result<Vec<TaskView>, ClientError> {
        let response = self.execute(self.http.get(self.url("/api/tasks/")?)).await?;
        Ok(expect_success(response).await?.json().await?)
    }

    /// Create a task.
    pub async fn create_task(&self, task: &NewTask) -> Result<TaskView, ClientError> {
        let request = self.http.post(self.url("/api/tasks/")?).json(task);
        let response = self.execute(request).await?;
        Ok(expect_success(response).await?.json().await?)
    }

    /// Update the set fields of a task.
    pub async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<TaskView, ClientError> {
        let request = self
            .http
            .put(self.url(&format!("/api/tasks/{}", id))?)
            .json(patch);
        let response = self.execute(request).await?;
        Ok(expect_success(response).await?.json().await?)
    }

    /// Delete a task.
    pub async fn delete_task(&self, id: &str) -> Result<(), ClientError> {
        let request = self.http.delete(self.url(&format!("/api/tasks/{}", id))?);
        let response = self.execute(request).await?;
        expect_success(response).await?;
        Ok(())
    }
}

/// Turn a non-success response into `ClientError::Api`, keeping the
/// server's message when it sent one.
async fn expect_success(response: Response) -> Result<Response, ClientError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let message = response
        .json::<MessageBody>()
        .await
        .map(|m| m.message)
        .unwrap_or_else(|_| "Request failed".to_string());
    Err(ClientError::Api { status, message })
}
