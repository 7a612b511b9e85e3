//! Request/response contract with the room server.
//!
//! [`ChatApi`] is the seam between the reconciliation engine and the
//! transport; [`HttpApi`] implements it over `reqwest`.  Every failure is
//! classified into a [`ClientError`] here so callers only deal with the
//! taxonomy, never with status codes.

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use roomline_shared::constants::UNAUTHORIZED_ERROR;
use roomline_shared::protocol::{
    decode, Ack, AvatarUpdate, Credentials, ErrorBody, OutgoingMessage, RoomState, TokenResponse,
    Validate,
};
use roomline_shared::User;

use crate::error::{ClientError, Result};

#[async_trait]
pub trait ChatApi: Send + Sync + 'static {
    async fn login(&self, credentials: &Credentials) -> Result<TokenResponse>;

    async fn register(&self, credentials: &Credentials) -> Result<TokenResponse>;

    /// Identity behind `token`, from `GET /api/me`.
    async fn me(&self, token: &str) -> Result<User>;

    async fn fetch_state(&self, token: &str) -> Result<RoomState>;

    async fn send_message(&self, token: &str, message: &OutgoingMessage) -> Result<Ack>;

    async fn update_avatar(&self, token: &str, update: &AvatarUpdate) -> Result<Ack>;

    async fn logout(&self, token: &str) -> Result<Ack>;
}

/// Map a failed response to the client error taxonomy.
///
/// The server signals an invalid session with the error value
/// `"unauthorized"`; that value, not the status code, is what tells it apart
/// from e.g. `401 invalid credentials` on login.
pub fn classify_failure(status: StatusCode, body: &str) -> ClientError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .map(|b| b.error)
        .filter(|e| !e.trim().is_empty());

    match message {
        Some(m) if m == UNAUTHORIZED_ERROR => ClientError::Unauthorized,
        Some(m) if status.is_client_error() => ClientError::Validation(m),
        Some(m) => ClientError::Network(format!("server responded {status}: {m}")),
        None if status == StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
        None => ClientError::Network(format!("server responded {status}")),
    }
}

/// HTTP implementation of [`ChatApi`].
#[derive(Clone)]
pub struct HttpApi {
    base_url: String,
    http: reqwest::Client,
}

impl HttpApi {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("roomline/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/api/{endpoint}", self.base_url)
    }

    async fn post<B, T>(&self, endpoint: &str, token: Option<&str>, body: &B) -> Result<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned + Validate,
    {
        let mut req = self.http.post(self.url(endpoint)).json(body);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        self.execute(endpoint, req).await
    }

    async fn execute<T>(&self, endpoint: &str, req: RequestBuilder) -> Result<T>
    where
        T: DeserializeOwned + Validate,
    {
        let resp = req.send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        debug!(endpoint, status = status.as_u16(), len = body.len(), "API response");

        if !status.is_success() {
            return Err(classify_failure(status, &body));
        }
        Ok(decode(&body)?)
    }
}

#[async_trait]
impl ChatApi for HttpApi {
    async fn login(&self, credentials: &Credentials) -> Result<TokenResponse> {
        self.post("login", None, credentials).await
    }

    async fn register(&self, credentials: &Credentials) -> Result<TokenResponse> {
        self.post("register", None, credentials).await
    }

    async fn me(&self, token: &str) -> Result<User> {
        let req = self.http.get(self.url("me")).bearer_auth(token);
        self.execute("me", req).await
    }

    async fn fetch_state(&self, token: &str) -> Result<RoomState> {
        let req = self.http.get(self.url("state")).bearer_auth(token);
        self.execute("state", req).await
    }

    async fn send_message(&self, token: &str, message: &OutgoingMessage) -> Result<Ack> {
        self.post("message", Some(token), message).await
    }

    async fn update_avatar(&self, token: &str, update: &AvatarUpdate) -> Result<Ack> {
        self.post("avatar", Some(token), update).await
    }

    async fn logout(&self, token: &str) -> Result<Ack> {
        self.post("logout", Some(token), &serde_json::json!({})).await
    }
}
