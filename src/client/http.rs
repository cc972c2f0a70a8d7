//! The typed HTTP client.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

use crate::api::{
    ApiError, CastVoteRequest, LoginRequest, LoginResponse, RefreshRequest, RegisterRequest,
    UserResponse, VoteView, VotesResponse,
};
use crate::domain::{BookTitle, StatusUpdate, UserId, VotingStatus};

use super::{ClientError, ClientResult};

/// Typed client for the book poll API.
///
/// Holds the bearer token issued at login; cloning shares it, so one login
/// serves every clone.
#[derive(Clone)]
pub struct VotingClient {
    http: Client,
    base_url: Url,
    tokens: Arc<RwLock<Tokens>>,
}

#[derive(Default)]
struct Tokens {
    access: Option<String>,
    refresh: Option<String>,
}

impl VotingClient {
    /// Create a client for a server base URL.
    ///
    /// The URL must be absolute with an http or https scheme; a trailing
    /// slash is tolerated.
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let base_url = base_url.trim_end_matches('/');
        let parsed =
            Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::InvalidUrl(
                "URL must start with http:// or https://".to_string(),
            ));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("bookvote-client/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: parsed,
            tokens: Arc::new(RwLock::new(Tokens::default())),
        })
    }

    /// The server base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Whether a bearer token is currently held.
    pub async fn is_authenticated(&self) -> bool {
        self.tokens.read().await.access.is_some()
    }

    /// Set tokens directly, e.g. from a persisted credential cache.
    pub async fn set_tokens(&self, access: String, refresh: Option<String>) {
        let mut tokens = self.tokens.write().await;
        tokens.access = Some(access);
        tokens.refresh = refresh;
    }

    /// Drop the held tokens.
    pub async fn logout(&self) {
        let mut tokens = self.tokens.write().await;
        tokens.access = None;
        tokens.refresh = None;
    }

    // ------------------------------------------------------------------
    // Accounts
    // ------------------------------------------------------------------

    /// Register a new account. Does not log in.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> ClientResult<UserResponse> {
        let request = RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            confirm_password: password.to_string(),
        };
        self.post_json("register", &request, false).await
    }

    /// Log in and hold the issued tokens for subsequent calls.
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<LoginResponse> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self.post_json("login", &request, false).await?;

        let mut tokens = self.tokens.write().await;
        tokens.access = Some(response.token.clone());
        tokens.refresh = Some(response.refresh_token.clone());
        debug!(username, is_admin = response.is_admin, "logged in");

        Ok(response)
    }

    /// Exchange the held refresh token for a fresh pair.
    pub async fn refresh(&self) -> ClientResult<LoginResponse> {
        let refresh_token = self
            .tokens
            .read()
            .await
            .refresh
            .clone()
            .ok_or(ClientError::AuthRequired)?;

        let response: LoginResponse = self
            .post_json("refresh", &RefreshRequest { refresh_token }, false)
            .await?;

        let mut tokens = self.tokens.write().await;
        tokens.access = Some(response.token.clone());
        tokens.refresh = Some(response.refresh_token.clone());

        Ok(response)
    }

    /// Look up an account by id.
    pub async fn get_user(&self, id: UserId) -> ClientResult<UserResponse> {
        self.get_json(&format!("users/{id}"), true).await
    }

    // ------------------------------------------------------------------
    // Voting
    // ------------------------------------------------------------------

    /// Current voting status.
    pub async fn voting_status(&self) -> ClientResult<VotingStatus> {
        self.get_json("voting-status", true).await
    }

    /// Apply a partial status update. Admin only.
    pub async fn set_voting_status(&self, update: StatusUpdate) -> ClientResult<VotingStatus> {
        self.post_json("voting-status", &update, true).await
    }

    /// Cast this account's one vote.
    pub async fn cast_vote(&self, book: BookTitle) -> ClientResult<VoteView> {
        self.post_json("vote", &CastVoteRequest { book }, true).await
    }

    /// The ledger with per-option counts.
    pub async fn get_votes(&self) -> ClientResult<VotesResponse> {
        self.get_json("get-votes", true).await
    }

    // ------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------

    fn endpoint(&self, path: &str) -> ClientResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ClientError::InvalidUrl("URL cannot be a base".to_string()))?;
            segments.pop_if_empty();
            for segment in path.split('/') {
                segments.push(segment);
            }
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, auth: bool) -> ClientResult<T> {
        let url = self.endpoint(path)?;
        debug!(%url, "GET");
        let request = self.authorize(self.http.get(url), auth).await?;
        decode(request.send().await.map_err(connect_error)?).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        auth: bool,
    ) -> ClientResult<T> {
        let url = self.endpoint(path)?;
        debug!(%url, "POST");
        let request = self.authorize(self.http.post(url).json(body), auth).await?;
        decode(request.send().await.map_err(connect_error)?).await
    }

    async fn authorize(
        &self,
        request: RequestBuilder,
        auth: bool,
    ) -> ClientResult<RequestBuilder> {
        if !auth {
            return Ok(request);
        }
        let tokens = self.tokens.read().await;
        let token = tokens.access.as_deref().ok_or(ClientError::AuthRequired)?;
        Ok(request.bearer_auth(token))
    }
}

fn connect_error(e: reqwest::Error) -> ClientError {
    if e.is_connect() || e.is_timeout() {
        ClientError::Unreachable(e.to_string())
    } else {
        ClientError::Request(e)
    }
}

/// Decode a success body, or the structured error envelope on failure.
async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()));
    }
    Err(error_from_response(status, response).await)
}

async fn error_from_response(status: StatusCode, response: Response) -> ClientError {
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ApiError>(&body) {
        Ok(envelope) => ClientError::Api {
            status: status.as_u16(),
            code: envelope.error.code,
            message: envelope.error.message,
        },
        Err(_) => ClientError::Server {
            status: status.as_u16(),
            message: body,
        },
    }
}
