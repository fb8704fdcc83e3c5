//! Password-grant authentication for Reddit script apps.

use oauth2::basic::{BasicClient, BasicErrorResponse, BasicTokenResponse};
use oauth2::{
    AuthUrl, ClientId, ClientSecret, HttpRequest, HttpResponse, RequestTokenError,
    ResourceOwnerPassword, ResourceOwnerUsername, TokenResponse, TokenUrl,
};
use reelrank_core::{ConfigError, CoreError, RedditApiError, RedditCredentials};
use serde::Deserialize;
use std::time::{Duration, SystemTime};
use tracing::{debug, error, info};

pub const REDDIT_AUTH_URL: &str = "https://www.reddit.com/api/v1/authorize";
pub const REDDIT_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";

/// Reddit's documented lifetime for script-app tokens.
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(86_400);

/// Bearer token held in memory for the duration of one run.
#[derive(Clone)]
pub struct RedditToken {
    pub access_token: String,
    pub expires_at: SystemTime,
    pub scope: Vec<String>,
}

impl RedditToken {
    pub fn is_expired(&self) -> bool {
        SystemTime::now() >= self.expires_at
    }

    fn from_response(response: &BasicTokenResponse) -> Self {
        let lifetime = response.expires_in().unwrap_or(DEFAULT_TOKEN_LIFETIME);
        Self {
            access_token: response.access_token().secret().clone(),
            expires_at: SystemTime::now() + lifetime,
            scope: response
                .scopes()
                .map(|scopes| scopes.iter().map(|s| s.to_string()).collect())
                .unwrap_or_default(),
        }
    }
}

impl std::fmt::Debug for RedditToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedditToken")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("scope", &self.scope)
            .finish()
    }
}

#[derive(Deserialize)]
struct TokenErrorBody {
    error: serde_json::Value,
}

fn auth_failed(reason: impl Into<String>) -> CoreError {
    CoreError::RedditApi(RedditApiError::AuthenticationFailed {
        reason: reason.into(),
    })
}

fn describe_token_error(
    err: RequestTokenError<reqwest::Error, BasicErrorResponse>,
) -> CoreError {
    match err {
        RequestTokenError::ServerResponse(response) => auth_failed(response.error().to_string()),
        RequestTokenError::Request(e) => {
            error!("Token request could not be sent: {}", e);
            auth_failed(format!("token request failed: {}", e))
        }
        // Reddit answers bad credentials with 200 and an `error` field.
        RequestTokenError::Parse(_, body) => match serde_json::from_slice::<TokenErrorBody>(&body)
        {
            Ok(TokenErrorBody {
                error: serde_json::Value::String(reason),
            }) => auth_failed(reason),
            Ok(TokenErrorBody { error }) => auth_failed(error.to_string()),
            Err(_) => auth_failed(format!(
                "unexpected token response: {}",
                String::from_utf8_lossy(&body)
            )),
        },
        RequestTokenError::Other(reason) => auth_failed(reason),
    }
}

async fn send_token_request(
    http: &reqwest::Client,
    request: HttpRequest,
) -> Result<HttpResponse, reqwest::Error> {
    let response = http
        .request(request.method, request.url.as_str())
        .headers(request.headers)
        .body(request.body)
        .send()
        .await?;

    let status_code = response.status();
    let headers = response.headers().clone();
    let body = response.bytes().await?.to_vec();
    Ok(HttpResponse {
        status_code,
        headers,
        body,
    })
}

pub struct PasswordAuthenticator {
    oauth_client: BasicClient,
    http: reqwest::Client,
}

impl PasswordAuthenticator {
    pub fn new(
        credentials: &RedditCredentials,
        user_agent: &str,
        token_url: &str,
    ) -> Result<Self, CoreError> {
        let auth_url = AuthUrl::new(REDDIT_AUTH_URL.to_string()).map_err(|e| {
            ConfigError::InvalidValue {
                field: "reddit.auth_url".to_string(),
                value: e.to_string(),
            }
        })?;
        let token_url =
            TokenUrl::new(token_url.to_string()).map_err(|e| ConfigError::InvalidValue {
                field: "reddit.token_url".to_string(),
                value: format!("{} ({})", token_url, e),
            })?;

        let oauth_client = BasicClient::new(
            ClientId::new(credentials.client_id.clone()),
            Some(ClientSecret::new(credentials.client_secret.clone())),
            auth_url,
            Some(token_url),
        );

        // The token endpoint must not be followed through redirects.
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self { oauth_client, http })
    }

    pub async fn request_token(
        &self,
        credentials: &RedditCredentials,
    ) -> Result<RedditToken, CoreError> {
        info!("Requesting Reddit access token for {}", credentials.username);

        let username = ResourceOwnerUsername::new(credentials.username.clone());
        let password = ResourceOwnerPassword::new(credentials.password.clone());
        let response = self
            .oauth_client
            .exchange_password(&username, &password)
            .add_extra_param("duration", "permanent")
            .request_async(|request| send_token_request(&self.http, request))
            .await
            .map_err(describe_token_error)?;

        let token = RedditToken::from_response(&response);
        debug!("Token acquired with scopes {:?}", token.scope);
        Ok(token)
    }
}
