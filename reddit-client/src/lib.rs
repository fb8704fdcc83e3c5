pub mod api;
pub mod auth;

pub use api::{RedditApiClient, RedditCommentData, RedditListing, RedditPostData, REDDIT_API_BASE};
pub use auth::{PasswordAuthenticator, RedditToken, REDDIT_TOKEN_URL};

use reelrank_core::render::ThreadSource;
use reelrank_core::{
    Comment, CommentQuery, CoreError, ListingQuery, Post, RedditApiError, RedditCredentials,
};
use std::time::SystemTime;
use tracing::info;

#[derive(Debug, Clone)]
pub struct RedditOAuth2Config {
    pub credentials: RedditCredentials,
    pub user_agent: String,
    pub token_url: String,
    pub api_base: String,
}

impl RedditOAuth2Config {
    pub fn new(credentials: RedditCredentials, user_agent: String) -> Self {
        Self {
            credentials,
            user_agent,
            token_url: REDDIT_TOKEN_URL.to_string(),
            api_base: REDDIT_API_BASE.to_string(),
        }
    }

    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    NotAuthenticated,
    Authenticated { expires_at: SystemTime },
    TokenExpired { expired_at: SystemTime },
}

pub struct RedditClient {
    config: RedditOAuth2Config,
    authenticator: PasswordAuthenticator,
    api: RedditApiClient,
    token: Option<RedditToken>,
}

impl RedditClient {
    pub fn new(config: RedditOAuth2Config) -> Result<Self, CoreError> {
        let authenticator =
            PasswordAuthenticator::new(&config.credentials, &config.user_agent, &config.token_url)?;
        let api = RedditApiClient::new(&config.user_agent, &config.api_base)?;
        Ok(Self {
            config,
            authenticator,
            api,
            token: None,
        })
    }

    /// Exchanges the configured credentials for a fresh bearer token.
    pub async fn authenticate(&mut self) -> Result<&RedditToken, CoreError> {
        let token = self
            .authenticator
            .request_token(&self.config.credentials)
            .await?;
        info!("Authenticated with Reddit as {}", self.config.credentials.username);
        Ok(self.token.insert(token))
    }

    pub fn set_token(&mut self, token: RedditToken) {
        self.token = Some(token);
    }

    pub fn get_auth_state(&self) -> AuthState {
        match &self.token {
            None => AuthState::NotAuthenticated,
            Some(token) if token.is_expired() => AuthState::TokenExpired {
                expired_at: token.expires_at,
            },
            Some(token) => AuthState::Authenticated {
                expires_at: token.expires_at,
            },
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.get_auth_state(), AuthState::Authenticated { .. })
    }

    fn access_token(&self) -> Result<&str, CoreError> {
        match &self.token {
            Some(token) if !token.is_expired() => Ok(&token.access_token),
            Some(_) => Err(CoreError::RedditApi(RedditApiError::InvalidToken)),
            None => Err(CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                reason: "Not authenticated. Call authenticate() first".to_string(),
            })),
        }
    }

    pub fn api(&self) -> &RedditApiClient {
        &self.api
    }
}

impl ThreadSource for RedditClient {
    async fn search_posts(
        &self,
        query: &str,
        listing: &ListingQuery,
    ) -> Result<Vec<Post>, CoreError> {
        let token = self.access_token()?;
        let result = self.api.search(token, query, listing).await?;
        Ok(result.into_items().map(Post::from).collect())
    }

    async fn subreddit_posts(
        &self,
        subreddit: &str,
        listing: &ListingQuery,
    ) -> Result<Vec<Post>, CoreError> {
        let token = self.access_token()?;
        let result = self.api.subreddit_listing(token, subreddit, listing).await?;
        Ok(result.into_items().map(Post::from).collect())
    }

    async fn fetch_comments(
        &self,
        post: &Post,
        query: CommentQuery,
    ) -> Result<Vec<Comment>, CoreError> {
        let token = self.access_token()?;
        let listing = self
            .api
            .comments(token, &post.subreddit, &post.id, query)
            .await?;
        Ok(listing.into_items().map(Comment::from).collect())
    }
}
