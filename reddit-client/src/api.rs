use reelrank_core::{
    Comment, CommentQuery, ConfigError, CoreError, ListingQuery, Post, RedditApiError,
};
use reqwest::{Client, Method, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};
use url::Url;

pub const REDDIT_API_BASE: &str = "https://oauth.reddit.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListing<T> {
    pub kind: String,
    pub data: RedditListingData<T>,
}

impl<T> RedditListing<T> {
    pub fn empty() -> Self {
        Self {
            kind: "Listing".to_string(),
            data: RedditListingData {
                children: Vec::new(),
                after: None,
                before: None,
                dist: None,
            },
        }
    }

    pub fn into_items(self) -> impl Iterator<Item = T> {
        self.data.children.into_iter().map(|child| child.data)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingData<T> {
    pub children: Vec<RedditListingChild<T>>,
    pub after: Option<String>,
    pub before: Option<String>,
    pub dist: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingChild<T> {
    pub kind: String,
    pub data: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditPostData {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    #[serde(default)]
    pub author: String,
    pub subreddit: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub permalink: String,
    #[serde(default)]
    pub created_utc: f64,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub num_comments: u64,
    #[serde(default)]
    pub over_18: bool,
    #[serde(default)]
    pub stickied: bool,
    #[serde(default)]
    pub is_self: bool,
}

/// Comment payload. `more` placeholders deserialize into this too, with no
/// author and no body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedditCommentData {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub score: Option<i64>,
    #[serde(default)]
    pub replies: Option<RedditReplies>,
}

/// Reddit sends `""` instead of a listing when a comment has no replies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RedditReplies {
    Listing(Box<RedditListing<RedditCommentData>>),
    Empty(String),
}

impl From<RedditPostData> for Post {
    fn from(post_data: RedditPostData) -> Self {
        Self {
            id: post_data.id,
            title: post_data.title,
            score: post_data.score,
            url: post_data.url,
            body: if post_data.selftext.is_empty() {
                None
            } else {
                Some(post_data.selftext)
            },
            subreddit: post_data.subreddit,
        }
    }
}

impl From<RedditCommentData> for Comment {
    fn from(comment_data: RedditCommentData) -> Self {
        let replies = match comment_data.replies {
            Some(RedditReplies::Listing(listing)) => listing.into_items().map(Comment::from).collect(),
            _ => Vec::new(),
        };
        Self {
            author: comment_data.author,
            body: comment_data.body,
            replies,
        }
    }
}

fn status_error(status: StatusCode, endpoint: &str, body: String) -> RedditApiError {
    match status.as_u16() {
        401 => RedditApiError::InvalidToken,
        403 => RedditApiError::Forbidden {
            resource: endpoint.to_string(),
        },
        404 => RedditApiError::NotFound {
            resource: endpoint.to_string(),
        },
        429 => RedditApiError::RateLimitExceeded { status_code: 429 },
        code if status.is_server_error() => RedditApiError::ServerError { status_code: code },
        code => RedditApiError::UnexpectedStatus {
            status_code: code,
            body,
        },
    }
}

/// Decodes the two-element comment page. The second element holds the tree;
/// a page without one has no comments.
pub fn parse_comment_page(bytes: &[u8]) -> Result<RedditListing<RedditCommentData>, CoreError> {
    // Deep reply chains exceed serde_json's default nesting limit.
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    deserializer.disable_recursion_limit();
    let mut page = Vec::<serde_json::Value>::deserialize(&mut deserializer).map_err(|e| {
        CoreError::RedditApi(RedditApiError::InvalidResponse {
            details: format!("comment page is not a JSON array: {}", e),
        })
    })?;

    if page.len() < 2 {
        return Ok(RedditListing::empty());
    }

    serde_json::from_value(page.swap_remove(1)).map_err(|e| {
        CoreError::RedditApi(RedditApiError::InvalidResponse {
            details: format!("comment listing has unexpected shape: {}", e),
        })
    })
}

#[derive(Debug)]
pub struct RedditApiClient {
    http_client: Client,
    api_base: String,
    user_agent: String,
}

impl RedditApiClient {
    pub fn new(user_agent: &str, api_base: &str) -> Result<Self, CoreError> {
        Url::parse(api_base).map_err(|e| ConfigError::InvalidValue {
            field: "reddit.api_base".to_string(),
            value: format!("{} ({})", api_base, e),
        })?;

        let http_client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http_client,
            api_base: api_base.trim_end_matches('/').to_string(),
            user_agent: user_agent.to_string(),
        })
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub async fn make_request(
        &self,
        method: Method,
        endpoint: &str,
        access_token: &str,
        query_params: &[(&str, &str)],
    ) -> Result<Response, CoreError> {
        let url = format!("{}{}", self.api_base, endpoint);

        let request_builder = self
            .http_client
            .request(method.clone(), &url)
            .bearer_auth(access_token)
            .query(query_params);

        info!("Making Reddit API request: {} {}", method, endpoint);
        let response = request_builder.send().await.map_err(|e| {
            error!("Network error for {} {}: {}", method, endpoint, e);
            if e.is_timeout() {
                CoreError::RedditApi(RedditApiError::RequestTimeout)
            } else {
                CoreError::Network(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            error!("Request failed with status: {} for {}", status, endpoint);
            let body = response.text().await.unwrap_or_default();
            return Err(CoreError::RedditApi(status_error(status, endpoint, body)));
        }

        debug!("Request successful: {} {}", status, endpoint);
        Ok(response)
    }

    async fn get_listing(
        &self,
        access_token: &str,
        endpoint: &str,
        query_params: &[(&str, &str)],
    ) -> Result<RedditListing<RedditPostData>, CoreError> {
        let response = self
            .make_request(Method::GET, endpoint, access_token, query_params)
            .await?;

        response.json().await.map_err(|e| {
            error!("Failed to parse listing from {}: {}", endpoint, e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse posts from {}", endpoint),
            })
        })
    }

    pub async fn search(
        &self,
        access_token: &str,
        query: &str,
        listing: &ListingQuery,
    ) -> Result<RedditListing<RedditPostData>, CoreError> {
        let limit = listing.limit.to_string();
        let params = [
            ("q", query),
            ("sort", listing.sort.as_str()),
            ("t", listing.timeframe.as_str()),
            ("limit", limit.as_str()),
        ];

        let result = self.get_listing(access_token, "/search", &params).await?;
        info!(
            "Retrieved {} posts for search '{}'",
            result.data.children.len(),
            query
        );
        Ok(result)
    }

    pub async fn subreddit_listing(
        &self,
        access_token: &str,
        subreddit: &str,
        listing: &ListingQuery,
    ) -> Result<RedditListing<RedditPostData>, CoreError> {
        let endpoint = format!("/r/{}/{}", subreddit, listing.sort);
        let limit = listing.limit.to_string();
        let params = [("t", listing.timeframe.as_str()), ("limit", limit.as_str())];

        let result = self.get_listing(access_token, &endpoint, &params).await?;
        info!(
            "Retrieved {} posts from r/{}",
            result.data.children.len(),
            subreddit
        );
        Ok(result)
    }

    pub async fn comments(
        &self,
        access_token: &str,
        subreddit: &str,
        post_id: &str,
        query: CommentQuery,
    ) -> Result<RedditListing<RedditCommentData>, CoreError> {
        let endpoint = format!("/r/{}/comments/{}.json", subreddit, post_id);
        let limit = query.limit.to_string();
        let depth = query.depth.to_string();
        let params = [("limit", limit.as_str()), ("depth", depth.as_str())];

        let response = self
            .make_request(Method::GET, &endpoint, access_token, &params)
            .await?;
        let bytes = response.bytes().await?;
        let listing = parse_comment_page(&bytes)?;

        debug!(
            "Retrieved {} top-level comments for {}",
            listing.data.children.len(),
            post_id
        );
        Ok(listing)
    }
}
