//! Thread rendering.
//!
//! Fetches posts and comment trees through a [`ThreadSource`] and lays them
//! out as one Markdown-ish document per topic. Fetch failures become inline
//! error lines so one bad post or subreddit never aborts a topic.

use crate::artifact;
use crate::config::{AppConfig, TopicConfig, TopicSource};
use crate::error::CoreError;
use crate::flatten::flatten_comments;
use crate::types::{Comment, CommentQuery, ListingQuery, Post, RenderedDocument};
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

/// Where posts and comment trees come from.
pub trait ThreadSource {
    async fn search_posts(&self, query: &str, listing: &ListingQuery)
        -> Result<Vec<Post>, CoreError>;

    async fn subreddit_posts(
        &self,
        subreddit: &str,
        listing: &ListingQuery,
    ) -> Result<Vec<Post>, CoreError>;

    async fn fetch_comments(
        &self,
        post: &Post,
        query: CommentQuery,
    ) -> Result<Vec<Comment>, CoreError>;
}

/// A post together with the outcome of fetching its comments.
#[derive(Debug)]
pub struct PostThread {
    pub post: Post,
    pub comments: Result<Vec<Comment>, CoreError>,
}

fn inline_reason(error: &CoreError) -> String {
    match error {
        CoreError::RedditApi(e) => e.to_string(),
        other => other.to_string(),
    }
}

pub fn render_post(
    doc: &mut RenderedDocument,
    index: usize,
    thread: &PostThread,
    query: CommentQuery,
) {
    let post = &thread.post;
    doc.push_line(format!(
        "## {}. {} (from r/{})",
        index, post.title, post.subreddit
    ));
    doc.push_blank();
    doc.push_line(format!("**Score:** {}", post.score));
    doc.push_line(format!("**URL:** {}", post.url));
    if let Some(body) = post.body.as_deref().filter(|b| !b.is_empty()) {
        doc.push_line(format!("**Body:** {}", body));
    }
    doc.push_blank();

    match &thread.comments {
        Ok(comments) => {
            let taken = &comments[..comments.len().min(query.limit as usize)];
            doc.push_line(format!(
                "### Top {} comments and their replies (up to depth {})",
                taken.len(),
                query.depth
            ));
            doc.push_blank();
            doc.extend_lines(flatten_comments(taken, query.depth));
            doc.push_blank();
        }
        Err(e) => {
            doc.push_line(format!("**Error fetching comments:** {}", inline_reason(e)));
            doc.push_blank();
        }
    }
}

pub fn render_posts(doc: &mut RenderedDocument, threads: &[PostThread], query: CommentQuery) {
    for (index, thread) in threads.iter().enumerate() {
        render_post(doc, index + 1, thread, query);
    }
}

async fn collect_threads<S: ThreadSource>(
    source: &S,
    posts: Vec<Post>,
    query: CommentQuery,
) -> Vec<PostThread> {
    let mut threads = Vec::with_capacity(posts.len());
    for post in posts {
        debug!("Fetching comments for post {} in r/{}", post.id, post.subreddit);
        let comments = source.fetch_comments(&post, query).await;
        if let Err(e) = &comments {
            warn!("Comment fetch failed for post {}: {}", post.id, e);
        }
        threads.push(PostThread { post, comments });
    }
    threads
}

/// Fetches and renders every post of `topic`. Never fails: fetch errors are
/// written into the document.
pub async fn build_document<S: ThreadSource>(source: &S, topic: &TopicConfig) -> RenderedDocument {
    let mut doc = RenderedDocument::new();
    let listing = topic.listing_query();
    let comment_query = topic.comment_query();

    match topic.source() {
        TopicSource::Search(query) => {
            info!("Fetching data for: {}", query);
            match source.search_posts(query, &listing).await {
                Ok(posts) => {
                    info!("Search '{}' returned {} posts", query, posts.len());
                    let threads = collect_threads(source, posts, comment_query).await;
                    render_posts(&mut doc, &threads, comment_query);
                    doc.push_line("---");
                    doc.push_blank();
                }
                Err(e) => {
                    warn!("Search '{}' failed: {}", query, e);
                    doc.push_line(format!("**Error in search:** {}", inline_reason(&e)));
                }
            }
        }
        TopicSource::Subreddits(subreddits) => {
            for subreddit in subreddits {
                info!("Fetching top posts from r/{} ({})", subreddit, listing.timeframe);
                doc.push_line(format!(
                    "# Top {} posts from r/{} {}",
                    listing.limit, subreddit, listing.timeframe
                ));
                doc.push_blank();

                match source.subreddit_posts(subreddit, &listing).await {
                    Ok(posts) => {
                        let threads = collect_threads(source, posts, comment_query).await;
                        render_posts(&mut doc, &threads, comment_query);
                    }
                    Err(e) => {
                        warn!("Listing for r/{} failed: {}", subreddit, e);
                        doc.push_line(format!(
                            "**Error for r/{}:** {}",
                            subreddit,
                            inline_reason(&e)
                        ));
                    }
                }
                doc.push_line("---");
                doc.push_blank();
            }
        }
    }

    doc
}

#[derive(Debug, Default)]
pub struct StageReport {
    pub written: Vec<PathBuf>,
    pub failed: Vec<(String, CoreError)>,
}

impl StageReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Builds and persists each topic's document in order, writing each one as
/// soon as it is rendered.
pub async fn fetch_stage<S: ThreadSource>(
    source: &S,
    config: &AppConfig,
    topics: &[&TopicConfig],
) -> StageReport {
    let mut report = StageReport::default();

    for topic in topics {
        let doc = build_document(source, topic).await;
        let path = config.output_path(&topic.output);
        match artifact::write_content(&path, &doc) {
            Ok(()) => {
                info!("Results saved to {}", path.display());
                report.written.push(path);
            }
            Err(e) => {
                error!("Failed to write {}: {}", path.display(), e);
                report.failed.push((topic.name.clone(), e));
            }
        }
    }

    report
}
