use serde::{Deserialize, Serialize};
use std::fmt;

/// Values Reddit substitutes for the author or body of deleted content.
pub const REMOVED_MARKERS: [&str; 2] = ["[deleted]", "[removed]"];

#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub score: i64,
    pub url: String,
    pub body: Option<String>,
    pub subreddit: String,
}

/// One node of a comment tree. A missing author or body is kept as `None`
/// and treated the same as the removed markers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Comment {
    pub author: Option<String>,
    pub body: Option<String>,
    pub replies: Vec<Comment>,
}

impl Comment {
    pub fn new(author: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            author: Some(author.into()),
            body: Some(body.into()),
            replies: Vec::new(),
        }
    }

    pub fn with_replies(mut self, replies: Vec<Comment>) -> Self {
        self.replies = replies;
        self
    }

    pub fn is_removed(&self) -> bool {
        resolves_to_removed(self.author.as_deref()) || resolves_to_removed(self.body.as_deref())
    }
}

fn resolves_to_removed(value: Option<&str>) -> bool {
    match value {
        None => true,
        Some(text) => REMOVED_MARKERS
            .iter()
            .any(|marker| text.eq_ignore_ascii_case(marker)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    Hour,
    Day,
    Week,
    Month,
    Year,
    All,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Hour => "hour",
            Timeframe::Day => "day",
            Timeframe::Week => "week",
            Timeframe::Month => "month",
            Timeframe::Year => "year",
            Timeframe::All => "all",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Relevance,
    Top,
    Hot,
    New,
    Comments,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Relevance => "relevance",
            SortOrder::Top => "top",
            SortOrder::Hot => "hot",
            SortOrder::New => "new",
            SortOrder::Comments => "comments",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for a single search or subreddit listing request.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingQuery {
    pub sort: SortOrder,
    pub timeframe: Timeframe,
    pub limit: u32,
}

/// Parameters for a comment tree request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentQuery {
    pub limit: u32,
    pub depth: u32,
}

/// Append-only sequence of lines making up one topic's document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedDocument {
    lines: Vec<String>,
}

impl RenderedDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn push_blank(&mut self) {
        self.lines.push(String::new());
    }

    pub fn extend_lines<I>(&mut self, lines: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.lines.extend(lines);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Every line terminated by a newline.
    pub fn content(&self) -> String {
        let mut content = String::with_capacity(self.lines.iter().map(|l| l.len() + 1).sum());
        for line in &self.lines {
            content.push_str(line);
            content.push('\n');
        }
        content
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedMovie {
    pub rank: u32,
    pub title: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedList {
    pub ranked_movies: Vec<RankedMovie>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removed_markers() {
        assert!(Comment::new("[deleted]", "text").is_removed());
        assert!(Comment::new("someone", "[removed]").is_removed());
        assert!(Comment::new("someone", "[Deleted]").is_removed());
        assert!(!Comment::new("someone", "deleted my account").is_removed());

        let missing_body = Comment {
            author: Some("someone".to_string()),
            body: None,
            replies: Vec::new(),
        };
        assert!(missing_body.is_removed());
    }

    #[test]
    fn test_document_content_terminates_lines() {
        let mut doc = RenderedDocument::new();
        doc.push_line("## 1. Title");
        doc.push_blank();
        assert_eq!(doc.content(), "## 1. Title\n\n");
        assert_eq!(doc.lines().len(), 2);
    }

    #[test]
    fn test_ranked_list_shape() {
        let json = r#"{"ranked_movies": [{"rank": 1, "title": "Heat", "reason": "Often cited"}]}"#;
        let list: RankedList = serde_json::from_str(json).unwrap();
        assert_eq!(list.ranked_movies[0].rank, 1);
        assert_eq!(list.ranked_movies[0].title, "Heat");
    }
}
