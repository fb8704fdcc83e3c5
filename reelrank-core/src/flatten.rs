//! Comment tree flattening.
//!
//! Turns a forest of [`Comment`]s into depth-annotated text lines. Top-level
//! comments are numbered by their position in the listing, replies are
//! bulleted and indented two spaces per level.

use crate::types::Comment;

const INDENT: &str = "  ";

struct Frame<'a> {
    comment: &'a Comment,
    depth: u32,
    ordinal: usize,
}

/// Flattens `comments` depth-first, pre-order, dropping removed comments
/// together with their replies and anything deeper than `max_depth`.
pub fn flatten_comments(comments: &[Comment], max_depth: u32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut stack: Vec<Frame<'_>> = comments
        .iter()
        .enumerate()
        .rev()
        .map(|(index, comment)| Frame {
            comment,
            depth: 0,
            ordinal: index + 1,
        })
        .collect();

    while let Some(frame) = stack.pop() {
        if frame.depth > max_depth || frame.comment.is_removed() {
            continue;
        }

        lines.push(render_line(&frame));

        if frame.depth < max_depth {
            stack.extend(frame.comment.replies.iter().rev().map(|reply| Frame {
                comment: reply,
                depth: frame.depth + 1,
                ordinal: 0,
            }));
        }
    }

    lines
}

fn render_line(frame: &Frame<'_>) -> String {
    let body = frame.comment.body.as_deref().unwrap_or_default();
    if frame.depth == 0 {
        format!("{}. {}", frame.ordinal, body)
    } else {
        format!("{}- {}", INDENT.repeat(frame.depth as usize), body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(body: &str, replies: Vec<Comment>) -> Comment {
        Comment::new("user", body).with_replies(replies)
    }

    fn chain(depth: usize) -> Comment {
        let mut node = reply(&format!("level {}", depth), vec![]);
        for level in (0..depth).rev() {
            node = reply(&format!("level {}", level), vec![node]);
        }
        node
    }

    fn line_depth(line: &str) -> usize {
        let leading = line.len() - line.trim_start_matches(' ').len();
        leading / INDENT.len()
    }

    #[test]
    fn test_pre_order_with_markers() {
        let tree = vec![
            reply(
                "first",
                vec![reply("first-a", vec![reply("first-a-i", vec![])]), reply("first-b", vec![])],
            ),
            reply("second", vec![]),
        ];

        let lines = flatten_comments(&tree, 25);
        assert_eq!(
            lines,
            vec![
                "1. first",
                "  - first-a",
                "    - first-a-i",
                "  - first-b",
                "2. second",
            ]
        );
    }

    #[test]
    fn test_removed_node_drops_subtree_keeps_siblings() {
        let deleted = Comment {
            author: Some("[deleted]".to_string()),
            body: Some("[deleted]".to_string()),
            replies: vec![reply("orphan", vec![reply("orphan child", vec![])])],
        };
        let tree = vec![reply(
            "root",
            vec![reply("kept before", vec![]), deleted, reply("kept after", vec![])],
        )];

        let lines = flatten_comments(&tree, 25);
        assert_eq!(lines, vec!["1. root", "  - kept before", "  - kept after"]);
        assert!(lines.iter().all(|l| !l.contains("orphan")));
    }

    #[test]
    fn test_removed_top_level_keeps_numbering() {
        let tree = vec![
            reply("one", vec![]),
            Comment::new("someone", "[removed]").with_replies(vec![reply("hidden", vec![])]),
            reply("three", vec![]),
        ];

        let lines = flatten_comments(&tree, 25);
        assert_eq!(lines, vec!["1. one", "3. three"]);
    }

    #[test]
    fn test_missing_fields_are_skipped() {
        let placeholder = Comment::default();
        let tree = vec![reply("visible", vec![placeholder])];

        assert_eq!(flatten_comments(&tree, 5), vec!["1. visible"]);
    }

    #[test]
    fn test_depth_bound() {
        let tree = vec![chain(40)];
        let max_depth = 25;

        let lines = flatten_comments(&tree, max_depth);
        assert_eq!(lines.len(), max_depth as usize + 1);
        assert!(lines.iter().all(|l| line_depth(l) <= max_depth as usize));
        assert_eq!(lines.last().unwrap(), &format!("{}- level 25", INDENT.repeat(25)));
    }

    #[test]
    fn test_zero_depth_renders_only_top_level() {
        let tree = vec![reply("top", vec![reply("reply", vec![])])];
        assert_eq!(flatten_comments(&tree, 0), vec!["1. top"]);
    }

    #[test]
    fn test_deterministic_for_identical_trees() {
        let build = || {
            vec![
                reply("a", vec![reply("b", vec![chain(6)]), reply("c", vec![])]),
                reply("d", vec![reply("e", vec![])]),
            ]
        };

        let first = flatten_comments(&build(), 4).join("\n");
        let second = flatten_comments(&build(), 4).join("\n");
        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn test_multiline_body_is_kept_verbatim() {
        let tree = vec![reply("line one\n\nline two", vec![])];
        assert_eq!(flatten_comments(&tree, 1), vec!["1. line one\n\nline two"]);
    }
}
