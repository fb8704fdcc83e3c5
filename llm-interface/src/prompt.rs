const RANKING_INSTRUCTIONS: &str = r#"
Based on the following Reddit discussions from movie subreddits, analyze the posts and comments to identify the most recommended or discussed movies.

Create a ranked list of the top 20 movies mentioned and dont mention the year, in JSON format with the following structure:
{
  "ranked_movies": [
    {
      "rank": 1,
      "title": "Movie Title",
      "reason": "Why it's recommended or why have you ranked it such rank"
    },
    ...
  ]
}

Reddit Discussions:
"#;

/// Embeds the rendered discussions verbatim below the ranking instructions.
pub fn build_ranking_prompt(content: &str) -> String {
    let mut prompt = String::with_capacity(RANKING_INSTRUCTIONS.len() + content.len() + 1);
    prompt.push_str(RANKING_INSTRUCTIONS);
    prompt.push_str(content);
    prompt.push('\n');
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_content_verbatim() {
        let content = "## 1. Heat (from r/movies)\n\n{\"not\": \"escaped\"}\n";
        let prompt = build_ranking_prompt(content);

        assert!(prompt.starts_with("\nBased on the following Reddit discussions"));
        assert!(prompt.contains("top 20 movies mentioned and dont mention the year"));
        assert!(prompt.contains("\"ranked_movies\": ["));
        assert!(prompt.ends_with(&format!("Reddit Discussions:\n{}\n", content)));
    }
}
