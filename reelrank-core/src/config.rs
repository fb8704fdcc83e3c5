//! Run configuration.
//!
//! Topics and endpoints come from an optional TOML file. Secrets only ever
//! come from the environment and are handed to each client at construction.

use crate::error::{ConfigError, CoreError};
use crate::types::{CommentQuery, ListingQuery, SortOrder, Timeframe};
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_USER_AGENT: &str = "MovieRecApp/1.0";
pub const DEFAULT_LLM_MODEL: &str = "deepseek/deepseek-chat-v3.1:free";
pub const DEFAULT_LLM_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const MAX_DEPTH_LIMIT: u32 = 100;

pub const ENV_CLIENT_ID: &str = "CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "CLIENT_SECRET";
pub const ENV_USERNAME: &str = "REDDIT_USERNAME";
pub const ENV_PASSWORD: &str = "PASSWORD";
pub const ENV_OPENROUTER_API_KEY: &str = "OPENROUTER_API_KEY";

const MOVIE_SUBREDDITS: [&str; 3] = ["MovieSuggestions", "moviecritic", "TrueFilm"];

fn require(
    lookup: &impl Fn(&str) -> Option<String>,
    var_name: &str,
) -> Result<String, ConfigError> {
    lookup(var_name)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvironmentVariable {
            var_name: var_name.to_string(),
        })
}

/// Script-app credentials for the Reddit password grant.
#[derive(Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
}

impl RedditCredentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            client_id: require(&lookup, ENV_CLIENT_ID)?,
            client_secret: require(&lookup, ENV_CLIENT_SECRET)?,
            username: require(&lookup, ENV_USERNAME)?,
            password: require(&lookup, ENV_PASSWORD)?,
        })
    }
}

impl fmt::Debug for RedditCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedditCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone)]
pub struct LlmCredentials {
    pub api_key: String,
}

impl LlmCredentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: require(&lookup, ENV_OPENROUTER_API_KEY)?,
        })
    }

    /// First characters of the key, safe for log output.
    pub fn key_prefix(&self) -> &str {
        let end = self
            .api_key
            .char_indices()
            .nth(10)
            .map(|(index, _)| index)
            .unwrap_or(self.api_key.len());
        &self.api_key[..end]
    }
}

impl fmt::Debug for LlmCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmCredentials")
            .field("api_key", &format!("{}...", self.key_prefix()))
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmSettings {
    pub model: String,
    pub base_url: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_LLM_MODEL.to_string(),
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicSource<'a> {
    Search(&'a str),
    Subreddits(&'a [String]),
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TopicConfig {
    pub name: String,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub subreddits: Vec<String>,
    #[serde(default)]
    pub sort: Option<SortOrder>,
    pub timeframe: Timeframe,
    pub post_limit: u32,
    pub comment_limit: u32,
    pub max_depth: u32,
    pub output: PathBuf,
    pub ranked_output: PathBuf,
}

impl TopicConfig {
    pub fn search(name: &str, query: &str, output: &str, ranked_output: &str) -> Self {
        Self {
            name: name.to_string(),
            query: Some(query.to_string()),
            subreddits: Vec::new(),
            sort: None,
            timeframe: Timeframe::Week,
            post_limit: 15,
            comment_limit: 20,
            max_depth: 25,
            output: PathBuf::from(output),
            ranked_output: PathBuf::from(ranked_output),
        }
    }

    pub fn subreddits(
        name: &str,
        subreddits: &[&str],
        timeframe: Timeframe,
        output: &str,
        ranked_output: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            query: None,
            subreddits: subreddits.iter().map(|s| s.to_string()).collect(),
            sort: None,
            timeframe,
            post_limit: 5,
            comment_limit: 10,
            max_depth: 10,
            output: PathBuf::from(output),
            ranked_output: PathBuf::from(ranked_output),
        }
    }

    /// Call only on a validated topic; an invalid one falls back to its subreddits.
    pub fn source(&self) -> TopicSource<'_> {
        match self.query.as_deref() {
            Some(query) if self.subreddits.is_empty() => TopicSource::Search(query),
            _ => TopicSource::Subreddits(&self.subreddits),
        }
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort.unwrap_or(match self.source() {
            TopicSource::Search(_) => SortOrder::Relevance,
            TopicSource::Subreddits(_) => SortOrder::Top,
        })
    }

    pub fn listing_query(&self) -> ListingQuery {
        ListingQuery {
            sort: self.sort_order(),
            timeframe: self.timeframe,
            limit: self.post_limit,
        }
    }

    pub fn comment_query(&self) -> CommentQuery {
        CommentQuery {
            limit: self.comment_limit,
            depth: self.max_depth,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let field = |name: &str| format!("topic.{}.{}", self.name, name);

        if self.name.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "topic.name".to_string(),
            });
        }

        let has_query = self.query.as_deref().is_some_and(|q| !q.trim().is_empty());
        match (has_query, self.subreddits.is_empty()) {
            (true, false) => {
                return Err(ConfigError::ValidationFailed {
                    reason: format!(
                        "topic '{}' sets both query and subreddits; pick one",
                        self.name
                    ),
                })
            }
            (false, true) => {
                return Err(ConfigError::MissingField {
                    field: field("query"),
                })
            }
            _ => {}
        }

        for (name, value) in [
            ("post_limit", self.post_limit),
            ("comment_limit", self.comment_limit),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field(name),
                    value: value.to_string(),
                });
            }
        }

        if self.max_depth > MAX_DEPTH_LIMIT {
            return Err(ConfigError::InvalidValue {
                field: field("max_depth"),
                value: self.max_depth.to_string(),
            });
        }

        if self.output == self.ranked_output {
            return Err(ConfigError::ValidationFailed {
                reason: format!(
                    "topic '{}' writes its ranking over its own input",
                    self.name
                ),
            });
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub output_dir: PathBuf,
    pub user_agent: String,
    pub llm: LlmSettings,
    #[serde(rename = "topic")]
    pub topics: Vec<TopicConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            llm: LlmSettings::default(),
            topics: default_topics(),
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let source = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => CoreError::Config(ConfigError::FileNotFound {
                path: path.display().to_string(),
            }),
            _ => CoreError::Io(e),
        })?;
        Ok(Self::from_toml_str(&source)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "user_agent".to_string(),
            });
        }
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "llm.model".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for topic in &self.topics {
            topic.validate()?;
            if !seen.insert(topic.name.as_str()) {
                return Err(ConfigError::ValidationFailed {
                    reason: format!("duplicate topic name '{}'", topic.name),
                });
            }
        }
        Ok(())
    }

    /// Topics in declaration order, optionally filtered by name.
    pub fn select_topics(&self, names: &[String]) -> Result<Vec<&TopicConfig>, ConfigError> {
        if let Some(unknown) = names
            .iter()
            .find(|name| !self.topics.iter().any(|t| &t.name == *name))
        {
            return Err(ConfigError::UnknownTopic {
                name: unknown.clone(),
            });
        }

        Ok(self
            .topics
            .iter()
            .filter(|topic| names.is_empty() || names.contains(&topic.name))
            .collect())
    }

    pub fn output_path(&self, file: &Path) -> PathBuf {
        self.output_dir.join(file)
    }
}

/// Built-in topics used when no config file is given.
pub fn default_topics() -> Vec<TopicConfig> {
    vec![
        TopicConfig::subreddits(
            "today",
            &MOVIE_SUBREDDITS,
            Timeframe::Day,
            "rectoday.json",
            "todayranked.json",
        ),
        TopicConfig::subreddits(
            "month",
            &MOVIE_SUBREDDITS,
            Timeframe::Month,
            "recmonth.json",
            "monthranked.json",
        ),
        TopicConfig::search("horror", "horror movies", "horror.json", "horrorranked.json"),
        TopicConfig::search("comedy", "comedy movies", "comedy.json", "comedyranked.json"),
        TopicConfig::search("romance", "romance movies", "romance.json", "romanceranked.json"),
        TopicConfig::search(
            "thriller",
            "thriller movies",
            "thriller.json",
            "thrillerranked.json",
        ),
        TopicConfig::search("sk", "south korean movies", "sk.json", "skranked.json"),
        TopicConfig::search("sad", "depressing movies", "sad.json", "sadranked.json"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.topics.len(), 8);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);

        let comedy = config.topics.iter().find(|t| t.name == "comedy").unwrap();
        assert_eq!(comedy.source(), TopicSource::Search("comedy movies"));
        assert_eq!(comedy.sort_order(), SortOrder::Relevance);
        assert_eq!(comedy.comment_query(), CommentQuery { limit: 20, depth: 25 });

        let today = &config.topics[0];
        assert!(matches!(today.source(), TopicSource::Subreddits(subs) if subs.len() == 3));
        assert_eq!(today.sort_order(), SortOrder::Top);
        assert_eq!(today.timeframe, Timeframe::Day);
    }

    #[test]
    fn test_parse_toml() {
        let source = r#"
            output_dir = "data"

            [llm]
            model = "openai/gpt-4o-mini"

            [[topic]]
            name = "noir"
            query = "film noir"
            timeframe = "month"
            post_limit = 10
            comment_limit = 5
            max_depth = 3
            output = "noir.json"
            ranked_output = "noirranked.json"
        "#;

        let config = AppConfig::from_toml_str(source).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("data"));
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.llm.model, "openai/gpt-4o-mini");
        assert_eq!(config.llm.base_url, DEFAULT_LLM_BASE_URL);
        assert_eq!(config.topics.len(), 1);
        assert_eq!(
            config.output_path(&config.topics[0].output),
            PathBuf::from("data").join("noir.json")
        );
    }

    #[test]
    fn test_topic_needs_exactly_one_source() {
        let mut topic = TopicConfig::search("both", "q", "a.json", "b.json");
        topic.subreddits = vec!["movies".to_string()];
        assert!(matches!(
            topic.validate(),
            Err(ConfigError::ValidationFailed { .. })
        ));

        topic.subreddits.clear();
        topic.query = None;
        assert!(matches!(topic.validate(), Err(ConfigError::MissingField { .. })));
    }

    #[test]
    fn test_topic_limits() {
        let mut topic = TopicConfig::search("limits", "q", "a.json", "b.json");
        topic.post_limit = 0;
        assert!(matches!(topic.validate(), Err(ConfigError::InvalidValue { .. })));

        let mut topic = TopicConfig::search("limits", "q", "a.json", "b.json");
        topic.max_depth = MAX_DEPTH_LIMIT + 1;
        assert!(matches!(topic.validate(), Err(ConfigError::InvalidValue { .. })));

        let topic = TopicConfig::search("limits", "q", "same.json", "same.json");
        assert!(matches!(
            topic.validate(),
            Err(ConfigError::ValidationFailed { .. })
        ));
    }

    #[test]
    fn test_duplicate_topic_names() {
        let mut config = AppConfig::default();
        let copy = config.topics[0].clone();
        config.topics.push(copy);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationFailed { .. })
        ));
    }

    #[test]
    fn test_select_topics() {
        let config = AppConfig::default();
        assert_eq!(config.select_topics(&[]).unwrap().len(), 8);

        let selected = config
            .select_topics(&["sad".to_string(), "today".to_string()])
            .unwrap();
        let names: Vec<_> = selected.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["today", "sad"]);

        assert!(matches!(
            config.select_topics(&["westerns".to_string()]),
            Err(ConfigError::UnknownTopic { name }) if name == "westerns"
        ));
    }

    #[test]
    fn test_missing_config_file() {
        let result = AppConfig::load(Path::new("/definitely/not/here.toml"));
        assert!(matches!(
            result,
            Err(CoreError::Config(ConfigError::FileNotFound { .. }))
        ));
    }

    #[test]
    fn test_credentials_from_lookup() {
        let lookup = lookup_from(&[
            (ENV_CLIENT_ID, "id"),
            (ENV_CLIENT_SECRET, "secret"),
            (ENV_USERNAME, "moviebuff"),
            (ENV_PASSWORD, "hunter2"),
        ]);
        let creds = RedditCredentials::from_lookup(lookup).unwrap();
        assert_eq!(creds.username, "moviebuff");
        assert!(!format!("{:?}", creds).contains("hunter2"));

        let missing = RedditCredentials::from_lookup(lookup_from(&[(ENV_CLIENT_ID, "id")]));
        assert!(matches!(
            missing,
            Err(ConfigError::MissingEnvironmentVariable { var_name }) if var_name == ENV_CLIENT_SECRET
        ));
    }

    #[test]
    fn test_llm_key_prefix() {
        let creds =
            LlmCredentials::from_lookup(lookup_from(&[(ENV_OPENROUTER_API_KEY, "sk-or-v1-abcdef123")]))
                .unwrap();
        assert_eq!(creds.key_prefix(), "sk-or-v1-a");
        assert!(!format!("{:?}", creds).contains("abcdef123"));

        let blank = LlmCredentials::from_lookup(lookup_from(&[(ENV_OPENROUTER_API_KEY, "  ")]));
        assert!(blank.is_err());
    }
}
