use reelrank_core::{ConfigError, CoreError, ErrorExt, ErrorReporter, LlmError, RedditApiError};

#[test]
fn test_error_codes() {
    let reddit_error = CoreError::RedditApi(RedditApiError::InvalidToken);
    assert_eq!(reddit_error.error_code(), "REDDIT_API");

    let llm_error = CoreError::Llm(LlmError::InvalidApiKey {
        provider: "openrouter".to_string(),
    });
    assert_eq!(llm_error.error_code(), "LLM");

    let config_error = CoreError::Config(ConfigError::MissingField {
        field: "api_key".to_string(),
    });
    assert_eq!(config_error.error_code(), "CONFIG");

    let artifact_error = CoreError::Artifact {
        path: "comedy.json".to_string(),
        reason: "missing".to_string(),
    };
    assert_eq!(artifact_error.error_code(), "ARTIFACT");
}

#[test]
fn test_fatal_errors() {
    let auth_error = CoreError::RedditApi(RedditApiError::AuthenticationFailed {
        reason: "invalid_grant".to_string(),
    });
    assert!(auth_error.is_fatal());

    let fetch_error = CoreError::RedditApi(RedditApiError::ServerError { status_code: 503 });
    assert!(!fetch_error.is_fatal());

    let parse_error = CoreError::Llm(LlmError::ParseFailure {
        strategy: "whole body".to_string(),
        reason: "expected value".to_string(),
        preview: "Sure! Here are".to_string(),
    });
    assert!(!parse_error.is_fatal());

    let config_error = CoreError::Config(ConfigError::MissingEnvironmentVariable {
        var_name: "CLIENT_ID".to_string(),
    });
    assert!(config_error.is_fatal());
}

#[test]
fn test_unexpected_status_display() {
    let error = RedditApiError::UnexpectedStatus {
        status_code: 418,
        body: "teapot".to_string(),
    };
    assert_eq!(error.to_string(), "418 - teapot");
}

#[test]
fn test_user_friendly_messages() {
    let reddit_error = CoreError::RedditApi(RedditApiError::InvalidToken);
    let message = reddit_error.user_friendly_message();
    assert!(message.contains("authentication token is invalid"));

    let config_error = CoreError::Config(ConfigError::MissingField {
        field: "api_key".to_string(),
    });
    assert!(config_error.user_friendly_message().contains("api_key"));

    let topic_error = CoreError::Config(ConfigError::UnknownTopic {
        name: "westerns".to_string(),
    });
    assert!(topic_error.user_friendly_message().contains("westerns"));
}

#[test]
fn test_error_reporter() {
    let reporter = ErrorReporter::new()
        .with_error_reporting(true)
        .with_warning_reporting(true);
    let error = CoreError::Llm(LlmError::ParseFailure {
        strategy: "fenced block".to_string(),
        reason: "trailing comma".to_string(),
        preview: "```json {".to_string(),
    });

    // This test just ensures the methods don't panic
    reporter.report_error(&error);
    reporter.report_warning(&error);
}
