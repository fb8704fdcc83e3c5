use crate::LlmProvider;
use reelrank_core::{CoreError, LlmCredentials, LlmError, LlmSettings};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const PROVIDER: &str = "OpenRouter";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

fn transport_error(error: reqwest::Error) -> CoreError {
    if error.is_timeout() {
        LlmError::RequestTimeout {
            provider: PROVIDER.to_string(),
        }
        .into()
    } else {
        CoreError::Network(error)
    }
}

pub struct OpenRouterProvider {
    credentials: LlmCredentials,
    model: String,
    base_url: String,
    http: reqwest::Client,
}

impl OpenRouterProvider {
    pub fn new(credentials: LlmCredentials, settings: &LlmSettings) -> Self {
        info!("API key found: {}...", credentials.key_prefix());
        Self {
            credentials,
            model: settings.model.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl LlmProvider for OpenRouterProvider {
    async fn complete(&self, prompt: &str) -> Result<String, CoreError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        debug!("OpenRouter chat request: model={}, {} prompt chars", self.model, prompt.len());

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.credentials.api_key)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        info!("API response status: {}", status.as_u16());

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(LlmError::InvalidApiKey {
                provider: PROVIDER.to_string(),
            }
            .into());
        }
        if !status.is_success() {
            let body = response.text().await.map_err(transport_error)?;
            return Err(LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                status_code: status.as_u16(),
                body,
            }
            .into());
        }

        let bytes = response.bytes().await.map_err(transport_error)?;
        let chat: ChatResponse =
            serde_json::from_slice(&bytes).map_err(|e| LlmError::InvalidResponseFormat {
                provider: PROVIDER.to_string(),
                details: e.to_string(),
            })?;

        let choice = chat
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::EmptyResponse {
                provider: PROVIDER.to_string(),
            })?;

        choice.message.content.ok_or_else(|| {
            LlmError::InvalidResponseFormat {
                provider: PROVIDER.to_string(),
                details: "first choice has no message content".to_string(),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::MockServer;
    use serde_json::json;

    fn provider_for(server: &MockServer) -> OpenRouterProvider {
        let settings = LlmSettings {
            model: "deepseek/deepseek-chat-v3.1:free".to_string(),
            base_url: server.base_url(),
        };
        let credentials = LlmCredentials {
            api_key: "sk-or-test-key".to_string(),
        };
        OpenRouterProvider::new(credentials, &settings)
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method("POST")
                    .path("/chat/completions")
                    .header("authorization", "Bearer sk-or-test-key")
                    .json_body(json!({
                        "model": "deepseek/deepseek-chat-v3.1:free",
                        "messages": [{"role": "user", "content": "rank these"}]
                    }));
                then.status(200)
                    .header("content-type", "application/json")
                    .body(
                        json!({"choices": [
                            {"message": {"role": "assistant", "content": "first"}},
                            {"message": {"role": "assistant", "content": "second"}}
                        ]})
                        .to_string(),
                    );
            })
            .await;

        let provider = provider_for(&server);
        assert_eq!(provider.complete("rank these").await.unwrap(), "first");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_empty_choices() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("POST").path("/chat/completions");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(r#"{"choices": []}"#);
            })
            .await;

        let result = provider_for(&server).complete("prompt").await;
        assert!(matches!(
            result,
            Err(CoreError::Llm(LlmError::EmptyResponse { .. }))
        ));
    }

    #[tokio::test]
    async fn test_non_success_status_keeps_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("POST").path("/chat/completions");
                then.status(429).body("rate limited");
            })
            .await;

        match provider_for(&server).complete("prompt").await {
            Err(CoreError::Llm(LlmError::RequestFailed {
                status_code, body, ..
            })) => {
                assert_eq!(status_code, 429);
                assert_eq!(body, "rate limited");
            }
            other => panic!("Expected RequestFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unauthorized_is_invalid_key() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("POST").path("/chat/completions");
                then.status(401).body(r#"{"error": {"message": "No auth credentials found"}}"#);
            })
            .await;

        let result = provider_for(&server).complete("prompt").await;
        assert!(matches!(
            result,
            Err(CoreError::Llm(LlmError::InvalidApiKey { .. }))
        ));
    }

    #[tokio::test]
    async fn test_malformed_envelope() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("POST").path("/chat/completions");
                then.status(200).body("<html>gateway</html>");
            })
            .await;

        let result = provider_for(&server).complete("prompt").await;
        assert!(matches!(
            result,
            Err(CoreError::Llm(LlmError::InvalidResponseFormat { .. }))
        ));
    }
}
