//! OpenAI-compatible image generation and chat completion client.

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use vthumb_models::ImageRef;

use crate::config::{build_http_client, OpenAiConfig};
use crate::error::{ProviderError, ProviderResult};
use crate::http::post_json;
use crate::retry::with_retry;
use crate::traits::{
    ChatCompleter, ChatCompletion, ChatRequest, ImageGenerationRequest, ImageGenerator,
};

const PROVIDER: &str = "openai";

#[derive(Debug, Serialize)]
struct ImagesRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    size: &'a str,
    quality: &'a str,
    n: u8,
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    url: Option<String>,
    b64_json: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatCompletionsRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Client for `/v1/images/generations` and `/v1/chat/completions`.
#[derive(Clone)]
pub struct OpenAiClient {
    http: Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    /// Create a client with its own tuned HTTP pool.
    pub fn new(config: OpenAiConfig) -> ProviderResult<Self> {
        let http = build_http_client(config.timeout, config.connect_timeout)?;
        Ok(Self::with_http(http, config))
    }

    /// Create a client on an existing HTTP handle.
    pub fn with_http(http: Client, config: OpenAiConfig) -> Self {
        Self { http, config }
    }

    /// Create from environment variables.
    pub fn from_env() -> ProviderResult<Self> {
        Self::new(OpenAiConfig::from_env()?)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    fn image_from_datum(datum: ImageDatum) -> ProviderResult<ImageRef> {
        if let Some(url) = datum.url.filter(|u| !u.trim().is_empty()) {
            return Ok(ImageRef::url(url));
        }
        if let Some(encoded) = datum.b64_json.filter(|b| !b.trim().is_empty()) {
            let bytes = general_purpose::STANDARD
                .decode(encoded.trim())
                .map_err(|e| ProviderError::invalid_response(format!("bad b64_json: {}", e)))?;
            return Ok(ImageRef::inline("image/png", bytes));
        }
        Err(ProviderError::empty_response("image entry has neither url nor b64_json"))
    }
}

#[async_trait]
impl ImageGenerator for OpenAiClient {
    async fn generate(&self, request: &ImageGenerationRequest) -> ProviderResult<ImageRef> {
        let url = self.endpoint("/v1/images/generations");
        let body = ImagesRequest {
            model: &self.config.image_model,
            prompt: &request.prompt,
            size: &request.size,
            quality: request.quality.as_str(),
            n: 1,
        };

        debug!(
            model = %self.config.image_model,
            quality = %request.quality,
            prompt_len = request.prompt.len(),
            "Requesting image generation"
        );

        let (http, api_key, url, body) = (&self.http, self.config.api_key.as_str(), url.as_str(), &body);
        let response: ImagesResponse =
            with_retry(&self.config.retry, PROVIDER, "generate_image", move || {
                post_json(http, PROVIDER, "generate_image", url, api_key, body)
            })
            .await?;

        let datum = response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::empty_response("no images in response"))?;

        let image = Self::image_from_datum(datum)?;
        info!(model = %self.config.image_model, "Image generated");
        Ok(image)
    }
}

#[async_trait]
impl ChatCompleter for OpenAiClient {
    async fn complete(&self, request: &ChatRequest) -> ProviderResult<ChatCompletion> {
        let url = self.endpoint("/v1/chat/completions");
        let body = ChatCompletionsRequest {
            model: &self.config.chat_model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user_prompt,
                },
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let (http, api_key, url, body) = (&self.http, self.config.api_key.as_str(), url.as_str(), &body);
        let response: ChatCompletionsResponse =
            with_retry(&self.config.retry, PROVIDER, "chat_completion", move || {
                post_json(http, PROVIDER, "chat_completion", url, api_key, body)
            })
            .await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::empty_response("no choices in completion"))?;

        let text = choice
            .message
            .and_then(|m| m.content)
            .map(|c| c.trim().to_string())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(ProviderError::empty_response("completion has no content"));
        }

        Ok(ChatCompletion {
            text,
            truncated: choice.finish_reason.as_deref() == Some("length"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryConfig;
    use serde_json::json;
    use std::time::Duration;
    use vthumb_models::ImageQuality;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> OpenAiClient {
        let config = OpenAiConfig {
            api_key: "sk-test".to_string(),
            base_url: server.uri(),
            image_model: "dall-e-3".to_string(),
            chat_model: "gpt-4o-mini".to_string(),
            timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
            retry: RetryConfig {
                max_retries: 1,
                base_delay_ms: 1,
                max_delay_ms: 5,
            },
        };
        OpenAiClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_generate_returns_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/images/generations"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "size": "1792x1024",
                "quality": "hd",
                "n": 1
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"url": "https://img.example.com/1.png"}]
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let image = client
            .generate(&ImageGenerationRequest::new("a chef", ImageQuality::Hd))
            .await
            .unwrap();
        assert_eq!(image, ImageRef::url("https://img.example.com/1.png"));
    }

    #[tokio::test]
    async fn test_generate_decodes_inline_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/images/generations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"b64_json": "AQID"}]
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let image = client
            .generate(&ImageGenerationRequest::new("a chef", ImageQuality::Standard))
            .await
            .unwrap();
        assert_eq!(image, ImageRef::inline("image/png", vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn test_generate_empty_data_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/images/generations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client
            .generate(&ImageGenerationRequest::new("x", ImageQuality::Hd))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::EmptyResponse(_)));
    }

    #[tokio::test]
    async fn test_generate_rejection_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/images/generations"))
            .respond_with(ResponseTemplate::new(400).set_body_string("content_policy_violation"))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client
            .generate(&ImageGenerationRequest::new("x", ImageQuality::Hd))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Rejected { status: 400, .. }));
    }

    #[tokio::test]
    async fn test_generate_server_error_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/images/generations"))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client
            .generate(&ImageGenerationRequest::new("x", ImageQuality::Hd))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_complete_reports_truncation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({ "max_tokens": 100 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{
                    "message": {"role": "assistant", "content": "  A chef juggling pans  "},
                    "finish_reason": "length"
                }]
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let completion = client
            .complete(&ChatRequest::new("system", "user"))
            .await
            .unwrap();
        assert_eq!(completion.text, "A chef juggling pans");
        assert!(completion.truncated);
    }

    #[tokio::test]
    async fn test_complete_without_content_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": ""}, "finish_reason": "stop"}]
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client
            .complete(&ChatRequest::new("system", "user"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::EmptyResponse(_)));
    }
}
