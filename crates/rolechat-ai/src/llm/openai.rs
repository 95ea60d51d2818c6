//! OpenAI-compatible streaming provider (OpenAI, Zhipu GLM)

use futures::StreamExt;
use reqwest::Client;
use serde::Serialize;

use crate::error::{AiError, response_to_error};
use crate::http_client::build_http_client;
use crate::llm::client::{CompletionRequest, LlmClient, TokenStream};
use crate::llm::sse::{DataLine, LineDecoder, parse_line};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const ZHIPU_BASE_URL: &str = "https://open.bigmodel.cn/api/paas/v4";

/// How message content is serialized on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentFormat {
    /// `"content": "text"`
    #[default]
    Text,
    /// `"content": [{"type": "text", "text": "..."}]`
    Parts,
}

/// OpenAI-compatible streaming client
pub struct OpenAIClient {
    client: Client,
    provider: String,
    api_key: String,
    model: String,
    base_url: String,
    content_format: ContentFormat,
}

impl OpenAIClient {
    /// Create a new OpenAI client
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: build_http_client(),
            provider: "openai".to_string(),
            api_key: api_key.into(),
            model: "gpt-4o".to_string(),
            base_url: OPENAI_BASE_URL.to_string(),
            content_format: ContentFormat::Text,
        }
    }

    /// Create a client for Zhipu's OpenAI-compatible GLM endpoint
    pub fn zhipu(api_key: impl Into<String>) -> Self {
        Self {
            provider: "zhipu".to_string(),
            model: "glm-4".to_string(),
            base_url: ZHIPU_BASE_URL.to_string(),
            content_format: ContentFormat::Parts,
            ..Self::new(api_key)
        }
    }

    /// Set the model to use
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set custom base URL (for API-compatible services)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_content_format(mut self, format: ContentFormat) -> Self {
        self.content_format = format;
        self
    }

    fn build_body(&self, request: &CompletionRequest) -> StreamRequest {
        let messages = request
            .messages
            .iter()
            .map(|m| WireMessage {
                role: m.role.as_str(),
                content: match self.content_format {
                    ContentFormat::Text => WireContent::Text(m.content.clone()),
                    ContentFormat::Parts => WireContent::Parts(vec![ContentPart {
                        kind: "text",
                        text: m.content.clone(),
                    }]),
                },
            })
            .collect();

        StreamRequest {
            model: self.model.clone(),
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: true,
        }
    }
}

#[derive(Serialize)]
struct StreamRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Serialize)]
struct WireMessage {
    role: &'static str,
    content: WireContent,
}

#[derive(Serialize)]
#[serde(untagged)]
enum WireContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Serialize)]
struct ContentPart {
    #[serde(rename = "type")]
    kind: &'static str,
    text: String,
}

impl LlmClient for OpenAIClient {
    fn provider(&self) -> &str {
        &self.provider
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn complete_stream(&self, request: CompletionRequest) -> TokenStream {
        let client = self.client.clone();
        let api_key = self.api_key.clone();
        let url = format!("{}/chat/completions", self.base_url);
        let provider = self.provider.clone();
        let body = self.build_body(&request);

        Box::pin(async_stream::stream! {
            tracing::debug!(provider = %provider, model = %body.model, messages = body.messages.len(), "Opening upstream stream");

            let response = match client
                .post(&url)
                .header("Authorization", format!("Bearer {}", api_key))
                .header("Content-Type", "application/json")
                .header("Accept", "text/event-stream")
                .json(&body)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    yield Err(AiError::Llm(format!("Request failed: {}", e)));
                    return;
                }
            };

            if !response.status().is_success() {
                yield Err(response_to_error(response, &provider).await);
                return;
            }

            let mut byte_stream = response.bytes_stream();
            let mut decoder = LineDecoder::new();

            while let Some(chunk_result) = byte_stream.next().await {
                let chunk = match chunk_result {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        yield Err(AiError::Stream(e.to_string()));
                        return;
                    }
                };

                for line in decoder.push(&chunk) {
                    match parse_line(&line) {
                        DataLine::Skip => {}
                        DataLine::Done => return,
                        DataLine::Text(texts) => {
                            for text in texts {
                                yield Ok(text);
                            }
                        }
                    }
                }
            }

            // A final line may lack its terminator after an abrupt close.
            if let Some(line) = decoder.finish()
                && let DataLine::Text(texts) = parse_line(&line)
            {
                for text in texts {
                    yield Ok(text);
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::Message;

    #[test]
    fn test_zhipu_defaults() {
        let client = OpenAIClient::zhipu("key");
        assert_eq!(client.provider(), "zhipu");
        assert_eq!(client.model(), "glm-4");
        assert_eq!(client.base_url, ZHIPU_BASE_URL);
        assert_eq!(client.content_format, ContentFormat::Parts);
    }

    #[test]
    fn test_body_uses_content_parts_for_zhipu() {
        let client = OpenAIClient::zhipu("key");
        let request = CompletionRequest::new(vec![Message::system("be kind"), Message::user("hi")])
            .with_temperature(0.7);

        let value = serde_json::to_value(client.build_body(&request)).unwrap();
        assert_eq!(value["model"], "glm-4");
        assert_eq!(value["stream"], true);
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"][0]["type"], "text");
        assert_eq!(value["messages"][1]["content"][0]["text"], "hi");
        assert!(value.get("max_tokens").is_none());
    }

    #[test]
    fn test_body_uses_plain_content_for_openai() {
        let client = OpenAIClient::new("key").with_model("gpt-4o-mini");
        let request = CompletionRequest::new(vec![Message::user("hi")]).with_max_tokens(64);

        let value = serde_json::to_value(client.build_body(&request)).unwrap();
        assert_eq!(value["model"], "gpt-4o-mini");
        assert_eq!(value["messages"][0]["content"], "hi");
        assert_eq!(value["max_tokens"], 64);
        assert!(value.get("temperature").is_none());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = OpenAIClient::new("key").with_base_url("http://localhost:9000/v1/");
        assert_eq!(client.base_url, "http://localhost:9000/v1");
    }
}
