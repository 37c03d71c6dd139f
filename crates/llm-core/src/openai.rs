//! OpenAI-compatible chat completions client with tool calling

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::ModelConfig;
use crate::message::{ChatMessage, Role, ToolCall, ToolDefinition};
use crate::observer::{CallObserver, NoopObserver, TokenUsage};
use crate::ChatModel;

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "no_tools")]
    tools: &'a [ToolDefinition],
}

fn no_tools(tools: &&[ToolDefinition]) -> bool {
    tools.is_empty()
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: Role,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    #[serde(default)]
    id: String,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: WireFunction,
}

/// Arguments travel as a JSON-encoded string
#[derive(Debug, Serialize, Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: WireMessage,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
    #[serde(default)]
    total_tokens: u64,
}

impl From<WireUsage> for TokenUsage {
    fn from(u: WireUsage) -> Self {
        Self {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        }
    }
}

impl WireMessage {
    fn from_message(msg: &ChatMessage) -> Result<Self> {
        let tool_calls = msg
            .tool_calls
            .iter()
            .map(|call| {
                Ok(WireToolCall {
                    id: call.id.clone(),
                    call_type: function_type(),
                    function: WireFunction {
                        name: call.function.name.clone(),
                        arguments: serde_json::to_string(&call.function.arguments)?,
                    },
                })
            })
            .collect::<Result<Vec<_>>>()?;

        // Assistant turns that only carry tool calls send a null content
        let content = if msg.content.is_empty() && !tool_calls.is_empty() {
            None
        } else {
            Some(msg.content.clone())
        };

        Ok(Self {
            role: msg.role,
            content,
            tool_calls,
            tool_call_id: msg.tool_call_id.clone(),
        })
    }

    fn into_message(self) -> Result<ChatMessage> {
        let tool_calls = self
            .tool_calls
            .into_iter()
            .map(|call| {
                let arguments = if call.function.arguments.trim().is_empty() {
                    serde_json::Value::Object(Default::default())
                } else {
                    serde_json::from_str(&call.function.arguments).with_context(|| {
                        format!("Malformed arguments for tool call {}", call.function.name)
                    })?
                };
                let id = if call.id.is_empty() {
                    uuid::Uuid::new_v4().to_string()
                } else {
                    call.id
                };
                Ok(ToolCall::new(id, call.function.name, arguments))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ChatMessage {
            role: self.role,
            content: self.content.unwrap_or_default(),
            tool_calls,
            tool_call_id: self.tool_call_id,
        })
    }
}

/// Client for `/v1/chat/completions`
#[derive(Clone)]
pub struct OpenAiClient {
    config: ModelConfig,
    client: reqwest::Client,
    observer: Arc<dyn CallObserver>,
}

impl OpenAiClient {
    /// Create a client; the config must carry an API key
    pub fn new(config: ModelConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .context("No API key configured for the chat model")?;

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .context("API key is not a valid header value")?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            config,
            client,
            observer: Arc::new(NoopObserver),
        })
    }

    /// Attach a telemetry observer
    pub fn with_observer(mut self, observer: impl CallObserver + 'static) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<(ChatMessage, Option<TokenUsage>)> {
        let request = CompletionRequest {
            model: &self.config.model,
            messages: messages
                .iter()
                .map(WireMessage::from_message)
                .collect::<Result<Vec<_>>>()?,
            temperature: self.config.temperature,
            tools,
        };

        let resp = self
            .client
            .post(self.config.chat_url())
            .json(&request)
            .send()
            .await
            .context("Failed to connect to chat model API")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("Chat model API returned {}: {}", status, body);
        }

        let payload: CompletionResponse = resp
            .json()
            .await
            .context("Failed to parse chat completion response")?;

        parse_completion(payload)
    }
}

fn parse_completion(payload: CompletionResponse) -> Result<(ChatMessage, Option<TokenUsage>)> {
    let usage = payload.usage.map(TokenUsage::from);
    let choice = payload
        .choices
        .into_iter()
        .next()
        .context("Chat completion response contained no choices")?;

    Ok((choice.message.into_message()?, usage))
}

#[async_trait]
impl ChatModel for OpenAiClient {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    #[instrument(skip_all, fields(model = %self.config.model, messages = messages.len()))]
    async fn invoke(&self, messages: &[ChatMessage], tools: &[ToolDefinition]) -> Result<ChatMessage> {
        self.observer.on_request(&self.config.model, messages);
        let start = Instant::now();

        match self.complete(messages, tools).await {
            Ok((reply, usage)) => {
                debug!(tool_calls = reply.tool_calls.len(), "Received chat completion");
                self.observer
                    .on_response(&self.config.model, &reply, usage, start.elapsed());
                Ok(reply)
            }
            Err(e) => {
                self.observer.on_error(&self.config.model, &e);
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_requires_api_key() {
        let err = OpenAiClient::new(ModelConfig::default()).unwrap_err();
        assert!(err.to_string().contains("API key"));
    }

    #[test]
    fn test_client_with_api_key() {
        let client = OpenAiClient::new(ModelConfig::default().with_api_key("sk-test")).unwrap();
        assert_eq!(client.model_name(), "gpt-4o");
        assert!(!format!("{:?}", client).contains("sk-test"));
    }

    #[test]
    fn test_request_encodes_tool_call_arguments_as_string() {
        let call = ToolCall::new("call_1", "execute_code", json!({"code": "print(2+2)"}));
        let msg = ChatMessage::assistant_with_tools("", vec![call]);

        let wire = serde_json::to_value(WireMessage::from_message(&msg).unwrap()).unwrap();
        assert_eq!(wire["role"], "assistant");
        assert!(wire["content"].is_null());
        assert_eq!(wire["tool_calls"][0]["type"], "function");
        assert_eq!(
            wire["tool_calls"][0]["function"]["arguments"],
            r#"{"code":"print(2+2)"}"#
        );
    }

    #[test]
    fn test_request_tool_result_carries_call_id() {
        let msg = ChatMessage::tool_result("call_1", "4\n");
        let wire = serde_json::to_value(WireMessage::from_message(&msg).unwrap()).unwrap();
        assert_eq!(wire["role"], "tool");
        assert_eq!(wire["tool_call_id"], "call_1");
        assert_eq!(wire["content"], "4\n");
    }

    #[test]
    fn test_request_omits_empty_tools() {
        let request = CompletionRequest {
            model: "gpt-4o",
            messages: vec![],
            temperature: 0.0,
            tools: &[],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("tools").is_none());
        assert_eq!(json["temperature"], 0.0);
    }

    #[test]
    fn test_parse_response_with_tool_calls() {
        let payload: CompletionResponse = serde_json::from_value(json!({
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {"name": "execute_code", "arguments": "{\"code\": \"print(1)\"}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }))
        .unwrap();

        let (reply, usage) = parse_completion(payload).unwrap();
        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(reply.content, "");
        assert_eq!(reply.tool_calls.len(), 1);
        assert_eq!(reply.tool_calls[0].id, "call_abc");
        assert_eq!(reply.tool_calls[0].function.arguments["code"], "print(1)");
        assert_eq!(usage.unwrap().total_tokens, 15);
    }

    #[test]
    fn test_parse_response_plain_text() {
        let payload: CompletionResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": "The flag is FLAG{x}"}}]
        }))
        .unwrap();

        let (reply, usage) = parse_completion(payload).unwrap();
        assert_eq!(reply.content, "The flag is FLAG{x}");
        assert!(reply.tool_calls.is_empty());
        assert!(usage.is_none());
    }

    #[test]
    fn test_parse_response_malformed_arguments() {
        let payload: CompletionResponse = serde_json::from_value(json!({
            "choices": [{"message": {
                "role": "assistant",
                "tool_calls": [{"id": "c", "type": "function", "function": {"name": "execute_code", "arguments": "{not json"}}]
            }}]
        }))
        .unwrap();

        let err = parse_completion(payload).unwrap_err();
        assert!(err.to_string().contains("Malformed arguments"));
    }

    #[test]
    fn test_parse_response_without_choices() {
        let payload: CompletionResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(parse_completion(payload).is_err());
    }

    #[test]
    fn test_missing_call_id_is_generated() {
        let payload: CompletionResponse = serde_json::from_value(json!({
            "choices": [{"message": {
                "role": "assistant",
                "tool_calls": [{"function": {"name": "execute_code", "arguments": "{}"}}]
            }}]
        }))
        .unwrap();

        let (reply, _) = parse_completion(payload).unwrap();
        assert!(!reply.tool_calls[0].id.is_empty());
    }

    mod http {
        use super::*;
        use std::sync::Mutex;
        use wiremock::matchers::{header, method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        /// Records hook names in call order
        #[derive(Clone, Default)]
        struct RecordingObserver {
            events: Arc<Mutex<Vec<String>>>,
        }

        impl RecordingObserver {
            fn events(&self) -> Vec<String> {
                self.events.lock().unwrap().clone()
            }
        }

        impl CallObserver for RecordingObserver {
            fn on_request(&self, model: &str, messages: &[ChatMessage]) {
                self.events
                    .lock()
                    .unwrap()
                    .push(format!("request {} {}", model, messages.len()));
            }

            fn on_response(
                &self,
                _model: &str,
                reply: &ChatMessage,
                usage: Option<TokenUsage>,
                _elapsed: Duration,
            ) {
                let total = usage.map(|u| u.total_tokens).unwrap_or_default();
                self.events
                    .lock()
                    .unwrap()
                    .push(format!("response {} {}", reply.tool_calls.len(), total));
            }

            fn on_error(&self, _model: &str, error: &anyhow::Error) {
                self.events.lock().unwrap().push(format!("error {}", error));
            }
        }

        fn execute_code_definition() -> ToolDefinition {
            ToolDefinition::function(
                "execute_code",
                "Run Python code",
                json!({
                    "type": "object",
                    "properties": {"code": {"type": "string"}},
                    "required": ["code"]
                }),
            )
        }

        fn client(server: &MockServer, observer: RecordingObserver) -> OpenAiClient {
            let config = ModelConfig::default()
                .with_api_key("sk-test")
                .with_base_url(format!("{}/", server.uri()));
            OpenAiClient::new(config).unwrap().with_observer(observer)
        }

        #[tokio::test]
        async fn test_invoke_tool_call_reply() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/v1/chat/completions"))
                .and(header("authorization", "Bearer sk-test"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "choices": [{"message": {
                        "role": "assistant",
                        "content": null,
                        "tool_calls": [{
                            "id": "call_1",
                            "type": "function",
                            "function": {"name": "execute_code", "arguments": "{\"code\": \"print(2+2)\"}"}
                        }]
                    }}],
                    "usage": {"prompt_tokens": 20, "completion_tokens": 7, "total_tokens": 27}
                })))
                .expect(1)
                .mount(&server)
                .await;

            let observer = RecordingObserver::default();
            let client = client(&server, observer.clone());
            let messages = [ChatMessage::system("persona"), ChatMessage::user("question")];

            let reply = client
                .invoke(&messages, &[execute_code_definition()])
                .await
                .unwrap();

            assert_eq!(reply.tool_calls.len(), 1);
            assert_eq!(reply.tool_calls[0].id, "call_1");
            assert_eq!(reply.tool_calls[0].function.arguments["code"], "print(2+2)");

            let requests = server.received_requests().await.unwrap();
            let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
            assert_eq!(body["model"], "gpt-4o");
            assert_eq!(body["temperature"], 0.0);
            assert_eq!(body["messages"].as_array().unwrap().len(), 2);
            assert_eq!(body["tools"][0]["type"], "function");
            assert_eq!(body["tools"][0]["function"]["name"], "execute_code");

            assert_eq!(observer.events(), vec!["request gpt-4o 2", "response 1 27"]);
        }

        #[tokio::test]
        async fn test_invoke_server_error() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/v1/chat/completions"))
                .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
                .mount(&server)
                .await;

            let observer = RecordingObserver::default();
            let client = client(&server, observer.clone());

            let err = client
                .invoke(&[ChatMessage::user("q")], &[])
                .await
                .unwrap_err();

            let message = err.to_string();
            assert!(message.contains("Chat model API returned 500"), "{message}");
            assert!(message.contains("upstream exploded"), "{message}");

            let events = observer.events();
            assert_eq!(events.len(), 2);
            assert_eq!(events[0], "request gpt-4o 1");
            assert!(events[1].starts_with("error Chat model API returned 500"));
        }

        #[tokio::test]
        async fn test_invoke_sends_tool_history() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/v1/chat/completions"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "choices": [{"message": {"role": "assistant", "content": "FLAG{x}"}}]
                })))
                .mount(&server)
                .await;

            let observer = RecordingObserver::default();
            let client = client(&server, observer.clone());
            let call = ToolCall::new("call_1", "execute_code", json!({"code": "print(1)"}));
            let messages = [
                ChatMessage::system("persona"),
                ChatMessage::user("question"),
                ChatMessage::assistant_with_tools("", vec![call]),
                ChatMessage::tool_result("call_1", "1\n"),
            ];

            let reply = client.invoke(&messages, &[]).await.unwrap();
            assert_eq!(reply.content, "FLAG{x}");

            let requests = server.received_requests().await.unwrap();
            let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
            assert!(body.get("tools").is_none());
            assert_eq!(body["messages"][2]["tool_calls"][0]["function"]["arguments"], r#"{"code":"print(1)"}"#);
            assert_eq!(body["messages"][3]["role"], "tool");
            assert_eq!(body["messages"][3]["tool_call_id"], "call_1");

            assert_eq!(observer.events(), vec!["request gpt-4o 4", "response 0 0"]);
        }
    }
}
