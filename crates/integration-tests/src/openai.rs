use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::post,
};
use config::OpenAiConfig;
use secrecy::SecretString;
use serde_json::{Value, json};
use story::OpenAiStoryClient;
use tokio::net::TcpListener;

/// API key the mock expects unless told otherwise.
pub const TEST_API_KEY: &str = "test-key";

/// Builder for a mock chat-completion endpoint.
pub struct OpenAIMock {
    reply: Reply,
    custom_responses: HashMap<String, String>,
    required_key: Option<String>,
    delay: Option<Duration>,
}

#[derive(Clone)]
enum Reply {
    Choices(Vec<String>),
    NoChoicesField,
    Error { status: StatusCode, message: String },
    Raw(String),
}

impl Default for OpenAIMock {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenAIMock {
    pub fn new() -> Self {
        Self {
            reply: Reply::Choices(vec!["Once upon a time, in a test server far away...".to_string()]),
            custom_responses: HashMap::new(),
            required_key: None,
            delay: None,
        }
    }

    /// Reply with one choice per entry, in order.
    pub fn with_choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reply = Reply::Choices(choices.into_iter().map(Into::into).collect());
        self
    }

    /// Reply with `{"choices": []}`.
    pub fn with_empty_choices(self) -> Self {
        self.with_choices(Vec::<String>::new())
    }

    /// Reply with a completion object that has no `choices` key.
    pub fn without_choices_field(mut self) -> Self {
        self.reply = Reply::NoChoicesField;
        self
    }

    /// Reply with a 200 and this exact body.
    pub fn with_raw_body(mut self, body: impl Into<String>) -> Self {
        self.reply = Reply::Raw(body.into());
        self
    }

    pub fn with_error(mut self, status: StatusCode, message: impl Into<String>) -> Self {
        self.reply = Reply::Error {
            status,
            message: message.into(),
        };
        self
    }

    /// When a message contains `trigger`, answer with `response` instead.
    pub fn with_response(mut self, trigger: impl Into<String>, response: impl Into<String>) -> Self {
        self.custom_responses.insert(trigger.into(), response.into());
        self
    }

    /// Reject requests without `Authorization: Bearer <key>` with a 401.
    pub fn requiring_key(mut self, key: impl Into<String>) -> Self {
        self.required_key = Some(key.into());
        self
    }

    /// Hold every reply for this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub async fn spawn(self) -> anyhow::Result<TestOpenAIServer> {
        let requests = Arc::new(Mutex::new(Vec::new()));

        let state = Arc::new(MockState {
            reply: self.reply,
            custom_responses: self.custom_responses,
            required_key: self.required_key,
            delay: self.delay,
            requests: requests.clone(),
        });

        let app = Router::new()
            .route("/v1/chat/completions", post(chat_completions))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let address = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                log::error!("Mock chat-completion server stopped: {e}");
            }
        });

        Ok(TestOpenAIServer {
            address,
            requests,
            _handle: handle,
        })
    }
}

/// A request as the mock received it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub authorization: Option<String>,
    pub body: Value,
}

/// A running mock endpoint.
pub struct TestOpenAIServer {
    pub address: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    _handle: tokio::task::JoinHandle<()>,
}

impl TestOpenAIServer {
    pub async fn start() -> Self {
        OpenAIMock::new().spawn().await.unwrap()
    }

    /// Base URL as it goes into `[openai] base_url`.
    pub fn url(&self) -> String {
        format!("http://{}/v1", self.address)
    }

    /// Client configuration pointing at this server with [`TEST_API_KEY`].
    pub fn config(&self) -> OpenAiConfig {
        OpenAiConfig {
            api_key: Some(SecretString::from(TEST_API_KEY.to_string())),
            base_url: Some(self.url().parse().unwrap()),
            ..Default::default()
        }
    }

    pub fn client(&self) -> OpenAiStoryClient {
        OpenAiStoryClient::new(&self.config()).unwrap()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

struct MockState {
    reply: Reply,
    custom_responses: HashMap<String, String>,
    required_key: Option<String>,
    delay: Option<Duration>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

async fn chat_completions(State(state): State<Arc<MockState>>, headers: HeaderMap, body: String) -> Response {
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let body: Value = serde_json::from_str(&body).unwrap_or(Value::String(body));

    state.requests.lock().unwrap().push(RecordedRequest {
        authorization: authorization.clone(),
        body: body.clone(),
    });

    if let Some(delay) = state.delay {
        tokio::time::sleep(delay).await;
    }

    let authorized = match &state.required_key {
        Some(key) => authorization.as_deref() == Some(format!("Bearer {key}").as_str()),
        None => true,
    };

    if !authorized {
        let error = json!({
            "error": {
                "message": "Incorrect API key provided",
                "type": "invalid_request_error",
                "code": "invalid_api_key"
            }
        });

        return (StatusCode::UNAUTHORIZED, error.to_string()).into_response();
    }

    let model = body.get("model").and_then(Value::as_str).unwrap_or_default().to_string();

    let custom = body
        .get("messages")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|message| message.get("content").and_then(Value::as_str))
        .find_map(|content| {
            state
                .custom_responses
                .iter()
                .find(|(trigger, _)| content.contains(trigger.as_str()))
                .map(|(_, response)| response.clone())
        });

    if let Some(response) = custom {
        return completion(&model, Some(vec![response])).into_response();
    }

    match &state.reply {
        Reply::Choices(choices) => completion(&model, Some(choices.clone())).into_response(),
        Reply::NoChoicesField => completion(&model, None).into_response(),
        Reply::Error { status, message } => (*status, message.clone()).into_response(),
        Reply::Raw(body) => (StatusCode::OK, [("content-type", "application/json")], body.clone()).into_response(),
    }
}

fn completion(model: &str, choices: Option<Vec<String>>) -> axum::Json<Value> {
    let mut response = json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1677651200,
        "model": model,
        "usage": {
            "prompt_tokens": 10,
            "completion_tokens": 15,
            "total_tokens": 25
        }
    });

    if let Some(choices) = choices {
        let choices: Vec<Value> = choices
            .into_iter()
            .enumerate()
            .map(|(index, content)| {
                json!({
                    "index": index,
                    "message": { "role": "assistant", "content": content },
                    "finish_reason": "stop"
                })
            })
            .collect();

        response["choices"] = Value::Array(choices);
    }

    axum::Json(response)
}
