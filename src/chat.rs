//! Question answering over stored memories via the Anthropic Messages API.

use crate::errors::Error;
use crate::sqlite::Memory;
use reqwest::blocking::Client;
use reqwest::header;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Anthropic Messages endpoint.
pub const MESSAGES_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "ANTHROPIC_API_KEY";

const SYSTEM_WITH_MEMORIES: &str = "You are a helpful assistant that answers questions based on \
the user's stored memories. Use the provided memories to give accurate, relevant answers. If the \
memories don't contain enough information to fully answer the question, say so and provide what \
information you can.";

const SYSTEM_WITHOUT_MEMORIES: &str = "You are a helpful assistant. The user asked a question but \
no relevant memories were found in their knowledge base.";

/// System prompt and user message sent to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatPrompt {
    pub system: String,
    pub user: String,
}

/// Build the prompt for `question` grounded in `memories`.
pub fn build_prompt(question: &str, memories: &[Memory]) -> ChatPrompt {
    if memories.is_empty() {
        return ChatPrompt {
            system: SYSTEM_WITHOUT_MEMORIES.to_string(),
            user: format!(
                "No relevant memories were found for this question.\n\n\
                 Question: {question}\n\n\
                 Please let the user know that no matching memories were found and suggest \
                 they add relevant information using `recall add`."
            ),
        };
    }

    let context = memories
        .iter()
        .map(|m| {
            format!(
                "[Memory #{} | Score: {:.2}]\n{}",
                m.id,
                m.score.unwrap_or(0.0),
                m.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    ChatPrompt {
        system: SYSTEM_WITH_MEMORIES.to_string(),
        user: format!(
            "Here are relevant memories from the user's knowledge base:\n\n\
             {context}\n\n---\n\n\
             Based on these memories, please answer the following question:\n{question}"
        ),
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [RequestMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Blocking Anthropic Messages client.
pub struct ChatClient {
    client: Client,
    headers: header::HeaderMap,
    endpoint: String,
    model: String,
}

impl ChatClient {
    /// Create a client for `model` authenticated with `api_key`.
    pub fn new(api_key: &str, model: &str) -> Result<Self, Error> {
        if api_key.trim().is_empty() {
            return Err(Error::Config(format!("{API_KEY_VAR} cannot be empty")));
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        let key = header::HeaderValue::from_str(api_key.trim())
            .map_err(|e| Error::Config(format!("Invalid API key format: {e}")))?;
        headers.insert("x-api-key", key);
        headers.insert(
            "anthropic-version",
            header::HeaderValue::from_static(ANTHROPIC_VERSION),
        );

        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            headers,
            endpoint: MESSAGES_ENDPOINT.to_string(),
            model: model.to_string(),
        })
    }

    /// Create a client using the key in `ANTHROPIC_API_KEY`.
    pub fn from_env(model: &str) -> Result<Self, Error> {
        let api_key = std::env::var(API_KEY_VAR).map_err(|_| {
            Error::Config(format!(
                "{API_KEY_VAR} environment variable not set. \
                 Get your API key at https://console.anthropic.com/"
            ))
        })?;
        Self::new(&api_key, model)
    }

    /// Send to a different Messages-compatible endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Answer `question` using `memories` as context.
    pub fn ask(&self, question: &str, memories: &[Memory]) -> Result<String, Error> {
        let prompt = build_prompt(question, memories);
        self.complete(&prompt)
    }

    /// Send a prepared prompt and return the first text block of the reply.
    pub fn complete(&self, prompt: &ChatPrompt) -> Result<String, Error> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            system: &prompt.system,
            messages: [RequestMessage {
                role: "user",
                content: &prompt.user,
            }],
        };

        debug!(model = %self.model, endpoint = %self.endpoint, "sending chat request");
        let response = self
            .client
            .post(&self.endpoint)
            .headers(self.headers.clone())
            .json(&request)
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(Error::Chat(format!("API returned {status}: {message}")));
        }

        parse_reply(&body)
    }
}

fn parse_reply(body: &str) -> Result<String, Error> {
    let response: MessagesResponse = serde_json::from_str(body)?;
    response
        .content
        .into_iter()
        .filter(|block| block.content_type == "text")
        .find_map(|block| block.text)
        .ok_or_else(|| Error::Chat("Response contained no text".to_string()))
}
