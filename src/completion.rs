//! Language-model providers.
//!
//! Implements the [`CompletionProvider`] trait from `echochat-core` for:
//! - **[`OllamaProvider`]**: a local Ollama instance's `/api/chat` endpoint
//!   (NDJSON when streaming).
//! - **[`GeminiProvider`]**: Google's Generative Language API
//!   (`generateContent`, and `streamGenerateContent` over SSE).
//!
//! # Provider Selection
//!
//! [`create_provider`] is the only place that looks at `[llm].provider`;
//! everything downstream works through `dyn CompletionProvider`.
//!
//! # Streaming
//!
//! Streaming responses are read on a spawned task that splits the body
//! into lines, decodes each line into a text fragment, and forwards it
//! over a bounded channel exposed as a [`ChunkStream`]. Buffering happens
//! on raw bytes so multi-byte characters split across network chunks
//! decode correctly.
//!
//! Failures (connection errors, non-2xx status, in-band error frames)
//! are returned to the caller. There is no retry.
//!
//! # Timeouts
//!
//! `[llm].timeout_secs` bounds connecting and every wait for response
//! bytes. Blocking completions are also bounded in total; streams are not,
//! so a long reply keeps flowing as long as the model keeps producing.

use anyhow::{bail, Result};
use async_trait::async_trait;
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use echochat_core::completion::{ChunkStream, CompletionProvider};

use crate::config::{LlmConfig, ProviderKind};

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const STREAM_BUFFER: usize = 64;

/// Instantiate the provider named by `config.provider`.
pub fn create_provider(config: &LlmConfig) -> Result<Box<dyn CompletionProvider>> {
    match config.provider {
        ProviderKind::Ollama => Ok(Box::new(OllamaProvider::new(config)?)),
        ProviderKind::Gemini => Ok(Box::new(GeminiProvider::new(config)?)),
    }
}

fn http_client(config: &LlmConfig) -> Result<reqwest::Client> {
    let timeout = Duration::from_secs(config.timeout_secs);
    Ok(reqwest::Client::builder()
        .connect_timeout(timeout)
        .read_timeout(timeout)
        .build()?)
}

/// Apply the whole-request timeout to blocking calls only.
fn with_total_timeout(
    request: reqwest::RequestBuilder,
    timeout: Duration,
    stream: bool,
) -> reqwest::RequestBuilder {
    if stream {
        request
    } else {
        request.timeout(timeout)
    }
}

/// One decoded line of a streaming response.
#[derive(Debug, PartialEq)]
enum Frame {
    Text(String),
    Done,
    Skip,
}

/// Forward a line-delimited streaming body as text fragments.
fn stream_lines(response: reqwest::Response, decode: fn(&str) -> Result<Frame>) -> ChunkStream {
    let (tx, rx) = mpsc::channel::<Result<String>>(STREAM_BUFFER);

    tokio::spawn(async move {
        let mut body = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::new();

        while let Some(chunk) = body.next().await {
            let bytes = match chunk {
                Ok(b) => b,
                Err(e) => {
                    let _ = tx.send(Err(anyhow::anyhow!("stream error: {}", e))).await;
                    return;
                }
            };
            buffer.extend_from_slice(&bytes);

            while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=pos).collect();
                if !forward_line(&line, decode, &tx).await {
                    return;
                }
            }
        }

        if !buffer.is_empty() {
            forward_line(&buffer, decode, &tx).await;
        }
    });

    Box::pin(ReceiverStream::new(rx))
}

/// Decode and send one line. Returns false when the stream should end.
async fn forward_line(
    line: &[u8],
    decode: fn(&str) -> Result<Frame>,
    tx: &mpsc::Sender<Result<String>>,
) -> bool {
    let text = String::from_utf8_lossy(line);
    let text = text.trim();
    if text.is_empty() {
        return true;
    }

    match decode(text) {
        Ok(Frame::Text(t)) => t.is_empty() || tx.send(Ok(t)).await.is_ok(),
        Ok(Frame::Skip) => true,
        Ok(Frame::Done) => false,
        Err(e) => {
            let _ = tx.send(Err(e)).await;
            false
        }
    }
}

async fn error_for_status(
    provider: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body_text = response.text().await.unwrap_or_default();
    bail!("{} API error {}: {}", provider, status, body_text)
}

// ============ Ollama Provider ============

/// Completion provider backed by a local Ollama instance.
///
/// Calls `POST {url}/api/chat` (default url: `http://localhost:11434`).
/// Requires the model to be pulled (e.g. `ollama pull llama3.1:8b`).
pub struct OllamaProvider {
    client: reqwest::Client,
    model: String,
    url: String,
    timeout: Duration,
}

impl OllamaProvider {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config)?,
            model: config.model.clone(),
            url: config
                .url
                .clone()
                .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    fn body(&self, system: &str, user: &str, stream: bool) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
            "stream": stream,
        })
    }

    async fn send(&self, body: &serde_json::Value, stream: bool) -> Result<reqwest::Response> {
        let request = self
            .client
            .post(format!("{}/api/chat", self.url))
            .json(body);
        let response = with_total_timeout(request, self.timeout, stream)
            .send()
            .await
            .map_err(|e| {
                anyhow::anyhow!(
                    "Ollama connection error (is Ollama running at {}?): {}",
                    self.url,
                    e
                )
            })?;
        error_for_status("Ollama", response).await
    }
}

#[async_trait]
impl CompletionProvider for OllamaProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let response = self.send(&self.body(system, user, false), false).await?;
        let json: serde_json::Value = response.json().await?;
        parse_ollama_response(&json)
    }

    async fn complete_stream(&self, system: &str, user: &str) -> Result<ChunkStream> {
        let response = self.send(&self.body(system, user, true), true).await?;
        Ok(stream_lines(response, decode_ollama_line))
    }
}

fn parse_ollama_response(json: &serde_json::Value) -> Result<String> {
    if let Some(err) = json.get("error").and_then(|e| e.as_str()) {
        bail!("Ollama error: {}", err);
    }
    json.pointer("/message/content")
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("Invalid Ollama response: missing message.content"))
}

fn decode_ollama_line(line: &str) -> Result<Frame> {
    let json: serde_json::Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!("skipping unparseable Ollama frame: {e}");
            return Ok(Frame::Skip);
        }
    };

    if let Some(err) = json.get("error").and_then(|e| e.as_str()) {
        bail!("Ollama error: {}", err);
    }

    let text = json
        .pointer("/message/content")
        .and_then(|c| c.as_str())
        .unwrap_or("")
        .to_string();

    if json.get("done").and_then(|d| d.as_bool()).unwrap_or(false) {
        // The final frame may still carry text.
        return Ok(if text.is_empty() { Frame::Done } else { Frame::Text(text) });
    }

    Ok(Frame::Text(text))
}

// ============ Gemini Provider ============

/// Completion provider using the Google Generative Language API.
///
/// Requires the `GEMINI_API_KEY` environment variable to be set.
pub struct GeminiProvider {
    client: reqwest::Client,
    model: String,
    url: String,
    api_key: String,
    timeout: Duration,
}

impl GeminiProvider {
    /// # Errors
    ///
    /// Returns an error if `GEMINI_API_KEY` is not in the environment.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| anyhow::anyhow!("GEMINI_API_KEY environment variable not set"))?;

        Ok(Self {
            client: http_client(config)?,
            model: config.model.clone(),
            url: config
                .url
                .clone()
                .unwrap_or_else(|| DEFAULT_GEMINI_URL.to_string()),
            api_key,
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    fn body(system: &str, user: &str) -> serde_json::Value {
        serde_json::json!({
            "systemInstruction": { "parts": [{ "text": system }] },
            "contents": [{ "role": "user", "parts": [{ "text": user }] }],
        })
    }

    async fn send(
        &self,
        method: &str,
        system: &str,
        user: &str,
        stream: bool,
    ) -> Result<reqwest::Response> {
        let request = self
            .client
            .post(format!("{}/models/{}:{}", self.url, self.model, method))
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::body(system, user));
        let response = with_total_timeout(request, self.timeout, stream)
            .send()
            .await?;
        error_for_status("Gemini", response).await
    }
}

#[async_trait]
impl CompletionProvider for GeminiProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let response = self.send("generateContent", system, user, false).await?;
        let json: serde_json::Value = response.json().await?;
        parse_gemini_response(&json)
    }

    async fn complete_stream(&self, system: &str, user: &str) -> Result<ChunkStream> {
        let response = self
            .send("streamGenerateContent?alt=sse", system, user, true)
            .await?;
        Ok(stream_lines(response, decode_gemini_line))
    }
}

/// Concatenate the text parts of the first candidate.
fn parse_gemini_response(json: &serde_json::Value) -> Result<String> {
    if let Some(err) = json.pointer("/error/message").and_then(|m| m.as_str()) {
        bail!("Gemini error: {}", err);
    }

    let parts = json
        .pointer("/candidates/0/content/parts")
        .and_then(|p| p.as_array())
        .ok_or_else(|| anyhow::anyhow!("Invalid Gemini response: missing candidates"))?;

    Ok(parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect())
}

fn decode_gemini_line(line: &str) -> Result<Frame> {
    let Some(data) = line.strip_prefix("data:") else {
        return Ok(Frame::Skip);
    };
    let data = data.trim();
    if data == "[DONE]" {
        return Ok(Frame::Done);
    }

    let json: serde_json::Value = match serde_json::from_str(data) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!("skipping unparseable Gemini frame: {e}");
            return Ok(Frame::Skip);
        }
    };

    if json.pointer("/candidates/0/content/parts").is_none() && json.get("error").is_none() {
        return Ok(Frame::Skip);
    }

    parse_gemini_response(&json).map(Frame::Text)
}
