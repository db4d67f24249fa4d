use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use slidegen_common::Config;
use slidegen_protocol::schema::SchemaContract;

use crate::error::ClientError;

const DEFAULT_ATTEMPTS: u32 = 3;
const DEFAULT_BASE_DELAY_MS: u64 = 1000;
const DEFAULT_ATTEMPT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_RESPONSE_BYTES: usize = 200 * 1024;
const MAX_VALIDATION_ISSUES: usize = 3;
const PREVIEW_LEN: usize = 120;

const SYSTEM_PROMPT: &str =
    "You are a slide specification generator. Respond with a single JSON object and nothing else.";

/// Raw outcome of one HTTP exchange, before any interpretation.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// Seam between the client and the wire. Production uses reqwest; tests
/// inject scripted fakes.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, body: Value) -> anyhow::Result<TransportResponse>;
}

pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn send(&self, body: Value) -> anyhow::Result<TransportResponse> {
        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok(TransportResponse { status, body })
    }
}

/// How we ask the service to shape its output. Starts schema-constrained;
/// a 400-class schema rejection transitions to free-form JSON exactly once
/// per call, without consuming a retry attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Schema,
    Freeform,
}

pub struct StructuredOutputClient {
    transport: Arc<dyn ChatTransport>,
    model: String,
    max_output_tokens: u32,
    max_attempts: u32,
    base_delay: Duration,
    attempt_timeout: Duration,
    max_response_bytes: usize,
}

impl StructuredOutputClient {
    pub fn new(config: &Config) -> Self {
        let api_key = config.api_key.clone().unwrap_or_default();
        Self::with_transport(
            Arc::new(HttpTransport::new(&config.base_url, &api_key)),
            &config.model,
            config.max_output_tokens,
        )
    }

    pub fn with_transport(
        transport: Arc<dyn ChatTransport>,
        model: &str,
        max_output_tokens: u32,
    ) -> Self {
        Self {
            transport,
            model: model.to_string(),
            max_output_tokens,
            max_attempts: DEFAULT_ATTEMPTS,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
            attempt_timeout: Duration::from_secs(DEFAULT_ATTEMPT_TIMEOUT_SECS),
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// Same transport and limits, different model id. Used for the
    /// degraded retry after the primary model fails.
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            model: model.to_string(),
            max_output_tokens: self.max_output_tokens,
            max_attempts: self.max_attempts,
            base_delay: self.base_delay,
            attempt_timeout: self.attempt_timeout,
            max_response_bytes: self.max_response_bytes,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One schema-constrained call: build the request, negotiate the output
    /// mode, enforce size/shape limits, validate, deserialize. Retries
    /// transient failures with exponential backoff; surfaces deterministic
    /// mismatches immediately.
    pub async fn call<T: DeserializeOwned>(
        &self,
        prompt: &str,
        contract: &SchemaContract<T>,
        temperature: f32,
        request_id: &str,
    ) -> Result<T, ClientError> {
        let mut mode = OutputMode::Schema;
        let mut attempt: u32 = 0;
        loop {
            match self
                .attempt(prompt, contract, temperature, request_id, mode)
                .await
            {
                Ok(doc) => return Ok(doc),
                Err(err) if mode == OutputMode::Schema && is_mode_rejection(&err) => {
                    debug!(request_id, "schema-constrained mode rejected, falling back to free-form json");
                    mode = OutputMode::Freeform;
                }
                Err(err) => {
                    attempt += 1;
                    if attempt >= self.max_attempts || !err.is_retryable() {
                        return Err(err);
                    }
                    let delay = self.base_delay * 2u32.saturating_pow(attempt - 1);
                    warn!(
                        request_id,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "attempt failed, backing off: {err}"
                    );
                    sleep(delay).await;
                }
            }
        }
    }

    async fn attempt<T: DeserializeOwned>(
        &self,
        prompt: &str,
        contract: &SchemaContract<T>,
        temperature: f32,
        request_id: &str,
        mode: OutputMode,
    ) -> Result<T, ClientError> {
        let body = self.request_body(prompt, contract, temperature, request_id, mode);

        let sent = timeout(self.attempt_timeout, self.transport.send(body)).await;
        let resp = match sent {
            Err(_) => {
                return Err(ClientError::Timeout {
                    request_id: request_id.to_string(),
                    timeout_secs: self.attempt_timeout.as_secs(),
                })
            }
            Ok(Err(e)) => {
                return Err(ClientError::Transport {
                    request_id: request_id.to_string(),
                    message: e.to_string(),
                })
            }
            Ok(Ok(resp)) => resp,
        };

        if !(200..300).contains(&resp.status) {
            return Err(ClientError::Api {
                request_id: request_id.to_string(),
                status: resp.status,
                message: preview(&resp.body),
            });
        }

        if resp.body.len() > self.max_response_bytes {
            return Err(ClientError::ResponseTooLarge {
                request_id: request_id.to_string(),
                size: resp.body.len(),
                limit: self.max_response_bytes,
            });
        }

        let envelope: Value =
            serde_json::from_str(&resp.body).map_err(|e| ClientError::Parse {
                request_id: request_id.to_string(),
                message: e.to_string(),
            })?;

        let content = envelope["choices"][0]["message"]["content"]
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ClientError::NoContent {
                request_id: request_id.to_string(),
            })?;

        let document: Value =
            serde_json::from_str(strip_fences(content)).map_err(|e| ClientError::Parse {
                request_id: request_id.to_string(),
                message: format!("{e} (content preview: {})", preview(content)),
            })?;

        let issues = validate_against_schema(&contract.schema, &document);
        if !issues.is_empty() {
            return Err(ClientError::Validation {
                request_id: request_id.to_string(),
                issues,
            });
        }

        // Typed deserialization is also the unknown-field strip: the schema
        // shape, not the raw payload, decides what survives.
        serde_json::from_value(document).map_err(|e| ClientError::Validation {
            request_id: request_id.to_string(),
            issues: vec![e.to_string()],
        })
    }

    fn request_body<T>(
        &self,
        prompt: &str,
        contract: &SchemaContract<T>,
        temperature: f32,
        request_id: &str,
        mode: OutputMode,
    ) -> Value {
        let system = match mode {
            OutputMode::Schema => SYSTEM_PROMPT.to_string(),
            OutputMode::Freeform => format!(
                "{SYSTEM_PROMPT}\nThe object MUST conform to this JSON Schema:\n{}",
                contract.schema
            ),
        };
        let response_format = match mode {
            OutputMode::Schema => json!({
                "type": "json_schema",
                "json_schema": {
                    "name": contract.name,
                    "schema": contract.schema,
                    "strict": true,
                }
            }),
            OutputMode::Freeform => json!({ "type": "json_object" }),
        };
        json!({
            "model": self.model,
            "temperature": temperature,
            "top_p": 0.9,
            "seed": derive_seed(request_id),
            "max_tokens": self.max_output_tokens,
            "stop": ["```"],
            "response_format": response_format,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": prompt },
            ],
        })
    }
}

/// FNV-1a over the request id, folded to a non-negative seed so the same
/// request replays with the same sampling path.
fn derive_seed(request_id: &str) -> i64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in request_id.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    (hash & 0x7fff_ffff) as i64
}

fn is_mode_rejection(err: &ClientError) -> bool {
    match err {
        ClientError::Api {
            status, message, ..
        } if (400..500).contains(status) => {
            let lower = message.to_ascii_lowercase();
            lower.contains("response_format")
                || lower.contains("json_schema")
                || lower.contains("schema")
        }
        _ => false,
    }
}

fn strip_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(PREVIEW_LEN).collect();
    if text.chars().count() > PREVIEW_LEN {
        out.push('…');
    }
    out
}

/// Structural check of the parsed document against the contract schema:
/// required properties and primitive type tags, recursively. Collects at
/// most `MAX_VALIDATION_ISSUES` dotted paths for diagnostics.
fn validate_against_schema(schema: &Value, document: &Value) -> Vec<String> {
    let mut issues = Vec::new();
    check_node(schema, document, "$", &mut issues);
    issues
}

fn check_node(schema: &Value, value: &Value, path: &str, issues: &mut Vec<String>) {
    if issues.len() >= MAX_VALIDATION_ISSUES {
        return;
    }
    let Some(type_tag) = schema["type"].as_str() else {
        return;
    };
    let matches = match type_tag {
        "object" => value.is_object(),
        "array" => value.is_array(),
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        _ => true,
    };
    if !matches {
        issues.push(format!("{path}: expected {type_tag}"));
        return;
    }
    match type_tag {
        "object" => {
            if let Some(required) = schema["required"].as_array() {
                for name in required.iter().filter_map(Value::as_str) {
                    if issues.len() >= MAX_VALIDATION_ISSUES {
                        return;
                    }
                    if value.get(name).map_or(true, Value::is_null) {
                        issues.push(format!("{path}.{name}: missing required property"));
                    }
                }
            }
            if let Some(props) = schema["properties"].as_object() {
                for (name, prop_schema) in props {
                    if let Some(child) = value.get(name) {
                        if !child.is_null() {
                            check_node(prop_schema, child, &format!("{path}.{name}"), issues);
                        }
                    }
                }
            }
        }
        "array" => {
            let item_schema = &schema["items"];
            if item_schema.is_object() {
                if let Some(items) = value.as_array() {
                    for (i, item) in items.iter().enumerate() {
                        check_node(item_schema, item, &format!("{path}[{i}]"), issues);
                    }
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Doc {
        name: String,
    }

    fn contract() -> SchemaContract<Doc> {
        SchemaContract::new(
            "doc",
            json!({
                "type": "object",
                "properties": { "name": { "type": "string" } },
                "required": ["name"]
            }),
        )
    }

    fn chat_body(content: &str) -> String {
        json!({ "choices": [{ "message": { "content": content } }] }).to_string()
    }

    struct ScriptedTransport {
        responses: Mutex<Vec<TransportResponse>>,
        calls: AtomicUsize,
        bodies: Mutex<Vec<Value>>,
    }

    impl ScriptedTransport {
        fn new(mut responses: Vec<TransportResponse>) -> Self {
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                calls: AtomicUsize::new(0),
                bodies: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatTransport for ScriptedTransport {
        async fn send(&self, body: Value) -> anyhow::Result<TransportResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.bodies.lock().unwrap().push(body);
            let next = self.responses.lock().unwrap().pop();
            next.ok_or_else(|| anyhow::anyhow!("connection refused"))
        }
    }

    fn client(transport: Arc<ScriptedTransport>) -> StructuredOutputClient {
        StructuredOutputClient::with_transport(transport, "test-model", 1024)
            .with_base_delay(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn happy_path_returns_typed_document() {
        let transport = Arc::new(ScriptedTransport::new(vec![TransportResponse {
            status: 200,
            body: chat_body(r#"{"name":"ok","extra":"dropped"}"#),
        }]));
        let doc = client(transport.clone())
            .call("p", &contract(), 0.2, "req-1")
            .await
            .unwrap();
        assert_eq!(doc.name, "ok");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn schema_rejection_falls_back_to_freeform_without_burning_an_attempt() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            TransportResponse {
                status: 400,
                body: "response_format json_schema is not supported".to_string(),
            },
            TransportResponse {
                status: 200,
                body: chat_body(r#"{"name":"ok"}"#),
            },
        ]));
        let doc = client(transport.clone())
            .call("p", &contract(), 0.2, "req-2")
            .await
            .unwrap();
        assert_eq!(doc.name, "ok");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);

        let bodies = transport.bodies.lock().unwrap();
        assert_eq!(bodies[0]["response_format"]["type"], "json_schema");
        assert_eq!(bodies[1]["response_format"]["type"], "json_object");
        let system = bodies[1]["messages"][0]["content"].as_str().unwrap();
        assert!(system.contains("JSON Schema"));
    }

    #[tokio::test]
    async fn server_errors_retry_with_backoff_then_surface() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            TransportResponse {
                status: 500,
                body: "oops".to_string(),
            },
            TransportResponse {
                status: 502,
                body: "bad gateway".to_string(),
            },
            TransportResponse {
                status: 503,
                body: "unavailable".to_string(),
            },
        ]));
        let err = client(transport.clone())
            .call("p", &contract(), 0.2, "req-3")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Api { status: 503, .. }));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn validation_failure_is_not_retried() {
        let transport = Arc::new(ScriptedTransport::new(vec![TransportResponse {
            status: 200,
            body: chat_body(r#"{"name":42}"#),
        }]));
        let err = client(transport.clone())
            .call("p", &contract(), 0.2, "req-4")
            .await
            .unwrap_err();
        match err {
            ClientError::Validation { issues, .. } => {
                assert!(issues[0].contains("$.name"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn oversized_body_fails_without_parsing() {
        let transport = Arc::new(ScriptedTransport::new(vec![TransportResponse {
            status: 200,
            body: "x".repeat(DEFAULT_MAX_RESPONSE_BYTES + 1),
        }]));
        let err = client(transport)
            .call("p", &contract(), 0.2, "req-5")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::ResponseTooLarge { .. }));
    }

    #[tokio::test]
    async fn fenced_freeform_content_still_parses() {
        let transport = Arc::new(ScriptedTransport::new(vec![TransportResponse {
            status: 200,
            body: chat_body("```json\n{\"name\":\"fenced\"}\n```"),
        }]));
        let doc = client(transport)
            .call("p", &contract(), 0.2, "req-6")
            .await
            .unwrap();
        assert_eq!(doc.name, "fenced");
    }

    #[tokio::test]
    async fn empty_content_is_retried_as_transient() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            TransportResponse {
                status: 200,
                body: chat_body(""),
            },
            TransportResponse {
                status: 200,
                body: chat_body(r#"{"name":"second"}"#),
            },
        ]));
        let doc = client(transport.clone())
            .call("p", &contract(), 0.2, "req-7")
            .await
            .unwrap();
        assert_eq!(doc.name, "second");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn seed_is_stable_per_request_id() {
        assert_eq!(derive_seed("abc"), derive_seed("abc"));
        assert_ne!(derive_seed("abc"), derive_seed("abd"));
        assert!(derive_seed("anything") >= 0);
    }

    #[test]
    fn validation_issue_count_is_capped() {
        let schema = json!({
            "type": "object",
            "required": ["a", "b", "c", "d", "e"],
            "properties": {}
        });
        let issues = validate_against_schema(&schema, &json!({}));
        assert_eq!(issues.len(), MAX_VALIDATION_ISSUES);
    }
}
