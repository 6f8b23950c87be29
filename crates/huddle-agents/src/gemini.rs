//! Gemini `generateContent` client and pipeline.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, trace};

use crate::chat::{ChatMessage, ChatRole};
use crate::error::PipelineError;
use crate::pipeline::{Pipeline, PipelineFactory, PipelineMode, PipelineReply, PipelineSpec};
use crate::tool::{ToolCall, ToolDefinition};

/// Default Gemini REST endpoint.
pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini REST client.
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    /// Creates a client for the default endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_GEMINI_API_URL.to_string(),
        }
    }

    /// Overrides the endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sends a `generateContent` request for `model`.
    pub async fn generate(
        &self,
        model: &str,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse, PipelineError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        trace!(url = %url, "sending generateContent request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| PipelineError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Api {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| PipelineError::ResponseParse(e.to_string()))
    }
}

/// `generateContent` request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<GeminiTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

/// A turn of content.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    fn new(role: &str, parts: Vec<Part>) -> Self {
        Self {
            role: Some(role.to_string()),
            parts,
        }
    }
}

/// One part of a turn.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_response: Option<FunctionResponse>,
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionResponse {
    pub name: String,
    pub response: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiTool {
    pub function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

impl FunctionDeclaration {
    fn from_definition(def: &ToolDefinition) -> Self {
        // Gemini rejects object schemas without properties.
        let has_properties = def.parameters["properties"]
            .as_object()
            .is_some_and(|props| !props.is_empty());
        Self {
            name: def.name.clone(),
            description: def.description.clone(),
            parameters: has_properties.then(|| def.parameters.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
}

/// `generateContent` response body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

impl GenerateResponse {
    /// Converts the first candidate into a reply.
    pub fn into_reply(self) -> Result<PipelineReply, PipelineError> {
        let parts = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts)
            .unwrap_or_default();

        let mut texts = Vec::new();
        let mut tool_calls = Vec::new();
        for part in parts {
            if let Some(text) = part.text {
                texts.push(text);
            }
            if let Some(call) = part.function_call {
                tool_calls.push(ToolCall::new(call.name, call.args));
            }
        }

        let text = texts.concat();
        if text.trim().is_empty() && tool_calls.is_empty() {
            return Err(PipelineError::Empty);
        }
        Ok(PipelineReply {
            text: (!text.trim().is_empty()).then_some(text),
            tool_calls,
        })
    }
}

/// Builds a request from pipeline inputs.
pub fn build_request(
    spec: &PipelineSpec,
    instructions: &str,
    history: &[ChatMessage],
    tools: &[ToolDefinition],
) -> GenerateRequest {
    let mut system = vec![instructions.to_string()];
    let mut contents = Vec::new();

    for msg in history {
        match msg.role {
            ChatRole::System => system.push(msg.content.clone()),
            ChatRole::User => contents.push(Content::new("user", vec![Part::text(&msg.content)])),
            ChatRole::Assistant => {
                let mut parts = Vec::new();
                if !msg.content.is_empty() {
                    parts.push(Part::text(&msg.content));
                }
                for call in msg.tool_calls.iter().flatten() {
                    parts.push(Part {
                        function_call: Some(FunctionCall {
                            name: call.name.clone(),
                            args: call.arguments.clone(),
                        }),
                        ..Default::default()
                    });
                }
                if !parts.is_empty() {
                    contents.push(Content::new("model", parts));
                }
            }
            ChatRole::Tool => {
                let response = match msg.tool_result.as_ref().map(|r| &r.content) {
                    Some(Value::Object(map)) => Value::Object(map.clone()),
                    Some(other) => json!({ "result": other }),
                    None => json!({}),
                };
                contents.push(Content::new(
                    "user",
                    vec![Part {
                        function_response: Some(FunctionResponse {
                            name: msg.content.clone(),
                            response,
                        }),
                        ..Default::default()
                    }],
                ));
            }
        }
    }

    let system_text = system
        .into_iter()
        .filter(|s| !s.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    GenerateRequest {
        contents,
        system_instruction: (!system_text.is_empty()).then(|| Content {
            role: None,
            parts: vec![Part::text(system_text)],
        }),
        tools: if tools.is_empty() {
            Vec::new()
        } else {
            vec![GeminiTool {
                function_declarations: tools.iter().map(FunctionDeclaration::from_definition).collect(),
            }]
        },
        generation_config: match spec.mode {
            PipelineMode::Interactive => Some(GenerationConfig {
                temperature: spec.model.temperature,
                top_p: spec.model.top_p,
                top_k: spec.model.top_k,
            }),
            PipelineMode::Background => None,
        },
    }
}

/// Pipeline backed by the Gemini REST API.
pub struct GeminiPipeline {
    client: GeminiClient,
    spec: PipelineSpec,
}

impl GeminiPipeline {
    /// Creates a pipeline.
    pub fn new(client: GeminiClient, spec: PipelineSpec) -> Self {
        Self { client, spec }
    }
}

#[async_trait]
impl Pipeline for GeminiPipeline {
    fn mode(&self) -> PipelineMode {
        self.spec.mode
    }

    async fn respond(
        &self,
        instructions: &str,
        history: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<PipelineReply, PipelineError> {
        let request = build_request(&self.spec, instructions, history, tools);
        let response = self.client.generate(&self.spec.model.model, &request).await?;
        let reply = response.into_reply()?;
        debug!(
            mode = %self.spec.mode,
            tool_calls = reply.tool_calls.len(),
            "gemini reply received"
        );
        Ok(reply)
    }
}

/// Builds [`GeminiPipeline`]s sharing one client.
pub struct GeminiPipelineFactory {
    client: GeminiClient,
}

impl GeminiPipelineFactory {
    /// Creates a factory.
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }
}

impl PipelineFactory for GeminiPipelineFactory {
    fn create(&self, spec: &PipelineSpec) -> Arc<dyn Pipeline> {
        Arc::new(GeminiPipeline::new(self.client.clone(), spec.clone()))
    }
}
