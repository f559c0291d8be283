//! Bedrock Converse API request/response types.
//!
//! The Converse API is model-agnostic: content blocks are objects keyed by
//! their kind (`{"text": ..}`, `{"toolUse": ..}`, `{"toolResult": ..}`) and
//! the model id travels in the URL path, not the body. Block kinds this
//! crate does not use (images, reasoning) deserialize to an empty block and
//! are dropped on conversion.

use serde::{Deserialize, Serialize};

use agentmem_types::llm::{
    ContentBlock, ConverseRequest, Message, MessageRole, ToolResultStatus, ToolSpec,
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BedrockConverseRequest {
    pub messages: Vec<BedrockMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub system: Vec<BedrockSystemBlock>,
    pub inference_config: InferenceConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_config: Option<ToolConfig>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BedrockSystemBlock {
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceConfig {
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolConfig {
    pub tools: Vec<BedrockTool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BedrockTool {
    pub tool_spec: BedrockToolSpec,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BedrockToolSpec {
    pub name: String,
    pub description: String,
    pub input_schema: BedrockInputSchema,
}

#[derive(Debug, Clone, Serialize)]
pub struct BedrockInputSchema {
    pub json: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BedrockMessage {
    pub role: String,
    pub content: Vec<BedrockContentBlock>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BedrockContentBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_use: Option<BedrockToolUse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_result: Option<BedrockToolResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BedrockToolUse {
    pub tool_use_id: String,
    pub name: String,
    #[serde(default)]
    pub input: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BedrockToolResult {
    pub tool_use_id: String,
    pub content: Vec<BedrockToolResultContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BedrockToolResultContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Response body of a non-streaming Converse call.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BedrockConverseResponse {
    pub output: BedrockOutput,
    pub stop_reason: String,
    #[serde(default)]
    pub usage: BedrockUsage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BedrockOutput {
    pub message: BedrockMessage,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BedrockUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl From<&ContentBlock> for BedrockContentBlock {
    fn from(block: &ContentBlock) -> Self {
        match block {
            ContentBlock::Text { text } => Self {
                text: Some(text.clone()),
                ..Self::default()
            },
            ContentBlock::ToolUse { id, name, input } => Self {
                tool_use: Some(BedrockToolUse {
                    tool_use_id: id.clone(),
                    name: name.clone(),
                    input: input.clone(),
                }),
                ..Self::default()
            },
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                status,
            } => Self {
                tool_result: Some(BedrockToolResult {
                    tool_use_id: tool_use_id.clone(),
                    content: vec![BedrockToolResultContent {
                        text: Some(content.clone()),
                    }],
                    status: Some(status_str(*status).to_string()),
                }),
                ..Self::default()
            },
        }
    }
}

impl BedrockContentBlock {
    /// Convert back to a domain block; unknown kinds yield `None`.
    pub fn into_domain(self) -> Option<ContentBlock> {
        if let Some(text) = self.text {
            return Some(ContentBlock::Text { text });
        }
        if let Some(tool_use) = self.tool_use {
            return Some(ContentBlock::ToolUse {
                id: tool_use.tool_use_id,
                name: tool_use.name,
                input: tool_use.input,
            });
        }
        self.tool_result.map(|result| ContentBlock::ToolResult {
            tool_use_id: result.tool_use_id,
            content: result
                .content
                .into_iter()
                .filter_map(|c| c.text)
                .collect::<Vec<_>>()
                .join(""),
            status: match result.status.as_deref() {
                Some("error") => ToolResultStatus::Error,
                _ => ToolResultStatus::Success,
            },
        })
    }
}

fn status_str(status: ToolResultStatus) -> &'static str {
    match status {
        ToolResultStatus::Success => "success",
        ToolResultStatus::Error => "error",
    }
}

impl From<&Message> for BedrockMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role.to_string(),
            content: message.content.iter().map(BedrockContentBlock::from).collect(),
        }
    }
}

impl BedrockMessage {
    pub fn into_domain(self) -> Message {
        Message {
            role: self.role.parse().unwrap_or(MessageRole::Assistant),
            content: self
                .content
                .into_iter()
                .filter_map(BedrockContentBlock::into_domain)
                .collect(),
        }
    }
}

impl From<&ToolSpec> for BedrockTool {
    fn from(spec: &ToolSpec) -> Self {
        Self {
            tool_spec: BedrockToolSpec {
                name: spec.name.clone(),
                description: spec.description.clone(),
                input_schema: BedrockInputSchema {
                    json: spec.input_schema.clone(),
                },
            },
        }
    }
}

impl From<&ConverseRequest> for BedrockConverseRequest {
    fn from(request: &ConverseRequest) -> Self {
        Self {
            messages: request.messages.iter().map(BedrockMessage::from).collect(),
            system: request
                .system
                .iter()
                .map(|text| BedrockSystemBlock { text: text.clone() })
                .collect(),
            inference_config: InferenceConfig {
                max_tokens: request.max_tokens,
                temperature: request.temperature,
            },
            tool_config: (!request.tools.is_empty()).then(|| ToolConfig {
                tools: request.tools.iter().map(BedrockTool::from).collect(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serialization_shape() {
        let request = ConverseRequest {
            model: "us.anthropic.claude-3-7-sonnet-20250219-v1:0".into(),
            messages: vec![
                Message::user("What is 6 * 7?"),
                Message {
                    role: MessageRole::Assistant,
                    content: vec![ContentBlock::ToolUse {
                        id: "t1".into(),
                        name: "calculator".into(),
                        input: json!({"expression": "6 * 7"}),
                    }],
                },
                Message {
                    role: MessageRole::User,
                    content: vec![ContentBlock::ToolResult {
                        tool_use_id: "t1".into(),
                        content: "42".into(),
                        status: ToolResultStatus::Success,
                    }],
                },
            ],
            system: Some("Be helpful.".into()),
            max_tokens: 1024,
            temperature: None,
            tools: vec![ToolSpec {
                name: "calculator".into(),
                description: "Evaluate arithmetic".into(),
                input_schema: json!({"type": "object"}),
            }],
        };

        let body = serde_json::to_value(BedrockConverseRequest::from(&request)).unwrap();
        assert!(body.get("model").is_none());
        assert_eq!(body["system"], json!([{"text": "Be helpful."}]));
        assert_eq!(body["inferenceConfig"], json!({"maxTokens": 1024}));
        assert_eq!(body["messages"][0], json!({"role": "user", "content": [{"text": "What is 6 * 7?"}]}));
        assert_eq!(body["messages"][1]["content"][0]["toolUse"]["toolUseId"], "t1");
        assert_eq!(
            body["messages"][2]["content"][0]["toolResult"],
            json!({"toolUseId": "t1", "content": [{"text": "42"}], "status": "success"})
        );
        assert_eq!(body["toolConfig"]["tools"][0]["toolSpec"]["inputSchema"]["json"]["type"], "object");
    }

    #[test]
    fn test_no_tools_omits_tool_config() {
        let request = ConverseRequest {
            model: "m".into(),
            messages: vec![Message::user("hi")],
            system: None,
            max_tokens: 10,
            temperature: Some(0.2),
            tools: vec![],
        };
        let body = serde_json::to_value(BedrockConverseRequest::from(&request)).unwrap();
        assert!(body.get("toolConfig").is_none());
        assert!(body.get("system").is_none());
        assert_eq!(body["inferenceConfig"]["temperature"], 0.2);
    }

    #[test]
    fn test_response_drops_unknown_blocks() {
        let response: BedrockConverseResponse = serde_json::from_value(json!({
            "output": {"message": {"role": "assistant", "content": [
                {"reasoningContent": {"reasoningText": {"text": "thinking"}}},
                {"text": "Hello!"},
                {"toolUse": {"toolUseId": "t9", "name": "calculator", "input": {"expression": "1+1"}}}
            ]}},
            "stopReason": "tool_use",
            "usage": {"inputTokens": 11, "outputTokens": 4, "totalTokens": 15},
            "metrics": {"latencyMs": 120}
        }))
        .unwrap();

        let message = response.output.message.into_domain();
        assert_eq!(message.role, MessageRole::Assistant);
        assert_eq!(message.content.len(), 2);
        assert_eq!(message.text(), "Hello!");
        assert_eq!(message.tool_uses().count(), 1);
        assert_eq!(response.usage.input_tokens, 11);
    }
}
