//! OpenTelemetry GenAI Semantic Convention attribute constants.
//!
//! Span fields are declared with these names and filled in with
//! `Span::record` once a response is known.

// --- Required attributes ---

/// The name of the operation being performed (e.g., "chat", "invoke_agent").
pub const GEN_AI_OPERATION_NAME: &str = "gen_ai.operation.name";

/// The name of the GenAI provider (e.g., "aws.bedrock").
pub const GEN_AI_PROVIDER_NAME: &str = "gen_ai.provider.name";

// --- Recommended attributes ---

/// The model ID requested.
pub const GEN_AI_REQUEST_MODEL: &str = "gen_ai.request.model";

/// The maximum number of output tokens requested.
pub const GEN_AI_REQUEST_MAX_TOKENS: &str = "gen_ai.request.max_tokens";

/// The number of input tokens consumed.
pub const GEN_AI_USAGE_INPUT_TOKENS: &str = "gen_ai.usage.input_tokens";

/// The number of output tokens generated.
pub const GEN_AI_USAGE_OUTPUT_TOKENS: &str = "gen_ai.usage.output_tokens";

/// The finish reason for the response (e.g., "end_turn", "tool_use").
pub const GEN_AI_RESPONSE_FINISH_REASONS: &str = "gen_ai.response.finish_reasons";

// --- Tool attributes ---

/// Name of the tool executed.
pub const GEN_AI_TOOL_NAME: &str = "gen_ai.tool.name";

/// Provider-assigned id of the tool call.
pub const GEN_AI_TOOL_CALL_ID: &str = "gen_ai.tool.call.id";

// --- Operation name values ---

/// Single model call.
pub const OP_CHAT: &str = "chat";

/// Agent invocation operation.
pub const OP_INVOKE_AGENT: &str = "invoke_agent";

/// Tool execution requested by the model.
pub const OP_EXECUTE_TOOL: &str = "execute_tool";

// --- Provider name values ---

/// AWS Bedrock provider identifier.
pub const PROVIDER_AWS_BEDROCK: &str = "aws.bedrock";
