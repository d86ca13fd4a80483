//! 错误类型
//!
//! 分三层：启动期配置错误（ConfigError）、工具调用错误（ToolError）与单次 Run 的终止错误（RunError）。
//! RunError 通过 kind() 映射为可序列化的 FailureKind，供 HTTP 等边界输出结构化失败记录。

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Agent / 工具装配错误：在进程启动、构建 Agent 时即时发现
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Agent '{agent}' references unregistered tool '{tool}'")]
    UnregisteredTool { agent: String, tool: String },

    #[error("Agent '{agent}' delegates to unknown agent '{target}'")]
    UnknownDelegate { agent: String, target: String },

    #[error("Duplicate agent name: {0}")]
    DuplicateAgent(String),

    #[error("Agent name must not be empty")]
    EmptyAgentName,
}

/// 单个参数校验失败项
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArgViolation {
    pub param: String,
    pub reason: String,
}

impl fmt::Display for ArgViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.param, self.reason)
    }
}

/// 工具注册与调用错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    #[error("Duplicate tool: {0}")]
    DuplicateTool(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for '{tool}': {}", join_display(.violations))]
    ArgumentValidation {
        tool: String,
        violations: Vec<ArgViolation>,
    },

    #[error("Tool '{tool}' failed: {message}")]
    ToolExecution { tool: String, message: String },
}

/// 单个字段不符合输出 schema 的原因
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FieldViolation {
    Missing { field: String },
    WrongType { field: String, expected: String },
    NotAllowed { field: String, value: String, allowed: Vec<String> },
    NotAnObject,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldViolation::Missing { field } => write!(f, "{field}: missing required field"),
            FieldViolation::WrongType { field, expected } => {
                write!(f, "{field}: expected {expected}")
            }
            FieldViolation::NotAllowed { field, value, allowed } => write!(
                f,
                "{field}: '{value}' is not one of [{}]",
                allowed.join(", ")
            ),
            FieldViolation::NotAnObject => write!(f, "expected a JSON object"),
        }
    }
}

/// 最终回答未通过输出 schema 校验：列出所有失败字段
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Output does not match schema '{schema}': {}", join_display(.violations))]
pub struct SchemaConformanceError {
    pub schema: String,
    pub violations: Vec<FieldViolation>,
}

/// 推理能力（LLM 调用）失败
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Inference error: {0}")]
pub struct InferenceError(pub String);

/// 单次 Run 的终止错误；都不会导致进程崩溃，只作为结构化结果返回
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Unknown agent: {0}")]
    UnknownAgent(String),

    #[error("Agent '{agent}' is not allowed to call tool '{tool}'")]
    UnauthorizedTool { agent: String, tool: String },

    #[error("Agent '{agent}' is not allowed to delegate to '{target}'")]
    UnauthorizedDelegation { agent: String, target: String },

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    SchemaConformance(#[from] SchemaConformanceError),

    #[error("Max turns exceeded ({0})")]
    MaxTurnsExceeded(usize),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error("Cancelled")]
    Cancelled,
}

/// 失败种类（对外的稳定标识）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    UnknownAgent,
    UnauthorizedTool,
    UnauthorizedDelegation,
    UnknownTool,
    ArgumentValidation,
    ToolExecution,
    SchemaConformance,
    MaxTurnsExceeded,
    Inference,
    Cancelled,
}

impl RunError {
    pub fn kind(&self) -> FailureKind {
        match self {
            RunError::UnknownAgent(_) => FailureKind::UnknownAgent,
            RunError::UnauthorizedTool { .. } => FailureKind::UnauthorizedTool,
            RunError::UnauthorizedDelegation { .. } => FailureKind::UnauthorizedDelegation,
            RunError::Tool(ToolError::UnknownTool(_)) => FailureKind::UnknownTool,
            RunError::Tool(ToolError::ArgumentValidation { .. }) => FailureKind::ArgumentValidation,
            // DuplicateTool 只在注册期出现，运行期按执行失败归类
            RunError::Tool(_) => FailureKind::ToolExecution,
            RunError::SchemaConformance(_) => FailureKind::SchemaConformance,
            RunError::MaxTurnsExceeded(_) => FailureKind::MaxTurnsExceeded,
            RunError::Inference(_) => FailureKind::Inference,
            RunError::Cancelled => FailureKind::Cancelled,
        }
    }
}

fn join_display<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_validation_message_lists_all() {
        let err = ToolError::ArgumentValidation {
            tool: "calculate_calories".to_string(),
            violations: vec![
                ArgViolation { param: "age".into(), reason: "missing required parameter".into() },
                ArgViolation { param: "weight_kg".into(), reason: "expected number".into() },
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("age: missing required parameter"));
        assert!(msg.contains("weight_kg: expected number"));
    }

    #[test]
    fn test_run_error_kind_mapping() {
        let err: RunError = ToolError::UnknownTool("x".into()).into();
        assert_eq!(err.kind(), FailureKind::UnknownTool);
        let err: RunError = InferenceError("down".into()).into();
        assert_eq!(err.kind(), FailureKind::Inference);
        assert_eq!(RunError::MaxTurnsExceeded(3).kind(), FailureKind::MaxTurnsExceeded);
        assert_eq!(
            serde_json::to_value(FailureKind::SchemaConformance).unwrap(),
            serde_json::json!("schema_conformance")
        );
    }
}
