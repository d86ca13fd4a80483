//! 推理能力接口：给定当前 Agent 与对话，返回下一步
//!
//! Step 是封闭的三选一：最终回答 / 调用工具 / 转交给其他 Agent，由 runner 用 match 分派。

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::core::InferenceError;
use crate::runner::ConversationState;
use crate::schema::OutputSchema;
use crate::tools::ToolDescriptor;

/// 最终回答：纯文本或结构化值
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Answer {
    Text(String),
    Structured(Value),
}

impl Answer {
    pub fn into_value(self) -> Value {
        match self {
            Answer::Text(s) => Value::String(s),
            Answer::Structured(v) => v,
        }
    }
}

/// 推理能力给出的下一步
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    FinalAnswer(Answer),
    ToolCall { name: String, args: Value },
    Delegate { target: String },
}

/// 可转交对象的描述
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DelegateDescriptor {
    pub name: String,
    pub description: Option<String>,
}

/// 一次推理请求：当前 Agent 的指令、可用工具、可转交对象、输出 schema 与完整对话
#[derive(Debug, Clone, Copy)]
pub struct StepRequest<'a> {
    pub agent: &'a str,
    pub instructions: &'a str,
    pub tools: &'a [ToolDescriptor],
    pub delegates: &'a [DelegateDescriptor],
    pub output_schema: Option<&'a OutputSchema>,
    pub conversation: &'a ConversationState,
}

/// 推理能力（通常由 LLM 实现）；每次调用即消耗一个回合
#[async_trait]
pub trait Inference: Send + Sync {
    async fn next_step(&self, request: StepRequest<'_>) -> Result<Step, InferenceError>;
}
