//! Planner：基于 LLM 的推理能力
//!
//! 把当前 Agent 的指令、工具 schema、可转交对象与输出 schema 拼成 system prompt，
//! 对话渲染为消息后调用 LLM；parse_step 把回复解析为 Step。

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::core::InferenceError;
use crate::llm::{LlmClient, Message};
use crate::runner::{Answer, Inference, Step, StepRequest};
use crate::schema::{extract_fenced_json, scan_braced_json};
use crate::tools::step_format_schema_json;

const STEP_KEYS: [&str; 4] = ["tool", "handoff", "delegate", "final"];

/// 解析 LLM 回复为 Step
///
/// - `{"tool": ..., "args": {...}}` 为工具调用；同时带 "final" 时仍以工具调用为准
/// - `{"handoff": "..."}`（或 "delegate"）为转交
/// - `{"final": ...}` 为最终回答；其余 JSON 对象整体视为结构化回答
/// - 无法解析为 JSON 的文本即为文本回答
///
/// 整段回复或 ```json 代码块才按上述规则解析；夹在正文里的 `{...}` 只有带
/// tool / handoff / delegate / final 键时才算步骤，否则整段仍是文本回答。
pub fn parse_step(output: &str) -> Step {
    let trimmed = output.trim();
    let obj = match extract_fenced_json(trimmed) {
        Some(Value::Object(obj)) => obj,
        Some(Value::String(s)) => return Step::FinalAnswer(Answer::Text(s)),
        Some(_) => return Step::FinalAnswer(Answer::Text(trimmed.to_string())),
        None => match scan_braced_json(trimmed) {
            Some(Value::Object(obj)) if STEP_KEYS.iter().any(|k| obj.contains_key(*k)) => obj,
            _ => return Step::FinalAnswer(Answer::Text(trimmed.to_string())),
        },
    };

    let non_empty = |key: &str| {
        obj.get(key)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
    };

    if let Some(name) = non_empty("tool") {
        let args = obj.get("args").cloned().unwrap_or_else(|| json!({}));
        return Step::ToolCall { name, args };
    }
    if let Some(target) = non_empty("handoff").or_else(|| non_empty("delegate")) {
        return Step::Delegate { target };
    }
    match obj.get("final") {
        Some(Value::String(s)) => Step::FinalAnswer(Answer::Text(s.clone())),
        Some(v) => Step::FinalAnswer(Answer::Structured(v.clone())),
        None => Step::FinalAnswer(Answer::Structured(Value::Object(obj))),
    }
}

/// Planner：持有 LLM，按当前 Agent 动态拼 system prompt
pub struct Planner {
    llm: Arc<dyn LlmClient>,
}

impl Planner {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// 获取 LLM 累计 token 使用统计
    pub fn token_usage(&self) -> (u64, u64, u64) {
        self.llm.token_usage()
    }

    /// 指令 + 可用工具 + 可转交对象 + 输出 schema + 回复格式
    pub fn system_prompt(request: &StepRequest<'_>) -> String {
        let mut sections = vec![request.instructions.trim().to_string()];

        if request.tools.is_empty() {
            sections.push("## Available tools\n(none)".to_string());
        } else {
            let tools = serde_json::to_string_pretty(request.tools).unwrap_or_default();
            sections.push(format!("## Available tools\n{tools}"));
        }

        if !request.delegates.is_empty() {
            let lines: Vec<String> = request
                .delegates
                .iter()
                .map(|d| match &d.description {
                    Some(desc) => format!("- {}: {}", d.name, desc),
                    None => format!("- {}", d.name),
                })
                .collect();
            sections.push(format!(
                "## Handoffs\nYou may hand the conversation off to:\n{}",
                lines.join("\n")
            ));
        }

        if let Some(schema) = request.output_schema {
            let rendered = serde_json::to_string_pretty(&schema.to_json_schema()).unwrap_or_default();
            sections.push(format!(
                "## Output schema\nYour final answer MUST be a JSON object matching this schema, sent as {{\"final\": {{...}}}}:\n{rendered}"
            ));
        }

        sections.push(format!(
            "## Response format\nReply with exactly one JSON object matching this schema and nothing else:\n{}",
            step_format_schema_json()
        ));
        sections.join("\n\n")
    }
}

#[async_trait]
impl Inference for Planner {
    async fn next_step(&self, request: StepRequest<'_>) -> Result<Step, InferenceError> {
        let mut messages = vec![Message::system(Self::system_prompt(&request))];
        messages.extend(request.conversation.to_messages());

        let output = self.llm.complete(&messages).await.map_err(InferenceError)?;
        tracing::debug!(agent = %request.agent, output = %output, "llm output");
        Ok(parse_step(&output))
    }
}
