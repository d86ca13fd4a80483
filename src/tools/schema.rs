//! Step 输出格式的 JSON Schema 生成（schemars）
//!
//! 用于把「合法的下一步」JSON 结构注入 system prompt，减少 LLM 输出格式错误。

use schemars::{schema_for, JsonSchema};
use serde_json::Value;

/// 调用工具：{"tool": "...", "args": {...}}
#[allow(dead_code)]
#[derive(JsonSchema)]
struct ToolCallFormat {
    /// 工具名，必须是当前 Agent 可用的工具之一
    pub tool: String,
    /// 工具参数（JSON 对象，按工具参数 schema 填写）
    pub args: serde_json::Map<String, Value>,
}

/// 转交给其他 Agent：{"handoff": "Agent Name"}
#[allow(dead_code)]
#[derive(JsonSchema)]
struct HandoffFormat {
    /// 目标 Agent 名称，必须是当前 Agent 可转交的对象之一
    pub handoff: String,
}

/// 最终回答：{"final": <文本或符合输出 schema 的对象>}
#[allow(dead_code)]
#[derive(JsonSchema)]
struct FinalFormat {
    /// 最终回答；若声明了输出 schema，必须是符合该 schema 的对象
    #[serde(rename = "final")]
    pub answer: Value,
}

/// 每轮回复必须是三种结构之一
#[allow(dead_code)]
#[derive(JsonSchema)]
#[serde(untagged)]
enum StepFormat {
    ToolCall(ToolCallFormat),
    Handoff(HandoffFormat),
    Final(FinalFormat),
}

/// 返回 step 格式的 JSON Schema 字符串，可拼入 system prompt
pub fn step_format_schema_json() -> String {
    let schema = schema_for!(StepFormat);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}
