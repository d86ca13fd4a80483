//! Run 过程事件：用于 CLI / SSE 等展示回合、工具调用、观察、转交与结果

use serde::Serialize;

use crate::core::{FailureKind, RunPhase};

/// 单步过程事件（可序列化为 JSON 供前端展示）
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    /// 回合数更新（当前第几轮推理）
    StepUpdate {
        step: usize,
        max_steps: usize,
        agent: String,
    },
    /// 状态机阶段变化
    Phase { phase: RunPhase },
    /// 正在调用推理能力
    Thinking { agent: String },
    /// 调用工具
    ToolCall {
        agent: String,
        tool: String,
        args: serde_json::Value,
    },
    /// 工具返回（预览，避免过长）
    Observation { tool: String, preview: String },
    /// 工具执行失败
    ToolFailure { tool: String, reason: String },
    /// 转交给其他 Agent
    Handoff { from: String, to: String },
    /// 最终回答已通过校验
    FinalAnswer { agent: String },
    /// Run 失败
    Error { kind: FailureKind, text: String },
}
