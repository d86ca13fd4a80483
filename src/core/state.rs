//! Run 状态机阶段
//!
//! Active -> AwaitingTool -> Active 循环，或 Delegated -> Active，终止于 Done / Failed。

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    /// 等待推理能力给出下一步
    Active,
    /// 正在执行工具
    AwaitingTool,
    /// 刚切换到新的 Agent
    Delegated,
    Done,
    Failed,
}

impl RunPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunPhase::Done | RunPhase::Failed)
    }
}
