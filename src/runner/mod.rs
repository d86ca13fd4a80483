//! Runner：回合受限的 Agent 执行循环
//!
//! - **conversation**: 单次 Run 的只追加对话状态
//! - **step**: 推理能力接口与 Step
//! - **planner**: 基于 LLM 的推理实现与回复解析
//! - **events**: 过程事件
//! - **loop_**: 主循环（工具调用、转交、schema 校验、取消）

pub mod conversation;
pub mod events;
pub mod loop_;
pub mod planner;
pub mod step;

pub use conversation::{ConversationState, Turn};
pub use events::RunEvent;
pub use loop_::{FinalOutput, RunOutput, Runner, ToolFailurePolicy, DEFAULT_MAX_TURNS};
pub use planner::{parse_step, Planner};
pub use step::{Answer, DelegateDescriptor, Inference, Step, StepRequest};
