//! fitcoach - 回合受限的多 Agent 任务分派引擎
//!
//! 模块划分：
//! - **agent**: Agent 定义（指令、工具集、转交对象、输出 schema）与目录
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误分类、Run 状态、取消监管、统一装配
//! - **integrations**: HTTP 接入（`web` feature）
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / Mock）
//! - **runner**: 推理接口、Planner、Run 主循环
//! - **schema**: 输出 schema 校验与健身计划结构
//! - **tools**: 工具注册表、参数校验、执行器与内置健身工具

pub mod agent;
pub mod config;
pub mod core;
pub mod integrations;
pub mod llm;
pub mod observability;
pub mod runner;
pub mod schema;
pub mod tools;

pub use agent::{Agent, AgentCatalog};
pub use runner::{RunOutput, Runner};
