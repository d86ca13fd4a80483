//! 工具执行器
//!
//! 持有共享的 ToolRegistry，execute(tool_name, args) 同步调用 registry.invoke，
//! 每次调用输出一条结构化审计日志（JSON）。工具是纯函数，这里不加超时。

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;

use crate::core::ToolError;
use crate::tools::{ToolDescriptor, ToolRegistry};

/// 工具执行器：Run 之间共享（只读）
#[derive(Clone)]
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// 执行指定工具并输出 JSON 审计日志
    pub fn execute(&self, tool_name: &str, args: &Value) -> Result<Value, ToolError> {
        let start = Instant::now();
        let result = self.registry.invoke(tool_name, args);

        let outcome = match &result {
            Ok(_) => "ok",
            Err(ToolError::UnknownTool(_)) => "unknown_tool",
            Err(ToolError::ArgumentValidation { .. }) => "invalid_args",
            Err(_) => "error",
        };
        let audit = serde_json::json!({
            "event": "tool_audit",
            "tool": tool_name,
            "ok": result.is_ok(),
            "outcome": outcome,
            "duration_us": start.elapsed().as_micros() as u64,
            "args_preview": args_preview(args),
        });
        tracing::info!(audit = %audit, "tool");

        result
    }

    pub fn descriptor(&self, name: &str) -> Option<ToolDescriptor> {
        self.registry.descriptor(name)
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }
}

fn args_preview(args: &Value) -> String {
    let s = args.to_string();
    if s.chars().count() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s
    }
}
