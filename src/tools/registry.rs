//! 工具注册表
//!
//! 所有工具实现 Tool trait（name / description / parameters / call），由 ToolRegistry 按名注册与查找。
//! 工具是同步纯函数：调用前按 ParamSchema 校验参数，失败统一转为 ToolError。

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::core::ToolError;
use crate::tools::ParamSchema;

/// 工具 trait：名称、描述（供 LLM 理解）、参数 schema、同步执行（args 为 JSON 对象）
///
/// 实现不得读写参数以外的进程级可变状态；只读查表（构造时传入）是允许的。
pub trait Tool: Send + Sync {
    /// 工具名称（对应 step JSON 中的 "tool" 字段）
    fn name(&self) -> &str;

    /// 工具描述（供 LLM 理解功能）
    fn description(&self) -> &str;

    /// 参数声明
    fn parameters(&self) -> ParamSchema;

    /// 执行工具；参数已通过 parameters() 校验
    fn call(&self, args: &Value) -> Result<Value, String>;
}

/// 提供给推理能力的工具描述（名称、描述、参数 JSON Schema）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// 工具注册表：按名称存储 Arc<dyn Tool>；注册后只读，可在多个 Run 间共享
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: impl Tool + 'static) -> Result<(), ToolError> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(ToolError::DuplicateTool(name));
        }
        self.tools.insert(name, Arc::new(tool));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// 校验参数后同步执行工具
    pub fn invoke(&self, name: &str, args: &Value) -> Result<Value, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        tool.parameters()
            .validate(args)
            .map_err(|violations| ToolError::ArgumentValidation {
                tool: name.to_string(),
                violations,
            })?;
        tool.call(args).map_err(|message| ToolError::ToolExecution {
            tool: name.to_string(),
            message,
        })
    }

    /// 已注册工具名（排序后返回，保证 prompt 稳定）
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn descriptor(&self, name: &str) -> Option<ToolDescriptor> {
        self.tools.get(name).map(|tool| ToolDescriptor {
            name: name.to_string(),
            description: tool.description().to_string(),
            parameters: tool.parameters().to_json_schema(),
        })
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ParamSpec;
    use serde_json::json;

    struct Halve;

    impl Tool for Halve {
        fn name(&self) -> &str {
            "halve"
        }

        fn description(&self) -> &str {
            "Halve a number"
        }

        fn parameters(&self) -> ParamSchema {
            ParamSchema::new(vec![ParamSpec::number("value", "number to halve", -1e6, 1e6)])
        }

        fn call(&self, args: &Value) -> Result<Value, String> {
            let v = args["value"].as_f64().ok_or("value missing")?;
            if v == 13.0 {
                return Err("unlucky".to_string());
            }
            Ok(json!(v / 2.0))
        }
    }

    fn registry() -> ToolRegistry {
        let mut r = ToolRegistry::new();
        r.register(Halve).unwrap();
        r
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut r = registry();
        assert_eq!(r.register(Halve), Err(ToolError::DuplicateTool("halve".into())));
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn test_invoke_ok() {
        let out = registry().invoke("halve", &json!({"value": 9})).unwrap();
        assert_eq!(out, json!(4.5));
    }

    #[test]
    fn test_invoke_unknown() {
        let err = registry().invoke("double", &json!({})).unwrap_err();
        assert_eq!(err, ToolError::UnknownTool("double".into()));
    }

    #[test]
    fn test_invoke_bad_args() {
        let err = registry().invoke("halve", &json!({"value": "nine"})).unwrap_err();
        assert!(matches!(err, ToolError::ArgumentValidation { ref violations, .. } if violations.len() == 1));
    }

    #[test]
    fn test_invoke_tool_failure_wrapped() {
        let err = registry().invoke("halve", &json!({"value": 13})).unwrap_err();
        assert_eq!(
            err,
            ToolError::ToolExecution {
                tool: "halve".into(),
                message: "unlucky".into()
            }
        );
    }

    #[test]
    fn test_descriptor_renders_schema() {
        let d = registry().descriptor("halve").unwrap();
        assert_eq!(d.parameters["required"], json!(["value"]));
        assert!(registry().descriptor("nope").is_none());
    }
}
