//! 工具参数 schema
//!
//! 每个工具声明一组带类型的参数（字符串 / 数值 / 整数，可带取值范围），
//! 注册表在调用工具前按此校验 JSON 参数，并可渲染为 JSON Schema 注入 prompt。

use serde_json::{json, Map, Value};

use crate::core::ArgViolation;

/// 参数类型（数值类可带闭区间范围）
#[derive(Debug, Clone, PartialEq)]
pub enum ParamKind {
    String,
    Number { min: Option<f64>, max: Option<f64> },
    Integer { min: Option<i64>, max: Option<i64> },
}

/// 单个参数声明
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub description: String,
    pub kind: ParamKind,
    pub required: bool,
}

impl ParamSpec {
    pub fn string(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            kind: ParamKind::String,
            required: true,
        }
    }

    pub fn number(name: &str, description: &str, min: f64, max: f64) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            kind: ParamKind::Number {
                min: Some(min),
                max: Some(max),
            },
            required: true,
        }
    }

    pub fn integer(name: &str, description: &str, min: i64, max: i64) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            kind: ParamKind::Integer {
                min: Some(min),
                max: Some(max),
            },
            required: true,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    fn check(&self, value: &Value) -> Option<String> {
        match &self.kind {
            ParamKind::String => (!value.is_string()).then(|| "expected string".to_string()),
            ParamKind::Number { min, max } => {
                let Some(n) = value.as_f64() else {
                    return Some("expected number".to_string());
                };
                out_of_range(n, *min, *max)
            }
            ParamKind::Integer { min, max } => {
                // 20.0 这类整值浮点也接受；20.5 不接受
                let n = match value.as_i64() {
                    Some(n) => n,
                    None => match value.as_f64() {
                        Some(f) if f.fract() == 0.0 => f as i64,
                        _ => return Some("expected integer".to_string()),
                    },
                };
                out_of_range(n as f64, min.map(|v| v as f64), max.map(|v| v as f64))
            }
        }
    }

    fn to_json_schema(&self) -> Value {
        let mut prop = Map::new();
        let ty = match self.kind {
            ParamKind::String => "string",
            ParamKind::Number { .. } => "number",
            ParamKind::Integer { .. } => "integer",
        };
        prop.insert("type".into(), json!(ty));
        prop.insert("description".into(), json!(self.description));
        match self.kind {
            ParamKind::Number { min, max } => {
                if let Some(v) = min {
                    prop.insert("minimum".into(), json!(v));
                }
                if let Some(v) = max {
                    prop.insert("maximum".into(), json!(v));
                }
            }
            ParamKind::Integer { min, max } => {
                if let Some(v) = min {
                    prop.insert("minimum".into(), json!(v));
                }
                if let Some(v) = max {
                    prop.insert("maximum".into(), json!(v));
                }
            }
            ParamKind::String => {}
        }
        Value::Object(prop)
    }
}

fn out_of_range(n: f64, min: Option<f64>, max: Option<f64>) -> Option<String> {
    if let Some(lo) = min {
        if n < lo {
            return Some(format!("{n} is below minimum {lo}"));
        }
    }
    if let Some(hi) = max {
        if n > hi {
            return Some(format!("{n} is above maximum {hi}"));
        }
    }
    None
}

/// 工具的完整参数列表
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamSchema {
    params: Vec<ParamSpec>,
}

impl ParamSchema {
    pub fn new(params: Vec<ParamSpec>) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// 校验参数，收集全部违规项（而不是遇到第一个就返回）
    pub fn validate(&self, args: &Value) -> Result<(), Vec<ArgViolation>> {
        let Some(obj) = args.as_object() else {
            return Err(vec![ArgViolation {
                param: "(args)".to_string(),
                reason: "expected a JSON object".to_string(),
            }]);
        };
        let violations: Vec<ArgViolation> = self
            .params
            .iter()
            .filter_map(|spec| match obj.get(&spec.name) {
                None | Some(Value::Null) if spec.required => Some(ArgViolation {
                    param: spec.name.clone(),
                    reason: "missing required parameter".to_string(),
                }),
                None | Some(Value::Null) => None,
                Some(v) => spec.check(v).map(|reason| ArgViolation {
                    param: spec.name.clone(),
                    reason,
                }),
            })
            .collect();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    /// 渲染为 JSON Schema（object / properties / required）
    pub fn to_json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .params
            .iter()
            .map(|p| (p.name.clone(), p.to_json_schema()))
            .collect();
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> ParamSchema {
        ParamSchema::new(vec![
            ParamSpec::string("goal", "goal"),
            ParamSpec::number("weight_kg", "weight", 1.0, 500.0),
            ParamSpec::integer("age", "age", 1, 120),
            ParamSpec::string("note", "free text").optional(),
        ])
    }

    #[test]
    fn test_valid_args_pass() {
        let args = json!({"goal": "weight loss", "weight_kg": 80, "age": 30});
        assert!(schema().validate(&args).is_ok());
    }

    #[test]
    fn test_collects_every_violation() {
        let args = json!({"weight_kg": "heavy", "age": 30.5});
        let violations = schema().validate(&args).unwrap_err();
        let names: Vec<&str> = violations.iter().map(|v| v.param.as_str()).collect();
        assert_eq!(names, vec!["goal", "weight_kg", "age"]);
    }

    #[test]
    fn test_range_checked() {
        let args = json!({"goal": "x", "weight_kg": 0.5, "age": 200});
        let violations = schema().validate(&args).unwrap_err();
        assert_eq!(violations.len(), 2);
        assert!(violations[0].reason.contains("below minimum"));
        assert!(violations[1].reason.contains("above maximum"));
    }

    #[test]
    fn test_whole_float_is_integer() {
        let args = json!({"goal": "x", "weight_kg": 70.5, "age": 30.0});
        assert!(schema().validate(&args).is_ok());
    }

    #[test]
    fn test_non_object_args_rejected() {
        assert!(schema().validate(&json!("chest")).is_err());
    }

    #[test]
    fn test_json_schema_lists_required() {
        let s = schema().to_json_schema();
        assert_eq!(s["required"], json!(["goal", "weight_kg", "age"]));
        assert_eq!(s["properties"]["age"]["type"], "integer");
        assert_eq!(s["properties"]["weight_kg"]["maximum"], json!(500.0));
    }
}
