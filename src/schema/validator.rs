//! 输出 schema 校验
//!
//! 逐字段检查候选结果（缺失必填字段、基础类型不符、取值不在允许集合内），
//! 一次性列出全部违规；通过时返回按字段类型规整后的值。校验是纯结构化的，不调用 LLM 或工具。

use serde_json::{json, Map, Number, Value};

use crate::core::{FieldViolation, SchemaConformanceError};

/// 字段类型
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    StringList,
    /// 取值限定集合（大小写不敏感匹配，输出规范写法）
    OneOf(Vec<String>),
}

impl FieldType {
    fn expected(&self) -> &'static str {
        match self {
            FieldType::String | FieldType::OneOf(_) => "string",
            FieldType::Integer => "integer",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::StringList => "list of strings",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub description: String,
    pub ty: FieldType,
    pub required: bool,
}

impl FieldSpec {
    pub fn new(name: &str, ty: FieldType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            ty,
            required: true,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

/// Agent 声明的输出结构
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSchema {
    name: String,
    fields: Vec<FieldSpec>,
}

impl OutputSchema {
    pub fn new(name: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// 渲染为 JSON Schema，注入 prompt
    pub fn to_json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| {
                let mut prop = match &f.ty {
                    FieldType::StringList => json!({"type": "array", "items": {"type": "string"}}),
                    FieldType::OneOf(allowed) => json!({"type": "string", "enum": allowed}),
                    other => json!({"type": other.expected()}),
                };
                prop["description"] = json!(f.description);
                (f.name.clone(), prop)
            })
            .collect();
        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect();
        json!({
            "title": self.name,
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// 校验并规整候选结果；未在 schema 中声明的字段会被丢弃
pub fn validate(schema: &OutputSchema, candidate: &Value) -> Result<Value, SchemaConformanceError> {
    let fail = |violations| SchemaConformanceError {
        schema: schema.name.clone(),
        violations,
    };
    let Some(obj) = candidate.as_object() else {
        return Err(fail(vec![FieldViolation::NotAnObject]));
    };

    let mut out = Map::new();
    let mut violations = Vec::new();
    for field in &schema.fields {
        match obj.get(&field.name) {
            None | Some(Value::Null) => {
                if field.required {
                    violations.push(FieldViolation::Missing {
                        field: field.name.clone(),
                    });
                }
            }
            Some(value) => match coerce(field, value) {
                Ok(v) => {
                    out.insert(field.name.clone(), v);
                }
                Err(v) => violations.push(v),
            },
        }
    }

    if violations.is_empty() {
        Ok(Value::Object(out))
    } else {
        Err(fail(violations))
    }
}

fn coerce(field: &FieldSpec, value: &Value) -> Result<Value, FieldViolation> {
    let wrong_type = || FieldViolation::WrongType {
        field: field.name.clone(),
        expected: field.ty.expected().to_string(),
    };
    match &field.ty {
        FieldType::String => value.is_string().then(|| value.clone()).ok_or_else(wrong_type),
        FieldType::Boolean => value.is_boolean().then(|| value.clone()).ok_or_else(wrong_type),
        FieldType::Number => value.is_number().then(|| value.clone()).ok_or_else(wrong_type),
        FieldType::Integer => {
            if let Some(i) = value.as_i64() {
                return Ok(Value::from(i));
            }
            // 与热量计算一致：四舍六入五成双；超出 i64 范围的不截断
            match value.as_f64().map(f64::round_ties_even) {
                Some(r) if r >= i64::MIN as f64 && r < i64::MAX as f64 => Ok(Value::from(r as i64)),
                _ => Err(wrong_type()),
            }
        }
        FieldType::StringList => match value {
            Value::String(s) => Ok(json!([s])),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::String(_) => Ok(item.clone()),
                    Value::Number(n) => Ok(Value::String(number_to_string(n))),
                    Value::Bool(b) => Ok(Value::String(b.to_string())),
                    _ => Err(wrong_type()),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            _ => Err(wrong_type()),
        },
        FieldType::OneOf(allowed) => {
            let s = value.as_str().ok_or_else(wrong_type)?;
            allowed
                .iter()
                .find(|a| a.eq_ignore_ascii_case(s.trim()))
                .map(|a| Value::String(a.clone()))
                .ok_or_else(|| FieldViolation::NotAllowed {
                    field: field.name.clone(),
                    value: s.to_string(),
                    allowed: allowed.clone(),
                })
        }
    }
}

fn number_to_string(n: &Number) -> String {
    n.to_string()
}

/// 从 LLM 文本中提取 JSON：整段、```json 代码块，最后退回首个 '{' 到最后一个 '}'
pub fn extract_json(text: &str) -> Option<Value> {
    extract_fenced_json(text).or_else(|| scan_braced_json(text))
}

/// 整段本身是 JSON，或 ```json 代码块内是合法 JSON
pub fn extract_fenced_json(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if let Ok(v) = serde_json::from_str::<Value>(trimmed) {
        return Some(v);
    }
    let start = trimmed.find("```json")?;
    let rest = &trimmed[start + 7..];
    let body = rest.find("```").map(|end| &rest[..end]).unwrap_or(rest);
    serde_json::from_str(body.trim()).ok()
}

/// 文本中首个 '{' 到最后一个 '}' 之间的 JSON
pub fn scan_braced_json(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> OutputSchema {
        OutputSchema::new(
            "Sample",
            vec![
                FieldSpec::new("title", FieldType::String, "title"),
                FieldSpec::new("count", FieldType::Integer, "count"),
                FieldSpec::new("tags", FieldType::StringList, "tags"),
                FieldSpec::new(
                    "level",
                    FieldType::OneOf(vec!["Low".into(), "High".into()]),
                    "level",
                ),
                FieldSpec::new("ratio", FieldType::Number, "ratio").optional(),
            ],
        )
    }

    #[test]
    fn test_valid_candidate_is_idempotent() {
        let candidate = json!({"title": "t", "count": 3, "tags": ["a", "b"], "level": "High"});
        let once = validate(&schema(), &candidate).unwrap();
        assert_eq!(once, candidate);
        let twice = validate(&schema(), &once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_coercions() {
        let candidate = json!({
            "title": "t",
            "count": 2.6,
            "tags": "solo",
            "level": "low",
            "ratio": 0.5,
            "extra": true
        });
        let out = validate(&schema(), &candidate).unwrap();
        assert_eq!(
            out,
            json!({"title": "t", "count": 3, "tags": ["solo"], "level": "Low", "ratio": 0.5})
        );
    }

    #[test]
    fn test_list_scalars_stringified() {
        let candidate = json!({"title": "t", "count": 1, "tags": [1, true, "x"], "level": "HIGH"});
        let out = validate(&schema(), &candidate).unwrap();
        assert_eq!(out["tags"], json!(["1", "true", "x"]));
    }

    #[test]
    fn test_all_violations_reported() {
        let candidate = json!({"count": "three", "tags": [{"a": 1}], "level": "medium"});
        let err = validate(&schema(), &candidate).unwrap_err();
        assert_eq!(err.schema, "Sample");
        assert_eq!(
            err.violations,
            vec![
                FieldViolation::Missing { field: "title".into() },
                FieldViolation::WrongType { field: "count".into(), expected: "integer".into() },
                FieldViolation::WrongType { field: "tags".into(), expected: "list of strings".into() },
                FieldViolation::NotAllowed {
                    field: "level".into(),
                    value: "medium".into(),
                    allowed: vec!["Low".into(), "High".into()],
                },
            ]
        );
    }

    #[test]
    fn test_non_object_rejected() {
        let err = validate(&schema(), &json!("just text")).unwrap_err();
        assert_eq!(err.violations, vec![FieldViolation::NotAnObject]);
    }

    #[test]
    fn test_extract_json_variants() {
        assert_eq!(extract_json(r#"{"a": 1}"#), Some(json!({"a": 1})));
        assert_eq!(
            extract_json("Here you go:\n```json\n{\"a\": 2}\n```\nEnjoy"),
            Some(json!({"a": 2}))
        );
        assert_eq!(extract_json("Plan: {\"a\": 3} done"), Some(json!({"a": 3})));
        assert_eq!(extract_json("no json here"), None);
        assert_eq!(extract_json("} backwards {"), None);
        assert_eq!(extract_fenced_json("Plan: {\"a\": 3} done"), None);
    }

    #[test]
    fn test_broken_fence_falls_back_to_braces() {
        let text = "```json\n{\"a\": 4,}\n```\nCorrected: {\"a\": 4}";
        assert_eq!(extract_fenced_json(text), None);
        // 首个 '{' 在坏代码块里，扫描从它开始到最后一个 '}'，不是合法 JSON
        assert_eq!(extract_json(text), None);

        let text = "```json\n{\"a\": 5\n```\n{\"b\": 6}";
        assert_eq!(scan_braced_json(text), None);
        let text = "```json\nnot json\n``` then {\"b\": 6}";
        assert_eq!(extract_json(text), Some(json!({"b": 6})));
    }

    #[test]
    fn test_integer_rounding_and_range() {
        let with_count = |count: Value| json!({"title": "t", "count": count, "tags": [], "level": "Low"});
        let out = validate(&schema(), &with_count(json!(2.5))).unwrap();
        assert_eq!(out["count"], 2);
        let out = validate(&schema(), &with_count(json!(3.5))).unwrap();
        assert_eq!(out["count"], 4);
        let out = validate(&schema(), &with_count(json!(-2.5))).unwrap();
        assert_eq!(out["count"], -2);

        let err = validate(&schema(), &with_count(json!(1e20))).unwrap_err();
        assert_eq!(
            err.violations,
            vec![FieldViolation::WrongType { field: "count".into(), expected: "integer".into() }]
        );
        assert!(validate(&schema(), &with_count(json!(u64::MAX))).is_err());
    }

    #[test]
    fn test_json_schema_rendering() {
        let s = schema().to_json_schema();
        assert_eq!(s["title"], "Sample");
        assert_eq!(s["properties"]["tags"]["items"]["type"], "string");
        assert_eq!(s["properties"]["level"]["enum"], json!(["Low", "High"]));
        assert_eq!(s["required"], json!(["title", "count", "tags", "level"]));
    }
}
