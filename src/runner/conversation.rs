//! 单次 Run 的对话状态
//!
//! 只追加的回合序列（用户消息、工具调用、工具结果/失败、转交记录、最终回答），
//! 由执行该 Run 的 runner 独占，Run 结束即丢弃。转交时整段历史原样带给新 Agent。

use serde::Serialize;
use serde_json::Value;

use crate::llm::Message;

/// 对话中的一条记录
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Turn {
    User { content: String },
    ToolCall { agent: String, tool: String, args: Value },
    ToolResult { tool: String, result: Value },
    ToolFailure { tool: String, error: String },
    Delegation { from: String, to: String },
    FinalAnswer { agent: String, answer: Value },
}

#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    turns: Vec<Turn>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// 渲染为聊天消息：Agent 自己的动作是 assistant，工具观察与转交通知是 user
    pub fn to_messages(&self) -> Vec<Message> {
        self.turns
            .iter()
            .map(|turn| match turn {
                Turn::User { content } => Message::user(content.clone()),
                Turn::ToolCall { tool, args, .. } => {
                    Message::assistant(serde_json::json!({ "tool": tool, "args": args }).to_string())
                }
                Turn::ToolResult { tool, result } => {
                    Message::user(format!("Observation from {tool}: {}", render_value(result)))
                }
                Turn::ToolFailure { tool, error } => {
                    Message::user(format!("Tool {tool} failed: {error}"))
                }
                Turn::Delegation { from, to } => Message::user(format!(
                    "{from} handed off the conversation to {to}. You are now {to}; continue from here."
                )),
                Turn::FinalAnswer { answer, .. } => Message::assistant(render_value(answer)),
            })
            .collect()
    }
}

/// 字符串原样输出，其余 JSON 紧凑序列化
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;
    use serde_json::json;

    #[test]
    fn test_messages_follow_turn_order() {
        let mut state = ConversationState::new();
        state.push(Turn::User { content: "chest exercises?".into() });
        state.push(Turn::Delegation { from: "Coach".into(), to: "Workout Specialist".into() });
        state.push(Turn::ToolCall {
            agent: "Workout Specialist".into(),
            tool: "get_exercise_info".into(),
            args: json!({"muscle_group": "chest"}),
        });
        state.push(Turn::ToolResult {
            tool: "get_exercise_info".into(),
            result: json!("Exercise information for neck is not available."),
        });

        let messages = state.to_messages();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0], Message::user("chest exercises?"));
        assert_eq!(messages[1].role, Role::User);
        assert!(messages[1].content.contains("You are now Workout Specialist"));
        assert_eq!(messages[2].role, Role::Assistant);
        assert!(messages[2].content.contains("\"tool\":\"get_exercise_info\""));
        assert_eq!(
            messages[3].content,
            "Observation from get_exercise_info: Exercise information for neck is not available."
        );
    }

    #[test]
    fn test_turn_serializes_with_tag() {
        let v = serde_json::to_value(Turn::ToolFailure {
            tool: "calculate_calories".into(),
            error: "bad".into(),
        })
        .unwrap();
        assert_eq!(v["type"], "tool_failure");
    }
}
