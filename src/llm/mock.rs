//! Mock LLM 客户端（无 API Key 时的本地回退，也用于测试）
//!
//! 取最后一条 User 消息，回显为一条最终回答，便于本地跑通 Run 流程。

use async_trait::async_trait;

use crate::llm::{LlmClient, Message, Role};

/// Mock 客户端：回显用户最后一条消息
#[derive(Debug, Default)]
pub struct MockLlmClient;

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, String> {
        let last_user = messages
            .iter()
            .rev()
            .find(|m| matches!(m.role, Role::User))
            .map(|m| m.content.as_str())
            .unwrap_or("(no input)");

        Ok(serde_json::json!({ "final": format!("Echo from Mock: {last_user}") }).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_echoes_last_user_message() {
        let out = MockLlmClient
            .complete(&[
                Message::system("sys"),
                Message::user("first"),
                Message::assistant("reply"),
                Message::user("second"),
            ])
            .await
            .unwrap();
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["final"], "Echo from Mock: second");
    }
}
