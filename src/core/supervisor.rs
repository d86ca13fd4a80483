//! Run 监管：取消令牌
//!
//! 持有 CancellationToken，调用方（Ctrl+C、HTTP 断开等）触发取消后，
//! 正在进行的 Run 在下一次回合边界或等待推理时结束为 Cancelled；工具执行中途不会被打断。

use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
pub struct RunSupervisor {
    cancel_token: CancellationToken,
}

impl RunSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// 触发取消（取消所有子 token）
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// 创建子 token（用于单个 Run；取消子 token 不影响其他 Run）
    pub fn child_token(&self) -> CancellationToken {
        self.cancel_token.child_token()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_propagates_to_children() {
        let supervisor = RunSupervisor::new();
        let a = supervisor.child_token();
        let b = supervisor.child_token();
        a.cancel();
        assert!(!b.is_cancelled());
        assert!(!supervisor.is_cancelled());
        supervisor.cancel();
        assert!(b.is_cancelled());
    }
}
