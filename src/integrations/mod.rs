//! 外部接入：HTTP（需 `web` feature）

#[cfg(feature = "web")]
pub mod http;
