//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `FITCOACH__*` 覆盖（双下划线表示嵌套，如 `FITCOACH__RUNNER__MAX_TURNS=8`）。
//! `LLM_MODEL_NAME` 单独覆盖模型名。

use std::path::PathBuf;

use serde::Deserialize;

use crate::runner::{ToolFailurePolicy, DEFAULT_MAX_TURNS};

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub runner: RunnerSection,
    pub server: ServerSection,
}

/// [app] 段
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub name: String,
    /// CLI 未指定 --agent 时的起始 Agent
    pub default_agent: String,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: "fitcoach".to_string(),
            default_agent: "Fitness Coach".to_string(),
        }
    }
}

/// [llm] 段：后端选择
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// openai / mock；openai 需要 OPENAI_API_KEY，否则回退到 mock
    pub provider: String,
    pub model: String,
    /// OpenAI 兼容端点
    pub base_url: Option<String>,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            base_url: None,
        }
    }
}

/// [runner] 段：回合预算与工具失败处理
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunnerSection {
    pub max_turns: usize,
    pub tool_failure: ToolFailurePolicy,
}

impl Default for RunnerSection {
    fn default() -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
            tool_failure: ToolFailurePolicy::Abort,
        }
    }
}

/// [server] 段：HTTP 监听地址
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl ServerSection {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 从 config 目录加载配置，环境变量 FITCOACH__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 叠加环境变量 FITCOACH__*（双下划线表示嵌套键）
/// 4. 最后应用 LLM_MODEL_NAME
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    for name in ["config/default", "../config/default"] {
        if std::path::Path::new(&format!("{name}.toml")).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("FITCOACH")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let mut cfg: AppConfig = builder.build()?.try_deserialize()?;
    if let Ok(model) = std::env::var("LLM_MODEL_NAME") {
        if !model.trim().is_empty() {
            cfg.llm.model = model;
        }
    }
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.llm.model, "gpt-4o-mini");
        assert_eq!(cfg.runner.max_turns, 20);
        assert_eq!(cfg.runner.tool_failure, ToolFailurePolicy::Abort);
        assert_eq!(cfg.server.addr(), "0.0.0.0:8000");
        assert_eq!(cfg.app.default_agent, "Fitness Coach");
    }

    #[test]
    fn test_load_from_file_keeps_unset_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[runner]\nmax_turns = 6\ntool_failure = \"observe\"\n\n[server]\nport = 9100"
        )
        .unwrap();

        let cfg = load_config(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(cfg.runner.max_turns, 6);
        assert_eq!(cfg.runner.tool_failure, ToolFailurePolicy::Observe);
        assert_eq!(cfg.server.port, 9100);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.llm.provider, "openai");
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let cfg = load_config(Some(PathBuf::from("/nonexistent/fitcoach.toml"))).unwrap();
        assert_eq!(cfg.app.name, "fitcoach");
    }
}
