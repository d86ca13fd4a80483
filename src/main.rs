//! fitcoach CLI
//!
//! 用法: fitcoach [--agent NAME] [--config PATH] <query...>
//! 结果以 JSON 打印到 stdout，过程事件与日志写到 stderr。Ctrl+C 取消当前 Run。

use std::path::PathBuf;

use anyhow::{bail, Context};
use fitcoach::config::load_config;
use fitcoach::core::{create_runner, RunSupervisor};
use fitcoach::runner::RunEvent;
use tokio::sync::mpsc;

struct CliArgs {
    agent: Option<String>,
    config: Option<PathBuf>,
    query: String,
}

fn parse_args(args: impl Iterator<Item = String>) -> anyhow::Result<CliArgs> {
    let mut agent = None;
    let mut config = None;
    let mut words = Vec::new();
    let mut args = args;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--agent" => agent = Some(args.next().context("--agent requires a name")?),
            "--config" => config = Some(PathBuf::from(args.next().context("--config requires a path")?)),
            _ => words.push(arg),
        }
    }
    let query = words.join(" ");
    if query.trim().is_empty() {
        bail!("usage: fitcoach [--agent NAME] [--config PATH] <query...>");
    }
    Ok(CliArgs { agent, config, query })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fitcoach::observability::init();

    let args = parse_args(std::env::args().skip(1))?;
    let cfg = load_config(args.config).context("Failed to load config")?;
    let runner = create_runner(&cfg).context("Failed to build runner")?;
    let agent = args.agent.unwrap_or_else(|| cfg.app.default_agent.clone());

    let supervisor = RunSupervisor::new();
    let cancel = supervisor.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            supervisor.cancel();
        }
    });

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<RunEvent>();
    let printer = tokio::spawn(async move {
        while let Some(ev) = event_rx.recv().await {
            if let Ok(line) = serde_json::to_string(&ev) {
                eprintln!("{line}");
            }
        }
    });

    let result = runner
        .run_with(&agent, &args.query, cancel, Some(&event_tx))
        .await;
    drop(event_tx);
    let _ = printer.await;

    match result {
        Ok(out) => {
            println!("{}", serde_json::to_string_pretty(&out)?);
            Ok(())
        }
        Err(e) => {
            let body = serde_json::json!({ "detail": e.to_string(), "kind": e.kind() });
            println!("{}", serde_json::to_string_pretty(&body)?);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn test_parse_agent_and_query() {
        let parsed = parse_args(args(&["--agent", "Workout Specialist", "legs", "for", "beginners"])).unwrap();
        assert_eq!(parsed.agent.as_deref(), Some("Workout Specialist"));
        assert_eq!(parsed.query, "legs for beginners");
        assert!(parsed.config.is_none());
    }

    #[test]
    fn test_empty_query_is_rejected() {
        assert!(parse_args(args(&["--agent", "Fitness Coach"])).is_err());
        assert!(parse_args(args(&["--agent"])).is_err());
    }
}
