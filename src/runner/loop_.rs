//! Run 主循环
//!
//! 每轮：检查取消与回合预算 -> 询问推理能力 -> 按 Step 分派：
//! ToolCall 校验授权后执行并写回对话；Delegate 校验授权后切换 Agent（对话原样保留）；
//! FinalAnswer 按当前 Agent 的输出 schema 校验后结束。
//! 回合预算按推理次数计，是防止转交环与工具调用链失控的唯一保护；没有单独的环检测。

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::agent::{Agent, AgentCatalog};
use crate::core::{RunError, RunPhase};
use crate::runner::{
    Answer, ConversationState, DelegateDescriptor, Inference, RunEvent, Step, StepRequest, Turn,
};
use crate::schema::{extract_json, validate};
use crate::tools::{ToolDescriptor, ToolExecutor};

/// 默认回合预算
pub const DEFAULT_MAX_TURNS: usize = 20;
/// Observation 预览最大字符数
const OBSERVATION_PREVIEW_CHARS: usize = 200;

/// 工具参数校验或执行失败时的处理方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolFailurePolicy {
    /// 记录失败后终止 Run
    #[default]
    Abort,
    /// 记录失败并继续，交给下一轮推理处理
    Observe,
}

/// Run 的最终输出
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FinalOutput {
    /// 已通过输出 schema 校验的结构化值
    Structured { schema: String, value: Value },
    /// Agent 未声明输出 schema，原样返回
    Unvalidated { answer: Answer },
}

impl FinalOutput {
    pub fn value(&self) -> Value {
        match self {
            FinalOutput::Structured { value, .. } => value.clone(),
            FinalOutput::Unvalidated { answer } => answer.clone().into_value(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunOutput {
    /// 给出最终回答的 Agent
    pub agent: String,
    pub output: FinalOutput,
    /// 实际消耗的推理回合数
    pub turns_used: usize,
}

/// Runner：只读共享 Agent 目录、工具执行器与推理能力；每次 run 拥有独立的对话状态与回合计数
///
/// 执行器取自目录自己的注册表，Agent 声明的每个工具在运行期都能找到。
#[derive(Clone)]
pub struct Runner {
    agents: Arc<AgentCatalog>,
    executor: ToolExecutor,
    inference: Arc<dyn Inference>,
    max_turns: usize,
    tool_failure: ToolFailurePolicy,
}

impl Runner {
    pub fn new(agents: Arc<AgentCatalog>, inference: Arc<dyn Inference>) -> Self {
        Self {
            executor: agents.executor(),
            agents,
            inference,
            max_turns: DEFAULT_MAX_TURNS,
            tool_failure: ToolFailurePolicy::default(),
        }
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn with_tool_failure(mut self, policy: ToolFailurePolicy) -> Self {
        self.tool_failure = policy;
        self
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    pub fn agents(&self) -> &AgentCatalog {
        &self.agents
    }

    /// 从指定 Agent 开始跑一次（不可取消、无事件）
    pub async fn run(&self, agent: &str, input: &str) -> Result<RunOutput, RunError> {
        self.run_with(agent, input, CancellationToken::new(), None).await
    }

    /// 从指定 Agent 开始跑一次；cancel 在回合之间或等待推理时生效，event_tx 接收过程事件
    pub async fn run_with(
        &self,
        agent: &str,
        input: &str,
        cancel: CancellationToken,
        event_tx: Option<&mpsc::UnboundedSender<RunEvent>>,
    ) -> Result<RunOutput, RunError> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let span = tracing::info_span!("run", run_id = %run_id, start_agent = %agent);
        async {
            tracing::info!(max_turns = self.max_turns, "run started");
            let result = self.drive(agent, input, &cancel, event_tx).await;
            match &result {
                Ok(out) => {
                    send_event(event_tx, RunEvent::Phase { phase: RunPhase::Done });
                    tracing::info!(agent = %out.agent, turns_used = out.turns_used, "run finished");
                }
                Err(e) => {
                    send_event(event_tx, RunEvent::Phase { phase: RunPhase::Failed });
                    send_event(event_tx, RunEvent::Error { kind: e.kind(), text: e.to_string() });
                    tracing::warn!(kind = ?e.kind(), error = %e, "run failed");
                }
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn drive(
        &self,
        start: &str,
        input: &str,
        cancel: &CancellationToken,
        event_tx: Option<&mpsc::UnboundedSender<RunEvent>>,
    ) -> Result<RunOutput, RunError> {
        let mut active = self
            .agents
            .get(start)
            .ok_or_else(|| RunError::UnknownAgent(start.to_string()))?;
        let mut state = ConversationState::new();
        state.push(Turn::User {
            content: input.to_string(),
        });
        let mut turns_left = self.max_turns;

        loop {
            if cancel.is_cancelled() {
                return Err(RunError::Cancelled);
            }
            if turns_left == 0 {
                return Err(RunError::MaxTurnsExceeded(self.max_turns));
            }

            let round = self.max_turns - turns_left + 1;
            send_event(event_tx, RunEvent::StepUpdate {
                step: round,
                max_steps: self.max_turns,
                agent: active.name().to_string(),
            });
            send_event(event_tx, RunEvent::Phase { phase: RunPhase::Active });
            send_event(event_tx, RunEvent::Thinking { agent: active.name().to_string() });

            let tools = self.tool_descriptors(&active);
            let delegates = self.delegate_descriptors(&active);
            let request = StepRequest {
                agent: active.name(),
                instructions: active.instructions(),
                tools: &tools,
                delegates: &delegates,
                output_schema: active.output_schema(),
                conversation: &state,
            };

            // 唯一的挂起点：等待推理期间也响应取消
            let step = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(RunError::Cancelled),
                step = self.inference.next_step(request) => step,
            };
            turns_left -= 1;
            let step = step?;
            tracing::debug!(agent = %active.name(), round, ?step, "step");

            match step {
                Step::ToolCall { name, args } => {
                    if !active.can_use_tool(&name) {
                        return Err(RunError::UnauthorizedTool {
                            agent: active.name().to_string(),
                            tool: name,
                        });
                    }
                    send_event(event_tx, RunEvent::Phase { phase: RunPhase::AwaitingTool });
                    send_event(event_tx, RunEvent::ToolCall {
                        agent: active.name().to_string(),
                        tool: name.clone(),
                        args: args.clone(),
                    });
                    state.push(Turn::ToolCall {
                        agent: active.name().to_string(),
                        tool: name.clone(),
                        args: args.clone(),
                    });

                    match self.executor.execute(&name, &args) {
                        Ok(result) => {
                            send_event(event_tx, RunEvent::Observation {
                                tool: name.clone(),
                                preview: preview(&result),
                            });
                            state.push(Turn::ToolResult { tool: name, result });
                        }
                        Err(e) => {
                            tracing::warn!(tool = %name, error = %e, "tool failed");
                            send_event(event_tx, RunEvent::ToolFailure {
                                tool: name.clone(),
                                reason: e.to_string(),
                            });
                            state.push(Turn::ToolFailure {
                                tool: name,
                                error: e.to_string(),
                            });
                            if self.tool_failure == ToolFailurePolicy::Abort {
                                return Err(e.into());
                            }
                        }
                    }
                }
                Step::Delegate { target } => {
                    if !active.can_delegate_to(&target) {
                        return Err(RunError::UnauthorizedDelegation {
                            agent: active.name().to_string(),
                            target,
                        });
                    }
                    let next = self
                        .agents
                        .get(&target)
                        .ok_or_else(|| RunError::UnknownAgent(target.clone()))?;
                    tracing::info!(from = %active.name(), to = %next.name(), "handoff");
                    send_event(event_tx, RunEvent::Handoff {
                        from: active.name().to_string(),
                        to: next.name().to_string(),
                    });
                    send_event(event_tx, RunEvent::Phase { phase: RunPhase::Delegated });
                    state.push(Turn::Delegation {
                        from: active.name().to_string(),
                        to: next.name().to_string(),
                    });
                    active = next;
                }
                Step::FinalAnswer(answer) => {
                    let output = finalize(&active, answer)?;
                    state.push(Turn::FinalAnswer {
                        agent: active.name().to_string(),
                        answer: output.value(),
                    });
                    send_event(event_tx, RunEvent::FinalAnswer { agent: active.name().to_string() });
                    return Ok(RunOutput {
                        agent: active.name().to_string(),
                        output,
                        turns_used: self.max_turns - turns_left,
                    });
                }
            }
        }
    }

    fn tool_descriptors(&self, agent: &Agent) -> Vec<ToolDescriptor> {
        agent
            .tools()
            .iter()
            .filter_map(|name| self.executor.descriptor(name))
            .collect()
    }

    fn delegate_descriptors(&self, agent: &Agent) -> Vec<DelegateDescriptor> {
        agent
            .delegates()
            .iter()
            .map(|name| DelegateDescriptor {
                name: name.clone(),
                description: self
                    .agents
                    .get(name)
                    .and_then(|a| a.handoff_description().map(String::from)),
            })
            .collect()
    }
}

/// 有输出 schema 时校验（文本回答先提取 JSON），否则原样返回
fn finalize(agent: &Agent, answer: Answer) -> Result<FinalOutput, RunError> {
    let Some(schema) = agent.output_schema() else {
        return Ok(FinalOutput::Unvalidated { answer });
    };
    let candidate = match answer {
        Answer::Structured(v) => v,
        Answer::Text(text) => extract_json(&text).unwrap_or(Value::String(text)),
    };
    let value = validate(schema, &candidate)?;
    Ok(FinalOutput::Structured {
        schema: schema.name().to_string(),
        value,
    })
}

fn send_event(tx: Option<&mpsc::UnboundedSender<RunEvent>>, ev: RunEvent) {
    if let Some(t) = tx {
        let _ = t.send(ev);
    }
}

fn preview(value: &Value) -> String {
    let s = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if s.chars().count() > OBSERVATION_PREVIEW_CHARS {
        format!("{}...", s.chars().take(OBSERVATION_PREVIEW_CHARS).collect::<String>())
    } else {
        s
    }
}
