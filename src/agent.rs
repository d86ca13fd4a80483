//! Agent 定义与目录
//!
//! Agent 是不可变的配置：名称、指令、可用工具、可转交对象、可选输出 schema。
//! 构建时即校验装配关系（工具必须在目录自己的注册表中、转交目标必须已在同一目录中），
//! Agent 只能经 AgentCatalog::add 进入目录，运行期不会看到非法配置。
//! 行为全部在 runner 中，Agent 本身只暴露只读访问器。

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::core::ConfigError;
use crate::schema::OutputSchema;
use crate::tools::{ToolExecutor, ToolRegistry};

#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    name: String,
    instructions: String,
    handoff_description: Option<String>,
    tools: BTreeSet<String>,
    delegates: BTreeSet<String>,
    output_schema: Option<OutputSchema>,
}

impl Agent {
    pub fn builder(name: impl Into<String>) -> AgentBuilder {
        AgentBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    /// 其他 Agent 决定是否转交时看到的简介
    pub fn handoff_description(&self) -> Option<&str> {
        self.handoff_description.as_deref()
    }

    pub fn tools(&self) -> &BTreeSet<String> {
        &self.tools
    }

    pub fn delegates(&self) -> &BTreeSet<String> {
        &self.delegates
    }

    pub fn output_schema(&self) -> Option<&OutputSchema> {
        self.output_schema.as_ref()
    }

    pub fn can_use_tool(&self, tool: &str) -> bool {
        self.tools.contains(tool)
    }

    pub fn can_delegate_to(&self, agent: &str) -> bool {
        self.delegates.contains(agent)
    }
}

/// Agent 构建器：由 AgentCatalog::add 对照目录的注册表与已有 Agent 校验
pub struct AgentBuilder {
    name: String,
    instructions: String,
    handoff_description: Option<String>,
    tools: BTreeSet<String>,
    delegates: BTreeSet<String>,
    output_schema: Option<OutputSchema>,
}

impl AgentBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instructions: String::new(),
            handoff_description: None,
            tools: BTreeSet::new(),
            delegates: BTreeSet::new(),
            output_schema: None,
        }
    }

    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    pub fn handoff_description(mut self, desc: impl Into<String>) -> Self {
        self.handoff_description = Some(desc.into());
        self
    }

    pub fn tool(mut self, name: impl Into<String>) -> Self {
        self.tools.insert(name.into());
        self
    }

    pub fn tools<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn delegate(mut self, agent: impl Into<String>) -> Self {
        self.delegates.insert(agent.into());
        self
    }

    pub fn output_schema(mut self, schema: OutputSchema) -> Self {
        self.output_schema = Some(schema);
        self
    }

    /// 构建 Agent：工具必须已在目录的注册表中，转交目标必须是目录中已构建的 Agent
    fn build(self, catalog: &AgentCatalog) -> Result<Agent, ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyAgentName);
        }
        if catalog.agents.contains_key(&self.name) {
            return Err(ConfigError::DuplicateAgent(self.name));
        }
        if let Some(tool) = self.tools.iter().find(|t| !catalog.registry.contains(t)) {
            return Err(ConfigError::UnregisteredTool {
                agent: self.name.clone(),
                tool: tool.clone(),
            });
        }
        if let Some(target) = self.delegates.iter().find(|d| catalog.get(d).is_none()) {
            return Err(ConfigError::UnknownDelegate {
                agent: self.name.clone(),
                target: target.clone(),
            });
        }
        Ok(Agent {
            name: self.name,
            instructions: self.instructions,
            handoff_description: self.handoff_description,
            tools: self.tools,
            delegates: self.delegates,
            output_schema: self.output_schema,
        })
    }
}

/// Agent 目录：持有工具注册表，按名称保存已构建的 Agent（只增不改），Run 之间只读共享
///
/// 目录中每个 Agent 的工具都在 `registry` 中、转交目标都在本目录中；
/// Runner 从同一个注册表构造执行器，两者不会错配。
pub struct AgentCatalog {
    registry: Arc<ToolRegistry>,
    agents: HashMap<String, Arc<Agent>>,
    order: Vec<String>,
}

impl AgentCatalog {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            agents: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// 对照本目录的注册表与已有 Agent 构建并加入
    pub fn add(&mut self, builder: AgentBuilder) -> Result<Arc<Agent>, ConfigError> {
        let agent = Arc::new(builder.build(self)?);
        self.order.push(agent.name().to_string());
        self.agents.insert(agent.name().to_string(), agent.clone());
        Ok(agent)
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// 基于本目录注册表的工具执行器
    pub fn executor(&self) -> ToolExecutor {
        ToolExecutor::new(self.registry.clone())
    }

    pub fn get(&self, name: &str) -> Option<Arc<Agent>> {
        self.agents.get(name).cloned()
    }

    /// 按构建顺序返回名称
    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
