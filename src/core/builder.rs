//! 统一的装配逻辑：工具注册表、Agent 目录、LLM 客户端与 Runner
//!
//! CLI 与 HTTP 共享同一套装配，避免两个入口的工具或 Agent 配置出现差异。

use std::sync::Arc;

use anyhow::Context;

use crate::agent::{Agent, AgentCatalog};
use crate::config::AppConfig;
use crate::core::ConfigError;
use crate::llm::{LlmClient, MockLlmClient, OpenAiClient};
use crate::runner::{Planner, Runner};
use crate::schema::{MealPlan, WorkoutPlan};
use crate::tools::{CalorieCalculatorTool, ExerciseCatalog, ExerciseLookupTool, ToolRegistry};

pub const FITNESS_COACH: &str = "Fitness Coach";
pub const WORKOUT_SPECIALIST: &str = "Workout Specialist";
pub const NUTRITION_SPECIALIST: &str = "Nutrition Specialist";

const WORKOUT_INSTRUCTIONS: &str = "\
You are a workout specialist who creates effective exercise routines.
Use the get_exercise_info tool to find exercises for specific muscle groups.
Create a WorkoutPlan that matches the user's fitness level and goals.
For weight loss, include a mix of cardio and strength exercises.
Always include form tips in the notes to prevent injury.
Ensure the output strictly follows the WorkoutPlan schema.";

const NUTRITION_INSTRUCTIONS: &str = "\
You are a nutrition specialist who helps users with meal planning and nutrition advice.
Use the calculate_calories tool to determine appropriate calorie and macronutrient targets.
Provide a MealPlan with meal suggestions that support the user's fitness goals.
Focus on practical, sustainable nutrition advice.
Ensure the output strictly follows the MealPlan schema.";

const COACH_INSTRUCTIONS: &str = "\
You are a fitness coach who helps users achieve their health and fitness goals.
For queries about workouts or exercises, immediately hand off to the Workout Specialist.
For queries about nutrition, diet, or meal plans, immediately hand off to the Nutrition Specialist.
For general fitness questions, provide brief, practical advice without using tools or handoffs.
Do not attempt to answer specialized workout or nutrition questions yourself.";

/// 注册内置工具；动作表只构建一次，由 Arc 共享
pub fn build_tool_registry() -> anyhow::Result<ToolRegistry> {
    let catalog = Arc::new(ExerciseCatalog::standard());
    let mut tools = ToolRegistry::new();
    tools
        .register(ExerciseLookupTool::new(catalog))
        .context("register exercise lookup tool")?;
    tools
        .register(CalorieCalculatorTool)
        .context("register calorie calculator tool")?;
    Ok(tools)
}

/// 健身 Agent 目录：先构建两个专家，再构建可转交给它们的教练
pub fn build_fitness_catalog(registry: Arc<ToolRegistry>) -> Result<AgentCatalog, ConfigError> {
    let mut catalog = AgentCatalog::new(registry);
    catalog.add(
        Agent::builder(WORKOUT_SPECIALIST)
            .handoff_description("Specialist agent for creating workout plans")
            .instructions(WORKOUT_INSTRUCTIONS)
            .tool(ExerciseLookupTool::NAME)
            .output_schema(WorkoutPlan::schema()),
    )?;
    catalog.add(
        Agent::builder(NUTRITION_SPECIALIST)
            .handoff_description("Specialist agent for nutrition advice and meal planning")
            .instructions(NUTRITION_INSTRUCTIONS)
            .tool(CalorieCalculatorTool::NAME)
            .output_schema(MealPlan::schema()),
    )?;
    catalog.add(
        Agent::builder(FITNESS_COACH)
            .instructions(COACH_INSTRUCTIONS)
            .tools([ExerciseLookupTool::NAME, CalorieCalculatorTool::NAME])
            .delegate(WORKOUT_SPECIALIST)
            .delegate(NUTRITION_SPECIALIST),
    )?;
    Ok(catalog)
}

/// 按配置选择 LLM：provider 为 openai 且有 OPENAI_API_KEY 时走 OpenAI 兼容端点，否则 Mock
pub fn create_llm_from_config(cfg: &AppConfig) -> Arc<dyn LlmClient> {
    let provider = cfg.llm.provider.to_lowercase();
    let api_key = std::env::var("OPENAI_API_KEY").ok();

    match (provider.as_str(), api_key) {
        ("openai", Some(key)) => {
            tracing::info!("Using OpenAI LLM ({})", cfg.llm.model);
            Arc::new(OpenAiClient::new(
                cfg.llm.base_url.as_deref(),
                &cfg.llm.model,
                Some(&key),
            ))
        }
        ("mock", _) => Arc::new(MockLlmClient),
        _ => {
            tracing::warn!("No API key set or provider unknown, using Mock LLM");
            Arc::new(MockLlmClient)
        }
    }
}

/// 用给定 LLM 装配 Runner（测试可注入脚本化的 LlmClient）
pub fn create_runner_with_llm(cfg: &AppConfig, llm: Arc<dyn LlmClient>) -> anyhow::Result<Runner> {
    let registry = Arc::new(build_tool_registry()?);
    let catalog = build_fitness_catalog(registry.clone()).context("build fitness agent catalog")?;
    tracing::info!(agents = ?catalog.names(), tools = ?registry.tool_names(), "catalog ready");

    Ok(Runner::new(Arc::new(catalog), Arc::new(Planner::new(llm)))
    .with_max_turns(cfg.runner.max_turns)
    .with_tool_failure(cfg.runner.tool_failure))
}

pub fn create_runner(cfg: &AppConfig) -> anyhow::Result<Runner> {
    create_runner_with_llm(cfg, create_llm_from_config(cfg))
}
