//! 核心层：错误分类、Run 状态、取消监管、统一装配

pub mod builder;
pub mod error;
pub mod state;
pub mod supervisor;

pub use builder::{
    build_fitness_catalog, build_tool_registry, create_llm_from_config, create_runner,
    create_runner_with_llm, FITNESS_COACH, NUTRITION_SPECIALIST, WORKOUT_SPECIALIST,
};
pub use error::{
    ArgViolation, ConfigError, FailureKind, FieldViolation, InferenceError, RunError,
    SchemaConformanceError, ToolError,
};
pub use state::RunPhase;
pub use supervisor::RunSupervisor;
