pub mod executor;
pub mod exercise;
pub mod nutrition;
pub mod params;
pub mod registry;
pub mod schema;

pub use executor::ToolExecutor;
pub use exercise::{ExerciseCatalog, ExerciseLookupTool};
pub use nutrition::{calculate_calories, BodyStats, CalorieCalculatorTool, CaloriePlan, Macros};
pub use params::{ParamKind, ParamSchema, ParamSpec};
pub use registry::{Tool, ToolDescriptor, ToolRegistry};
pub use schema::step_format_schema_json;
