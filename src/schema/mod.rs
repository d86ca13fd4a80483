//! 输出 schema：字段声明、结构化校验与内置计划结构

pub mod plans;
pub mod validator;

pub use plans::{MealPlan, WorkoutPlan};
pub use validator::{
    extract_fenced_json, extract_json, scan_braced_json, validate, FieldSpec, FieldType, OutputSchema,
};
