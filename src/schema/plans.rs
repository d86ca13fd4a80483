//! 内置输出结构：训练计划 WorkoutPlan 与饮食计划 MealPlan
//!
//! 每个结构同时提供校验用的 OutputSchema 与调用方使用的强类型 struct。

use serde::{Deserialize, Serialize};

use crate::schema::{FieldSpec, FieldType, OutputSchema};

pub const DIFFICULTY_LEVELS: [&str; 3] = ["Beginner", "Intermediate", "Advanced"];

/// 训练计划
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutPlan {
    pub focus_area: String,
    pub difficulty: String,
    pub exercises: Vec<String>,
    pub notes: String,
}

impl WorkoutPlan {
    pub fn schema() -> OutputSchema {
        OutputSchema::new(
            "WorkoutPlan",
            vec![
                FieldSpec::new(
                    "focus_area",
                    FieldType::String,
                    "Primary focus of the workout (e.g., 'upper body', 'cardio')",
                ),
                FieldSpec::new(
                    "difficulty",
                    FieldType::OneOf(DIFFICULTY_LEVELS.iter().map(|s| s.to_string()).collect()),
                    "Difficulty level (Beginner, Intermediate, Advanced)",
                ),
                FieldSpec::new("exercises", FieldType::StringList, "List of recommended exercises"),
                FieldSpec::new("notes", FieldType::String, "Additional notes or form tips"),
            ],
        )
    }
}

/// 饮食计划
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealPlan {
    pub daily_calories: i64,
    pub protein_grams: i64,
    pub carbs_grams: i64,
    pub fat_grams: i64,
    pub meal_suggestions: Vec<String>,
    pub notes: String,
}

impl MealPlan {
    pub fn schema() -> OutputSchema {
        OutputSchema::new(
            "MealPlan",
            vec![
                FieldSpec::new("daily_calories", FieldType::Integer, "Recommended daily calorie intake"),
                FieldSpec::new("protein_grams", FieldType::Integer, "Daily protein target in grams"),
                FieldSpec::new("carbs_grams", FieldType::Integer, "Daily carbohydrate target in grams"),
                FieldSpec::new("fat_grams", FieldType::Integer, "Daily fat target in grams"),
                FieldSpec::new("meal_suggestions", FieldType::StringList, "Simple meal ideas"),
                FieldSpec::new("notes", FieldType::String, "Dietary advice and tips"),
            ],
        )
    }
}
