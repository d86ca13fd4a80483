//! 动作查询工具
//!
//! 肌群 -> 推荐动作列表的只读表在启动时构建一次，通过 Arc 共享给工具实例，调用期间从不修改。

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::tools::{ParamSchema, ParamSpec, Tool};

/// 肌群动作表（键为小写肌群名，值为有序动作描述）
#[derive(Debug, Clone)]
pub struct ExerciseCatalog {
    groups: BTreeMap<String, Vec<String>>,
}

impl ExerciseCatalog {
    pub fn new(groups: BTreeMap<String, Vec<String>>) -> Self {
        let groups = groups
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();
        Self { groups }
    }

    /// 内置的五个肌群（chest / back / legs / arms / core）
    pub fn standard() -> Self {
        let table: [(&str, [&str; 4]); 5] = [
            (
                "chest",
                [
                    "Push-ups: 3 sets of 10-15 reps",
                    "Bench Press: 3 sets of 8-12 reps",
                    "Chest Flyes: 3 sets of 12-15 reps",
                    "Incline Push-ups: 3 sets of 10-15 reps",
                ],
            ),
            (
                "back",
                [
                    "Pull-ups: 3 sets of 6-10 reps",
                    "Bent-over Rows: 3 sets of 8-12 reps",
                    "Lat Pulldowns: 3 sets of 10-12 reps",
                    "Superman Holds: 3 sets of 30 seconds",
                ],
            ),
            (
                "legs",
                [
                    "Squats: 3 sets of 10-15 reps",
                    "Lunges: 3 sets of 10 per leg",
                    "Calf Raises: 3 sets of 15-20 reps",
                    "Glute Bridges: 3 sets of 15 reps",
                ],
            ),
            (
                "arms",
                [
                    "Bicep Curls: 3 sets of 10-12 reps",
                    "Tricep Dips: 3 sets of 10-15 reps",
                    "Hammer Curls: 3 sets of 10-12 reps",
                    "Overhead Tricep Extensions: 3 sets of 10-12 reps",
                ],
            ),
            (
                "core",
                [
                    "Planks: 3 sets of 30-60 seconds",
                    "Crunches: 3 sets of 15-20 reps",
                    "Russian Twists: 3 sets of 20 total reps",
                    "Mountain Climbers: 3 sets of 20 total reps",
                ],
            ),
        ];
        let groups = table
            .into_iter()
            .map(|(group, exercises)| {
                (
                    group.to_string(),
                    exercises.iter().map(|e| e.to_string()).collect(),
                )
            })
            .collect();
        Self { groups }
    }

    /// 按肌群查询（大小写不敏感）
    pub fn exercises(&self, muscle_group: &str) -> Option<&[String]> {
        self.groups
            .get(&muscle_group.to_lowercase())
            .map(|v| v.as_slice())
    }

    pub fn muscle_groups(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(|k| k.as_str())
    }

    /// 工具返回值：命中时为结构化对象，未命中时为「不可用」提示字符串
    pub fn lookup(&self, muscle_group: &str) -> Value {
        let key = muscle_group.to_lowercase();
        match self.groups.get(&key) {
            Some(exercises) => json!({
                "muscle_group": key,
                "exercises": exercises,
                "recommendation": format!(
                    "For {key} training, complete all exercises with 60-90 seconds rest between sets."
                ),
            }),
            None => Value::String(not_available(&key)),
        }
    }
}

/// 未知肌群的提示文本
pub fn not_available(muscle_group: &str) -> String {
    format!("Exercise information for {muscle_group} is not available.")
}

/// get_exercise_info 工具
pub struct ExerciseLookupTool {
    catalog: Arc<ExerciseCatalog>,
}

impl ExerciseLookupTool {
    pub const NAME: &'static str = "get_exercise_info";

    pub fn new(catalog: Arc<ExerciseCatalog>) -> Self {
        Self { catalog }
    }
}

impl Tool for ExerciseLookupTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Get a list of exercises for a specific muscle group"
    }

    fn parameters(&self) -> ParamSchema {
        ParamSchema::new(vec![ParamSpec::string(
            "muscle_group",
            "Target muscle group (e.g., chest, legs)",
        )])
    }

    fn call(&self, args: &Value) -> Result<Value, String> {
        let group = args
            .get("muscle_group")
            .and_then(|v| v.as_str())
            .ok_or_else(|| "muscle_group must be a string".to_string())?;
        let result = self.catalog.lookup(group);
        if result.is_string() {
            tracing::warn!(muscle_group = %group, "Muscle group not found");
        }
        Ok(result)
    }
}
