//! 热量与宏量营养素计算工具
//!
//! Mifflin–St Jeor 公式计算基础代谢，乘固定活动系数 1.55 得到 TDEE，再按目标调整热量并拆分宏量营养素。
//! 取整规则为就近取整、恰好 .5 时取偶数。

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tools::{ParamSchema, ParamSpec, Tool};

/// 中等活动水平系数
pub const ACTIVITY_MULTIPLIER: f64 = 1.55;
const WEIGHT_LOSS_DEFICIT: f64 = 500.0;
const MUSCLE_GAIN_SURPLUS: f64 = 300.0;
const KCAL_PER_GRAM_PROTEIN: f64 = 4.0;
const KCAL_PER_GRAM_CARBS: f64 = 4.0;
const KCAL_PER_GRAM_FAT: f64 = 9.0;

/// 目标（小写匹配；未识别的一律按 maintenance 处理）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Goal {
    WeightLoss,
    MuscleGain,
    Maintenance,
}

impl Goal {
    pub fn parse(goal: &str) -> Self {
        match goal.to_lowercase().as_str() {
            "weight loss" => Goal::WeightLoss,
            "muscle gain" => Goal::MuscleGain,
            _ => Goal::Maintenance,
        }
    }

    fn calorie_adjustment(self) -> f64 {
        match self {
            Goal::WeightLoss => -WEIGHT_LOSS_DEFICIT,
            Goal::MuscleGain => MUSCLE_GAIN_SURPLUS,
            Goal::Maintenance => 0.0,
        }
    }

    /// (protein, fat, carbs) 占总热量的比例
    fn macro_split(self) -> (f64, f64, f64) {
        match self {
            Goal::WeightLoss => (0.40, 0.30, 0.30),
            Goal::MuscleGain => (0.30, 0.25, 0.45),
            Goal::Maintenance => (0.30, 0.30, 0.40),
        }
    }
}

/// calculate_calories 的输入
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyStats {
    pub goal: String,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub age: u32,
    pub gender: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Macros {
    pub protein: i64,
    pub fat: i64,
    pub carbs: i64,
}

/// calculate_calories 的输出（即工具返回的 JSON 结构）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaloriePlan {
    pub goal: String,
    pub daily_calories: i64,
    pub macros: Macros,
}

/// 基础代谢率（Mifflin–St Jeor）；male / m 为男性，其余按女性计算
pub fn basal_metabolic_rate(weight_kg: f64, height_cm: f64, age: u32, gender: &str) -> f64 {
    let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * age as f64;
    match gender.to_lowercase().as_str() {
        "male" | "m" => base + 5.0,
        _ => base - 161.0,
    }
}

/// 按目标调整后的每日目标热量（未取整）
pub fn calorie_target(stats: &BodyStats) -> f64 {
    let bmr = basal_metabolic_rate(stats.weight_kg, stats.height_cm, stats.age, &stats.gender);
    bmr * ACTIVITY_MULTIPLIER + Goal::parse(&stats.goal).calorie_adjustment()
}

pub fn calculate_calories(stats: &BodyStats) -> CaloriePlan {
    let goal = Goal::parse(&stats.goal);
    let target = calorie_target(stats);
    let (protein_pct, fat_pct, carb_pct) = goal.macro_split();
    let grams = |pct: f64, kcal_per_gram: f64| (target * pct / kcal_per_gram).round_ties_even() as i64;

    CaloriePlan {
        goal: stats.goal.clone(),
        daily_calories: target.round_ties_even() as i64,
        macros: Macros {
            protein: grams(protein_pct, KCAL_PER_GRAM_PROTEIN),
            fat: grams(fat_pct, KCAL_PER_GRAM_FAT),
            carbs: grams(carb_pct, KCAL_PER_GRAM_CARBS),
        },
    }
}

/// calculate_calories 工具
#[derive(Debug, Default)]
pub struct CalorieCalculatorTool;

impl CalorieCalculatorTool {
    pub const NAME: &'static str = "calculate_calories";
}

impl Tool for CalorieCalculatorTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Calculate daily calorie needs and macronutrient breakdown based on user stats and goals"
    }

    fn parameters(&self) -> ParamSchema {
        ParamSchema::new(vec![
            ParamSpec::string("goal", "Fitness goal (weight loss, muscle gain, maintenance)"),
            ParamSpec::number("weight_kg", "Weight in kilograms", 1.0, 500.0),
            ParamSpec::number("height_cm", "Height in centimeters", 30.0, 300.0),
            ParamSpec::integer("age", "Age in years", 1, 120),
            ParamSpec::string("gender", "Gender (male, female)"),
        ])
    }

    fn call(&self, args: &Value) -> Result<Value, String> {
        let stats: BodyStats = serde_json::from_value(normalize_age(args))
            .map_err(|e| format!("invalid body stats: {e}"))?;
        tracing::debug!(?stats, "calculate_calories");
        let plan = calculate_calories(&stats);
        serde_json::to_value(plan).map_err(|e| e.to_string())
    }
}

/// 参数校验允许 30.0 这样的整值浮点作为 age，反序列化为 u32 前先转成整数
fn normalize_age(args: &Value) -> Value {
    let mut args = args.clone();
    if let Some(age) = args.get("age").and_then(|v| v.as_f64()) {
        if age.fract() == 0.0 {
            args["age"] = Value::from(age as u32);
        }
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn male_80kg(goal: &str) -> BodyStats {
        BodyStats {
            goal: goal.to_string(),
            weight_kg: 80.0,
            height_cm: 175.0,
            age: 30,
            gender: "male".to_string(),
        }
    }

    #[test]
    fn test_bmr_and_target() {
        let bmr = basal_metabolic_rate(80.0, 175.0, 30, "male");
        assert!((bmr - 1748.75).abs() < 1e-9);
        assert!((bmr * ACTIVITY_MULTIPLIER - 2710.5625).abs() < 1e-9);
        assert!((calorie_target(&male_80kg("weight loss")) - 2210.5625).abs() < 1e-9);
    }

    #[test]
    fn test_weight_loss_plan() {
        let plan = calculate_calories(&male_80kg("weight loss"));
        assert_eq!(plan.daily_calories, 2211);
        // 884.225 kcal / 4, 663.16875 kcal / 9, 663.16875 kcal / 4
        assert_eq!(plan.macros, Macros { protein: 221, fat: 74, carbs: 166 });
    }

    #[test]
    fn test_muscle_gain_and_maintenance() {
        let gain = calculate_calories(&male_80kg("Muscle Gain"));
        assert_eq!(gain.daily_calories, 3011);
        assert_eq!(gain.macros, Macros { protein: 226, fat: 84, carbs: 339 });

        let keep = calculate_calories(&male_80kg("general fitness"));
        assert_eq!(keep.daily_calories, 2711);
        assert_eq!(keep.macros, Macros { protein: 203, fat: 90, carbs: 271 });
    }

    #[test]
    fn test_female_offset() {
        let f = basal_metabolic_rate(60.0, 165.0, 25, "Female");
        assert!((f - (600.0 + 1031.25 - 125.0 - 161.0)).abs() < 1e-9);
        assert_eq!(basal_metabolic_rate(60.0, 165.0, 25, "M"), f + 166.0);
    }

    #[test]
    fn test_tool_output_shape() {
        let out = CalorieCalculatorTool
            .call(&json!({
                "goal": "weight loss",
                "weight_kg": 80,
                "height_cm": 175,
                "age": 30.0,
                "gender": "male"
            }))
            .unwrap();
        assert_eq!(
            out,
            json!({
                "goal": "weight loss",
                "daily_calories": 2211,
                "macros": {"protein": 221, "fat": 74, "carbs": 166}
            })
        );
    }
}
