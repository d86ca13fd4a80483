//! HTTP 接入：三个健身端点 + 健康检查
//!
//! 每个请求独立跑一次 Runner；任何 Run 失败都映射为 500 `{"detail", "kind"}`。

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::core::{FailureKind, RunError, FITNESS_COACH, NUTRITION_SPECIALIST, WORKOUT_SPECIALIST};
use crate::runner::Runner;

#[derive(Clone)]
pub struct AppState {
    pub runner: Arc<Runner>,
}

impl AppState {
    pub fn new(runner: Runner) -> Self {
        Self {
            runner: Arc::new(runner),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GeneralQueryRequest {
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct WorkoutQueryRequest {
    pub muscle_group: String,
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct NutritionQueryRequest {
    pub goal: String,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub age: u32,
    pub gender: String,
}

impl WorkoutQueryRequest {
    pub fn to_query(&self) -> String {
        format!(
            "Create a workout plan for {} at {} level",
            self.muscle_group, self.level
        )
    }
}

impl NutritionQueryRequest {
    pub fn to_query(&self) -> String {
        format!(
            "Create a meal plan for {} with weight {}kg, height {}cm, age {}, gender {}",
            self.goal,
            decimal(self.weight_kg),
            decimal(self.height_cm),
            self.age,
            self.gender
        )
    }
}

/// 浮点数总带小数位（80 -> "80.0"）
fn decimal(v: f64) -> String {
    if v.fract() == 0.0 && v.is_finite() {
        format!("{v:.1}")
    } else {
        v.to_string()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
    kind: FailureKind,
}

/// Run 失败统一映射为 500
pub struct ApiError(RunError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            detail: self.0.to_string(),
            kind: self.0.kind(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/fitness/general", post(general_query))
        .route("/fitness/workout", post(workout_query))
        .route("/fitness/nutrition", post(nutrition_query))
        .route("/health", get(|| async { Json(json!({"status": "ok"})) }))
        .with_state(state)
}

async fn run_agent(state: &AppState, agent: &str, query: &str) -> Result<Value, ApiError> {
    match state.runner.run(agent, query).await {
        Ok(out) => Ok(out.output.value()),
        Err(e) => {
            tracing::error!(agent, error = %e, "Error processing query");
            Err(ApiError(e))
        }
    }
}

async fn general_query(
    State(state): State<AppState>,
    Json(req): Json<GeneralQueryRequest>,
) -> Result<Json<Value>, ApiError> {
    tracing::info!("Processing general fitness query: {}", req.query);
    let response = run_agent(&state, FITNESS_COACH, &req.query).await?;
    Ok(Json(json!({ "response": response })))
}

async fn workout_query(
    State(state): State<AppState>,
    Json(req): Json<WorkoutQueryRequest>,
) -> Result<Json<Value>, ApiError> {
    let query = req.to_query();
    tracing::info!("Processing workout query: {}", query);
    Ok(Json(run_agent(&state, WORKOUT_SPECIALIST, &query).await?))
}

async fn nutrition_query(
    State(state): State<AppState>,
    Json(req): Json<NutritionQueryRequest>,
) -> Result<Json<Value>, ApiError> {
    let query = req.to_query();
    tracing::info!("Processing nutrition query: {}", query);
    Ok(Json(run_agent(&state, NUTRITION_SPECIALIST, &query).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::core::create_runner_with_llm;
    use crate::llm::{LlmClient, Message};
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tower::ServiceExt;

    /// 按顺序返回预设回复的 LLM
    struct ScriptedLlm(Mutex<VecDeque<String>>);

    impl ScriptedLlm {
        fn new(replies: &[&str]) -> Arc<Self> {
            Arc::new(Self(Mutex::new(replies.iter().map(|s| s.to_string()).collect())))
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn complete(&self, _messages: &[Message]) -> Result<String, String> {
            self.0
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| "no more replies".to_string())
        }
    }

    fn app(replies: &[&str]) -> Router {
        let runner = create_runner_with_llm(&AppConfig::default(), ScriptedLlm::new(replies)).unwrap();
        router(AppState::new(runner))
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let resp = app
            .oneshot(
                Request::post(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_query_strings() {
        let w = WorkoutQueryRequest {
            muscle_group: "legs".into(),
            level: "Beginner".into(),
        };
        assert_eq!(w.to_query(), "Create a workout plan for legs at Beginner level");

        let n = NutritionQueryRequest {
            goal: "weight loss".into(),
            weight_kg: 80.0,
            height_cm: 175.5,
            age: 30,
            gender: "male".into(),
        };
        assert_eq!(
            n.to_query(),
            "Create a meal plan for weight loss with weight 80.0kg, height 175.5cm, age 30, gender male"
        );
    }

    #[tokio::test]
    async fn test_general_query_wraps_response() {
        let (status, body) = post_json(
            app(&[r#"{"final": "Sleep 8 hours and stay hydrated."}"#]),
            "/fitness/general",
            json!({"query": "How do I recover better?"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"response": "Sleep 8 hours and stay hydrated."}));
    }

    #[tokio::test]
    async fn test_nutrition_query_returns_meal_plan() {
        let plan = json!({
            "final": {
                "daily_calories": 2211,
                "protein_grams": 221,
                "carbs_grams": 166,
                "fat_grams": 74,
                "meal_suggestions": ["Oatmeal with berries", "Grilled chicken salad"],
                "notes": "Eat plenty of vegetables."
            }
        })
        .to_string();
        let (status, body) = post_json(
            app(&[
                r#"{"tool": "calculate_calories", "args": {"goal": "weight loss", "weight_kg": 80, "height_cm": 175, "age": 30, "gender": "male"}}"#,
                plan.as_str(),
            ]),
            "/fitness/nutrition",
            json!({"goal": "weight loss", "weight_kg": 80, "height_cm": 175, "age": 30, "gender": "male"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["daily_calories"], 2211);
        assert_eq!(body["protein_grams"], 221);
    }

    #[tokio::test]
    async fn test_run_failure_maps_to_500() {
        let (status, body) = post_json(
            app(&["Here is a plan: do squats."]),
            "/fitness/workout",
            json!({"muscle_group": "legs", "level": "Beginner"}),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["kind"], "schema_conformance");
        assert!(body["detail"].as_str().unwrap().contains("WorkoutPlan"));
    }

    #[tokio::test]
    async fn test_health() {
        let resp = app(&[])
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
