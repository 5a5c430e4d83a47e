//! API routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::analyzer::CodeAnalysis;
use crate::catalog::{Language, Problem, ProblemSummary};
use crate::conversation::Message;
use crate::cover_letter::{CoverLetter, CoverLetterError, CoverLetterRequest};
use crate::session::{RunOutcome, SessionError, SessionSnapshot};
use crate::AppState;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    provider: String,
    active_interviews: usize,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub code: String,
    pub problem_id: String,
    #[serde(default)]
    pub language: Language,
}

#[derive(Debug, Deserialize)]
pub struct CreateInterviewRequest {
    pub problem_id: String,
    #[serde(default)]
    pub language: Option<Language>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCodeRequest {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub language: Option<Language>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

/// Interviewer turn; `message` is null when nothing was posted
#[derive(Debug, Serialize)]
pub struct TurnResponse {
    pub message: Option<Message>,
}

#[derive(Debug)]
pub enum ApiError {
    Session(SessionError),
    CoverLetter(CoverLetterError),
    ProblemNotFound(String),
    BadRequest(String),
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        ApiError::Session(e)
    }
}

impl From<CoverLetterError> for ApiError {
    fn from(e: CoverLetterError) -> Self {
        ApiError::CoverLetter(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Session(e) => {
                let status = match e {
                    SessionError::NotFound(_) | SessionError::ProblemNotFound(_) => {
                        StatusCode::NOT_FOUND
                    }
                    SessionError::NoTestCases(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    SessionError::Busy => StatusCode::CONFLICT,
                    SessionError::ReservedMessage(_) => StatusCode::BAD_REQUEST,
                };
                (status, e.to_string())
            }
            ApiError::CoverLetter(e) => {
                let status = match e {
                    CoverLetterError::MissingJobDescription | CoverLetterError::MissingResume => {
                        StatusCode::UNPROCESSABLE_ENTITY
                    }
                    CoverLetterError::Provider(_) => StatusCode::BAD_GATEWAY,
                };
                (status, e.to_string())
            }
            ApiError::ProblemNotFound(id) => {
                (StatusCode::NOT_FOUND, format!("Problem not found: {}", id))
            }
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
        };

        if status.is_server_error() {
            tracing::error!(%status, "{}", message);
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        provider: state.provider_name.clone(),
        active_interviews: state.service.len().await,
    })
}

async fn list_problems(State(state): State<AppState>) -> Json<Vec<ProblemSummary>> {
    Json(state.service.catalog().summaries())
}

async fn get_problem(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Problem>, ApiError> {
    state
        .service
        .catalog()
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or(ApiError::ProblemNotFound(id))
}

async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Json<CodeAnalysis> {
    Json(
        state
            .service
            .analyzer()
            .analyze(&request.code, &request.problem_id, &request.language),
    )
}

async fn create_interview(
    State(state): State<AppState>,
    Json(request): Json<CreateInterviewRequest>,
) -> Result<(StatusCode, Json<SessionSnapshot>), ApiError> {
    let snapshot = state
        .service
        .create(&request.problem_id, request.language)
        .await?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

async fn get_interview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    Ok(Json(state.service.snapshot(id).await?))
}

async fn delete_interview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.service.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn update_code(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateCodeRequest>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    Ok(Json(
        state
            .service
            .update_code(id, request.code, request.language)
            .await?,
    ))
}

async fn start_interview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TurnResponse>, ApiError> {
    let message = state.service.start(id).await?;
    Ok(Json(TurnResponse { message }))
}

async fn restart_interview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    Ok(Json(state.service.restart(id).await?))
}

async fn run_code(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RunOutcome>, ApiError> {
    Ok(Json(state.service.run_code(id).await?))
}

async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<TurnResponse>, ApiError> {
    if request.content.trim().is_empty() {
        return Err(ApiError::BadRequest("Message content is empty".to_string()));
    }

    let message = state.service.send_message(id, &request.content).await?;
    Ok(Json(TurnResponse { message }))
}

async fn complete_interview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    Ok(Json(state.service.complete(id).await?))
}

async fn cover_letter(
    State(state): State<AppState>,
    Json(request): Json<CoverLetterRequest>,
) -> Result<Json<CoverLetter>, ApiError> {
    Ok(Json(state.cover_letters.generate(&request).await?))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/v1/problems", get(list_problems))
        .route("/v1/problems/:id", get(get_problem))
        .route("/v1/analyze", post(analyze))
        .route("/v1/interviews", post(create_interview))
        .route(
            "/v1/interviews/:id",
            get(get_interview).delete(delete_interview),
        )
        .route("/v1/interviews/:id/code", put(update_code))
        .route("/v1/interviews/:id/start", post(start_interview))
        .route("/v1/interviews/:id/restart", post(restart_interview))
        .route("/v1/interviews/:id/run", post(run_code))
        .route("/v1/interviews/:id/messages", post(send_message))
        .route("/v1/interviews/:id/complete", post(complete_interview))
        .route("/v1/cover-letter", post(cover_letter))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::analyzer::CodeAnalyzer;
    use crate::catalog::ProblemCatalog;
    use crate::config::service::LlmConfig;
    use crate::config::PromptSet;
    use crate::cover_letter::CoverLetterWriter;
    use crate::execution::{ExecutionPolicy, MockExecutionEngine};
    use crate::interviewer::Interviewer;
    use crate::providers::testing::StubProvider;
    use crate::session::{InterviewService, SessionPolicy};

    fn app(provider: Arc<StubProvider>) -> Router {
        let llm = LlmConfig::default();
        let engine = MockExecutionEngine::new(ExecutionPolicy {
            seed: Some(11),
            ..ExecutionPolicy::default()
        });
        let interviewer = Interviewer::new(provider.clone(), PromptSet::default(), &llm);
        let service = InterviewService::new(
            Arc::new(ProblemCatalog::builtin()),
            Arc::new(CodeAnalyzer::default()),
            Arc::new(engine),
            Arc::new(interviewer),
            SessionPolicy::default(),
        );

        let state = AppState {
            service: Arc::new(service),
            cover_letters: Arc::new(CoverLetterWriter::new(provider, &llm)),
            provider_name: "stub".into(),
        };

        router().with_state(state)
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(json) => Body::from(json.to_string()),
                None => Body::empty(),
            })
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn test_health() {
        let app = app(Arc::new(StubProvider::new(vec![])));
        let (status, body) = call(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["provider"], "stub");
        assert_eq!(body["active_interviews"], 0);
    }

    #[tokio::test]
    async fn test_problem_lookup() {
        let app = app(Arc::new(StubProvider::new(vec![])));

        let (status, body) = call(&app, "GET", "/v1/problems", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 4);

        let (status, body) = call(&app, "GET", "/v1/problems/two-sum", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], "two-sum");
        assert_eq!(body["test_cases"].as_array().unwrap().len(), 2);

        let (status, body) = call(&app, "GET", "/v1/problems/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Problem not found: nope");
    }

    #[tokio::test]
    async fn test_analyze_endpoint() {
        let app = app(Arc::new(StubProvider::new(vec![])));
        let code = "class Solution {\n    public int[] twoSum(int[] nums, int target) {\n        Map<Integer, Integer> seen = new HashMap<>();\n        return seen.isEmpty() ? null : null;\n    }\n}";

        let (status, body) = call(
            &app,
            "POST",
            "/v1/analyze",
            Some(json!({ "code": code, "problem_id": "two-sum", "language": "java" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["uses_hash_map"], true);
        assert_eq!(body["uses_optimal_approach"], true);
        assert_eq!(body["time_complexity"], "O(n)");
    }

    #[tokio::test(start_paused = true)]
    async fn test_interview_flow() {
        let app = app(Arc::new(StubProvider::replying("Let's get started with the interview.")));

        let (status, created) = call(
            &app,
            "POST",
            "/v1/interviews",
            Some(json!({ "problem_id": "two-sum", "language": "py" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["status"], "not_started");
        assert_eq!(created["language"], "python");
        let id = created["id"].as_str().unwrap().to_string();

        let (_, first) = call(&app, "POST", &format!("/v1/interviews/{}/start", id), None).await;
        assert_eq!(first["message"]["role"], "assistant");
        let (_, second) = call(&app, "POST", &format!("/v1/interviews/{}/start", id), None).await;
        assert!(second["message"].is_null());

        // starter code is unmodified
        let (status, run) = call(&app, "POST", &format!("/v1/interviews/{}/run", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(run["analysis"]["is_empty"], true);
        assert_eq!(run["report"]["summary"]["total_tests"], 2);
        assert_eq!(run["report"]["summary"]["passing"], 0);
        assert_eq!(run["report"]["summary"]["success"], false);

        let (status, restarted) =
            call(&app, "POST", &format!("/v1/interviews/{}/restart", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(restarted["status"], "not_started");
        assert!(restarted["messages"].as_array().unwrap().is_empty());
        assert!(restarted["latest_report"].is_null());

        let (status, completed) =
            call(&app, "POST", &format!("/v1/interviews/{}/complete", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(completed["status"], "completed");

        let (status, _) = call(&app, "DELETE", &format!("/v1/interviews/{}", id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(&app, "GET", &format!("/v1/interviews/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_interview_and_empty_message() {
        let app = app(Arc::new(StubProvider::new(vec![])));
        let missing = Uuid::new_v4();

        let (status, body) = call(
            &app,
            "POST",
            &format!("/v1/interviews/{}/messages", missing),
            Some(json!({ "content": "hi" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("not found"));

        let (_, created) = call(
            &app,
            "POST",
            "/v1/interviews",
            Some(json!({ "problem_id": "palindrome-number" })),
        )
        .await;
        let id = created["id"].as_str().unwrap();
        let (status, _) = call(
            &app,
            "POST",
            &format!("/v1/interviews/{}/messages", id),
            Some(json!({ "content": "   " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(
            &app,
            "POST",
            &format!("/v1/interviews/{}/messages", id),
            Some(json!({ "content": "START_INTERVIEW" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("start endpoint"));

        let (_, snapshot) = call(&app, "GET", &format!("/v1/interviews/{}", id), None).await;
        assert!(snapshot["messages"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cover_letter_validation() {
        let app = app(Arc::new(StubProvider::new(vec![])));
        let (status, body) = call(
            &app,
            "POST",
            "/v1/cover-letter",
            Some(json!({ "job_description": "", "resume_text": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "Please enter a job description");
    }
}
