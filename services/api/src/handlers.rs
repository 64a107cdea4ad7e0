//! Axum Handlers for the REST API
//!
//! This module contains the logic for handling HTTP requests for interview
//! sessions. It uses `utoipa` doc comments to generate OpenAPI documentation.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use interview_core::{InterviewError, InterviewSession, profile::CandidateProfile};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    models::{
        AnswerResponse, ConcludeResponse, ErrorResponse, NextQuestionResponse,
        StartInterviewPayload, StartInterviewResponse, SubmitAnswerPayload, SummaryView,
    },
    state::AppState,
};

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    InternalServerError(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { message })).into_response()
            }
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(ErrorResponse { message })).into_response()
            }
            ApiError::InternalServerError(err) => {
                error!("Internal Server Error: {:?}", err);
                let message = "An internal server error occurred.".to_string();
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse { message }),
                )
                    .into_response()
            }
        }
    }
}

impl From<InterviewError> for ApiError {
    fn from(err: InterviewError) -> Self {
        match err {
            InterviewError::Configuration(_) | InterviewError::Precondition(_) => {
                Self::BadRequest(err.to_string())
            }
            InterviewError::DomainNotFound(_) => Self::NotFound(err.to_string()),
            InterviewError::Generation(_) => Self::InternalServerError(err.into()),
        }
    }
}

fn session_not_found(id: Uuid) -> ApiError {
    ApiError::NotFound(format!("Interview session with id '{}' not found", id))
}

async fn find_session(
    state: &AppState,
    id: Uuid,
) -> Result<Arc<Mutex<InterviewSession>>, ApiError> {
    state
        .sessions
        .get(&id)
        .await
        .ok_or_else(|| session_not_found(id))
}

/// Start a new interview for a candidate.
#[utoipa::path(
    post,
    path = "/interviews",
    request_body = StartInterviewPayload,
    responses(
        (status = 201, description = "Interview started", body = StartInterviewResponse),
        (status = 400, description = "Profile or domain missing or invalid", body = ErrorResponse),
        (status = 404, description = "Domain configuration not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn start_interview(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<StartInterviewPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let profile: CandidateProfile = payload
        .profile
        .ok_or_else(|| ApiError::from(InterviewError::missing("candidate profile")))?
        .into();
    let domain_file = payload
        .domain_file
        .filter(|f| !f.trim().is_empty())
        .ok_or_else(|| ApiError::from(InterviewError::missing("domain_file")))?;

    let domain = state.domains.load(&domain_file).await?;

    let (session, message) = InterviewSession::start(
        profile,
        domain,
        state.config.session_options.clone(),
        state.llm_client.clone(),
        state.prompts.clone(),
    )
    .await?;

    let max_questions = session.max_questions();
    let difficulty = session.difficulty().label().to_string();
    let session_id = state.sessions.insert(session).await;
    info!(%session_id, %domain_file, max_questions, "Interview started");

    Ok((
        StatusCode::CREATED,
        Json(StartInterviewResponse {
            session_id,
            message,
            max_questions,
            difficulty,
        }),
    ))
}

/// Get the next question, or the conclusion marker once the interview is over.
#[utoipa::path(
    get,
    path = "/interviews/{id}/next-question",
    responses(
        (status = 200, description = "Next question or conclusion marker", body = NextQuestionResponse),
        (status = 404, description = "Session not found", body = ErrorResponse)
    ),
    params(
        ("id" = Uuid, Path, description = "Interview session ID")
    )
)]
pub async fn next_question(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<NextQuestionResponse>, ApiError> {
    let session = find_session(&state, id).await?;
    let next = session.lock().await.next_question().await;
    Ok(Json(next.into()))
}

/// Submit the candidate's answer to a question.
#[utoipa::path(
    post,
    path = "/interviews/{id}/answers",
    request_body = SubmitAnswerPayload,
    responses(
        (status = 200, description = "Answer evaluated and recorded", body = AnswerResponse),
        (status = 400, description = "Question or answer missing", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse)
    ),
    params(
        ("id" = Uuid, Path, description = "Interview session ID")
    )
)]
pub async fn submit_answer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SubmitAnswerPayload>,
) -> Result<Json<AnswerResponse>, ApiError> {
    let (Some(question), Some(answer)) = (payload.question, payload.answer) else {
        return Err(InterviewError::precondition("both question and answer are required").into());
    };

    let session = find_session(&state, id).await?;
    let outcome = session.lock().await.submit_answer(&question, &answer).await;
    Ok(Json(outcome.into()))
}

/// Conclude the interview and close the session.
#[utoipa::path(
    post,
    path = "/interviews/{id}/conclude",
    responses(
        (status = 200, description = "Closing message and final summary", body = ConcludeResponse),
        (status = 404, description = "Session not found", body = ErrorResponse)
    ),
    params(
        ("id" = Uuid, Path, description = "Interview session ID")
    )
)]
pub async fn conclude_interview(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ConcludeResponse>, ApiError> {
    let session = find_session(&state, id).await?;
    let (conclusion, summary) = {
        let mut session = session.lock().await;
        let conclusion = session.conclude().await;
        (conclusion, session.summary())
    };
    state.sessions.remove(&id).await;
    info!(session_id = %id, overall_rating = conclusion.overall_rating, "Interview closed");

    Ok(Json(ConcludeResponse {
        conclusion: conclusion.message,
        summary: summary.into(),
    }))
}

/// Get the current summary of an interview.
#[utoipa::path(
    get,
    path = "/interviews/{id}/summary",
    responses(
        (status = 200, description = "Interview summary", body = SummaryView),
        (status = 404, description = "Session not found", body = ErrorResponse)
    ),
    params(
        ("id" = Uuid, Path, description = "Interview session ID")
    )
)]
pub async fn get_summary(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SummaryView>, ApiError> {
    let session = find_session(&state, id).await?;
    let summary = session.lock().await.summary();
    Ok(Json(summary.into()))
}

/// List the available interview domains.
#[utoipa::path(
    get,
    path = "/domains",
    responses(
        (status = 200, description = "Domain identifiers", body = [String]),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_domains(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, ApiError> {
    let domains = state
        .domains
        .list()
        .await
        .map_err(|e| ApiError::InternalServerError(e.into()))?;
    Ok(Json(domains))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        models::ProfilePayload,
        state::SessionStore,
    };
    use approx::assert_relative_eq;
    use interview_core::{
        SessionOptions,
        domain::{DomainConfig, StaticDomainCatalog},
        llm_client::{CannedLLMClient, Provider},
        prompts::PromptTemplates,
        session::FeedbackTiming,
    };
    use std::time::Duration;

    fn test_state(questions: u32) -> Arc<AppState> {
        let config = Config {
            bind_address: "127.0.0.1:0".parse().unwrap(),
            provider: Provider::OpenAI,
            openai_api_key: Some("test".to_string()),
            gemini_api_key: None,
            chat_model: "gpt-4o".to_string(),
            log_level: tracing::Level::INFO,
            prompts_path: "./prompts".into(),
            domains_path: "./configurations".into(),
            generation_timeout: Duration::from_secs(5),
            session_idle_timeout: Duration::from_secs(1800),
            session_options: SessionOptions::fixed_length(questions)
                .with_feedback_timing(FeedbackTiming::Immediate),
        };
        let domains = StaticDomainCatalog::new()
            .with_domain("backend_engineer", DomainConfig::new("Backend Engineer"))
            .with_domain("data_engineer", DomainConfig::new("Data Engineer"));
        Arc::new(AppState {
            sessions: Arc::new(SessionStore::new()),
            domains: Arc::new(domains),
            llm_client: Arc::new(CannedLLMClient::new()),
            prompts: Arc::new(PromptTemplates::default()),
            config: Arc::new(config),
        })
    }

    fn start_payload(domain: Option<&str>, with_profile: bool) -> StartInterviewPayload {
        StartInterviewPayload {
            domain_file: domain.map(String::from),
            profile: with_profile.then(|| ProfilePayload {
                name: "Ada".to_string(),
                experience: "Senior (5-8 years)".to_string(),
                skills: vec!["Rust".to_string()],
            }),
        }
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn started(state: &Arc<AppState>) -> Uuid {
        let response = start_interview(
            State(state.clone()),
            Json(start_payload(Some("backend_engineer"), true)),
        )
        .await
        .unwrap()
        .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        body["session_id"].as_str().unwrap().parse().unwrap()
    }

    #[tokio::test]
    async fn test_start_interview_returns_session() {
        let state = test_state(3);
        let response = start_interview(
            State(state.clone()),
            Json(start_payload(Some("backend_engineer"), true)),
        )
        .await
        .unwrap()
        .into_response();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["max_questions"], 3);
        assert_eq!(body["difficulty"], "Hard");
        assert!(!body["message"].as_str().unwrap().is_empty());
        assert_eq!(state.sessions.len().await, 1);
    }

    #[tokio::test]
    async fn test_start_interview_validation_errors() {
        let state = test_state(3);

        let missing_profile =
            start_interview(State(state.clone()), Json(start_payload(Some("backend_engineer"), false)))
                .await
                .err()
                .unwrap()
                .into_response();
        assert_eq!(missing_profile.status(), StatusCode::BAD_REQUEST);

        let missing_domain = start_interview(State(state.clone()), Json(start_payload(None, true)))
            .await
            .err()
            .unwrap()
            .into_response();
        assert_eq!(missing_domain.status(), StatusCode::BAD_REQUEST);

        let unknown_domain =
            start_interview(State(state.clone()), Json(start_payload(Some("astronaut"), true)))
                .await
                .err()
                .unwrap()
                .into_response();
        assert_eq!(unknown_domain.status(), StatusCode::NOT_FOUND);
        let body = body_json(unknown_domain).await;
        assert!(body["message"].as_str().unwrap().contains("astronaut"));

        assert!(state.sessions.is_empty().await);
    }

    #[tokio::test]
    async fn test_full_interview_over_http_handlers() {
        let state = test_state(2);
        let id = started(&state).await;

        let Json(first) = next_question(State(state.clone()), Path(id)).await.unwrap();
        assert_eq!(first.kind, "introduction");

        let Json(outcome) = submit_answer(
            State(state.clone()),
            Path(id),
            Json(SubmitAnswerPayload {
                question: first.question.clone(),
                answer: Some("I build services in Rust.".to_string()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(outcome.evaluation.score, 7);
        assert!(outcome.feedback.is_some());

        let Json(second) = next_question(State(state.clone()), Path(id)).await.unwrap();
        assert_eq!(second.kind, "technical");

        let Json(done) = next_question(State(state.clone()), Path(id)).await.unwrap();
        assert_eq!(done.kind, "conclusion");
        assert!(done.question.is_none());

        let Json(summary) = get_summary(State(state.clone()), Path(id)).await.unwrap();
        assert_eq!(summary.question_count, 2);
        assert_eq!(summary.transcript.len(), 1);

        let Json(concluded) = conclude_interview(State(state.clone()), Path(id))
            .await
            .unwrap();
        assert!(!concluded.conclusion.is_empty());
        assert_relative_eq!(concluded.summary.overall_rating, 7.0);

        // The session is gone once concluded.
        let gone = get_summary(State(state.clone()), Path(id))
            .await
            .err()
            .unwrap()
            .into_response();
        assert_eq!(gone.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_submit_answer_requires_both_fields() {
        let state = test_state(3);
        let id = started(&state).await;

        let response = submit_answer(
            State(state.clone()),
            Path(id),
            Json(SubmitAnswerPayload {
                question: Some("Why Rust?".to_string()),
                answer: None,
            }),
        )
        .await
        .err()
        .unwrap()
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let Json(outcome) = submit_answer(
            State(state.clone()),
            Path(id),
            Json(SubmitAnswerPayload {
                question: Some("Why Rust?".to_string()),
                answer: Some(String::new()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(outcome.evaluation.score, 7);
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let state = test_state(3);
        let response = next_question(State(state), Path(Uuid::new_v4()))
            .await
            .err()
            .unwrap()
            .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let state = test_state(3);
        let first = started(&state).await;
        let second = started(&state).await;
        assert_ne!(first, second);

        next_question(State(state.clone()), Path(first)).await.unwrap();
        next_question(State(state.clone()), Path(first)).await.unwrap();

        let Json(first_summary) = get_summary(State(state.clone()), Path(first)).await.unwrap();
        let Json(second_summary) = get_summary(State(state.clone()), Path(second)).await.unwrap();
        assert_eq!(first_summary.question_count, 2);
        assert_eq!(second_summary.question_count, 0);
    }

    #[tokio::test]
    async fn test_list_domains() {
        let state = test_state(3);
        let Json(domains) = list_domains(State(state)).await.unwrap();
        assert_eq!(
            domains,
            vec!["backend_engineer".to_string(), "data_engineer".to_string()]
        );
    }

    #[test]
    fn test_interview_error_status_mapping() {
        let cases = [
            (InterviewError::configuration("bad"), StatusCode::BAD_REQUEST),
            (InterviewError::precondition("bad"), StatusCode::BAD_REQUEST),
            (
                InterviewError::DomainNotFound("x".to_string()),
                StatusCode::NOT_FOUND,
            ),
            (
                InterviewError::Generation("timeout".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }
}
