//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application,
//! including the REST API and OpenAPI documentation.

use crate::{
    handlers,
    models::{
        AnswerResponse, ConcludeResponse, ErrorResponse, EvaluationView, NextQuestionResponse,
        ProfilePayload, StartInterviewPayload, StartInterviewResponse, SubmitAnswerPayload,
        SummaryView, TurnView,
    },
    state::AppState,
};

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::start_interview,
        handlers::next_question,
        handlers::submit_answer,
        handlers::conclude_interview,
        handlers::get_summary,
        handlers::list_domains,
    ),
    components(
        schemas(
            StartInterviewPayload, ProfilePayload, StartInterviewResponse, NextQuestionResponse,
            SubmitAnswerPayload, AnswerResponse, EvaluationView, ConcludeResponse, SummaryView,
            TurnView, ErrorResponse
        )
    ),
    tags(
        (name = "Interview API", description = "Adaptive interview sessions")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_router = Router::new()
        .route("/interviews", post(handlers::start_interview))
        .route(
            "/interviews/{id}/next-question",
            get(handlers::next_question),
        )
        .route("/interviews/{id}/answers", post(handlers::submit_answer))
        .route(
            "/interviews/{id}/conclude",
            post(handlers::conclude_interview),
        )
        .route("/interviews/{id}/summary", get(handlers::get_summary))
        .route("/domains", get(handlers::list_domains))
        .with_state(app_state);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        for expected in [
            "/interviews",
            "/interviews/{id}/next-question",
            "/interviews/{id}/answers",
            "/interviews/{id}/conclude",
            "/interviews/{id}/summary",
            "/domains",
        ] {
            assert!(
                paths.iter().any(|p| p.as_str() == expected),
                "missing path {expected}"
            );
        }
    }
}
