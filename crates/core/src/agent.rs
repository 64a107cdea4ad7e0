//! Interview Agent Service
//!
//! Exposes a single interview session as Model Context Protocol (MCP) tools so
//! that an external driver (another agent, a voice runtime, an IDE) can run
//! the interview: ask for the next question, submit answers, conclude and
//! inspect progress.

use crate::session::{InterviewSession, InterviewSummary, NextQuestion};
use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, tool::Parameters},
    model::{ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::info;

// --- Data Structures for Tools ---

/// Arguments for submitting a candidate's answer.
#[derive(Deserialize, JsonSchema, Debug)]
pub struct SubmitAnswerArgs {
    /// The question exactly as it was asked.
    #[schemars(description = "The question text exactly as returned by 'next_question'")]
    pub question: String,
    /// The candidate's answer. An empty string means the candidate declined to answer.
    #[schemars(description = "The candidate's answer; may be empty if they declined to answer")]
    pub answer: String,
}

// --- Service and Handler Implementation ---

/// MCP front end for one interview session.
pub struct InterviewService {
    /// The session; locked for the full duration of every tool call.
    pub session: Arc<Mutex<InterviewSession>>,
    /// Optional channel receiving a summary after every state change.
    pub summary_tx: Option<mpsc::Sender<InterviewSummary>>,
    tool_router: ToolRouter<Self>,
}

#[tool_handler]
impl ServerHandler for InterviewService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Run a structured interview: call 'next_question', put it to the candidate, \
                 then 'submit_answer'. When 'next_question' reports the conclusion, call \
                 'conclude_interview'."
                    .to_string(),
            ),
            ..Default::default()
        }
    }
}

#[tool_router]
impl InterviewService {
    pub fn new(
        session: Arc<Mutex<InterviewSession>>,
        summary_tx: Option<mpsc::Sender<InterviewSummary>>,
    ) -> Self {
        Self {
            session,
            summary_tx,
            tool_router: Self::tool_router(),
        }
    }

    /// Returns the full session summary as JSON.
    #[tool(
        description = "Get the current status of the interview: candidate, role, progress, transcript and rating."
    )]
    pub async fn get_interview_status(&self) -> Result<String, String> {
        info!("Executing tool 'get_interview_status'");
        let session = self.session.lock().await;
        serde_json::to_string(&session.summary())
            .map_err(|e| format!("Failed to serialize interview summary: {}", e))
    }

    /// Produces the next question, or reports that the interview is over.
    #[tool(
        description = "Get the next interview question. Returns {\"question\", \"type\"} or {\"type\": \"conclusion\"} when no questions remain."
    )]
    pub async fn next_question(&self) -> Result<String, String> {
        info!("Executing tool 'next_question'");
        let mut session = self.session.lock().await;
        let payload = match session.next_question().await {
            NextQuestion::Question(question) => serde_json::to_value(&question)
                .map_err(|e| format!("Failed to serialize question: {}", e))?,
            NextQuestion::Conclusion => serde_json::json!({ "type": "conclusion" }),
        };
        self.broadcast(&session).await;
        Ok(payload.to_string())
    }

    /// Evaluates and records an answer.
    #[tool(
        description = "Submit the candidate's answer to a question. Returns the evaluation (score, strengths, improvements) and optional spoken feedback."
    )]
    pub async fn submit_answer(
        &self,
        args: Parameters<SubmitAnswerArgs>,
    ) -> Result<String, String> {
        info!(question_len = args.0.question.len(), "Executing tool 'submit_answer'");
        let mut session = self.session.lock().await;
        let outcome = session
            .submit_answer(&args.0.question, &args.0.answer)
            .await;
        self.broadcast(&session).await;
        serde_json::to_string(&outcome).map_err(|e| format!("Failed to serialize outcome: {}", e))
    }

    /// Produces the closing message and final rating.
    #[tool(
        description = "Conclude the interview. Returns the closing message and the overall rating."
    )]
    pub async fn conclude_interview(&self) -> Result<String, String> {
        info!("Executing tool 'conclude_interview'");
        let mut session = self.session.lock().await;
        let conclusion = session.conclude().await;
        self.broadcast(&session).await;
        serde_json::to_string(&conclusion)
            .map_err(|e| format!("Failed to serialize conclusion: {}", e))
    }

    async fn broadcast(&self, session: &InterviewSession) {
        if let Some(tx) = &self.summary_tx {
            if tx.send(session.summary()).await.is_err() {
                tracing::warn!("Failed to broadcast summary update: receiver dropped.");
            }
        }
    }
}
