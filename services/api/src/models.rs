//! API Models
//!
//! Request and response bodies for the interview REST API. The session engine's
//! own types stay free of HTTP concerns; these mirror them with `utoipa`
//! schemas for the OpenAPI document.

use chrono::{DateTime, Utc};
use interview_core::{
    evaluation::Evaluation,
    profile::CandidateProfile,
    session::{AnswerOutcome, InterviewSummary, NextQuestion, Turn},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Deserialize, Serialize, ToSchema, Debug, Clone, PartialEq)]
pub struct ProfilePayload {
    #[schema(example = "Ada")]
    pub name: String,
    #[schema(example = "Senior (5-8 years)")]
    pub experience: String,
    #[serde(default)]
    #[schema(example = json!(["Rust", "Distributed systems"]))]
    pub skills: Vec<String>,
}

impl From<ProfilePayload> for CandidateProfile {
    fn from(payload: ProfilePayload) -> Self {
        CandidateProfile::new(payload.name, payload.experience, payload.skills)
    }
}

/// Fields are optional so that missing values produce a 400 with a readable
/// message instead of a deserialization rejection.
#[derive(Deserialize, ToSchema, Debug, Default)]
pub struct StartInterviewPayload {
    #[schema(example = "backend_engineer")]
    pub domain_file: Option<String>,
    pub profile: Option<ProfilePayload>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct StartInterviewResponse {
    #[schema(value_type = String, format = Uuid)]
    pub session_id: Uuid,
    /// Candidate-facing introduction.
    pub message: String,
    pub max_questions: u32,
    #[schema(example = "Hard")]
    pub difficulty: String,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, PartialEq)]
pub struct NextQuestionResponse {
    /// `introduction`, `technical`, `behavioral` or `conclusion`.
    #[serde(rename = "type")]
    #[schema(example = "technical")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
}

impl From<NextQuestion> for NextQuestionResponse {
    fn from(next: NextQuestion) -> Self {
        match next {
            NextQuestion::Question(question) => Self {
                kind: question.kind.to_string(),
                question: Some(question.text),
            },
            NextQuestion::Conclusion => Self {
                kind: "conclusion".to_string(),
                question: None,
            },
        }
    }
}

/// An empty `answer` is accepted and recorded as a declined answer.
#[derive(Deserialize, ToSchema, Debug, Default)]
pub struct SubmitAnswerPayload {
    pub question: Option<String>,
    pub answer: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct EvaluationView {
    #[schema(example = 7)]
    pub score: u8,
    pub strengths: String,
    pub improvements: String,
}

impl From<Evaluation> for EvaluationView {
    fn from(evaluation: Evaluation) -> Self {
        Self {
            score: evaluation.score,
            strengths: evaluation.strengths,
            improvements: evaluation.improvements,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct AnswerResponse {
    pub evaluation: EvaluationView,
    /// Present only when feedback is given immediately after each answer.
    pub feedback: Option<String>,
}

impl From<AnswerOutcome> for AnswerResponse {
    fn from(outcome: AnswerOutcome) -> Self {
        Self {
            evaluation: outcome.evaluation.into(),
            feedback: outcome.feedback,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct TurnView {
    pub question: String,
    #[schema(example = "technical")]
    pub question_type: String,
    pub answer: String,
    pub evaluation: Option<EvaluationView>,
    pub timestamp: DateTime<Utc>,
}

impl From<Turn> for TurnView {
    fn from(turn: Turn) -> Self {
        Self {
            question: turn.question,
            question_type: turn.question_type.to_string(),
            answer: turn.answer,
            evaluation: turn.evaluation.map(Into::into),
            timestamp: turn.timestamp,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct SummaryView {
    pub candidate_name: String,
    pub job_role: String,
    #[schema(example = "Medium")]
    pub difficulty: String,
    pub started_at: DateTime<Utc>,
    pub duration_seconds: i64,
    #[schema(example = "00:12:41")]
    pub duration: String,
    #[schema(example = 7.5)]
    pub overall_rating: f64,
    pub question_count: u32,
    pub max_questions: u32,
    pub transcript: Vec<TurnView>,
    pub skills_assessed: Vec<String>,
}

impl From<InterviewSummary> for SummaryView {
    fn from(summary: InterviewSummary) -> Self {
        Self {
            candidate_name: summary.candidate_name,
            job_role: summary.job_role,
            difficulty: summary.difficulty.label().to_string(),
            started_at: summary.started_at,
            duration_seconds: summary.duration_seconds,
            duration: summary.duration,
            overall_rating: summary.overall_rating,
            question_count: summary.question_count,
            max_questions: summary.max_questions,
            transcript: summary.transcript.into_iter().map(Into::into).collect(),
            skills_assessed: summary.skills_assessed,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct ConcludeResponse {
    /// Feedback summary followed by the closing remarks.
    pub conclusion: String,
    pub summary: SummaryView,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct ErrorResponse {
    pub message: String,
}
