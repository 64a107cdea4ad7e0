//! Interview Session Engine
//!
//! One `InterviewSession` per interview. The session tracks how many questions
//! have been asked, decides what kind of question comes next, evaluates answers
//! through the text-generation backend and aggregates the evaluations into a
//! final rating.
//!
//! The session is not internally synchronised: callers must serialise access,
//! typically by holding a `tokio::sync::Mutex` for the duration of each call.

use crate::{
    domain::DomainConfig,
    error::InterviewError,
    evaluation::{Evaluation, parse_feedback},
    llm_client::{LLMClient, complete_or_fallback},
    profile::{CandidateProfile, Difficulty},
    prompts::{self, PromptTemplates},
};
use chrono::{DateTime, Utc};
use rand::{Rng, seq::IndexedRandom};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr, sync::Arc};
use tracing::{debug, info};

/// Lower bound of the randomised per-session question target.
pub const DEFAULT_MIN_QUESTIONS: u32 = 5;
/// Upper bound (inclusive) of the randomised per-session question target.
pub const DEFAULT_MAX_QUESTIONS: u32 = 10;
/// Position of the first behavioural question.
pub const BEHAVIORAL_QUESTION_INDEX: u32 = 3;
/// Position of the second behavioural question, used only in sessions longer than it.
pub const LATE_BEHAVIORAL_QUESTION_INDEX: u32 = 7;
/// Skill probed when the candidate did not list any.
pub const FALLBACK_SKILL: &str = "general problem solving";
/// Phrase identifying the opening question; such turns are left out of the feedback log.
pub const INTRODUCTION_MARKER: &str = "tell me about yourself";
/// Conclusion text used when no substantive turns were recorded.
pub const EMPTY_LOG_MESSAGE: &str = "We've completed the questions for today.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Introduction,
    Technical,
    Behavioral,
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionKind::Introduction => write!(f, "introduction"),
            QuestionKind::Technical => write!(f, "technical"),
            QuestionKind::Behavioral => write!(f, "behavioral"),
        }
    }
}

/// A question put to the candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "question")]
    pub text: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
}

/// Result of asking the session for its next question.
#[derive(Debug, Clone, PartialEq)]
pub enum NextQuestion {
    Question(Question),
    /// The question budget is spent (or the interview was concluded).
    Conclusion,
}

/// One completed question/answer exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub question: String,
    pub question_type: QuestionKind,
    pub answer: String,
    pub evaluation: Option<Evaluation>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    NotStarted,
    InProgress,
    Concluded,
}

/// When the candidate hears about their answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackTiming {
    /// A short spoken reaction after every answer, plus the final summary.
    Immediate,
    /// Nothing until the conclusion.
    #[default]
    Deferred,
}

impl FromStr for FeedbackTiming {
    type Err = InterviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "immediate" => Ok(FeedbackTiming::Immediate),
            "deferred" => Ok(FeedbackTiming::Deferred),
            other => Err(InterviewError::configuration(format!(
                "unknown feedback timing '{other}' (expected 'immediate' or 'deferred')"
            ))),
        }
    }
}

/// Tuning knobs fixed at session creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub min_questions: u32,
    pub max_questions: u32,
    pub feedback_timing: FeedbackTiming,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            min_questions: DEFAULT_MIN_QUESTIONS,
            max_questions: DEFAULT_MAX_QUESTIONS,
            feedback_timing: FeedbackTiming::default(),
        }
    }
}

impl SessionOptions {
    /// Options that pin the question target to exactly `questions`.
    pub fn fixed_length(questions: u32) -> Self {
        Self {
            min_questions: questions,
            max_questions: questions,
            ..Self::default()
        }
    }

    pub fn with_feedback_timing(mut self, timing: FeedbackTiming) -> Self {
        self.feedback_timing = timing;
        self
    }

    pub fn validate(&self) -> Result<(), InterviewError> {
        if self.min_questions == 0 {
            return Err(InterviewError::configuration(
                "an interview needs at least one question",
            ));
        }
        if self.min_questions > self.max_questions {
            return Err(InterviewError::configuration(format!(
                "question range {}..={} is empty",
                self.min_questions, self.max_questions
            )));
        }
        Ok(())
    }
}

/// What `submit_answer` hands back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerOutcome {
    pub evaluation: Evaluation,
    /// Spoken reaction to the answer; only produced under `FeedbackTiming::Immediate`.
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conclusion {
    pub message: String,
    pub overall_rating: f64,
}

/// Read-only export of a session.
#[derive(Debug, Clone, Serialize)]
pub struct InterviewSummary {
    pub candidate_name: String,
    pub job_role: String,
    pub difficulty: Difficulty,
    pub started_at: DateTime<Utc>,
    pub duration_seconds: i64,
    /// `HH:MM:SS` rendering of `duration_seconds`.
    pub duration: String,
    pub overall_rating: f64,
    pub question_count: u32,
    pub max_questions: u32,
    pub transcript: Vec<Turn>,
    pub skills_assessed: Vec<String>,
}

/// Picks the kind of question for position `question_count`.
pub fn question_kind_for(question_count: u32, max_questions: u32) -> QuestionKind {
    if question_count == 0 {
        QuestionKind::Introduction
    } else if question_count == BEHAVIORAL_QUESTION_INDEX
        || (max_questions > LATE_BEHAVIORAL_QUESTION_INDEX
            && question_count == LATE_BEHAVIORAL_QUESTION_INDEX)
    {
        QuestionKind::Behavioral
    } else {
        QuestionKind::Technical
    }
}

/// Mean of every recorded evaluation score, or 0 when nothing was scored.
pub fn overall_rating(transcript: &[Turn]) -> f64 {
    let scores: Vec<f64> = transcript
        .iter()
        .filter_map(|turn| turn.evaluation.as_ref())
        .map(|evaluation| f64::from(evaluation.score))
        .collect();
    if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    }
}

fn opening_question(job_role: &str) -> String {
    format!(
        "Great, let's start. To begin, could you please tell me about yourself and your journey as a {job_role}?"
    )
}

fn is_introduction(question: &str) -> bool {
    question.to_lowercase().contains(INTRODUCTION_MARKER)
}

fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

/// The mutable state of a single interview.
pub struct InterviewSession {
    profile: CandidateProfile,
    domain: DomainConfig,
    feedback_timing: FeedbackTiming,
    difficulty: Difficulty,
    question_count: u32,
    max_questions: u32,
    start_time: DateTime<Utc>,
    questions_asked: Vec<Question>,
    transcript: Vec<Turn>,
    conclusion: Option<Conclusion>,
    client: Arc<dyn LLMClient>,
    prompts: Arc<PromptTemplates>,
}

impl fmt::Debug for InterviewSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterviewSession")
            .field("candidate", &self.profile.name)
            .field("job_role", &self.domain.domain_name)
            .field("difficulty", &self.difficulty)
            .field("question_count", &self.question_count)
            .field("max_questions", &self.max_questions)
            .field("turns", &self.transcript.len())
            .finish_non_exhaustive()
    }
}

impl InterviewSession {
    /// Creates a session and generates the candidate-facing introduction.
    ///
    /// Fails only on configuration problems. A failed introduction completion
    /// is replaced by the generic fallback text.
    pub async fn start(
        profile: CandidateProfile,
        domain: DomainConfig,
        options: SessionOptions,
        client: Arc<dyn LLMClient>,
        prompts: Arc<PromptTemplates>,
    ) -> Result<(Self, String), InterviewError> {
        profile.validate()?;
        domain.validate()?;
        options.validate()?;

        let max_questions = rand::rng().random_range(options.min_questions..=options.max_questions);
        let difficulty = Difficulty::from_experience(&profile.experience);

        let session = Self {
            profile,
            domain,
            feedback_timing: options.feedback_timing,
            difficulty,
            question_count: 0,
            max_questions,
            start_time: Utc::now(),
            questions_asked: Vec::new(),
            transcript: Vec::new(),
            conclusion: None,
            client,
            prompts,
        };
        info!(
            candidate = %session.profile.name,
            job_role = %session.domain.job_role(),
            difficulty = %session.difficulty,
            max_questions,
            "Interview session created"
        );

        let introduction = session.generate_introduction().await;
        Ok((session, introduction))
    }

    pub fn profile(&self) -> &CandidateProfile {
        &self.profile
    }

    pub fn domain(&self) -> &DomainConfig {
        &self.domain
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn feedback_timing(&self) -> FeedbackTiming {
        self.feedback_timing
    }

    pub fn question_count(&self) -> u32 {
        self.question_count
    }

    pub fn max_questions(&self) -> u32 {
        self.max_questions
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn questions_asked(&self) -> &[Question] {
        &self.questions_asked
    }

    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    /// The stored conclusion, once `conclude` has run.
    pub fn conclusion(&self) -> Option<&Conclusion> {
        self.conclusion.as_ref()
    }

    pub fn state(&self) -> SessionState {
        if self.conclusion.is_some() || self.question_count >= self.max_questions {
            SessionState::Concluded
        } else if self.question_count == 0 {
            SessionState::NotStarted
        } else {
            SessionState::InProgress
        }
    }

    /// Produces the next question, or `NextQuestion::Conclusion` once the
    /// question budget is spent. Calls after that point change nothing.
    pub async fn next_question(&mut self) -> NextQuestion {
        if self.state() == SessionState::Concluded {
            debug!(
                question_count = self.question_count,
                "Question budget spent; signalling conclusion"
            );
            return NextQuestion::Conclusion;
        }

        let kind = question_kind_for(self.question_count, self.max_questions);
        let text = match kind {
            QuestionKind::Introduction => opening_question(self.domain.job_role()),
            QuestionKind::Technical => self.generate_technical_question().await,
            QuestionKind::Behavioral => self.generate_behavioral_question().await,
        };

        self.question_count += 1;
        let question = Question { text, kind };
        self.questions_asked.push(question.clone());
        info!(
            position = self.question_count,
            max_questions = self.max_questions,
            kind = %kind,
            "Question emitted"
        );
        NextQuestion::Question(question)
    }

    /// Scores `answer` to `question`. Does not touch the transcript.
    ///
    /// An empty answer is valid input (the candidate chose not to answer).
    pub async fn evaluate_answer(&self, question: &str, answer: &str) -> Evaluation {
        let prompt = self.prompts.render(
            prompts::EVALUATE_ANSWER,
            &[
                ("job_role", self.domain.job_role()),
                ("experience", &self.profile.experience),
                ("question", question),
                ("answer", answer),
            ],
        );
        let response = complete_or_fallback(self.client.as_ref(), prompt).await;
        let evaluation = parse_feedback(&response);
        debug!(score = evaluation.score, "Answer evaluated");
        evaluation
    }

    /// Appends a turn to the transcript.
    ///
    /// The question type is recovered from the questions this session has
    /// asked; unknown questions are classed by their wording.
    pub fn record_turn(
        &mut self,
        question: impl Into<String>,
        answer: impl Into<String>,
        evaluation: Option<Evaluation>,
    ) -> &Turn {
        let question = question.into();
        let question_type = self
            .questions_asked
            .iter()
            .rev()
            .find(|asked| asked.text == question)
            .map(|asked| asked.kind)
            .unwrap_or_else(|| {
                if is_introduction(&question) {
                    QuestionKind::Introduction
                } else {
                    QuestionKind::Technical
                }
            });

        self.transcript.push(Turn {
            question,
            question_type,
            answer: answer.into(),
            evaluation,
            timestamp: Utc::now(),
        });
        let index = self.transcript.len() - 1;
        debug!(turn = index + 1, kind = %question_type, "Turn recorded");
        &self.transcript[index]
    }

    /// A one- or two-sentence spoken reaction to a single evaluated answer.
    pub async fn adaptive_feedback(&self, question: &str, evaluation: &Evaluation) -> String {
        let score = evaluation.score.to_string();
        let prompt = self.prompts.render(
            prompts::ADAPTIVE_FEEDBACK,
            &[
                ("candidate_name", &self.profile.name),
                ("question", question),
                ("score", &score),
                ("strengths", &evaluation.strengths),
                ("improvements", &evaluation.improvements),
            ],
        );
        complete_or_fallback(self.client.as_ref(), prompt).await
    }

    /// Evaluates and records an answer, adding adaptive feedback when the
    /// session's feedback timing is `Immediate`.
    pub async fn submit_answer(&mut self, question: &str, answer: &str) -> AnswerOutcome {
        let evaluation = self.evaluate_answer(question, answer).await;
        self.record_turn(question, answer, Some(evaluation.clone()));

        let feedback = match self.feedback_timing {
            FeedbackTiming::Immediate => Some(self.adaptive_feedback(question, &evaluation).await),
            FeedbackTiming::Deferred => None,
        };
        AnswerOutcome {
            evaluation,
            feedback,
        }
    }

    /// The per-turn log the final feedback is synthesised from.
    ///
    /// Opening-question turns are skipped; `None` when nothing remains.
    pub fn feedback_log(&self) -> Option<String> {
        let log: String = self
            .transcript
            .iter()
            .filter(|turn| !is_introduction(&turn.question))
            .map(|turn| {
                let fallback = Evaluation::default();
                let evaluation = turn.evaluation.as_ref().unwrap_or(&fallback);
                let score = match &turn.evaluation {
                    Some(e) => e.score.to_string(),
                    None => "N/A".to_string(),
                };
                format!(
                    "Question: {}\nScore: {}/10\nStrengths: {}\nImprovements: {}\n---\n",
                    turn.question, score, evaluation.strengths, evaluation.improvements
                )
            })
            .collect();
        (!log.is_empty()).then_some(log)
    }

    /// Produces the closing message and fixes the overall rating.
    ///
    /// Runs once; later calls return the stored conclusion without further
    /// generation.
    pub async fn conclude(&mut self) -> Conclusion {
        if let Some(conclusion) = &self.conclusion {
            debug!("Conclusion already produced; returning stored copy");
            return conclusion.clone();
        }

        let feedback = match self.feedback_log() {
            Some(log) => {
                let prompt = self.prompts.render(
                    prompts::FEEDBACK_SUMMARY,
                    &[("candidate_name", &self.profile.name), ("feedback_log", &log)],
                );
                complete_or_fallback(self.client.as_ref(), prompt).await
            }
            None => {
                info!("No substantive turns to summarise");
                EMPTY_LOG_MESSAGE.to_string()
            }
        };

        let rating = overall_rating(&self.transcript);
        let rating_text = format!("{rating:.1}");
        let prompt = self.prompts.render(
            prompts::CLOSING_REMARKS,
            &[
                ("candidate_name", &self.profile.name),
                ("job_role", self.domain.job_role()),
                ("overall_rating", &rating_text),
            ],
        );
        let closing = complete_or_fallback(self.client.as_ref(), prompt).await;

        let conclusion = Conclusion {
            message: format!("{feedback} {closing}"),
            overall_rating: rating,
        };
        info!(
            overall_rating = rating,
            turns = self.transcript.len(),
            "Interview concluded"
        );
        self.conclusion = Some(conclusion.clone());
        conclusion
    }

    /// A snapshot of the session. The rating is 0 until `conclude` has run.
    pub fn summary(&self) -> InterviewSummary {
        let duration_seconds = (Utc::now() - self.start_time).num_seconds();
        InterviewSummary {
            candidate_name: self.profile.name.clone(),
            job_role: self.domain.job_role().to_string(),
            difficulty: self.difficulty,
            started_at: self.start_time,
            duration_seconds,
            duration: format_duration(duration_seconds),
            overall_rating: self.conclusion.as_ref().map_or(0.0, |c| c.overall_rating),
            question_count: self.question_count,
            max_questions: self.max_questions,
            transcript: self.transcript.clone(),
            skills_assessed: self.profile.skills.clone(),
        }
    }

    async fn generate_introduction(&self) -> String {
        let skills = self.profile.skills.join(", ");
        let max_questions = self.max_questions.to_string();
        let prompt = self.prompts.render(
            prompts::INTRODUCTION,
            &[
                ("candidate_name", &self.profile.name),
                ("job_role", self.domain.job_role()),
                ("experience", &self.profile.experience),
                ("skills", &skills),
                ("max_questions", &max_questions),
            ],
        );
        complete_or_fallback(self.client.as_ref(), prompt).await
    }

    async fn generate_technical_question(&self) -> String {
        let skill = self
            .profile
            .skills
            .choose(&mut rand::rng())
            .cloned()
            .unwrap_or_else(|| FALLBACK_SKILL.to_string());
        debug!(skill = %skill, difficulty = %self.difficulty, "Generating technical question");

        let prompt = self.prompts.render(
            prompts::TECHNICAL_QUESTION,
            &[
                ("role_prompt", self.domain.role_prompt()),
                ("experience", &self.profile.experience),
                ("difficulty", self.difficulty.label()),
                ("difficulty_guidance", self.difficulty.question_guidance()),
                ("skill", &skill),
            ],
        );
        complete_or_fallback(self.client.as_ref(), prompt).await
    }

    async fn generate_behavioral_question(&self) -> String {
        let prompt = self.prompts.render(
            prompts::BEHAVIORAL_QUESTION,
            &[
                ("job_role", self.domain.job_role()),
                ("experience", &self.profile.experience),
                ("behavioral_context", self.domain.behavioral_context()),
            ],
        );
        complete_or_fallback(self.client.as_ref(), prompt).await
    }
}
