//! Drives one interview session end to end over a `SpeechIo`.

use anyhow::Result;
use interview_core::{
    InterviewSession, NextQuestion,
    session::Conclusion,
    voice::{CaptureOutcome, CapturePolicy, SpeechIo, capture_answer},
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Runs the question loop until the session is exhausted, then concludes.
///
/// Returns `None` when cancelled; the session is left unconcluded.
/// A candidate who gives up on a question is recorded as declining it.
pub async fn run_interview(
    session: &mut InterviewSession,
    io: &mut dyn SpeechIo,
    introduction: &str,
    policy: &CapturePolicy,
    cancel: &CancellationToken,
) -> Result<Option<Conclusion>> {
    io.speak(introduction).await?;

    loop {
        if cancel.is_cancelled() {
            info!("Interview cancelled before the next question");
            return Ok(None);
        }
        let question = match session.next_question().await {
            NextQuestion::Question(question) => question,
            NextQuestion::Conclusion => break,
        };
        io.speak(&question.text).await?;

        let answer = match capture_answer(io, &question.text, policy, cancel).await {
            Ok(CaptureOutcome::Answer(answer)) => answer,
            Ok(CaptureOutcome::GaveUp) => String::new(),
            Ok(CaptureOutcome::Cancelled) => return Ok(None),
            Err(e) => {
                warn!(error = ?e, "Answer capture failed; concluding early");
                break;
            }
        };

        let outcome = session.submit_answer(&question.text, &answer).await;
        info!(
            question_count = session.question_count(),
            score = outcome.evaluation.score,
            "Answer recorded"
        );
        if let Some(feedback) = outcome.feedback {
            io.speak(&feedback).await?;
        }
    }

    let conclusion = session.conclude().await;
    io.speak(&conclusion.message).await?;
    Ok(Some(conclusion))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use interview_core::{
        SessionOptions,
        domain::DomainConfig,
        llm_client::CannedLLMClient,
        profile::CandidateProfile,
        prompts::PromptTemplates,
        session::FeedbackTiming,
        voice::Heard,
    };
    use std::{collections::VecDeque, sync::Arc};

    struct ScriptedIo {
        heard: VecDeque<Heard>,
        spoken: Vec<String>,
    }

    #[async_trait]
    impl SpeechIo for ScriptedIo {
        async fn speak(&mut self, text: &str) -> Result<()> {
            self.spoken.push(text.to_string());
            Ok(())
        }

        async fn listen(&mut self) -> Result<Heard> {
            self.heard
                .pop_front()
                .ok_or_else(|| anyhow::anyhow!("Input stream closed"))
        }
    }

    async fn session(questions: u32, timing: FeedbackTiming) -> InterviewSession {
        let (session, _) = InterviewSession::start(
            CandidateProfile::new("Ravi", "Junior (1-2 years)", vec!["Go".into()]),
            DomainConfig::new("Backend Engineer"),
            SessionOptions::fixed_length(questions).with_feedback_timing(timing),
            Arc::new(CannedLLMClient::new()),
            Arc::new(PromptTemplates::default()),
        )
        .await
        .unwrap();
        session
    }

    #[tokio::test]
    async fn test_runs_to_conclusion() {
        let mut session = session(3, FeedbackTiming::Deferred).await;
        let mut io = ScriptedIo {
            heard: VecDeque::from(vec![
                Heard::Speech("I write Go services.".into()),
                Heard::Speech("repeat".into()),
                Heard::Speech("Channels carry values.".into()),
                Heard::Unrecognized,
                Heard::Unrecognized,
                Heard::Unrecognized,
            ]),
            spoken: Vec::new(),
        };

        let conclusion = run_interview(
            &mut session,
            &mut io,
            "Welcome!",
            &CapturePolicy::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap()
        .expect("interview should conclude");

        assert_eq!(io.spoken.first().map(String::as_str), Some("Welcome!"));
        assert_eq!(io.spoken.last(), Some(&conclusion.message));
        assert_eq!(session.question_count(), 3);
        let transcript = session.transcript();
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[1].answer, "Channels carry values.");
        assert_eq!(transcript[2].answer, "");
        assert!(session.conclusion().is_some());
    }

    #[tokio::test]
    async fn test_immediate_feedback_is_spoken() {
        let mut session = session(1, FeedbackTiming::Immediate).await;
        let mut io = ScriptedIo {
            heard: VecDeque::from(vec![Heard::Speech("Hello.".into())]),
            spoken: Vec::new(),
        };

        run_interview(
            &mut session,
            &mut io,
            "Hi",
            &CapturePolicy::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        // introduction, question, feedback, conclusion
        assert_eq!(io.spoken.len(), 4);
    }

    #[tokio::test]
    async fn test_closed_input_concludes_early() {
        let mut session = session(4, FeedbackTiming::Deferred).await;
        let mut io = ScriptedIo {
            heard: VecDeque::new(),
            spoken: Vec::new(),
        };

        let conclusion = run_interview(
            &mut session,
            &mut io,
            "Hi",
            &CapturePolicy::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert!(conclusion.is_some());
        assert!(session.transcript().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_interview_is_not_concluded() {
        let mut session = session(4, FeedbackTiming::Deferred).await;
        let mut io = ScriptedIo {
            heard: VecDeque::new(),
            spoken: Vec::new(),
        };
        let cancel = CancellationToken::new();
        cancel.cancel();

        let conclusion = run_interview(
            &mut session,
            &mut io,
            "Hi",
            &CapturePolicy::default(),
            &cancel,
        )
        .await
        .unwrap();

        assert!(conclusion.is_none());
        assert_eq!(session.question_count(), 0);
        assert!(session.conclusion().is_none());
    }
}
