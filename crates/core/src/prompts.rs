//! Prompt templates used by the interview session.
//!
//! Templates use `{name}` placeholders. Every template has a built-in default;
//! deployments can override any of them by dropping a `<name>.md` file into
//! the prompts directory.

use anyhow::Context;
use std::{collections::HashMap, fs, path::Path};

pub const INTRODUCTION: &str = "introduction";
pub const TECHNICAL_QUESTION: &str = "technical_question";
pub const BEHAVIORAL_QUESTION: &str = "behavioral_question";
pub const EVALUATE_ANSWER: &str = "evaluate_answer";
pub const ADAPTIVE_FEEDBACK: &str = "adaptive_feedback";
pub const FEEDBACK_SUMMARY: &str = "feedback_summary";
pub const CLOSING_REMARKS: &str = "closing_remarks";

const DEFAULT_INTRODUCTION: &str = r#"Generate a warm, professional introduction for a candidate named {candidate_name}.
Candidate's profile (use ONLY this information):
- Role: {job_role}
- Stated experience: {experience}
- Selected skills: {skills}
Your task:
1. Welcome the candidate.
2. Acknowledge their experience: "I see you have about {experience} of experience."
3. Confirm the interview will focus on their selected skills.
4. Explain the structure: "The interview will consist of about {max_questions} questions."
5. Ask if they are ready to begin.
Do NOT add any extra details or assumptions. Keep it concise and conversational."#;

const DEFAULT_TECHNICAL_QUESTION: &str = r#"Generate a single, high-quality interview question for {role_prompt}.
Candidate's profile: experience {experience}, difficulty {difficulty}, skill to test: {skill}.
{difficulty_guidance}
The question must be practical and its complexity must match the experience level. Return ONLY the question."#;

const DEFAULT_BEHAVIORAL_QUESTION: &str = r#"Refine the question "Tell me about a challenging project" to be specific for a {job_role} with {experience} of experience.
Tie it to concepts like {behavioral_context}. Return only the refined question."#;

const DEFAULT_EVALUATE_ANSWER: &str = r#"Evaluate a candidate's answer. Context: role {job_role}, experience {experience}.
Question: "{question}"
Candidate's answer: "{answer}"
Provide the evaluation in this exact format, with each key on a new line. Be concise.
SCORE: [a number from 1-10]
STRENGTHS: [a brief summary]
IMPROVEMENTS: [a brief summary]"#;

const DEFAULT_ADAPTIVE_FEEDBACK: &str = r#"The candidate {candidate_name} just answered the question "{question}".
Their answer scored {score}/10. Strengths: {strengths}. Improvements: {improvements}.
Reply with one or two spoken sentences acknowledging the answer before moving on.
Be encouraging, do not reveal the score and do not ask a new question."#;

const DEFAULT_FEEDBACK_SUMMARY: &str = r#"You are providing end-of-interview feedback to {candidate_name}.
Synthesize the following log into a professional, constructive and encouraging spoken summary.
Instructions:
1. Start positively: "Thanks for walking me through those questions."
2. Mention one or two overall strengths.
3. Mention one or two general areas for improvement, constructively.
4. Refer ONLY to the questions in the log.
5. Keep the summary conversational and under 150 words.
Interview log:
---
{feedback_log}
---
Generate the spoken feedback summary for {candidate_name}."#;

const DEFAULT_CLOSING_REMARKS: &str = r#"You have just delivered detailed feedback to {candidate_name}, who interviewed for the {job_role} role and received an overall rating of {overall_rating}/10.
Generate the final closing remarks for the interview. The remarks should:
1. Thank the candidate for their time.
2. Mention next steps (e.g. "our team will review the feedback and be in touch").
3. End with a positive and encouraging closing statement.
Keep it professional and concise."#;

/// The set of templates a session renders its prompts from.
#[derive(Debug, Clone)]
pub struct PromptTemplates {
    templates: HashMap<String, String>,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        let templates = [
            (INTRODUCTION, DEFAULT_INTRODUCTION),
            (TECHNICAL_QUESTION, DEFAULT_TECHNICAL_QUESTION),
            (BEHAVIORAL_QUESTION, DEFAULT_BEHAVIORAL_QUESTION),
            (EVALUATE_ANSWER, DEFAULT_EVALUATE_ANSWER),
            (ADAPTIVE_FEEDBACK, DEFAULT_ADAPTIVE_FEEDBACK),
            (FEEDBACK_SUMMARY, DEFAULT_FEEDBACK_SUMMARY),
            (CLOSING_REMARKS, DEFAULT_CLOSING_REMARKS),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Self { templates }
    }
}

impl PromptTemplates {
    /// Built-in defaults with `overrides` layered on top.
    ///
    /// Keys that are not known template names are ignored.
    pub fn with_overrides(overrides: HashMap<String, String>) -> Self {
        let mut prompts = Self::default();
        for (name, body) in overrides {
            if let Some(slot) = prompts.templates.get_mut(&name) {
                *slot = body;
            } else {
                tracing::debug!(prompt = %name, "Ignoring unknown prompt template");
            }
        }
        prompts
    }

    /// Defaults overridden by every `<name>.md` file found in `dir`.
    ///
    /// A missing directory is not an error; the built-in defaults are used.
    pub fn load_dir(dir: &Path) -> anyhow::Result<Self> {
        if !dir.is_dir() {
            tracing::info!(path = %dir.display(), "No prompts directory; using built-in templates");
            return Ok(Self::default());
        }
        let mut overrides = HashMap::new();
        for entry in fs::read_dir(dir)
            .with_context(|| format!("Failed to read prompts directory {}", dir.display()))?
        {
            let path = entry?.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("md") {
                let name = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .context("Could not get file stem")?
                    .to_string();
                let body = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read prompt {}", path.display()))?;
                overrides.insert(name, body);
            }
        }
        tracing::info!(overrides = overrides.len(), "Prompt templates loaded");
        Ok(Self::with_overrides(overrides))
    }

    /// Renders template `name`, substituting `{key}` placeholders from `vars`.
    ///
    /// Substitution is single-pass, so placeholder-like text inside a value
    /// (a candidate's answer, say) is never expanded. Unknown placeholders are
    /// left as written.
    pub fn render(&self, name: &str, vars: &[(&str, &str)]) -> String {
        let template = self.templates.get(name).map(String::as_str).unwrap_or("");
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            match after.find('}') {
                Some(close) => {
                    let key = &after[..close];
                    match vars.iter().find(|(k, _)| *k == key) {
                        Some((_, value)) => out.push_str(value),
                        None => {
                            out.push('{');
                            out.push_str(key);
                            out.push('}');
                        }
                    }
                    rest = &after[close + 1..];
                }
                None => {
                    out.push_str(&rest[open..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }
}
