use crate::error::InterviewError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The candidate being interviewed. Immutable once handed to a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateProfile {
    pub name: String,
    /// Free-text experience band, e.g. "Senior (5-8 years)".
    pub experience: String,
    /// Skills to probe, in priority order.
    #[serde(default)]
    pub skills: Vec<String>,
}

impl CandidateProfile {
    pub fn new(name: impl Into<String>, experience: impl Into<String>, skills: Vec<String>) -> Self {
        Self {
            name: name.into(),
            experience: experience.into(),
            skills,
        }
    }

    /// Rejects profiles that cannot drive an interview.
    pub fn validate(&self) -> Result<(), InterviewError> {
        if self.name.trim().is_empty() {
            return Err(InterviewError::configuration("candidate name is required"));
        }
        Ok(())
    }
}

/// Question difficulty band, derived once from the declared experience.
/// Serialized as its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    #[serde(rename = "Easy-to-Medium")]
    EasyToMedium,
    Medium,
    Hard,
    #[serde(rename = "Expert/Architectural")]
    Expert,
}

impl Difficulty {
    /// Maps an experience descriptor onto a band by case-insensitive substring.
    ///
    /// The checks run in order, so "junior to mid-level" is `EasyToMedium`.
    /// Anything unmatched (including "lead" or "principal") is `Expert`.
    pub fn from_experience(experience: &str) -> Self {
        let exp = experience.to_lowercase();
        if exp.contains("fresher") {
            Difficulty::Easy
        } else if exp.contains("junior") {
            Difficulty::EasyToMedium
        } else if exp.contains("mid-level") {
            Difficulty::Medium
        } else if exp.contains("senior") {
            Difficulty::Hard
        } else {
            Difficulty::Expert
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::EasyToMedium => "Easy-to-Medium",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
            Difficulty::Expert => "Expert/Architectural",
        }
    }

    /// What kind of question suits this band; embedded in technical-question prompts.
    pub fn question_guidance(&self) -> &'static str {
        match self {
            Difficulty::Easy => {
                "Ask an introductory, factual question about fundamentals and definitions."
            }
            Difficulty::EasyToMedium => {
                "Ask a practical question about everyday usage with a small applied twist."
            }
            Difficulty::Medium => {
                "Ask a scenario-based question that requires applying the skill to a realistic problem."
            }
            Difficulty::Hard => {
                "Ask an in-depth question about internals, debugging or performance in production."
            }
            Difficulty::Expert => {
                "Ask an architecture or system-design question that forces trade-offs to be weighed."
            }
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
