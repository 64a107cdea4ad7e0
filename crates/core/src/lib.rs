pub mod agent;
pub mod domain;
pub mod error;
pub mod evaluation;
pub mod llm_client;
pub mod profile;
pub mod prompts;
pub mod session;
pub mod voice;

pub use error::InterviewError;
pub use session::{InterviewSession, NextQuestion, SessionOptions};
