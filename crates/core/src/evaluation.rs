use serde::{Deserialize, Serialize};
use tracing::debug;

const NOT_AVAILABLE: &str = "N/A";
const MAX_SCORE: u8 = 10;

/// The model's judgement of a single answer.
///
/// `score` is 1–10 for a parsed evaluation and 0 when the response could not
/// be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub score: u8,
    pub strengths: String,
    pub improvements: String,
}

impl Default for Evaluation {
    fn default() -> Self {
        Self {
            score: 0,
            strengths: NOT_AVAILABLE.to_string(),
            improvements: NOT_AVAILABLE.to_string(),
        }
    }
}

/// Parses a `SCORE:` / `STRENGTHS:` / `IMPROVEMENTS:` response.
///
/// Lines are scanned independently, in any order. Each field that cannot be
/// read keeps its default, so this never fails.
pub fn parse_feedback(text: &str) -> Evaluation {
    let mut evaluation = Evaluation::default();

    for line in text.lines() {
        let line = strip_decoration(line);
        if let Some(rest) = line.strip_prefix("SCORE:") {
            match first_integer(rest) {
                Some(score) => evaluation.score = score.min(u64::from(MAX_SCORE)) as u8,
                None => debug!(line = %line, "SCORE line without a number"),
            }
        } else if line.starts_with("STRENGTHS:") {
            if let Some(value) = value_after_colon(line) {
                evaluation.strengths = value;
            }
        } else if line.starts_with("IMPROVEMENTS:") {
            if let Some(value) = value_after_colon(line) {
                evaluation.improvements = value;
            }
        }
    }

    evaluation
}

/// Drops surrounding whitespace and markdown emphasis such as `**SCORE:**`.
fn strip_decoration(line: &str) -> &str {
    line.trim().trim_start_matches('*').trim_start()
}

fn value_after_colon(line: &str) -> Option<String> {
    let (_, value) = line.split_once(':')?;
    let value = value.trim().trim_start_matches('*').trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// The first run of ASCII digits in `s`, if it fits in a `u64`.
fn first_integer(s: &str) -> Option<u64> {
    let start = s.find(|c: char| c.is_ascii_digit())?;
    let digits: String = s[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
