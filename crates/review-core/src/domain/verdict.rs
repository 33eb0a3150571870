//! Verdict extraction from natural-language analysis responses.
//!
//! Both functions here are best-effort readings of model output. The status
//! classifier looks for a keyword on the first line only; it is a heuristic,
//! not a structural guarantee, and `Unknown` is a normal answer.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Derived status of one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckStatus {
    Pass,
    Fail,
    Unknown,
}

impl CheckStatus {
    pub fn label(self) -> &'static str {
        match self {
            CheckStatus::Pass => "PASS",
            CheckStatus::Fail => "FAIL",
            CheckStatus::Unknown => "UNKNOWN",
        }
    }
}

const PASS_KEYWORDS: [&str; 4] = ["PASS", "ALIGNED", "FAIR", "NO_VIOLATIONS"];
const FAIL_KEYWORDS: [&str; 3] = ["FAIL", "MISALIGNED", "UNFAIR"];

/// Classify a free-text response by keywords on its first line.
///
/// Pass keywords are checked first, so "MISALIGNED" (which contains
/// "ALIGNED") and "UNFAIR" (which contains "FAIR") classify as `Pass`.
pub fn classify_response(raw: &str) -> CheckStatus {
    let upper = raw.trim().to_uppercase();
    let first_line = upper.lines().next().unwrap_or_default();

    if PASS_KEYWORDS.iter().any(|k| first_line.contains(k)) {
        return CheckStatus::Pass;
    }
    if FAIL_KEYWORDS.iter().any(|k| first_line.contains(k)) {
        return CheckStatus::Fail;
    }
    CheckStatus::Unknown
}

/// One sub-item verdict from a rubric-category check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RubricVerdict {
    pub id: String,
    pub status: String,
    pub feedback: String,
    pub proposed_fix: String,
}

impl RubricVerdict {
    pub fn passed(&self) -> bool {
        self.status.to_uppercase() == "PASS"
    }
}

fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| Regex::new(r"(?m)^```(?:json)?|```$").expect("valid fence regex"))
}

/// Strip surrounding whitespace and markdown code fences from a response.
pub fn clean_json_response(text: &str) -> String {
    let clean = text.trim();
    fence_regex().replace_all(clean, "").trim().to_string()
}

fn value_to_text(value: Option<&Value>) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    }
}

/// Parse a rubric-category response into per-item verdicts.
///
/// The error string is meant for display next to the raw output.
pub fn parse_rubric_verdicts(raw: &str) -> Result<Vec<RubricVerdict>, String> {
    let cleaned = clean_json_response(raw);
    let value: Value = serde_json::from_str(&cleaned).map_err(|e| e.to_string())?;
    let Value::Array(items) = value else {
        return Err("Expected a JSON array".to_string());
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let Value::Object(map) = item else {
                return Err(format!("Item {} is not a JSON object", i + 1));
            };
            Ok(RubricVerdict {
                id: value_to_text(map.get("id")).unwrap_or_else(|| "\u{2014}".to_string()),
                status: value_to_text(map.get("status")).unwrap_or_else(|| "UNKNOWN".to_string()),
                feedback: value_to_text(map.get("feedback")).unwrap_or_default(),
                proposed_fix: value_to_text(map.get("proposed_fix")).unwrap_or_default(),
            })
        })
        .collect()
}
