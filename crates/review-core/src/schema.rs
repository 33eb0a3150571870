//! Structural validation of `rubric.json`.
//!
//! Pure and synchronous. The resulting [`SchemaReport`] is attached to the
//! task's report unchanged.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::RubricCategory;

const REQUIRED_FIELDS: [&str; 5] = ["id", "description", "weight", "rationale", "dependent_on"];
const VALID_WEIGHTS: [&str; 2] = ["major", "minor"];
const VALID_SOURCES: [&str; 3] = ["prompt", "problem", "requirements"];
const MIN_ITEMS: usize = 2;

/// Outcome of a structural rubric check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaReport {
    pub valid: bool,
    pub messages: Vec<String>,
}

impl SchemaReport {
    pub fn valid() -> Self {
        Self {
            valid: true,
            messages: vec!["JSON structure is valid.".to_string()],
        }
    }

    fn from_errors(errors: Vec<String>) -> Self {
        if errors.is_empty() {
            Self::valid()
        } else {
            Self {
                valid: false,
                messages: errors,
            }
        }
    }
}

fn describe(value: Option<&Value>) -> String {
    match value {
        None => "None".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Renders `['a', 'b']`.
fn quoted_list<'a>(items: impl IntoIterator<Item = &'a str>) -> String {
    let quoted: Vec<String> = items.into_iter().map(|i| format!("'{i}'")).collect();
    format!("[{}]", quoted.join(", "))
}

/// Renders `{'a', 'b'}`.
fn quoted_set(items: &[&str]) -> String {
    let quoted: Vec<String> = items.iter().map(|i| format!("'{i}'")).collect();
    format!("{{{}}}", quoted.join(", "))
}

/// Validate the raw text of a rubric document.
pub fn validate_rubric(text: &str) -> SchemaReport {
    let data: Value = match serde_json::from_str(text) {
        Ok(data) => data,
        Err(e) => {
            return SchemaReport {
                valid: false,
                messages: vec![format!("Invalid JSON syntax: {e}")],
            }
        }
    };

    let Value::Object(root) = data else {
        return SchemaReport {
            valid: false,
            messages: vec!["Rubric root must be a JSON object.".to_string()],
        };
    };

    let mut errors = Vec::new();

    let missing_root: Vec<&str> = RubricCategory::ALL
        .iter()
        .map(|c| c.key())
        .filter(|k| !root.contains_key(*k))
        .collect();
    if !missing_root.is_empty() {
        errors.push(format!(
            "Missing required root keys: {}",
            quoted_list(missing_root)
        ));
    }

    for category in RubricCategory::ALL {
        let cat = category.key();
        let Some(items) = root.get(cat) else {
            continue;
        };
        let Value::Array(items) = items else {
            errors.push(format!("Value for '{cat}' must be a list."));
            continue;
        };
        if items.len() < MIN_ITEMS {
            errors.push(format!(
                "Category '{cat}' must contain at least {MIN_ITEMS} items."
            ));
        }

        for (i, item) in items.iter().enumerate() {
            let prefix = format!("[{cat}][{}]", i + 1);
            let Value::Object(item) = item else {
                errors.push(format!("{prefix} must be a JSON object."));
                continue;
            };
            validate_item(category, i + 1, &prefix, item, &mut errors);
        }
    }

    SchemaReport::from_errors(errors)
}

fn validate_item(
    category: RubricCategory,
    position: usize,
    prefix: &str,
    item: &Map<String, Value>,
    errors: &mut Vec<String>,
) {
    let cat = category.key();

    let mut missing: Vec<&str> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|f| !item.contains_key(*f))
        .collect();
    if !missing.is_empty() {
        missing.sort_unstable();
        errors.push(format!("{prefix} missing fields: {}", quoted_list(missing)));
    }

    let expected_id = format!("{cat}-{position}");
    if item.get("id").and_then(Value::as_str) != Some(expected_id.as_str()) {
        errors.push(format!(
            "{prefix} Invalid ID '{}'. Expected '{expected_id}'.",
            describe(item.get("id"))
        ));
    }

    match item.get("dependent_on") {
        None | Some(Value::Null) | Some(Value::Array(_)) => {}
        Some(_) => errors.push(format!("{prefix} 'dependent_on' must be a list.")),
    }

    if let Some(weight) = item.get("weight").filter(|w| !w.is_null()) {
        if !weight.as_str().is_some_and(|w| VALID_WEIGHTS.contains(&w)) {
            errors.push(format!(
                "{prefix} Invalid weight '{}'. Must be one of {}",
                describe(Some(weight)),
                quoted_set(&VALID_WEIGHTS)
            ));
        }
    }

    match (category, item.get("source")) {
        (RubricCategory::Functional, None) => {
            errors.push(format!("{prefix} missing required field 'source'."));
        }
        (RubricCategory::Functional, Some(source)) => {
            if !source.as_str().is_some_and(|s| VALID_SOURCES.contains(&s)) {
                errors.push(format!(
                    "{prefix} Invalid source '{}'. Must be one of {}",
                    describe(Some(source)),
                    quoted_set(&VALID_SOURCES)
                ));
            }
        }
        (_, Some(_)) => {
            errors.push(format!(
                "{prefix} Field 'source' is not applicable to '{cat}'."
            ));
        }
        (_, None) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(cat: &str, n: usize) -> Value {
        let mut v = json!({
            "id": format!("{cat}-{n}"),
            "description": "d",
            "weight": "major",
            "rationale": "r",
            "dependent_on": []
        });
        if cat == "functional" {
            v["source"] = json!("prompt");
        }
        v
    }

    fn valid_rubric() -> Value {
        json!({
            "functional": [item("functional", 1), item("functional", 2)],
            "robustness": [item("robustness", 1), item("robustness", 2)],
            "style": [item("style", 1), item("style", 2)],
        })
    }

    #[test]
    fn test_valid_rubric() {
        let report = validate_rubric(&valid_rubric().to_string());
        assert!(report.valid);
        assert_eq!(report.messages, vec!["JSON structure is valid."]);
    }

    #[test]
    fn test_invalid_json() {
        let report = validate_rubric("{oops");
        assert!(!report.valid);
        assert!(report.messages[0].starts_with("Invalid JSON syntax:"));
    }

    #[test]
    fn test_missing_root_and_short_category() {
        let report = validate_rubric(&json!({"functional": [item("functional", 1)]}).to_string());
        assert!(!report.valid);
        assert!(report
            .messages
            .contains(&"Missing required root keys: ['robustness', 'style']".to_string()));
        assert!(report
            .messages
            .contains(&"Category 'functional' must contain at least 2 items.".to_string()));
    }

    #[test]
    fn test_item_rules() {
        let mut rubric = valid_rubric();
        rubric["functional"][0]["id"] = json!("functional-7");
        rubric["functional"][1]
            .as_object_mut()
            .unwrap()
            .remove("source");
        rubric["robustness"][0]["weight"] = json!("huge");
        rubric["robustness"][1]["dependent_on"] = json!("functional-1");
        rubric["style"][0]["source"] = json!("prompt");
        rubric["style"][1].as_object_mut().unwrap().remove("rationale");

        let report = validate_rubric(&rubric.to_string());
        assert!(!report.valid);
        let expected = [
            "[functional][1] Invalid ID 'functional-7'. Expected 'functional-1'.",
            "[functional][2] missing required field 'source'.",
            "[robustness][1] Invalid weight 'huge'. Must be one of {'major', 'minor'}",
            "[robustness][2] 'dependent_on' must be a list.",
            "[style][1] Field 'source' is not applicable to 'style'.",
            "[style][2] missing fields: ['rationale']",
        ];
        for message in expected {
            assert!(
                report.messages.iter().any(|m| m == message),
                "missing message: {message}\n{:?}",
                report.messages
            );
        }
    }

    #[test]
    fn test_bad_source_value() {
        let mut rubric = valid_rubric();
        rubric["functional"][0]["source"] = json!("vibes");
        let report = validate_rubric(&rubric.to_string());
        assert_eq!(
            report.messages,
            vec!["[functional][1] Invalid source 'vibes'. Must be one of {'prompt', 'problem', 'requirements'}"]
        );
    }

    #[test]
    fn test_missing_fields_are_sorted() {
        let mut rubric = valid_rubric();
        let first = rubric["robustness"][0].as_object_mut().unwrap();
        first.remove("weight");
        first.remove("id");
        first.remove("dependent_on");

        let report = validate_rubric(&rubric.to_string());
        assert_eq!(
            report.messages,
            vec![
                "[robustness][1] missing fields: ['dependent_on', 'id', 'weight']",
                "[robustness][1] Invalid ID 'None'. Expected 'robustness-1'.",
            ]
        );
    }

    #[test]
    fn test_non_list_category() {
        let mut rubric = valid_rubric();
        rubric["style"] = json!({"id": "style-1"});
        let report = validate_rubric(&rubric.to_string());
        assert_eq!(report.messages, vec!["Value for 'style' must be a list."]);
    }
}
