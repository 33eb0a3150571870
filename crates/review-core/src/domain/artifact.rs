//! Task artifact set: the flat key -> text mapping a task is reviewed against.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Rubric categories. Each one gets its own compliance check when non-empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RubricCategory {
    Functional,
    Robustness,
    Style,
}

impl RubricCategory {
    /// All categories in report order.
    pub const ALL: [RubricCategory; 3] = [
        RubricCategory::Functional,
        RubricCategory::Robustness,
        RubricCategory::Style,
    ];

    /// Key of the category inside `rubric.json`.
    pub fn key(self) -> &'static str {
        match self {
            RubricCategory::Functional => "functional",
            RubricCategory::Robustness => "robustness",
            RubricCategory::Style => "style",
        }
    }

    /// Capitalised name for report headings.
    pub fn title(self) -> &'static str {
        match self {
            RubricCategory::Functional => "Functional",
            RubricCategory::Robustness => "Robustness",
            RubricCategory::Style => "Style",
        }
    }
}

impl fmt::Display for RubricCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A named field of the artifact set that a check can consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactField {
    RubricJson,
    PromptStatement,
    ProblemStatement,
    Interface,
    Requirements,
    TestPatch,
    FunctionalRubric,
    RobustnessRubric,
    StyleRubric,
}

impl ArtifactField {
    /// Fields backed by a file in the task folder, with their relative paths.
    pub const FILES: [(ArtifactField, &'static str); 6] = [
        (ArtifactField::RubricJson, "rubric/rubric.json"),
        (ArtifactField::PromptStatement, "prompt_statement.md"),
        (ArtifactField::ProblemStatement, "problem_statement.md"),
        (ArtifactField::Interface, "interface.md"),
        (ArtifactField::Requirements, "requirements.json"),
        (ArtifactField::TestPatch, "test.patch"),
    ];

    /// Placeholder name used in input templates (`{key}`).
    pub fn key(self) -> &'static str {
        match self {
            ArtifactField::RubricJson => "rubric_json",
            ArtifactField::PromptStatement => "prompt_statement_md",
            ArtifactField::ProblemStatement => "problem_statement_md",
            ArtifactField::Interface => "interface_md",
            ArtifactField::Requirements => "requirements_json",
            ArtifactField::TestPatch => "test_patch",
            ArtifactField::FunctionalRubric => "functional_rubric",
            ArtifactField::RobustnessRubric => "robustness_rubric",
            ArtifactField::StyleRubric => "style_rubric",
        }
    }

    /// The rubric category a derived field is extracted from, if any.
    pub fn rubric_category(self) -> Option<RubricCategory> {
        match self {
            ArtifactField::FunctionalRubric => Some(RubricCategory::Functional),
            ArtifactField::RobustnessRubric => Some(RubricCategory::Robustness),
            ArtifactField::StyleRubric => Some(RubricCategory::Style),
            _ => None,
        }
    }
}

/// The artifacts of one task.
///
/// Built once by the preparation step and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ArtifactSet {
    files: BTreeMap<String, String>,
    #[serde(skip)]
    rubric: BTreeMap<RubricCategory, Vec<Value>>,
}

impl ArtifactSet {
    /// Build from the raw file mapping, parsing `rubric_json` into categories.
    ///
    /// A rubric that fails to parse is treated as empty; the structural
    /// validator reports the syntax error separately.
    pub fn from_files(files: BTreeMap<String, String>) -> Self {
        let raw = files
            .get(ArtifactField::RubricJson.key())
            .map(String::as_str)
            .unwrap_or_default();

        let mut rubric = BTreeMap::new();
        if !raw.trim().is_empty() {
            match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(map)) => {
                    for category in RubricCategory::ALL {
                        if let Some(Value::Array(items)) = map.get(category.key()) {
                            rubric.insert(category, items.clone());
                        }
                    }
                }
                Ok(_) => warn!("rubric.json is not a JSON object"),
                Err(e) => warn!(error = %e, "failed to parse rubric.json"),
            }
        }

        Self { files, rubric }
    }

    /// Raw text of a file-backed field, or an empty string when absent.
    pub fn text(&self, field: ArtifactField) -> &str {
        self.files
            .get(field.key())
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Value substituted for `{field}` in input templates.
    ///
    /// Rubric category fields render as pretty-printed JSON lists.
    pub fn render_field(&self, field: ArtifactField) -> Cow<'_, str> {
        match field.rubric_category() {
            Some(category) => Cow::Owned(pretty_json(self.rubric_items(category))),
            None => Cow::Borrowed(self.text(field)),
        }
    }

    /// Parsed rubric items for a category (empty when absent).
    pub fn rubric_items(&self, category: RubricCategory) -> &[Value] {
        self.rubric
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Categories with at least one rubric item, in report order.
    pub fn active_categories(&self) -> Vec<RubricCategory> {
        RubricCategory::ALL
            .into_iter()
            .filter(|c| !self.rubric_items(*c).is_empty())
            .collect()
    }

    /// The underlying flat mapping.
    pub fn files(&self) -> &BTreeMap<String, String> {
        &self.files
    }
}

/// Two-space indented JSON, matching what analysis prompts were written for.
pub(crate) fn pretty_json(items: &[Value]) -> String {
    serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_with_rubric(rubric: &str) -> ArtifactSet {
        let mut files = BTreeMap::new();
        files.insert("rubric_json".to_string(), rubric.to_string());
        files.insert("test_patch".to_string(), "+ assert x".to_string());
        ArtifactSet::from_files(files)
    }

    #[test]
    fn test_rubric_categories_are_extracted() {
        let set = set_with_rubric(
            r#"{"functional": [{"id": "functional-1"}], "robustness": [], "style": [{"id": "style-1"}]}"#,
        );
        assert_eq!(set.rubric_items(RubricCategory::Functional).len(), 1);
        assert!(set.rubric_items(RubricCategory::Robustness).is_empty());
        assert_eq!(
            set.active_categories(),
            vec![RubricCategory::Functional, RubricCategory::Style]
        );
    }

    #[test]
    fn test_invalid_rubric_is_empty() {
        let set = set_with_rubric("{not json");
        assert!(set.active_categories().is_empty());
        assert_eq!(set.render_field(ArtifactField::FunctionalRubric), "[]");
    }

    #[test]
    fn test_render_field_pretty_prints_rubric() {
        let set = set_with_rubric(r#"{"style": [{"id": "style-1"}]}"#);
        let rendered = set.render_field(ArtifactField::StyleRubric);
        assert_eq!(rendered, "[\n  {\n    \"id\": \"style-1\"\n  }\n]");
    }

    #[test]
    fn test_missing_file_renders_empty() {
        let set = set_with_rubric("");
        assert_eq!(set.text(ArtifactField::Interface), "");
        assert_eq!(set.render_field(ArtifactField::TestPatch), "+ assert x");
    }
}
