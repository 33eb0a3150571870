//! The fixed catalog of analysis checks.
//!
//! A [`CheckSpec`] pairs an instruction with an input template whose `{field}`
//! placeholders name the artifact fields it reads. [`CheckSet::plan`] filters
//! the catalog against one task's artifacts and renders every input up front,
//! so execution only deals in ready-to-send text.

use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::domain::artifact::pretty_json;
use crate::domain::{ArtifactField, ArtifactSet, CheckKind, RubricCategory};

use ArtifactField::{
    FunctionalRubric, Interface, ProblemStatement, PromptStatement, Requirements,
    RobustnessRubric, StyleRubric, TestPatch,
};

/// One named analysis instruction applied to a task's artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckSpec {
    pub name: &'static str,
    pub instruction: &'static str,
    pub template: &'static str,
    /// Artifact fields substituted into `template`.
    pub fields: &'static [ArtifactField],
}

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{([a-z_]+)\}").expect("valid placeholder regex"))
}

impl CheckSpec {
    /// Render the input document for one task.
    ///
    /// Substitution is single-pass, so placeholder-like text inside artifact
    /// contents is never expanded. Braces that do not name a declared field
    /// are left as written.
    pub fn render(&self, artifacts: &ArtifactSet) -> String {
        placeholder_regex()
            .replace_all(self.template, |caps: &Captures<'_>| {
                let key = &caps[1];
                match self.fields.iter().find(|f| f.key() == key) {
                    Some(field) => artifacts.render_field(*field).into_owned(),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}

/// Per-category rubric compliance check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryCheck {
    pub category: RubricCategory,
    pub instruction: &'static str,
}

impl CategoryCheck {
    pub fn name(&self) -> String {
        format!("{}_rubric", self.category.key())
    }

    pub fn render(&self, artifacts: &ArtifactSet) -> String {
        format!(
            "Here's the file you need to validate:\n\n<rubrics>\n{}\n</rubrics>",
            pretty_json(artifacts.rubric_items(self.category))
        )
    }
}

/// A check bound to one task, with its input already rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedCheck {
    pub name: String,
    pub kind: CheckKind,
    pub instruction: &'static str,
    pub input: String,
}

const FAIRNESS_CHECKS: [CheckSpec; 14] = [
    CheckSpec {
        name: "FLAG_UNFAIR_TEST",
        instruction: include_str!("../prompts/flag_unfair_test.md"),
        template: include_str!("../prompts/test_filter_constructs_files.txt"),
        fields: &[TestPatch],
    },
    CheckSpec {
        name: "SCHEMA_VALIDATION",
        instruction: include_str!("../prompts/schema_validation.md"),
        template: include_str!("../prompts/schema_validation_files.txt"),
        fields: &[Interface, Requirements, PromptStatement, ProblemStatement],
    },
    CheckSpec {
        name: "META_FILE_IMPL_LEAK",
        instruction: include_str!("../prompts/meta_file_impl_leak.md"),
        template: include_str!("../prompts/meta_file_impl_leak_files.txt"),
        fields: &[PromptStatement, ProblemStatement],
    },
    CheckSpec {
        name: "SUFFICIENT_REQ_CHECK",
        instruction: include_str!("../prompts/sufficient_req_check.md"),
        template: include_str!("../prompts/sufficient_req_check_files.txt"),
        fields: &[TestPatch, Interface, Requirements],
    },
    CheckSpec {
        name: "META_FILES_ALIGNMENT",
        instruction: include_str!("../prompts/meta_files_alignment.md"),
        template: include_str!("../prompts/meta_files_alignment_files.txt"),
        fields: &[PromptStatement, ProblemStatement, Requirements],
    },
    CheckSpec {
        name: "PROBLEM_STATEMENT_TEST_ALIGNMENT",
        instruction: include_str!("../prompts/problem_statement_test_alignment.md"),
        template: include_str!("../prompts/problem_statement_test_alignment_files.txt"),
        fields: &[ProblemStatement, TestPatch],
    },
    CheckSpec {
        name: "REQUIREMENTS_TEST_ALIGNMENT",
        instruction: include_str!("../prompts/requirements_test_alignment.md"),
        template: include_str!("../prompts/requirements_test_alignment_files.txt"),
        fields: &[Requirements, TestPatch],
    },
    CheckSpec {
        name: "REQUIREMENTS_INTERFACE_ALIGNMENT",
        instruction: include_str!("../prompts/requirements_interface_alignment.md"),
        template: include_str!("../prompts/requirements_interface_alignment_files.txt"),
        fields: &[Interface, Requirements],
    },
    CheckSpec {
        name: "FUNCTIONAL_RUBRIC_ALIGNMENT",
        instruction: include_str!("../prompts/rubric_alignment.md"),
        template: include_str!("../prompts/functional_rubric_alignment_files.txt"),
        fields: &[FunctionalRubric, PromptStatement, Requirements, ProblemStatement],
    },
    CheckSpec {
        name: "ROBUSTNESS_RUBRIC_ALIGNMENT",
        instruction: include_str!("../prompts/rubric_alignment.md"),
        template: include_str!("../prompts/robustness_rubric_alignment_files.txt"),
        fields: &[RobustnessRubric, PromptStatement, Requirements, ProblemStatement],
    },
    CheckSpec {
        name: "FUNCTIONAL_RUBRIC_VALIDATION",
        instruction: include_str!("../prompts/rubric_validation.md"),
        template: include_str!("../prompts/functional_rubric_validation_files.txt"),
        fields: &[FunctionalRubric],
    },
    CheckSpec {
        name: "ROBUSTNESS_RUBRIC_VALIDATION",
        instruction: include_str!("../prompts/rubric_validation.md"),
        template: include_str!("../prompts/robustness_rubric_validation_files.txt"),
        fields: &[RobustnessRubric],
    },
    CheckSpec {
        name: "STYLE_RUBRIC_VALIDATION",
        instruction: include_str!("../prompts/rubric_validation.md"),
        template: include_str!("../prompts/style_rubric_validation_files.txt"),
        fields: &[StyleRubric],
    },
    CheckSpec {
        name: "TEST_FILTER_CONSTRUCTS",
        instruction: include_str!("../prompts/test_filter_constructs.md"),
        template: include_str!("../prompts/test_filter_constructs_files.txt"),
        fields: &[TestPatch],
    },
];

const CATEGORY_CHECKS: [CategoryCheck; 3] = [
    CategoryCheck {
        category: RubricCategory::Functional,
        instruction: include_str!("../prompts/category_functional.md"),
    },
    CategoryCheck {
        category: RubricCategory::Robustness,
        instruction: include_str!("../prompts/category_robustness.md"),
    },
    CategoryCheck {
        category: RubricCategory::Style,
        instruction: include_str!("../prompts/category_style.md"),
    },
];

/// Ordered catalog of checks. Shared read-only across every task in a run.
#[derive(Debug, Clone)]
pub struct CheckSet {
    fairness: Vec<CheckSpec>,
    categories: Vec<CategoryCheck>,
}

impl CheckSet {
    /// The full production catalog.
    pub fn standard() -> Self {
        Self::new(FAIRNESS_CHECKS.to_vec(), CATEGORY_CHECKS.to_vec())
    }

    pub fn new(fairness: Vec<CheckSpec>, categories: Vec<CategoryCheck>) -> Self {
        Self {
            fairness,
            categories,
        }
    }

    pub fn fairness(&self) -> &[CheckSpec] {
        &self.fairness
    }

    /// Bind the catalog to one task.
    ///
    /// Fairness checks always apply. A category check applies only when the
    /// task's rubric has items in that category. Output is in declaration
    /// order: fairness checks first, then categories.
    pub fn plan(&self, artifacts: &ArtifactSet) -> Vec<PlannedCheck> {
        let fairness = self.fairness.iter().map(|spec| PlannedCheck {
            name: spec.name.to_string(),
            kind: CheckKind::Fairness,
            instruction: spec.instruction,
            input: spec.render(artifacts),
        });

        let categories = self
            .categories
            .iter()
            .filter(|check| !artifacts.rubric_items(check.category).is_empty())
            .map(|check| PlannedCheck {
                name: check.name(),
                kind: CheckKind::Rubric(check.category),
                instruction: check.instruction,
                input: check.render(artifacts),
            });

        fairness.chain(categories).collect()
    }
}

impl Default for CheckSet {
    fn default() -> Self {
        Self::standard()
    }
}
