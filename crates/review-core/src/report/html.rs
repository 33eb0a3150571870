//! Standalone HTML report for one task.

use std::fmt::Write as _;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::{Captures, Regex};

use crate::domain::{CheckStatus, ResultBundle, RubricResult};
use crate::schema::SchemaReport;

const REPORT_CSS: &str = r#"<style>
.rpt { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif; line-height: 1.6; }
.rpt h1 { font-size: 1.5em; margin-bottom: 4px; }
.rpt h2 { font-size: 1.2em; margin-top: 24px; padding-bottom: 4px; border-bottom: 2px solid #888; }
.rpt h3 { font-size: 1.05em; margin-top: 18px; }
.badge       { padding: 2px 10px; border-radius: 4px; font-weight: 700; font-size: .85em; display: inline-block; }
.badge-pass  { background: #d1fae5; color: #065f46; border: 1px solid #065f46; }
.badge-fail  { background: #fee2e2; color: #991b1b; border: 1px solid #991b1b; }
.badge-unk   { background: #e5e7eb; color: #374151; border: 1px solid #6b7280; }
.rpt table   { width: 100%; border-collapse: collapse; margin-top: 8px; }
.rpt th      { text-align: left; padding: 8px 10px; background: #374151; color: #f9fafb; border: 1px solid #4b5563; }
.rpt td      { padding: 8px 10px; border: 1px solid #d1d5db; vertical-align: top; }
.rpt tbody tr:nth-child(even) td { background: rgba(0,0,0,.03); }
.rpt summary { cursor: pointer; font-weight: 600; color: #2563eb; padding: 2px 0; }
.fb { font-family: "SFMono-Regular", Consolas, "Liberation Mono", Menlo, monospace; font-size: .88em;
      padding: 10px 12px; border-radius: 6px; margin-top: 4px; background: rgba(0,0,0,.06); border: 1px solid rgba(0,0,0,.12); }
.fb .ic { background: rgba(0,0,0,.08); padding: 1px 5px; border-radius: 3px; font-size: .95em; }
.fb ul { margin: 4px 0 4px 18px; padding: 0; }
.summary-bar { display: flex; gap: 6px; align-items: center; margin: 6px 0 2px; }
.summary-bar .cnt { font-weight: 600; font-size: .95em; }
.parse-err { color: #dc2626; font-weight: 600; margin: 6px 0; }
.rpt-meta { background: #f3f4f6; border: 1px solid #d1d5db; border-radius: 6px; padding: 10px 14px; margin-bottom: 16px; font-size: .92em; }
.rpt-meta span { margin-right: 20px; }
.rpt-meta .label { color: #6b7280; }
.schema-pass { color: #065f46; font-weight: 600; }
.schema-fail { color: #991b1b; font-weight: 600; }
.schema-errors { margin: 4px 0 0 18px; padding: 0; }
.schema-errors li { font-size: .9em; color: #991b1b; margin-bottom: 2px; }
</style>"#;

struct MarkdownPatterns {
    code: Regex,
    bold: Regex,
    list_block: Regex,
    list_item: Regex,
    rendered_list: Regex,
}

fn patterns() -> &'static MarkdownPatterns {
    static PATTERNS: OnceLock<MarkdownPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| MarkdownPatterns {
        code: Regex::new(r"`([^`\n]+)`").expect("valid code regex"),
        bold: Regex::new(r"\*\*(.+?)\*\*").expect("valid bold regex"),
        list_block: Regex::new(r"(?m)(?:^[-*][ \t]+.+$\n?)+").expect("valid list regex"),
        list_item: Regex::new(r"(?m)^[-*][ \t]+(.+)$").expect("valid item regex"),
        rendered_list: Regex::new(r"(?s)<ul>.*?</ul>").expect("valid ul regex"),
    })
}

/// Escape text for inclusion in HTML.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Convert markdown-ish model output to safe HTML.
///
/// Handles inline code, bold and `-`/`*` bullet lists; everything else is
/// escaped text with line breaks preserved.
pub fn md_to_html(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let p = patterns();

    let text = escape_html(text);
    let text = p.code.replace_all(&text, r#"<code class="ic">$1</code>"#);
    let text = p.bold.replace_all(&text, "<strong>$1</strong>");
    let text = p.list_block.replace_all(&text, |block: &Captures<'_>| {
        let items: String = p
            .list_item
            .captures_iter(&block[0])
            .map(|item| format!("<li>{}</li>", &item[1]))
            .collect();
        format!("<ul>{items}</ul>")
    });

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for list in p.rendered_list.find_iter(&text) {
        out.push_str(&text[last..list.start()].replace('\n', "<br>"));
        out.push_str(list.as_str());
        last = list.end();
    }
    out.push_str(&text[last..].replace('\n', "<br>"));
    out
}

fn badge(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Pass => r#"<span class="badge badge-pass">PASS</span>"#,
        CheckStatus::Fail => r#"<span class="badge badge-fail">FAIL</span>"#,
        CheckStatus::Unknown => r#"<span class="badge badge-unk">UNKNOWN</span>"#,
    }
}

fn verdict_badge(status: &str) -> String {
    let upper = status.trim().to_uppercase();
    if upper.contains("PASS") {
        badge(CheckStatus::Pass).to_string()
    } else if upper.contains("FAIL") {
        badge(CheckStatus::Fail).to_string()
    } else {
        format!(r#"<span class="badge badge-unk">{}</span>"#, escape_html(&upper))
    }
}

fn render_schema(h: &mut String, schema: &SchemaReport) {
    h.push_str("<h2>0 - Schema Validation</h2>\n");
    if schema.valid {
        h.push_str("<p class=\"schema-pass\">VALID</p>\n");
    } else {
        h.push_str("<p class=\"schema-fail\">INVALID</p>\n");
    }
    if !schema.messages.is_empty() {
        h.push_str("<ul class=\"schema-errors\">");
        for message in &schema.messages {
            let _ = write!(h, "<li>{}</li>", md_to_html(message));
        }
        h.push_str("</ul>\n");
    }
}

fn render_rubric(h: &mut String, result: &RubricResult) {
    let _ = writeln!(h, "<h3>{}</h3>", result.category.title());
    match &result.verdicts {
        Ok(items) => {
            let (passed, total) = result.pass_count().unwrap_or((0, items.len()));
            let _ = writeln!(
                h,
                "<div class=\"summary-bar\"><span class=\"cnt\">{passed}/{total} Passed</span></div>"
            );
            h.push_str(
                "<table><thead><tr><th style='width:10%'>ID</th><th style='width:10%'>Status</th>\
                 <th>Feedback</th></tr></thead><tbody>\n",
            );
            for item in items {
                let mut parts = Vec::new();
                if !item.feedback.is_empty() {
                    parts.push(item.feedback.clone());
                }
                if !item.proposed_fix.is_empty() {
                    parts.push(format!("**Proposed fix:** {}", item.proposed_fix));
                }
                let combined = if parts.is_empty() {
                    "\u{2014}".to_string()
                } else {
                    parts.join("\n")
                };
                let _ = writeln!(
                    h,
                    "<tr><td>{}</td><td>{}</td><td><div class=\"fb\">{}</div></td></tr>",
                    escape_html(&item.id),
                    verdict_badge(&item.status),
                    md_to_html(&combined)
                );
            }
            h.push_str("</tbody></table>\n");
        }
        Err(e) => {
            let _ = writeln!(
                h,
                "<p class=\"parse-err\">Failed to parse response for {}: {}</p>",
                result.category,
                escape_html(e)
            );
            let _ = writeln!(
                h,
                "<details><summary>Raw output</summary><div class=\"fb\">{}</div></details>",
                md_to_html(result.check.raw_text())
            );
        }
    }
}

/// Render the full report document for one task.
pub fn render_html_report(bundle: &ResultBundle, generated_at: DateTime<Utc>) -> String {
    let mut h = format!(
        "<!DOCTYPE html><html><head><meta charset='utf-8'><title>Validation Report</title>\
         {REPORT_CSS}</head><body>\n<div class=\"rpt\">\n<h1>Unified Validation Report</h1>\n"
    );

    let _ = writeln!(
        h,
        "<div class=\"rpt-meta\"><span><span class=\"label\">User:</span> <strong>{}</strong></span>\
         <span><span class=\"label\">Folder:</span> <strong>{}</strong></span>\
         <span><span class=\"label\">Generated:</span> {}</span></div>",
        escape_html(&bundle.task.owner),
        escape_html(&bundle.task.folder),
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    if let Some(error) = &bundle.preparation_error {
        let _ = writeln!(
            h,
            "<p class=\"parse-err\">Preparation failed: {}</p>",
            escape_html(error)
        );
        h.push_str("</div>\n</body></html>");
        return h;
    }

    if let Some(schema) = &bundle.schema {
        render_schema(&mut h, schema);
    }

    h.push_str("<h2>1 - High-Level Fairness Checks</h2>\n");
    h.push_str(
        "<table><thead><tr><th style='width:22%'>Check</th><th style='width:10%'>Status</th>\
         <th>Details</th></tr></thead><tbody>\n",
    );
    for check in &bundle.fairness {
        let _ = writeln!(
            h,
            "<tr><td><strong>{}</strong></td><td>{}</td><td><details><summary>View Feedback</summary>\
             <div class=\"fb\">{}</div></details></td></tr>",
            escape_html(&check.name),
            badge(check.status),
            md_to_html(check.raw_text())
        );
    }
    h.push_str("</tbody></table>\n");

    h.push_str("<h2>2 - Rubric Compliance</h2>\n");
    for result in &bundle.rubric {
        render_rubric(&mut h, result);
    }

    h.push_str("</div>\n</body></html>");
    h
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CheckKind, DispatchOutcome, RubricCategory, TaskId};

    #[test]
    fn test_md_to_html() {
        assert_eq!(md_to_html(""), "");
        assert_eq!(
            md_to_html("Use `a<b>` and **bold**"),
            "Use <code class=\"ic\">a&lt;b&gt;</code> and <strong>bold</strong>"
        );
        assert_eq!(
            md_to_html("Issues:\n- one\n- two\nDone"),
            "Issues:<br><ul><li>one</li><li>two</li></ul>Done"
        );
    }

    fn bundle() -> ResultBundle {
        ResultBundle::assemble(
            TaskId::new("own<er>", "T", "folder"),
            SchemaReport::valid(),
            vec![
                (
                    "FLAG_UNFAIR_TEST".into(),
                    CheckKind::Fairness,
                    DispatchOutcome::Completed("**PASS**\nAll fair".into()),
                ),
                (
                    "style_rubric".into(),
                    CheckKind::Rubric(RubricCategory::Style),
                    DispatchOutcome::Completed(
                        r#"[{"id": "style-1", "status": "FAIL", "feedback": "vague", "proposed_fix": "be specific"}]"#
                            .into(),
                    ),
                ),
                (
                    "functional_rubric".into(),
                    CheckKind::Rubric(RubricCategory::Functional),
                    DispatchOutcome::RemoteError("Error 500: boom".into()),
                ),
            ],
        )
    }

    #[test]
    fn test_render_report_sections() {
        let html = render_html_report(&bundle(), Utc::now());
        assert!(html.contains("own&lt;er&gt;"));
        assert!(html.contains("<p class=\"schema-pass\">VALID</p>"));
        assert!(html.contains("<strong>FLAG_UNFAIR_TEST</strong>"));
        assert!(html.contains("0/1 Passed"));
        assert!(html.contains("<strong>Proposed fix:</strong> be specific"));
        assert!(html.contains("Failed to parse response for functional"));
        assert!(html.contains("Error 500: boom"));
    }

    #[test]
    fn test_render_failed_bundle() {
        let bundle = ResultBundle::failed(TaskId::new("x", "T", "f"), "task folder not found: f");
        let html = render_html_report(&bundle, Utc::now());
        assert!(html.contains("Preparation failed: task folder not found: f"));
        assert!(!html.contains("Fairness Checks"));
    }
}
