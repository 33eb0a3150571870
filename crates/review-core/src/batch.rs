//! Batch input: a CSV file of `user_code,task_code,folder` rows.
//!
//! Fields are plain comma-separated values; surrounding whitespace and a
//! single pair of enclosing double quotes are stripped. Blank lines are
//! skipped. Rows come back in file order.

use std::path::Path;

use crate::domain::TaskId;
use crate::error::{BatchInputError, Result};

const COLUMNS: [&str; 3] = ["user_code", "task_code", "folder"];

fn unquote(field: &str) -> &str {
    let field = field.trim();
    field
        .strip_prefix('"')
        .and_then(|f| f.strip_suffix('"'))
        .unwrap_or(field)
}

/// Parse batch CSV text into tasks, in input order.
pub fn parse_batch(text: &str) -> std::result::Result<Vec<TaskId>, BatchInputError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line))
        .filter(|(_, line)| !line.trim().is_empty());

    let (_, header) = lines.next().ok_or(BatchInputError::Empty)?;
    let header: Vec<&str> = header.split(',').map(unquote).collect();

    let mut index = [0usize; 3];
    for (slot, column) in index.iter_mut().zip(COLUMNS) {
        *slot = header
            .iter()
            .position(|h| *h == column)
            .ok_or(BatchInputError::MissingColumn(column))?;
    }

    lines
        .map(|(line_no, line)| {
            let fields: Vec<&str> = line.split(',').map(unquote).collect();
            if fields.len() != header.len() {
                return Err(BatchInputError::FieldCount {
                    line: line_no,
                    expected: header.len(),
                    found: fields.len(),
                });
            }
            for (i, column) in index.iter().zip(COLUMNS) {
                if fields[*i].is_empty() {
                    return Err(BatchInputError::EmptyField {
                        line: line_no,
                        field: column,
                    });
                }
            }
            Ok(TaskId::new(fields[index[0]], fields[index[1]], fields[index[2]]))
        })
        .collect()
}

/// Read and parse a batch file.
pub async fn load_batch(path: &Path) -> Result<Vec<TaskId>> {
    let text = tokio::fs::read_to_string(path).await?;
    Ok(parse_batch(&text)?)
}
