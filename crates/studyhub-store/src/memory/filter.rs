//! Free-text filter evaluation against task fields.

use studyhub_core::types::filter::{FilterField, FilterOp};
use studyhub_entity::task::Task;

/// Whether a task satisfies every filter condition (AND semantics).
pub(crate) fn task_matches_all(task: &Task, fields: &[FilterField]) -> bool {
    fields.iter().all(|field| task_matches(task, field))
}

/// Evaluate a single condition against a task field. Unknown field names
/// never match; comparisons on non-numeric fields fall back to string
/// ordering.
fn task_matches(task: &Task, field: &FilterField) -> bool {
    let Some(actual) = field_value(task, &field.field) else {
        return false;
    };

    match field.op {
        FilterOp::Eq => actual.eq_ignore_ascii_case(&field.value),
        FilterOp::Gt | FilterOp::Lt => compare(&actual, &field.value, field.op),
    }
}

fn compare(actual: &str, expected: &str, op: FilterOp) -> bool {
    let ordering = match (actual.parse::<i64>(), expected.parse::<i64>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        _ => actual.cmp(expected),
    };
    match op {
        FilterOp::Gt => ordering.is_gt(),
        FilterOp::Lt => ordering.is_lt(),
        FilterOp::Eq => ordering.is_eq(),
    }
}

fn field_value(task: &Task, field: &str) -> Option<String> {
    match field {
        "name" => Some(task.name.clone()),
        "type" => Some(format!("{:?}", task.assessment_type).to_uppercase()),
        "status" => Some(task.status.to_string()),
        "completed" => Some(task.completed.to_string()),
        "order" => Some(task.order.to_string()),
        "n_questions" => task.n_questions.map(|n| n.to_string()),
        "is_demo" => Some(task.is_demo.to_string()),
        "is_clinical" => Some(task.is_clinical.to_string()),
        "show_in_calendar" => Some(task.show_in_calendar.to_string()),
        "timestamp" => Some(task.timestamp.timestamp_millis().to_string()),
        _ => None,
    }
}
