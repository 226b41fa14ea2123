#![forbid(unsafe_code)]

pub mod table;

use std::fmt::Write as _;

use crate::output::table::Table;
use crate::task::model::{Priority, Task};
use crate::task::view::Counters;

#[must_use]
pub fn completion_icon(task: &Task) -> &'static str {
    if task.completed { "✓" } else { "○" }
}

#[must_use]
pub fn priority_icon(priority: Priority) -> &'static str {
    match priority {
        Priority::Low => "↓",
        Priority::Medium => "→",
        Priority::High => "↑",
    }
}

/// `"medium"` -> `"Medium"`.
#[must_use]
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[must_use]
pub fn truncate(s: &str, max: usize) -> String {
    let mut out: String = s.chars().take(max).collect();
    if s.chars().count() > max {
        out.push('…');
    }
    out
}

#[must_use]
pub fn task_table(tasks: &[&Task], verbose: bool, icons: bool) -> Table {
    let mut headers = vec!["ID", "DONE", "PRIORITY", "CATEGORY", "TEXT"];
    if verbose {
        headers.extend(["CREATED", "NOTES"]);
    }
    let mut t = Table::new(headers);

    for task in tasks {
        let done = if icons {
            completion_icon(task).to_owned()
        } else if task.completed {
            "yes".to_owned()
        } else {
            "no".to_owned()
        };
        let mut text = task.text.clone();
        if icons && !verbose && task.has_notes() {
            text.push_str(" ✎");
        }
        let mut row = vec![
            task.id.clone(),
            done,
            task.priority.to_string(),
            task.category.to_string(),
            text,
        ];
        if verbose {
            row.push(task.created_at.clone());
            row.push(if task.has_notes() {
                truncate(&task.notes.replace('\n', " "), 60)
            } else {
                "-".to_owned()
            });
        }
        t.row(row);
    }
    t
}

/// Machine-readable rows: every field, no icons.
#[must_use]
pub fn task_csv(tasks: &[&Task]) -> Table {
    let mut t = Table::new([
        "id",
        "text",
        "priority",
        "category",
        "completed",
        "notes",
        "createdAt",
    ]);
    for task in tasks {
        t.row([
            task.id.clone(),
            task.text.clone(),
            task.priority.to_string(),
            task.category.to_string(),
            task.completed.to_string(),
            task.notes.clone(),
            task.created_at.clone(),
        ]);
    }
    t
}

#[must_use]
pub fn format_task_details(task: &Task) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Task: {} (ID: {})", task.text, task.id);
    let _ = writeln!(
        out,
        "Status: {}",
        if task.completed { "completed" } else { "active" }
    );
    let _ = writeln!(out, "Priority: {}", capitalize(task.priority.as_str()));
    let _ = writeln!(out, "Category: {}", capitalize(task.category.as_str()));
    let _ = writeln!(out, "Created: {}", task.created_at);
    if task.has_notes() {
        let _ = write!(out, "\nNotes:\n{}\n", task.notes);
    }
    out
}

#[must_use]
pub fn format_counters(c: &Counters) -> String {
    format!(
        "{} total • {} active • {} completed • {} high priority",
        c.total, c.active, c.completed, c.high_priority
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::model::Category;

    fn task(text: &str, completed: bool, notes: &str) -> Task {
        Task {
            id: "1".to_owned(),
            text: text.to_owned(),
            priority: Priority::High,
            category: Category::new("work"),
            completed,
            notes: notes.to_owned(),
            created_at: "2025-01-01T00:00:00.000Z".to_owned(),
        }
    }

    #[test]
    fn capitalize_and_truncate() {
        assert_eq!(capitalize("medium"), "Medium");
        assert_eq!(capitalize(""), "");
        assert_eq!(truncate("abcdef", 3), "abc…");
        assert_eq!(truncate("abc", 3), "abc");
    }

    #[test]
    fn details_include_notes_only_when_present() {
        let plain = format_task_details(&task("Ship", true, ""));
        assert!(plain.contains("Status: completed"));
        assert!(plain.contains("Priority: High"));
        assert!(!plain.contains("Notes:"));

        let noted = format_task_details(&task("Ship", false, "after lunch"));
        assert!(noted.contains("Notes:\nafter lunch"));
    }

    #[test]
    fn plain_table_marks_completion_without_icons() {
        let t = task("Ship", true, "n");
        let table = task_table(&[&t], false, false);
        let mut buf = Vec::new();
        table.write_to(&mut buf).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.lines().nth(1).unwrap().contains("yes"));
        assert!(!out.contains('✎'));
    }

    #[test]
    fn counters_line() {
        let c = Counters {
            total: 3,
            active: 2,
            completed: 1,
            high_priority: 1,
        };
        assert_eq!(
            format_counters(&c),
            "3 total • 2 active • 1 completed • 1 high priority"
        );
    }
}
