#![forbid(unsafe_code)]

use crate::error::TaskpadError;
use crate::task::model::Task;

/// Finds a single task by exact id, then id prefix, then text substring.
pub fn find_task<'a>(tasks: &'a [Task], pattern: &str) -> Result<&'a Task, TaskpadError> {
    let pattern = pattern.trim();
    if pattern.is_empty() {
        return Err(TaskpadError::TaskNotFound(pattern.to_owned()));
    }

    if let Some(t) = tasks.iter().find(|t| t.id == pattern) {
        return Ok(t);
    }

    let by_prefix: Vec<&Task> = tasks.iter().filter(|t| t.id.starts_with(pattern)).collect();
    if !by_prefix.is_empty() {
        return single(by_prefix, pattern);
    }

    let needle = pattern.to_lowercase();
    let by_text: Vec<&Task> = tasks
        .iter()
        .filter(|t| t.text.to_lowercase().contains(&needle))
        .collect();
    single(by_text, pattern)
}

fn single<'a>(mut matches: Vec<&'a Task>, pattern: &str) -> Result<&'a Task, TaskpadError> {
    match matches.len() {
        0 => Err(TaskpadError::TaskNotFound(pattern.to_owned())),
        1 => Ok(matches.remove(0)),
        count => Err(TaskpadError::AmbiguousTask {
            pattern: pattern.to_owned(),
            count,
        }),
    }
}
