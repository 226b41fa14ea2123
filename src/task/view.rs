#![forbid(unsafe_code)]

//! Read-only projections over the task collection: what is visible for a
//! given filter and search term, and the aggregate counters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::task::model::{Priority, Task};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
}

impl Filter {
    pub const ALL: [Filter; 3] = [Filter::All, Filter::Active, Filter::Completed];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::Active => "active",
            Filter::Completed => "completed",
        }
    }

    #[must_use]
    pub fn matches(self, task: &Task) -> bool {
        match self {
            Filter::All => true,
            Filter::Active => !task.completed,
            Filter::Completed => task.completed,
        }
    }

    #[must_use]
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    #[must_use]
    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Filter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Filter::All),
            "active" => Ok(Filter::Active),
            "completed" => Ok(Filter::Completed),
            other => Err(format!("expected all|active|completed, got '{other}'")),
        }
    }
}

/// Case-insensitive substring match against text or notes.
#[must_use]
pub fn matches_search(task: &Task, term: &str) -> bool {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    task.text.to_lowercase().contains(&needle) || task.notes.to_lowercase().contains(&needle)
}

/// Tasks passing both `filter` and `search`, in insertion order.
#[must_use]
pub fn project<'a>(tasks: &'a [Task], filter: Filter, search: &str) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|t| filter.matches(t) && matches_search(t, search))
        .collect()
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Counters {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
    pub high_priority: usize,
}

impl Counters {
    /// Always pass the full collection, not a projection.
    #[must_use]
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let completed = tasks.iter().filter(|t| t.completed).count();
        Self {
            total: tasks.len(),
            active: tasks.len() - completed,
            completed,
            high_priority: tasks
                .iter()
                .filter(|t| t.priority == Priority::High)
                .count(),
        }
    }
}

/// Current filter and search term of a list view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub filter: Filter,
    pub search: String,
}

impl ViewState {
    #[must_use]
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            search: String::new(),
        }
    }

    #[must_use]
    pub fn visible<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        project(tasks, self.filter, &self.search)
    }

    #[must_use]
    pub fn is_narrowed(&self) -> bool {
        self.filter != Filter::All || !self.search.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::model::Category;

    fn task(id: &str, text: &str, completed: bool, priority: Priority, notes: &str) -> Task {
        Task {
            id: id.to_owned(),
            text: text.to_owned(),
            priority,
            category: Category::default(),
            completed,
            notes: notes.to_owned(),
            created_at: "2025-01-01T00:00:00.000Z".to_owned(),
        }
    }

    fn texts<'a>(tasks: &[&'a Task]) -> Vec<&'a str> {
        tasks.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn filter_and_search_compose() {
        let tasks = vec![
            task("1", "Buy milk", false, Priority::Low, ""),
            task("2", "Pay bills", true, Priority::High, ""),
        ];

        assert_eq!(texts(&project(&tasks, Filter::Active, "")), ["Buy milk"]);
        assert_eq!(texts(&project(&tasks, Filter::All, "bills")), ["Pay bills"]);
        assert_eq!(texts(&project(&tasks, Filter::Completed, "")), ["Pay bills"]);
        assert!(project(&tasks, Filter::Active, "bills").is_empty());
    }

    #[test]
    fn search_is_case_insensitive_and_covers_notes() {
        let tasks = vec![
            task("1", "Call plumber", false, Priority::Low, "Ask about the LEAK"),
            task("2", "Leaky tap", false, Priority::Low, ""),
            task("3", "Walk dog", false, Priority::Low, ""),
        ];

        assert_eq!(
            texts(&project(&tasks, Filter::All, "  leak ")),
            ["Call plumber", "Leaky tap"]
        );
        assert_eq!(project(&tasks, Filter::All, "").len(), 3);
        assert_eq!(project(&tasks, Filter::All, "   ").len(), 3);
    }

    #[test]
    fn counters_ignore_view_state() {
        let tasks = vec![
            task("1", "a", false, Priority::High, ""),
            task("2", "b", false, Priority::Low, ""),
            task("3", "c", true, Priority::Medium, ""),
        ];
        let expected = Counters {
            total: 3,
            active: 2,
            completed: 1,
            high_priority: 1,
        };
        assert_eq!(Counters::from_tasks(&tasks), expected);

        let view = ViewState {
            filter: Filter::Completed,
            search: "zzz".to_owned(),
        };
        assert!(view.visible(&tasks).is_empty());
        assert!(view.is_narrowed());
        assert_eq!(Counters::from_tasks(&tasks), expected);
    }

    #[test]
    fn high_priority_counts_completed_tasks_too() {
        let tasks = vec![task("1", "a", true, Priority::High, "")];
        assert_eq!(Counters::from_tasks(&tasks).high_priority, 1);
    }

    #[test]
    fn filter_cycles_and_parses() {
        assert_eq!(Filter::All.next(), Filter::Active);
        assert_eq!(Filter::All.prev(), Filter::Completed);
        assert_eq!("Active".parse::<Filter>().unwrap(), Filter::Active);
        assert!("done".parse::<Filter>().is_err());
    }
}
