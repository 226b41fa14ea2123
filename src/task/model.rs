#![forbid(unsafe_code)]

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::macros::format_description;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    #[must_use]
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|p| *p == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!("expected low|medium|high, got '{other}'")),
        }
    }
}

/// Free-form category label, stored lowercase. Decoding goes through
/// [`Category::new`], so hand-edited snapshots are normalized as well.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub struct Category(String);

impl Category {
    pub const PRESETS: [&'static str; 5] = ["work", "personal", "shopping", "health", "other"];

    #[must_use]
    pub fn new(name: &str) -> Self {
        let name = name.trim().to_lowercase();
        if name.is_empty() {
            return Self::default();
        }
        Self(name)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Cycles through the presets; custom labels jump to the first preset.
    #[must_use]
    pub fn next_preset(&self) -> Self {
        let next = match Self::PRESETS.iter().position(|p| *p == self.0) {
            Some(idx) => Self::PRESETS[(idx + 1) % Self::PRESETS.len()],
            None => Self::PRESETS[0],
        };
        Self(next.to_owned())
    }
}

impl Default for Category {
    fn default() -> Self {
        Self("personal".to_owned())
    }
}

impl From<String> for Category {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err("category must not be empty".to_owned());
        }
        Ok(Self::new(s))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub text: String,
    pub priority: Priority,
    pub category: Category,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub notes: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

/// Replacement values for [`crate::task::store::TaskStore::update_details`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDetails {
    pub text: String,
    pub priority: Priority,
    pub category: Category,
    pub notes: String,
}

impl TaskDetails {
    #[must_use]
    pub fn from_task(task: &Task) -> Self {
        Self {
            text: task.text.clone(),
            priority: task.priority,
            category: task.category.clone(),
            notes: task.notes.clone(),
        }
    }
}

impl Task {
    #[must_use]
    pub fn has_notes(&self) -> bool {
        !self.notes.trim().is_empty()
    }

    /// Numeric form of the id, when it was generated by this crate.
    #[must_use]
    pub fn id_millis(&self) -> Option<i64> {
        self.id.parse().ok()
    }
}

#[must_use]
pub fn now_millis() -> i64 {
    let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
    i64::try_from(nanos / 1_000_000).unwrap_or(i64::MAX)
}

/// UTC timestamp with millisecond precision, e.g. `2025-02-01T09:30:00.125Z`.
#[must_use]
pub fn now_timestamp() -> String {
    format_timestamp(OffsetDateTime::now_utc())
}

#[must_use]
pub fn format_timestamp(at: OffsetDateTime) -> String {
    let fmt = format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
    );
    at.to_offset(time::UtcOffset::UTC)
        .format(&fmt)
        .unwrap_or_else(|_| "unknown".to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_json_keeps_stored_field_names() {
        let task = Task {
            id: "1700000000000".to_owned(),
            text: "Buy milk".to_owned(),
            priority: Priority::High,
            category: Category::new("Shopping"),
            completed: false,
            notes: String::new(),
            created_at: "2023-11-14T22:13:20.000Z".to_owned(),
        };
        let v = serde_json::to_value(&task).unwrap();
        assert_eq!(v["priority"], "high");
        assert_eq!(v["category"], "shopping");
        assert_eq!(v["createdAt"], "2023-11-14T22:13:20.000Z");
        assert!(v.get("created_at").is_none());
    }

    #[test]
    fn missing_notes_decode_as_empty() {
        let raw = r#"{"id":"1","text":"x","priority":"low","category":"work","completed":true,"createdAt":"t"}"#;
        let task: Task = serde_json::from_str(raw).unwrap();
        assert_eq!(task.notes, "");
        assert!(task.completed);
        assert!(!task.has_notes());
    }

    #[test]
    fn priority_parses_case_insensitively() {
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!(" low ".parse::<Priority>().unwrap(), Priority::Low);
        assert!("urgent".parse::<Priority>().is_err());
        assert_eq!(Priority::High.next(), Priority::Low);
    }

    #[test]
    fn category_cycles_presets() {
        let c = Category::new("work");
        assert_eq!(c.next_preset().as_str(), "personal");
        assert_eq!(Category::new("other").next_preset().as_str(), "work");
        assert_eq!(Category::new("garden").next_preset().as_str(), "work");
        assert_eq!(Category::new("  ").as_str(), "personal");
    }

    #[test]
    fn stored_categories_are_normalized_on_decode() {
        let c: Category = serde_json::from_str(r#"" Work ""#).unwrap();
        assert_eq!(c.as_str(), "work");
        assert_eq!(c.next_preset().as_str(), "personal");

        let blank: Category = serde_json::from_str("\"\"").unwrap();
        assert_eq!(blank, Category::default());

        assert_eq!(serde_json::to_string(&c).unwrap(), "\"work\"");
    }

    #[test]
    fn timestamp_has_millisecond_precision() {
        let at = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        assert_eq!(format_timestamp(at), "2023-11-14T22:13:20.000Z");
    }
}
