#![forbid(unsafe_code)]

use crate::storage::{DARK_MODE_KEY, KeyValueStore, StorageError, TASKS_KEY};
use crate::task::model::{self, Category, Priority, Task, TaskDetails};

/// Whether mutations still reach the backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persistence {
    Durable,
    /// A storage call failed earlier in this session; state lives in memory only.
    MemoryOnly,
}

/// Owns the task collection and the theme flag.
///
/// Every mutation writes the full snapshot back to the key-value store.
/// Storage failures are logged and switch the store to
/// [`Persistence::MemoryOnly`]; they are never returned to the caller.
#[derive(Debug)]
pub struct TaskStore<S: KeyValueStore> {
    kv: S,
    tasks: Vec<Task>,
    dark_mode: bool,
    persistence: Persistence,
    last_id: i64,
}

impl<S: KeyValueStore> TaskStore<S> {
    pub fn open(kv: S) -> Self {
        let mut store = Self {
            kv,
            tasks: Vec::new(),
            dark_mode: false,
            persistence: Persistence::Durable,
            last_id: 0,
        };
        store.load();
        store
    }

    /// Reads both slots. A slot that cannot be read switches to memory-only
    /// so the unread data is never overwritten.
    fn load(&mut self) {
        if let Err(e) = self.kv.probe() {
            self.degrade("probe", &e);
            return;
        }

        self.tasks = match self.kv.get(TASKS_KEY) {
            Ok(Some(raw)) => decode_snapshot(&raw),
            Ok(None) => Vec::new(),
            Err(e) => {
                self.degrade("read tasks", &e);
                Vec::new()
            }
        };
        self.dark_mode = match self.kv.get(DARK_MODE_KEY) {
            Ok(v) => v.as_deref() == Some("true"),
            Err(e) => {
                self.degrade("read darkMode", &e);
                false
            }
        };
        self.last_id = self
            .tasks
            .iter()
            .filter_map(Task::id_millis)
            .max()
            .unwrap_or(0);
        tracing::debug!(tasks = self.tasks.len(), dark_mode = self.dark_mode, "loaded state");
    }

    #[must_use]
    pub fn snapshot_all(&self) -> &[Task] {
        &self.tasks
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    #[must_use]
    pub fn persistence(&self) -> Persistence {
        self.persistence
    }

    #[must_use]
    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    #[must_use]
    pub fn kv(&self) -> &S {
        &self.kv
    }

    /// Appends a new task. Returns `None` when `text` is blank.
    pub fn add(&mut self, text: &str, priority: Priority, category: Category) -> Option<Task> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let task = Task {
            id: self.next_id(),
            text: text.to_owned(),
            priority,
            category,
            completed: false,
            notes: String::new(),
            created_at: model::now_timestamp(),
        };
        self.tasks.push(task.clone());
        tracing::debug!(id = %task.id, "added task");
        self.persist_tasks();
        Some(task)
    }

    /// Returns whether a task was removed. Removing an absent id is a no-op.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        let removed = self.tasks.len() != before;
        if removed {
            tracing::debug!(id, "removed task");
        }
        self.persist_tasks();
        removed
    }

    pub fn toggle_completed(&mut self, id: &str) -> Option<Task> {
        let updated = self.replace(id, |t| Task {
            completed: !t.completed,
            ..t.clone()
        });
        self.persist_tasks();
        updated
    }

    /// Replaces the editable fields. Blank text leaves everything untouched.
    pub fn update_details(&mut self, id: &str, details: TaskDetails) -> Option<Task> {
        let text = details.text.trim();
        if text.is_empty() {
            return None;
        }
        let updated = self.replace(id, |t| Task {
            text: text.to_owned(),
            priority: details.priority,
            category: details.category.clone(),
            notes: details.notes.trim().to_owned(),
            ..t.clone()
        });
        self.persist_tasks();
        updated
    }

    /// Drops every completed task and returns how many went away.
    pub fn clear_completed(&mut self) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| !t.completed);
        let cleared = before - self.tasks.len();
        tracing::debug!(cleared, "cleared completed tasks");
        self.persist_tasks();
        cleared
    }

    pub fn set_dark_mode(&mut self, dark: bool) {
        self.dark_mode = dark;
        let value = if dark { "true" } else { "false" };
        self.write(DARK_MODE_KEY, value);
    }

    pub fn toggle_dark_mode(&mut self) -> bool {
        self.set_dark_mode(!self.dark_mode);
        self.dark_mode
    }

    fn replace(&mut self, id: &str, f: impl FnOnce(&Task) -> Task) -> Option<Task> {
        let idx = self.tasks.iter().position(|t| t.id == id)?;
        let next = f(&self.tasks[idx]);
        self.tasks[idx] = next.clone();
        Some(next)
    }

    fn next_id(&mut self) -> String {
        let id = model::now_millis().max(self.last_id + 1);
        self.last_id = id;
        id.to_string()
    }

    fn persist_tasks(&mut self) {
        match serde_json::to_string(&self.tasks) {
            Ok(raw) => self.write(TASKS_KEY, &raw),
            Err(e) => tracing::error!(error = %e, "failed to encode task snapshot"),
        }
    }

    fn write(&mut self, key: &str, value: &str) {
        if self.persistence == Persistence::MemoryOnly {
            return;
        }
        if let Err(e) = self.kv.set(key, value) {
            self.degrade(key, &e);
        }
    }

    fn degrade(&mut self, during: &str, err: &StorageError) {
        tracing::warn!(during, error = %err, "storage failed; continuing in memory only");
        self.persistence = Persistence::MemoryOnly;
    }
}

/// Undecodable snapshots are treated as absent.
fn decode_snapshot(raw: &str) -> Vec<Task> {
    match serde_json::from_str::<Vec<Task>>(raw) {
        Ok(tasks) => tasks,
        Err(e) => {
            tracing::warn!(error = %e, "stored task snapshot is malformed; starting empty");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn store() -> TaskStore<MemoryStore> {
        TaskStore::open(MemoryStore::new())
    }

    fn details(text: &str, priority: Priority, category: &str, notes: &str) -> TaskDetails {
        TaskDetails {
            text: text.to_owned(),
            priority,
            category: Category::new(category),
            notes: notes.to_owned(),
        }
    }

    #[test]
    fn add_appends_trimmed_task_and_persists() {
        let mut s = store();
        s.add("first", Priority::Low, Category::new("work")).unwrap();
        let t = s
            .add("  Buy milk  ", Priority::High, Category::new("shopping"))
            .unwrap();

        assert_eq!(s.len(), 2);
        assert_eq!(s.snapshot_all().last(), Some(&t));
        assert_eq!(t.text, "Buy milk");
        assert!(!t.completed);
        assert!(t.notes.is_empty());

        let raw = s.kv().get(TASKS_KEY).unwrap().unwrap();
        let persisted: Vec<Task> = serde_json::from_str(&raw).unwrap();
        assert_eq!(persisted, s.snapshot_all());
    }

    #[test]
    fn blank_text_is_rejected_without_writing() {
        let mut s = store();
        assert!(s.add("", Priority::Low, Category::default()).is_none());
        assert!(s.add("   \t ", Priority::Low, Category::default()).is_none());
        assert!(s.is_empty());
        assert_eq!(s.kv().get(TASKS_KEY).unwrap(), None);
    }

    #[test]
    fn ids_are_unique_and_increasing() {
        let mut s = store();
        let ids: Vec<i64> = (0..50)
            .map(|i| {
                s.add(&format!("t{i}"), Priority::Low, Category::default())
                    .unwrap()
                    .id_millis()
                    .unwrap()
            })
            .collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn remove_is_idempotent() {
        let mut s = store();
        let t = s.add("a", Priority::Low, Category::default()).unwrap();
        s.add("b", Priority::Low, Category::default()).unwrap();

        assert!(s.remove(&t.id));
        assert!(!s.remove(&t.id));
        assert_eq!(s.len(), 1);
        assert_eq!(s.snapshot_all()[0].text, "b");
    }

    #[test]
    fn toggle_twice_restores_flag() {
        let mut s = store();
        let t = s.add("a", Priority::Low, Category::default()).unwrap();

        assert!(s.toggle_completed(&t.id).unwrap().completed);
        assert!(!s.toggle_completed(&t.id).unwrap().completed);
        assert_eq!(s.get(&t.id), Some(&t));
        assert!(s.toggle_completed("missing").is_none());
    }

    #[test]
    fn update_details_replaces_fields_but_keeps_identity() {
        let mut s = store();
        let t = s.add("a", Priority::Low, Category::new("work")).unwrap();
        s.toggle_completed(&t.id);

        let updated = s
            .update_details(
                &t.id,
                details("  renamed ", Priority::High, "health", "  see doc  "),
            )
            .unwrap();
        assert_eq!(updated.id, t.id);
        assert_eq!(updated.created_at, t.created_at);
        assert!(updated.completed);
        assert_eq!(updated.text, "renamed");
        assert_eq!(updated.priority, Priority::High);
        assert_eq!(updated.category.as_str(), "health");
        assert_eq!(updated.notes, "see doc");
    }

    #[test]
    fn update_details_with_blank_text_changes_nothing() {
        let mut s = store();
        let t = s.add("keep me", Priority::Medium, Category::new("work")).unwrap();

        assert!(
            s.update_details(&t.id, details("  ", Priority::High, "other", "notes"))
                .is_none()
        );
        assert_eq!(s.get(&t.id), Some(&t));
    }

    #[test]
    fn clear_completed_keeps_active_order() {
        let mut s = store();
        let a = s.add("a", Priority::Low, Category::default()).unwrap();
        let b = s.add("b", Priority::Low, Category::default()).unwrap();
        let c = s.add("c", Priority::Low, Category::default()).unwrap();
        let d = s.add("d", Priority::Low, Category::default()).unwrap();
        s.toggle_completed(&b.id);
        s.toggle_completed(&d.id);

        assert_eq!(s.clear_completed(), 2);
        assert!(s.snapshot_all().iter().all(|t| !t.completed));
        let ids: Vec<&str> = s.snapshot_all().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, [a.id.as_str(), c.id.as_str()]);
        assert_eq!(s.clear_completed(), 0);
    }

    #[test]
    fn malformed_snapshot_opens_empty() {
        let kv = MemoryStore::new()
            .with_entry(TASKS_KEY, "{not json")
            .with_entry(DARK_MODE_KEY, "yes");
        let s = TaskStore::open(kv);
        assert!(s.is_empty());
        assert!(!s.dark_mode());
        assert_eq!(s.persistence(), Persistence::Durable);
    }

    #[test]
    fn reopen_restores_tasks_and_theme() {
        let mut s = store();
        s.add("a", Priority::High, Category::new("work")).unwrap();
        s.set_dark_mode(true);

        let reopened = TaskStore::open(s.kv().clone());
        assert_eq!(reopened.snapshot_all(), s.snapshot_all());
        assert!(reopened.dark_mode());
    }

    #[test]
    fn ids_continue_after_loaded_snapshot() {
        let seeded = r#"[{"id":"99999999999999","text":"future","priority":"low","category":"work","completed":false,"notes":"","createdAt":"t"}]"#;
        let mut s = TaskStore::open(MemoryStore::new().with_entry(TASKS_KEY, seeded));
        let t = s.add("next", Priority::Low, Category::default()).unwrap();
        assert_eq!(t.id, "100000000000000");
    }

    #[test]
    fn unavailable_storage_runs_in_memory() {
        let mut s = TaskStore::open(MemoryStore::unavailable());
        assert_eq!(s.persistence(), Persistence::MemoryOnly);

        let t = s.add("offline", Priority::Low, Category::default()).unwrap();
        assert!(s.toggle_completed(&t.id).unwrap().completed);
        assert!(s.toggle_dark_mode());
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn quota_failure_switches_to_memory_only() {
        let mut s = TaskStore::open(MemoryStore::with_quota(300));
        s.add("short", Priority::Low, Category::default()).unwrap();
        assert_eq!(s.persistence(), Persistence::Durable);

        let long = "x".repeat(400);
        s.add(&long, Priority::Low, Category::default()).unwrap();
        assert_eq!(s.persistence(), Persistence::MemoryOnly);
        assert_eq!(s.len(), 2);

        let raw = s.kv().get(TASKS_KEY).unwrap().unwrap();
        let persisted: Vec<Task> = serde_json::from_str(&raw).unwrap();
        assert_eq!(persisted.len(), 1);

        // No further writes, even small ones.
        s.remove(&persisted[0].id);
        assert_eq!(s.kv().get(TASKS_KEY).unwrap(), Some(raw));
    }

    #[test]
    fn unreadable_snapshot_is_never_overwritten() {
        let seeded = r#"[{"id":"1","text":"keep","priority":"low","category":"work","createdAt":"2024-01-01T00:00:00.000Z"}]"#;
        let kv = MemoryStore::new()
            .with_entry(TASKS_KEY, seeded)
            .with_entry(DARK_MODE_KEY, "true")
            .with_failing_reads();
        let mut s = TaskStore::open(kv);
        assert_eq!(s.persistence(), Persistence::MemoryOnly);
        assert!(s.is_empty());

        s.add("new", Priority::Medium, Category::default()).unwrap();
        s.set_dark_mode(false);
        assert_eq!(s.kv().peek(TASKS_KEY), Some(seeded));
        assert_eq!(s.kv().peek(DARK_MODE_KEY), Some("true"));
    }
}
