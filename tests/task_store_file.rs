use taskpad::config::Config;
use taskpad::storage::file::FileStore;
use taskpad::storage::{DARK_MODE_KEY, KeyValueStore as _, TASKS_KEY};
use taskpad::task::model::{Category, Priority, TaskDetails};
use taskpad::task::store::{Persistence, TaskStore};
use taskpad::task::view::{Counters, Filter, project};

#[test]
fn tasks_and_theme_survive_reopen() {
    let td = tempfile::tempdir().expect("tempdir");
    let dir = td.path().join("data");

    let (milk, rent) = {
        let mut store = TaskStore::open(FileStore::new(dir.clone()));
        let milk = store
            .add("Buy milk", Priority::Low, Category::new("shopping"))
            .expect("add milk");
        let rent = store
            .add("Pay rent", Priority::High, Category::new("personal"))
            .expect("add rent");
        store.toggle_completed(&rent.id).expect("toggle");
        store.set_dark_mode(true);
        assert_eq!(store.persistence(), Persistence::Durable);
        (milk, rent)
    };

    let store = TaskStore::open(FileStore::new(dir.clone()));
    let tasks = store.snapshot_all();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0], milk);
    assert_eq!(tasks[1].id, rent.id);
    assert!(tasks[1].completed);
    assert!(store.dark_mode());

    let raw = std::fs::read_to_string(dir.join(DARK_MODE_KEY)).expect("read darkMode");
    assert_eq!(raw, "true");
}

#[test]
fn snapshot_uses_camel_case_json() {
    let td = tempfile::tempdir().expect("tempdir");
    let mut store = TaskStore::open(FileStore::new(td.path().to_path_buf()));
    store
        .add("Buy milk", Priority::Medium, Category::default())
        .expect("add");

    let raw = store.kv().get(TASKS_KEY).expect("get").expect("tasks slot");
    let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
    let first = &value[0];
    assert_eq!(first["text"], "Buy milk");
    assert_eq!(first["priority"], "medium");
    assert_eq!(first["category"], "personal");
    assert_eq!(first["completed"], false);
    assert_eq!(first["notes"], "");
    assert!(first["createdAt"].as_str().is_some_and(|s| s.ends_with('Z')));
}

#[test]
fn hand_written_snapshot_loads() {
    let td = tempfile::tempdir().expect("tempdir");
    std::fs::write(
        td.path().join(TASKS_KEY),
        r#"[{"id":"1700000000000","text":"Legacy","priority":"high","category":"errands","createdAt":"2023-11-14T22:13:20.000Z"}]"#,
    )
    .expect("seed");
    std::fs::write(td.path().join(DARK_MODE_KEY), "yes").expect("seed");

    let mut store = TaskStore::open(FileStore::new(td.path().to_path_buf()));
    let task = &store.snapshot_all()[0];
    assert_eq!(task.text, "Legacy");
    assert_eq!(task.category.as_str(), "errands");
    assert!(!task.completed);
    assert!(task.notes.is_empty());
    assert!(!store.dark_mode());

    let added = store
        .add("Next", Priority::Low, Category::default())
        .expect("add");
    assert!(added.id_millis() > Some(1_700_000_000_000));
}

#[test]
fn corrupt_snapshot_opens_empty() {
    let td = tempfile::tempdir().expect("tempdir");
    std::fs::write(td.path().join(TASKS_KEY), "{not json").expect("seed");

    let store = TaskStore::open(FileStore::new(td.path().to_path_buf()));
    assert!(store.is_empty());
    assert_eq!(store.persistence(), Persistence::Durable);
}

#[test]
fn unwritable_directory_degrades_to_memory() {
    let td = tempfile::tempdir().expect("tempdir");
    let blocker = td.path().join("blocker");
    std::fs::write(&blocker, "x").expect("seed");

    let mut store = TaskStore::open(FileStore::new(blocker.clone()));
    assert_eq!(store.persistence(), Persistence::MemoryOnly);

    let task = store
        .add("Still here", Priority::Medium, Category::default())
        .expect("add");
    assert_eq!(store.get(&task.id).map(|t| t.text.as_str()), Some("Still here"));
    assert_eq!(std::fs::read_to_string(&blocker).expect("read"), "x");
}

#[test]
fn quota_overflow_keeps_last_good_snapshot() {
    let td = tempfile::tempdir().expect("tempdir");
    let kv = FileStore::new(td.path().to_path_buf()).with_quota(Some(400));
    let mut store = TaskStore::open(kv);

    store
        .add("small", Priority::Low, Category::default())
        .expect("add");
    assert_eq!(store.persistence(), Persistence::Durable);

    store
        .add(&"x".repeat(500), Priority::Low, Category::default())
        .expect("add");
    assert_eq!(store.persistence(), Persistence::MemoryOnly);
    assert_eq!(store.len(), 2);

    let reopened = TaskStore::open(FileStore::new(td.path().to_path_buf()));
    assert_eq!(reopened.len(), 1);
    assert_eq!(reopened.snapshot_all()[0].text, "small");
}

#[test]
fn documented_properties_hold_on_disk() {
    let td = tempfile::tempdir().expect("tempdir");
    let mut store = TaskStore::open(FileStore::new(td.path().to_path_buf()));

    let before = store.len();
    assert!(store.add("  ", Priority::Low, Category::default()).is_none());
    assert_eq!(store.len(), before);

    let a = store.add("a", Priority::High, Category::new("work")).expect("a");
    let b = store.add("b", Priority::Low, Category::new("work")).expect("b");
    let c = store.add("c", Priority::Medium, Category::new("work")).expect("c");
    assert_eq!(store.snapshot_all().last().map(|t| t.id.as_str()), Some(c.id.as_str()));

    let original = store.get(&a.id).cloned().expect("a");
    store.toggle_completed(&a.id);
    store.toggle_completed(&a.id);
    assert_eq!(store.get(&a.id), Some(&original));

    let rejected = TaskDetails {
        text: String::new(),
        priority: Priority::Low,
        category: Category::new("health"),
        notes: "ignored".to_owned(),
    };
    assert!(store.update_details(&a.id, rejected).is_none());
    assert_eq!(store.get(&a.id), Some(&original));

    store.toggle_completed(&b.id);
    let counters = Counters::from_tasks(store.snapshot_all());
    assert_eq!(counters.total, 3);
    assert_eq!(counters.completed, 1);
    assert_eq!(counters.high_priority, 1);
    let active = project(store.snapshot_all(), Filter::Active, "");
    assert_eq!(active.len(), 2);

    assert_eq!(store.clear_completed(), 1);
    let ids: Vec<&str> = store.snapshot_all().iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, [a.id.as_str(), c.id.as_str()]);

    assert!(store.remove(&c.id));
    assert!(!store.remove(&c.id));

    let reopened = TaskStore::open(FileStore::new(td.path().to_path_buf()));
    assert_eq!(reopened.snapshot_all(), store.snapshot_all());
}

#[test]
fn cli_store_honors_configured_data_dir() {
    let td = tempfile::tempdir().expect("tempdir");
    let mut cfg = Config::default();
    cfg.storage.data_dir = td.path().join("nested").to_string_lossy().into_owned();

    let mut store = taskpad::cli::open_store(&cfg).expect("open");
    store
        .add("Configured", Priority::Medium, cfg.defaults.category())
        .expect("add");
    assert!(td.path().join("nested").join(TASKS_KEY).exists());
}
