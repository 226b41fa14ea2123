#![forbid(unsafe_code)]

use std::process::ExitCode;

use anyhow::Context as _;
use clap::{CommandFactory as _, Parser, Subcommand, ValueEnum};

use crate::config::{self, Config};
use crate::error::TaskpadError;
use crate::logging;
use crate::output::{self, table::Table};
use crate::storage::FileStore;
use crate::task::model::{Category, Priority, TaskDetails};
use crate::task::resolve;
use crate::task::store::{Persistence, TaskStore};
use crate::task::view::{self, Counters, Filter};
use crate::tui;

#[derive(Debug, Parser)]
#[command(name = "taskpad", version, about = "Local task list manager")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    Add(AddArgs),
    #[command(alias = "ls")]
    List(ListArgs),
    Show(IdArgs),
    #[command(alias = "done")]
    Toggle(IdArgs),
    Edit(EditArgs),
    #[command(alias = "rm")]
    Remove(RemoveArgs),
    ClearCompleted,
    Stats(StatsArgs),
    Theme(ThemeArgs),
    Config(ConfigArgs),
    Completion(CompletionArgs),
    Version,
}

#[derive(Debug, Parser)]
pub struct AddArgs {
    /// Task text
    #[arg(required = true)]
    pub text: Vec<String>,
    /// low, medium or high (defaults.priority when omitted)
    #[arg(short = 'p', long = "priority")]
    pub priority: Option<Priority>,
    /// Category label (defaults.category when omitted)
    #[arg(short = 'c', long = "category")]
    pub category: Option<Category>,
}

#[derive(Debug, Parser)]
pub struct ListArgs {
    /// Which tasks to show (defaults.filter when omitted)
    #[arg(short = 'f', long = "filter", value_enum)]
    pub filter: Option<Filter>,
    /// Case-insensitive match on text or notes
    #[arg(short = 's', long = "search", default_value = "")]
    pub search: String,
    /// Show creation time and notes
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
    /// Output in JSON format
    #[arg(long = "json", conflicts_with = "csv")]
    pub json: bool,
    /// Output as CSV
    #[arg(long = "csv")]
    pub csv: bool,
}

#[derive(Debug, Parser)]
pub struct IdArgs {
    /// Task id, id prefix, or unique text fragment
    pub id: String,
}

#[derive(Debug, Parser)]
pub struct EditArgs {
    /// Task id, id prefix, or unique text fragment
    pub id: String,
    #[arg(short = 't', long = "text")]
    pub text: Option<String>,
    #[arg(short = 'p', long = "priority")]
    pub priority: Option<Priority>,
    #[arg(short = 'c', long = "category")]
    pub category: Option<Category>,
    /// Replace notes (use "" to clear)
    #[arg(short = 'n', long = "notes")]
    pub notes: Option<String>,
}

#[derive(Debug, Parser)]
pub struct RemoveArgs {
    /// Task id, id prefix, or unique text fragment
    pub id: String,
    /// Skip the confirmation prompt
    #[arg(short = 'y', long = "yes")]
    pub yes: bool,
}

#[derive(Debug, Parser)]
pub struct StatsArgs {
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThemeMode {
    Dark,
    Light,
    Toggle,
}

#[derive(Debug, Parser)]
pub struct ThemeArgs {
    /// Omit to print the current theme
    #[arg(value_enum)]
    pub mode: Option<ThemeMode>,
}

#[derive(Debug, Parser)]
pub struct CompletionArgs {
    pub shell: clap_complete::Shell,
}

#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub cmd: ConfigCmd,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCmd {
    List,
    Set(ConfigSetArgs),
    Get(ConfigGetArgs),
}

#[derive(Debug, Parser)]
pub struct ConfigSetArgs {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Parser)]
pub struct ConfigGetArgs {
    pub key: String,
}

pub fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.cmd {
        None => cmd_default(),
        Some(Commands::Completion(args)) => {
            let mut cmd = Cli::command();
            clap_complete::generate(args.shell, &mut cmd, "taskpad", &mut std::io::stdout());
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Config(args)) => cmd_config(args),
        Some(Commands::Version) => Ok(cmd_version()),
        Some(Commands::Add(args)) => with_store(|cfg, store| cmd_add(cfg, store, args)),
        Some(Commands::List(args)) => with_store(|cfg, store| cmd_list(cfg, store, &args)),
        Some(Commands::Show(args)) => with_store(|_, store| cmd_show(store, &args)),
        Some(Commands::Toggle(args)) => with_store(|_, store| cmd_toggle(store, &args)),
        Some(Commands::Edit(args)) => with_store(|_, store| cmd_edit(store, args)),
        Some(Commands::Remove(args)) => with_store(|cfg, store| cmd_remove(cfg, store, &args)),
        Some(Commands::ClearCompleted) => with_store(|_, store| Ok(cmd_clear_completed(store))),
        Some(Commands::Stats(args)) => with_store(|_, store| cmd_stats(store, &args)),
        Some(Commands::Theme(args)) => with_store(|_, store| Ok(cmd_theme(store, &args))),
    }
}

/// Loads config, starts stderr logging, and runs `f` against the file-backed store.
fn with_store(
    f: impl FnOnce(&Config, &mut TaskStore<FileStore>) -> anyhow::Result<ExitCode>,
) -> anyhow::Result<ExitCode> {
    let cfg = load_cfg()?;
    logging::init_stderr(&cfg.log.level);
    let mut store = open_store(&cfg)?;
    let code = f(&cfg, &mut store)?;
    warn_if_memory_only(&store);
    Ok(code)
}

fn load_cfg() -> anyhow::Result<Config> {
    let (cfg, _paths) = config::load()?;
    Ok(cfg)
}

pub fn open_store(cfg: &Config) -> anyhow::Result<TaskStore<FileStore>> {
    let dir = cfg.data_dir()?;
    let kv = FileStore::new(dir).with_quota(cfg.storage.quota_bytes());
    Ok(TaskStore::open(kv))
}

/// File logging for the terminal UI, then the store. An unwritable data dir
/// leaves the store memory-only instead of failing startup.
fn open_tui_store(cfg: &Config) -> anyhow::Result<TaskStore<FileStore>> {
    let log_path = cfg.data_dir()?.join(logging::LOG_FILE);
    logging::init_file_with_fallback(&cfg.log.level, &log_path);
    open_store(cfg)
}

fn warn_if_memory_only(store: &TaskStore<FileStore>) {
    if store.persistence() == Persistence::MemoryOnly {
        eprintln!(
            "warning: storage at {} is unavailable; changes were not saved",
            config::tilde_path(&store.kv().dir().to_string_lossy())
        );
    }
}

fn cmd_default() -> anyhow::Result<ExitCode> {
    let cfg = load_cfg()?;

    if tui::is_tty() {
        let store = open_tui_store(&cfg)?;
        crate::tui::app::run(cfg, store)?;
        return Ok(ExitCode::SUCCESS);
    }

    // Non-TTY fallback: print the list with config defaults.
    logging::init_stderr(&cfg.log.level);
    let store = open_store(&cfg)?;
    let args = ListArgs {
        filter: None,
        search: String::new(),
        verbose: false,
        json: false,
        csv: false,
    };
    cmd_list(&cfg, &store, &args)
}

fn cmd_config(args: ConfigArgs) -> anyhow::Result<ExitCode> {
    match args.cmd {
        ConfigCmd::List => {
            print!("{}", config::list_resolved_toml()?);
            Ok(ExitCode::SUCCESS)
        }
        ConfigCmd::Set(set) => {
            config::set_value_string(&set.key, &set.value)?;
            println!("Set {} = {}", set.key, set.value);
            Ok(ExitCode::SUCCESS)
        }
        ConfigCmd::Get(get) => match config::get_value_string(&get.key)? {
            Some(v) => {
                println!("{v}");
                Ok(ExitCode::SUCCESS)
            }
            None => anyhow::bail!(
                "configuration key '{}' not found - use 'taskpad config list' to see available keys",
                get.key
            ),
        },
    }
}

fn cmd_add(
    cfg: &Config,
    store: &mut TaskStore<FileStore>,
    args: AddArgs,
) -> anyhow::Result<ExitCode> {
    let text = args.text.join(" ");
    let priority = args.priority.unwrap_or(cfg.defaults.priority);
    let category = args.category.unwrap_or_else(|| cfg.defaults.category());

    let Some(task) = store.add(&text, priority, category) else {
        return Err(TaskpadError::EmptyText.into());
    };
    println!("Added task {} ({})", task.id, task.text);
    Ok(ExitCode::SUCCESS)
}

fn cmd_list(cfg: &Config, store: &TaskStore<FileStore>, args: &ListArgs) -> anyhow::Result<ExitCode> {
    let filter = args.filter.unwrap_or(cfg.defaults.filter);
    let tasks = view::project(store.snapshot_all(), filter, &args.search);

    if args.json {
        let mut s = serde_json::to_string_pretty(&tasks)?;
        s.push('\n');
        print!("{s}");
        return Ok(ExitCode::SUCCESS);
    }

    if args.csv {
        output::task_csv(&tasks).print_csv()?;
        return Ok(ExitCode::SUCCESS);
    }

    if tasks.is_empty() {
        println!("No tasks found.");
    } else {
        output::task_table(&tasks, args.verbose, cfg.ui.icons).print()?;
    }
    println!();
    println!(
        "{}",
        output::format_counters(&Counters::from_tasks(store.snapshot_all()))
    );
    Ok(ExitCode::SUCCESS)
}

fn cmd_show(store: &TaskStore<FileStore>, args: &IdArgs) -> anyhow::Result<ExitCode> {
    let task = resolve::find_task(store.snapshot_all(), &args.id)?;
    print!("{}", output::format_task_details(task));
    Ok(ExitCode::SUCCESS)
}

fn cmd_toggle(store: &mut TaskStore<FileStore>, args: &IdArgs) -> anyhow::Result<ExitCode> {
    let id = resolve::find_task(store.snapshot_all(), &args.id)?.id.clone();
    let task = store
        .toggle_completed(&id)
        .ok_or_else(|| TaskpadError::TaskNotFound(id.clone()))?;
    let state = if task.completed { "completed" } else { "active" };
    println!("Marked {} as {state} ({})", task.id, task.text);
    Ok(ExitCode::SUCCESS)
}

fn cmd_edit(store: &mut TaskStore<FileStore>, args: EditArgs) -> anyhow::Result<ExitCode> {
    let current = resolve::find_task(store.snapshot_all(), &args.id)?;
    let id = current.id.clone();

    let mut details = TaskDetails::from_task(current);
    if let Some(text) = args.text {
        details.text = text;
    }
    if let Some(priority) = args.priority {
        details.priority = priority;
    }
    if let Some(category) = args.category {
        details.category = category;
    }
    if let Some(notes) = args.notes {
        details.notes = notes;
    }

    let Some(task) = store.update_details(&id, details) else {
        return Err(TaskpadError::EmptyText.into());
    };
    println!("Updated task {} ({})", task.id, task.text);
    Ok(ExitCode::SUCCESS)
}

fn cmd_remove(
    cfg: &Config,
    store: &mut TaskStore<FileStore>,
    args: &RemoveArgs,
) -> anyhow::Result<ExitCode> {
    let task = resolve::find_task(store.snapshot_all(), &args.id)?.clone();

    if cfg.ui.confirm_delete && !args.yes {
        if !tui::is_tty() {
            anyhow::bail!("refusing to delete without confirmation; pass --yes");
        }
        if !confirm(&format!("Delete \"{}\" ({})?", task.text, task.id))? {
            println!("Cancelled.");
            return Ok(ExitCode::SUCCESS);
        }
    }

    store.remove(&task.id);
    println!("Deleted task {} ({})", task.id, task.text);
    Ok(ExitCode::SUCCESS)
}

fn cmd_clear_completed(store: &mut TaskStore<FileStore>) -> ExitCode {
    let cleared = store.clear_completed();
    println!("Cleared {cleared} completed task(s)");
    ExitCode::SUCCESS
}

fn cmd_stats(store: &TaskStore<FileStore>, args: &StatsArgs) -> anyhow::Result<ExitCode> {
    let counters = Counters::from_tasks(store.snapshot_all());
    if args.json {
        println!("{}", serde_json::to_string_pretty(&counters)?);
        return Ok(ExitCode::SUCCESS);
    }

    let mut t = Table::new(["TOTAL", "ACTIVE", "COMPLETED", "HIGH PRIORITY"]);
    t.row([
        counters.total.to_string(),
        counters.active.to_string(),
        counters.completed.to_string(),
        counters.high_priority.to_string(),
    ]);
    t.print()?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_theme(store: &mut TaskStore<FileStore>, args: &ThemeArgs) -> ExitCode {
    match args.mode {
        Some(ThemeMode::Dark) => store.set_dark_mode(true),
        Some(ThemeMode::Light) => store.set_dark_mode(false),
        Some(ThemeMode::Toggle) => {
            store.toggle_dark_mode();
        }
        None => {}
    }
    println!("{}", if store.dark_mode() { "dark" } else { "light" });
    ExitCode::SUCCESS
}

fn confirm(question: &str) -> anyhow::Result<bool> {
    print!("{question} (y/N): ");
    std::io::Write::flush(&mut std::io::stdout())?;
    let mut input = String::new();
    let _ = std::io::stdin()
        .read_line(&mut input)
        .context("failed to read confirmation")?;
    let resp = input.trim().to_lowercase();
    Ok(resp == "y" || resp == "yes")
}

fn cmd_version() -> ExitCode {
    println!("taskpad version {}", env!("CARGO_PKG_VERSION"));
    if let Some(commit) = option_env!("TASKPAD_GIT_COMMIT") {
        println!("  commit: {commit}");
    }
    println!("  rust: {}", rustc_version_runtime::version());
    println!(
        "  os/arch: {}/{}",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
    ExitCode::SUCCESS
}
