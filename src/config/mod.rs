#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use directories::{BaseDirs, ProjectDirs};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::TaskpadError;
use crate::task::model::{Category, Priority};
use crate::task::view::Filter;

pub const CONFIG_ENV: &str = "TASKPAD_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub defaults: DefaultsConfig,
    pub ui: UiConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: String,
    /// Per-slot size limit; 0 disables the check.
    pub quota_kb: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.local/share/taskpad".to_owned(),
            quota_kb: 5 * 1024,
        }
    }
}

impl StorageConfig {
    #[must_use]
    pub fn quota_bytes(&self) -> Option<usize> {
        if self.quota_kb == 0 {
            return None;
        }
        usize::try_from(self.quota_kb.saturating_mul(1024)).ok()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DefaultsConfig {
    pub priority: Priority,
    pub category: String,
    pub filter: Filter,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            priority: Priority::Medium,
            category: "personal".to_owned(),
            filter: Filter::All,
        }
    }
}

impl DefaultsConfig {
    #[must_use]
    pub fn category(&self) -> Category {
        Category::new(&self.category)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UiConfig {
    pub icons: bool,
    pub tilde_home: bool,
    pub confirm_delete: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            icons: true,
            tilde_home: true,
            confirm_delete: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_owned(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_file: PathBuf,
}

pub fn default_paths() -> anyhow::Result<ConfigPaths> {
    let config_file = match std::env::var_os(CONFIG_ENV) {
        Some(p) if !p.is_empty() => PathBuf::from(p),
        _ => platform_config_file()?,
    };
    Ok(ConfigPaths { config_file })
}

/// `~/.config/taskpad/config.toml`, except on Windows when that file is absent.
fn platform_config_file() -> anyhow::Result<PathBuf> {
    let dotconfig = home_dir().map(|h| h.join(".config").join("taskpad").join("config.toml"));
    match dotconfig {
        Some(p) if !cfg!(windows) || p.exists() => Ok(p),
        _ => {
            let proj = ProjectDirs::from("", "", "taskpad")
                .context("failed to determine platform config directory")?;
            Ok(proj.config_dir().join("config.toml"))
        }
    }
}

fn home_dir() -> Option<PathBuf> {
    BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}

#[must_use]
pub fn expand_tilde(input: &str) -> String {
    match (input.strip_prefix("~/"), home_dir()) {
        (Some(rest), Some(home)) => home.join(rest).to_string_lossy().into_owned(),
        _ => input.to_owned(),
    }
}

/// Display form of a path with the home directory shortened to `~`.
#[must_use]
pub fn tilde_path(input: &str) -> String {
    let Some(home) = home_dir() else {
        return input.to_owned();
    };
    match Path::new(input).strip_prefix(&home) {
        Ok(rest) if rest.as_os_str().is_empty() => "~".to_owned(),
        Ok(rest) => format!("~{}{}", std::path::MAIN_SEPARATOR, rest.display()),
        Err(_) => input.to_owned(),
    }
}

/// Expands `~/` and environment variables, then anchors relative paths at the cwd.
pub fn expand_path(input: &str) -> anyhow::Result<PathBuf> {
    let path = PathBuf::from(expand_env_vars(&expand_tilde(input.trim())));
    if path.is_absolute() {
        return Ok(path);
    }
    let cwd = std::env::current_dir().context("failed to resolve relative path")?;
    Ok(cwd.join(path))
}

/// `$VAR` and `${VAR}`; unset variables stay as written.
fn expand_env_vars(input: &str) -> String {
    let Ok(re) = Regex::new(r"\$(?:\{([A-Za-z_][A-Za-z0-9_]*)\}|([A-Za-z_][A-Za-z0-9_]*))") else {
        return input.to_owned();
    };
    re.replace_all(input, |caps: &regex::Captures<'_>| {
        let name = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
        std::env::var(name).unwrap_or_else(|_| caps[0].to_owned())
    })
    .into_owned()
}

pub fn load() -> anyhow::Result<(Config, ConfigPaths)> {
    let paths = default_paths()?;
    let file = ConfigFile::open(&paths.config_file)?;
    Ok((file.config, paths))
}

pub fn list_resolved_toml() -> anyhow::Result<String> {
    let (cfg, _paths) = load()?;
    Ok(toml::to_string_pretty(&cfg)?)
}

pub fn get_value_string(key: &str) -> anyhow::Result<Option<String>> {
    get_value_string_at_path(&default_paths()?.config_file, key)
}

pub fn set_value_string(key: &str, value: &str) -> anyhow::Result<()> {
    set_value_string_at_path(&default_paths()?.config_file, key, value)
}

pub fn get_value_string_at_path(path: &Path, key: &str) -> anyhow::Result<Option<String>> {
    Ok(ConfigFile::open(path)?.get(key))
}

pub fn set_value_string_at_path(path: &Path, key: &str, value: &str) -> anyhow::Result<()> {
    let mut file = ConfigFile::open(path)?;
    file.set(key, value)?;
    file.save()
}

/// A config file together with its comment-preserving TOML document.
/// A missing file reads as the defaults.
struct ConfigFile {
    path: PathBuf,
    doc: toml_edit::DocumentMut,
    config: Config,
}

impl ConfigFile {
    fn open(path: &Path) -> anyhow::Result<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()));
            }
        };
        let doc = raw
            .parse::<toml_edit::DocumentMut>()
            .with_context(|| format!("failed to parse TOML in {}", path.display()))?;
        let config: Config = toml::from_str(&raw)
            .with_context(|| format!("invalid config in {}", path.display()))?;
        config.validate()?;
        Ok(Self {
            path: path.to_path_buf(),
            doc,
            config,
        })
    }

    /// Resolved value for a dotted key, defaults included.
    fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(&self.config).ok()?;
        let pointer = format!("/{}", key.trim().replace('.', "/"));
        json.pointer(&pointer).map(display_value)
    }

    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        let key = key.trim();
        let item = parse_value_for_key(key, value)?;
        let (section, leaf) = key
            .split_once('.')
            .ok_or_else(|| TaskpadError::InvalidConfigKey(key.to_owned()))?;

        let table = self
            .doc
            .entry(section)
            .or_insert(toml_edit::table())
            .as_table_mut()
            .ok_or_else(|| {
                TaskpadError::Config(format!("cannot set {key}: '{section}' is not a table"))
            })?;
        table.insert(leaf, item);

        let updated: Config = toml::from_str(&self.doc.to_string())
            .with_context(|| format!("setting {key} produced an invalid config"))?;
        updated.validate()?;
        self.config = updated;
        Ok(())
    }

    fn save(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        std::fs::write(&self.path, self.doc.to_string())
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), "saved config");
        Ok(())
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), TaskpadError> {
        if self.storage.data_dir.trim().is_empty() {
            return Err(TaskpadError::Config(
                "storage.data_dir must not be empty".to_owned(),
            ));
        }
        if self.defaults.category.trim().is_empty() {
            return Err(TaskpadError::Config(
                "defaults.category must not be empty".to_owned(),
            ));
        }
        if tracing_subscriber::EnvFilter::try_new(&self.log.level).is_err() {
            return Err(TaskpadError::Config(format!(
                "log.level '{}' is not a valid filter",
                self.log.level
            )));
        }
        Ok(())
    }

    pub fn data_dir(&self) -> anyhow::Result<PathBuf> {
        expand_path(&self.storage.data_dir)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyType {
    Text,
    Bool,
    Count,
    Priority,
    Filter,
}

fn key_type(key: &str) -> Option<KeyType> {
    Some(match key {
        "storage.data_dir" | "defaults.category" | "log.level" => KeyType::Text,
        "storage.quota_kb" => KeyType::Count,
        "defaults.priority" => KeyType::Priority,
        "defaults.filter" => KeyType::Filter,
        "ui.icons" | "ui.tilde_home" | "ui.confirm_delete" => KeyType::Bool,
        _ => return None,
    })
}

fn parse_value_for_key(key: &str, value: &str) -> anyhow::Result<toml_edit::Item> {
    let kind = key_type(key).ok_or_else(|| TaskpadError::InvalidConfigKey(key.to_owned()))?;
    let invalid = |msg: String| TaskpadError::InvalidConfigValue {
        key: key.to_owned(),
        msg,
    };
    let value = value.trim();

    let item = match kind {
        KeyType::Text => toml_edit::value(value),
        KeyType::Bool => {
            let b: bool = value
                .parse()
                .map_err(|_| invalid(format!("expected true or false, got '{value}'")))?;
            toml_edit::value(b)
        }
        KeyType::Count => {
            let n: u32 = value
                .parse()
                .map_err(|e| invalid(format!("expected a non-negative integer, got '{value}': {e}")))?;
            toml_edit::value(i64::from(n))
        }
        KeyType::Priority => toml_edit::value(value.parse::<Priority>().map_err(invalid)?.as_str()),
        KeyType::Filter => toml_edit::value(value.parse::<Filter>().map_err(invalid)?.as_str()),
    };
    Ok(item)
}

fn display_value(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
            serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
        }
        other => other.to_string(),
    }
}
