/// Configuration system for flightlens.
///
/// Layers, later ones overriding earlier ones:
///
/// 1. **Built-in defaults**: [`schema::FlightlensConfig::default()`]
/// 2. **User global config**: `~/.flightlens/config.toml`
/// 3. **Project local config**: `.flightlens.toml` in the current directory
/// 4. **Environment variables**: `FLIGHTLENS_*`
///
/// Malformed files are ignored rather than reported; a broken config never
/// prevents the dashboard from rendering.
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub use schema::FlightlensConfig;

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
pub fn load() -> FlightlensConfig {
    let mut config = FlightlensConfig::default();

    for path in [global_config_path(), project_config_path()] {
        if let Some(layer) = load_toml_file(path) {
            config = layer;
        }
    }

    apply_env_overrides(&mut config);
    config
}

/// Parse a TOML config file. `None` if missing or malformed.
///
/// Each file is deserialized with `serde(default)`, so keys it omits carry
/// built-in defaults. A later file therefore replaces an earlier one wholesale.
fn load_toml_file(path: Option<PathBuf>) -> Option<FlightlensConfig> {
    let content = fs::read_to_string(path?).ok()?;
    toml::from_str(&content).ok()
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".flightlens").join("config.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".flightlens.toml"))
}

/// Path to the user global config, for display.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Path to the project config, for display.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &str) -> Option<PathBuf> {
    match path.strip_prefix("~") {
        Some(rest) => {
            let rest = rest.trim_start_matches(['/', '\\']);
            dirs::home_dir().map(|home| home.join(rest))
        }
        None => Some(PathBuf::from(path)),
    }
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply `FLIGHTLENS_*` overrides.
///
/// - `FLIGHTLENS_INTERPRETER_URL`: agent service base URL
/// - `FLIGHTLENS_INTERPRETER_TIMEOUT_MS`: request timeout
/// - `FLIGHTLENS_SERVER_ADDR`: local API bind address
/// - `FLIGHTLENS_LOGGING`: event log on/off
fn apply_env_overrides(config: &mut FlightlensConfig) {
    if let Ok(val) = std::env::var("FLIGHTLENS_INTERPRETER_URL")
        && !val.is_empty()
    {
        config.interpreter.url = val;
    }
    if let Ok(val) = std::env::var("FLIGHTLENS_INTERPRETER_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.interpreter.timeout_ms = ms;
    }
    if let Ok(val) = std::env::var("FLIGHTLENS_SERVER_ADDR")
        && !val.is_empty()
    {
        config.server.addr = val;
    }
    if let Ok(val) = std::env::var("FLIGHTLENS_LOGGING") {
        config.logging.enabled = is_truthy(&val);
    }
}

fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// init / set / reset / show
// ---------------------------------------------------------------------------

/// Write the annotated default config to `~/.flightlens/config.toml`.
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    write_config_file(&path, &FlightlensConfig::default_toml())?;
    Ok(path)
}

/// Overwrite the global config with defaults.
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Set a dotted key (e.g. `interpreter.timeout_ms`) in the global config.
///
/// Starts from the existing file, or from serialized defaults when there is
/// none, so unknown keys are rejected in both cases.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let current = if path.exists() {
        fs::read_to_string(&path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&FlightlensConfig::default())
            .context("failed to serialize default config")?
    };

    let mut root: toml::Value =
        toml::from_str(&current).context("failed to parse config as TOML")?;
    set_toml_value(&mut root, key, value)?;

    let updated = toml::to_string_pretty(&root).context("failed to serialize config")?;
    write_config_file(&path, &updated)
}

/// The effective configuration rendered as TOML.
pub fn show_effective_config() -> Result<String> {
    toml::to_string_pretty(&load()).context("failed to serialize effective config")
}

fn write_config_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.flightlens/ directory")?;
    }
    fs::write(path, contents).context("failed to write config file")
}

/// Replace the leaf at `key`, parsing `raw` as the type of the value it replaces.
fn set_toml_value(root: &mut toml::Value, key: &str, raw: &str) -> Result<()> {
    let (section_path, leaf) = match key.rsplit_once('.') {
        Some((section, leaf)) => (Some(section), leaf),
        None => (None, key),
    };
    if leaf.is_empty() {
        anyhow::bail!("empty config key");
    }

    let mut table = root
        .as_table_mut()
        .context("config root is not a table")?;
    for section in section_path.into_iter().flat_map(|s| s.split('.')) {
        table = table
            .get_mut(section)
            .and_then(toml::Value::as_table_mut)
            .with_context(|| format!("config key not found: section '{section}' in '{key}'"))?;
    }

    let existing = table
        .get(leaf)
        .with_context(|| format!("config key not found: '{key}'"))?;
    let replacement = coerce_like(existing, raw)
        .with_context(|| format!("invalid value for '{key}': '{raw}'"))?;

    table.insert(leaf.to_string(), replacement);
    Ok(())
}

/// Parse `raw` into the TOML type of `existing`.
fn coerce_like(existing: &toml::Value, raw: &str) -> Result<toml::Value> {
    Ok(match existing {
        toml::Value::Boolean(_) => toml::Value::Boolean(is_truthy(raw)),
        toml::Value::Integer(_) => toml::Value::Integer(raw.parse()?),
        toml::Value::Float(_) => toml::Value::Float(raw.parse()?),
        _ => toml::Value::String(raw.to_string()),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> toml::Value {
        toml::from_str(
            r#"
[interpreter]
url = "http://127.0.0.1:8000"
timeout_ms = 60000

[logging]
enabled = true
"#,
        )
        .unwrap()
    }

    #[test]
    fn is_truthy_accepts_variants() {
        for yes in ["1", "true", "TRUE", "yes", "on", "ON"] {
            assert!(is_truthy(yes), "{yes}");
        }
        for no in ["0", "false", "no", "off", ""] {
            assert!(!is_truthy(no), "{no}");
        }
    }

    #[test]
    fn set_toml_value_updates_string() {
        let mut root = sample();
        set_toml_value(&mut root, "interpreter.url", "http://agents:9000").unwrap();
        assert_eq!(root["interpreter"]["url"].as_str(), Some("http://agents:9000"));
    }

    #[test]
    fn set_toml_value_updates_integer() {
        let mut root = sample();
        set_toml_value(&mut root, "interpreter.timeout_ms", "1500").unwrap();
        assert_eq!(root["interpreter"]["timeout_ms"].as_integer(), Some(1500));
    }

    #[test]
    fn set_toml_value_updates_bool() {
        let mut root = sample();
        set_toml_value(&mut root, "logging.enabled", "off").unwrap();
        assert_eq!(root["logging"]["enabled"].as_bool(), Some(false));
    }

    #[test]
    fn set_toml_value_rejects_bad_integer() {
        let mut root = sample();
        assert!(set_toml_value(&mut root, "interpreter.timeout_ms", "soon").is_err());
    }

    #[test]
    fn set_toml_value_rejects_unknown_keys() {
        let mut root = sample();
        assert!(set_toml_value(&mut root, "nonexistent.key", "x").is_err());
        assert!(set_toml_value(&mut root, "interpreter.colour", "x").is_err());
    }

    #[test]
    fn expand_home_leaves_plain_paths() {
        assert_eq!(
            expand_home("/var/log/flightlens.jsonl"),
            Some(PathBuf::from("/var/log/flightlens.jsonl"))
        );
    }

    #[test]
    fn expand_home_resolves_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(
                expand_home("~/.flightlens/events.jsonl"),
                Some(home.join(".flightlens/events.jsonl"))
            );
        }
    }

    #[test]
    fn show_effective_config_round_trips() {
        let text = show_effective_config().unwrap();
        let _: FlightlensConfig = toml::from_str(&text).unwrap();
    }
}
